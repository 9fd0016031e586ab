//! Notification Dispatcher: delivers one webhook POST per listing to notify.
//!
//! Diverges from the teacher's `webhooks.rs` fire-and-forget `tokio::spawn`
//! pattern: `spec.md` §5 requires notification order to match the merge
//! order and a configurable inter-notification delay, so delivery here is
//! sequential and awaited. HMAC signing is unchanged from the teacher.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::Duration;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, serde::Serialize)]
pub struct NotificationPayload {
    pub query_id: String,
    pub rental_id: String,
    pub title: String,
    pub link: String,
    pub price_text: String,
    pub silent: bool,
    pub timestamp: String,
}

#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn dispatch(&self, notifications: &[NotificationPayload], delay: Duration);
}

pub struct WebhookDispatcher {
    client: reqwest::Client,
    url: Option<String>,
    secret: Option<String>,
}

impl WebhookDispatcher {
    pub fn new(client: reqwest::Client, url: Option<String>, secret: Option<String>) -> Self {
        WebhookDispatcher { client, url, secret }
    }

    fn sign(&self, body: &str) -> Option<String> {
        let secret = self.secret.as_ref()?;
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
        mac.update(body.as_bytes());
        Some(hex::encode(mac.finalize().into_bytes()))
    }
}

#[async_trait]
impl NotificationDispatcher for WebhookDispatcher {
    async fn dispatch(&self, notifications: &[NotificationPayload], delay: Duration) {
        let Some(url) = &self.url else {
            tracing::warn!("no webhook url configured, skipping {} notification(s)", notifications.len());
            return;
        };

        for (i, payload) in notifications.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(delay).await;
            }

            let body = serde_json::to_string(payload).unwrap_or_default();
            let mut request = self
                .client
                .post(url)
                .header("Content-Type", "application/json")
                .header("X-Rental-Watch-Event", "new-listing")
                .header("X-Rental-Watch-Silent", payload.silent.to_string());

            if let Some(signature) = self.sign(&body) {
                request = request.header("X-Rental-Watch-Signature", format!("sha256={signature}"));
            }

            match request.body(body).send().await {
                Ok(resp) if !resp.status().is_success() => {
                    tracing::warn!(rental_id = %payload.rental_id, status = %resp.status(), "webhook delivery failed");
                }
                Err(e) => {
                    tracing::warn!(rental_id = %payload.rental_id, error = %e, "webhook delivery error");
                }
                _ => {}
            }
        }
    }
}
