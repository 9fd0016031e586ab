use async_trait::async_trait;
use rental_watch::config::AppConfig;
use rental_watch::dispatcher::{NotificationDispatcher, NotificationPayload};
use rental_watch::error::CrawlError;
use rental_watch::fetcher::Fetcher;
use reqwest::header::HeaderMap;
use rocket::local::blocking::Client;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Wrapper around Client that auto-deletes the temp sqlite file on drop.
pub struct TestClient {
    client: Option<Client>,
    db_path: String,
    pub dispatcher: Arc<RecordingDispatcher>,
}

impl Drop for TestClient {
    fn drop(&mut self) {
        drop(self.client.take());
        let _ = std::fs::remove_file(&self.db_path);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_path));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_path));
    }
}

impl std::ops::Deref for TestClient {
    type Target = Client;
    fn deref(&self) -> &Client {
        self.client.as_ref().unwrap()
    }
}

/// Maps a canonical or per-station search URL to a canned HTML body.
pub struct FakeFetcher {
    pub responses: HashMap<String, String>,
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn fetch(&self, url: &str, _headers: &HeaderMap) -> Result<String, CrawlError> {
        match self.responses.get(url) {
            Some(body) => Ok(body.clone()),
            None => Err(CrawlError::FetchFailed { attempts: 1, source: format!("no fixture for {url}") }),
        }
    }
}

/// Records every dispatched notification batch in call order, standing in
/// for a real webhook delivery.
#[derive(Default)]
pub struct RecordingDispatcher {
    pub calls: Mutex<Vec<Vec<NotificationPayload>>>,
}

#[async_trait]
impl NotificationDispatcher for RecordingDispatcher {
    async fn dispatch(&self, notifications: &[NotificationPayload], _delay: Duration) {
        self.calls.lock().unwrap().push(notifications.to_vec());
    }
}

pub fn test_client(responses: HashMap<String, String>) -> TestClient {
    let db_path = format!("/tmp/rental_watch_test_{}.db", uuid::Uuid::new_v4().to_string().split('-').next().unwrap());
    let config = AppConfig {
        api_key: None,
        max_concurrent_fetches: 3,
        fetch_pacing: Duration::from_millis(0),
        fetch_retries: 1,
        fetch_retry_delay: Duration::from_millis(1),
        fetch_timeout: Duration::from_secs(1),
        notification_delay: Duration::from_millis(0),
        walking_speed_m_per_min: 80.0,
        user_agent: "rental-watch/test".to_string(),
        accept_language: "en".to_string(),
        database_path: db_path.clone(),
        webhook_url: None,
        webhook_secret: None,
    };

    let fetcher: Arc<dyn Fetcher> = Arc::new(FakeFetcher { responses });
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let rocket = rental_watch::rocket_with_deps(config, fetcher, Box::new(RecordingDispatcherHandle(dispatcher.clone())));
    let client = Client::tracked(rocket).expect("valid rocket instance");
    TestClient { client: Some(client), db_path, dispatcher }
}

/// `NotificationDispatcher` is consumed as a `Box<dyn _>` by the orchestrator,
/// so the recorder is wrapped behind a thin forwarding handle the test keeps
/// an `Arc` to for assertions.
struct RecordingDispatcherHandle(Arc<RecordingDispatcher>);

#[async_trait]
impl NotificationDispatcher for RecordingDispatcherHandle {
    async fn dispatch(&self, notifications: &[NotificationPayload], delay: Duration) {
        self.0.dispatch(notifications, delay).await;
    }
}

pub fn listing_html(title: &str, detail_path: &str, metro_meters: Option<i64>) -> String {
    let metro = match metro_meters {
        Some(m) => format!(r#"<div class="item-info-tworow"><strong>{m} meters</strong><span>Jiannan Rd.</span></div>"#),
        None => String::new(),
    };
    format!(
        r#"<div class="item-info">
            <div class="item-info-title">{title}</div>
            <a href="{detail_path}"></a>
            <div class="item-info-txt"><span>apartment</span><span class="line">2 rooms</span></div>
            <div class="item-info-price">NT$15,000</div>
            {metro}
        </div>"#
    )
}

pub fn page(listings: &[String]) -> String {
    format!("<html><body>{}</body></html>", listings.join("\n"))
}
