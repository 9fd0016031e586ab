//! HTTP Fetcher: retrying GET against a single station URL. Linear backoff,
//! doubled after a 429, bounded by a fixed attempt count and per-attempt
//! timeout.

use crate::error::CrawlError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
    pub timeout: Duration,
}

/// Constructor-injected fetch capability (`spec.md` §9): the orchestrator
/// and coordinator depend on this trait, never on `reqwest` directly, so
/// tests can substitute a canned implementation. `headers` carries
/// caller-supplied overrides layered on top of the fetcher's own defaults
/// (UA, `Accept-Language`) rather than replacing them.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str, headers: &HeaderMap) -> Result<String, CrawlError>;
}

pub struct HttpFetcher {
    client: reqwest::Client,
    policy: RetryPolicy,
    default_headers: HeaderMap,
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client, policy: RetryPolicy, user_agent: &str, accept_language: &str) -> Self {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent).unwrap_or_else(|_| HeaderValue::from_static("rental-watch")),
        );
        default_headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_str(accept_language).unwrap_or_else(|_| HeaderValue::from_static("en")),
        );
        default_headers.insert(ACCEPT, HeaderValue::from_static("text/html"));
        HttpFetcher { client, policy, default_headers }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, headers: &HeaderMap) -> Result<String, CrawlError> {
        let mut merged = self.default_headers.clone();
        for (name, value) in headers {
            merged.insert(name, value.clone());
        }
        fetch_with_retry(&self.client, url, self.policy, merged).await
    }
}

/// `GET url` with retries. Each attempt gets `policy.timeout`; a 429 doubles
/// the backoff before the next attempt, any other non-2xx or transport
/// error uses the plain linear delay. Exhausting `policy.attempts` yields
/// `CrawlError::FetchFailed`.
async fn fetch_with_retry(client: &reqwest::Client, url: &str, policy: RetryPolicy, headers: HeaderMap) -> Result<String, CrawlError> {
    let mut delay = policy.base_delay;
    let mut last_err = String::new();

    for attempt in 1..=policy.attempts {
        let outcome = client
            .get(url)
            .timeout(policy.timeout)
            .headers(headers.clone())
            .send()
            .await;

        match outcome {
            Ok(resp) if resp.status().is_success() => {
                return resp
                    .text()
                    .await
                    .map_err(|e| CrawlError::FetchFailed { attempts: attempt, source: e.to_string() });
            }
            Ok(resp) => {
                let status = resp.status();
                last_err = format!("http {status}");
                if attempt == policy.attempts {
                    break;
                }
                tracing::warn!(url, attempt, %status, "fetch returned non-success status");
                if status.as_u16() == 429 {
                    delay *= 2;
                }
            }
            Err(e) => {
                last_err = classify(&e);
                if attempt == policy.attempts {
                    break;
                }
                tracing::warn!(url, attempt, error = %last_err, "fetch attempt failed");
            }
        }

        tokio::time::sleep(delay).await;
    }

    Err(CrawlError::FetchFailed { attempts: policy.attempts, source: last_err })
}

/// Coarse transport-error classification for log messages; `reqwest`
/// already distinguishes timeout/connect/decode at the type level, this
/// just picks a short label.
fn classify(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "timeout".to_string()
    } else if e.is_connect() {
        "connection failed".to_string()
    } else if e.is_decode() {
        "decode error".to_string()
    } else {
        e.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubling_backoff_after_429_compounds_across_attempts() {
        let mut delay = Duration::from_millis(100);
        delay *= 2;
        delay *= 2;
        assert_eq!(delay, Duration::from_millis(400));
    }

    #[tokio::test]
    async fn exhausted_retries_against_unroutable_host_yields_fetch_failed() {
        let client = reqwest::Client::new();
        let policy = RetryPolicy { attempts: 2, base_delay: Duration::from_millis(1), timeout: Duration::from_millis(200) };
        let err = fetch_with_retry(&client, "http://127.0.0.1:1", policy, HeaderMap::new()).await.unwrap_err();
        assert!(matches!(err, CrawlError::FetchFailed { attempts: 2, .. }));
    }

    #[tokio::test]
    async fn http_fetcher_surfaces_fetch_failed_through_the_trait() {
        let policy = RetryPolicy { attempts: 1, base_delay: Duration::from_millis(1), timeout: Duration::from_millis(200) };
        let fetcher = HttpFetcher::new(reqwest::Client::new(), policy, "rental-watch/test", "en");
        let err = fetcher.fetch("http://127.0.0.1:1", &HeaderMap::new()).await.unwrap_err();
        assert!(matches!(err, CrawlError::FetchFailed { attempts: 1, .. }));
    }

    #[test]
    fn default_headers_carry_configured_user_agent_and_language() {
        let policy = RetryPolicy { attempts: 1, base_delay: Duration::from_millis(1), timeout: Duration::from_millis(200) };
        let fetcher = HttpFetcher::new(reqwest::Client::new(), policy, "rental-watch/test", "zh-TW");
        assert_eq!(fetcher.default_headers.get(USER_AGENT).unwrap(), "rental-watch/test");
        assert_eq!(fetcher.default_headers.get(ACCEPT_LANGUAGE).unwrap(), "zh-TW");
    }
}
