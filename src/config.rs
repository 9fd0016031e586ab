use std::env;
use std::time::Duration;

/// Process-wide, read-once configuration. Assembled at startup from the
/// environment (with defaults) and handed down via Rocket managed state.
/// No component below the façade consults `env::var` at call time.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Shared secret for `x-api-key` / `apiKey` auth. `None` disables auth
    /// (a warning is logged once at startup).
    pub api_key: Option<String>,
    /// Max concurrent outbound fetches per fan-out (`C`).
    pub max_concurrent_fetches: usize,
    /// Minimum delay between fetch starts within a single fan-out (`D`).
    pub fetch_pacing: Duration,
    /// Max fetch retry attempts (`R`).
    pub fetch_retries: u32,
    /// Base linear retry delay, doubled after a 429 (`spec.md` §4.3).
    pub fetch_retry_delay: Duration,
    /// Per-attempt fetch timeout (`T`).
    pub fetch_timeout: Duration,
    /// Delay between successive webhook deliveries within one crawl.
    pub notification_delay: Duration,
    /// Walking speed used to convert "`N` minutes" metro text to meters.
    pub walking_speed_m_per_min: f64,
    /// `User-Agent` sent with every fetch.
    pub user_agent: String,
    /// `Accept-Language` hint sent with every fetch.
    pub accept_language: String,
    pub database_path: String,
    pub webhook_url: Option<String>,
    pub webhook_secret: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        AppConfig {
            api_key: env::var("API_KEY").ok().filter(|s| !s.is_empty()),
            max_concurrent_fetches: env_usize("MAX_CONCURRENT_FETCHES", 3),
            fetch_pacing: Duration::from_millis(env_u64("FETCH_PACING_MS", 1000)),
            fetch_retries: env_u32("FETCH_RETRIES", 3),
            fetch_retry_delay: Duration::from_millis(env_u64("FETCH_RETRY_DELAY_MS", 2000)),
            fetch_timeout: Duration::from_secs(env_u64("FETCH_TIMEOUT_SECS", 30)),
            notification_delay: Duration::from_millis(env_u64("NOTIFICATION_DELAY_MS", 1000)),
            walking_speed_m_per_min: env_f64("WALKING_SPEED_M_PER_MIN", 80.0),
            user_agent: env::var("FETCH_USER_AGENT").unwrap_or_else(|_| "rental-watch/0.1 (+https://rent.591.com.tw)".to_string()),
            accept_language: env::var("FETCH_ACCEPT_LANGUAGE").unwrap_or_else(|_| "zh-TW,zh;q=0.9,en;q=0.8".to_string()),
            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| "data/rental_watch.db".to_string()),
            webhook_url: env::var("WEBHOOK_URL").ok().filter(|s| !s.is_empty()),
            webhook_secret: env::var("WEBHOOK_SECRET").ok().filter(|s| !s.is_empty()),
        }
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
fn env_u32(key: &str, default: u32) -> u32 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
fn env_f64(key: &str, default: f64) -> f64 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
