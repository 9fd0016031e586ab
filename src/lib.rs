pub mod canonicalize;
pub mod config;
pub mod coordinator;
pub mod dispatcher;
pub mod distance;
pub mod error;
pub mod fetcher;
pub mod merge;
pub mod models;
pub mod orchestrator;
pub mod parser;
pub mod policy;
pub mod routes;
pub mod store;

use config::AppConfig;
use dispatcher::{NotificationDispatcher, WebhookDispatcher};
use fetcher::{Fetcher, HttpFetcher, RetryPolicy};
use orchestrator::Orchestrator;
use routes::health::StartedAt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use store::Store;

pub fn rocket() -> rocket::Rocket<rocket::Build> {
    let config = AppConfig::from_env();
    build_rocket(config)
}

pub fn rocket_with_config(config: AppConfig) -> rocket::Rocket<rocket::Build> {
    build_rocket(config)
}

/// Assembles a rocket instance from caller-supplied fetch and notification
/// dependencies instead of the live `reqwest`/webhook ones. Used by
/// integration tests that need a canned `Fetcher` and a recording
/// `NotificationDispatcher`.
pub fn rocket_with_deps(config: AppConfig, fetcher: Arc<dyn Fetcher>, dispatcher: Box<dyn NotificationDispatcher>) -> rocket::Rocket<rocket::Build> {
    let store = Arc::new(Store::new(&config.database_path).expect("failed to open state store"));
    let orchestrator = Orchestrator::new(store.clone(), fetcher, dispatcher, config.clone());
    assemble(config, store, orchestrator)
}

fn build_rocket(config: AppConfig) -> rocket::Rocket<rocket::Build> {
    if config.api_key.is_none() {
        tracing::warn!("API_KEY not set — REST endpoints are unauthenticated");
    }

    let store = Arc::new(Store::new(&config.database_path).expect("failed to open state store"));

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .expect("failed to build http client");

    let dispatcher = Box::new(WebhookDispatcher::new(client.clone(), config.webhook_url.clone(), config.webhook_secret.clone()));
    let retry_policy = RetryPolicy {
        attempts: config.fetch_retries,
        base_delay: config.fetch_retry_delay,
        timeout: config.fetch_timeout,
    };
    let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(client, retry_policy, &config.user_agent, &config.accept_language));
    let orchestrator = Orchestrator::new(store.clone(), fetcher, dispatcher, config.clone());

    assemble(config, store, orchestrator)
}

fn assemble(config: AppConfig, store: Arc<Store>, orchestrator: Orchestrator) -> rocket::Rocket<rocket::Build> {
    rocket::build()
        .manage(config)
        .manage(store)
        .manage(orchestrator)
        .manage(StartedAt(Instant::now()))
        .register("/", rocket::catchers![routes::not_found, routes::unauthorized])
        .mount(
            "/",
            rocket::routes![
                routes::health::health,
                routes::crawl::crawl,
                routes::crawl::parse_query,
                routes::query::rentals,
                routes::query::list_queries,
                routes::query::similar,
                routes::query::statistics,
                routes::query::clear,
            ],
        )
}
