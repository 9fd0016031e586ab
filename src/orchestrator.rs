//! Orchestrator: the top-level `crawl(url, opts)` contract (`spec.md` §4.8).
//! Composes canonicalization, fan-out, parsing, merging, policy, storage and
//! notification into one sequential pipeline; internal parallelism is
//! confined to the Crawl Coordinator's fan-out.

use crate::canonicalize::canonicalize;
use crate::config::AppConfig;
use crate::coordinator::{self, FanOutConfig, StationOutcome};
use crate::dispatcher::{NotificationDispatcher, NotificationPayload};
use crate::error::CrawlError;
use crate::fetcher::Fetcher;
use crate::merge::{self, StationResult};
use crate::models::{
    CrawlOptions, CrawlResult, CrawlSummary, Listing, MergedListing, NotificationDecision,
    RentalView,
};
use crate::parser;
use crate::policy;
use crate::store::Store;
use reqwest::header::HeaderMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

const SITE_ORIGIN: &str = "https://rent.591.com.tw";

pub struct Orchestrator {
    store: Arc<Store>,
    fetcher: Arc<dyn Fetcher>,
    dispatcher: Box<dyn NotificationDispatcher>,
    config: AppConfig,
}

impl Orchestrator {
    pub fn new(store: Arc<Store>, fetcher: Arc<dyn Fetcher>, dispatcher: Box<dyn NotificationDispatcher>, config: AppConfig) -> Self {
        Orchestrator { store, fetcher, dispatcher, config }
    }

    pub async fn crawl(&self, url: &str, opts: CrawlOptions) -> Result<CrawlResult, CrawlError> {
        let now = now_rfc3339();
        let canonical = canonicalize(url)?;
        let query_id = canonical.query_id.clone();

        match self.run(&canonical, &opts, &now).await {
            Ok(result) => Ok(result),
            Err(e) => {
                if opts.notify_mode != crate::models::NotifyMode::None {
                    self.dispatch_error_notification(&query_id, &e).await;
                }
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        canonical: &crate::models::Canonical,
        opts: &CrawlOptions,
        now: &str,
    ) -> Result<CrawlResult, CrawlError> {
        let query = self.store.upsert_query(canonical, now)?;
        let stations = canonical.params.stations.clone();
        let multi_station = stations.len() > 1;
        let station_count = if stations.is_empty() { 1 } else { stations.len() };

        let session_id = self.store.open_session(&query.id, opts, station_count, multi_station, now)?;

        let (per_station, crawl_errors) = self.collect(canonical, opts, &stations).await?;
        let observed = merge::merge(per_station);

        let existing_ids = self.store.get_existing_property_ids(&query.id)?;
        let candidates: Vec<&MergedListing> = match opts.max_latest {
            Some(n) => observed.iter().take(n).collect(),
            None => observed.iter().filter(|l| !existing_ids.contains(&l.id)).collect(),
        };

        let decisions: Vec<(String, NotificationDecision)> = observed
            .iter()
            .map(|listing| {
                let temp = to_temp_listing(listing);
                let decision = policy::classify(&temp, opts.notify_mode, opts.filtered_mode, &opts.filter, self.config.walking_speed_m_per_min);
                (listing.id.clone(), decision)
            })
            .collect();

        let to_notify: Vec<&MergedListing> = candidates
            .iter()
            .copied()
            .filter(|l| decisions.iter().any(|(id, d)| id == &l.id && d.will_notify))
            .collect();

        if !to_notify.is_empty() {
            let payloads: Vec<NotificationPayload> = to_notify
                .iter()
                .map(|l| {
                    let silent = decisions.iter().find(|(id, _)| id == &l.id).map(|(_, d)| d.is_silent).unwrap_or(false);
                    NotificationPayload {
                        query_id: query.id.clone(),
                        rental_id: l.id.clone(),
                        title: l.title.clone(),
                        link: l.link.clone(),
                        price_text: l.price_text.clone(),
                        silent,
                        timestamp: now.to_string(),
                    }
                })
                .collect();
            self.dispatcher.dispatch(&payloads, self.config.notification_delay).await;
        }

        let notified_ids: HashSet<String> = to_notify.iter().map(|l| l.id.clone()).collect();
        let silent_ids: HashSet<String> = decisions.iter().filter(|(_, d)| d.is_silent).map(|(id, _)| id.clone()).collect();

        let persisted = self.store.persist_listings(&session_id, &query.id, &observed, &notified_ids, &silent_ids, now)?;

        let summary = CrawlSummary {
            total_rentals: persisted.len(),
            new_rentals: to_notify.len(),
            notifications_sent: !to_notify.is_empty(),
            notify_mode: opts.notify_mode,
            filtered_mode: opts.filtered_mode,
            multi_station,
            station_count,
            stations: stations.clone(),
            crawl_errors,
        };

        self.store.close_session(&session_id, &summary, &now_rfc3339())?;

        let rentals = persisted
            .into_iter()
            .map(|listing| {
                let decision = decisions
                    .iter()
                    .find(|(id, _)| id == &listing.id)
                    .map(|(_, d)| d.clone())
                    .unwrap_or_else(|| policy::classify(&listing, opts.notify_mode, opts.filtered_mode, &opts.filter, self.config.walking_speed_m_per_min));
                RentalView { listing, notification: decision }
            })
            .collect();

        Ok(CrawlResult { rentals, summary })
    }

    /// Multi-station fetch failures are captured into the returned error
    /// list (partial success); a single-station fetch failure propagates as
    /// a real error, per `spec.md` §7.
    async fn collect(
        &self,
        canonical: &crate::models::Canonical,
        opts: &CrawlOptions,
        stations: &[String],
    ) -> Result<(Vec<StationResult>, Vec<String>), CrawlError> {
        if stations.len() > 1 {
            let max_concurrent = opts.multi_station_options.max_concurrent.unwrap_or(self.config.max_concurrent_fetches);
            let pacing = opts
                .multi_station_options
                .delay_between_requests
                .map(Duration::from_millis)
                .unwrap_or(self.config.fetch_pacing);

            let base_url = canonical.canonical_url.clone();
            let fan_config = FanOutConfig { max_concurrent, pacing, site_origin: SITE_ORIGIN.to_string() };

            let outcomes: Vec<StationOutcome> = coordinator::fan_out(
                self.fetcher.clone(),
                move |station_id| with_single_station(&base_url, station_id),
                stations.to_vec(),
                fan_config,
            )
            .await;

            let mut errors = Vec::new();
            let mut per_station = Vec::with_capacity(outcomes.len());
            for outcome in outcomes {
                if let Some(err) = outcome.error {
                    errors.push(format!("station {}: {err}", outcome.station_id));
                }
                per_station.push(StationResult { station_id: Some(outcome.station_id), listings: outcome.listings });
            }
            Ok((per_station, errors))
        } else {
            let body = self.fetcher.fetch(&canonical.canonical_url, &HeaderMap::new()).await?;
            let listings = parser::parse(&body, SITE_ORIGIN);
            let station_id = stations.first().cloned();
            Ok((vec![StationResult { station_id, listings }], Vec::new()))
        }
    }

    async fn dispatch_error_notification(&self, query_id: &str, error: &CrawlError) {
        let payload = NotificationPayload {
            query_id: query_id.to_string(),
            rental_id: String::new(),
            title: format!("crawl failed: {error}"),
            link: String::new(),
            price_text: String::new(),
            silent: false,
            timestamp: now_rfc3339(),
        };
        self.dispatcher.dispatch(&[payload], Duration::from_millis(0)).await;
    }
}

fn with_single_station(canonical_url: &str, station_id: &str) -> String {
    let mut url = url::Url::parse(canonical_url).expect("canonical url is always valid");
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "station")
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    url.query_pairs_mut().clear();
    {
        let mut qp = url.query_pairs_mut();
        for (k, v) in &pairs {
            qp.append_pair(k, v);
        }
        qp.append_pair("station", station_id);
    }
    url.to_string()
}

fn to_temp_listing(merged: &MergedListing) -> Listing {
    Listing {
        id: merged.id.clone(),
        title: merged.title.clone(),
        link: merged.link.clone(),
        house_type: merged.house_type.clone(),
        rooms: merged.rooms.clone(),
        tags_list: merged.tags_list.clone(),
        image_urls: merged.image_urls.clone(),
        price_text: merged.price_text.clone(),
        metro_distances: merged.metro_distances.clone(),
        first_seen_at: String::new(),
        last_seen_at: String::new(),
        content_hash: String::new(),
    }
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}
