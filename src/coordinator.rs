//! Crawl Coordinator: fans a multi-station query out across `max_concurrent`
//! paced worker lanes and joins them back in station-id order. A
//! single-station query is a degenerate one-element fan-out.

use crate::error::CrawlError;
use crate::fetcher::Fetcher;
use crate::models::RawListing;
use crate::parser;
use reqwest::header::HeaderMap;
use std::sync::Arc;
use std::time::Duration;

pub struct StationOutcome {
    pub station_id: String,
    pub listings: Vec<RawListing>,
    pub error: Option<String>,
}

pub struct FanOutConfig {
    pub max_concurrent: usize,
    pub pacing: Duration,
    pub site_origin: String,
}

/// Build one search URL per station by substituting `station=<id>` into the
/// base query's stations facet and run each through Fetcher + Parser. Stations
/// are bucketed round-robin (`i % max_concurrent`) into one worker lane per
/// bucket; each lane fetches its own stations sequentially, pacing every
/// start after its first by `config.pacing`. This bounds concurrency to
/// `max_concurrent` without a semaphore and keeps the pace a per-lane
/// steady rate rather than one global staircase. Results come back ordered
/// by ascending station id regardless of completion order.
pub async fn fan_out(
    fetcher: Arc<dyn Fetcher>,
    base_url_per_station: impl Fn(&str) -> String + Send + Sync + 'static,
    station_ids: Vec<String>,
    config: FanOutConfig,
) -> Vec<StationOutcome> {
    let lanes = config.max_concurrent.max(1);
    let base_url_per_station = Arc::new(base_url_per_station);
    let config = Arc::new(config);

    let mut buckets: Vec<Vec<String>> = (0..lanes).map(|_| Vec::new()).collect();
    for (i, station_id) in station_ids.into_iter().enumerate() {
        buckets[i % lanes].push(station_id);
    }

    let mut handles = Vec::with_capacity(lanes);
    for bucket in buckets {
        let fetcher = fetcher.clone();
        let config = config.clone();
        let base_url_per_station = base_url_per_station.clone();

        handles.push(tokio::spawn(async move {
            let mut outcomes = Vec::with_capacity(bucket.len());
            for (seq, station_id) in bucket.into_iter().enumerate() {
                if seq > 0 {
                    tokio::time::sleep(config.pacing).await;
                }
                outcomes.push(run_one(fetcher.as_ref(), base_url_per_station.as_ref(), &station_id, &config).await);
            }
            outcomes
        }));
    }

    let mut outcomes: Vec<StationOutcome> = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(|r| r.expect("sub-crawl task panicked"))
        .flatten()
        .collect();

    outcomes.sort_by(|a, b| a.station_id.cmp(&b.station_id));
    outcomes
}

async fn run_one(
    fetcher: &dyn Fetcher,
    base_url_per_station: &(impl Fn(&str) -> String + ?Sized),
    station_id: &str,
    config: &FanOutConfig,
) -> StationOutcome {
    let url = base_url_per_station(station_id);
    match fetcher.fetch(&url, &HeaderMap::new()).await {
        Ok(body) => StationOutcome {
            station_id: station_id.to_string(),
            listings: parser::parse(&body, &config.site_origin),
            error: None,
        },
        Err(e) => StationOutcome {
            station_id: station_id.to_string(),
            listings: Vec::new(),
            error: Some(describe(&e)),
        },
    }
}

fn describe(e: &CrawlError) -> String {
    e.to_string()
}
