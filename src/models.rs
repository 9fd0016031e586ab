use serde::{Deserialize, Serialize};

// --- Query ---

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Query {
    pub id: String,
    pub description: String,
    pub region: String,
    pub kind: Option<String>,
    pub stations: Vec<String>,
    pub metro_line: Option<String>,
    pub price_min: Option<i64>,
    pub price_max: Option<i64>,
    pub sections: Vec<String>,
    pub rooms: Vec<String>,
    pub floor: Option<String>,
    pub first_seen_at: String,
    pub last_seen_at: String,
}

/// Output of `canonicalize(url)`. `params` carries the same facets that fed
/// `query_id`/`description` so the orchestrator can build a `Query` row
/// without re-parsing the URL.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Canonical {
    pub query_id: String,
    pub description: String,
    pub canonical_url: String,
    pub equivalent_variants: Vec<String>,
    pub params: CanonicalParams,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CanonicalParams {
    pub region: String,
    pub kind: Option<String>,
    pub stations: Vec<String>,
    pub metro_line: Option<String>,
    pub price_min: Option<i64>,
    pub price_max: Option<i64>,
    pub sections: Vec<String>,
    pub rooms: Vec<String>,
    pub floor: Option<String>,
}

// --- CrawlSession ---

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CrawlSession {
    pub id: String,
    pub query_id: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub station_count: usize,
    pub multi_station: bool,
    pub total_listings: usize,
    pub new_listings: usize,
    pub notifications_sent: bool,
    pub error_count: usize,
    pub options: serde_json::Value,
}

// --- Listing / MetroDistance ---

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct MetroDistance {
    pub station_id: Option<String>,
    pub station_name: Option<String>,
    pub metro_value_text: String,
    pub distance_meters: Option<i64>,
}

/// A listing as extracted from a single document, before merge across
/// stations. At most one metro facet — the document it came from only names
/// the station that search was scoped to.
#[derive(Debug, Clone)]
pub struct RawListing {
    pub title: String,
    pub link: String,
    pub house_type: String,
    pub rooms: String,
    pub tags_list: Vec<String>,
    pub image_urls: Vec<String>,
    pub price_text: String,
    pub metro: Option<MetroDistance>,
}

/// A listing post-merge, pre-persist: one row per `PropertyId`, metro facets
/// unioned across every station that observed it. No timestamps or content
/// hash yet — those are a State Store concern (`spec.md` §4.7).
#[derive(Debug, Clone)]
pub struct MergedListing {
    pub id: String,
    pub title: String,
    pub link: String,
    pub house_type: String,
    pub rooms: String,
    pub tags_list: Vec<String>,
    pub image_urls: Vec<String>,
    pub price_text: String,
    pub metro_distances: Vec<MetroDistance>,
}

/// A listing post-merge: one row per `PropertyId`, metro facets unioned
/// across every station that observed it.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Listing {
    pub id: String,
    pub title: String,
    pub link: String,
    pub house_type: String,
    pub rooms: String,
    pub tags_list: Vec<String>,
    pub image_urls: Vec<String>,
    pub price_text: String,
    pub metro_distances: Vec<MetroDistance>,
    pub first_seen_at: String,
    pub last_seen_at: String,
    pub content_hash: String,
}

// --- Notification policy ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyMode {
    All,
    Filtered,
    None,
}

impl Default for NotifyMode {
    fn default() -> Self {
        NotifyMode::Filtered
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilteredMode {
    Normal,
    Silent,
    None,
}

impl Default for FilteredMode {
    fn default() -> Self {
        FilteredMode::Silent
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct FilterOptions {
    pub mrt_distance_threshold: Option<i64>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MultiStationOptions {
    pub max_concurrent: Option<usize>,
    pub delay_between_requests: Option<u64>,
    pub merge_results: Option<bool>,
    pub include_station_info: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlOptions {
    pub max_latest: Option<usize>,
    #[serde(default)]
    pub notify_mode: NotifyMode,
    #[serde(default)]
    pub filtered_mode: FilteredMode,
    #[serde(default)]
    pub filter: FilterOptions,
    #[serde(default)]
    pub multi_station_options: MultiStationOptions,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        CrawlOptions {
            max_latest: None,
            notify_mode: NotifyMode::default(),
            filtered_mode: FilteredMode::default(),
            filter: FilterOptions::default(),
            multi_station_options: MultiStationOptions::default(),
        }
    }
}

/// Per-listing derived metadata from the Policy Engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationDecision {
    pub will_notify: bool,
    pub is_silent: bool,
    pub distance_from_mrt: Option<i64>,
    pub distance_threshold: Option<i64>,
    pub is_far_from_mrt: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentalView {
    #[serde(flatten)]
    pub listing: Listing,
    pub notification: NotificationDecision,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlSummary {
    pub total_rentals: usize,
    pub new_rentals: usize,
    pub notifications_sent: bool,
    pub notify_mode: NotifyMode,
    pub filtered_mode: FilteredMode,
    pub multi_station: bool,
    pub station_count: usize,
    pub stations: Vec<String>,
    pub crawl_errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlResult {
    pub rentals: Vec<RentalView>,
    pub summary: CrawlSummary,
}

// --- REST request/response DTOs ---

#[derive(Debug, Deserialize)]
pub struct CrawlRequest {
    pub url: String,
    #[serde(default)]
    pub max_latest: Option<usize>,
    #[serde(default)]
    pub notify_mode: Option<NotifyMode>,
    #[serde(default)]
    pub filtered_mode: Option<FilteredMode>,
    #[serde(default)]
    pub filter: Option<FilterOptions>,
    #[serde(default)]
    pub multi_station_options: Option<MultiStationOptions>,
}

impl CrawlRequest {
    pub fn into_options(self) -> CrawlOptions {
        CrawlOptions {
            max_latest: self.max_latest,
            notify_mode: self.notify_mode.unwrap_or_default(),
            filtered_mode: self.filtered_mode.unwrap_or_default(),
            filter: self.filter.unwrap_or_default(),
            multi_station_options: self.multi_station_options.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CrawlResponse {
    pub success: bool,
    pub data: CrawlResult,
}

#[derive(Debug, Deserialize)]
pub struct ParseQueryRequest {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct ParseQueryResponse {
    pub query_id: String,
    pub description: String,
    pub normalized_url: String,
    pub equivalent_urls: Vec<String>,
    pub search_criteria: CanonicalParams,
}

#[derive(Debug, Serialize)]
pub struct QueryRentalsResponse {
    pub query: Query,
    pub rentals: Vec<Listing>,
}

#[derive(Debug, Serialize)]
pub struct QueryListItem {
    #[serde(flatten)]
    pub query: Query,
    pub rental_count: i64,
}

#[derive(Debug, Serialize)]
pub struct QueriesResponse {
    pub queries: Vec<QueryListItem>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Serialize)]
pub struct SimilarQuery {
    #[serde(flatten)]
    pub query: Query,
    pub score: i64,
}

#[derive(Debug, Serialize)]
pub struct RegionBreakdown {
    pub region: String,
    pub query_count: i64,
    pub rental_count: i64,
}

#[derive(Debug, Serialize)]
pub struct StatisticsResponse {
    pub total_queries: i64,
    pub total_sessions: i64,
    pub total_rentals: i64,
    pub regions: Vec<RegionBreakdown>,
}

#[derive(Debug, Serialize)]
pub struct ClearQueryResponse {
    pub query_rentals_removed: i64,
    pub sessions_removed: i64,
    pub rentals_removed: i64,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub service: &'static str,
    pub version: &'static str,
    pub uptime: i64,
}
