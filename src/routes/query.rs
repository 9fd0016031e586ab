use crate::error::CrawlError;
use crate::models::{ClearQueryResponse, QueriesResponse, QueryRentalsResponse};
use crate::routes::ApiKey;
use crate::store::{QueryFilter, Store};
use rocket::serde::json::Json;
use rocket::{delete, get, State};
use std::sync::Arc;

#[get("/query/<id>/rentals?<limit>&<since_date>")]
pub fn rentals(
    _key: ApiKey,
    store: &State<Arc<Store>>,
    id: &str,
    limit: Option<i64>,
    since_date: Option<&str>,
) -> Result<Json<QueryRentalsResponse>, CrawlError> {
    let query = store.get_query(id)?;
    let rentals = store.list_rentals(id, limit, since_date)?;
    Ok(Json(QueryRentalsResponse { query, rentals }))
}

#[get("/queries?<region>&<since_date>&<has_rentals>&<limit>&<offset>")]
pub fn list_queries(
    _key: ApiKey,
    store: &State<Arc<Store>>,
    region: Option<String>,
    since_date: Option<String>,
    has_rentals: Option<bool>,
    limit: Option<i64>,
    offset: Option<i64>,
) -> Result<Json<QueriesResponse>, CrawlError> {
    let limit = limit.unwrap_or(50).clamp(1, 200);
    let offset = offset.unwrap_or(0).max(0);
    let filter = QueryFilter { region, since_date, has_rentals, limit, offset };
    let (queries, total) = store.list_queries(&filter)?;
    Ok(Json(QueriesResponse { queries, total, limit, offset }))
}

#[get("/query/<id>/similar?<limit>")]
pub fn similar(
    _key: ApiKey,
    store: &State<Arc<Store>>,
    id: &str,
    limit: Option<i64>,
) -> Result<Json<Vec<crate::models::SimilarQuery>>, CrawlError> {
    let limit = limit.unwrap_or(10).clamp(1, 100);
    Ok(Json(store.similar_queries(id, limit)?))
}

#[get("/query/statistics")]
pub fn statistics(_key: ApiKey, store: &State<Arc<Store>>) -> Result<Json<crate::models::StatisticsResponse>, CrawlError> {
    Ok(Json(store.statistics()?))
}

#[delete("/query/<id>/clear?<confirm>")]
pub fn clear(_key: ApiKey, store: &State<Arc<Store>>, id: &str, confirm: Option<bool>) -> Result<Json<ClearQueryResponse>, CrawlError> {
    if confirm != Some(true) {
        return Err(CrawlError::InvalidQuery("clear requires confirm=true".to_string()));
    }
    let (query_rentals_removed, sessions_removed, rentals_removed) = store.clear_query(id)?;
    Ok(Json(ClearQueryResponse { query_rentals_removed, sessions_removed, rentals_removed }))
}
