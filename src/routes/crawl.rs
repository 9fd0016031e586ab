use crate::canonicalize::canonicalize;
use crate::error::CrawlError;
use crate::models::{CrawlRequest, CrawlResponse, ParseQueryRequest, ParseQueryResponse};
use crate::orchestrator::Orchestrator;
use crate::routes::ApiKey;
use rocket::serde::json::Json;
use rocket::{post, State};

#[post("/crawl", data = "<body>")]
pub async fn crawl(
    _key: ApiKey,
    orchestrator: &State<Orchestrator>,
    body: Json<CrawlRequest>,
) -> Result<Json<CrawlResponse>, CrawlError> {
    let body = body.into_inner();
    let url = body.url.clone();
    let opts = body.into_options();

    let data = orchestrator.crawl(&url, opts).await?;
    Ok(Json(CrawlResponse { success: true, data }))
}

#[post("/query/parse", data = "<body>")]
pub fn parse_query(_key: ApiKey, body: Json<ParseQueryRequest>) -> Result<Json<ParseQueryResponse>, CrawlError> {
    let canonical = canonicalize(&body.url)?;
    Ok(Json(ParseQueryResponse {
        query_id: canonical.query_id,
        description: canonical.description,
        normalized_url: canonical.canonical_url,
        equivalent_urls: canonical.equivalent_variants,
        search_criteria: canonical.params,
    }))
}
