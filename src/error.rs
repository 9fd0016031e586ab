use rocket::http::Status;
use rocket::response::{self, Responder, Response};
use rocket::serde::json::Json;
use rocket::Request;
use thiserror::Error;

/// Typed error taxonomy for the crawl orchestration engine.
///
/// Variants map 1:1 to the kinds in the error handling design: request-time
/// input rejection, auth, fetch/parse/storage failures, and read-side lookup
/// misses. The orchestrator decides what to do with each; the `Responder`
/// impl below is only consulted at the REST edge.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("fetch failed after {attempts} attempt(s): {source}")]
    FetchFailed { attempts: u32, source: String },

    /// Constructed for logging a malformed document; the Listing Parser
    /// degrades to an empty result instead of raising this, so it never
    /// reaches the orchestrator in normal operation.
    #[error("parse failed: {0}")]
    ParseFailed(String),

    #[error("storage failure: {0}")]
    StorageFailure(String),

    #[error("notification failure: {0}")]
    NotificationFailure(String),

    #[error("query not found: {0}")]
    QueryNotFound(String),
}

impl From<rusqlite::Error> for CrawlError {
    fn from(e: rusqlite::Error) -> Self {
        CrawlError::StorageFailure(e.to_string())
    }
}

impl CrawlError {
    pub fn status(&self) -> Status {
        match self {
            CrawlError::InvalidUrl(_) | CrawlError::InvalidQuery(_) => Status::BadRequest,
            CrawlError::Unauthorized => Status::Unauthorized,
            CrawlError::QueryNotFound(_) => Status::NotFound,
            CrawlError::FetchFailed { .. }
            | CrawlError::ParseFailed(_)
            | CrawlError::StorageFailure(_)
            | CrawlError::NotificationFailure(_) => Status::InternalServerError,
        }
    }
}

impl<'r> Responder<'r, 'static> for CrawlError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        tracing::error!(error = %self, "request failed");
        let status = self.status();
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        Response::build_from(body.respond_to(req)?)
            .status(status)
            .ok()
    }
}
