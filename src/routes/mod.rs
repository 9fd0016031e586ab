pub mod crawl;
pub mod health;
pub mod query;

use crate::config::AppConfig;
use crate::error::CrawlError;
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome, Request};

/// Shared-secret auth guard: `x-api-key` header or `apiKey` query param.
/// When no secret is configured, auth is disabled (a warning is logged once
/// at startup, not per-request).
pub struct ApiKey;

#[rocket::async_trait]
impl<'r> FromRequest<'r> for ApiKey {
    type Error = CrawlError;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let config = req.rocket().state::<AppConfig>().expect("AppConfig is always managed");
        let Some(expected) = &config.api_key else {
            return Outcome::Success(ApiKey);
        };

        let provided = req
            .headers()
            .get_one("x-api-key")
            .map(str::to_string)
            .or_else(|| req.query_value::<String>("apiKey").and_then(Result::ok));

        match provided {
            Some(key) if &key == expected => Outcome::Success(ApiKey),
            _ => Outcome::Error((Status::Unauthorized, CrawlError::Unauthorized)),
        }
    }
}

#[rocket::catch(404)]
pub fn not_found() -> rocket::serde::json::Json<serde_json::Value> {
    rocket::serde::json::Json(serde_json::json!({ "error": "not found" }))
}

#[rocket::catch(401)]
pub fn unauthorized() -> rocket::serde::json::Json<serde_json::Value> {
    rocket::serde::json::Json(serde_json::json!({ "error": "unauthorized" }))
}
