use crate::models::HealthResponse;
use rocket::serde::json::Json;
use rocket::{get, State};
use std::time::Instant;

pub struct StartedAt(pub Instant);

#[get("/health")]
pub fn health(started_at: &State<StartedAt>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: chrono::Utc::now().to_rfc3339(),
        service: "rental-watch",
        version: env!("CARGO_PKG_VERSION"),
        uptime: started_at.0.elapsed().as_secs() as i64,
    })
}
