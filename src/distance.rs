//! `metroValueText -> distanceMeters` conversion and the "effective
//! distance" reduction used by the policy engine.

use crate::models::MetroDistance;
use regex::Regex;
use std::sync::OnceLock;

fn meters_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^\s*(\d+)\s*meters?\s*$").unwrap())
}

fn minutes_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^\s*(\d+)\s*minutes?\s*$").unwrap())
}

/// `spec.md` §4.5: `<N> meters` -> N; `<N> minutes` -> N * walking speed;
/// anything else -> `None`.
pub fn distance_meters(text: &str, walking_speed_m_per_min: f64) -> Option<i64> {
    if let Some(caps) = meters_re().captures(text) {
        return caps[1].parse::<i64>().ok();
    }
    if let Some(caps) = minutes_re().captures(text) {
        let minutes: f64 = caps[1].parse().ok()?;
        return Some((minutes * walking_speed_m_per_min).round() as i64);
    }
    None
}

/// Minimum across a listing's metro facets; falls back to the primary
/// (first) facet's text if none resolved; `None` means "distance unknown".
pub fn effective_distance(facets: &[MetroDistance], walking_speed_m_per_min: f64) -> Option<i64> {
    let resolved: Vec<i64> = facets.iter().filter_map(|f| f.distance_meters).collect();
    if let Some(min) = resolved.into_iter().min() {
        return Some(min);
    }
    facets
        .first()
        .and_then(|f| distance_meters(&f.metro_value_text, walking_speed_m_per_min))
}
