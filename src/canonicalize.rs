//! URL Canonicalizer: turns a search URL into a deterministic `QueryId` plus
//! the facets the rest of the pipeline needs. Pure, no I/O.

use crate::error::CrawlError;
use crate::models::{Canonical, CanonicalParams};
use std::collections::BTreeMap;

const LISTINGS_HOST: &str = "rent.591.com.tw";
const LISTINGS_PATH_PREFIX: &str = "/list";

/// A handful of known station-id -> display-name mappings. Real deployments
/// would load this from a reference table; unknown ids fall back to the raw
/// id, per `spec.md` §4.1.
fn station_name(id: &str) -> Option<&'static str> {
    match id {
        "4232" => Some("Jiannan Rd."),
        "4233" => Some("Xihu"),
        _ => None,
    }
}

pub fn canonicalize(url: &str) -> Result<Canonical, CrawlError> {
    let parsed = url::Url::parse(url).map_err(|e| CrawlError::InvalidUrl(e.to_string()))?;

    let host = parsed.host_str().unwrap_or("");
    if !host.contains(LISTINGS_HOST) || !parsed.path().starts_with(LISTINGS_PATH_PREFIX) {
        return Err(CrawlError::InvalidUrl(format!(
            "not a listings url: {url}"
        )));
    }

    let raw: BTreeMap<String, Vec<String>> = group_params(&parsed);

    let region = raw
        .get("region")
        .and_then(|v| v.first())
        .cloned()
        .ok_or_else(|| CrawlError::InvalidQuery("missing region".to_string()))?;

    let kind = raw.get("kind").and_then(|v| v.first()).cloned();
    let kind_explicit = kind.as_deref().filter(|k| *k != "0").map(str::to_string);

    let stations = normalize_stations(raw.get("station"));

    let metro_line = raw.get("metro").and_then(|v| v.first()).cloned();

    let (price_min, price_max) = match raw.get("rentprice").and_then(|v| v.first()) {
        Some(range) => parse_price_range(range),
        None => (None, None),
    };

    let sections = csv_list(raw.get("section"));
    let rooms = csv_list(raw.get("multiRoom"));
    let floor = raw.get("other").and_then(|v| v.first()).cloned();

    let params = CanonicalParams {
        region: region.clone(),
        kind: kind_explicit.clone(),
        stations: stations.clone(),
        metro_line: metro_line.clone(),
        price_min,
        price_max,
        sections: sections.clone(),
        rooms: rooms.clone(),
        floor: floor.clone(),
    };

    let query_id = build_query_id(&params);
    let description = build_description(&params);
    let canonical_url = build_canonical_url(&parsed, &params, has_rentprice(&raw));
    let equivalent_variants =
        build_equivalent_variants(&parsed, &params, has_rentprice(&raw));

    Ok(Canonical {
        query_id,
        description,
        canonical_url,
        equivalent_variants,
        params,
    })
}

fn has_rentprice(raw: &BTreeMap<String, Vec<String>>) -> bool {
    raw.contains_key("rentprice")
}

/// Group repeated query params (`?station=1&station=2`) and comma-separated
/// single values (`?station=1,2`) into ordered lists per key, preserving
/// first-occurrence order of distinct keys for output stability.
fn group_params(url: &url::Url) -> BTreeMap<String, Vec<String>> {
    let mut out: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (k, v) in url.query_pairs() {
        out.entry(k.to_string()).or_default().push(v.to_string());
    }
    out
}

/// Split, trim, drop empties, sort ascending (string), dedupe.
fn normalize_stations(raw: Option<&Vec<String>>) -> Vec<String> {
    let Some(values) = raw else {
        return Vec::new();
    };
    let mut stations: Vec<String> = values
        .iter()
        .flat_map(|v| v.split(','))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    stations.sort();
    stations.dedup();
    stations
}

fn csv_list(raw: Option<&Vec<String>>) -> Vec<String> {
    let Some(values) = raw else {
        return Vec::new();
    };
    values
        .iter()
        .flat_map(|v| v.split(','))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_price_range(range: &str) -> (Option<i64>, Option<i64>) {
    let mut parts = range.splitn(2, ',');
    let min = parts.next().and_then(|s| s.trim().parse().ok());
    let max = parts.next().and_then(|s| s.trim().parse().ok());
    (min, max)
}

fn build_query_id(p: &CanonicalParams) -> String {
    let mut facets = vec![format!("region{}", p.region)];
    if let Some(kind) = &p.kind {
        facets.push(format!("kind{kind}"));
    }
    if !p.stations.is_empty() {
        facets.push(format!("stations{}", p.stations.join("-")));
    }
    if let Some(metro) = &p.metro_line {
        facets.push(format!("metro{metro}"));
    }
    if p.price_min.is_some() || p.price_max.is_some() {
        let min = p.price_min.map(|v| v.to_string()).unwrap_or_default();
        let max = p.price_max.map(|v| v.to_string()).unwrap_or_default();
        facets.push(format!("price{min},{max}"));
    }
    if !p.sections.is_empty() {
        facets.push(format!("section{}", p.sections.join(",")));
    }
    if !p.rooms.is_empty() {
        facets.push(format!("rooms{}", p.rooms.join(",")));
    }
    if let Some(floor) = &p.floor {
        facets.push(format!("floor{floor}"));
    }
    facets.join("_")
}

fn build_description(p: &CanonicalParams) -> String {
    let mut parts = vec![format!("Region {}", p.region)];
    if let Some(kind) = &p.kind {
        parts.push(format!("Type {kind}"));
    }
    match p.stations.len() {
        0 => {}
        1 => {
            let id = &p.stations[0];
            let name = station_name(id).map(str::to_string).unwrap_or_else(|| id.clone());
            parts.push(format!("near {name}"));
        }
        n => parts.push(format!("near {n} stations")),
    }
    if let Some(metro) = &p.metro_line {
        parts.push(format!("line {metro}"));
    }
    match (p.price_min, p.price_max) {
        (Some(min), Some(max)) => parts.push(format!("NT${min}-{max}")),
        (Some(min), None) => parts.push(format!("NT${min}+")),
        (None, Some(max)) => parts.push(format!("under NT${max}")),
        (None, None) => {}
    }
    if !p.sections.is_empty() {
        parts.push(format!("section {}", p.sections.join(",")));
    }
    if !p.rooms.is_empty() {
        parts.push(format!("{} rooms", p.rooms.join(",")));
    }
    if let Some(floor) = &p.floor {
        parts.push(format!("floor {floor}"));
    }
    parts.join(", ")
}

fn build_canonical_url(
    original: &url::Url,
    p: &CanonicalParams,
    has_rentprice: bool,
) -> String {
    let mut out = original.clone();
    out.set_query(None);
    let mut pairs: Vec<(String, String)> = Vec::new();
    if let Some(kind) = &p.kind {
        pairs.push(("kind".to_string(), kind.clone()));
    }
    if let Some(metro) = &p.metro_line {
        pairs.push(("metro".to_string(), metro.clone()));
    }
    if !p.rooms.is_empty() {
        pairs.push(("multiRoom".to_string(), p.rooms.join(",")));
    }
    if let Some(floor) = &p.floor {
        pairs.push(("other".to_string(), floor.clone()));
    }
    pairs.push(("region".to_string(), p.region.clone()));
    if has_rentprice {
        pairs.push((
            "rentprice".to_string(),
            format!(
                "{},{}",
                p.price_min.map(|v| v.to_string()).unwrap_or_default(),
                p.price_max.map(|v| v.to_string()).unwrap_or_default()
            ),
        ));
    }
    if !p.sections.is_empty() {
        pairs.push(("section".to_string(), p.sections.join(",")));
    }
    if !p.stations.is_empty() {
        pairs.push(("station".to_string(), p.stations.join(",")));
    }
    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    {
        let mut qp = out.query_pairs_mut();
        for (k, v) in &pairs {
            qp.append_pair(k, v);
        }
    }
    out.to_string()
}

/// Combinatorial set of URLs that are semantically identical to the input:
/// {stations as csv, stations as repeated keys} x {default kind present,
/// default kind absent} — only when kind is actually default.
fn build_equivalent_variants(
    original: &url::Url,
    p: &CanonicalParams,
    has_rentprice: bool,
) -> Vec<String> {
    let station_forms: Vec<Option<Vec<(String, String)>>> = if p.stations.is_empty() {
        vec![None]
    } else {
        vec![
            Some(vec![("station".to_string(), p.stations.join(","))]),
            Some(
                p.stations
                    .iter()
                    .map(|s| ("station".to_string(), s.clone()))
                    .collect(),
            ),
        ]
    };

    let kind_forms: Vec<Option<String>> = if p.kind.is_none() {
        vec![None, Some("0".to_string())]
    } else {
        vec![p.kind.clone()]
    };

    let mut variants = Vec::new();
    for stations in &station_forms {
        for kind in &kind_forms {
            let mut out = original.clone();
            out.set_query(None);
            let mut pairs: Vec<(String, String)> = Vec::new();
            if let Some(k) = kind {
                pairs.push(("kind".to_string(), k.clone()));
            }
            if let Some(metro) = &p.metro_line {
                pairs.push(("metro".to_string(), metro.clone()));
            }
            if !p.rooms.is_empty() {
                pairs.push(("multiRoom".to_string(), p.rooms.join(",")));
            }
            if let Some(floor) = &p.floor {
                pairs.push(("other".to_string(), floor.clone()));
            }
            pairs.push(("region".to_string(), p.region.clone()));
            if has_rentprice {
                pairs.push((
                    "rentprice".to_string(),
                    format!(
                        "{},{}",
                        p.price_min.map(|v| v.to_string()).unwrap_or_default(),
                        p.price_max.map(|v| v.to_string()).unwrap_or_default()
                    ),
                ));
            }
            if !p.sections.is_empty() {
                pairs.push(("section".to_string(), p.sections.join(",")));
            }
            if let Some(station_pairs) = stations {
                pairs.extend(station_pairs.iter().cloned());
            }

            let mut qp = out.query_pairs_mut();
            for (k, v) in &pairs {
                qp.append_pair(k, v);
            }
            drop(qp);
            variants.push(out.to_string());
        }
    }
    variants.sort();
    variants.dedup();
    variants
}
