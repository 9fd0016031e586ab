//! Merge Engine: deduplicates listings observed across station sub-crawls
//! and unions their metro-distance facets. A non-multi-station input is a
//! trivial pass-through (a single-element `per_station`).

use crate::models::{MergedListing, MetroDistance, RawListing};
use indexmap::IndexMap;
use std::collections::HashSet;

/// One station sub-crawl's raw output, tagged with the station it ran
/// against so facets can be attached correctly.
pub struct StationResult {
    pub station_id: Option<String>,
    pub listings: Vec<RawListing>,
}

/// `PropertyId` derivation, reliability-ordered (`spec.md` §3):
/// 1. numeric path segment in `link`
/// 2. `"title-stationName"` slug
/// 3. slugified `title` alone
pub fn property_id(raw: &RawListing) -> String {
    if let Some(id) = numeric_path_segment(&raw.link) {
        return id;
    }
    if let Some(station) = raw.metro.as_ref().and_then(|m| m.station_name.as_deref()) {
        return slugify(&format!("{}-{}", raw.title, station));
    }
    slugify(&raw.title)
}

fn numeric_path_segment(link: &str) -> Option<String> {
    let path = link.split(['?', '#']).next().unwrap_or(link);
    path.split('/')
        .filter(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()))
        .next_back()
        .map(str::to_string)
}

fn slugify(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_was_dash = false;
    for c in s.chars() {
        if c.is_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            last_was_dash = false;
        } else if !last_was_dash && !out.is_empty() {
            out.push('-');
            last_was_dash = true;
        }
    }
    out.trim_end_matches('-').to_string()
}

/// Merge per-station listing arrays, keying on `PropertyId`. Preserves
/// first-observed order across stations; unions metro facets, deduping on
/// `(station_id, station_name, metro_value_text)`.
pub fn merge(per_station: Vec<StationResult>) -> Vec<MergedListing> {
    let mut order: IndexMap<String, MergedListing> = IndexMap::new();

    for station in per_station {
        for raw in station.listings {
            let id = property_id(&raw);
            let facet = raw.metro.clone().map(|mut m| {
                if m.station_id.is_none() {
                    m.station_id = station.station_id.clone();
                }
                m
            });

            match order.get_mut(&id) {
                Some(existing) => {
                    if let Some(f) = facet {
                        push_facet(&mut existing.metro_distances, f);
                    }
                }
                None => {
                    let mut metro_distances = Vec::new();
                    if let Some(f) = facet {
                        metro_distances.push(f);
                    }
                    order.insert(
                        id.clone(),
                        MergedListing {
                            id,
                            title: raw.title,
                            link: raw.link,
                            house_type: raw.house_type,
                            rooms: raw.rooms,
                            tags_list: raw.tags_list,
                            image_urls: raw.image_urls,
                            price_text: raw.price_text,
                            metro_distances,
                        },
                    );
                }
            }
        }
    }

    order.into_values().collect()
}

fn push_facet(facets: &mut Vec<MetroDistance>, new: MetroDistance) {
    let key = |f: &MetroDistance| (f.station_id.clone(), f.station_name.clone(), f.metro_value_text.clone());
    let new_key = key(&new);
    let mut seen: HashSet<_> = facets.iter().map(key).collect();
    if seen.insert(new_key) {
        facets.push(new);
    }
}
