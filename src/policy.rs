//! Notification Policy Engine: `spec.md` §4.5's decision table, implemented
//! as a `match` so the table is auditable as code rather than data.

use crate::distance::effective_distance;
use crate::models::{FilterOptions, FilteredMode, Listing, NotificationDecision, NotifyMode};

pub fn classify(
    listing: &Listing,
    notify_mode: NotifyMode,
    filtered_mode: FilteredMode,
    filter: &FilterOptions,
    walking_speed_m_per_min: f64,
) -> NotificationDecision {
    let distance_from_mrt = effective_distance(&listing.metro_distances, walking_speed_m_per_min);
    let distance_threshold = filter.mrt_distance_threshold;

    // "Distance unknown" is never far, even when a threshold is set.
    let is_far_from_mrt = match (distance_from_mrt, distance_threshold) {
        (Some(d), Some(t)) => d > t,
        _ => false,
    };

    let (will_notify, is_silent) = match (notify_mode, is_far_from_mrt, filtered_mode) {
        (NotifyMode::All, _, _) => (true, false),
        (NotifyMode::None, _, _) => (false, false),
        (NotifyMode::Filtered, false, _) => (true, false),
        (NotifyMode::Filtered, true, FilteredMode::Silent) => (true, true),
        (NotifyMode::Filtered, true, FilteredMode::Normal) => (false, false),
        (NotifyMode::Filtered, true, FilteredMode::None) => (false, false),
    };

    NotificationDecision {
        will_notify,
        is_silent,
        distance_from_mrt,
        distance_threshold,
        is_far_from_mrt,
    }
}
