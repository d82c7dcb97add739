//! Filter, search, and sort pipeline
//!
//! Derives the currently visible, ordered place list from the catalog,
//! the filter state, and the routing cache. The pipeline is a pure
//! function: it never mutates the catalog and produces a fresh ordered
//! copy on every call, so callers can re-derive at will (after every
//! batch, on every filter change) without bookkeeping.
//!
//! # Ordering
//!
//! The sort is stable with the catalog order as the tie-breaker. Two
//! places with identical cached durations keep their relative catalog
//! positions across refreshes, so adjacent cards do not jitter while a
//! cycle is updating the cache underneath.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::cache::RoutingCache;
use crate::catalog::Place;

/// How the visible list is ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    /// Ascending cached walking duration; places without an entry last.
    #[default]
    WalkingTime,
    /// Ascending cached walking distance; places without an entry last.
    WalkingDistance,
    /// Ascending case-insensitive name.
    Name,
}

impl SortMode {
    /// Kebab-case identifier used in config files and CLIs.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::WalkingTime => "walking-time",
            SortMode::WalkingDistance => "walking-distance",
            SortMode::Name => "name",
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SortMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "walking-time" => Ok(SortMode::WalkingTime),
            "walking-distance" => Ok(SortMode::WalkingDistance),
            "name" => Ok(SortMode::Name),
            other => Err(format!("unknown sort mode: {}", other)),
        }
    }
}

/// The user's current filter, search, and sort selection.
///
/// Mutated only by explicit user actions; the engine owns the single
/// instance per session.
#[derive(Debug, Clone, Default)]
pub struct FilterState {
    /// Selected categories. Empty means no category filtering. A place
    /// matching any one selected category is kept (OR semantics).
    pub active_categories: BTreeSet<String>,

    /// Free-text query; empty means no search filtering.
    pub search_query: String,

    /// Current ordering.
    pub sort_mode: SortMode,
}

impl FilterState {
    /// Whether any category or search constraint is active.
    pub fn is_filtering(&self) -> bool {
        !self.active_categories.is_empty() || !self.search_query.is_empty()
    }
}

/// Derive the visible, ordered place list.
///
/// Applies the category OR-filter, then the case-insensitive substring
/// search, then a stable sort per [`SortMode`]. The input order of
/// `catalog` is the tie-break order.
pub fn visible_list(catalog: &[Place], filter: &FilterState, cache: &RoutingCache) -> Vec<Place> {
    let mut list: Vec<Place> = catalog
        .iter()
        .filter(|p| {
            filter.active_categories.is_empty()
                || p.matches_any_category(&filter.active_categories)
        })
        .filter(|p| {
            if filter.search_query.is_empty() {
                return true;
            }
            p.search_haystack()
                .contains(&filter.search_query.to_lowercase())
        })
        .cloned()
        .collect();

    match filter.sort_mode {
        SortMode::WalkingTime => {
            list.sort_by(|a, b| {
                cached_or_inf(cache, &a.id, |e| e.duration_seconds)
                    .total_cmp(&cached_or_inf(cache, &b.id, |e| e.duration_seconds))
            });
        }
        SortMode::WalkingDistance => {
            list.sort_by(|a, b| {
                cached_or_inf(cache, &a.id, |e| e.distance_meters)
                    .total_cmp(&cached_or_inf(cache, &b.id, |e| e.distance_meters))
            });
        }
        SortMode::Name => {
            list.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        }
    }

    list
}

/// Cached metric for a place, or infinity when no entry exists so that
/// unrouted places sort after all routed ones.
fn cached_or_inf(
    cache: &RoutingCache,
    place_id: &str,
    metric: impl Fn(&crate::cache::RouteCacheEntry) -> f64,
) -> f64 {
    cache
        .get(place_id)
        .map(|entry| metric(&entry))
        .unwrap_or(f64::INFINITY)
}
