//! Routing result cache
//!
//! Maps place ids to the last successfully routed distance/duration. The
//! cache is unbounded - it is sized by the small, static catalog - and has
//! no eviction: entries are only ever overwritten by newer successful
//! lookups. A failed lookup never touches an entry, preserving last known
//! good data.
//!
//! Staleness is advisory: [`RoutingCache::is_stale`] flags entries older
//! than the configured window so a frontend can render an age hint, but
//! stale entries are still returned and still used for sorting.

use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::config::DEFAULT_STALENESS_WINDOW;

/// A cached routing result for one place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteCacheEntry {
    /// Routed walking distance in meters.
    pub distance_meters: f64,
    /// Walking duration in seconds.
    pub duration_seconds: f64,
    /// When this entry was computed.
    pub computed_at: Instant,
}

/// Place-id keyed cache of routing results.
///
/// Safe to share across tasks; the scheduler's single-flight guarantee is
/// what keeps whole cycles from interleaving writes, not this type.
#[derive(Debug)]
pub struct RoutingCache {
    entries: DashMap<String, RouteCacheEntry>,
    staleness_window: Duration,
}

impl RoutingCache {
    /// Create an empty cache with the default staleness window.
    pub fn new() -> Self {
        Self::with_staleness_window(DEFAULT_STALENESS_WINDOW)
    }

    /// Create an empty cache with a custom staleness window.
    pub fn with_staleness_window(staleness_window: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            staleness_window,
        }
    }

    /// Look up the entry for a place.
    pub fn get(&self, place_id: &str) -> Option<RouteCacheEntry> {
        self.entries.get(place_id).map(|entry| *entry.value())
    }

    /// Store a result, unconditionally overwriting any prior entry.
    pub fn put(&self, place_id: &str, distance_meters: f64, duration_seconds: f64, now: Instant) {
        self.entries.insert(
            place_id.to_string(),
            RouteCacheEntry {
                distance_meters,
                duration_seconds,
                computed_at: now,
            },
        );
    }

    /// Whether a place has an entry.
    pub fn contains(&self, place_id: &str) -> bool {
        self.entries.contains_key(place_id)
    }

    /// Whether `entry` is older than the staleness window at `now`.
    ///
    /// Staleness never removes an entry; it is display advice only.
    pub fn is_stale(&self, entry: &RouteCacheEntry, now: Instant) -> bool {
        now.saturating_duration_since(entry.computed_at) > self.staleness_window
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for RoutingCache {
    fn default() -> Self {
        Self::new()
    }
}
