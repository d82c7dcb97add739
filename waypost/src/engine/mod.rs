//! Engine session object
//!
//! `Engine` owns the whole proximity routing session: catalog, cache,
//! filter state, position tracking, and the refresh scheduler. All state
//! is explicit and per-session - two engines never share anything - so
//! sessions are independent and tests are deterministic.
//!
//! # Collaborator surface
//!
//! A presentation layer may only:
//!
//! - read [`Engine::visible_places`], [`Engine::cache_entry`], and
//!   [`Engine::status`];
//! - mutate filters, request a manual [`Engine::refresh`], and start or
//!   stop tracking;
//! - react to [`Engine::subscribe`] events by re-reading the above.
//!
//! Cycle internals are never exposed.
//!
//! # Refresh triggers
//!
//! A cycle is attempted on: the first fix (always a significant move),
//! every significant move, the periodic refresh signal, filter or search
//! changes while a position is known, and manual refresh requests. Each
//! trigger captures the visible list at that moment; the scheduler's
//! single-flight flag collapses overlapping triggers.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::cache::{RouteCacheEntry, RoutingCache};
use crate::catalog::{Catalog, Place};
use crate::config::EngineConfig;
use crate::position::{
    PositionEvent, PositionFix, PositionObservation, PositionTracker, TrackerConfig,
};
use crate::provider::RoutingProvider;
use crate::scheduler::{CycleEvent, CycleOutcome, RefreshScheduler, SchedulerConfig, StatusBoard};
use crate::view::{visible_list, FilterState, SortMode};

/// Capacity of the engine event channel.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Events a presentation layer re-renders on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineEvent {
    /// Filter, search, or sort state changed.
    FilterChanged,
    /// A position tracking event.
    Position(PositionEvent),
    /// A routing cycle event; the cache may hold fresher data.
    Cycle(CycleEvent),
}

struct EngineInner {
    catalog: Catalog,
    cache: Arc<RoutingCache>,
    filter: RwLock<FilterState>,
    status: Arc<StatusBoard>,
    tracker: PositionTracker,
    scheduler: Arc<RefreshScheduler>,
    events: broadcast::Sender<EngineEvent>,
    cancel: CancellationToken,
}

/// One proximity routing session.
///
/// Cheap to clone; clones share the session.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

impl Engine {
    /// Start a session over `catalog` using `provider` for lookups.
    ///
    /// Spawns the internal event forwarding task, so this must be called
    /// within a Tokio runtime.
    pub fn start(catalog: Catalog, provider: Arc<dyn RoutingProvider>, config: EngineConfig) -> Self {
        let cache = Arc::new(RoutingCache::with_staleness_window(config.staleness_window));
        let status = Arc::new(StatusBoard::new());
        let tracker = PositionTracker::new(TrackerConfig {
            movement_threshold_m: config.movement_threshold_m,
            refresh_interval: config.refresh_interval,
        });
        let scheduler = Arc::new(RefreshScheduler::new(
            provider,
            Arc::clone(&cache),
            tracker.position(),
            Arc::clone(&status),
            SchedulerConfig {
                batch_size: config.batch_size,
                batch_delay: config.batch_delay,
                status_clear_delay: config.status_clear_delay,
            },
        ));
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();

        let engine = Self {
            inner: Arc::new(EngineInner {
                catalog,
                cache,
                filter: RwLock::new(FilterState::default()),
                status,
                tracker,
                scheduler,
                events,
                cancel,
            }),
        };

        // Subscribe before spawning so no early event can slip past the
        // forwarder.
        let position_events = engine.inner.tracker.subscribe();
        let cycle_events = engine.inner.scheduler.subscribe();
        tokio::spawn(Self::forward_events(
            engine.clone(),
            position_events,
            cycle_events,
        ));
        engine
    }

    // ==================== Collaborator outputs ====================

    /// The currently visible, ordered place list.
    pub fn visible_places(&self) -> Vec<Place> {
        let filter = self.inner.filter.read();
        visible_list(self.inner.catalog.places(), &filter, &self.inner.cache)
    }

    /// The cached routing result for a place, if any.
    pub fn cache_entry(&self, place_id: &str) -> Option<RouteCacheEntry> {
        self.inner.cache.get(place_id)
    }

    /// Whether a cache entry is older than the staleness window.
    pub fn is_stale(&self, entry: &RouteCacheEntry) -> bool {
        self.inner.cache.is_stale(entry, Instant::now())
    }

    /// The current status line, if any.
    pub fn status(&self) -> Option<String> {
        self.inner.status.current()
    }

    /// The most recent position fix, if any.
    pub fn position(&self) -> Option<PositionFix> {
        self.inner.tracker.position().current()
    }

    /// The position the most recent cycle routed from.
    pub fn last_attempted_position(&self) -> Option<PositionFix> {
        self.inner.scheduler.last_attempted_position()
    }

    /// The catalog this session browses.
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    /// A copy of the current filter state.
    pub fn filter(&self) -> FilterState {
        self.inner.filter.read().clone()
    }

    /// Subscribe to engine events.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.inner.events.subscribe()
    }

    // ==================== Filter mutations ====================

    /// Replace the search query.
    pub fn set_search(&self, query: impl Into<String>) {
        self.inner.filter.write().search_query = query.into().trim().to_string();
        self.filter_changed();
    }

    /// Toggle one category on or off; returns whether it is now active.
    pub fn toggle_category(&self, category: &str) -> bool {
        let now_active = {
            let mut filter = self.inner.filter.write();
            if filter.active_categories.remove(category) {
                false
            } else {
                filter.active_categories.insert(category.to_string());
                true
            }
        };
        self.filter_changed();
        now_active
    }

    /// Replace the active category set.
    pub fn set_categories(&self, categories: BTreeSet<String>) {
        self.inner.filter.write().active_categories = categories;
        self.filter_changed();
    }

    /// Clear all category and search constraints.
    pub fn clear_filters(&self) {
        {
            let mut filter = self.inner.filter.write();
            filter.active_categories.clear();
            filter.search_query.clear();
        }
        self.filter_changed();
    }

    /// Change the sort mode.
    ///
    /// Re-ordering needs no fresh routing data, so this never triggers a
    /// cycle.
    pub fn set_sort(&self, mode: SortMode) {
        self.inner.filter.write().sort_mode = mode;
        let _ = self.inner.events.send(EngineEvent::FilterChanged);
    }

    // ==================== Refresh and tracking ====================

    /// Run a refresh cycle over the current visible list.
    ///
    /// Returns the outcome; overlapping calls collapse into the running
    /// cycle.
    pub async fn refresh(&self) -> CycleOutcome {
        let places = self.visible_places();
        self.inner.scheduler.try_refresh(&places).await
    }

    /// Begin consuming position observations from `rx`.
    ///
    /// Idempotent while a session is active; returns whether a new
    /// session started.
    pub fn start_tracking(&self, rx: mpsc::Receiver<PositionObservation>) -> bool {
        self.inner.tracker.start(rx).is_some()
    }

    /// Stop the active tracking session, if any.
    pub fn stop_tracking(&self) {
        self.inner.tracker.stop();
    }

    /// Whether position tracking is active.
    pub fn is_tracking(&self) -> bool {
        self.inner.tracker.is_active()
    }

    /// Tear down the session's background tasks.
    pub fn shutdown(&self) {
        self.inner.tracker.stop();
        self.inner.cancel.cancel();
    }

    // ==================== Internals ====================

    fn filter_changed(&self) {
        let _ = self.inner.events.send(EngineEvent::FilterChanged);
        // Filter and search changes re-route against the narrowed view,
        // but only once a position is known.
        if self.position().is_some() {
            self.spawn_refresh();
        }
    }

    fn spawn_refresh(&self) {
        let engine = self.clone();
        tokio::spawn(async move {
            if let CycleOutcome::Skipped(reason) = engine.refresh().await {
                debug!(?reason, "refresh trigger dropped");
            }
        });
    }

    async fn forward_events(
        engine: Engine,
        mut position_events: broadcast::Receiver<PositionEvent>,
        mut cycle_events: broadcast::Receiver<CycleEvent>,
    ) {
        let cancel = engine.inner.cancel.clone();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,

                event = position_events.recv() => match event {
                    Ok(event) => {
                        if matches!(
                            event,
                            PositionEvent::SignificantMove(_) | PositionEvent::RefreshDue
                        ) {
                            engine.spawn_refresh();
                        }
                        let _ = engine.inner.events.send(EngineEvent::Position(event));
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!(missed, "position event stream lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },

                event = cycle_events.recv() => match event {
                    Ok(event) => {
                        let _ = engine.inner.events.send(EngineEvent::Cycle(event));
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!(missed, "cycle event stream lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{BoxFuture, ProviderError, Route};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Provider that routes everything at 100 m / 80 s and counts calls.
    struct CountingProvider {
        calls: AtomicUsize,
    }

    impl CountingProvider {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl RoutingProvider for CountingProvider {
        fn route(
            &self,
            _origin: crate::geo::Coordinate,
            _destination: crate::geo::Coordinate,
        ) -> BoxFuture<'_, Result<Route, ProviderError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async {
                Ok(Route {
                    distance_meters: 100.0,
                    duration_seconds: 80.0,
                })
            })
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    fn test_catalog() -> Catalog {
        Catalog::from_json_slice(
            r#"[
                {"id": "tower", "name": "Eiffel Tower",
                 "category_tags": ["sights"], "latitude": 48.8584, "longitude": 2.2945},
                {"id": "bakery", "name": "Poilâne",
                 "category_tags": ["bakeries"], "latitude": 48.8510, "longitude": 2.3295}
            ]"#
            .as_bytes(),
        )
        .unwrap()
    }

    fn test_engine(provider: Arc<dyn RoutingProvider>) -> Engine {
        Engine::start(
            test_catalog(),
            provider,
            EngineConfig::default()
                .with_batch_size(2)
                .with_batch_delay(Duration::from_millis(10)),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_visible_places_defaults_to_whole_catalog() {
        let engine = test_engine(Arc::new(CountingProvider::new()));
        assert_eq!(engine.visible_places().len(), 2);
        assert!(engine.status().is_none());
        assert!(engine.position().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_filter_mutations_emit_events() {
        let engine = test_engine(Arc::new(CountingProvider::new()));
        let mut events = engine.subscribe();

        engine.set_search("tower");
        assert_eq!(events.recv().await.unwrap(), EngineEvent::FilterChanged);
        assert_eq!(engine.visible_places().len(), 1);

        assert!(engine.toggle_category("bakeries"));
        events.recv().await.unwrap();
        assert!(!engine.toggle_category("bakeries"));

        engine.clear_filters();
        assert_eq!(engine.filter().search_query, "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_refresh_without_position_is_dropped() {
        let provider = Arc::new(CountingProvider::new());
        let engine = test_engine(Arc::clone(&provider) as Arc<dyn RoutingProvider>);

        let outcome = engine.refresh().await;
        assert!(matches!(outcome, CycleOutcome::Skipped(_)));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_fix_triggers_cycle() {
        let provider = Arc::new(CountingProvider::new());
        let engine = test_engine(Arc::clone(&provider) as Arc<dyn RoutingProvider>);
        let mut events = engine.subscribe();

        let (tx, rx) = mpsc::channel(8);
        assert!(engine.start_tracking(rx));
        tx.send(Ok(PositionFix::new(48.8566, 2.3522).unwrap()))
            .await
            .unwrap();

        // Wait for the cycle the first (always significant) fix triggers.
        loop {
            let event = tokio::time::timeout(Duration::from_secs(10), events.recv())
                .await
                .expect("no completion event")
                .unwrap();
            if matches!(event, EngineEvent::Cycle(CycleEvent::Completed(_))) {
                break;
            }
        }

        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
        assert!(engine.cache_entry("tower").is_some());
        assert!(engine.cache_entry("bakery").is_some());
        assert!(engine.last_attempted_position().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_change_with_position_triggers_cycle() {
        let provider = Arc::new(CountingProvider::new());
        let engine = test_engine(Arc::clone(&provider) as Arc<dyn RoutingProvider>);
        let mut events = engine.subscribe();

        let (tx, rx) = mpsc::channel(8);
        engine.start_tracking(rx);
        tx.send(Ok(PositionFix::new(48.8566, 2.3522).unwrap()))
            .await
            .unwrap();
        loop {
            let event = events.recv().await.unwrap();
            if matches!(event, EngineEvent::Cycle(CycleEvent::Completed(_))) {
                break;
            }
        }
        let after_first = provider.calls.load(Ordering::SeqCst);

        // Narrow the view; the triggered cycle routes only one place.
        engine.set_search("tower");
        loop {
            let event = tokio::time::timeout(Duration::from_secs(10), events.recv())
                .await
                .expect("no completion event")
                .unwrap();
            if matches!(event, EngineEvent::Cycle(CycleEvent::Completed(_))) {
                break;
            }
        }
        assert_eq!(provider.calls.load(Ordering::SeqCst), after_first + 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sort_change_does_not_trigger_cycle() {
        let provider = Arc::new(CountingProvider::new());
        let engine = test_engine(Arc::clone(&provider) as Arc<dyn RoutingProvider>);
        let mut events = engine.subscribe();

        let (tx, rx) = mpsc::channel(8);
        engine.start_tracking(rx);
        tx.send(Ok(PositionFix::new(48.8566, 2.3522).unwrap()))
            .await
            .unwrap();
        loop {
            let event = events.recv().await.unwrap();
            if matches!(event, EngineEvent::Cycle(CycleEvent::Completed(_))) {
                break;
            }
        }
        // Let any trailing triggers resolve, then drain the backlog.
        tokio::time::sleep(Duration::from_millis(100)).await;
        while events.try_recv().is_ok() {}
        let before = provider.calls.load(Ordering::SeqCst);

        engine.set_sort(SortMode::Name);
        tokio::time::sleep(Duration::from_secs(1)).await;
        while let Ok(event) = events.try_recv() {
            assert!(
                !matches!(event, EngineEvent::Cycle(CycleEvent::Completed(_))),
                "sort change must not start a cycle"
            );
        }
        assert_eq!(provider.calls.load(Ordering::SeqCst), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_tracking() {
        let engine = test_engine(Arc::new(CountingProvider::new()));
        let (_tx, rx) = mpsc::channel(8);
        engine.start_tracking(rx);
        assert!(engine.is_tracking());

        engine.shutdown();
        tokio::task::yield_now().await;
        assert!(!engine.is_tracking());
    }
}
