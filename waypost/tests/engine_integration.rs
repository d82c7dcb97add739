//! Integration tests for the proximity routing engine.
//!
//! These tests verify the complete flow:
//! - position fix → tracker → engine → refresh cycle → cache → view
//! - batching, single-flight, and failure isolation end to end
//! - status text after mixed-outcome cycles
//!
//! Run with: `cargo test --test engine_integration`

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use waypost::catalog::Catalog;
use waypost::config::EngineConfig;
use waypost::engine::{Engine, EngineEvent};
use waypost::geo::Coordinate;
use waypost::position::PositionFix;
use waypost::provider::{
    BoxFuture, FixedPaceProvider, ProviderError, Route, RoutingProvider,
};
use waypost::scheduler::{CycleEvent, CycleOutcome, SkipReason};
use waypost::view::SortMode;

// ============================================================================
// Helper Functions
// ============================================================================

/// A provider scripted per destination latitude.
///
/// Test places sit at unique latitudes (48.0001, 48.0002, ...), so the
/// latitude identifies the place without threading ids through the
/// provider boundary.
struct ScriptedProvider {
    routes: HashMap<String, Result<Route, ProviderError>>,
    calls: Mutex<Vec<String>>,
    total_calls: AtomicUsize,
}

impl ScriptedProvider {
    fn new(routes: Vec<(usize, Result<Route, ProviderError>)>) -> Self {
        Self {
            routes: routes
                .into_iter()
                .map(|(index, route)| (lat_key(index), route))
                .collect(),
            calls: Mutex::new(Vec::new()),
            total_calls: AtomicUsize::new(0),
        }
    }

    fn distance(meters: f64) -> Result<Route, ProviderError> {
        // Duration deliberately bogus; tests wrap this in a fixed-pace
        // decorator when duration matters.
        Ok(Route {
            distance_meters: meters,
            duration_seconds: 1.0,
        })
    }

    fn calls(&self) -> usize {
        self.total_calls.load(Ordering::SeqCst)
    }
}

impl RoutingProvider for ScriptedProvider {
    fn route(
        &self,
        _origin: Coordinate,
        destination: Coordinate,
    ) -> BoxFuture<'_, Result<Route, ProviderError>> {
        let key = format!("{:.4}", destination.latitude);
        self.total_calls.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().push(key.clone());
        Box::pin(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.routes
                .get(&key)
                .cloned()
                .unwrap_or(Err(ProviderError::NoRoute))
        })
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

fn lat_key(index: usize) -> String {
    format!("{:.4}", 48.0 + index as f64 / 10_000.0)
}

/// A catalog of `n` places with ids `p1..pn` at unique latitudes.
fn catalog(n: usize) -> Catalog {
    let places = (1..=n)
        .map(|i| {
            format!(
                r#"{{"id": "p{i}", "name": "Place {i}",
                    "category_tags": ["sights"],
                    "latitude": {lat:.4}, "longitude": 2.35}}"#,
                lat = 48.0 + i as f64 / 10_000.0
            )
        })
        .collect::<Vec<_>>()
        .join(", ");
    Catalog::from_json_slice(format!("[{}]", places).as_bytes()).unwrap()
}

fn fast_config(batch_size: usize) -> EngineConfig {
    EngineConfig::default()
        .with_batch_size(batch_size)
        .with_batch_delay(Duration::from_millis(20))
}

/// Feed one fix and wait until the triggered cycle completes.
async fn acquire_position(engine: &Engine, tx: &mpsc::Sender<waypost::position::PositionObservation>) {
    let mut events = engine.subscribe();
    tx.send(Ok(PositionFix::new(48.8566, 2.3522).unwrap()))
        .await
        .unwrap();
    wait_for_completed(&mut events).await;
}

async fn wait_for_completed(
    events: &mut tokio::sync::broadcast::Receiver<EngineEvent>,
) -> EngineEvent {
    loop {
        let event = tokio::time::timeout(Duration::from_secs(30), events.recv())
            .await
            .expect("timed out waiting for cycle completion")
            .expect("engine event channel closed");
        if matches!(event, EngineEvent::Cycle(CycleEvent::Completed(_))) {
            return event;
        }
    }
}

fn visible_ids(engine: &Engine) -> Vec<String> {
    engine
        .visible_places()
        .into_iter()
        .map(|p| p.id)
        .collect()
}

// ============================================================================
// Integration Tests
// ============================================================================

/// Full pipeline: 4 places, batch size 2, all lookups succeed with
/// distances [300, 1200, 50, 900] m at a fixed 1 m/s pace. After the
/// cycle the distance sort orders them [50, 300, 900, 1200] and the
/// status line is clear.
#[tokio::test(start_paused = true)]
async fn test_full_cycle_orders_by_distance() {
    let scripted = ScriptedProvider::new(vec![
        (1, ScriptedProvider::distance(300.0)),
        (2, ScriptedProvider::distance(1200.0)),
        (3, ScriptedProvider::distance(50.0)),
        (4, ScriptedProvider::distance(900.0)),
    ]);
    let provider = Arc::new(FixedPaceProvider::new(scripted, 1.0));

    let engine = Engine::start(catalog(4), provider, fast_config(2));
    engine.set_sort(SortMode::WalkingDistance);

    let (tx, rx) = mpsc::channel(8);
    assert!(engine.start_tracking(rx));
    acquire_position(&engine, &tx).await;

    assert_eq!(visible_ids(&engine), vec!["p3", "p1", "p4", "p2"]);
    assert!(engine.status().is_none(), "no failures leaves status clear");

    // Fixed pace of 1 m/s makes duration equal distance; the time sort
    // must agree with the distance sort.
    engine.set_sort(SortMode::WalkingTime);
    assert_eq!(visible_ids(&engine), vec!["p3", "p1", "p4", "p2"]);

    let entry = engine.cache_entry("p3").unwrap();
    assert_eq!(entry.distance_meters, 50.0);
    assert_eq!(entry.duration_seconds, 50.0);
}

/// Mixed outcomes: lookups for places 1 and 3 fail, 2 and 4 succeed.
/// The status reads "Updated 2 of 4 places" and the failed places keep
/// whatever cache state they had before the cycle.
#[tokio::test(start_paused = true)]
async fn test_partial_failure_keeps_prior_entries() {
    let scripted = ScriptedProvider::new(vec![
        (1, Err(ProviderError::Network("down".to_string()))),
        (2, ScriptedProvider::distance(700.0)),
        (3, Err(ProviderError::HttpStatus(500))),
        (4, ScriptedProvider::distance(400.0)),
    ]);
    let provider = Arc::new(FixedPaceProvider::new(scripted, 1.0));

    let engine = Engine::start(catalog(4), provider, fast_config(2));
    let (tx, rx) = mpsc::channel(8);
    engine.start_tracking(rx);
    acquire_position(&engine, &tx).await;

    assert_eq!(engine.status().as_deref(), Some("Updated 2 of 4 places"));

    // p1 and p3 never had entries; the failed lookups must not invent or
    // clear anything.
    assert!(engine.cache_entry("p1").is_none());
    assert!(engine.cache_entry("p3").is_none());
    assert_eq!(engine.cache_entry("p2").unwrap().distance_meters, 700.0);
    assert_eq!(engine.cache_entry("p4").unwrap().distance_meters, 400.0);

    // Unrouted places sort after routed ones, in catalog order.
    engine.set_sort(SortMode::WalkingDistance);
    assert_eq!(visible_ids(&engine), vec!["p4", "p2", "p1", "p3"]);
}

/// A provider that succeeds once per session and fails every call after
/// that, for exercising "last known good" retention.
struct FailAfterFirstCycle {
    successes_allowed: AtomicUsize,
}

impl RoutingProvider for FailAfterFirstCycle {
    fn route(
        &self,
        _origin: Coordinate,
        _destination: Coordinate,
    ) -> BoxFuture<'_, Result<Route, ProviderError>> {
        let allowed = self
            .successes_allowed
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        Box::pin(async move {
            if allowed {
                Ok(Route {
                    distance_meters: 500.0,
                    duration_seconds: 450.0,
                })
            } else {
                Err(ProviderError::Network("provider went away".to_string()))
            }
        })
    }

    fn name(&self) -> &str {
        "fail-after-first"
    }
}

/// A failed lookup leaves a previously cached entry byte-for-byte
/// untouched across a full engine cycle.
#[tokio::test(start_paused = true)]
async fn test_failure_preserves_last_known_good() {
    let provider = Arc::new(FailAfterFirstCycle {
        successes_allowed: AtomicUsize::new(1),
    });
    let engine = Engine::start(
        catalog(1),
        Arc::clone(&provider) as Arc<dyn RoutingProvider>,
        fast_config(2),
    );

    let (tx, rx) = mpsc::channel(8);
    engine.start_tracking(rx);
    acquire_position(&engine, &tx).await;
    let before = engine.cache_entry("p1").unwrap();
    assert_eq!(before.distance_meters, 500.0);
    assert_eq!(before.duration_seconds, 450.0);

    // Move far enough to trigger a re-route; this cycle fails.
    let mut events = engine.subscribe();
    tx.send(Ok(PositionFix::new(48.9566, 2.3522).unwrap()))
        .await
        .unwrap();
    wait_for_completed(&mut events).await;

    let after = engine.cache_entry("p1").unwrap();
    assert_eq!(after, before, "failed lookup must not touch the entry");
    assert_eq!(
        engine.status().as_deref(),
        Some("Using cached walking times")
    );
}

/// Triggering a refresh while a cycle is in flight produces no extra
/// provider calls; the overlapping trigger is dropped.
#[tokio::test(start_paused = true)]
async fn test_single_flight_across_engine_surface() {
    let scripted = Arc::new(ScriptedProvider::new(vec![
        (1, ScriptedProvider::distance(100.0)),
        (2, ScriptedProvider::distance(200.0)),
        (3, ScriptedProvider::distance(300.0)),
    ]));
    let engine = Engine::start(
        catalog(3),
        Arc::clone(&scripted) as Arc<dyn RoutingProvider>,
        fast_config(1),
    );

    let (tx, rx) = mpsc::channel(8);
    engine.start_tracking(rx);
    tx.send(Ok(PositionFix::new(48.8566, 2.3522).unwrap()))
        .await
        .unwrap();

    // Let the auto-triggered cycle claim the in-flight flag: spin until
    // its first lookup reaches the provider. Yielding never advances the
    // paused clock, so the cycle cannot finish during this wait.
    while scripted.calls() == 0 {
        tokio::task::yield_now().await;
    }

    let outcome = engine.refresh().await;
    match outcome {
        CycleOutcome::Skipped(reason) => assert_eq!(reason, SkipReason::AlreadyInFlight),
        CycleOutcome::Completed(_) => panic!("manual refresh should have been dropped"),
    }

    let mut events = engine.subscribe();
    wait_for_completed(&mut events).await;
    assert_eq!(scripted.calls(), 3, "only the first cycle reached the provider");
}

/// 7 places with batch size 3 run as batches of 3, 3, 1, and nothing
/// from a later batch is requested before the earlier batch settles.
#[tokio::test(start_paused = true)]
async fn test_batch_partitioning_end_to_end() {
    let scripted = Arc::new(ScriptedProvider::new(
        (1..=7).map(|i| (i, ScriptedProvider::distance(100.0 * i as f64))).collect(),
    ));
    let engine = Engine::start(
        catalog(7),
        Arc::clone(&scripted) as Arc<dyn RoutingProvider>,
        fast_config(3),
    );
    let mut events = engine.subscribe();

    let (tx, rx) = mpsc::channel(8);
    engine.start_tracking(rx);
    tx.send(Ok(PositionFix::new(48.8566, 2.3522).unwrap()))
        .await
        .unwrap();

    // Collect the progress trail up to completion.
    let mut progress = Vec::new();
    loop {
        let event = tokio::time::timeout(Duration::from_secs(30), events.recv())
            .await
            .expect("timed out")
            .unwrap();
        match event {
            EngineEvent::Cycle(CycleEvent::Progress {
                completed_batches,
                total_batches,
                ..
            }) => progress.push((completed_batches, total_batches)),
            EngineEvent::Cycle(CycleEvent::Completed(report)) => {
                assert_eq!(report.attempted, 7);
                assert_eq!(report.succeeded, 7);
                break;
            }
            _ => {}
        }
    }
    assert_eq!(progress, vec![(1, 3), (2, 3), (3, 3)]);

    // Call order respects the batch barrier.
    let calls = scripted.calls.lock().clone();
    let batch_of = |key: &String| (1..=7).find(|i| &lat_key(*i) == key).unwrap().saturating_sub(1) / 3;
    let order: Vec<usize> = calls.iter().map(batch_of).collect();
    let mut sorted = order.clone();
    sorted.sort_unstable();
    assert_eq!(order, sorted, "a later batch started before an earlier one settled");
}

/// Filtering narrows what a cycle routes: with a search active, only the
/// visible places are attempted.
#[tokio::test(start_paused = true)]
async fn test_cycle_covers_only_visible_places() {
    let scripted = Arc::new(ScriptedProvider::new(
        (1..=4).map(|i| (i, ScriptedProvider::distance(100.0))).collect(),
    ));
    let engine = Engine::start(
        catalog(4),
        Arc::clone(&scripted) as Arc<dyn RoutingProvider>,
        fast_config(2),
    );

    engine.set_search("Place 2");
    assert_eq!(visible_ids(&engine), vec!["p2"]);

    let (tx, rx) = mpsc::channel(8);
    engine.start_tracking(rx);
    acquire_position(&engine, &tx).await;

    assert_eq!(scripted.calls(), 1, "only the visible place was routed");
    assert!(engine.cache_entry("p2").is_some());
    assert!(engine.cache_entry("p1").is_none());
}

/// An empty visible list drops the trigger entirely.
#[tokio::test(start_paused = true)]
async fn test_empty_view_skips_cycle() {
    let scripted = Arc::new(ScriptedProvider::new(vec![]));
    let engine = Engine::start(
        catalog(2),
        Arc::clone(&scripted) as Arc<dyn RoutingProvider>,
        fast_config(2),
    );
    engine.set_search("matches nothing at all");

    let (tx, rx) = mpsc::channel(8);
    engine.start_tracking(rx);
    tx.send(Ok(PositionFix::new(48.8566, 2.3522).unwrap()))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(scripted.calls(), 0);

    let outcome = engine.refresh().await;
    assert_eq!(outcome, CycleOutcome::Skipped(SkipReason::EmptyList));
}
