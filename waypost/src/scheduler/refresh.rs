//! The refresh scheduler.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::cache::RoutingCache;
use crate::catalog::Place;
use crate::config::{DEFAULT_BATCH_DELAY, DEFAULT_BATCH_SIZE, DEFAULT_STATUS_CLEAR_DELAY};
use crate::position::SharedPosition;
use crate::provider::RoutingProvider;

use super::cycle::{CycleEvent, CycleOutcome, CycleReport, SkipReason};
use super::status::StatusBoard;

/// Status line while a cycle is running.
const STATUS_UPDATING: &str = "Updating walking times…";

/// Status line when everything failed but cached data covers the view.
const STATUS_USING_CACHED: &str = "Using cached walking times";

/// Status line when everything failed and there is nothing cached.
const STATUS_FETCH_FAILED: &str = "Could not fetch walking times — will retry";

/// Capacity of the cycle event channel.
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Batching and status knobs for the scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Places routed concurrently per batch.
    pub batch_size: usize,
    /// Pause between batches (not after the last).
    pub batch_delay: Duration,
    /// Delay before a partial-update status clears itself.
    pub status_clear_delay: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            batch_delay: DEFAULT_BATCH_DELAY,
            status_clear_delay: DEFAULT_STATUS_CLEAR_DELAY,
        }
    }
}

/// Runs one routing refresh cycle at a time.
///
/// The single-flight flag here is the only concurrency control guarding
/// the cache against interleaved writes from overlapping cycles, so every
/// cycle must go through [`RefreshScheduler::try_refresh`].
pub struct RefreshScheduler {
    provider: Arc<dyn RoutingProvider>,
    cache: Arc<RoutingCache>,
    position: SharedPosition,
    status: Arc<StatusBoard>,
    config: SchedulerConfig,
    in_flight: AtomicBool,
    last_attempted: RwLock<Option<crate::position::PositionFix>>,
    events: broadcast::Sender<CycleEvent>,
}

impl RefreshScheduler {
    /// Create a scheduler over the given collaborators.
    pub fn new(
        provider: Arc<dyn RoutingProvider>,
        cache: Arc<RoutingCache>,
        position: SharedPosition,
        status: Arc<StatusBoard>,
        config: SchedulerConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            provider,
            cache,
            position,
            status,
            config,
            in_flight: AtomicBool::new(false),
            last_attempted: RwLock::new(None),
            events,
        }
    }

    /// Subscribe to cycle progress events.
    pub fn subscribe(&self) -> broadcast::Receiver<CycleEvent> {
        self.events.subscribe()
    }

    /// Whether a cycle is currently running.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// The position the most recent cycle routed from.
    pub fn last_attempted_position(&self) -> Option<crate::position::PositionFix> {
        *self.last_attempted.read()
    }

    /// Run a refresh cycle over `places`, or drop the trigger.
    ///
    /// Drops the trigger (no queueing, no cancellation) when no position
    /// is known yet, when the list is empty, or when another cycle is in
    /// flight.
    pub async fn try_refresh(&self, places: &[Place]) -> CycleOutcome {
        let Some(origin) = self.position.current() else {
            debug!("refresh skipped: no position yet");
            return CycleOutcome::Skipped(SkipReason::NoPosition);
        };
        if places.is_empty() {
            debug!("refresh skipped: nothing visible");
            return CycleOutcome::Skipped(SkipReason::EmptyList);
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("refresh skipped: cycle already in flight");
            return CycleOutcome::Skipped(SkipReason::AlreadyInFlight);
        }

        let report = self.run_cycle(origin, places).await;
        self.in_flight.store(false, Ordering::SeqCst);

        self.finish_status(places, &report);
        let _ = self.events.send(CycleEvent::Completed(report));
        CycleOutcome::Completed(report)
    }

    async fn run_cycle(
        &self,
        origin: crate::position::PositionFix,
        places: &[Place],
    ) -> CycleReport {
        // One timestamp for the whole cycle; every entry it writes ages
        // together.
        let now = Instant::now();
        *self.last_attempted.write() = Some(origin);
        self.status.set(STATUS_UPDATING);

        let total_batches = places.len().div_ceil(self.config.batch_size);
        info!(
            places = places.len(),
            batches = total_batches,
            provider = self.provider.name(),
            "routing cycle started"
        );

        let mut succeeded = 0usize;
        let mut failed = 0usize;

        for (index, batch) in places.chunks(self.config.batch_size).enumerate() {
            let lookups = batch.iter().map(|place| async move {
                let result = self
                    .provider
                    .route(origin.coordinate, place.coordinate())
                    .await;
                (place, result)
            });

            for (place, result) in join_all(lookups).await {
                match result {
                    Ok(route) => {
                        self.cache.put(
                            &place.id,
                            route.distance_meters,
                            route.duration_seconds,
                            now,
                        );
                        succeeded += 1;
                    }
                    Err(error) => {
                        failed += 1;
                        debug!(place = %place.id, %error, "routing lookup failed");
                    }
                }
            }

            let _ = self.events.send(CycleEvent::Progress {
                completed_batches: index + 1,
                total_batches,
                succeeded,
                failed,
            });

            if index + 1 < total_batches {
                tokio::time::sleep(self.config.batch_delay).await;
            }
        }

        info!(succeeded, failed, "routing cycle finished");
        CycleReport {
            attempted: places.len(),
            succeeded,
            failed,
            origin,
        }
    }

    fn finish_status(&self, places: &[Place], report: &CycleReport) {
        if report.failed > 0 && report.succeeded == 0 {
            let any_cached = places.iter().any(|p| self.cache.contains(&p.id));
            self.status.set(if any_cached {
                STATUS_USING_CACHED
            } else {
                STATUS_FETCH_FAILED
            });
        } else if report.failed > 0 {
            let message = format!(
                "Updated {} of {} places",
                report.succeeded, report.attempted
            );
            let generation = self.status.set(message);
            let status = Arc::clone(&self.status);
            let delay = self.config.status_clear_delay;
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                status.clear_if_current(generation);
            });
        } else {
            self.status.clear();
        }
    }
}
