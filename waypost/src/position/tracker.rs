//! Position tracker task.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{DEFAULT_MOVEMENT_THRESHOLD_M, DEFAULT_REFRESH_INTERVAL};
use crate::geo::haversine_distance;

use super::{ObservationError, PositionEvent, PositionObservation, SharedPosition};

/// Capacity of the event broadcast channel. Slow subscribers lag rather
/// than block the tracker.
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Tracker behavior knobs.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Movement in meters beyond which a fix counts as a significant move.
    pub movement_threshold_m: f64,
    /// Interval of the periodic refresh signal.
    pub refresh_interval: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            movement_threshold_m: DEFAULT_MOVEMENT_THRESHOLD_M,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
        }
    }
}

/// Turns raw position observations into tracked state and events.
///
/// Owns the [`SharedPosition`] it updates and the periodic refresh timer,
/// which is armed exactly once per tracking session, on the first
/// successful fix.
pub struct PositionTracker {
    config: TrackerConfig,
    shared: SharedPosition,
    events: broadcast::Sender<PositionEvent>,
    active: Arc<AtomicBool>,
    cancel: Mutex<Option<CancellationToken>>,
}

impl PositionTracker {
    /// Create an inactive tracker.
    pub fn new(config: TrackerConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            config,
            shared: SharedPosition::new(),
            events,
            active: Arc::new(AtomicBool::new(false)),
            cancel: Mutex::new(None),
        }
    }

    /// The shared position this tracker maintains.
    pub fn position(&self) -> SharedPosition {
        self.shared.clone()
    }

    /// Subscribe to tracker events.
    pub fn subscribe(&self) -> broadcast::Receiver<PositionEvent> {
        self.events.subscribe()
    }

    /// Whether a tracking session is active.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Begin consuming observations from `rx`.
    ///
    /// Idempotent: starting while already active is a no-op and returns
    /// `None`, leaving the running session (and its receiver) in place.
    pub fn start(&self, rx: mpsc::Receiver<PositionObservation>) -> Option<JoinHandle<()>> {
        if self.active.swap(true, Ordering::SeqCst) {
            debug!("position tracking already active; start ignored");
            return None;
        }

        let token = CancellationToken::new();
        *self.cancel.lock() = Some(token.clone());

        info!("position tracking started");
        Some(tokio::spawn(Self::run(
            self.config.clone(),
            self.shared.clone(),
            self.events.clone(),
            Arc::clone(&self.active),
            token,
            rx,
        )))
    }

    /// Stop the running tracking session, if any.
    pub fn stop(&self) {
        if let Some(token) = self.cancel.lock().take() {
            token.cancel();
        }
        if self.active.swap(false, Ordering::SeqCst) {
            info!("position tracking stopped");
        }
    }

    async fn run(
        config: TrackerConfig,
        shared: SharedPosition,
        events: broadcast::Sender<PositionEvent>,
        active: Arc<AtomicBool>,
        cancel: CancellationToken,
        mut rx: mpsc::Receiver<PositionObservation>,
    ) {
        // Armed on the first successful fix, then never re-created.
        let mut periodic: Option<tokio::time::Interval> = None;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,

                observation = rx.recv() => match observation {
                    None => {
                        debug!("observation channel closed; tracking ends");
                        break;
                    }
                    Some(Ok(fix)) => {
                        let significant = match shared.current() {
                            None => true,
                            Some(previous) => {
                                haversine_distance(previous.coordinate, fix.coordinate)
                                    > config.movement_threshold_m
                            }
                        };

                        shared.update(fix);
                        let _ = events.send(PositionEvent::Updated(fix));
                        if significant {
                            debug!(position = %fix.coordinate, "significant move");
                            let _ = events.send(PositionEvent::SignificantMove(fix));
                        }

                        if periodic.is_none() {
                            let mut interval = tokio::time::interval_at(
                                tokio::time::Instant::now() + config.refresh_interval,
                                config.refresh_interval,
                            );
                            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                            periodic = Some(interval);
                        }
                    }
                    Some(Err(ObservationError::PermissionDenied)) => {
                        warn!("location permission denied; tracking deactivated");
                        let _ = events.send(PositionEvent::PermissionDenied);
                        break;
                    }
                    Some(Err(ObservationError::Transient(reason))) => {
                        warn!(%reason, "transient location error; observation continues");
                    }
                },

                _ = next_tick(periodic.as_mut()) => {
                    let _ = events.send(PositionEvent::RefreshDue);
                }
            }
        }

        active.store(false, Ordering::SeqCst);
    }
}

/// Await the next periodic tick, or forever if the timer is not armed yet.
async fn next_tick(interval: Option<&mut tokio::time::Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
