//! Engine configuration.
//!
//! All timing and batching behavior of the engine is tunable. The defaults
//! below match the values the product shipped with, but nothing in the
//! engine assumes them; tests and deployments override freely.

mod file;

pub use file::{ConfigError, ConfigFile};

use std::time::Duration;

// ==================== Engine Defaults ====================

/// Default movement threshold in meters before a re-route is triggered.
pub const DEFAULT_MOVEMENT_THRESHOLD_M: f64 = 80.0;

/// Default interval between periodic routing refreshes.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(45);

/// Default age after which a cache entry is flagged stale for display.
pub const DEFAULT_STALENESS_WINDOW: Duration = Duration::from_secs(120);

/// Default number of places routed concurrently per batch.
///
/// Trades cycle latency against provider rate limits.
pub const DEFAULT_BATCH_SIZE: usize = 6;

/// Default pause between batches within a cycle.
pub const DEFAULT_BATCH_DELAY: Duration = Duration::from_millis(300);

/// Default delay before a partial-update status message clears itself.
pub const DEFAULT_STATUS_CLEAR_DELAY: Duration = Duration::from_secs(3);

/// Default walking speed in meters per second for providers that derive
/// duration from distance.
pub const DEFAULT_WALKING_SPEED_MPS: f64 = 1.4;

/// Tunable engine behavior.
///
/// Groups the position-tracking, caching, and scheduling knobs that the
/// engine threads through to its components.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Movement in meters that counts as a significant move.
    pub movement_threshold_m: f64,

    /// Interval of the periodic refresh timer.
    pub refresh_interval: Duration,

    /// Cache entry age after which staleness is flagged.
    pub staleness_window: Duration,

    /// Places routed concurrently per batch.
    pub batch_size: usize,

    /// Pause between batches.
    pub batch_delay: Duration,

    /// Delay before partial-update status text auto-clears.
    pub status_clear_delay: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            movement_threshold_m: DEFAULT_MOVEMENT_THRESHOLD_M,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            staleness_window: DEFAULT_STALENESS_WINDOW,
            batch_size: DEFAULT_BATCH_SIZE,
            batch_delay: DEFAULT_BATCH_DELAY,
            status_clear_delay: DEFAULT_STATUS_CLEAR_DELAY,
        }
    }
}

impl EngineConfig {
    /// Set the movement threshold.
    pub fn with_movement_threshold_m(mut self, meters: f64) -> Self {
        self.movement_threshold_m = meters;
        self
    }

    /// Set the periodic refresh interval.
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Set the staleness window.
    pub fn with_staleness_window(mut self, window: Duration) -> Self {
        self.staleness_window = window;
        self
    }

    /// Set the batch size. Clamped to at least one place per batch.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Set the inter-batch delay.
    pub fn with_batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = delay;
        self
    }

    /// Set the status auto-clear delay.
    pub fn with_status_clear_delay(mut self, delay: Duration) -> Self {
        self.status_clear_delay = delay;
        self
    }
}
