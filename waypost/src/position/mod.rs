//! User position tracking
//!
//! Wraps continuous location observation behind a channel: whatever
//! produces fixes (a GPS daemon, a replay file, a test) sends
//! [`PositionObservation`]s into an mpsc channel and the
//! [`PositionTracker`] task turns them into engine-facing events with
//! movement-threshold detection and a periodic refresh timer.
//!
//! # Events
//!
//! - [`PositionEvent::Updated`] on every successful fix.
//! - [`PositionEvent::SignificantMove`] additionally when the fix moved
//!   more than the threshold from the previous one (a first fix is always
//!   significant).
//! - [`PositionEvent::RefreshDue`] at a fixed interval, armed once on the
//!   first fix and firing for as long as tracking stays active.
//! - [`PositionEvent::PermissionDenied`] when observation reports a
//!   permission denial; terminal for the session until restarted.

mod tracker;

pub use tracker::{PositionTracker, TrackerConfig};

use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use thiserror::Error;

use crate::geo::{Coordinate, GeoError};

/// A single successful position observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionFix {
    /// Where the user was observed.
    pub coordinate: Coordinate,
    /// When the observation arrived.
    pub observed_at: Instant,
}

impl PositionFix {
    /// Create a fix observed now.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        Ok(Self {
            coordinate: Coordinate::new(latitude, longitude)?,
            observed_at: Instant::now(),
        })
    }

    /// Create a fix with an explicit timestamp (for testing).
    pub fn at(coordinate: Coordinate, observed_at: Instant) -> Self {
        Self {
            coordinate,
            observed_at,
        }
    }
}

/// Failure of a single observation attempt.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ObservationError {
    /// The user denied location access. Terminal for this tracking
    /// session; tracking must be explicitly restarted.
    #[error("location permission denied")]
    PermissionDenied,

    /// A transient failure; observation continues.
    #[error("transient location error: {0}")]
    Transient(String),
}

/// What observation sources feed into the tracker.
pub type PositionObservation = Result<PositionFix, ObservationError>;

/// Events published by the tracker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PositionEvent {
    /// A new fix was recorded.
    Updated(PositionFix),
    /// The new fix moved beyond the movement threshold.
    SignificantMove(PositionFix),
    /// The periodic refresh interval elapsed.
    RefreshDue,
    /// Observation was terminally denied; tracking has deactivated.
    PermissionDenied,
}

/// The most recent successful observation, shared across tasks.
///
/// Absent until the first observation arrives; replaced wholesale on each
/// update. Written only by the tracker task.
#[derive(Debug, Clone, Default)]
pub struct SharedPosition {
    inner: Arc<RwLock<Option<PositionFix>>>,
}

impl SharedPosition {
    /// Create an empty shared position.
    pub fn new() -> Self {
        Self::default()
    }

    /// The latest fix, if any observation has succeeded yet.
    pub fn current(&self) -> Option<PositionFix> {
        *self.inner.read()
    }

    /// Replace the position with a newer fix.
    pub fn update(&self, fix: PositionFix) {
        *self.inner.write() = Some(fix);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_position_starts_absent() {
        let shared = SharedPosition::new();
        assert!(shared.current().is_none());
    }

    #[test]
    fn test_shared_position_replaced_wholesale() {
        let shared = SharedPosition::new();
        let first = PositionFix::new(48.85, 2.35).unwrap();
        let second = PositionFix::new(48.86, 2.34).unwrap();

        shared.update(first);
        assert_eq!(shared.current(), Some(first));
        shared.update(second);
        assert_eq!(shared.current(), Some(second));
    }

    #[test]
    fn test_fix_rejects_invalid_coordinates() {
        assert!(PositionFix::new(95.0, 2.35).is_err());
    }
}
