//! Cycle outcome and progress types.

use crate::position::PositionFix;

/// Why a refresh trigger was dropped without starting a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No position has been observed yet.
    NoPosition,
    /// A cycle is already in flight; the trigger collapses into it.
    AlreadyInFlight,
    /// The visible list was empty.
    EmptyList,
}

/// Counters from a completed cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleReport {
    /// Places the cycle attempted to route.
    pub attempted: usize,
    /// Lookups that succeeded and updated the cache.
    pub succeeded: usize,
    /// Lookups that failed; the cache was left untouched for them.
    pub failed: usize,
    /// The position the cycle routed from.
    pub origin: PositionFix,
}

/// Result of asking the scheduler for a refresh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CycleOutcome {
    /// A cycle ran to completion.
    Completed(CycleReport),
    /// The trigger was dropped.
    Skipped(SkipReason),
}

impl CycleOutcome {
    /// The report, if a cycle actually ran.
    pub fn report(&self) -> Option<&CycleReport> {
        match self {
            CycleOutcome::Completed(report) => Some(report),
            CycleOutcome::Skipped(_) => None,
        }
    }
}

/// Progress signals published while a cycle runs.
///
/// Consumers re-derive the visible list on every signal so partial new
/// data shows up before the whole cycle finishes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CycleEvent {
    /// A batch settled.
    Progress {
        /// Batches finished so far.
        completed_batches: usize,
        /// Total batches in this cycle.
        total_batches: usize,
        /// Successful lookups so far.
        succeeded: usize,
        /// Failed lookups so far.
        failed: usize,
    },
    /// The cycle finished; the cache reflects every update it made.
    Completed(CycleReport),
}
