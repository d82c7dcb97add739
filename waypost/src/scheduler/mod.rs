//! Batch update scheduling
//!
//! Runs routing refresh cycles: one at a time, over the visible place
//! list as it was when the cycle was triggered, in fixed-size batches
//! with a delay between them to respect provider rate limits.
//!
//! # Cycle shape
//!
//! ```text
//! [p1 p2 p3 p4 p5 p6 p7]          batch size 3
//!  └──────┬──────┘
//!    batch 1 (concurrent) ── join ── progress ── delay
//!                batch 2 (concurrent) ── join ── progress ── delay
//!                            batch 3 ── join ── progress ── completed
//! ```
//!
//! Within a batch every lookup runs concurrently and the batch is a
//! barrier: nothing from batch *n+1* is requested before all of batch *n*
//! settles. A slow or failed place holds up the next batch, never its
//! neighbours.
//!
//! # Single flight
//!
//! At most one cycle exists at a time. Triggers that arrive while a cycle
//! is in flight are dropped, not queued; the next natural trigger
//! (movement, timer, filter change, manual refresh) picks up from the
//! then-current state.

mod cycle;
mod refresh;
mod status;

pub use cycle::{CycleEvent, CycleOutcome, CycleReport, SkipReason};
pub use refresh::{RefreshScheduler, SchedulerConfig};
pub use status::StatusBoard;
