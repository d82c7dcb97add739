//! User-facing status text.

use parking_lot::Mutex;

/// Holds the one status line the presentation layer may show.
///
/// Messages are generation-stamped so a delayed auto-clear only removes
/// the message it was scheduled for: if a newer cycle has set fresher
/// text in the meantime, the stale clear is a no-op.
#[derive(Debug, Default)]
pub struct StatusBoard {
    inner: Mutex<StatusInner>,
}

#[derive(Debug, Default)]
struct StatusInner {
    generation: u64,
    message: Option<String>,
}

impl StatusBoard {
    /// Create an empty status board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the status message, returning its generation stamp.
    pub fn set(&self, message: impl Into<String>) -> u64 {
        let mut inner = self.inner.lock();
        inner.generation += 1;
        inner.message = Some(message.into());
        inner.generation
    }

    /// Clear the status message immediately.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.generation += 1;
        inner.message = None;
    }

    /// Clear only if `generation` is still the latest message.
    ///
    /// Returns whether anything was cleared.
    pub fn clear_if_current(&self, generation: u64) -> bool {
        let mut inner = self.inner.lock();
        if inner.generation == generation && inner.message.is_some() {
            inner.generation += 1;
            inner.message = None;
            true
        } else {
            false
        }
    }

    /// The current status message, if any.
    pub fn current(&self) -> Option<String> {
        self.inner.lock().message.clone()
    }
}
