//! Per-target byte accounting and the cache-drop trigger.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// A point-in-time copy of a [`ByteCounter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ByteCounts {
    pub written: u64,
    pub at_last_drop: u64,
}

/// Running total of bytes appended to a file, plus the total at the last cache-drop.
///
/// Both values only grow. Increments are lock-free.
#[derive(Debug, Default)]
pub struct ByteCounter {
    written: AtomicU64,
    at_last_drop: AtomicU64,
}

impl ByteCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `n` to the running total.
    ///
    /// Returns `Some(total)` when the bytes written since the last drop exceed `threshold`
    /// and this caller claimed the drop window; the caller should then advise the OS to
    /// release the file's cached pages. A `threshold` of zero never triggers.
    pub fn record(&self, n: u64, threshold: u64) -> Option<u64> {
        let written = self.written.fetch_add(n, Ordering::AcqRel).saturating_add(n);
        if threshold == 0 {
            return None;
        }

        let last = self.at_last_drop.load(Ordering::Acquire);
        if written.saturating_sub(last) <= threshold {
            return None;
        }

        // Only one concurrent caller moves the mark for a given window.
        self.at_last_drop
            .compare_exchange(last, written, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| written)
    }

    pub fn counts(&self) -> ByteCounts {
        ByteCounts {
            written: self.written.load(Ordering::Acquire),
            at_last_drop: self.at_last_drop.load(Ordering::Acquire),
        }
    }
}
