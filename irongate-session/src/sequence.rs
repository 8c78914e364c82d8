/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 25/8/26
******************************************************************************/

//! Sequence number tracking.
//!
//! The upstream promises sequence continuity within one connection; the
//! tracker records the highest sequence observed so heartbeats and resume
//! attempts always carry a monotonically non-decreasing value.

use std::sync::atomic::{AtomicU64, Ordering};

/// Tracks the last-seen dispatch sequence number for one session.
///
/// Uses atomic operations for lock-free access from the dispatch path and
/// the heartbeat task.
#[derive(Debug, Default)]
pub struct SequenceTracker {
    /// Highest observed sequence; 0 means none observed yet.
    last_seen: AtomicU64,
}

impl SequenceTracker {
    /// Creates a tracker with no observed sequence.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an observed sequence number, keeping the maximum.
    #[inline]
    pub fn observe(&self, seq: u64) {
        self.last_seen.fetch_max(seq, Ordering::SeqCst);
    }

    /// Returns the last observed sequence, if any.
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<u64> {
        match self.last_seen.load(Ordering::SeqCst) {
            0 => None,
            seq => Some(seq),
        }
    }

    /// Clears the tracker. Called when resume state is discarded.
    #[inline]
    pub fn reset(&self) {
        self.last_seen.store(0, Ordering::SeqCst);
    }
}

/// The state needed to resume a dropped session without a full resend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeState {
    /// Opaque resume token issued in the ready frame.
    pub session_id: String,
    /// Last sequence observed before the drop.
    pub sequence: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_starts_empty() {
        let tracker = SequenceTracker::new();
        assert_eq!(tracker.last(), None);
    }

    #[test]
    fn test_observe_keeps_maximum() {
        let tracker = SequenceTracker::new();
        tracker.observe(5);
        assert_eq!(tracker.last(), Some(5));

        // Out-of-order observation never regresses the value.
        tracker.observe(3);
        assert_eq!(tracker.last(), Some(5));

        tracker.observe(9);
        assert_eq!(tracker.last(), Some(9));
    }

    #[test]
    fn test_reset() {
        let tracker = SequenceTracker::new();
        tracker.observe(42);
        tracker.reset();
        assert_eq!(tracker.last(), None);
    }
}
