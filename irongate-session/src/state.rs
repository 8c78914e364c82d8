/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 25/8/26
******************************************************************************/

//! Session phase tracking.
//!
//! The phase lives in a shared synchronized cell rather than in the type
//! system: the heartbeat task must read the current phase from another task
//! before every send, and a transition away from Connected must be visible
//! to it immediately.

use parking_lot::RwLock;
use std::fmt;
use tracing::{debug, warn};

/// Connection lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No connection, nothing in flight.
    Disconnected,
    /// Transport open in progress, awaiting hello.
    Connecting,
    /// Fresh handshake sent, awaiting ready.
    Identifying,
    /// Resume handshake sent, awaiting resumed.
    Resuming,
    /// Session live, heartbeat running.
    Connected,
    /// Torn down, waiting out the backoff before reconnecting.
    Reconnecting,
    /// Orderly shutdown in progress.
    Closing,
}

impl Phase {
    /// Whether `self → to` is a legal transition.
    ///
    /// `Closing` is reachable from every phase: disconnect is valid at any
    /// time.
    #[must_use]
    pub fn can_transition_to(self, to: Phase) -> bool {
        use Phase::*;
        if to == Closing {
            return true;
        }
        matches!(
            (self, to),
            (Disconnected, Connecting)
                | (Connecting, Identifying)
                | (Connecting, Resuming)
                | (Connecting, Reconnecting)
                | (Identifying, Connected)
                | (Identifying, Reconnecting)
                | (Resuming, Connected)
                | (Resuming, Reconnecting)
                | (Connected, Reconnecting)
                | (Reconnecting, Connecting)
                | (Closing, Disconnected)
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Identifying => "identifying",
            Self::Resuming => "resuming",
            Self::Connected => "connected",
            Self::Reconnecting => "reconnecting",
            Self::Closing => "closing",
        };
        write!(f, "{name}")
    }
}

/// Shared synchronized phase cell.
#[derive(Debug)]
pub struct PhaseCell {
    inner: RwLock<Phase>,
}

impl PhaseCell {
    /// Creates a cell in the Disconnected phase.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Phase::Disconnected),
        }
    }

    /// Returns the current phase.
    #[must_use]
    pub fn get(&self) -> Phase {
        *self.inner.read()
    }

    /// Applies a transition if it is legal, returning whether it applied.
    ///
    /// An illegal transition is a state-machine bug; it is logged and
    /// refused rather than corrupting the phase.
    pub fn transition(&self, to: Phase) -> bool {
        let mut phase = self.inner.write();
        if phase.can_transition_to(to) {
            debug!(from = %*phase, %to, "phase transition");
            *phase = to;
            true
        } else {
            warn!(from = %*phase, %to, "refused illegal phase transition");
            false
        }
    }
}

impl Default for PhaseCell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_identify_lifecycle() {
        let cell = PhaseCell::new();
        assert_eq!(cell.get(), Phase::Disconnected);

        assert!(cell.transition(Phase::Connecting));
        assert!(cell.transition(Phase::Identifying));
        assert!(cell.transition(Phase::Connected));
        assert!(cell.transition(Phase::Reconnecting));
        assert!(cell.transition(Phase::Connecting));
        assert!(cell.transition(Phase::Resuming));
        assert!(cell.transition(Phase::Connected));
    }

    #[test]
    fn test_closing_reachable_from_anywhere() {
        for phase in [
            Phase::Disconnected,
            Phase::Connecting,
            Phase::Identifying,
            Phase::Resuming,
            Phase::Connected,
            Phase::Reconnecting,
        ] {
            assert!(phase.can_transition_to(Phase::Closing), "{phase}");
        }
    }

    #[test]
    fn test_illegal_transition_refused() {
        let cell = PhaseCell::new();
        assert!(!cell.transition(Phase::Connected));
        assert_eq!(cell.get(), Phase::Disconnected);
    }
}
