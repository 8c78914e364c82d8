/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 25/8/26
******************************************************************************/

//! Heartbeat scheduling.
//!
//! One repeating timer per connection, started on entering Connected with
//! the server-supplied interval. Each tick checks the missed-ack counter
//! before sending: three consecutive unacknowledged probes abort the timer
//! and signal the state machine to reconnect.
//!
//! Cancellation is synchronous with respect to sends: [`HeartbeatScheduler::stop`]
//! resolves only after the timer task has exited, so no heartbeat frame can
//! be produced once it returns.

use crate::sequence::SequenceTracker;
use crate::state::{Phase, PhaseCell};
use rand::Rng;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Builds the wire frame for one heartbeat probe.
#[must_use]
pub fn heartbeat_frame(sequence: &SequenceTracker) -> Value {
    json!({ "op": 1, "d": sequence.last() })
}

/// Handle to a running heartbeat timer.
#[derive(Debug)]
pub struct HeartbeatScheduler {
    missed: Arc<AtomicU32>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl HeartbeatScheduler {
    /// Starts the timer.
    ///
    /// # Arguments
    /// * `interval` - Server-supplied heartbeat interval
    /// * `first_tick_jitter` - Jitter the first tick by a random fraction of
    ///   the interval
    /// * `max_missed` - Consecutive unacknowledged probes tolerated
    /// * `sequence` - Sequence tracker the probe payload reads from
    /// * `phase` - Shared phase cell, read before every send
    /// * `outbound` - Channel to the connection's single send path
    /// * `timeout` - Signal to the state machine on missed-ack timeout,
    ///   carrying the missed count
    #[must_use]
    pub fn start(
        interval: Duration,
        first_tick_jitter: bool,
        max_missed: u32,
        sequence: Arc<SequenceTracker>,
        phase: Arc<PhaseCell>,
        outbound: mpsc::Sender<Value>,
        timeout: mpsc::Sender<u32>,
    ) -> Self {
        let missed = Arc::new(AtomicU32::new(0));
        let cancel = CancellationToken::new();

        let first_delay = if first_tick_jitter {
            interval.mul_f64(rand::thread_rng().gen_range(0.0..1.0))
        } else {
            interval
        };

        let task = tokio::spawn(Self::run(
            interval,
            first_delay,
            max_missed,
            sequence,
            phase,
            outbound,
            timeout,
            Arc::clone(&missed),
            cancel.clone(),
        ));

        Self {
            missed,
            cancel,
            task,
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn run(
        interval: Duration,
        first_delay: Duration,
        max_missed: u32,
        sequence: Arc<SequenceTracker>,
        phase: Arc<PhaseCell>,
        outbound: mpsc::Sender<Value>,
        timeout: mpsc::Sender<u32>,
        missed: Arc<AtomicU32>,
        cancel: CancellationToken,
    ) {
        let mut delay = first_delay;
        loop {
            tokio::select! {
                () = cancel.cancelled() => return,
                () = tokio::time::sleep(delay) => {}
            }

            // Coordinate with the state machine before sending: a phase
            // moved away from Connected means the transport may be half
            // closed already.
            if phase.get() != Phase::Connected {
                debug!(phase = %phase.get(), "heartbeat timer stopping, session left Connected");
                return;
            }

            let unacked = missed.load(Ordering::SeqCst);
            if unacked >= max_missed {
                warn!(unacked, "no heartbeat ack from remote, requesting reconnect");
                let _ = timeout.try_send(unacked);
                return;
            }

            missed.fetch_add(1, Ordering::SeqCst);

            if cancel.is_cancelled() {
                return;
            }
            if outbound.send(heartbeat_frame(&sequence)).await.is_err() {
                return;
            }

            delay = interval;
        }
    }

    /// Records a heartbeat acknowledgement, resetting the missed counter.
    pub fn on_ack(&self) {
        self.missed.store(0, Ordering::SeqCst);
    }

    /// Returns the current count of unacknowledged probes.
    #[must_use]
    pub fn missed(&self) -> u32 {
        self.missed.load(Ordering::SeqCst)
    }

    /// Cancels the timer and waits for it to exit.
    ///
    /// After this returns, no further heartbeat frame is produced.
    pub async fn stop(self) {
        self.cancel.cancel();
        let _ = self.task.await;
    }
}
