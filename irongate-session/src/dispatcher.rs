/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 25/8/26
******************************************************************************/

//! Frame demultiplexing.
//!
//! The dispatcher is the single inbound funnel: every parsed envelope passes
//! through [`Dispatcher::dispatch`], which records the sequence number,
//! applies dispatch events to the entity cache, delivers them to subscribers
//! in registration order, and reduces control frames to a [`Control`] value
//! for the state machine to act on.

use async_trait::async_trait;
use irongate_core::error::ProtocolError;
use irongate_core::types::{Envelope, Opcode};
use irongate_model::cache::EntityCache;
use irongate_model::event::DispatchEvent;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::sequence::SequenceTracker;

/// Receives decoded dispatch events in arrival order.
///
/// Subscribers are isolated from one another: an error from one is logged
/// and does not prevent delivery to the rest.
#[async_trait]
pub trait Subscriber: Send + Sync {
    /// Called once per decoded dispatch event.
    ///
    /// # Errors
    /// May return any error; the dispatcher logs it and continues.
    async fn on_event(&self, event: &DispatchEvent) -> anyhow::Result<()>;
}

/// Outcome of dispatching one envelope, consumed by the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    /// Nothing for the state machine to do.
    None,
    /// The remote acknowledged a heartbeat.
    HeartbeatAck,
    /// The remote requested an immediate heartbeat.
    HeartbeatRequest,
    /// Server greeting carrying the heartbeat interval.
    Hello {
        /// Interval between heartbeat probes.
        interval: Duration,
    },
    /// The remote requested a reconnect.
    Reconnect,
    /// The session was declared invalid.
    InvalidSession {
        /// Whether the session may still be resumed.
        resumable: bool,
    },
    /// The handshake completed; the session is live.
    Ready {
        /// Resume token for this session.
        session_id: String,
    },
    /// A dropped session was resumed.
    Resumed,
}

/// The inbound demultiplexer for one session.
pub struct Dispatcher {
    shard: u32,
    sequence: Arc<SequenceTracker>,
    cache: Arc<EntityCache>,
    subscribers: Vec<Arc<dyn Subscriber>>,
}

impl Dispatcher {
    /// Creates a dispatcher with no subscribers.
    #[must_use]
    pub fn new(shard: u32, sequence: Arc<SequenceTracker>, cache: Arc<EntityCache>) -> Self {
        Self {
            shard,
            sequence,
            cache,
            subscribers: Vec::new(),
        }
    }

    /// Registers a subscriber. Delivery follows registration order.
    pub fn subscribe(&mut self, subscriber: Arc<dyn Subscriber>) {
        self.subscribers.push(subscriber);
    }

    /// Processes one envelope.
    ///
    /// Dispatch frames are decoded, applied to the cache, and delivered to
    /// subscribers before this returns, so delivery order matches arrival
    /// order. A dispatch payload that fails its decode contract is logged
    /// and dropped; it never tears down the connection.
    ///
    /// # Errors
    /// Returns [`ProtocolError::MissingHeartbeatInterval`] for a hello frame
    /// without a usable interval.
    pub async fn dispatch(&self, envelope: Envelope) -> Result<Control, ProtocolError> {
        if let Some(seq) = envelope.seq {
            self.sequence.observe(seq);
        }

        let control = match envelope.op {
            Opcode::Dispatch => return self.dispatch_event(&envelope).await,
            Opcode::HeartbeatAck => Control::HeartbeatAck,
            Opcode::Heartbeat => Control::HeartbeatRequest,
            Opcode::Hello => {
                let millis = envelope
                    .payload
                    .get("heartbeat_interval")
                    .and_then(Value::as_u64)
                    .ok_or(ProtocolError::MissingHeartbeatInterval)?;
                Control::Hello {
                    interval: Duration::from_millis(millis),
                }
            }
            Opcode::Reconnect => Control::Reconnect,
            Opcode::InvalidSession => Control::InvalidSession {
                resumable: envelope.payload.as_bool().unwrap_or(false),
            },
            Opcode::Identify | Opcode::Resume => {
                // Client-to-server opcodes arriving inbound are a remote
                // bug; ignore them.
                warn!(op = %envelope.op, "ignoring client opcode on inbound stream");
                Control::None
            }
            Opcode::Unknown(op) => {
                debug!(op, "ignoring unknown opcode");
                Control::None
            }
        };
        Ok(control)
    }

    async fn dispatch_event(&self, envelope: &Envelope) -> Result<Control, ProtocolError> {
        let Some(name) = envelope.event.as_deref() else {
            warn!("dropping dispatch frame without an event name");
            return Ok(Control::None);
        };

        let event = match DispatchEvent::parse(name, &envelope.payload, self.shard) {
            Ok(event) => event,
            Err(err) => {
                warn!(event = name, %err, "dropping dispatch event with invalid payload");
                return Ok(Control::None);
            }
        };

        self.cache.apply(&event);

        for subscriber in &self.subscribers {
            if let Err(err) = subscriber.on_event(&event).await {
                warn!(event = name, %err, "subscriber failed, continuing delivery");
            }
        }

        let control = match &event {
            DispatchEvent::Ready { session_id, .. } => Control::Ready {
                session_id: session_id.clone(),
            },
            DispatchEvent::Resumed => Control::Resumed,
            _ => Control::None,
        };
        Ok(control)
    }
}
