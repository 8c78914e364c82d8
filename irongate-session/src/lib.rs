/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 25/8/26
******************************************************************************/

//! # Irongate Session
//!
//! Gateway session layer for the irongate engine.
//!
//! This crate provides:
//! - **State machine**: Connection lifecycle with handshake, resume, and
//!   supervised reconnection
//! - **Heartbeat scheduler**: Cancellable liveness probe with missed-ack
//!   tracking
//! - **Dispatcher**: Envelope parsing, sequence bookkeeping, and in-order
//!   delivery to registered subscribers
//! - **Sequence management**: Atomic last-seen sequence and resume state
//! - **Shard coordinator**: N independent sessions over one shared cache

pub mod config;
pub mod dispatcher;
pub mod heartbeat;
pub mod sequence;
pub mod session;
pub mod shard;
pub mod state;

pub use config::SessionConfig;
pub use dispatcher::{Control, Dispatcher, Subscriber};
pub use heartbeat::HeartbeatScheduler;
pub use sequence::{ResumeState, SequenceTracker};
pub use session::{Session, SessionHandle};
pub use shard::ShardCoordinator;
pub use state::{Phase, PhaseCell};
