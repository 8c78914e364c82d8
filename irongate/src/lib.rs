/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 25/8/26
******************************************************************************/

//! # Irongate
//!
//! A persistent real-time gateway session engine for Rust.
//!
//! Irongate maintains long-lived sessions against a message gateway:
//! it negotiates the handshake, keeps the session alive with heartbeats,
//! recovers from drops by resuming or re-identifying, and demultiplexes
//! the inbound frame stream into validated domain records.
//!
//! ## Features
//!
//! - **Supervised sessions**: Reconnect with exponential backoff and jitter
//! - **Resume recovery**: Dropped sessions continue from the last sequence
//! - **Strict decoding**: Required fields fail hard, with full nested paths
//! - **Single-writer cache**: All entity state flows through one funnel
//! - **Sharding**: N sessions partition guild traffic over one shared cache
//! - **Async support**: Built on Tokio with pluggable transports
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use irongate::prelude::*;
//!
//! let cache = Arc::new(EntityCache::new());
//! let session = Arc::new(Session::new(
//!     SessionConfig::new(token).with_intents(513),
//!     Arc::clone(&cache),
//! ));
//! let handle = session.spawn(connector, "wss://gateway.example");
//! ```
//!
//! ## Crate Organization
//!
//! - [`core`]: Fundamental types, opcodes, envelopes, and error definitions
//! - [`model`]: Domain records, dispatch events, and the entity cache
//! - [`transport`]: Connection traits and the in-memory test transport
//! - [`session`]: Session state machine, heartbeats, and dispatching

pub mod core {
    //! Core types, opcodes, envelopes, and error definitions.
    pub use irongate_core::*;
}

pub mod model {
    //! Domain records, dispatch events, and the entity cache.
    pub use irongate_model::*;
}

pub mod transport {
    //! Connection traits and the in-memory test transport.
    pub use irongate_transport::*;
}

pub mod session {
    //! Session state machine, heartbeats, and dispatching.
    pub use irongate_session::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    // Core types
    pub use irongate_core::error::{
        AuthenticationError, DecodeError, GatewayError, ProtocolError, Result, SetupError,
        TransportError,
    };
    pub use irongate_core::types::{Envelope, Opcode, ShardInfo, Snowflake};

    // Model
    pub use irongate_model::cache::EntityCache;
    pub use irongate_model::channel::Channel;
    pub use irongate_model::command::{
        ApplicationCommand, CommandChoice, CommandKind, CommandOption, CommandOptionKind,
    };
    pub use irongate_model::emoji::Emoji;
    pub use irongate_model::event::DispatchEvent;
    pub use irongate_model::guild::{Guild, UnavailableGuild};
    pub use irongate_model::member::Member;
    pub use irongate_model::role::Role;
    pub use irongate_model::user::User;

    // Transport
    pub use irongate_transport::connector::{Connection, Connector};
    pub use irongate_transport::memory::{MemoryConnector, RemoteEnd};

    // Session
    pub use irongate_session::{
        Control, Dispatcher, Phase, ResumeState, Session, SessionConfig, SessionHandle,
        ShardCoordinator, Subscriber,
    };
}

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn test_prelude_imports() {
        let id = Snowflake::new(42);
        assert_eq!(id.to_string(), "42");
        assert_eq!(Opcode::from_u8(10), Opcode::Hello);
        assert_eq!(ShardInfo::single().count, 1);
    }

    #[test]
    fn test_cache_starts_empty() {
        let cache = EntityCache::new();
        assert_eq!(cache.guild_count(), 0);
        assert!(cache.current_user().is_none());
    }

    struct EventCounter {
        delivered: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl Subscriber for EventCounter {
        async fn on_event(&self, _event: &DispatchEvent) -> anyhow::Result<()> {
            self.delivered.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_end_to_end_over_memory_transport() {
        let (connector, mut accepted) = MemoryConnector::new();
        let counter = Arc::new(EventCounter {
            delivered: AtomicUsize::new(0),
        });

        let mut session = Session::new(
            SessionConfig::new("token").with_heartbeat_jitter(false),
            Arc::new(EntityCache::new()),
        );
        session.subscribe(Arc::clone(&counter) as Arc<dyn Subscriber>);
        let session = Arc::new(session);
        let handle = Arc::clone(&session).spawn(Arc::new(connector), "inproc://gateway");

        let mut remote = accepted.recv().await.unwrap();
        remote.send(json!({"op": 10, "d": {"heartbeat_interval": 45000}}));
        let identify = remote.recv().await.unwrap();
        assert_eq!(identify["op"], 2);
        remote.send(json!({
            "op": 0, "s": 1, "t": "READY",
            "d": {"session_id": "s", "user": {"id": "1"}, "guilds": []}
        }));

        // Delivery to subscribers happens before the ready confirmation is
        // acted on, so Connected implies the event was seen.
        let deadline = tokio::time::Instant::now() + Duration::from_millis(500);
        while session.phase() != Phase::Connected {
            assert!(tokio::time::Instant::now() < deadline, "never connected");
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        assert!(counter.delivered.load(Ordering::SeqCst) >= 1);

        handle.disconnect().await.unwrap();
    }
}
