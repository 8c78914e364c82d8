/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 25/8/26
******************************************************************************/

//! Session configuration.

use irongate_core::types::ShardInfo;
use std::fmt;
use std::time::Duration;

/// Configuration for one gateway session.
#[derive(Clone)]
pub struct SessionConfig {
    /// Authentication token.
    pub token: String,
    /// Shard coordinates carried in the identify payload.
    pub shard: ShardInfo,
    /// Event intent bits carried in the identify payload.
    pub intents: u64,
    /// Consecutive unacknowledged heartbeats before forcing a reconnect.
    pub max_missed_acks: u32,
    /// Initial reconnect backoff delay.
    pub backoff_base: Duration,
    /// Maximum reconnect backoff delay.
    pub backoff_max: Duration,
    /// Upper bound of the random jitter added to each backoff delay.
    pub jitter_max: Duration,
    /// Time allowed for the transport open and the opening hello frame.
    pub connect_timeout: Duration,
    /// Whether the first heartbeat tick is jittered by a random fraction of
    /// the interval, to avoid synchronized bursts across shards.
    pub heartbeat_jitter: bool,
}

impl SessionConfig {
    /// Creates a configuration with defaults for everything but the token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            shard: ShardInfo::single(),
            intents: 0,
            max_missed_acks: 3,
            backoff_base: Duration::from_secs(1),
            backoff_max: Duration::from_secs(60),
            jitter_max: Duration::from_millis(500),
            connect_timeout: Duration::from_secs(30),
            heartbeat_jitter: true,
        }
    }

    /// Sets the shard coordinates.
    #[must_use]
    pub const fn with_shard(mut self, shard: ShardInfo) -> Self {
        self.shard = shard;
        self
    }

    /// Sets the intent bits.
    #[must_use]
    pub const fn with_intents(mut self, intents: u64) -> Self {
        self.intents = intents;
        self
    }

    /// Sets the backoff window.
    #[must_use]
    pub const fn with_backoff(mut self, base: Duration, max: Duration) -> Self {
        self.backoff_base = base;
        self.backoff_max = max;
        self
    }

    /// Sets the backoff jitter bound.
    #[must_use]
    pub const fn with_jitter_max(mut self, jitter: Duration) -> Self {
        self.jitter_max = jitter;
        self
    }

    /// Sets the connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the missed-ack threshold.
    #[must_use]
    pub const fn with_max_missed_acks(mut self, max: u32) -> Self {
        self.max_missed_acks = max;
        self
    }

    /// Enables or disables first-tick heartbeat jitter.
    #[must_use]
    pub const fn with_heartbeat_jitter(mut self, jitter: bool) -> Self {
        self.heartbeat_jitter = jitter;
        self
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("token", &"<redacted>")
            .field("shard", &self.shard)
            .field("intents", &self.intents)
            .field("max_missed_acks", &self.max_missed_acks)
            .field("backoff_base", &self.backoff_base)
            .field("backoff_max", &self.backoff_max)
            .field("jitter_max", &self.jitter_max)
            .field("connect_timeout", &self.connect_timeout)
            .field("heartbeat_jitter", &self.heartbeat_jitter)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::new("tok");
        assert_eq!(config.max_missed_acks, 3);
        assert_eq!(config.shard, ShardInfo::single());
        assert_eq!(config.backoff_base, Duration::from_secs(1));
    }

    #[test]
    fn test_builder_setters() {
        let config = SessionConfig::new("tok")
            .with_shard(ShardInfo::new(2, 4))
            .with_intents(513)
            .with_backoff(Duration::from_millis(10), Duration::from_millis(100))
            .with_heartbeat_jitter(false);
        assert_eq!(config.shard.index, 2);
        assert_eq!(config.intents, 513);
        assert!(!config.heartbeat_jitter);
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = SessionConfig::new("super-secret");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
