/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 25/8/26
******************************************************************************/

//! Shard coordination.
//!
//! Guild traffic is partitioned across N independent sessions, each holding
//! its own connection, phase, sequence tracker, and heartbeat. All shards
//! funnel into one shared entity cache. Starts are staggered so the shards
//! do not identify simultaneously.

use crate::config::SessionConfig;
use crate::dispatcher::Subscriber;
use crate::session::{Session, SessionHandle};
use irongate_core::error::Result;
use irongate_core::types::ShardInfo;
use irongate_model::cache::EntityCache;
use irongate_transport::connector::Connector;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Runs a fleet of sharded sessions over one shared cache.
pub struct ShardCoordinator {
    cache: Arc<EntityCache>,
    handles: Vec<SessionHandle>,
}

impl ShardCoordinator {
    /// Spawns `count` sessions, shard `i` delayed by `i * start_interval`.
    ///
    /// Every session gets the same configuration apart from its shard
    /// coordinates, and every subscriber is registered on every shard.
    ///
    /// # Arguments
    /// * `config` - Base configuration; its shard coordinates are overridden
    /// * `count` - Number of shards, at least 1
    /// * `connector` - Shared connector used by every shard
    /// * `endpoint` - Gateway endpoint
    /// * `start_interval` - Delay between consecutive shard starts
    /// * `subscribers` - Event subscribers registered on every shard
    #[must_use]
    pub fn spawn_all(
        config: &SessionConfig,
        count: u32,
        connector: Arc<dyn Connector>,
        endpoint: &str,
        start_interval: Duration,
        subscribers: &[Arc<dyn Subscriber>],
    ) -> Self {
        let cache = Arc::new(EntityCache::new());
        let mut handles = Vec::with_capacity(count as usize);

        for index in 0..count {
            let shard_config = config.clone().with_shard(ShardInfo::new(index, count));
            let mut session = Session::new(shard_config, Arc::clone(&cache));
            for subscriber in subscribers {
                session.subscribe(Arc::clone(subscriber));
            }
            let session = Arc::new(session);
            let token = session.shutdown_token();
            let task_token = token.clone();
            let connector = Arc::clone(&connector);
            let endpoint = endpoint.to_string();

            let stagger = start_interval * index;
            let task = tokio::spawn(async move {
                if !stagger.is_zero() {
                    tokio::select! {
                        () = task_token.cancelled() => return Ok(()),
                        () = tokio::time::sleep(stagger) => {}
                    }
                }
                session.run(connector.as_ref(), &endpoint).await
            });
            handles.push(SessionHandle::new(token, task));
        }

        info!(count, "spawned shard fleet");
        Self { cache, handles }
    }

    /// Returns the cache all shards write into.
    #[must_use]
    pub fn cache(&self) -> &Arc<EntityCache> {
        &self.cache
    }

    /// Number of shards in the fleet.
    #[must_use]
    pub fn shard_count(&self) -> usize {
        self.handles.len()
    }

    /// Disconnects every shard, returning the first error encountered.
    ///
    /// # Errors
    /// Returns the terminal error of any shard that failed.
    pub async fn shutdown(self) -> Result<()> {
        let mut first_err = None;
        for handle in self.handles {
            if let Err(err) = handle.disconnect().await {
                first_err.get_or_insert(err);
            }
        }
        match first_err {
            None => Ok(()),
            Some(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use irongate_transport::memory::MemoryConnector;
    use serde_json::{Value, json};
    use tokio::time::timeout as tokio_timeout;

    const WAIT: Duration = Duration::from_millis(500);

    fn test_config() -> SessionConfig {
        SessionConfig::new("test-token")
            .with_backoff(Duration::from_millis(5), Duration::from_millis(20))
            .with_jitter_max(Duration::from_millis(1))
            .with_heartbeat_jitter(false)
    }

    fn hello() -> Value {
        json!({"op": 10, "d": {"heartbeat_interval": 50}})
    }

    #[tokio::test]
    async fn test_each_shard_identifies_with_its_coordinates() {
        let (connector, mut accepted) = MemoryConnector::new();
        let coordinator = ShardCoordinator::spawn_all(
            &test_config(),
            2,
            Arc::new(connector),
            "inproc://gateway",
            Duration::ZERO,
            &[],
        );
        assert_eq!(coordinator.shard_count(), 2);

        let mut seen = Vec::new();
        for _ in 0..2 {
            let mut remote = tokio_timeout(WAIT, accepted.recv()).await.unwrap().unwrap();
            remote.send(hello());
            let identify = tokio_timeout(WAIT, remote.recv()).await.unwrap().unwrap();
            assert_eq!(identify["op"], 2);
            assert_eq!(identify["d"]["shard"][1], 2);
            seen.push(identify["d"]["shard"][0].as_u64().unwrap());
        }
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1]);

        coordinator.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_shards_share_one_cache() {
        let (connector, mut accepted) = MemoryConnector::new();
        let coordinator = ShardCoordinator::spawn_all(
            &test_config(),
            2,
            Arc::new(connector),
            "inproc://gateway",
            Duration::ZERO,
            &[],
        );

        let mut remotes = Vec::new();
        for _ in 0..2 {
            let mut remote = tokio_timeout(WAIT, accepted.recv()).await.unwrap().unwrap();
            remote.send(hello());
            let identify = tokio_timeout(WAIT, remote.recv()).await.unwrap().unwrap();
            let shard = identify["d"]["shard"][0].as_u64().unwrap();
            remote.send(json!({
                "op": 0, "s": 1, "t": "READY",
                "d": {
                    "session_id": format!("shard-{shard}"),
                    "user": {"id": "1", "username": "gate"},
                    "guilds": []
                }
            }));
            remote.send(json!({
                "op": 0, "s": 2, "t": "GUILD_CREATE",
                "d": {
                    "id": (100 + shard).to_string(),
                    "name": format!("guild {shard}"),
                    "owner_id": "1",
                    "afk_channel_id": "2",
                    "afk_timeout": 300,
                    "region": "us-west",
                    "member_count": 1,
                    "verification_level": 0,
                    "mfa_level": 0,
                    "default_message_notifications": 0
                }
            }));
            remotes.push(remote);
        }

        let cache = Arc::clone(coordinator.cache());
        let deadline = tokio::time::Instant::now() + WAIT;
        while cache.guild_count() < 2 {
            assert!(tokio::time::Instant::now() < deadline, "cache never filled");
            tokio::time::sleep(Duration::from_millis(2)).await;
        }

        coordinator.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_cancels_staggered_start() {
        let (connector, mut accepted) = MemoryConnector::new();
        let coordinator = ShardCoordinator::spawn_all(
            &test_config(),
            2,
            Arc::new(connector),
            "inproc://gateway",
            Duration::from_secs(60),
            &[],
        );

        // Shard 0 dials immediately; shard 1 is still waiting out its
        // stagger and must exit promptly on shutdown.
        let _remote = tokio_timeout(WAIT, accepted.recv()).await.unwrap().unwrap();
        tokio_timeout(WAIT, coordinator.shutdown())
            .await
            .unwrap()
            .unwrap();
    }
}
