/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 25/8/26
******************************************************************************/

//! Shared entity cache.
//!
//! The cache is the one resource touched by more than one session. Its
//! concurrency discipline is a single-writer funnel: every mutation goes
//! through [`EntityCache::apply`], driven by each session's dispatch path,
//! while readers take short shared locks. Entities are keyed by their
//! opaque identifier; cross-entity references are resolved by lookup, never
//! by back pointer.

use crate::event::DispatchEvent;
use crate::guild::{Guild, UnavailableGuild};
use crate::user::User;
use irongate_core::types::Snowflake;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

/// Process-wide store of decoded entities.
///
/// Lifecycle is tied to the owning session or shard coordinator; it is not
/// an ambient global.
#[derive(Debug, Default)]
pub struct EntityCache {
    guilds: RwLock<HashMap<Snowflake, Guild>>,
    unavailable: RwLock<HashMap<Snowflake, UnavailableGuild>>,
    users: RwLock<HashMap<Snowflake, User>>,
    current_user: RwLock<Option<User>>,
}

impl EntityCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one dispatch event to the cache.
    ///
    /// This is the only mutation path. Events for entities the cache has
    /// never seen are applied as inserts where that is meaningful and
    /// otherwise ignored.
    pub fn apply(&self, event: &DispatchEvent) {
        match event {
            DispatchEvent::Ready { user, guilds, .. } => {
                *self.current_user.write() = Some(user.clone());
                self.users.write().insert(user.id, user.clone());
                let mut unavailable = self.unavailable.write();
                for stub in guilds {
                    unavailable.insert(stub.id, *stub);
                }
            }
            DispatchEvent::GuildCreate(guild) => {
                self.unavailable.write().remove(&guild.id);
                let mut users = self.users.write();
                for member in &guild.members {
                    users.insert(member.user.id, member.user.clone());
                }
                drop(users);
                self.guilds.write().insert(guild.id, guild.clone());
            }
            DispatchEvent::GuildUpdate(incoming) => {
                let mut guilds = self.guilds.write();
                match guilds.get_mut(&incoming.id) {
                    Some(existing) => {
                        // Update frames omit the nested collections; keep
                        // the cached ones when the incoming lists are empty.
                        let mut updated = incoming.clone();
                        if updated.channels.is_empty() {
                            updated.channels = std::mem::take(&mut existing.channels);
                        }
                        if updated.members.is_empty() {
                            updated.members = std::mem::take(&mut existing.members);
                        }
                        if updated.roles.is_empty() {
                            updated.roles = std::mem::take(&mut existing.roles);
                        }
                        if updated.emojis.is_empty() {
                            updated.emojis = std::mem::take(&mut existing.emojis);
                        }
                        *existing = updated;
                    }
                    None => {
                        guilds.insert(incoming.id, incoming.clone());
                    }
                }
            }
            DispatchEvent::GuildDelete(stub) => {
                self.guilds.write().remove(&stub.id);
                if stub.unavailable {
                    // Outage, not removal: the guild may come back.
                    self.unavailable.write().insert(stub.id, *stub);
                } else {
                    self.unavailable.write().remove(&stub.id);
                }
            }
            DispatchEvent::ChannelCreate(channel) | DispatchEvent::ChannelUpdate(channel) => {
                if let Some(guild_id) = channel.guild_id {
                    self.with_guild(guild_id, |guild| {
                        match guild.channels.iter_mut().find(|c| c.id == channel.id) {
                            Some(existing) => *existing = channel.clone(),
                            None => guild.channels.push(channel.clone()),
                        }
                    });
                }
            }
            DispatchEvent::ChannelDelete(channel) => {
                if let Some(guild_id) = channel.guild_id {
                    self.with_guild(guild_id, |guild| {
                        guild.channels.retain(|c| c.id != channel.id);
                    });
                }
            }
            DispatchEvent::MemberAdd { guild_id, member } => {
                self.users.write().insert(member.user.id, member.user.clone());
                self.with_guild(*guild_id, |guild| {
                    guild.members.push(member.clone());
                    guild.member_count += 1;
                });
            }
            DispatchEvent::MemberUpdate { guild_id, member } => {
                self.users.write().insert(member.user.id, member.user.clone());
                self.with_guild(*guild_id, |guild| {
                    match guild
                        .members
                        .iter_mut()
                        .find(|m| m.user.id == member.user.id)
                    {
                        Some(existing) => *existing = member.clone(),
                        None => guild.members.push(member.clone()),
                    }
                });
            }
            DispatchEvent::MemberRemove { guild_id, user } => {
                self.with_guild(*guild_id, |guild| {
                    guild.members.retain(|m| m.user.id != user.id);
                    guild.member_count = guild.member_count.saturating_sub(1);
                });
            }
            DispatchEvent::RoleCreate { guild_id, role }
            | DispatchEvent::RoleUpdate { guild_id, role } => {
                self.with_guild(*guild_id, |guild| {
                    match guild.roles.iter_mut().find(|r| r.id == role.id) {
                        Some(existing) => *existing = role.clone(),
                        None => guild.roles.push(role.clone()),
                    }
                });
            }
            DispatchEvent::RoleDelete { guild_id, role_id } => {
                self.with_guild(*guild_id, |guild| {
                    guild.roles.retain(|r| r.id != *role_id);
                });
            }
            DispatchEvent::EmojisUpdate { guild_id, emojis } => {
                self.with_guild(*guild_id, |guild| {
                    guild.emojis = emojis.clone();
                });
            }
            DispatchEvent::UserUpdate(user) => {
                *self.current_user.write() = Some(user.clone());
                self.users.write().insert(user.id, user.clone());
            }
            DispatchEvent::Resumed | DispatchEvent::Unknown { .. } => {}
        }
    }

    fn with_guild(&self, guild_id: Snowflake, f: impl FnOnce(&mut Guild)) {
        let mut guilds = self.guilds.write();
        match guilds.get_mut(&guild_id) {
            Some(guild) => f(guild),
            None => debug!(%guild_id, "dropping update for uncached guild"),
        }
    }

    /// Looks up a guild by identifier.
    #[must_use]
    pub fn guild(&self, id: Snowflake) -> Option<Guild> {
        self.guilds.read().get(&id).cloned()
    }

    /// Returns the number of cached guilds.
    #[must_use]
    pub fn guild_count(&self) -> usize {
        self.guilds.read().len()
    }

    /// Looks up a user by identifier.
    #[must_use]
    pub fn user(&self, id: Snowflake) -> Option<User> {
        self.users.read().get(&id).cloned()
    }

    /// Returns the authenticated user, once a ready frame has been applied.
    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.current_user.read().clone()
    }

    /// Returns whether a guild is currently marked unavailable.
    #[must_use]
    pub fn is_unavailable(&self, id: Snowflake) -> bool {
        self.unavailable.read().contains_key(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guild::Guild;
    use serde_json::json;

    fn cached_guild(cache: &EntityCache) -> Guild {
        cache.guild(Snowflake::new(100)).expect("guild cached")
    }

    fn seed(cache: &EntityCache) {
        let guild = Guild::decode(&json!({
            "id": "100",
            "name": "Test",
            "owner_id": "1",
            "afk_channel_id": "2",
            "afk_timeout": 300,
            "region": "us-west",
            "member_count": 1,
            "verification_level": 0,
            "mfa_level": 0,
            "default_message_notifications": 0,
            "channels": [{"id": "10", "type": 0, "guild_id": "100", "name": "general"}],
            "members": [{"user": {"id": "1", "username": "owner"}}],
            "roles": [{"id": "20", "name": "everyone", "color": 0, "hoist": false,
                       "permissions": 0, "managed": false, "mentionable": false}]
        }))
        .unwrap();
        cache.apply(&DispatchEvent::GuildCreate(guild));
    }

    #[test]
    fn test_guild_create_then_delete() {
        let cache = EntityCache::new();
        seed(&cache);
        assert_eq!(cache.guild_count(), 1);
        assert_eq!(cache.user(Snowflake::new(1)).unwrap().username.as_deref(), Some("owner"));

        cache.apply(&DispatchEvent::GuildDelete(UnavailableGuild {
            id: Snowflake::new(100),
            unavailable: false,
            shard: 0,
        }));
        assert_eq!(cache.guild_count(), 0);
        assert!(!cache.is_unavailable(Snowflake::new(100)));
    }

    #[test]
    fn test_guild_outage_keeps_stub() {
        let cache = EntityCache::new();
        seed(&cache);
        cache.apply(&DispatchEvent::GuildDelete(UnavailableGuild {
            id: Snowflake::new(100),
            unavailable: true,
            shard: 0,
        }));
        assert!(cache.is_unavailable(Snowflake::new(100)));
    }

    #[test]
    fn test_channel_lifecycle_updates_owning_guild() {
        let cache = EntityCache::new();
        seed(&cache);

        let channel = crate::channel::Channel::decode(&json!({
            "id": "11", "type": 0, "guild_id": "100", "name": "memes"
        }))
        .unwrap();
        cache.apply(&DispatchEvent::ChannelCreate(channel.clone()));
        assert_eq!(cached_guild(&cache).channels.len(), 2);

        cache.apply(&DispatchEvent::ChannelDelete(channel));
        assert_eq!(cached_guild(&cache).channels.len(), 1);
    }

    #[test]
    fn test_member_add_remove_tracks_count() {
        let cache = EntityCache::new();
        seed(&cache);

        let member =
            crate::member::Member::decode(&json!({"user": {"id": "3", "username": "nelly"}}))
                .unwrap();
        cache.apply(&DispatchEvent::MemberAdd {
            guild_id: Snowflake::new(100),
            member,
        });
        assert_eq!(cached_guild(&cache).member_count, 2);
        assert_eq!(cached_guild(&cache).members.len(), 2);

        cache.apply(&DispatchEvent::MemberRemove {
            guild_id: Snowflake::new(100),
            user: cache.user(Snowflake::new(3)).unwrap(),
        });
        assert_eq!(cached_guild(&cache).member_count, 1);
    }

    #[test]
    fn test_guild_update_preserves_omitted_collections() {
        let cache = EntityCache::new();
        seed(&cache);

        let update = Guild::decode(&json!({
            "id": "100",
            "name": "Renamed",
            "owner_id": "1",
            "afk_channel_id": "2",
            "afk_timeout": 600,
            "region": "us-west",
            "member_count": 1,
            "verification_level": 0,
            "mfa_level": 0,
            "default_message_notifications": 0
        }))
        .unwrap();
        cache.apply(&DispatchEvent::GuildUpdate(update));

        let guild = cached_guild(&cache);
        assert_eq!(guild.name, "Renamed");
        assert_eq!(guild.afk_timeout, 600);
        assert_eq!(guild.channels.len(), 1);
        assert_eq!(guild.roles.len(), 1);
    }

    #[test]
    fn test_update_for_uncached_guild_is_dropped() {
        let cache = EntityCache::new();
        cache.apply(&DispatchEvent::RoleDelete {
            guild_id: Snowflake::new(999),
            role_id: Snowflake::new(1),
        });
        assert_eq!(cache.guild_count(), 0);
    }

    #[test]
    fn test_ready_stores_current_user_and_stubs() {
        let cache = EntityCache::new();
        let event = DispatchEvent::parse(
            "READY",
            &json!({
                "session_id": "abc",
                "user": {"id": "1", "username": "irongate", "bot": true},
                "guilds": [{"id": "100", "unavailable": true}]
            }),
            0,
        )
        .unwrap();
        cache.apply(&event);

        assert_eq!(cache.current_user().unwrap().id, Snowflake::new(1));
        assert!(cache.is_unavailable(Snowflake::new(100)));
    }
}
