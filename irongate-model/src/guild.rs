/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 25/8/26
******************************************************************************/

//! Guild record.
//!
//! A guild snapshot is decoded fully into locals and only then frozen into
//! the record; a partially built guild is never observable.

use crate::channel::Channel;
use crate::decode;
use crate::emoji::Emoji;
use crate::member::Member;
use crate::role::Role;
use chrono::{DateTime, Utc};
use irongate_core::error::DecodeError;
use irongate_core::types::Snowflake;
use serde_json::Value;

/// A guild and its nested collections.
///
/// Collections (channels, members, roles, emojis) default to empty when the
/// sender omits them; a guild flagged `large` intentionally arrives without
/// its full member list.
#[derive(Debug, Clone, PartialEq)]
pub struct Guild {
    /// Guild identifier.
    pub id: Snowflake,
    /// Guild name.
    pub name: String,
    /// Identifier of the owning user.
    pub owner_id: Snowflake,
    /// Channel the AFK timeout moves members to.
    pub afk_channel_id: Snowflake,
    /// AFK timeout in seconds.
    pub afk_timeout: u64,
    /// Icon hash, if set.
    pub icon: Option<String>,
    /// Splash hash, if set.
    pub splash: Option<String>,
    /// Voice region.
    pub region: String,
    /// Total member count reported by the remote.
    pub member_count: u64,
    /// Whether the guild is considered large (member list withheld).
    pub large: Option<bool>,
    /// When the current user joined.
    pub joined_at: Option<DateTime<Utc>>,
    /// Enabled feature flags.
    pub features: Vec<String>,
    /// Verification level.
    pub verification_level: u8,
    /// Multi-factor auth requirement level.
    pub mfa_level: u8,
    /// Default notification setting.
    pub default_message_notifications: u8,
    /// Channels, empty when omitted.
    pub channels: Vec<Channel>,
    /// Members, empty when omitted.
    pub members: Vec<Member>,
    /// Roles, empty when omitted.
    pub roles: Vec<Role>,
    /// Emojis, empty when omitted.
    pub emojis: Vec<Emoji>,
}

impl Guild {
    /// Decodes a guild snapshot from a property map.
    ///
    /// # Errors
    /// Returns [`DecodeError`] on any absent required field, malformed
    /// identifier, or nested record failure (reported with the nested path).
    pub fn decode(value: &Value) -> Result<Self, DecodeError> {
        Self::decode_at(value, "")
    }

    pub(crate) fn decode_at(value: &Value, path: &str) -> Result<Self, DecodeError> {
        let map = decode::object(value, path)?;

        Ok(Self {
            id: decode::req_snowflake(map, "id", path)?,
            name: decode::req_str(map, "name", path)?.to_string(),
            owner_id: decode::req_snowflake(map, "owner_id", path)?,
            afk_channel_id: decode::req_snowflake(map, "afk_channel_id", path)?,
            afk_timeout: decode::req_u64(map, "afk_timeout", path)?,
            icon: decode::opt_str(map, "icon", path)?,
            splash: decode::opt_str(map, "splash", path)?,
            region: decode::req_str(map, "region", path)?.to_string(),
            member_count: decode::req_u64(map, "member_count", path)?,
            large: decode::opt_bool(map, "large", path)?,
            joined_at: decode::opt_timestamp(map, "joined_at", path)?,
            features: decode::str_list(map, "features", path)?,
            verification_level: decode::req_u8(map, "verification_level", path)?,
            mfa_level: decode::req_u8(map, "mfa_level", path)?,
            default_message_notifications: decode::req_u8(
                map,
                "default_message_notifications",
                path,
            )?,
            channels: decode::list_of(map, "channels", path, Channel::decode_at)?,
            members: decode::list_of(map, "members", path, Member::decode_at)?,
            roles: decode::list_of(map, "roles", path, Role::decode_at)?,
            emojis: decode::list_of(map, "emojis", path, Emoji::decode_at)?,
        })
    }
}

/// Stub for a guild the remote has not yet delivered, or has taken offline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnavailableGuild {
    /// Guild identifier.
    pub id: Snowflake,
    /// Whether the guild is unavailable due to an outage.
    pub unavailable: bool,
    /// Index of the shard that owns this guild's events.
    pub shard: u32,
}

impl UnavailableGuild {
    /// Decodes an unavailable-guild stub.
    ///
    /// # Arguments
    /// * `value` - The property map
    /// * `shard` - Index of the shard the stub arrived on
    ///
    /// # Errors
    /// Returns [`DecodeError`] if `id` is absent or malformed.
    pub fn decode(value: &Value, shard: u32) -> Result<Self, DecodeError> {
        Self::decode_at(value, "", shard)
    }

    pub(crate) fn decode_at(value: &Value, path: &str, shard: u32) -> Result<Self, DecodeError> {
        let map = decode::object(value, path)?;

        Ok(Self {
            id: decode::req_snowflake(map, "id", path)?,
            unavailable: decode::opt_bool(map, "unavailable", path)?.unwrap_or(true),
            shard,
        })
    }
}
