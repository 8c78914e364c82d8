/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 25/8/26
******************************************************************************/

//! Dispatch events.
//!
//! Server-pushed dispatch frames are keyed by a string event name. That open
//! keying maps onto one closed tagged-variant type: one case per known event
//! name, plus an explicit [`DispatchEvent::Unknown`] fallback carrying the
//! raw payload. There is no best-effort parsing of unrecognized names.

use crate::channel::Channel;
use crate::decode;
use crate::emoji::Emoji;
use crate::guild::{Guild, UnavailableGuild};
use crate::member::Member;
use crate::role::Role;
use crate::user::User;
use irongate_core::error::DecodeError;
use irongate_core::types::Snowflake;
use serde_json::Value;

/// A decoded dispatch event.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchEvent {
    /// Handshake confirmation: the session is live.
    Ready {
        /// Resume token for this session.
        session_id: String,
        /// The authenticated user.
        user: User,
        /// Stubs for guilds not yet delivered.
        guilds: Vec<UnavailableGuild>,
    },
    /// A dropped session was resumed without a state resend.
    Resumed,
    /// First snapshot of a guild, or a newly joined guild.
    GuildCreate(Guild),
    /// In-place guild update.
    GuildUpdate(Guild),
    /// Guild removed or gone unavailable.
    GuildDelete(UnavailableGuild),
    /// Channel created.
    ChannelCreate(Channel),
    /// Channel updated.
    ChannelUpdate(Channel),
    /// Channel deleted.
    ChannelDelete(Channel),
    /// Member joined a guild.
    MemberAdd {
        /// Owning guild.
        guild_id: Snowflake,
        /// The new member.
        member: Member,
    },
    /// Member updated.
    MemberUpdate {
        /// Owning guild.
        guild_id: Snowflake,
        /// The updated member.
        member: Member,
    },
    /// Member left or was removed.
    MemberRemove {
        /// Owning guild.
        guild_id: Snowflake,
        /// The departed user.
        user: User,
    },
    /// Role created.
    RoleCreate {
        /// Owning guild.
        guild_id: Snowflake,
        /// The new role.
        role: Role,
    },
    /// Role updated.
    RoleUpdate {
        /// Owning guild.
        guild_id: Snowflake,
        /// The updated role.
        role: Role,
    },
    /// Role deleted.
    RoleDelete {
        /// Owning guild.
        guild_id: Snowflake,
        /// Identifier of the deleted role.
        role_id: Snowflake,
    },
    /// Full replacement of a guild's emoji list.
    EmojisUpdate {
        /// Owning guild.
        guild_id: Snowflake,
        /// The new emoji list.
        emojis: Vec<Emoji>,
    },
    /// The authenticated user's own record changed.
    UserUpdate(User),
    /// Event name not known to this implementation.
    Unknown {
        /// The wire event name.
        name: String,
        /// The raw payload.
        payload: Value,
    },
}

impl DispatchEvent {
    /// Decodes a dispatch payload by its wire event name.
    ///
    /// # Arguments
    /// * `name` - The wire event name (`t` member of the envelope)
    /// * `payload` - The event payload (`d` member)
    /// * `shard` - Index of the shard the frame arrived on
    ///
    /// # Errors
    /// Returns [`DecodeError`] if the payload for a known event name fails
    /// the entity decode contract. Unknown names never fail.
    pub fn parse(name: &str, payload: &Value, shard: u32) -> Result<Self, DecodeError> {
        let event = match name {
            "READY" => {
                let map = decode::object(payload, "")?;
                Self::Ready {
                    session_id: decode::req_str(map, "session_id", "")?.to_string(),
                    user: User::decode_at(decode::req(map, "user", "")?, "user")?,
                    guilds: decode::list_of(map, "guilds", "", |v, p| {
                        UnavailableGuild::decode_at(v, p, shard)
                    })?,
                }
            }
            "RESUMED" => Self::Resumed,
            "GUILD_CREATE" => Self::GuildCreate(Guild::decode(payload)?),
            "GUILD_UPDATE" => Self::GuildUpdate(Guild::decode(payload)?),
            "GUILD_DELETE" => Self::GuildDelete(UnavailableGuild::decode(payload, shard)?),
            "CHANNEL_CREATE" => Self::ChannelCreate(Channel::decode(payload)?),
            "CHANNEL_UPDATE" => Self::ChannelUpdate(Channel::decode(payload)?),
            "CHANNEL_DELETE" => Self::ChannelDelete(Channel::decode(payload)?),
            "GUILD_MEMBER_ADD" => Self::MemberAdd {
                guild_id: guild_id_of(payload)?,
                member: Member::decode(payload)?,
            },
            "GUILD_MEMBER_UPDATE" => Self::MemberUpdate {
                guild_id: guild_id_of(payload)?,
                member: Member::decode(payload)?,
            },
            "GUILD_MEMBER_REMOVE" => {
                let map = decode::object(payload, "")?;
                Self::MemberRemove {
                    guild_id: decode::req_snowflake(map, "guild_id", "")?,
                    user: User::decode_at(decode::req(map, "user", "")?, "user")?,
                }
            }
            "GUILD_ROLE_CREATE" | "GUILD_ROLE_UPDATE" => {
                let map = decode::object(payload, "")?;
                let guild_id = decode::req_snowflake(map, "guild_id", "")?;
                let role = Role::decode_at(decode::req(map, "role", "")?, "role")?;
                if name == "GUILD_ROLE_CREATE" {
                    Self::RoleCreate { guild_id, role }
                } else {
                    Self::RoleUpdate { guild_id, role }
                }
            }
            "GUILD_ROLE_DELETE" => {
                let map = decode::object(payload, "")?;
                Self::RoleDelete {
                    guild_id: decode::req_snowflake(map, "guild_id", "")?,
                    role_id: decode::req_snowflake(map, "role_id", "")?,
                }
            }
            "GUILD_EMOJIS_UPDATE" => {
                let map = decode::object(payload, "")?;
                Self::EmojisUpdate {
                    guild_id: decode::req_snowflake(map, "guild_id", "")?,
                    emojis: decode::list_of(map, "emojis", "", Emoji::decode_at)?,
                }
            }
            "USER_UPDATE" => Self::UserUpdate(User::decode(payload)?),
            _ => Self::Unknown {
                name: name.to_string(),
                payload: payload.clone(),
            },
        };
        Ok(event)
    }

    /// Returns the wire event name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Ready { .. } => "READY",
            Self::Resumed => "RESUMED",
            Self::GuildCreate(_) => "GUILD_CREATE",
            Self::GuildUpdate(_) => "GUILD_UPDATE",
            Self::GuildDelete(_) => "GUILD_DELETE",
            Self::ChannelCreate(_) => "CHANNEL_CREATE",
            Self::ChannelUpdate(_) => "CHANNEL_UPDATE",
            Self::ChannelDelete(_) => "CHANNEL_DELETE",
            Self::MemberAdd { .. } => "GUILD_MEMBER_ADD",
            Self::MemberUpdate { .. } => "GUILD_MEMBER_UPDATE",
            Self::MemberRemove { .. } => "GUILD_MEMBER_REMOVE",
            Self::RoleCreate { .. } => "GUILD_ROLE_CREATE",
            Self::RoleUpdate { .. } => "GUILD_ROLE_UPDATE",
            Self::RoleDelete { .. } => "GUILD_ROLE_DELETE",
            Self::EmojisUpdate { .. } => "GUILD_EMOJIS_UPDATE",
            Self::UserUpdate(_) => "USER_UPDATE",
            Self::Unknown { name, .. } => name,
        }
    }
}

fn guild_id_of(payload: &Value) -> Result<Snowflake, DecodeError> {
    let map = decode::object(payload, "")?;
    decode::req_snowflake(map, "guild_id", "")
}
