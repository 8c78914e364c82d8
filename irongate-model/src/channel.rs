/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 25/8/26
******************************************************************************/

//! Channel record.

use crate::decode;
use irongate_core::error::DecodeError;
use irongate_core::types::Snowflake;
use serde_json::Value;

/// A guild or direct-message channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    /// Channel identifier.
    pub id: Snowflake,
    /// Channel kind discriminant from the wire (`type`).
    pub kind: u8,
    /// Owning guild, absent for direct messages.
    pub guild_id: Option<Snowflake>,
    /// Channel name, absent for direct messages.
    pub name: Option<String>,
    /// Sort position.
    pub position: Option<i64>,
    /// Channel topic.
    pub topic: Option<String>,
}

impl Channel {
    /// Decodes a channel from a property map.
    ///
    /// # Errors
    /// Returns [`DecodeError`] if `id` or `type` is absent or any present
    /// field has the wrong shape.
    pub fn decode(value: &Value) -> Result<Self, DecodeError> {
        Self::decode_at(value, "")
    }

    pub(crate) fn decode_at(value: &Value, path: &str) -> Result<Self, DecodeError> {
        let map = decode::object(value, path)?;

        Ok(Self {
            id: decode::req_snowflake(map, "id", path)?,
            kind: decode::req_u8(map, "type", path)?,
            guild_id: decode::opt_snowflake(map, "guild_id", path)?,
            name: decode::opt_str(map, "name", path)?,
            position: decode::opt_i64(map, "position", path)?,
            topic: decode::opt_str(map, "topic", path)?,
        })
    }
}
