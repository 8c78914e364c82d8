/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 25/8/26
******************************************************************************/

//! Role record.

use crate::decode;
use irongate_core::error::DecodeError;
use irongate_core::types::Snowflake;
use serde_json::Value;

/// A guild role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    /// Role identifier.
    pub id: Snowflake,
    /// Role name.
    pub name: String,
    /// Display color as an RGB integer.
    pub color: u64,
    /// Whether the role is hoisted in the member list.
    pub hoist: bool,
    /// Sort position.
    pub position: i64,
    /// Permission bit set.
    pub permissions: u64,
    /// Whether an integration manages this role.
    pub managed: bool,
    /// Whether the role is mentionable.
    pub mentionable: bool,
}

impl Role {
    /// Decodes a role from a property map.
    ///
    /// # Errors
    /// Returns [`DecodeError`] on any absent required field or malformed
    /// value.
    pub fn decode(value: &Value) -> Result<Self, DecodeError> {
        Self::decode_at(value, "")
    }

    pub(crate) fn decode_at(value: &Value, path: &str) -> Result<Self, DecodeError> {
        let map = decode::object(value, path)?;

        Ok(Self {
            id: decode::req_snowflake(map, "id", path)?,
            name: decode::req_str(map, "name", path)?.to_string(),
            color: decode::req_u64(map, "color", path)?,
            hoist: decode::req_bool(map, "hoist", path)?,
            position: decode::opt_i64(map, "position", path)?.unwrap_or(0),
            permissions: decode::req_bits(map, "permissions", path)?,
            managed: decode::req_bool(map, "managed", path)?,
            mentionable: decode::req_bool(map, "mentionable", path)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn role_payload() -> Value {
        json!({
            "id": "41771983423143936",
            "name": "WE DEM BOYZZ!!!!!!",
            "color": 3447003,
            "hoist": true,
            "position": 1,
            "permissions": "66321471",
            "managed": false,
            "mentionable": false
        })
    }

    #[test]
    fn test_decode_role() {
        let role = Role::decode(&role_payload()).unwrap();
        assert_eq!(role.id, Snowflake::new(41771983423143936));
        assert_eq!(role.permissions, 66321471);
        assert!(role.hoist);
    }

    #[test]
    fn test_missing_name_fails() {
        let mut payload = role_payload();
        payload.as_object_mut().unwrap().remove("name");
        let err = Role::decode(&payload).unwrap_err();
        assert_eq!(err, DecodeError::MissingField("name".into()));
    }
}
