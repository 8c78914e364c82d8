/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 25/8/26
******************************************************************************/

//! Guild member record.

use crate::decode;
use crate::user::User;
use chrono::{DateTime, Utc};
use irongate_core::error::DecodeError;
use irongate_core::types::Snowflake;
use serde_json::Value;

/// A user's membership in one guild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// The member's user record.
    pub user: User,
    /// Guild-specific nickname.
    pub nick: Option<String>,
    /// Identifiers of the roles assigned to this member.
    pub roles: Vec<Snowflake>,
    /// When the user joined the guild.
    pub joined_at: Option<DateTime<Utc>>,
    /// Whether the member is server-deafened.
    pub deaf: Option<bool>,
    /// Whether the member is server-muted.
    pub mute: Option<bool>,
}

impl Member {
    /// Decodes a member from a property map.
    ///
    /// # Errors
    /// Returns [`DecodeError`] if the nested `user` record is absent or
    /// malformed, with the nested field path.
    pub fn decode(value: &Value) -> Result<Self, DecodeError> {
        Self::decode_at(value, "")
    }

    pub(crate) fn decode_at(value: &Value, path: &str) -> Result<Self, DecodeError> {
        let map = decode::object(value, path)?;

        let user_value = decode::req(map, "user", path)?;
        let user = User::decode_at(user_value, &decode::join(path, "user"))?;

        Ok(Self {
            user,
            nick: decode::opt_str(map, "nick", path)?,
            roles: decode::snowflake_list(map, "roles", path)?,
            joined_at: decode::opt_timestamp(map, "joined_at", path)?,
            deaf: decode::opt_bool(map, "deaf", path)?,
            mute: decode::opt_bool(map, "mute", path)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_member() {
        let member = Member::decode(&json!({
            "user": {"id": "1", "username": "nelly"},
            "nick": "NOT API SUPPORT",
            "roles": ["41771983423143936"],
            "joined_at": "2015-04-26T06:26:56.936000+00:00",
            "deaf": false,
            "mute": false
        }))
        .unwrap();
        assert_eq!(member.user.id, Snowflake::new(1));
        assert_eq!(member.roles, vec![Snowflake::new(41771983423143936)]);
        assert!(member.joined_at.is_some());
    }

    #[test]
    fn test_absent_roles_default_to_empty() {
        let member = Member::decode(&json!({"user": {"id": "1"}})).unwrap();
        assert!(member.roles.is_empty());
    }

    #[test]
    fn test_nested_user_failure_reports_path() {
        let err = Member::decode(&json!({"user": {"username": "ghost"}})).unwrap_err();
        assert_eq!(err, DecodeError::MissingField("user.id".into()));
    }

    #[test]
    fn test_missing_user_is_hard_failure() {
        let err = Member::decode(&json!({"nick": "x"})).unwrap_err();
        assert_eq!(err, DecodeError::MissingField("user".into()));
    }
}
