/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 25/8/26
******************************************************************************/

//! User record.

use crate::decode;
use irongate_core::error::DecodeError;
use irongate_core::types::Snowflake;
use serde_json::Value;

/// A user account as seen by the gateway.
///
/// Only the identifier is guaranteed by the wire; everything else may be
/// withheld depending on the event that carried the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// User identifier.
    pub id: Snowflake,
    /// Username, if included.
    pub username: Option<String>,
    /// Legacy discriminator, if included.
    pub discriminator: Option<String>,
    /// Avatar hash, if set.
    pub avatar: Option<String>,
    /// Whether the account is a bot.
    pub bot: Option<bool>,
    /// Whether multi-factor auth is enabled.
    pub mfa_enabled: Option<bool>,
    /// Whether the account is verified.
    pub verified: Option<bool>,
    /// Account email, if exposed.
    pub email: Option<String>,
}

impl User {
    /// Decodes a user from a property map.
    ///
    /// # Errors
    /// Returns [`DecodeError`] if `id` is absent or malformed, or any
    /// present field has the wrong shape.
    pub fn decode(value: &Value) -> Result<Self, DecodeError> {
        Self::decode_at(value, "")
    }

    pub(crate) fn decode_at(value: &Value, path: &str) -> Result<Self, DecodeError> {
        let map = decode::object(value, path)?;

        Ok(Self {
            id: decode::req_snowflake(map, "id", path)?,
            username: decode::opt_str(map, "username", path)?,
            discriminator: decode::opt_str(map, "discriminator", path)?,
            avatar: decode::opt_str(map, "avatar", path)?,
            bot: decode::opt_bool(map, "bot", path)?,
            mfa_enabled: decode::opt_bool(map, "mfa_enabled", path)?,
            verified: decode::opt_bool(map, "verified", path)?,
            email: decode::opt_str(map, "email", path)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_minimal_user() {
        let user = User::decode(&json!({"id": "225214401389767680"})).unwrap();
        assert_eq!(user.id, Snowflake::new(225214401389767680));
        assert_eq!(user.username, None);
        assert_eq!(user.bot, None);
    }

    #[test]
    fn test_decode_full_user() {
        let user = User::decode(&json!({
            "id": "1",
            "username": "irongate",
            "discriminator": "0001",
            "bot": true
        }))
        .unwrap();
        assert_eq!(user.username.as_deref(), Some("irongate"));
        assert_eq!(user.bot, Some(true));
    }

    #[test]
    fn test_missing_id_is_hard_failure() {
        let err = User::decode(&json!({"username": "ghost"})).unwrap_err();
        assert_eq!(err, DecodeError::MissingField("id".into()));
    }

    #[test]
    fn test_malformed_id_never_defaults() {
        let err = User::decode(&json!({"id": "abc"})).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidSnowflake { .. }));
    }
}
