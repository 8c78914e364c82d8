/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 25/8/26
******************************************************************************/

//! Emoji record.

use crate::decode;
use crate::role::Role;
use irongate_core::error::DecodeError;
use irongate_core::types::Snowflake;
use serde_json::Value;

/// A guild emoji, or a bare unicode emoji used in reactions.
///
/// Unicode emoji carry no identifier; custom emoji always do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emoji {
    /// Custom emoji identifier, absent for unicode emoji.
    pub id: Option<Snowflake>,
    /// Emoji name (or the unicode character itself).
    pub name: String,
    /// Whether the emoji is animated.
    pub animated: Option<bool>,
    /// Whether an integration manages this emoji.
    pub managed: Option<bool>,
    /// Whether the emoji must be wrapped in colons.
    pub require_colons: Option<bool>,
    /// Roles allowed to use this emoji.
    pub roles: Vec<Role>,
}

impl Emoji {
    /// Creates a unicode emoji for use with reactions.
    #[must_use]
    pub fn unicode(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            animated: None,
            managed: None,
            require_colons: None,
            roles: Vec::new(),
        }
    }

    /// Creates a reference to an existing custom emoji.
    #[must_use]
    pub fn custom(name: impl Into<String>, id: Snowflake) -> Self {
        Self {
            id: Some(id),
            ..Self::unicode(name)
        }
    }

    /// Decodes an emoji from a property map.
    ///
    /// # Errors
    /// Returns [`DecodeError`] if `name` is absent or any present field has
    /// the wrong shape.
    pub fn decode(value: &Value) -> Result<Self, DecodeError> {
        Self::decode_at(value, "")
    }

    pub(crate) fn decode_at(value: &Value, path: &str) -> Result<Self, DecodeError> {
        let map = decode::object(value, path)?;

        Ok(Self {
            id: decode::opt_snowflake(map, "id", path)?,
            name: decode::req_str(map, "name", path)?.to_string(),
            animated: decode::opt_bool(map, "animated", path)?,
            managed: decode::opt_bool(map, "managed", path)?,
            require_colons: decode::opt_bool(map, "require_colons", path)?,
            roles: decode::list_of(map, "roles", path, Role::decode_at)?,
        })
    }

    /// Tag used to reference the emoji in endpoints: `name:id` for custom
    /// emoji, the bare name for unicode.
    #[must_use]
    pub fn tag(&self) -> String {
        match self.id {
            Some(id) => format!("{}:{id}", self.name),
            None => self.name.clone(),
        }
    }
}
