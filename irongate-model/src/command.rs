/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 25/8/26
******************************************************************************/

//! Application-command metadata.
//!
//! Two paths produce these records:
//! - **Local construction** for registration: length and count limits are
//!   enforced synchronously at construction and mutation time.
//! - **Decoding server-returned metadata**: the remote is the authority, so
//!   the limits are not re-validated on decode.

use crate::decode;
use irongate_core::error::{DecodeError, SetupError};
use irongate_core::types::Snowflake;
use serde_json::Value;

/// Maximum length of an option name.
pub const MAX_OPTION_NAME_LEN: usize = 32;
/// Maximum length of an option description, choice name, or choice value.
pub const MAX_DESCRIPTION_LEN: usize = 100;
/// Maximum number of choices per option.
pub const MAX_CHOICES: usize = 25;

/// Kind of an invokable command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// Slash command invoked from the chat input.
    Slash,
    /// Command invoked from a user context menu.
    User,
    /// Command invoked from a message context menu.
    Message,
}

impl CommandKind {
    pub(crate) fn from_wire(raw: u64, field: &str) -> Result<Self, DecodeError> {
        match raw {
            1 => Ok(Self::Slash),
            2 => Ok(Self::User),
            3 => Ok(Self::Message),
            other => Err(DecodeError::InvalidField {
                field: field.to_string(),
                reason: format!("unknown command kind {other}"),
            }),
        }
    }
}

/// Kind of a command option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOptionKind {
    /// Nested sub-command.
    SubCommand,
    /// Group of sub-commands.
    SubCommandGroup,
    /// Free-form string argument.
    String,
    /// Integer argument.
    Integer,
    /// Boolean argument.
    Boolean,
    /// User reference argument.
    User,
    /// Channel reference argument.
    Channel,
    /// Role reference argument.
    Role,
    /// User-or-role reference argument.
    Mentionable,
    /// Floating-point argument.
    Number,
    /// File attachment argument.
    Attachment,
}

impl CommandOptionKind {
    pub(crate) fn from_wire(raw: u64, field: &str) -> Result<Self, DecodeError> {
        Ok(match raw {
            1 => Self::SubCommand,
            2 => Self::SubCommandGroup,
            3 => Self::String,
            4 => Self::Integer,
            5 => Self::Boolean,
            6 => Self::User,
            7 => Self::Channel,
            8 => Self::Role,
            9 => Self::Mentionable,
            10 => Self::Number,
            11 => Self::Attachment,
            other => {
                return Err(DecodeError::InvalidField {
                    field: field.to_string(),
                    reason: format!("unknown option kind {other}"),
                });
            }
        })
    }
}

/// One selectable choice for a command option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandChoice {
    /// Display name, at most 100 characters.
    pub name: String,
    /// Value sent back on selection, at most 100 characters.
    pub value: String,
}

impl CommandChoice {
    /// Creates a choice, validating both bounds.
    ///
    /// # Errors
    /// Returns [`SetupError::ValueTooLong`] if the name or value exceeds
    /// 100 characters.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Result<Self, SetupError> {
        let name = name.into();
        let value = value.into();
        check_len(&name, MAX_DESCRIPTION_LEN, || {
            format!("choice name '{name}'")
        })?;
        check_len(&value, MAX_DESCRIPTION_LEN, || {
            format!("choice value for '{name}'")
        })?;
        Ok(Self { name, value })
    }

    fn decode_at(value: &Value, path: &str) -> Result<Self, DecodeError> {
        let map = decode::object(value, path)?;
        let choice_value = match decode::req(map, "value", path)? {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        Ok(Self {
            name: decode::req_str(map, "name", path)?.to_string(),
            value: choice_value,
        })
    }
}

/// An option of an invokable command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOption {
    /// Argument kind.
    pub kind: CommandOptionKind,
    /// Option name, at most 32 characters.
    pub name: String,
    /// Option description, at most 100 characters.
    pub description: String,
    /// Whether the option must be supplied.
    pub required: bool,
    /// Selectable choices, at most 25.
    pub choices: Vec<CommandChoice>,
    /// Whether the option supports autocomplete.
    pub autocomplete: bool,
}

impl CommandOption {
    /// Creates an option, validating the name and description bounds.
    ///
    /// # Errors
    /// Returns [`SetupError::ValueTooLong`] if the name exceeds 32 characters
    /// or the description exceeds 100.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        kind: CommandOptionKind,
    ) -> Result<Self, SetupError> {
        let name = name.into();
        let description = description.into();
        check_len(&name, MAX_OPTION_NAME_LEN, || {
            format!("option name '{name}'")
        })?;
        check_len(&description, MAX_DESCRIPTION_LEN, || {
            format!("description of option '{name}'")
        })?;
        Ok(Self {
            kind,
            name,
            description,
            required: true,
            choices: Vec::new(),
            autocomplete: false,
        })
    }

    /// Adds one choice.
    ///
    /// # Errors
    /// Returns [`SetupError::TooManyElements`] if the option already holds
    /// 25 choices, or [`SetupError::ValueTooLong`] from the choice bounds.
    pub fn add_choice(
        self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Self, SetupError> {
        let choice = CommandChoice::new(name, value)?;
        self.add_choices(vec![choice])
    }

    /// Adds a batch of choices.
    ///
    /// # Errors
    /// Returns [`SetupError::TooManyElements`] if the total would exceed 25.
    pub fn add_choices(mut self, choices: Vec<CommandChoice>) -> Result<Self, SetupError> {
        let total = self.choices.len() + choices.len();
        if total > MAX_CHOICES {
            return Err(SetupError::TooManyElements {
                what: format!("choices for option '{}'", self.name),
                count: total,
                max: MAX_CHOICES,
            });
        }
        self.choices.extend(choices);
        Ok(self)
    }

    /// Sets whether the option is required.
    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Sets whether the option supports autocomplete.
    #[must_use]
    pub fn autocomplete(mut self, autocomplete: bool) -> Self {
        self.autocomplete = autocomplete;
        self
    }

    fn decode_at(value: &Value, path: &str) -> Result<Self, DecodeError> {
        let map = decode::object(value, path)?;

        // Server-returned metadata is trusted; the 32/100/25 limits are
        // not re-validated here.
        Ok(Self {
            kind: CommandOptionKind::from_wire(
                decode::req_u64(map, "type", path)?,
                &decode::join(path, "type"),
            )?,
            name: decode::req_str(map, "name", path)?.to_string(),
            description: decode::req_str(map, "description", path)?.to_string(),
            required: decode::opt_bool(map, "required", path)?.unwrap_or(false),
            choices: decode::list_of(map, "choices", path, CommandChoice::decode_at)?,
            autocomplete: decode::opt_bool(map, "autocomplete", path)?.unwrap_or(false),
        })
    }
}

/// An existing command as returned by the remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationCommand {
    /// Command identifier.
    pub id: Snowflake,
    /// Owning application identifier.
    pub application_id: Snowflake,
    /// Guild scope, absent for global commands.
    pub guild_id: Option<Snowflake>,
    /// Command kind; the remote omits it for chat-input commands.
    pub kind: CommandKind,
    /// Command name.
    pub name: String,
    /// Command description.
    pub description: String,
    /// Command options, empty when omitted.
    pub options: Vec<CommandOption>,
    /// Whether the command is enabled by default.
    pub default_permission: Option<bool>,
    /// Autoincrementing version identifier.
    pub version: Snowflake,
}

impl ApplicationCommand {
    /// Decodes server-returned command metadata.
    ///
    /// # Errors
    /// Returns [`DecodeError`] on any absent required field or malformed
    /// value. Length/count limits are not re-validated (trusted source).
    pub fn decode(value: &Value) -> Result<Self, DecodeError> {
        let path = "";
        let map = decode::object(value, path)?;

        let kind = match decode::opt_u64(map, "type", path)? {
            Some(raw) => CommandKind::from_wire(raw, "type")?,
            None => CommandKind::Slash,
        };

        Ok(Self {
            id: decode::req_snowflake(map, "id", path)?,
            application_id: decode::req_snowflake(map, "application_id", path)?,
            guild_id: decode::opt_snowflake(map, "guild_id", path)?,
            kind,
            name: decode::req_str(map, "name", path)?.to_string(),
            description: decode::req_str(map, "description", path)?.to_string(),
            options: decode::list_of(map, "options", path, CommandOption::decode_at)?,
            default_permission: decode::opt_bool(map, "default_permission", path)?,
            version: decode::req_snowflake(map, "version", path)?,
        })
    }
}

fn check_len(value: &str, max: usize, what: impl Fn() -> String) -> Result<(), SetupError> {
    let length = value.chars().count();
    if length > max {
        return Err(SetupError::ValueTooLong {
            what: what(),
            length,
            max,
        });
    }
    Ok(())
}
