/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 25/8/26
******************************************************************************/

//! Core types for gateway operations.
//!
//! This module provides fundamental types used throughout the irongate engine:
//! - [`Snowflake`]: Opaque entity identifier parsed from its decimal wire form
//! - [`ShardInfo`]: Shard coordinates carried in identify payloads
//! - [`Opcode`]: The gateway opcode table
//! - [`Envelope`]: The parsed wire envelope `{op, d, s, t}`

use crate::error::{DecodeError, ProtocolError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Opaque entity identifier.
///
/// Snowflakes are encoded as decimal strings on the wire and parsed into an
/// internal 64-bit value. A malformed wire value is a hard decode error,
/// never a default. All entity types use this single identifier
/// representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct Snowflake(u64);

impl Snowflake {
    /// Creates a snowflake from a raw 64-bit value.
    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw 64-bit value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Parses a snowflake from a JSON wire value.
    ///
    /// Accepts both the canonical decimal-string form and a bare unsigned
    /// integer, normalizing to the opaque representation.
    ///
    /// # Arguments
    /// * `value` - The wire value
    /// * `field` - Field name used in error reporting
    ///
    /// # Errors
    /// Returns [`DecodeError::InvalidSnowflake`] if the value is neither a
    /// parseable decimal string nor an unsigned integer.
    pub fn from_wire(value: &Value, field: &str) -> Result<Self, DecodeError> {
        match value {
            Value::String(s) => s.parse(),
            Value::Number(n) => n.as_u64().map(Self).ok_or(()),
            _ => Err(()),
        }
        .map_err(|_| DecodeError::InvalidSnowflake {
            field: field.to_string(),
            value: value.to_string(),
        })
    }
}

impl FromStr for Snowflake {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>().map(Self).map_err(|_| ())
    }
}

impl From<u64> for Snowflake {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Shard coordinates for a partitioned gateway connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShardInfo {
    /// Zero-based index of this shard.
    pub index: u32,
    /// Total number of shards.
    pub count: u32,
}

impl ShardInfo {
    /// Creates shard coordinates.
    ///
    /// # Arguments
    /// * `index` - Zero-based shard index, must be less than `count`
    /// * `count` - Total shard count, must be at least 1
    ///
    /// # Panics
    /// In debug builds, panics if `count` is zero or `index` is out of
    /// range.
    #[must_use]
    pub const fn new(index: u32, count: u32) -> Self {
        debug_assert!(count >= 1, "shard count must be at least 1");
        debug_assert!(index < count, "shard index out of range for shard count");
        Self { index, count }
    }

    /// Single-shard coordinates (shard 0 of 1).
    #[must_use]
    pub const fn single() -> Self {
        Self { index: 0, count: 1 }
    }
}

impl Default for ShardInfo {
    fn default() -> Self {
        Self::single()
    }
}

impl fmt::Display for ShardInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.index, self.count)
    }
}

/// Gateway opcodes.
///
/// The numbering matches the upstream wire protocol. Unrecognized opcodes
/// map to [`Opcode::Unknown`] rather than failing the envelope parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// Server-pushed dispatch event carrying a typed payload and event name.
    Dispatch,
    /// Liveness probe, carrying the last seen sequence number.
    Heartbeat,
    /// Client handshake with credentials and shard coordinates.
    Identify,
    /// Client handshake continuing a dropped session.
    Resume,
    /// Server request to reconnect.
    Reconnect,
    /// Server notice that the session is invalid.
    InvalidSession,
    /// Server greeting carrying the heartbeat interval.
    Hello,
    /// Server acknowledgement of a heartbeat.
    HeartbeatAck,
    /// Opcode not known to this implementation.
    Unknown(u8),
}

impl Opcode {
    /// Maps a raw opcode byte to its variant. Total: unknown values are
    /// preserved in [`Opcode::Unknown`].
    #[must_use]
    pub const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Dispatch,
            1 => Self::Heartbeat,
            2 => Self::Identify,
            6 => Self::Resume,
            7 => Self::Reconnect,
            9 => Self::InvalidSession,
            10 => Self::Hello,
            11 => Self::HeartbeatAck,
            other => Self::Unknown(other),
        }
    }

    /// Returns the wire value of this opcode.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Dispatch => 0,
            Self::Heartbeat => 1,
            Self::Identify => 2,
            Self::Resume => 6,
            Self::Reconnect => 7,
            Self::InvalidSession => 9,
            Self::Hello => 10,
            Self::HeartbeatAck => 11,
            Self::Unknown(other) => other,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dispatch => write!(f, "dispatch"),
            Self::Heartbeat => write!(f, "heartbeat"),
            Self::Identify => write!(f, "identify"),
            Self::Resume => write!(f, "resume"),
            Self::Reconnect => write!(f, "reconnect"),
            Self::InvalidSession => write!(f, "invalid-session"),
            Self::Hello => write!(f, "hello"),
            Self::HeartbeatAck => write!(f, "heartbeat-ack"),
            Self::Unknown(op) => write!(f, "unknown({op})"),
        }
    }
}

/// Parsed gateway wire envelope.
///
/// Every inbound frame is a property map `{op, d, s, t}`. The `s` and `t`
/// members are only populated for dispatch frames.
#[derive(Debug, Clone)]
pub struct Envelope {
    /// Frame opcode.
    pub op: Opcode,
    /// Sequence number, present on dispatch frames.
    pub seq: Option<u64>,
    /// Event name, present on dispatch frames.
    pub event: Option<String>,
    /// Frame payload.
    pub payload: Value,
}

impl Envelope {
    /// Parses an envelope from a property map.
    ///
    /// # Errors
    /// Returns [`ProtocolError::MalformedEnvelope`] if the value is not an
    /// object or the `op` member is missing or not an unsigned integer.
    pub fn from_value(value: Value) -> Result<Self, ProtocolError> {
        let map = value
            .as_object()
            .ok_or_else(|| ProtocolError::MalformedEnvelope("frame is not an object".into()))?;

        let op = map
            .get("op")
            .and_then(Value::as_u64)
            .ok_or_else(|| ProtocolError::MalformedEnvelope("missing or non-integer op".into()))?;
        let op = u8::try_from(op)
            .map_err(|_| ProtocolError::MalformedEnvelope(format!("opcode out of range: {op}")))?;

        let seq = map.get("s").and_then(Value::as_u64);
        let event = map
            .get("t")
            .and_then(Value::as_str)
            .map(ToString::to_string);
        let payload = map.get("d").cloned().unwrap_or(Value::Null);

        Ok(Self {
            op: Opcode::from_u8(op),
            seq,
            event,
            payload,
        })
    }
}
