/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 25/8/26
******************************************************************************/

//! Error types for the irongate gateway engine.
//!
//! This module provides a unified error hierarchy using `thiserror` for typed,
//! domain-specific errors across all irongate operations.
//!
//! Propagation policy:
//! - [`TransportError`] and [`ProtocolError`] are absorbed and retried
//!   internally by the session state machine (backoff with jitter).
//! - [`DecodeError`] is isolated to the offending entity update; the session
//!   continues.
//! - [`AuthenticationError`] and [`SetupError`] always propagate to the
//!   caller and are never auto-retried.

use thiserror::Error;

/// Result type alias using [`GatewayError`] as the error type.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Top-level error type for all irongate operations.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Network-level failure, retryable with backoff.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Malformed or unexpected frame, triggers a reconnect of that
    /// connection instance.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Rejected credentials, fatal for the session.
    #[error("authentication error: {0}")]
    Authentication(#[from] AuthenticationError),

    /// Missing or invalid field in one entity payload.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Locally constructed metadata violates a length or count bound.
    #[error("setup error: {0}")]
    Setup(#[from] SetupError),

    /// I/O error from an underlying transport implementation.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Network-level errors. Retryable with backoff and jitter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Failed to open the transport to the remote endpoint.
    #[error("connect to {endpoint} failed: {reason}")]
    ConnectFailed {
        /// Target endpoint.
        endpoint: String,
        /// Description of the failure.
        reason: String,
    },

    /// Attempted to send on a closed channel.
    #[error("send on closed transport")]
    SendClosed,

    /// The inbound stream ended unexpectedly.
    #[error("transport stream closed by remote")]
    StreamClosed,

    /// No heartbeat acknowledgement after consecutive probes.
    #[error("heartbeat timeout: {missed} consecutive probes unacknowledged")]
    HeartbeatTimeout {
        /// Number of consecutive unacknowledged heartbeats.
        missed: u32,
    },
}

/// Malformed or unexpected frames. Non-retryable for the current connection
/// attempt; the state machine tears the connection down and retries the
/// whole connect workflow.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Frame did not parse as a `{op, d, s, t}` envelope.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// Received an opcode that is invalid for the current handshake phase.
    #[error("unexpected opcode {opcode} during {phase}")]
    UnexpectedOpcode {
        /// The offending opcode value.
        opcode: u8,
        /// Handshake phase the session was in.
        phase: String,
    },

    /// Hello frame did not carry a heartbeat interval.
    #[error("hello frame missing heartbeat_interval")]
    MissingHeartbeatInterval,
}

/// Rejected credentials. Fatal: surfaced to the caller, never auto-retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthenticationError {
    /// The remote rejected the identify credentials.
    #[error("credentials rejected by remote: {0}")]
    Rejected(String),
}

/// Errors decoding one entity payload.
///
/// A decode failure drops that single update; it never aborts the session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// A required field is absent (or null) in the payload. Carries the full
    /// nested path of the field, e.g. `channels[2].id`.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// A field is present but its value has the wrong shape.
    #[error("invalid value for field {field}: {reason}")]
    InvalidField {
        /// Full nested path of the field.
        field: String,
        /// Description of why the value is invalid.
        reason: String,
    },

    /// An identifier field is not a parseable decimal snowflake.
    #[error("invalid snowflake in field {field}: {value}")]
    InvalidSnowflake {
        /// Full nested path of the field.
        field: String,
        /// The offending wire value.
        value: String,
    },
}

/// Errors constructing local command metadata.
///
/// Raised synchronously at construction or mutation time, never transmitted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SetupError {
    /// A string value exceeds its length bound.
    #[error("{what} is too long: {length} characters, max is {max}")]
    ValueTooLong {
        /// What was being constructed.
        what: String,
        /// Actual length in characters.
        length: usize,
        /// Maximum allowed length.
        max: usize,
    },

    /// A collection exceeds its element bound.
    #[error("{what} would hold {count} elements, max is {max}")]
    TooManyElements {
        /// What was being constructed.
        what: String,
        /// Resulting element count.
        count: usize,
        /// Maximum allowed count.
        max: usize,
    },
}
