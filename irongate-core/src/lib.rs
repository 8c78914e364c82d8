/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 25/8/26
******************************************************************************/

//! # Irongate Core
//!
//! Core types and error definitions for the irongate gateway engine.
//!
//! This crate provides:
//! - **Identifiers**: Opaque snowflake IDs parsed from their wire form
//! - **Envelope**: The gateway wire envelope and opcode table
//! - **Errors**: Unified error hierarchy for all irongate operations

pub mod error;
pub mod types;

pub use error::{
    AuthenticationError, DecodeError, GatewayError, ProtocolError, Result, SetupError,
    TransportError,
};
pub use types::{Envelope, Opcode, ShardInfo, Snowflake};
