/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 25/8/26
******************************************************************************/

//! # Irongate Transport
//!
//! Transport seam for the irongate gateway engine.
//!
//! This crate provides:
//! - **Connector/Connection traits**: open/send/receive/close over a message
//!   channel of property-map frames
//! - **In-memory duplex**: a paired connector used by session tests to
//!   script remote behavior
//!
//! The byte-level parser producing property maps is an external
//! collaborator; transports here exchange already-parsed frames.

pub mod connector;
pub mod memory;

pub use connector::{Connection, Connector};
pub use memory::{MemoryConnector, RemoteEnd};
