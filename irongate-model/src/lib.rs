/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 25/8/26
******************************************************************************/

//! # Irongate Model
//!
//! Domain records and entity decoding for the irongate gateway engine.
//!
//! This crate provides:
//! - **Entity decoder**: Per-field conversion of generic property maps into
//!   validated domain records, with full nested-path error reporting
//! - **Domain records**: Guild, Channel, Member, Role, Emoji, User and
//!   application-command metadata
//! - **Dispatch events**: Closed tagged-variant type over the wire event names
//! - **Entity cache**: Shared, concurrency-safe store mutated only through
//!   the dispatch path

pub mod cache;
pub mod channel;
pub mod command;
pub(crate) mod decode;
pub mod emoji;
pub mod event;
pub mod guild;
pub mod member;
pub mod role;
pub mod user;

pub use cache::EntityCache;
pub use channel::Channel;
pub use command::{ApplicationCommand, CommandChoice, CommandKind, CommandOption, CommandOptionKind};
pub use emoji::Emoji;
pub use event::DispatchEvent;
pub use guild::{Guild, UnavailableGuild};
pub use member::Member;
pub use role::Role;
pub use user::User;
