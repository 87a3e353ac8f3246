//! # roster-types
//!
//! Value types and wire payloads for the roster-sync friendship client.
//!
//! This crate provides the foundational types used across all roster-sync crates:
//! - [`Uid`], [`GroupId`] - Identity types
//! - [`UserRef`], [`FriendApplication`], [`BlacklistEntry`], [`GroupMember`] - Roster values
//! - [`payloads`] - JSON shapes exchanged with the messaging SDK
//! - [`TypesError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod ids;
mod models;
pub mod payloads;

pub use error::TypesError;
pub use ids::{GroupId, Uid};
pub use models::{
    ApplicationDirection, ApplicationStatus, BlacklistEntry, FriendApplication, GroupMember,
    GroupRole, UserRef,
};
pub use payloads::{decode_json, encode_json, PushKind};
