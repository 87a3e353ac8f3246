//! # roster-core
//!
//! Pure roster logic for roster-sync (no I/O, instant tests).
//!
//! This crate holds the local view of "my friends, pending applications,
//! blacklist" and the rules for changing it, without any SDK, network or
//! thread concerns.
//!
//! ## Design Philosophy
//!
//! Every mutation is a function from (state, delta) to (state, events):
//! - An apply either succeeds completely or leaves the state untouched
//! - The returned events are what observers should be told, in order
//! - Replaying the same deltas onto the same starting snapshot always
//!   yields the same snapshot
//!
//! Serializing concurrent applies and delivering events is the job of
//! `roster-client`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod application;
pub mod event;
pub mod group;
pub mod snapshot;
pub mod store;

pub use application::{ApplicationEvent, ApplicationLedger, ApplicationState};
pub use event::{Delta, RosterEvent};
pub use group::{GroupRoster, GroupRosterError};
pub use snapshot::RosterSnapshot;
pub use store::{ApplyError, ResyncToken, RosterStore};
