//! Inputs to and outputs from the roster store.
//!
//! A [`Delta`] is one decoded change coming from the remote authority; a
//! [`RosterEvent`] is what observers are told after the store applied it.
//! One delta may produce zero, one or two events (blacklisting a friend
//! produces a removal followed by a block).

use roster_types::{BlacklistEntry, FriendApplication, Uid, UserRef};

use crate::RosterSnapshot;

/// A change to apply to the roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delta {
    /// A user became a friend.
    FriendAdded(UserRef),
    /// A friend was removed.
    FriendRemoved(Uid),
    /// A friend's (or blocked user's) profile changed.
    FriendProfileChanged(UserRef),
    /// An application was made, or re-reported with a new status.
    ApplicationAdded(FriendApplication),
    /// A pending application was deleted.
    ApplicationDeleted(Uid),
    /// The pending application with this user was accepted.
    ApplicationAccepted(Uid),
    /// The pending application with this user was rejected.
    ApplicationRejected(Uid),
    /// Incoming applications were marked read.
    ApplicationsRead,
    /// A user was blacklisted.
    BlacklistAdded(BlacklistEntry),
    /// A user was removed from the blacklist.
    BlacklistRemoved(Uid),
    /// Replace everything with a freshly fetched snapshot.
    Reset(RosterSnapshot),
}

impl Delta {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Delta::FriendAdded(_) => "friend-added",
            Delta::FriendRemoved(_) => "friend-removed",
            Delta::FriendProfileChanged(_) => "friend-profile-changed",
            Delta::ApplicationAdded(_) => "application-added",
            Delta::ApplicationDeleted(_) => "application-deleted",
            Delta::ApplicationAccepted(_) => "application-accepted",
            Delta::ApplicationRejected(_) => "application-rejected",
            Delta::ApplicationsRead => "applications-read",
            Delta::BlacklistAdded(_) => "blacklist-added",
            Delta::BlacklistRemoved(_) => "blacklist-removed",
            Delta::Reset(_) => "reset",
        }
    }
}

/// Events emitted to observers after a successful apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterEvent {
    /// A user became a friend.
    FriendAdded(UserRef),
    /// A friend was removed.
    FriendRemoved(Uid),
    /// A friend's or blocked user's profile changed.
    FriendProfileChanged(UserRef),
    /// A friend application was added (pending or with a terminal status).
    ApplicationAdded(FriendApplication),
    /// A pending application was deleted.
    ApplicationDeleted(Uid),
    /// An application was accepted.
    ApplicationAccepted(FriendApplication),
    /// An application was rejected.
    ApplicationRejected(FriendApplication),
    /// Incoming applications were marked read.
    ApplicationsRead,
    /// A user was blacklisted.
    BlacklistAdded(BlacklistEntry),
    /// A user was removed from the blacklist.
    BlacklistRemoved(Uid),
    /// The whole roster was replaced by a resync.
    Reset,
}
