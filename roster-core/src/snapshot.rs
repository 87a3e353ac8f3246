//! Point-in-time roster snapshot.
//!
//! Every collection is an ordered map keyed by uid, which gives
//! deterministic iteration and structural equality: two stores that saw the
//! same deltas compare equal.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use roster_types::{ApplicationDirection, BlacklistEntry, FriendApplication, Uid, UserRef};

/// The aggregate roster of the signed-in user.
///
/// Invariants (checked by [`check_invariants`](Self::check_invariants)):
/// - no uid is both in `friends` and `blacklist`
/// - a uid appears at most once among incoming applications
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterSnapshot {
    pub(crate) friends: BTreeMap<Uid, UserRef>,
    /// Keyed by sender.
    pub(crate) incoming: BTreeMap<Uid, FriendApplication>,
    /// Keyed by recipient.
    pub(crate) outgoing: BTreeMap<Uid, FriendApplication>,
    pub(crate) blacklist: BTreeMap<Uid, BlacklistEntry>,
    /// Senders of incoming applications not yet marked read.
    pub(crate) unread: BTreeSet<Uid>,
}

impl RosterSnapshot {
    /// An empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from full lists, as returned by a resync.
    ///
    /// Only pending applications are kept; duplicates keep the last entry.
    /// No read state is set here (see `RosterStore::reset`).
    pub fn from_parts(
        friends: Vec<UserRef>,
        applications: Vec<FriendApplication>,
        blacklist: Vec<BlacklistEntry>,
    ) -> Self {
        let mut snapshot = Self::new();
        for user in friends {
            snapshot.friends.insert(user.uid.clone(), user);
        }
        for app in applications.into_iter().filter(|a| a.is_pending()) {
            match app.direction {
                ApplicationDirection::Incoming => {
                    snapshot.incoming.insert(app.from_uid.clone(), app);
                }
                ApplicationDirection::Outgoing => {
                    snapshot.outgoing.insert(app.to_uid.clone(), app);
                }
            }
        }
        for entry in blacklist {
            snapshot.blacklist.insert(entry.uid().clone(), entry);
        }
        snapshot
    }

    /// Friends, ordered by uid.
    pub fn friends(&self) -> impl Iterator<Item = &UserRef> {
        self.friends.values()
    }

    /// Friend uids, ordered.
    pub fn friend_uids(&self) -> Vec<Uid> {
        self.friends.keys().cloned().collect()
    }

    /// Look up a friend.
    pub fn friend(&self, uid: &Uid) -> Option<&UserRef> {
        self.friends.get(uid)
    }

    /// Whether `uid` is a friend.
    pub fn is_friend(&self, uid: &Uid) -> bool {
        self.friends.contains_key(uid)
    }

    /// Pending applications sent to the local user, ordered by sender.
    pub fn incoming_applications(&self) -> impl Iterator<Item = &FriendApplication> {
        self.incoming.values()
    }

    /// Pending applications sent by the local user, ordered by recipient.
    pub fn outgoing_applications(&self) -> impl Iterator<Item = &FriendApplication> {
        self.outgoing.values()
    }

    /// The pending incoming application from `uid`, if any.
    pub fn incoming_from(&self, uid: &Uid) -> Option<&FriendApplication> {
        self.incoming.get(uid)
    }

    /// The pending outgoing application to `uid`, if any.
    pub fn outgoing_to(&self, uid: &Uid) -> Option<&FriendApplication> {
        self.outgoing.get(uid)
    }

    /// Blacklist entries, ordered by uid.
    pub fn blacklist(&self) -> impl Iterator<Item = &BlacklistEntry> {
        self.blacklist.values()
    }

    /// Whether `uid` is blacklisted.
    pub fn is_blacklisted(&self, uid: &Uid) -> bool {
        self.blacklist.contains_key(uid)
    }

    /// Number of incoming applications not yet marked read.
    pub fn unread_application_count(&self) -> usize {
        self.unread.len()
    }

    /// Check the cross-collection invariants.
    ///
    /// Returns the first uid found in both `friends` and `blacklist`.
    pub fn check_invariants(&self) -> Result<(), Uid> {
        match self.friends.keys().find(|uid| self.blacklist.contains_key(*uid)) {
            Some(uid) => Err(uid.clone()),
            None => Ok(()),
        }
    }
}
