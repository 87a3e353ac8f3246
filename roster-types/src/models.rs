//! Roster value types.
//!
//! These are plain values: they are copied into and out of a roster
//! snapshot and never shared mutably.

use serde::{Deserialize, Serialize};

use crate::{GroupId, Uid};

/// A user as seen from the local roster.
///
/// Identity is the `uid`; the other fields are denormalized profile data
/// and only change through explicit profile updates. Field names match the
/// messaging SDK's user-info JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    /// User identifier.
    pub uid: Uid,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Avatar reference (usually a URL).
    #[serde(default)]
    pub icon: String,
    /// Local remark set by the signed-in user.
    #[serde(default)]
    pub comment: String,
}

impl UserRef {
    /// Create a reference with an empty profile.
    pub fn new(uid: Uid) -> Self {
        Self {
            uid,
            name: String::new(),
            icon: String::new(),
            comment: String::new(),
        }
    }

    /// Set the display name.
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Set the avatar reference.
    pub fn with_icon(mut self, icon: &str) -> Self {
        self.icon = icon.to_string();
        self
    }

    /// Set the remark.
    pub fn with_comment(mut self, comment: &str) -> Self {
        self.comment = comment.to_string();
        self
    }
}

/// Which side of a friend application the local user is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationDirection {
    /// Someone asked the local user.
    Incoming,
    /// The local user asked someone.
    Outgoing,
}

/// Lifecycle status of a friend application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    /// Awaiting a decision.
    Pending,
    /// Accepted; the two users are now friends.
    Accepted,
    /// Rejected by the recipient.
    Rejected,
}

impl ApplicationStatus {
    /// Accepted and rejected are terminal for a pair until a new application.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// A friend application between two users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendApplication {
    /// Who sent the application.
    pub from_uid: Uid,
    /// Who received it.
    pub to_uid: Uid,
    /// Free-text message attached by the sender.
    pub request_message: String,
    /// Direction relative to the local user.
    pub direction: ApplicationDirection,
    /// Current status.
    pub status: ApplicationStatus,
    /// Profile of the other party, used to create the friend entry on accept.
    pub peer: UserRef,
}

impl FriendApplication {
    /// A pending application from `peer` to the local user.
    pub fn incoming(peer: UserRef, local: &Uid, message: &str) -> Self {
        Self {
            from_uid: peer.uid.clone(),
            to_uid: local.clone(),
            request_message: message.to_string(),
            direction: ApplicationDirection::Incoming,
            status: ApplicationStatus::Pending,
            peer,
        }
    }

    /// A pending application from the local user to `peer`.
    pub fn outgoing(local: &Uid, peer: UserRef, message: &str) -> Self {
        Self {
            from_uid: local.clone(),
            to_uid: peer.uid.clone(),
            request_message: message.to_string(),
            direction: ApplicationDirection::Outgoing,
            status: ApplicationStatus::Pending,
            peer,
        }
    }

    /// Replace the status.
    pub fn with_status(mut self, status: ApplicationStatus) -> Self {
        self.status = status;
        self
    }

    /// The `(from, to)` key identifying this application's pair.
    pub fn pair(&self) -> (Uid, Uid) {
        (self.from_uid.clone(), self.to_uid.clone())
    }

    /// The uid of the other party.
    pub fn peer_uid(&self) -> &Uid {
        &self.peer.uid
    }

    /// Whether the application still awaits a decision.
    pub fn is_pending(&self) -> bool {
        self.status == ApplicationStatus::Pending
    }
}

/// A blocked user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlacklistEntry {
    /// The blocked user.
    pub user: UserRef,
    /// When the block was created (unix seconds).
    pub blocked_at: u64,
}

impl BlacklistEntry {
    /// Create an entry.
    pub fn new(user: UserRef, blocked_at: u64) -> Self {
        Self { user, blocked_at }
    }

    /// The blocked user's id.
    pub fn uid(&self) -> &Uid {
        &self.user.uid
    }
}

/// Role of a member inside a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupRole {
    /// Group creator / owner. Sorts first.
    Owner,
    /// Administrator.
    Admin,
    /// Ordinary member.
    Member,
}

/// A member of a group roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMember {
    /// Member's user id.
    pub uid: Uid,
    /// Group the membership belongs to.
    pub group_id: GroupId,
    /// Member role.
    pub role: GroupRole,
    /// Nickname inside the group (may be empty).
    #[serde(default)]
    pub nickname: String,
    /// When the member joined (unix seconds).
    #[serde(default)]
    pub join_time: u64,
}
