//! JSON payloads exchanged with the messaging SDK.
//!
//! Request parameters are encoded by the gateway before every SDK call;
//! records are decoded from SDK responses and push notifications. Field
//! names follow the SDK's camelCase JSON.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{
    ApplicationDirection, ApplicationStatus, BlacklistEntry, FriendApplication, TypesError, Uid,
    UserRef,
};

/// Serialize a payload to a JSON string.
pub fn encode_json<T: Serialize>(value: &T) -> Result<String, TypesError> {
    serde_json::to_string(value).map_err(TypesError::Serialization)
}

/// Deserialize a payload from a JSON string.
pub fn decode_json<T: DeserializeOwned>(raw: &str) -> Result<T, TypesError> {
    serde_json::from_str(raw).map_err(TypesError::Deserialization)
}

/// Parameter carrying a single user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UidParam {
    /// Target user.
    pub uid: Uid,
}

/// Parameter for setting a friend's remark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemarkParam {
    /// Target friend.
    pub uid: Uid,
    /// New remark.
    pub comment: String,
}

/// Parameter for sending a friend application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestParam {
    /// Target user.
    pub uid: Uid,
    /// Message shown to the recipient.
    pub req_message: String,
}

/// A friend application as the SDK reports it.
///
/// The SDK describes applications from the local user's point of view:
/// `uid` is the other party, and `direction` is omitted for incoming
/// applications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRecord {
    /// The other party.
    pub uid: Uid,
    /// Other party's display name.
    #[serde(default)]
    pub name: String,
    /// Other party's avatar reference.
    #[serde(default)]
    pub icon: String,
    /// Message attached to the application.
    #[serde(default)]
    pub req_message: String,
    /// When the application was made (unix seconds).
    #[serde(default)]
    pub apply_time: u64,
    /// 0 = pending, 1 = accepted, -1 = rejected.
    #[serde(default)]
    pub flag: i32,
    /// Absent means incoming.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<ApplicationDirection>,
}

impl ApplicationRecord {
    /// Decode the `flag` field.
    pub fn status(&self) -> Result<ApplicationStatus, TypesError> {
        match self.flag {
            0 => Ok(ApplicationStatus::Pending),
            1 => Ok(ApplicationStatus::Accepted),
            -1 => Ok(ApplicationStatus::Rejected),
            other => Err(TypesError::InvalidData(format!(
                "unknown application flag {}",
                other
            ))),
        }
    }

    /// Build a [`FriendApplication`] relative to the local user.
    pub fn into_application(self, local: &Uid) -> Result<FriendApplication, TypesError> {
        let status = self.status()?;
        let peer = UserRef::new(self.uid)
            .with_name(&self.name)
            .with_icon(&self.icon);
        let app = match self.direction.unwrap_or(ApplicationDirection::Incoming) {
            ApplicationDirection::Incoming => {
                FriendApplication::incoming(peer, local, &self.req_message)
            }
            ApplicationDirection::Outgoing => {
                FriendApplication::outgoing(local, peer, &self.req_message)
            }
        };
        Ok(app.with_status(status))
    }
}

/// A blacklist entry as the SDK reports it: user info plus an optional
/// creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlacklistRecord {
    /// The blocked user.
    #[serde(flatten)]
    pub user: UserRef,
    /// When the block was created (unix seconds, 0 = unknown).
    #[serde(default)]
    pub create_time: u64,
}

impl BlacklistRecord {
    /// Build an entry, stamping `now` when the SDK gave no creation time.
    pub fn into_entry(self, now: u64) -> BlacklistEntry {
        let blocked_at = if self.create_time == 0 {
            now
        } else {
            self.create_time
        };
        BlacklistEntry::new(self.user, blocked_at)
    }
}

/// Kinds of unsolicited notification the SDK pushes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PushKind {
    /// A friend was added.
    FriendAdded,
    /// A friend was deleted.
    FriendDeleted,
    /// A friend's profile changed.
    FriendInfoChanged,
    /// A friend application arrived or was sent.
    ApplicationAdded,
    /// A friend application was withdrawn.
    ApplicationDeleted,
    /// A friend application was accepted.
    ApplicationAccepted,
    /// A friend application was rejected.
    ApplicationRejected,
    /// Incoming applications were marked read.
    ApplicationRead,
    /// A user was blacklisted.
    BlacklistAdded,
    /// A user was removed from the blacklist.
    BlacklistDeleted,
}

impl PushKind {
    /// All push kinds.
    pub const ALL: [PushKind; 10] = [
        PushKind::FriendAdded,
        PushKind::FriendDeleted,
        PushKind::FriendInfoChanged,
        PushKind::ApplicationAdded,
        PushKind::ApplicationDeleted,
        PushKind::ApplicationAccepted,
        PushKind::ApplicationRejected,
        PushKind::ApplicationRead,
        PushKind::BlacklistAdded,
        PushKind::BlacklistDeleted,
    ];

    /// Stable name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            PushKind::FriendAdded => "friend-added",
            PushKind::FriendDeleted => "friend-deleted",
            PushKind::FriendInfoChanged => "friend-info-changed",
            PushKind::ApplicationAdded => "application-added",
            PushKind::ApplicationDeleted => "application-deleted",
            PushKind::ApplicationAccepted => "application-accepted",
            PushKind::ApplicationRejected => "application-rejected",
            PushKind::ApplicationRead => "application-read",
            PushKind::BlacklistAdded => "blacklist-added",
            PushKind::BlacklistDeleted => "blacklist-deleted",
        }
    }
}

impl fmt::Display for PushKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid(s: &str) -> Uid {
        Uid::parse(s).unwrap()
    }

    #[test]
    fn friend_request_param_uses_sdk_field_names() {
        let param = FriendRequestParam {
            uid: uid("u1"),
            req_message: "hello".into(),
        };
        assert_eq!(
            encode_json(&param).unwrap(),
            r#"{"uid":"u1","reqMessage":"hello"}"#
        );
    }

    #[test]
    fn remark_param_encoding() {
        let param = RemarkParam {
            uid: uid("u1"),
            comment: "college".into(),
        };
        assert_eq!(
            encode_json(&param).unwrap(),
            r#"{"uid":"u1","comment":"college"}"#
        );
    }

    #[test]
    fn application_record_defaults_to_incoming_pending() {
        let record: ApplicationRecord =
            decode_json(r#"{"uid":"u1","name":"Ann","reqMessage":"hi"}"#).unwrap();
        let app = record.into_application(&uid("me")).unwrap();
        assert_eq!(app.from_uid, uid("u1"));
        assert_eq!(app.to_uid, uid("me"));
        assert_eq!(app.status, ApplicationStatus::Pending);
        assert_eq!(app.request_message, "hi");
        assert_eq!(app.peer.name, "Ann");
    }

    #[test]
    fn application_record_outgoing_and_flags() {
        let record: ApplicationRecord =
            decode_json(r#"{"uid":"u2","flag":-1,"direction":"outgoing"}"#).unwrap();
        let app = record.into_application(&uid("me")).unwrap();
        assert_eq!(app.from_uid, uid("me"));
        assert_eq!(app.to_uid, uid("u2"));
        assert_eq!(app.status, ApplicationStatus::Rejected);
    }

    #[test]
    fn application_record_unknown_flag_is_invalid() {
        let record: ApplicationRecord = decode_json(r#"{"uid":"u1","flag":7}"#).unwrap();
        assert!(matches!(
            record.into_application(&uid("me")),
            Err(TypesError::InvalidData(_))
        ));
    }

    #[test]
    fn blacklist_record_keeps_sdk_time_or_stamps_now() {
        let with_time: BlacklistRecord =
            decode_json(r#"{"uid":"u1","name":"Ann","createTime":1700000000}"#).unwrap();
        assert_eq!(with_time.user.name, "Ann");
        assert_eq!(with_time.into_entry(42).blocked_at, 1700000000);

        let without: BlacklistRecord = decode_json(r#"{"uid":"u1"}"#).unwrap();
        assert_eq!(without.into_entry(42).blocked_at, 42);
    }

    #[test]
    fn decode_garbage_is_deserialization_error() {
        let result = decode_json::<UidParam>("not json");
        assert!(matches!(result, Err(TypesError::Deserialization(_))));
    }

    #[test]
    fn push_kind_names_are_unique() {
        let mut names: Vec<_> = PushKind::ALL.iter().map(|k| k.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), PushKind::ALL.len());
    }
}
