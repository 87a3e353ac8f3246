//! Boundary to the external messaging SDK.
//!
//! The SDK is an external collaborator: it answers JSON requests and pushes
//! JSON notifications on its own threads. This module abstracts it behind
//! the [`SdkBoundary`] trait so the rest of the client never sees how calls
//! are completed.
//!
//! # Design
//!
//! - `call()` sends one request and resolves exactly once
//! - `set_push_handler()` registers the receiver of unsolicited pushes
//! - [`CallbackBoundary`] adapts a completion-callback SDK, adding a timeout
//! - [`MockBoundary`] queues responses and simulates pushes for tests
//!
//! # Example
//!
//! ```ignore
//! let boundary = MockBoundary::new();
//! boundary.queue_response(SdkMethod::GetFriendList, r#"[{"uid":"u1"}]"#);
//! let raw = boundary.call(SdkMethod::GetFriendList, None).await?;
//! ```

mod callback;
mod mock;

pub use callback::{CallbackBoundary, CallbackSdk, Completion};
pub use mock::MockBoundary;

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use roster_types::PushKind;

/// SDK request entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SdkMethod {
    /// Fetch the full friend list.
    GetFriendList,
    /// Set a friend's remark.
    SetFriendInfo,
    /// Send a friend application.
    AddFriend,
    /// Remove a friend.
    DeleteFromFriendList,
    /// Fetch friend applications.
    GetFriendApplicationList,
    /// Accept an application.
    AcceptFriendApplication,
    /// Refuse an application.
    RefuseFriendApplication,
    /// Delete an application.
    DeleteFriendApplication,
    /// Mark incoming applications read.
    SetFriendApplicationRead,
    /// Fetch the blacklist.
    GetBlackList,
    /// Block a user.
    AddToBlackList,
    /// Unblock a user.
    DeleteFromBlackList,
}

impl SdkMethod {
    /// The SDK's name for this entry point.
    pub fn as_str(&self) -> &'static str {
        match self {
            SdkMethod::GetFriendList => "getFriendList",
            SdkMethod::SetFriendInfo => "setFriendInfo",
            SdkMethod::AddFriend => "addFriend",
            SdkMethod::DeleteFromFriendList => "deleteFromFriendList",
            SdkMethod::GetFriendApplicationList => "getFriendApplicationList",
            SdkMethod::AcceptFriendApplication => "acceptFriendApplication",
            SdkMethod::RefuseFriendApplication => "refuseFriendApplication",
            SdkMethod::DeleteFriendApplication => "deleteFriendApplication",
            SdkMethod::SetFriendApplicationRead => "setFriendApplicationListRead",
            SdkMethod::GetBlackList => "getBlackList",
            SdkMethod::AddToBlackList => "addToBlackList",
            SdkMethod::DeleteFromBlackList => "deleteFromBlackList",
        }
    }
}

impl fmt::Display for SdkMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Boundary errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoundaryError {
    /// The SDK could not be reached.
    #[error("sdk unreachable: {0}")]
    Unreachable(String),

    /// The SDK answered with a failure.
    #[error("remote error {code}: {message}")]
    Remote {
        /// SDK-defined error code.
        code: i32,
        /// SDK-provided message.
        message: String,
    },

    /// No completion arrived within the request timeout.
    #[error("request timed out")]
    Timeout,

    /// The completion handle was dropped without a result.
    #[error("completion dropped without a result")]
    Dropped,
}

/// Request/response and push surface of the messaging SDK.
///
/// Implementations must not block the calling task: `call()` resolves when
/// the SDK completes the request, from whatever thread it uses.
#[async_trait]
pub trait SdkBoundary: Send + Sync {
    /// Issue one request. `params` is the JSON-encoded parameter payload;
    /// the success value is the JSON-encoded response.
    async fn call(&self, method: SdkMethod, params: Option<String>)
        -> Result<String, BoundaryError>;

    /// Register the receiver of push notifications, replacing any previous one.
    fn set_push_handler(&self, handler: Arc<dyn PushHandler>);
}

/// Receiver of SDK push notifications, one method per kind.
///
/// Payloads are the raw JSON the SDK delivered. Handlers may be invoked
/// concurrently from several SDK threads.
pub trait PushHandler: Send + Sync {
    /// A friend was added.
    fn on_friend_added(&self, payload: &str);
    /// A friend was deleted.
    fn on_friend_deleted(&self, payload: &str);
    /// A friend's profile changed.
    fn on_friend_info_changed(&self, payload: &str);
    /// A friend application arrived or was sent.
    fn on_application_added(&self, payload: &str);
    /// A friend application was withdrawn.
    fn on_application_deleted(&self, payload: &str);
    /// A friend application was accepted.
    fn on_application_accepted(&self, payload: &str);
    /// A friend application was rejected.
    fn on_application_rejected(&self, payload: &str);
    /// Incoming applications were marked read.
    fn on_application_read(&self, payload: &str);
    /// A user was blacklisted.
    fn on_blacklist_added(&self, payload: &str);
    /// A user was removed from the blacklist.
    fn on_blacklist_deleted(&self, payload: &str);
}

/// Route a push of `kind` to the matching handler method.
pub fn dispatch_push(handler: &dyn PushHandler, kind: PushKind, payload: &str) {
    match kind {
        PushKind::FriendAdded => handler.on_friend_added(payload),
        PushKind::FriendDeleted => handler.on_friend_deleted(payload),
        PushKind::FriendInfoChanged => handler.on_friend_info_changed(payload),
        PushKind::ApplicationAdded => handler.on_application_added(payload),
        PushKind::ApplicationDeleted => handler.on_application_deleted(payload),
        PushKind::ApplicationAccepted => handler.on_application_accepted(payload),
        PushKind::ApplicationRejected => handler.on_application_rejected(payload),
        PushKind::ApplicationRead => handler.on_application_read(payload),
        PushKind::BlacklistAdded => handler.on_blacklist_added(payload),
        PushKind::BlacklistDeleted => handler.on_blacklist_deleted(payload),
    }
}
