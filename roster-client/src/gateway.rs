//! Request gateway.
//!
//! [`RequestGateway`] turns typed intents into SDK calls and SDK responses
//! into typed results. It validates arguments before any call and never
//! retries; retry policy belongs to the SDK.
//!
//! The gateway does not mutate the roster. The SDK confirms every
//! successful change with a push, which the relay applies.

use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;

use roster_types::payloads::{
    ApplicationRecord, BlacklistRecord, FriendRequestParam, RemarkParam, UidParam,
};
use roster_types::{
    decode_json, encode_json, BlacklistEntry, FriendApplication, Uid, UserRef,
};

use crate::{lock_store, ClientError, SdkBoundary, SdkMethod, SharedStore};

/// Issues SDK requests on behalf of the signed-in user.
#[derive(Debug)]
pub struct RequestGateway<B> {
    boundary: Arc<B>,
    store: SharedStore,
    local: Uid,
}

impl<B: SdkBoundary> RequestGateway<B> {
    /// Create a gateway over `boundary`, consulting `store` for local checks.
    pub fn new(boundary: Arc<B>, store: SharedStore) -> Self {
        let local = lock_store(&store).local_uid().clone();
        Self {
            boundary,
            store,
            local,
        }
    }

    /// The signed-in user.
    pub fn local_uid(&self) -> &Uid {
        &self.local
    }

    // ===========================================
    // Friends
    // ===========================================

    /// Fetch the full friend list.
    pub async fn list_friends(&self) -> Result<Vec<UserRef>, ClientError> {
        let raw = self.request(SdkMethod::GetFriendList, None).await?;
        Ok(decode_json(&raw)?)
    }

    /// Fetch the profiles of those `uids` that are friends.
    ///
    /// Ids that are not friends are silently left out, so the result may be
    /// shorter than the input. An empty input returns without a call.
    pub async fn get_friends_info<I, S>(&self, uids: I) -> Result<Vec<UserRef>, ClientError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let wanted = uids
            .into_iter()
            .map(|raw| parse_uid(raw.as_ref()))
            .collect::<Result<BTreeSet<Uid>, _>>()?;
        if wanted.is_empty() {
            return Ok(Vec::new());
        }

        let friends = self.list_friends().await?;
        Ok(friends
            .into_iter()
            .filter(|user| wanted.contains(&user.uid))
            .collect())
    }

    /// Set the remark shown for a friend.
    pub async fn set_friend_remark(&self, uid: &str, comment: &str) -> Result<(), ClientError> {
        let param = RemarkParam {
            uid: parse_uid(uid)?,
            comment: comment.to_string(),
        };
        self.request_with(SdkMethod::SetFriendInfo, &param).await?;
        Ok(())
    }

    /// Send a friend application to `uid`.
    pub async fn send_friend_request(&self, uid: &str, message: &str) -> Result<(), ClientError> {
        let uid = parse_uid(uid)?;
        if uid == self.local {
            return Err(ClientError::InvalidArgument(
                "cannot send a friend request to yourself".into(),
            ));
        }
        let param = FriendRequestParam {
            uid,
            req_message: message.to_string(),
        };
        self.request_with(SdkMethod::AddFriend, &param).await?;
        Ok(())
    }

    /// Remove a friend.
    pub async fn remove_friend(&self, uid: &str) -> Result<(), ClientError> {
        self.request_uid(SdkMethod::DeleteFromFriendList, uid).await
    }

    // ===========================================
    // Applications
    // ===========================================

    /// Fetch friend applications, in both directions and any status.
    pub async fn list_friend_applications(&self) -> Result<Vec<FriendApplication>, ClientError> {
        let raw = self.request(SdkMethod::GetFriendApplicationList, None).await?;
        let records: Vec<ApplicationRecord> = decode_json(&raw)?;
        records
            .into_iter()
            .map(|record| record.into_application(&self.local).map_err(ClientError::from))
            .collect()
    }

    /// Accept the pending incoming application from `uid`.
    ///
    /// Fails with [`ClientError::NotFound`] without calling the SDK when the
    /// local roster holds no such application.
    pub async fn accept_friend_application(&self, uid: &str) -> Result<(), ClientError> {
        let uid = parse_uid(uid)?;
        let pending = lock_store(&self.store).view().incoming_from(&uid).is_some();
        if !pending {
            return Err(ClientError::NotFound(format!(
                "no pending application from {}",
                uid
            )));
        }
        self.request_with(SdkMethod::AcceptFriendApplication, &UidParam { uid })
            .await?;
        Ok(())
    }

    /// Refuse the application from `uid`.
    pub async fn reject_friend_application(&self, uid: &str) -> Result<(), ClientError> {
        self.request_uid(SdkMethod::RefuseFriendApplication, uid).await
    }

    /// Delete the application exchanged with `uid`.
    pub async fn delete_friend_application(&self, uid: &str) -> Result<(), ClientError> {
        self.request_uid(SdkMethod::DeleteFriendApplication, uid).await
    }

    /// Mark every incoming application read.
    pub async fn mark_applications_read(&self) -> Result<(), ClientError> {
        self.request(SdkMethod::SetFriendApplicationRead, None).await?;
        Ok(())
    }

    // ===========================================
    // Blacklist
    // ===========================================

    /// Fetch the blocked users.
    pub async fn list_blacklist(&self) -> Result<Vec<UserRef>, ClientError> {
        Ok(self
            .list_blacklist_entries()
            .await?
            .into_iter()
            .map(|entry| entry.user)
            .collect())
    }

    /// Fetch the blacklist with block times.
    pub async fn list_blacklist_entries(&self) -> Result<Vec<BlacklistEntry>, ClientError> {
        let raw = self.request(SdkMethod::GetBlackList, None).await?;
        let records: Vec<BlacklistRecord> = decode_json(&raw)?;
        let now = crate::unix_now();
        Ok(records
            .into_iter()
            .map(|record| record.into_entry(now))
            .collect())
    }

    /// Block `uid`. Allowed for current friends; the friend entry is left
    /// for the SDK's pushes to reconcile.
    pub async fn add_to_blacklist(&self, uid: &str) -> Result<(), ClientError> {
        self.request_uid(SdkMethod::AddToBlackList, uid).await
    }

    /// Unblock `uid`.
    pub async fn remove_from_blacklist(&self, uid: &str) -> Result<(), ClientError> {
        self.request_uid(SdkMethod::DeleteFromBlackList, uid).await
    }

    // ===========================================
    // Helpers
    // ===========================================

    async fn request_uid(&self, method: SdkMethod, uid: &str) -> Result<(), ClientError> {
        let param = UidParam {
            uid: parse_uid(uid)?,
        };
        self.request_with(method, &param).await?;
        Ok(())
    }

    async fn request_with<P: Serialize>(
        &self,
        method: SdkMethod,
        param: &P,
    ) -> Result<String, ClientError> {
        let params = encode_json(param)?;
        self.request(method, Some(params)).await
    }

    async fn request(
        &self,
        method: SdkMethod,
        params: Option<String>,
    ) -> Result<String, ClientError> {
        tracing::debug!("SDK request {}", method);
        match self.boundary.call(method, params).await {
            Ok(raw) => Ok(raw),
            Err(e) => {
                tracing::debug!("SDK request {} failed: {}", method, e);
                Err(e.into())
            }
        }
    }
}

fn parse_uid(raw: &str) -> Result<Uid, ClientError> {
    Ok(Uid::parse(raw)?)
}
