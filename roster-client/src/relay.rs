//! Push relay.
//!
//! [`PushRelay`] is the SDK's push handler. For each push it:
//! 1. Decodes the JSON payload into a [`Delta`]
//! 2. Applies it to the shared [`RosterStore`](roster_core::RosterStore)
//! 3. Dispatches the resulting events to the [`ObserverRegistry`]
//!
//! Steps 2 and 3 run under the roster lock, so events reach observers in
//! the order pushes were applied even when the SDK calls in from several
//! threads. A push that fails to decode or apply is logged, counted and
//! discarded; the relay keeps handling later pushes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use roster_core::Delta;
use roster_types::payloads::{ApplicationRecord, BlacklistRecord, UidParam};
use roster_types::{decode_json, PushKind, Uid, UserRef};

use crate::{lock_store, unix_now, ClientError, ObserverRegistry, PushHandler, SharedStore};

/// Counters of how pushes were handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    /// Pushes applied to the roster.
    pub applied: u64,
    /// Pushes that decoded but the roster refused.
    pub rejected: u64,
    /// Pushes that could not be decoded.
    pub undecodable: u64,
}

#[derive(Debug, Default)]
struct Counters {
    applied: AtomicU64,
    rejected: AtomicU64,
    undecodable: AtomicU64,
}

/// Applies SDK pushes to the roster and notifies observers.
#[derive(Debug)]
pub struct PushRelay {
    local: Uid,
    store: SharedStore,
    observers: Arc<ObserverRegistry>,
    max_payload_bytes: usize,
    counters: Counters,
}

impl PushRelay {
    /// Create a relay over `store`, discarding payloads larger than
    /// `max_payload_bytes`.
    pub fn new(
        store: SharedStore,
        observers: Arc<ObserverRegistry>,
        max_payload_bytes: usize,
    ) -> Self {
        let local = lock_store(&store).local_uid().clone();
        Self {
            local,
            store,
            observers,
            max_payload_bytes,
            counters: Counters::default(),
        }
    }

    /// Current counters.
    pub fn stats(&self) -> RelayStats {
        RelayStats {
            applied: self.counters.applied.load(Ordering::Relaxed),
            rejected: self.counters.rejected.load(Ordering::Relaxed),
            undecodable: self.counters.undecodable.load(Ordering::Relaxed),
        }
    }

    /// Handle one push.
    pub fn handle(&self, kind: PushKind, payload: &str) {
        let delta = match self.decode(kind, payload) {
            Ok(delta) => delta,
            Err(e) => {
                self.counters.undecodable.fetch_add(1, Ordering::Relaxed);
                tracing::warn!("Discarding {} push: {}", kind, e);
                return;
            }
        };

        let name = delta.name();
        let mut store = lock_store(&self.store);
        match store.apply(delta) {
            Ok(events) => {
                self.counters.applied.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(
                    "Applied {} push as {} ({} event(s))",
                    kind,
                    name,
                    events.len()
                );
                self.observers.dispatch(&events, store.view());
            }
            Err(e) => {
                self.counters.rejected.fetch_add(1, Ordering::Relaxed);
                tracing::warn!("Roster rejected {} push: {}", kind, e);
            }
        }
    }

    /// Decode a push payload into a delta.
    fn decode(&self, kind: PushKind, payload: &str) -> Result<Delta, ClientError> {
        if payload.len() > self.max_payload_bytes {
            return Err(ClientError::Decode(format!(
                "payload of {} bytes exceeds limit of {}",
                payload.len(),
                self.max_payload_bytes
            )));
        }

        let delta = match kind {
            PushKind::FriendAdded => Delta::FriendAdded(decode_json::<UserRef>(payload)?),
            PushKind::FriendDeleted => Delta::FriendRemoved(decode_uid(payload)?),
            PushKind::FriendInfoChanged => {
                Delta::FriendProfileChanged(decode_json::<UserRef>(payload)?)
            }
            PushKind::ApplicationAdded => Delta::ApplicationAdded(
                decode_json::<ApplicationRecord>(payload)?.into_application(&self.local)?,
            ),
            PushKind::ApplicationDeleted => Delta::ApplicationDeleted(decode_uid(payload)?),
            PushKind::ApplicationAccepted => Delta::ApplicationAccepted(decode_uid(payload)?),
            PushKind::ApplicationRejected => Delta::ApplicationRejected(decode_uid(payload)?),
            PushKind::ApplicationRead => Delta::ApplicationsRead,
            PushKind::BlacklistAdded => Delta::BlacklistAdded(
                decode_json::<BlacklistRecord>(payload)?.into_entry(unix_now()),
            ),
            PushKind::BlacklistDeleted => Delta::BlacklistRemoved(decode_uid(payload)?),
        };
        Ok(delta)
    }
}

/// Pushes that identify a user carry at least `{"uid": ...}`.
fn decode_uid(payload: &str) -> Result<Uid, ClientError> {
    Ok(decode_json::<UidParam>(payload)?.uid)
}

impl PushHandler for PushRelay {
    fn on_friend_added(&self, payload: &str) {
        self.handle(PushKind::FriendAdded, payload);
    }

    fn on_friend_deleted(&self, payload: &str) {
        self.handle(PushKind::FriendDeleted, payload);
    }

    fn on_friend_info_changed(&self, payload: &str) {
        self.handle(PushKind::FriendInfoChanged, payload);
    }

    fn on_application_added(&self, payload: &str) {
        self.handle(PushKind::ApplicationAdded, payload);
    }

    fn on_application_deleted(&self, payload: &str) {
        self.handle(PushKind::ApplicationDeleted, payload);
    }

    fn on_application_accepted(&self, payload: &str) {
        self.handle(PushKind::ApplicationAccepted, payload);
    }

    fn on_application_rejected(&self, payload: &str) {
        self.handle(PushKind::ApplicationRejected, payload);
    }

    fn on_application_read(&self, payload: &str) {
        self.handle(PushKind::ApplicationRead, payload);
    }

    fn on_blacklist_added(&self, payload: &str) {
        self.handle(PushKind::BlacklistAdded, payload);
    }

    fn on_blacklist_deleted(&self, payload: &str) {
        self.handle(PushKind::BlacklistDeleted, payload);
    }
}
