//! # roster-client
//!
//! Friendship roster sync client for roster-sync.
//!
//! This crate keeps a local [`RosterSnapshot`](roster_core::RosterSnapshot)
//! consistent with a remote messaging SDK that answers requests and pushes
//! deltas on its own threads.
//!
//! ## Architecture
//!
//! ```text
//! Application → RosterSync → RequestGateway → SdkBoundary → SDK
//!                   ↑                                        │
//!            ObserverRegistry ← PushRelay ← (push callbacks) ┘
//!                                  ↓
//!                     roster-core (pure RosterStore)
//! ```
//!
//! All store mutations go through one mutex, and events are delivered to
//! observers while that mutex is held, so every subscriber sees events in
//! the order the pushes were applied.
//!
//! ## Example
//!
//! ```ignore
//! use roster_sync_client::{MockBoundary, RosterConfig, RosterSync};
//!
//! let config = RosterConfig::new(Uid::parse("me")?);
//! let sync = RosterSync::new(config, MockBoundary::new());
//! let mut events = sync.subscribe();
//!
//! sync.refresh().await?;
//! sync.gateway().send_friend_request("u1", "hi").await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod boundary;
pub mod config;
pub mod error;
pub mod gateway;
pub mod observer;
pub mod relay;
pub mod sync;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use roster_core::RosterStore;

pub use boundary::{
    dispatch_push, BoundaryError, CallbackBoundary, CallbackSdk, Completion, MockBoundary,
    PushHandler, SdkBoundary, SdkMethod,
};
pub use config::{ConfigError, RosterConfig};
pub use error::ClientError;
pub use gateway::RequestGateway;
pub use observer::{ObserverRegistry, RosterObserver, SubscriberId, Subscription};
pub use relay::{PushRelay, RelayStats};
pub use sync::RosterSync;

// Re-export the layers below for convenience
pub use roster_core::{RosterEvent, RosterSnapshot};
pub use roster_types::{PushKind, Uid};

/// The roster store shared between the gateway, the relay and the facade.
pub type SharedStore = Arc<Mutex<RosterStore>>;

/// Lock the shared store.
///
/// Every apply is atomic, so a panic in an observer cannot leave the store
/// half-mutated; a poisoned lock is recovered rather than propagated.
pub(crate) fn lock_store(store: &SharedStore) -> MutexGuard<'_, RosterStore> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Seconds since the Unix epoch, used to stamp blacklist entries the SDK
/// reports without a time.
pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
