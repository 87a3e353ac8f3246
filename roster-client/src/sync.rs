//! RosterSync - the main interface for roster-sync.
//!
//! [`RosterSync`] wires the pieces together for one signed-in session:
//! a shared [`RosterStore`], the [`PushRelay`] registered as the SDK's push
//! handler, the [`ObserverRegistry`], and a [`RequestGateway`].
//!
//! # Example
//!
//! ```ignore
//! let config = RosterConfig::from_file(Path::new("roster.toml"))?;
//! let boundary = CallbackBoundary::new(native_sdk, config.request_timeout());
//! let sync = RosterSync::new(config, boundary);
//!
//! let mut events = sync.subscribe();
//! sync.refresh().await?;
//! while let Some(event) = events.recv().await {
//!     println!("{:?}", event);
//! }
//! ```

use std::sync::{Arc, Mutex};

use roster_core::{ApplyError, ResyncToken, RosterEvent, RosterSnapshot, RosterStore};

use crate::{
    lock_store, ClientError, ObserverRegistry, PushRelay, RelayStats, RequestGateway,
    RosterConfig, RosterObserver, SdkBoundary, SharedStore, SubscriberId, Subscription,
};

/// Roster sync client for one signed-in session.
#[derive(Debug)]
pub struct RosterSync<B> {
    config: RosterConfig,
    store: SharedStore,
    observers: Arc<ObserverRegistry>,
    relay: Arc<PushRelay>,
    gateway: RequestGateway<B>,
}

impl<B: SdkBoundary + 'static> RosterSync<B> {
    /// Start a session with an empty roster. Call [`refresh`](Self::refresh)
    /// to load it from the SDK.
    pub fn new(config: RosterConfig, boundary: B) -> Self {
        let store = RosterStore::new(config.session.local_uid.clone());
        Self::with_store(config, boundary, store)
    }

    /// Resume a session from a previously taken snapshot.
    pub fn with_snapshot(
        config: RosterConfig,
        boundary: B,
        snapshot: RosterSnapshot,
    ) -> Result<Self, ClientError> {
        let store = RosterStore::from_snapshot(config.session.local_uid.clone(), snapshot)?;
        Ok(Self::with_store(config, boundary, store))
    }

    fn with_store(config: RosterConfig, boundary: B, store: RosterStore) -> Self {
        let boundary = Arc::new(boundary);
        let store: SharedStore = Arc::new(Mutex::new(store));
        let observers = Arc::new(ObserverRegistry::new());
        let relay = Arc::new(PushRelay::new(
            store.clone(),
            observers.clone(),
            config.push.max_payload_bytes,
        ));
        boundary.set_push_handler(relay.clone());
        let gateway = RequestGateway::new(boundary, store.clone());

        tracing::info!("Roster session started for {}", config.session.local_uid);

        Self {
            config,
            store,
            observers,
            relay,
            gateway,
        }
    }

    /// Reload friends, applications and blacklist from the SDK and replace
    /// the local roster. Subscribers receive a single `Reset` event.
    ///
    /// The three lists are fetched concurrently; if any fetch fails the
    /// roster is left unchanged. Pushes applied while the fetch is in
    /// flight are replayed onto the fetched lists, so a change the SDK
    /// reported after serving a list is not lost.
    pub async fn refresh(&self) -> Result<(), ClientError> {
        let resync = OpenResync::begin(&self.store);
        let (friends, applications, blacklist) = tokio::try_join!(
            self.gateway.list_friends(),
            self.gateway.list_friend_applications(),
            self.gateway.list_blacklist_entries(),
        )?;
        let snapshot = RosterSnapshot::from_parts(friends, applications, blacklist);

        let mut store = lock_store(&self.store);
        let events = resync.finish(&mut store, snapshot)?;
        tracing::info!(
            "Roster resynced: {} friends, {} pending incoming, {} blocked",
            store.view().friends().count(),
            store.view().incoming_applications().count(),
            store.view().blacklist().count()
        );
        self.observers.dispatch(&events, store.view());
        Ok(())
    }

    /// An immutable copy of the current roster.
    pub fn snapshot(&self) -> RosterSnapshot {
        lock_store(&self.store).snapshot()
    }

    /// Subscribe to roster events over a channel.
    pub fn subscribe(&self) -> Subscription {
        self.observers.subscribe()
    }

    /// Subscribe a callback observer.
    pub fn subscribe_observer(&self, observer: Arc<dyn RosterObserver>) -> SubscriberId {
        self.observers.subscribe_observer(observer)
    }

    /// Remove a subscriber.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// The request gateway.
    pub fn gateway(&self) -> &RequestGateway<B> {
        &self.gateway
    }

    /// Push handling counters.
    pub fn relay_stats(&self) -> RelayStats {
        self.relay.stats()
    }

    /// The session configuration.
    pub fn config(&self) -> &RosterConfig {
        &self.config
    }
}

/// A resync opened by `refresh`. Aborted on drop unless finished, so a
/// failed or cancelled refresh stops journaling.
struct OpenResync<'a> {
    store: &'a SharedStore,
    token: Option<ResyncToken>,
}

impl<'a> OpenResync<'a> {
    fn begin(store: &'a SharedStore) -> Self {
        let token = lock_store(store).begin_resync();
        Self {
            store,
            token: Some(token),
        }
    }

    /// Finish under the caller's lock.
    fn finish(
        mut self,
        store: &mut RosterStore,
        snapshot: RosterSnapshot,
    ) -> Result<Vec<RosterEvent>, ApplyError> {
        match self.token.take() {
            Some(token) => store.finish_resync(token, snapshot),
            None => store.reset(snapshot),
        }
    }
}

impl Drop for OpenResync<'_> {
    fn drop(&mut self) {
        if let Some(token) = self.token.take() {
            tracing::debug!("Refresh abandoned, closing resync");
            lock_store(self.store).abort_resync(token);
        }
    }
}
