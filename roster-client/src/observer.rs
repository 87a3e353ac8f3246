//! Observer registry.
//!
//! Subscribers either hold a channel ([`Subscription`]) or register a
//! callback object ([`RosterObserver`]). Events are delivered in dispatch
//! order to every subscriber; with no subscribers they are dropped, not
//! queued.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;

use roster_core::{RosterEvent, RosterSnapshot};
use roster_types::{BlacklistEntry, FriendApplication, Uid, UserRef};

/// Identifies one subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Callback subscriber with one method per event.
///
/// Every method defaults to a no-op, so implementors override only what
/// they care about. Callbacks run while the roster is locked; read the
/// roster from [`on_roster_changed`](Self::on_roster_changed) instead of
/// calling back into `RosterSync`.
pub trait RosterObserver: Send + Sync {
    /// A friend was added.
    fn on_friend_added(&self, _user: &UserRef) {}
    /// A friend was removed.
    fn on_friend_removed(&self, _uid: &Uid) {}
    /// A friend's or blocked user's profile changed.
    fn on_friend_profile_changed(&self, _user: &UserRef) {}
    /// An application was recorded.
    fn on_application_added(&self, _app: &FriendApplication) {}
    /// A pending application was deleted.
    fn on_application_deleted(&self, _uid: &Uid) {}
    /// An application was accepted.
    fn on_application_accepted(&self, _app: &FriendApplication) {}
    /// An application was rejected.
    fn on_application_rejected(&self, _app: &FriendApplication) {}
    /// Incoming applications were marked read.
    fn on_applications_read(&self) {}
    /// A user was blacklisted.
    fn on_blacklist_added(&self, _entry: &BlacklistEntry) {}
    /// A user was removed from the blacklist.
    fn on_blacklist_removed(&self, _uid: &Uid) {}
    /// The roster was replaced by a resync.
    fn on_reset(&self) {}
    /// Called once after each batch of events, with the roster they
    /// produced.
    fn on_roster_changed(&self, _roster: &RosterSnapshot) {}

    /// Route `event` to the matching method.
    fn on_event(&self, event: &RosterEvent) {
        match event {
            RosterEvent::FriendAdded(user) => self.on_friend_added(user),
            RosterEvent::FriendRemoved(uid) => self.on_friend_removed(uid),
            RosterEvent::FriendProfileChanged(user) => self.on_friend_profile_changed(user),
            RosterEvent::ApplicationAdded(app) => self.on_application_added(app),
            RosterEvent::ApplicationDeleted(uid) => self.on_application_deleted(uid),
            RosterEvent::ApplicationAccepted(app) => self.on_application_accepted(app),
            RosterEvent::ApplicationRejected(app) => self.on_application_rejected(app),
            RosterEvent::ApplicationsRead => self.on_applications_read(),
            RosterEvent::BlacklistAdded(entry) => self.on_blacklist_added(entry),
            RosterEvent::BlacklistRemoved(uid) => self.on_blacklist_removed(uid),
            RosterEvent::Reset => self.on_reset(),
        }
    }
}

/// Channel subscription. Dropping it unsubscribes at the next dispatch.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    rx: mpsc::UnboundedReceiver<RosterEvent>,
}

impl Subscription {
    /// This subscriber's id.
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Wait for the next event. Returns `None` once unsubscribed and drained.
    pub async fn recv(&mut self) -> Option<RosterEvent> {
        self.rx.recv().await
    }

    /// Take the next event if one is already queued.
    pub fn try_recv(&mut self) -> Option<RosterEvent> {
        self.rx.try_recv().ok()
    }

    /// Take every queued event.
    pub fn drain(&mut self) -> Vec<RosterEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.try_recv() {
            events.push(event);
        }
        events
    }
}

#[derive(Clone)]
enum Sink {
    Channel(mpsc::UnboundedSender<RosterEvent>),
    Observer(Arc<dyn RosterObserver>),
}

#[derive(Default)]
struct RegistryInner {
    next_id: u64,
    subscribers: Vec<(SubscriberId, Sink)>,
}

/// The set of parties interested in roster events.
#[derive(Default)]
pub struct ObserverRegistry {
    inner: Mutex<RegistryInner>,
}

impl ObserverRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn add(&self, sink: Sink) -> SubscriberId {
        let mut inner = self.lock();
        let id = SubscriberId(inner.next_id);
        inner.next_id += 1;
        inner.subscribers.push((id, sink));
        tracing::debug!("Subscriber {} added ({} total)", id, inner.subscribers.len());
        id
    }

    /// Add a channel subscriber.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.add(Sink::Channel(tx));
        Subscription { id, rx }
    }

    /// Add a callback subscriber.
    pub fn subscribe_observer(&self, observer: Arc<dyn RosterObserver>) -> SubscriberId {
        self.add(Sink::Observer(observer))
    }

    /// Remove a subscriber. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut inner = self.lock();
        let before = inner.subscribers.len();
        inner.subscribers.retain(|(sid, _)| *sid != id);
        before != inner.subscribers.len()
    }

    /// Number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    /// Deliver `events`, in order, to every subscriber. Callback observers
    /// then see `roster`, the state the events produced.
    ///
    /// Callers serialize dispatches (the relay holds the roster lock), so
    /// every subscriber sees the same order.
    pub fn dispatch(&self, events: &[RosterEvent], roster: &RosterSnapshot) {
        if events.is_empty() {
            return;
        }

        // Deliver without holding the registry lock so observers may
        // subscribe or unsubscribe from a callback.
        let subscribers = self.lock().subscribers.clone();
        if subscribers.is_empty() {
            tracing::debug!("No subscribers, dropping {} event(s)", events.len());
            return;
        }

        let mut closed = Vec::new();
        for (id, sink) in &subscribers {
            match sink {
                Sink::Channel(tx) => {
                    if events.iter().any(|e| tx.send(e.clone()).is_err()) {
                        closed.push(*id);
                    }
                }
                Sink::Observer(observer) => {
                    for event in events {
                        observer.on_event(event);
                    }
                    observer.on_roster_changed(roster);
                }
            }
        }

        if !closed.is_empty() {
            let mut inner = self.lock();
            inner.subscribers.retain(|(id, _)| !closed.contains(id));
            tracing::debug!("Pruned {} closed subscriber(s)", closed.len());
        }
    }
}

impl fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
