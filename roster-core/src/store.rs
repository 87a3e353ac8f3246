//! The roster store.
//!
//! [`RosterStore`] exclusively owns the [`RosterSnapshot`]. Every change goes
//! through one of the `apply_*` operations, which either apply completely
//! and return the events to emit, or fail and change nothing.
//!
//! The store has no locking of its own; `roster-client` wraps it in a single
//! mutex so concurrent SDK callbacks cannot interleave.

use thiserror::Error;

use roster_types::{
    ApplicationDirection, ApplicationStatus, BlacklistEntry, FriendApplication, Uid, UserRef,
};

use crate::{
    ApplicationEvent, ApplicationLedger, ApplicationState, Delta, RosterEvent, RosterSnapshot,
};

/// Errors from applying a delta. The store is unchanged when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    /// The change would put a uid in both friends and blacklist.
    #[error("conflict: {0} cannot be both a friend and blacklisted")]
    Conflict(Uid),

    /// The change refers to an entry the roster does not hold.
    #[error("{what} not found for {uid}")]
    NotFound {
        /// Kind of entry that was looked up.
        what: &'static str,
        /// The uid that was looked up.
        uid: Uid,
    },

    /// An application between two other users, or a self-application.
    #[error("application {from} -> {to} does not involve the local user")]
    Unrelated {
        /// Sender.
        from: Uid,
        /// Recipient.
        to: Uid,
    },
}

/// An open resync, returned by [`RosterStore::begin_resync`].
///
/// Hand it back to [`RosterStore::finish_resync`] or
/// [`RosterStore::abort_resync`] exactly once.
#[derive(Debug)]
#[must_use = "an open resync keeps journaling deltas until it is finished or aborted"]
pub struct ResyncToken {
    since: u64,
}

/// Local roster of the signed-in user.
#[derive(Debug, Clone)]
pub struct RosterStore {
    local: Uid,
    roster: RosterSnapshot,
    ledger: ApplicationLedger,
    /// Sequence number of the last journaled delta.
    seq: u64,
    open_resyncs: usize,
    /// Deltas applied while a resync is open, replayed when it finishes.
    journal: Vec<(u64, Delta)>,
}

impl RosterStore {
    /// Create an empty roster for `local`.
    pub fn new(local: Uid) -> Self {
        Self {
            local,
            roster: RosterSnapshot::new(),
            ledger: ApplicationLedger::new(),
            seq: 0,
            open_resyncs: 0,
            journal: Vec::new(),
        }
    }

    /// Resume from a previously taken snapshot.
    pub fn from_snapshot(local: Uid, snapshot: RosterSnapshot) -> Result<Self, ApplyError> {
        snapshot.check_invariants().map_err(ApplyError::Conflict)?;
        let ledger = ApplicationLedger::from_snapshot(&snapshot);
        Ok(Self {
            local,
            roster: snapshot,
            ledger,
            seq: 0,
            open_resyncs: 0,
            journal: Vec::new(),
        })
    }

    /// The signed-in user.
    pub fn local_uid(&self) -> &Uid {
        &self.local
    }

    /// An immutable point-in-time copy of the roster.
    pub fn snapshot(&self) -> RosterSnapshot {
        self.roster.clone()
    }

    /// Borrow the current roster without copying.
    pub fn view(&self) -> &RosterSnapshot {
        &self.roster
    }

    /// State of the application pair `(from, to)`.
    pub fn application_state(&self, from: &Uid, to: &Uid) -> ApplicationState {
        self.ledger.state(from, to)
    }

    /// Apply a typed delta.
    ///
    /// While a resync is open, successful deltas are also journaled so
    /// [`finish_resync`](Self::finish_resync) can replay them onto the
    /// fetched snapshot.
    pub fn apply(&mut self, delta: Delta) -> Result<Vec<RosterEvent>, ApplyError> {
        if self.open_resyncs == 0 || matches!(delta, Delta::Reset(_)) {
            return self.apply_delta(delta);
        }
        let events = self.apply_delta(delta.clone())?;
        self.seq += 1;
        self.journal.push((self.seq, delta));
        Ok(events)
    }

    fn apply_delta(&mut self, delta: Delta) -> Result<Vec<RosterEvent>, ApplyError> {
        match delta {
            Delta::FriendAdded(user) => self.apply_friend_added(user),
            Delta::FriendRemoved(uid) => self.apply_friend_removed(&uid),
            Delta::FriendProfileChanged(user) => self.apply_friend_profile_changed(user),
            Delta::ApplicationAdded(app) => self.apply_application_added(app),
            Delta::ApplicationDeleted(uid) => self.apply_application_deleted(&uid),
            Delta::ApplicationAccepted(uid) => self.apply_application_accepted(&uid),
            Delta::ApplicationRejected(uid) => self.apply_application_rejected(&uid),
            Delta::ApplicationsRead => self.apply_applications_read(),
            Delta::BlacklistAdded(entry) => self.apply_blacklist_added(entry),
            Delta::BlacklistRemoved(uid) => self.apply_blacklist_removed(&uid),
            Delta::Reset(snapshot) => self.reset(snapshot),
        }
    }

    // ===========================================
    // Friends
    // ===========================================

    /// Insert a friend. Fails with [`ApplyError::Conflict`] while the uid is
    /// still blacklisted; the caller must remove the block first.
    ///
    /// Re-adding an existing friend with a different profile reports a
    /// profile change; an identical re-add is a no-op.
    pub fn apply_friend_added(&mut self, user: UserRef) -> Result<Vec<RosterEvent>, ApplyError> {
        if self.roster.is_blacklisted(&user.uid) {
            return Err(ApplyError::Conflict(user.uid));
        }
        let event = match self.roster.friends.get(&user.uid) {
            Some(existing) if *existing == user => None,
            Some(_) => Some(RosterEvent::FriendProfileChanged(user.clone())),
            None => Some(RosterEvent::FriendAdded(user.clone())),
        };
        if event.is_some() {
            self.roster.friends.insert(user.uid.clone(), user);
        }
        Ok(event.into_iter().collect())
    }

    /// Remove a friend. Absent friends are not an error.
    pub fn apply_friend_removed(&mut self, uid: &Uid) -> Result<Vec<RosterEvent>, ApplyError> {
        Ok(self
            .roster
            .friends
            .remove(uid)
            .map(|_| RosterEvent::FriendRemoved(uid.clone()))
            .into_iter()
            .collect())
    }

    /// Update the profile of a friend or blocked user.
    pub fn apply_friend_profile_changed(
        &mut self,
        user: UserRef,
    ) -> Result<Vec<RosterEvent>, ApplyError> {
        if !self.roster.is_friend(&user.uid) && !self.roster.is_blacklisted(&user.uid) {
            return Err(ApplyError::NotFound {
                what: "friend",
                uid: user.uid,
            });
        }

        let mut changed = false;
        if let Some(existing) = self.roster.friends.get_mut(&user.uid) {
            if *existing != user {
                *existing = user.clone();
                changed = true;
            }
        }
        if let Some(entry) = self.roster.blacklist.get_mut(&user.uid) {
            if entry.user != user {
                entry.user = user.clone();
                changed = true;
            }
        }

        Ok(if changed {
            vec![RosterEvent::FriendProfileChanged(user)]
        } else {
            vec![]
        })
    }

    // ===========================================
    // Applications
    // ===========================================

    /// Record an application, replacing any pending one for the same pair.
    ///
    /// The direction is derived from which side is the local user. Pending
    /// applications enter the pending sets (incoming ones also become
    /// unread); applications reported with a terminal status only update
    /// the pair's state.
    pub fn apply_application_added(
        &mut self,
        mut app: FriendApplication,
    ) -> Result<Vec<RosterEvent>, ApplyError> {
        let (direction, peer) = self.classify(&app)?;
        app.direction = direction;

        let (from, to) = app.pair();
        self.remove_pending(direction, &peer);
        self.ledger.apply(&from, &to, ApplicationEvent::Applied);

        match app.status {
            ApplicationStatus::Pending => match direction {
                ApplicationDirection::Incoming => {
                    self.roster.incoming.insert(peer.clone(), app.clone());
                    self.roster.unread.insert(peer);
                }
                ApplicationDirection::Outgoing => {
                    self.roster.outgoing.insert(peer, app.clone());
                }
            },
            ApplicationStatus::Accepted => {
                self.ledger.apply(&from, &to, ApplicationEvent::Accepted);
            }
            ApplicationStatus::Rejected => {
                self.ledger.apply(&from, &to, ApplicationEvent::Rejected);
            }
        }

        Ok(vec![RosterEvent::ApplicationAdded(app)])
    }

    /// Accept the pending application with `uid`: incoming from `uid` first,
    /// otherwise our outgoing application to `uid`.
    ///
    /// Emits `FriendAdded` (unless already a friend) followed by
    /// `ApplicationAccepted`. Fails with `NotFound` when nothing is pending
    /// and with `Conflict` when `uid` is blacklisted.
    pub fn apply_application_accepted(
        &mut self,
        uid: &Uid,
    ) -> Result<Vec<RosterEvent>, ApplyError> {
        let app = self.pending_application(uid)?;
        if self.roster.is_blacklisted(uid) {
            return Err(ApplyError::Conflict(uid.clone()));
        }

        // Once friends, a crossed application the other way is settled too.
        for direction in [ApplicationDirection::Incoming, ApplicationDirection::Outgoing] {
            if let Some(settled) = self.remove_pending(direction, uid) {
                let (from, to) = settled.pair();
                self.ledger.apply(&from, &to, ApplicationEvent::Accepted);
            }
        }
        let app = app.with_status(ApplicationStatus::Accepted);

        let mut events = Vec::with_capacity(2);
        if !self.roster.is_friend(uid) {
            self.roster.friends.insert(uid.clone(), app.peer.clone());
            events.push(RosterEvent::FriendAdded(app.peer.clone()));
        }
        events.push(RosterEvent::ApplicationAccepted(app));
        Ok(events)
    }

    /// Reject the pending application with `uid`.
    pub fn apply_application_rejected(
        &mut self,
        uid: &Uid,
    ) -> Result<Vec<RosterEvent>, ApplyError> {
        let app = self.pending_application(uid)?;

        self.remove_pending(app.direction, uid);
        let (from, to) = app.pair();
        self.ledger.apply(&from, &to, ApplicationEvent::Rejected);

        Ok(vec![RosterEvent::ApplicationRejected(
            app.with_status(ApplicationStatus::Rejected),
        )])
    }

    /// Drop any pending application with `uid`, in either direction.
    pub fn apply_application_deleted(
        &mut self,
        uid: &Uid,
    ) -> Result<Vec<RosterEvent>, ApplyError> {
        let mut removed = false;
        for direction in [ApplicationDirection::Incoming, ApplicationDirection::Outgoing] {
            if let Some(app) = self.remove_pending(direction, uid) {
                let (from, to) = app.pair();
                self.ledger.apply(&from, &to, ApplicationEvent::Withdrawn);
                removed = true;
            }
        }
        Ok(if removed {
            vec![RosterEvent::ApplicationDeleted(uid.clone())]
        } else {
            vec![]
        })
    }

    /// Mark every incoming application read.
    pub fn apply_applications_read(&mut self) -> Result<Vec<RosterEvent>, ApplyError> {
        if self.roster.unread.is_empty() {
            return Ok(vec![]);
        }
        self.roster.unread.clear();
        Ok(vec![RosterEvent::ApplicationsRead])
    }

    // ===========================================
    // Blacklist
    // ===========================================

    /// Block a user. A current friend is removed first and both changes are
    /// reported: `FriendRemoved` then `BlacklistAdded`. Re-blocking replaces
    /// the entry silently.
    pub fn apply_blacklist_added(
        &mut self,
        entry: BlacklistEntry,
    ) -> Result<Vec<RosterEvent>, ApplyError> {
        let uid = entry.uid().clone();
        let mut events = Vec::with_capacity(2);

        if self.roster.friends.remove(&uid).is_some() {
            events.push(RosterEvent::FriendRemoved(uid.clone()));
        }
        if self.roster.blacklist.insert(uid, entry.clone()).is_none() {
            events.push(RosterEvent::BlacklistAdded(entry));
        }
        Ok(events)
    }

    /// Unblock a user. Absent entries are not an error.
    pub fn apply_blacklist_removed(&mut self, uid: &Uid) -> Result<Vec<RosterEvent>, ApplyError> {
        Ok(self
            .roster
            .blacklist
            .remove(uid)
            .map(|_| RosterEvent::BlacklistRemoved(uid.clone()))
            .into_iter()
            .collect())
    }

    // ===========================================
    // Resync
    // ===========================================

    /// Replace the roster with a freshly fetched snapshot.
    ///
    /// Read markers carry over for applications that stay pending; newly
    /// seen incoming applications start unread.
    pub fn reset(&mut self, mut snapshot: RosterSnapshot) -> Result<Vec<RosterEvent>, ApplyError> {
        snapshot.check_invariants().map_err(ApplyError::Conflict)?;

        let previous = &self.roster;
        let unread = snapshot
            .incoming
            .keys()
            .filter(|uid| previous.unread.contains(*uid) || !previous.incoming.contains_key(*uid))
            .cloned()
            .collect();
        snapshot.unread = unread;

        self.ledger.clear_pending();
        for app in snapshot
            .incoming_applications()
            .chain(snapshot.outgoing_applications())
        {
            self.ledger.mark_pending(&app.from_uid, &app.to_uid);
        }
        self.roster = snapshot;
        Ok(vec![RosterEvent::Reset])
    }

    /// Start a resync. Deltas applied from now on are journaled until the
    /// returned token is finished or aborted.
    pub fn begin_resync(&mut self) -> ResyncToken {
        self.open_resyncs += 1;
        ResyncToken { since: self.seq }
    }

    /// Adopt a snapshot fetched after `token` was issued, then replay every
    /// delta applied since, so changes that raced the fetch are kept.
    ///
    /// Replayed deltas the snapshot already reflects fail harmlessly and
    /// emit nothing; observers only see the `Reset`.
    pub fn finish_resync(
        &mut self,
        token: ResyncToken,
        snapshot: RosterSnapshot,
    ) -> Result<Vec<RosterEvent>, ApplyError> {
        let result = self.reset(snapshot);
        if result.is_ok() {
            let missed: Vec<Delta> = self
                .journal
                .iter()
                .filter(|(seq, _)| *seq > token.since)
                .map(|(_, delta)| delta.clone())
                .collect();
            for delta in missed {
                let _ = self.apply_delta(delta);
            }
        }
        self.close_resync(token);
        result
    }

    /// Close a resync without adopting anything.
    pub fn abort_resync(&mut self, token: ResyncToken) {
        self.close_resync(token);
    }

    /// Number of resyncs currently open.
    pub fn open_resyncs(&self) -> usize {
        self.open_resyncs
    }

    fn close_resync(&mut self, _token: ResyncToken) {
        self.open_resyncs = self.open_resyncs.saturating_sub(1);
        if self.open_resyncs == 0 {
            self.journal.clear();
        }
    }

    // ===========================================
    // Helpers
    // ===========================================

    /// Work out the direction of `app` and the uid of the other party.
    fn classify(&self, app: &FriendApplication) -> Result<(ApplicationDirection, Uid), ApplyError> {
        let unrelated = || ApplyError::Unrelated {
            from: app.from_uid.clone(),
            to: app.to_uid.clone(),
        };
        let (direction, peer) = if app.to_uid == self.local && app.from_uid != self.local {
            (ApplicationDirection::Incoming, app.from_uid.clone())
        } else if app.from_uid == self.local && app.to_uid != self.local {
            (ApplicationDirection::Outgoing, app.to_uid.clone())
        } else {
            return Err(unrelated());
        };
        if app.peer.uid != peer {
            return Err(unrelated());
        }
        Ok((direction, peer))
    }

    fn pending_application(&self, uid: &Uid) -> Result<FriendApplication, ApplyError> {
        self.roster
            .incoming_from(uid)
            .or_else(|| self.roster.outgoing_to(uid))
            .cloned()
            .ok_or_else(|| ApplyError::NotFound {
                what: "pending application",
                uid: uid.clone(),
            })
    }

    fn remove_pending(
        &mut self,
        direction: ApplicationDirection,
        uid: &Uid,
    ) -> Option<FriendApplication> {
        match direction {
            ApplicationDirection::Incoming => {
                self.roster.unread.remove(uid);
                self.roster.incoming.remove(uid)
            }
            ApplicationDirection::Outgoing => self.roster.outgoing.remove(uid),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid(s: &str) -> Uid {
        Uid::parse(s).unwrap()
    }

    fn user(s: &str) -> UserRef {
        UserRef::new(uid(s))
    }

    fn store() -> RosterStore {
        RosterStore::new(uid("me"))
    }

    fn incoming(from: &str) -> FriendApplication {
        FriendApplication::incoming(user(from), &uid("me"), "hello")
    }

    fn block(s: &str) -> BlacklistEntry {
        BlacklistEntry::new(user(s), 1_700_000_000)
    }

    // ===========================================
    // Friend Tests
    // ===========================================

    #[test]
    fn friend_added_then_removed() {
        let mut store = store();

        let events = store.apply_friend_added(user("a")).unwrap();
        assert_eq!(events, vec![RosterEvent::FriendAdded(user("a"))]);
        assert!(store.view().is_friend(&uid("a")));

        let events = store.apply_friend_removed(&uid("a")).unwrap();
        assert_eq!(events, vec![RosterEvent::FriendRemoved(uid("a"))]);
        assert!(!store.view().is_friend(&uid("a")));
    }

    #[test]
    fn removing_absent_friend_is_noop() {
        let mut store = store();
        assert!(store.apply_friend_removed(&uid("ghost")).unwrap().is_empty());
    }

    #[test]
    fn identical_re_add_is_silent() {
        let mut store = store();
        store.apply_friend_added(user("a")).unwrap();
        assert!(store.apply_friend_added(user("a")).unwrap().is_empty());
    }

    #[test]
    fn re_add_with_new_profile_reports_change() {
        let mut store = store();
        store.apply_friend_added(user("a")).unwrap();

        let renamed = user("a").with_name("Ann");
        let events = store.apply_friend_added(renamed.clone()).unwrap();
        assert_eq!(events, vec![RosterEvent::FriendProfileChanged(renamed.clone())]);
        assert_eq!(store.view().friend(&uid("a")), Some(&renamed));
    }

    #[test]
    fn friend_added_while_blacklisted_conflicts() {
        let mut store = store();
        store.apply_blacklist_added(block("a")).unwrap();
        let before = store.snapshot();

        let result = store.apply_friend_added(user("a"));

        assert_eq!(result, Err(ApplyError::Conflict(uid("a"))));
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn profile_change_updates_friend_and_block_entries() {
        let mut store = store();
        store.apply_friend_added(user("a")).unwrap();
        store.apply_blacklist_added(block("b")).unwrap();

        let a = user("a").with_icon("a.png");
        let events = store.apply_friend_profile_changed(a.clone()).unwrap();
        assert_eq!(events, vec![RosterEvent::FriendProfileChanged(a.clone())]);
        assert_eq!(store.view().friend(&uid("a")), Some(&a));

        let b = user("b").with_name("Bob");
        store.apply_friend_profile_changed(b.clone()).unwrap();
        let entry = store.view().blacklist().next().unwrap();
        assert_eq!(entry.user, b);
        assert_eq!(entry.blocked_at, 1_700_000_000);
    }

    #[test]
    fn profile_change_for_stranger_is_not_found() {
        let mut store = store();
        let result = store.apply_friend_profile_changed(user("x"));
        assert!(matches!(result, Err(ApplyError::NotFound { .. })));
    }

    #[test]
    fn unchanged_profile_emits_nothing() {
        let mut store = store();
        store.apply_friend_added(user("a")).unwrap();
        assert!(store
            .apply_friend_profile_changed(user("a"))
            .unwrap()
            .is_empty());
    }

    // ===========================================
    // Application Tests
    // ===========================================

    #[test]
    fn accept_scenario_from_empty_roster() {
        let mut store = store();

        store.apply_application_added(incoming("u1")).unwrap();
        store.apply_application_accepted(&uid("u1")).unwrap();

        let snapshot = store.snapshot();
        assert_eq!(snapshot.friend_uids(), vec![uid("u1")]);
        assert_eq!(snapshot.incoming_applications().count(), 0);
    }

    #[test]
    fn accept_emits_friend_added_then_accepted() {
        let mut store = store();
        store.apply_application_added(incoming("u1")).unwrap();

        let events = store.apply_application_accepted(&uid("u1")).unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0], RosterEvent::FriendAdded(user("u1")));
        match &events[1] {
            RosterEvent::ApplicationAccepted(app) => {
                assert_eq!(app.from_uid, uid("u1"));
                assert_eq!(app.status, ApplicationStatus::Accepted);
            }
            other => panic!("Expected ApplicationAccepted, got {:?}", other),
        }
        assert_eq!(
            store.application_state(&uid("u1"), &uid("me")),
            ApplicationState::Accepted
        );
    }

    #[test]
    fn accept_without_pending_is_not_found() {
        let mut store = store();
        let before = store.snapshot();

        let result = store.apply_application_accepted(&uid("u1"));

        assert!(matches!(result, Err(ApplyError::NotFound { .. })));
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn accept_blacklisted_sender_conflicts_atomically() {
        let mut store = store();
        store.apply_application_added(incoming("u1")).unwrap();
        store.apply_blacklist_added(block("u1")).unwrap();
        let before = store.snapshot();

        let result = store.apply_application_accepted(&uid("u1"));

        assert_eq!(result, Err(ApplyError::Conflict(uid("u1"))));
        assert_eq!(store.snapshot(), before);
        assert!(store.view().incoming_from(&uid("u1")).is_some());
    }

    #[test]
    fn accept_outgoing_when_remote_agrees() {
        let mut store = store();
        let app = FriendApplication::outgoing(&uid("me"), user("u2"), "hey");
        store.apply_application_added(app).unwrap();

        let events = store.apply_application_accepted(&uid("u2")).unwrap();

        assert_eq!(events[0], RosterEvent::FriendAdded(user("u2")));
        assert!(store.view().outgoing_to(&uid("u2")).is_none());
        assert!(store.view().is_friend(&uid("u2")));
    }

    #[test]
    fn accept_existing_friend_only_reports_acceptance() {
        let mut store = store();
        store.apply_friend_added(user("u1").with_comment("old pal")).unwrap();
        store.apply_application_added(incoming("u1")).unwrap();

        let events = store.apply_application_accepted(&uid("u1")).unwrap();

        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], RosterEvent::ApplicationAccepted(_)));
        assert_eq!(store.view().friend(&uid("u1")).unwrap().comment, "old pal");
    }

    #[test]
    fn accept_settles_crossed_applications() {
        let mut store = store();
        store.apply_application_added(incoming("u1")).unwrap();
        store
            .apply_application_added(FriendApplication::outgoing(&uid("me"), user("u1"), "hi"))
            .unwrap();

        store.apply_application_accepted(&uid("u1")).unwrap();

        assert!(store.view().incoming_from(&uid("u1")).is_none());
        assert!(store.view().outgoing_to(&uid("u1")).is_none());
        assert_eq!(
            store.application_state(&uid("u1"), &uid("me")),
            ApplicationState::Accepted
        );
        assert_eq!(
            store.application_state(&uid("me"), &uid("u1")),
            ApplicationState::Accepted
        );
    }

    #[test]
    fn reject_removes_pending_without_friend() {
        let mut store = store();
        store.apply_application_added(incoming("u1")).unwrap();

        let events = store.apply_application_rejected(&uid("u1")).unwrap();

        assert!(matches!(events[..], [RosterEvent::ApplicationRejected(_)]));
        assert!(!store.view().is_friend(&uid("u1")));
        assert_eq!(store.view().incoming_applications().count(), 0);
        assert_eq!(
            store.application_state(&uid("u1"), &uid("me")),
            ApplicationState::Rejected
        );
    }

    #[test]
    fn reject_without_pending_is_not_found() {
        let mut store = store();
        assert!(matches!(
            store.apply_application_rejected(&uid("u1")),
            Err(ApplyError::NotFound { .. })
        ));
    }

    #[test]
    fn latest_application_supersedes_prior() {
        let mut store = store();
        store.apply_application_added(incoming("u1")).unwrap();
        let newer = FriendApplication::incoming(user("u1"), &uid("me"), "please?");
        store.apply_application_added(newer).unwrap();

        let pending: Vec<_> = store.view().incoming_applications().collect();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].request_message, "please?");
    }

    #[test]
    fn rejected_pair_restarts_on_new_application() {
        let mut store = store();
        store.apply_application_added(incoming("u1")).unwrap();
        store.apply_application_rejected(&uid("u1")).unwrap();

        store.apply_application_added(incoming("u1")).unwrap();

        assert_eq!(
            store.application_state(&uid("u1"), &uid("me")),
            ApplicationState::Pending
        );
        assert!(store.view().incoming_from(&uid("u1")).is_some());
    }

    #[test]
    fn terminal_record_clears_pending_entry() {
        let mut store = store();
        store.apply_application_added(incoming("u1")).unwrap();

        let rejected = incoming("u1").with_status(ApplicationStatus::Rejected);
        let events = store.apply_application_added(rejected).unwrap();

        assert_eq!(events.len(), 1);
        assert!(store.view().incoming_from(&uid("u1")).is_none());
        assert_eq!(
            store.application_state(&uid("u1"), &uid("me")),
            ApplicationState::Rejected
        );
    }

    #[test]
    fn application_between_strangers_is_unrelated() {
        let mut store = store();
        let app = FriendApplication::incoming(user("a"), &uid("b"), "");
        assert!(matches!(
            store.apply_application_added(app),
            Err(ApplyError::Unrelated { .. })
        ));
    }

    #[test]
    fn self_application_is_unrelated() {
        let mut store = store();
        let app = FriendApplication::incoming(user("me"), &uid("me"), "");
        assert!(matches!(
            store.apply_application_added(app),
            Err(ApplyError::Unrelated { .. })
        ));
    }

    #[test]
    fn direction_is_normalized() {
        let mut store = store();
        let mut app = incoming("u1");
        app.direction = ApplicationDirection::Outgoing;

        store.apply_application_added(app).unwrap();

        let stored = store.view().incoming_from(&uid("u1")).unwrap();
        assert_eq!(stored.direction, ApplicationDirection::Incoming);
    }

    #[test]
    fn deleted_application_leaves_pending_sets() {
        let mut store = store();
        store.apply_application_added(incoming("u1")).unwrap();

        let events = store.apply_application_deleted(&uid("u1")).unwrap();

        assert_eq!(events, vec![RosterEvent::ApplicationDeleted(uid("u1"))]);
        assert_eq!(store.view().unread_application_count(), 0);
        assert!(store.apply_application_deleted(&uid("u1")).unwrap().is_empty());
    }

    #[test]
    fn unread_tracking() {
        let mut store = store();
        store.apply_application_added(incoming("a")).unwrap();
        store.apply_application_added(incoming("b")).unwrap();
        assert_eq!(store.view().unread_application_count(), 2);

        assert_eq!(
            store.apply_applications_read().unwrap(),
            vec![RosterEvent::ApplicationsRead]
        );
        assert_eq!(store.view().unread_application_count(), 0);
        assert!(store.apply_applications_read().unwrap().is_empty());
    }

    // ===========================================
    // Blacklist Tests
    // ===========================================

    #[test]
    fn blacklisting_friend_emits_removal_then_block() {
        let mut store = store();
        store.apply_friend_added(user("a")).unwrap();

        let events = store.apply_blacklist_added(block("a")).unwrap();

        assert_eq!(
            events,
            vec![
                RosterEvent::FriendRemoved(uid("a")),
                RosterEvent::BlacklistAdded(block("a")),
            ]
        );
        assert!(!store.view().is_friend(&uid("a")));
        assert!(store.view().is_blacklisted(&uid("a")));
    }

    #[test]
    fn re_block_is_silent() {
        let mut store = store();
        store.apply_blacklist_added(block("a")).unwrap();
        assert!(store.apply_blacklist_added(block("a")).unwrap().is_empty());
    }

    #[test]
    fn unblock_then_befriend() {
        let mut store = store();
        store.apply_blacklist_added(block("a")).unwrap();

        let events = store.apply_blacklist_removed(&uid("a")).unwrap();
        assert_eq!(events, vec![RosterEvent::BlacklistRemoved(uid("a"))]);

        store.apply_friend_added(user("a")).unwrap();
        assert!(store.view().is_friend(&uid("a")));
        assert!(store.apply_blacklist_removed(&uid("a")).unwrap().is_empty());
    }

    #[test]
    fn friend_blacklist_exclusion_holds_for_any_sequence() {
        // Deterministic pseudo-random walk over a small uid space.
        let uids = ["a", "b", "c", "d"];
        let mut store = store();
        let mut seed: u64 = 0x2545_F491_4F6C_DD1D;

        for _ in 0..2_000 {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            let target = uids[(seed % uids.len() as u64) as usize];
            let delta = match (seed >> 8) % 4 {
                0 => Delta::FriendAdded(user(target)),
                1 => Delta::FriendRemoved(uid(target)),
                2 => Delta::BlacklistAdded(block(target)),
                _ => Delta::BlacklistRemoved(uid(target)),
            };
            let _ = store.apply(delta);
            assert!(store.view().check_invariants().is_ok());
        }
    }

    // ===========================================
    // Replay and Resync Tests
    // ===========================================

    #[test]
    fn replay_from_snapshot_matches_direct_stream() {
        let mut direct = store();
        direct.apply_friend_added(user("f1")).unwrap();
        direct.apply_application_added(incoming("u1")).unwrap();
        let checkpoint = direct.snapshot();

        let stream = vec![
            Delta::ApplicationAdded(incoming("u2")),
            Delta::ApplicationAccepted(uid("u1")),
            Delta::BlacklistAdded(block("f1")),
            Delta::FriendProfileChanged(user("u1").with_name("Una")),
            Delta::ApplicationsRead,
            Delta::ApplicationRejected(uid("u2")),
            Delta::BlacklistRemoved(uid("f1")),
            Delta::FriendAdded(user("f1")),
        ];

        let mut replayed = RosterStore::from_snapshot(uid("me"), checkpoint).unwrap();
        for delta in stream {
            let a = direct.apply(delta.clone());
            let b = replayed.apply(delta);
            assert_eq!(a, b);
        }

        assert_eq!(direct.snapshot(), replayed.snapshot());
    }

    #[test]
    fn from_snapshot_rejects_conflicting_snapshot() {
        let snapshot =
            RosterSnapshot::from_parts(vec![user("x")], vec![], vec![block("x")]);
        assert!(matches!(
            RosterStore::from_snapshot(uid("me"), snapshot),
            Err(ApplyError::Conflict(_))
        ));
    }

    #[test]
    fn from_snapshot_restores_pending_pairs() {
        let mut original = store();
        original.apply_application_added(incoming("u1")).unwrap();

        let mut resumed = RosterStore::from_snapshot(uid("me"), original.snapshot()).unwrap();

        assert_eq!(
            resumed.application_state(&uid("u1"), &uid("me")),
            ApplicationState::Pending
        );
        assert!(resumed.apply_application_accepted(&uid("u1")).is_ok());
    }

    #[test]
    fn reset_replaces_roster_and_carries_read_state() {
        let mut store = store();
        store.apply_application_added(incoming("old")).unwrap();
        store.apply_applications_read().unwrap();

        let fresh = RosterSnapshot::from_parts(
            vec![user("f")],
            vec![incoming("old"), incoming("new")],
            vec![],
        );
        let events = store.reset(fresh).unwrap();

        assert_eq!(events, vec![RosterEvent::Reset]);
        assert_eq!(store.view().friend_uids(), vec![uid("f")]);
        // "old" was already read, "new" was never seen
        assert_eq!(store.view().unread_application_count(), 1);
        assert_eq!(
            store.application_state(&uid("new"), &uid("me")),
            ApplicationState::Pending
        );
    }

    #[test]
    fn reset_with_conflict_changes_nothing() {
        let mut store = store();
        store.apply_friend_added(user("keep")).unwrap();
        let before = store.snapshot();

        let bad = RosterSnapshot::from_parts(vec![user("x")], vec![], vec![block("x")]);

        assert!(store.reset(bad).is_err());
        assert_eq!(store.snapshot(), before);
    }

    // ===========================================
    // Resync Tests
    // ===========================================

    #[test]
    fn delta_during_resync_survives_stale_snapshot() {
        let mut store = store();
        let token = store.begin_resync();
        store.apply(Delta::FriendAdded(user("x"))).unwrap();

        let stale = RosterSnapshot::from_parts(vec![user("f")], vec![], vec![]);
        let events = store.finish_resync(token, stale).unwrap();

        assert_eq!(events, vec![RosterEvent::Reset]);
        assert_eq!(store.view().friend_uids(), vec![uid("f"), uid("x")]);
        assert_eq!(store.open_resyncs(), 0);
    }

    #[test]
    fn delta_before_resync_is_not_replayed() {
        let mut store = store();
        store.apply(Delta::FriendAdded(user("gone"))).unwrap();
        let token = store.begin_resync();

        store.finish_resync(token, RosterSnapshot::new()).unwrap();

        assert!(store.view().friend_uids().is_empty());
    }

    #[test]
    fn replayed_delta_already_in_snapshot_is_harmless() {
        let mut store = store();
        let token = store.begin_resync();
        store.apply(Delta::FriendAdded(user("x"))).unwrap();
        store.apply(Delta::FriendRemoved(uid("y"))).unwrap();

        let fresh = RosterSnapshot::from_parts(vec![user("x")], vec![], vec![]);
        let events = store.finish_resync(token, fresh).unwrap();

        assert_eq!(events, vec![RosterEvent::Reset]);
        assert_eq!(store.view().friend_uids(), vec![uid("x")]);
    }

    #[test]
    fn overlapping_resyncs_replay_their_own_window() {
        let mut store = store();
        let first = store.begin_resync();
        store.apply(Delta::FriendAdded(user("a"))).unwrap();
        let second = store.begin_resync();
        store.apply(Delta::FriendAdded(user("b"))).unwrap();

        store.finish_resync(first, RosterSnapshot::new()).unwrap();
        assert_eq!(store.view().friend_uids(), vec![uid("a"), uid("b")]);
        assert_eq!(store.open_resyncs(), 1);

        // still journaled for the second resync
        store.apply(Delta::FriendAdded(user("c"))).unwrap();

        store.finish_resync(second, RosterSnapshot::new()).unwrap();
        assert_eq!(store.view().friend_uids(), vec![uid("b"), uid("c")]);
        assert_eq!(store.open_resyncs(), 0);
    }

    #[test]
    fn abort_closes_resync_and_drops_journal() {
        let mut store = store();
        let token = store.begin_resync();
        store.apply(Delta::FriendAdded(user("x"))).unwrap();
        store.abort_resync(token);
        assert_eq!(store.open_resyncs(), 0);

        let token = store.begin_resync();
        store.finish_resync(token, RosterSnapshot::new()).unwrap();

        assert!(store.view().friend_uids().is_empty());
    }

    #[test]
    fn conflicting_resync_changes_nothing_and_closes() {
        let mut store = store();
        store.apply_friend_added(user("keep")).unwrap();
        let token = store.begin_resync();
        store.apply(Delta::FriendAdded(user("x"))).unwrap();
        let before = store.snapshot();

        let bad = RosterSnapshot::from_parts(vec![user("z")], vec![], vec![block("z")]);

        assert_eq!(
            store.finish_resync(token, bad),
            Err(ApplyError::Conflict(uid("z")))
        );
        assert_eq!(store.snapshot(), before);
        assert_eq!(store.open_resyncs(), 0);
    }

    #[test]
    fn apply_error_display() {
        let err = ApplyError::NotFound {
            what: "pending application",
            uid: uid("u1"),
        };
        assert_eq!(err.to_string(), "pending application not found for u1");
    }
}
