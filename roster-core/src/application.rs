//! Friend application state machine.
//!
//! Each `(from, to)` pair moves through:
//!
//! ```text
//! None ──Applied──► Pending ──Accepted──► Accepted
//!                      │ └────Rejected──► Rejected
//!                      └──Withdrawn────► None
//! ```
//!
//! Accepted and Rejected are terminal until a new application restarts the
//! pair at Pending. Like the rest of this crate, transitions are pure.

use std::collections::BTreeMap;

use roster_types::Uid;

use crate::RosterSnapshot;

/// State of one application pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApplicationState {
    /// No application between the pair.
    #[default]
    None,
    /// An application awaits a decision.
    Pending,
    /// The last application was accepted.
    Accepted,
    /// The last application was rejected.
    Rejected,
}

/// Inputs to the application state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationEvent {
    /// A new application was made.
    Applied,
    /// The pending application was accepted.
    Accepted,
    /// The pending application was rejected.
    Rejected,
    /// The pending application was deleted before a decision.
    Withdrawn,
}

impl ApplicationState {
    /// Process an event and return the new state plus whether the
    /// transition was legal. Illegal transitions keep the current state.
    pub fn on_event(self, event: ApplicationEvent) -> (Self, bool) {
        match (self, event) {
            // A new application always restarts the cycle
            (_, ApplicationEvent::Applied) => (Self::Pending, true),

            (Self::Pending, ApplicationEvent::Accepted) => (Self::Accepted, true),
            (Self::Pending, ApplicationEvent::Rejected) => (Self::Rejected, true),
            (Self::Pending, ApplicationEvent::Withdrawn) => (Self::None, true),

            (state, _) => (state, false),
        }
    }

    /// Whether this state ends the pair's current cycle.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected)
    }
}

/// Per-pair application states for the local user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationLedger {
    pairs: BTreeMap<(Uid, Uid), ApplicationState>,
}

impl ApplicationLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a ledger with every pending application in a snapshot.
    pub fn from_snapshot(snapshot: &RosterSnapshot) -> Self {
        let pairs = snapshot
            .incoming_applications()
            .chain(snapshot.outgoing_applications())
            .map(|app| (app.pair(), ApplicationState::Pending))
            .collect();
        Self { pairs }
    }

    /// Current state of a pair.
    pub fn state(&self, from: &Uid, to: &Uid) -> ApplicationState {
        self.pairs
            .get(&(from.clone(), to.clone()))
            .copied()
            .unwrap_or_default()
    }

    /// Check whether `event` is legal for the pair without applying it.
    pub fn can_apply(&self, from: &Uid, to: &Uid, event: ApplicationEvent) -> bool {
        self.state(from, to).on_event(event).1
    }

    /// Apply an event to a pair. Returns false (and changes nothing) if the
    /// transition is illegal.
    pub fn apply(&mut self, from: &Uid, to: &Uid, event: ApplicationEvent) -> bool {
        let key = (from.clone(), to.clone());
        let current = self.pairs.get(&key).copied().unwrap_or_default();
        let (next, legal) = current.on_event(event);
        if legal {
            if next == ApplicationState::None {
                self.pairs.remove(&key);
            } else {
                self.pairs.insert(key, next);
            }
        }
        legal
    }

    /// Forget pending pairs, keeping terminal history.
    pub(crate) fn clear_pending(&mut self) {
        self.pairs.retain(|_, state| state.is_terminal());
    }

    /// Mark a pair pending (used when adopting a resynced snapshot).
    pub(crate) fn mark_pending(&mut self, from: &Uid, to: &Uid) {
        self.pairs
            .insert((from.clone(), to.clone()), ApplicationState::Pending);
    }
}
