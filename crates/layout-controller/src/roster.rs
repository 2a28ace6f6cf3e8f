//! Roster store: the de-duplicated, ordered list of joined participants.
//!
//! The call engine gives no exactly-once or ordering guarantee for its
//! join/leave notifications, so every operation here is idempotent and
//! infallible. Whatever sequence of events arrives, the store holds the last
//! known good roster.
//!
//! The store is a plain owned value. It is mutated by exactly one session
//! actor; readers outside the event path get a copy via [`RosterStore::snapshot`].

use crate::engine::Snapshot;

use common::types::{Participant, ParticipantId, SessionId};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of applying one event to the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterChange {
    /// Roster was replaced wholesale from a snapshot.
    Reset,
    /// A participant was appended.
    Joined,
    /// A participant was removed.
    Left,
    /// An existing participant's details were replaced in place.
    Updated,
    /// Event was a duplicate or referred to an absent participant.
    Unchanged,
    /// Snapshot belonged to a different session and was dropped.
    StaleDiscarded,
}

impl RosterChange {
    /// Whether the roster content changed and the layout must be recomputed.
    #[must_use]
    pub const fn is_mutation(&self) -> bool {
        matches!(
            self,
            RosterChange::Reset | RosterChange::Joined | RosterChange::Left | RosterChange::Updated
        )
    }

    /// Label value for metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            RosterChange::Reset => "reset",
            RosterChange::Joined => "joined",
            RosterChange::Left => "left",
            RosterChange::Updated => "updated",
            RosterChange::Unchanged => "unchanged",
            RosterChange::StaleDiscarded => "stale",
        }
    }
}

/// Ordered, id-unique list of joined participants for one call session.
#[derive(Debug, Clone)]
pub struct RosterStore {
    session_id: SessionId,
    participants: Vec<Arc<Participant>>,
}

impl RosterStore {
    /// Create an empty roster bound to a session.
    #[must_use]
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            participants: Vec::new(),
        }
    }

    /// Session this roster belongs to.
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Replace the roster with `snapshot`, keeping its order.
    ///
    /// If the snapshot repeats an id, the first occurrence wins.
    pub fn initialize(&mut self, snapshot: Vec<Participant>) -> RosterChange {
        let mut seen = HashSet::with_capacity(snapshot.len());
        let mut participants = Vec::with_capacity(snapshot.len());
        let mut duplicates = 0usize;

        for participant in snapshot {
            if seen.insert(participant.id.clone()) {
                participants.push(Arc::new(participant));
            } else {
                duplicates += 1;
            }
        }

        if duplicates > 0 {
            warn!(
                target: "lc.roster",
                session_id = %self.session_id,
                duplicates,
                "Snapshot contained duplicate participant ids, kept first occurrence"
            );
        }

        self.participants = participants;

        debug!(
            target: "lc.roster",
            session_id = %self.session_id,
            participants = self.participants.len(),
            "Roster initialized from snapshot"
        );

        RosterChange::Reset
    }

    /// Apply a session-tagged snapshot, discarding it if it belongs to
    /// another session.
    pub fn apply_snapshot(&mut self, snapshot: Snapshot) -> RosterChange {
        if snapshot.session_id != self.session_id {
            warn!(
                target: "lc.roster",
                session_id = %self.session_id,
                snapshot_session_id = %snapshot.session_id,
                "Discarding snapshot from a different session"
            );
            return RosterChange::StaleDiscarded;
        }
        self.initialize(snapshot.participants)
    }

    /// Append a participant unless one with the same id is already present.
    pub fn on_join(&mut self, participant: Participant) -> RosterChange {
        if self.contains(&participant.id) {
            debug!(
                target: "lc.roster",
                session_id = %self.session_id,
                participant_id = %participant.id,
                "Duplicate join ignored"
            );
            return RosterChange::Unchanged;
        }

        self.participants.push(Arc::new(participant));
        RosterChange::Joined
    }

    /// Remove the participant with this id, if present.
    pub fn on_leave(&mut self, id: &ParticipantId) -> RosterChange {
        let before = self.participants.len();
        self.participants.retain(|p| &p.id != id);

        if self.participants.len() == before {
            debug!(
                target: "lc.roster",
                session_id = %self.session_id,
                participant_id = %id,
                "Leave for absent participant ignored"
            );
            RosterChange::Unchanged
        } else {
            RosterChange::Left
        }
    }

    /// Replace an existing participant's details in place (role or media change).
    ///
    /// Updates for absent participants are ignored, so a late update never
    /// brings back someone who already left.
    pub fn on_update(&mut self, participant: Participant) -> RosterChange {
        match self.participants.iter_mut().find(|p| p.id == participant.id) {
            Some(existing) if **existing == participant => RosterChange::Unchanged,
            Some(existing) => {
                *existing = Arc::new(participant);
                RosterChange::Updated
            }
            None => {
                debug!(
                    target: "lc.roster",
                    session_id = %self.session_id,
                    participant_id = %participant.id,
                    "Update for absent participant ignored"
                );
                RosterChange::Unchanged
            }
        }
    }

    /// Read-only view of the roster in order.
    #[must_use]
    pub fn current(&self) -> &[Arc<Participant>] {
        &self.participants
    }

    /// Owned copy of the roster for consumers outside the event path.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Arc<Participant>> {
        self.participants.clone()
    }

    /// Whether a participant with this id is present.
    #[must_use]
    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.participants.iter().any(|p| &p.id == id)
    }

    /// Number of joined participants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    /// Whether the roster is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use common::types::{MediaState, Role};

    fn p(id: &str) -> Participant {
        Participant::new(id, format!("Participant {id}"))
    }

    fn ids(store: &RosterStore) -> Vec<&str> {
        store.current().iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_join_appends_in_order() {
        let mut store = RosterStore::new(SessionId::new());
        assert_eq!(store.on_join(p("1")), RosterChange::Joined);
        assert_eq!(store.on_join(p("2")), RosterChange::Joined);
        assert_eq!(ids(&store), vec!["1", "2"]);
    }

    #[test]
    fn test_join_is_idempotent() {
        let mut store = RosterStore::new(SessionId::new());
        store.on_join(p("1"));
        let once = store.snapshot();

        assert_eq!(store.on_join(p("1")), RosterChange::Unchanged);
        assert_eq!(store.snapshot(), once);
    }

    #[test]
    fn test_duplicate_join_keeps_original_details() {
        let mut store = RosterStore::new(SessionId::new());
        store.on_join(p("1").with_role(Role::SideA));
        store.on_join(p("1").with_role(Role::SideB));
        assert_eq!(store.current()[0].role, Some(Role::SideA));
    }

    #[test]
    fn test_leave_absent_is_noop() {
        let mut store = RosterStore::new(SessionId::new());
        store.on_join(p("1"));
        store.on_join(p("2"));

        assert_eq!(store.on_leave(&"3".into()), RosterChange::Unchanged);
        assert_eq!(ids(&store), vec!["1", "2"]);
    }

    #[test]
    fn test_double_leave_is_noop() {
        let mut store = RosterStore::new(SessionId::new());
        store.on_join(p("1"));
        assert_eq!(store.on_leave(&"1".into()), RosterChange::Left);
        assert_eq!(store.on_leave(&"1".into()), RosterChange::Unchanged);
        assert!(store.is_empty());
    }

    #[test]
    fn test_join_join_leave_yields_empty_roster() {
        let mut store = RosterStore::new(SessionId::new());
        store.on_join(p("9"));
        store.on_join(p("9"));
        store.on_leave(&"9".into());
        assert!(store.current().is_empty());
    }

    #[test]
    fn test_leave_before_join_does_not_block_later_join() {
        let mut store = RosterStore::new(SessionId::new());
        assert_eq!(store.on_leave(&"7".into()), RosterChange::Unchanged);
        assert_eq!(store.on_join(p("7")), RosterChange::Joined);
        assert!(store.contains(&"7".into()));
    }

    #[test]
    fn test_initialize_replaces_wholesale() {
        let mut store = RosterStore::new(SessionId::new());
        store.on_join(p("old"));

        let change = store.initialize(vec![p("c"), p("a"), p("b")]);

        assert_eq!(change, RosterChange::Reset);
        assert_eq!(ids(&store), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_initialize_drops_duplicate_ids() {
        let mut store = RosterStore::new(SessionId::new());
        store.initialize(vec![
            p("a").with_role(Role::Arbiter),
            p("b"),
            p("a").with_role(Role::Solo),
        ]);
        assert_eq!(ids(&store), vec!["a", "b"]);
        assert_eq!(store.current()[0].role, Some(Role::Arbiter));
    }

    #[test]
    fn test_apply_snapshot_discards_other_session() {
        let session = SessionId::new();
        let mut store = RosterStore::new(session);
        store.on_join(p("live"));

        let stale = Snapshot {
            session_id: SessionId::new(),
            participants: vec![p("ghost")],
        };
        assert_eq!(store.apply_snapshot(stale), RosterChange::StaleDiscarded);
        assert_eq!(ids(&store), vec!["live"]);

        let fresh = Snapshot {
            session_id: session,
            participants: vec![p("x")],
        };
        assert_eq!(store.apply_snapshot(fresh), RosterChange::Reset);
        assert_eq!(ids(&store), vec!["x"]);
    }

    #[test]
    fn test_update_replaces_in_place() {
        let mut store = RosterStore::new(SessionId::new());
        store.on_join(p("1"));
        store.on_join(p("2"));

        let updated = p("1").with_role(Role::SideB).with_media(MediaState {
            audio_enabled: true,
            video_enabled: true,
        });
        assert_eq!(store.on_update(updated.clone()), RosterChange::Updated);
        assert_eq!(ids(&store), vec!["1", "2"]);
        assert_eq!(*store.current()[0], updated);

        assert_eq!(store.on_update(updated), RosterChange::Unchanged);
    }

    #[test]
    fn test_update_absent_does_not_resurrect() {
        let mut store = RosterStore::new(SessionId::new());
        store.on_join(p("1"));
        store.on_leave(&"1".into());
        assert_eq!(store.on_update(p("1")), RosterChange::Unchanged);
        assert!(store.is_empty());
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let mut store = RosterStore::new(SessionId::new());
        store.on_join(p("1"));
        let copy = store.snapshot();
        store.on_leave(&"1".into());
        assert_eq!(copy.len(), 1);
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_change_classification() {
        assert!(RosterChange::Reset.is_mutation());
        assert!(RosterChange::Joined.is_mutation());
        assert!(RosterChange::Left.is_mutation());
        assert!(RosterChange::Updated.is_mutation());
        assert!(!RosterChange::Unchanged.is_mutation());
        assert!(!RosterChange::StaleDiscarded.is_mutation());
    }
}
