//! Call engine boundary.
//!
//! The call engine owns the live session and reports roster changes as
//! events. The layout controller consumes it through [`CallEngine`]: one
//! snapshot to seed the roster, plus a subscription that delivers
//! join/leave/update notifications with no ordering or exactly-once
//! guarantee. Dropping an [`EngineSubscription`] releases it.

use common::types::{Participant, SessionId};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Roster notification from the call engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "participant")]
pub enum EngineEvent {
    /// A participant joined the session.
    #[serde(rename = "participant-joined")]
    Joined(Participant),
    /// A participant left the session.
    #[serde(rename = "participant-left")]
    Left(Participant),
    /// A participant's role or media state changed.
    #[serde(rename = "participant-updated")]
    Updated(Participant),
}

impl EngineEvent {
    /// Wire name of the event, also used as a metrics label.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            EngineEvent::Joined(_) => "participant-joined",
            EngineEvent::Left(_) => "participant-left",
            EngineEvent::Updated(_) => "participant-updated",
        }
    }

    /// Participant the event refers to.
    #[must_use]
    pub fn participant(&self) -> &Participant {
        match self {
            EngineEvent::Joined(p) | EngineEvent::Left(p) | EngineEvent::Updated(p) => p,
        }
    }
}

/// Full roster as known by the engine, tagged with the session it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub session_id: SessionId,
    pub participants: Vec<Participant>,
}

/// Live event stream for one session.
#[derive(Debug)]
pub struct EngineSubscription {
    receiver: mpsc::Receiver<EngineEvent>,
}

impl EngineSubscription {
    /// Wrap the receiving half of an engine event channel.
    #[must_use]
    pub fn new(receiver: mpsc::Receiver<EngineEvent>) -> Self {
        Self { receiver }
    }

    /// Receive the next event, or `None` once the engine closes the stream.
    pub async fn recv(&mut self) -> Option<EngineEvent> {
        self.receiver.recv().await
    }

    /// Stop accepting further events. Events already buffered can still be
    /// drained with [`EngineSubscription::recv`].
    pub fn close(&mut self) {
        self.receiver.close();
    }
}

/// Source of roster data for one call session.
pub trait CallEngine: Send + Sync {
    /// Session this engine instance serves.
    fn session_id(&self) -> SessionId;

    /// Current full roster.
    fn snapshot(&self) -> Snapshot;

    /// Open a new event subscription holding at most `buffer` undelivered
    /// events.
    ///
    /// Events published after this call returns are delivered to the
    /// subscription. Events published before it are only reflected in a
    /// later [`CallEngine::snapshot`].
    fn subscribe(&self, buffer: usize) -> EngineSubscription;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use common::types::Role;

    #[test]
    fn test_event_names() {
        let p = Participant::new("1", "One");
        assert_eq!(EngineEvent::Joined(p.clone()).name(), "participant-joined");
        assert_eq!(EngineEvent::Left(p.clone()).name(), "participant-left");
        assert_eq!(EngineEvent::Updated(p).name(), "participant-updated");
    }

    #[test]
    fn test_event_wire_format() {
        let event = EngineEvent::Joined(Participant::new("7", "Seven").with_role(Role::SideA));
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["event"], "participant-joined");
        assert_eq!(json["participant"]["id"], "7");
        assert_eq!(json["participant"]["role"], "side-a");

        let back: EngineEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_event_decodes_role_aliases() {
        for (tag, expected) in [
            ("judge", Role::Arbiter),
            ("Arbiter", Role::Arbiter),
            ("negative", Role::SideA),
        ] {
            let json = format!(
                r#"{{"event":"participant-joined","participant":{{"id":"x","display_name":"X","role":"{tag}"}}}}"#
            );
            let event: EngineEvent = serde_json::from_str(&json).unwrap();
            assert_eq!(event.participant().role, Some(expected), "tag {tag}");
        }
    }

    #[test]
    fn test_snapshot_decodes_role_aliases() {
        let session_id = SessionId::new();
        let json = format!(
            r#"{{"session_id":"{session_id}","participants":[
                {{"id":"n","display_name":"N","role":"negative"}},
                {{"id":"a","display_name":"A","role":"Affirmative"}},
                {{"id":"j","display_name":"J","role":"judge"}}
            ]}}"#
        );
        let snapshot: Snapshot = serde_json::from_str(&json).unwrap();

        assert_eq!(snapshot.session_id, session_id);
        let roles: Vec<_> = snapshot.participants.iter().map(|p| p.role).collect();
        assert_eq!(
            roles,
            vec![Some(Role::SideA), Some(Role::SideB), Some(Role::Arbiter)]
        );
    }

    #[tokio::test]
    async fn test_subscription_drop_closes_sender() {
        let (tx, rx) = mpsc::channel(4);
        let mut sub = EngineSubscription::new(rx);

        tx.send(EngineEvent::Left(Participant::new("1", "One")))
            .await
            .unwrap();
        assert_eq!(sub.recv().await.unwrap().participant().id.as_str(), "1");

        drop(sub);
        assert!(tx.is_closed());
    }
}
