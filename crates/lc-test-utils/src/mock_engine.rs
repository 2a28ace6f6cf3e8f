//! In-memory call engine for Layout Controller testing.
//!
//! Keeps its own roster so [`CallEngine::snapshot`] reflects every event it
//! has emitted, and fans events out to every live subscription.
//!
//! # Example
//!
//! ```rust,ignore
//! use lc_test_utils::MockCallEngine;
//!
//! let engine = MockCallEngine::new();
//! let mut sub = engine.subscribe(16);
//!
//! engine.join(Participant::new("1", "One")).await;
//! assert_eq!(engine.active_subscriptions(), 1);
//!
//! drop(sub);
//! assert_eq!(engine.active_subscriptions(), 0);
//! ```

use common::types::{Participant, SessionId};
use layout_controller::engine::{CallEngine, EngineEvent, EngineSubscription, Snapshot};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Mock call engine for testing layout sessions.
#[derive(Debug, Clone)]
pub struct MockCallEngine {
    inner: Arc<Mutex<MockEngineInner>>,
}

#[derive(Debug)]
struct MockEngineInner {
    session_id: SessionId,
    participants: Vec<Participant>,
    subscribers: Vec<mpsc::Sender<EngineEvent>>,
    subscribe_calls: usize,
}

impl Default for MockCallEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCallEngine {
    /// Create an engine for a fresh session with an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockEngineInner {
                session_id: SessionId::new(),
                participants: Vec::new(),
                subscribers: Vec::new(),
                subscribe_calls: 0,
            })),
        }
    }

    /// Seed the roster returned by the first snapshot.
    #[must_use]
    pub fn with_participants(self, participants: impl IntoIterator<Item = Participant>) -> Self {
        self.inner.lock().unwrap().participants = participants.into_iter().collect();
        self
    }

    /// Use a fixed session ID.
    #[must_use]
    pub fn with_session_id(self, session_id: SessionId) -> Self {
        self.inner.lock().unwrap().session_id = session_id;
        self
    }

    /// Participant joins: recorded in the engine roster and delivered.
    pub async fn join(&self, participant: Participant) {
        self.emit(EngineEvent::Joined(participant)).await;
    }

    /// Participant leaves: removed from the engine roster and delivered.
    pub async fn leave(&self, participant: Participant) {
        self.emit(EngineEvent::Left(participant)).await;
    }

    /// Participant details change: replaced in the engine roster and delivered.
    pub async fn update(&self, participant: Participant) {
        self.emit(EngineEvent::Updated(participant)).await;
    }

    /// Apply `event` to the engine roster, then deliver it to all subscribers.
    pub async fn emit(&self, event: EngineEvent) {
        {
            let mut inner = self.inner.lock().unwrap();
            let participants = &mut inner.participants;
            match &event {
                EngineEvent::Joined(p) => {
                    if !participants.iter().any(|existing| existing.id == p.id) {
                        participants.push(p.clone());
                    }
                }
                EngineEvent::Left(p) => participants.retain(|existing| existing.id != p.id),
                EngineEvent::Updated(p) => {
                    if let Some(existing) = participants.iter_mut().find(|e| e.id == p.id) {
                        *existing = p.clone();
                    }
                }
            }
        }
        self.deliver(event).await;
    }

    /// Deliver `event` to subscribers without touching the engine roster.
    /// Use this for redelivered or out-of-order notifications.
    pub async fn deliver(&self, event: EngineEvent) {
        let senders: Vec<_> = {
            let mut inner = self.inner.lock().unwrap();
            inner.subscribers.retain(|tx| !tx.is_closed());
            inner.subscribers.clone()
        };

        for tx in senders {
            // Subscriber may have been dropped since the retain
            let _ = tx.send(event.clone()).await;
        }
    }

    /// End the call: every subscription sees the end of its stream.
    pub fn end_session(&self) {
        self.inner.lock().unwrap().subscribers.clear();
    }

    /// Snapshot of the current roster tagged with a different session, as
    /// a delayed response from a replaced session would be.
    #[must_use]
    pub fn stale_snapshot(&self) -> Snapshot {
        let inner = self.inner.lock().unwrap();
        Snapshot {
            session_id: SessionId::new(),
            participants: inner.participants.clone(),
        }
    }

    /// Subscriptions whose receiving half is still alive.
    #[must_use]
    pub fn active_subscriptions(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.subscribers.iter().filter(|tx| !tx.is_closed()).count()
    }

    /// Event bound of each live subscription, in subscription order.
    #[must_use]
    pub fn subscription_capacities(&self) -> Vec<usize> {
        let inner = self.inner.lock().unwrap();
        inner
            .subscribers
            .iter()
            .filter(|tx| !tx.is_closed())
            .map(mpsc::Sender::max_capacity)
            .collect()
    }

    /// Number of times `subscribe` has been called.
    #[must_use]
    pub fn subscribe_calls(&self) -> usize {
        self.inner.lock().unwrap().subscribe_calls
    }

    /// Current engine roster.
    #[must_use]
    pub fn participants(&self) -> Vec<Participant> {
        self.inner.lock().unwrap().participants.clone()
    }
}

impl CallEngine for MockCallEngine {
    fn session_id(&self) -> SessionId {
        self.inner.lock().unwrap().session_id
    }

    fn snapshot(&self) -> Snapshot {
        let inner = self.inner.lock().unwrap();
        Snapshot {
            session_id: inner.session_id,
            participants: inner.participants.clone(),
        }
    }

    fn subscribe(&self, buffer: usize) -> EngineSubscription {
        let mut inner = self.inner.lock().unwrap();
        let (tx, rx) = mpsc::channel(buffer.max(1));
        inner.subscribers.push(tx);
        inner.subscribe_calls += 1;
        EngineSubscription::new(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_emit_updates_roster_and_subscribers() {
        let engine = MockCallEngine::new();
        let mut sub = engine.subscribe(8);

        engine.join(Participant::new("1", "One")).await;
        engine.join(Participant::new("1", "One")).await;

        assert_eq!(engine.participants().len(), 1);
        assert!(matches!(sub.recv().await, Some(EngineEvent::Joined(_))));
        assert!(matches!(sub.recv().await, Some(EngineEvent::Joined(_))));
    }

    #[tokio::test]
    async fn test_deliver_leaves_roster_untouched() {
        let engine = MockCallEngine::new().with_participants([Participant::new("1", "One")]);
        let mut sub = engine.subscribe(8);

        engine.deliver(EngineEvent::Left(Participant::new("1", "One"))).await;

        assert_eq!(engine.snapshot().participants.len(), 1);
        assert!(matches!(sub.recv().await, Some(EngineEvent::Left(_))));
    }

    #[tokio::test]
    async fn test_subscription_tracking() {
        let engine = MockCallEngine::new();
        let first = engine.subscribe(4);
        let mut second = engine.subscribe(32);
        assert_eq!(engine.active_subscriptions(), 2);
        assert_eq!(engine.subscription_capacities(), vec![4, 32]);

        drop(first);
        assert_eq!(engine.active_subscriptions(), 1);

        engine.end_session();
        assert_eq!(engine.active_subscriptions(), 0);
        assert!(second.recv().await.is_none());
        assert_eq!(engine.subscribe_calls(), 2);
    }

    #[test]
    fn test_stale_snapshot_has_other_session() {
        let engine = MockCallEngine::new();
        assert_ne!(engine.stale_snapshot().session_id, engine.session_id());
    }
}
