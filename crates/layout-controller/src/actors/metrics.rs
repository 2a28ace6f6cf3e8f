//! Actor metrics and mailbox monitoring.
//!
//! | Actor Type | Normal | Warning | Critical |
//! |------------|--------|---------|----------|
//! | Controller | < 32   | 32-128  | > 128    |
//! | Session    | < 64   | 64-192  | > 192    |
//!
//! Session thresholds sit below the default event buffer so a lagging
//! session is reported before the engine starts blocking on it.

use crate::observability::metrics as prom;

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Mailbox depth thresholds for the controller actor.
pub const CONTROLLER_MAILBOX_NORMAL: usize = 32;
pub const CONTROLLER_MAILBOX_WARNING: usize = 128;

/// Mailbox depth thresholds for session actors.
pub const SESSION_MAILBOX_NORMAL: usize = 64;
pub const SESSION_MAILBOX_WARNING: usize = 192;

/// Actor type for metrics labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorType {
    /// `LayoutControllerActor` (singleton).
    Controller,
    /// `LayoutSessionActor` (one per call session).
    Session,
}

impl ActorType {
    /// Returns the actor type as a string for metric labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ActorType::Controller => "controller",
            ActorType::Session => "session",
        }
    }

    /// Returns the warning threshold for this actor type.
    #[must_use]
    pub const fn warning_threshold(&self) -> usize {
        match self {
            ActorType::Controller => CONTROLLER_MAILBOX_WARNING,
            ActorType::Session => SESSION_MAILBOX_WARNING,
        }
    }

    /// Returns the normal threshold for this actor type.
    #[must_use]
    pub const fn normal_threshold(&self) -> usize {
        match self {
            ActorType::Controller => CONTROLLER_MAILBOX_NORMAL,
            ActorType::Session => SESSION_MAILBOX_NORMAL,
        }
    }
}

/// Mailbox depth level for alerting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailboxLevel {
    /// Below normal threshold.
    Normal,
    /// Between normal and warning thresholds.
    Warning,
    /// Above warning threshold.
    Critical,
}

/// Tracks queue depth for one actor and emits the depth gauge.
#[derive(Debug)]
pub struct MailboxMonitor {
    actor_type: ActorType,
    /// Session ID, or "controller".
    actor_id: String,
    depth: AtomicUsize,
    peak_depth: AtomicUsize,
    messages_processed: AtomicU64,
}

impl MailboxMonitor {
    #[must_use]
    pub fn new(actor_type: ActorType, actor_id: impl Into<String>) -> Self {
        Self {
            actor_type,
            actor_id: actor_id.into(),
            depth: AtomicUsize::new(0),
            peak_depth: AtomicUsize::new(0),
            messages_processed: AtomicU64::new(0),
        }
    }

    /// Record that a message was taken off the queue with `queued` more
    /// still waiting behind it.
    pub fn record_received(&self, queued: usize) {
        let depth = queued.saturating_add(1);
        self.depth.store(depth, Ordering::Relaxed);
        self.peak_depth.fetch_max(depth, Ordering::Relaxed);
        prom::set_actor_mailbox_depth(self.actor_type.as_str(), depth);

        match self.level_for_depth(depth) {
            MailboxLevel::Critical => {
                warn!(
                    target: "lc.actor.mailbox",
                    actor_type = self.actor_type.as_str(),
                    actor_id = %self.actor_id,
                    depth,
                    threshold = self.actor_type.warning_threshold(),
                    "Mailbox depth critical"
                );
            }
            MailboxLevel::Warning if depth == self.actor_type.normal_threshold() + 1 => {
                debug!(
                    target: "lc.actor.mailbox",
                    actor_type = self.actor_type.as_str(),
                    actor_id = %self.actor_id,
                    depth,
                    "Mailbox depth elevated"
                );
            }
            _ => {}
        }
    }

    /// Record that the message taken off the queue has been handled.
    pub fn record_processed(&self) {
        let _ = self
            .depth
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |d| {
                Some(d.saturating_sub(1))
            });
        self.messages_processed.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn current_depth(&self) -> usize {
        self.depth.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn peak_depth(&self) -> usize {
        self.peak_depth.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn messages_processed(&self) -> u64 {
        self.messages_processed.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn current_level(&self) -> MailboxLevel {
        self.level_for_depth(self.current_depth())
    }

    fn level_for_depth(&self, depth: usize) -> MailboxLevel {
        if depth > self.actor_type.warning_threshold() {
            MailboxLevel::Critical
        } else if depth > self.actor_type.normal_threshold() {
            MailboxLevel::Warning
        } else {
            MailboxLevel::Normal
        }
    }
}

/// Aggregated counters for the actor system, shared by the controller and
/// every session it spawns.
#[derive(Debug, Default)]
pub struct ActorMetrics {
    /// Sessions currently running.
    pub active_sessions: AtomicUsize,
    /// Total actor panics (indicates bugs).
    pub actor_panics: AtomicU64,
    /// Total messages and engine events processed across all actors.
    pub total_messages_processed: AtomicU64,
    /// Total partitioner runs across all sessions.
    pub total_recomputations: AtomicU64,
}

impl ActorMetrics {
    /// Create a new shared metrics instance.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Increment the active session count.
    pub fn session_started(&self) {
        let count = self.active_sessions.fetch_add(1, Ordering::Relaxed) + 1;
        prom::set_sessions_active(count);
    }

    /// Decrement the active session count.
    pub fn session_ended(&self) {
        let previous = self
            .active_sessions
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| {
                Some(n.saturating_sub(1))
            })
            .unwrap_or(0);
        prom::set_sessions_active(previous.saturating_sub(1));
    }

    /// Record an actor panic.
    pub fn record_panic(&self, actor_type: ActorType) {
        self.actor_panics.fetch_add(1, Ordering::Relaxed);
        prom::record_actor_panic(actor_type.as_str());
        tracing::error!(
            target: "lc.actor.panic",
            actor_type = actor_type.as_str(),
            total_panics = self.actor_panics.load(Ordering::Relaxed),
            "Actor panic detected - indicates bug, investigation required"
        );
    }

    /// Record a message or engine event being processed.
    pub fn record_message_processed(&self) {
        self.total_messages_processed
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Record one partitioner run.
    pub fn record_recomputation(&self) {
        self.total_recomputations.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn session_count(&self) -> usize {
        self.active_sessions.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn recomputation_count(&self) -> u64 {
        self.total_recomputations.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_type_as_str() {
        assert_eq!(ActorType::Controller.as_str(), "controller");
        assert_eq!(ActorType::Session.as_str(), "session");
    }

    #[test]
    fn test_mailbox_monitor_tracks_queue_length() {
        let monitor = MailboxMonitor::new(ActorType::Session, "session-1");
        assert_eq!(monitor.current_depth(), 0);

        monitor.record_received(4);
        assert_eq!(monitor.current_depth(), 5);
        assert_eq!(monitor.peak_depth(), 5);

        monitor.record_processed();
        monitor.record_received(0);
        assert_eq!(monitor.current_depth(), 1);
        assert_eq!(monitor.peak_depth(), 5);

        monitor.record_processed();
        assert_eq!(monitor.current_depth(), 0);
        assert_eq!(monitor.messages_processed(), 2);
    }

    #[test]
    fn test_mailbox_monitor_levels() {
        let monitor = MailboxMonitor::new(ActorType::Session, "session-2");
        assert_eq!(monitor.current_level(), MailboxLevel::Normal);

        monitor.record_received(SESSION_MAILBOX_NORMAL);
        assert_eq!(monitor.current_level(), MailboxLevel::Warning);

        monitor.record_received(SESSION_MAILBOX_WARNING);
        assert_eq!(monitor.current_level(), MailboxLevel::Critical);
    }

    #[test]
    fn test_processed_never_underflows() {
        let monitor = MailboxMonitor::new(ActorType::Controller, "controller");
        monitor.record_processed();
        assert_eq!(monitor.current_depth(), 0);
    }

    #[test]
    fn test_actor_metrics_sessions() {
        let metrics = ActorMetrics::new();

        metrics.session_started();
        metrics.session_started();
        assert_eq!(metrics.session_count(), 2);

        metrics.session_ended();
        metrics.session_ended();
        metrics.session_ended();
        assert_eq!(metrics.session_count(), 0);
    }

    #[test]
    fn test_actor_metrics_counters() {
        let metrics = ActorMetrics::new();

        metrics.record_recomputation();
        metrics.record_recomputation();
        metrics.record_message_processed();
        metrics.record_panic(ActorType::Session);

        assert_eq!(metrics.recomputation_count(), 2);
        assert_eq!(metrics.total_messages_processed.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.actor_panics.load(Ordering::Relaxed), 1);
    }
}
