//! `LayoutSessionActor` - per-call-session actor that owns the roster.
//!
//! Each `LayoutSessionActor`:
//! - Owns the `RosterStore` for one call session
//! - Consumes the engine subscription and its own command mailbox
//! - Recomputes the slot assignment on every roster mutation, or once per
//!   debounce window when coalescing is enabled
//! - Publishes each assignment on a `watch` channel for the rendering layer
//!
//! # Startup
//!
//! The actor subscribes to the engine before reading the snapshot, so an
//! event racing the snapshot is seen twice rather than never. Idempotent
//! join/leave absorbs the duplicate. The seed layout is computed
//! synchronously and published as revision 1.
//!
//! # Event Ordering
//!
//! Within one loop iteration the engine subscription is polled before the
//! command mailbox. A query therefore observes every event the engine
//! delivered before the query was sent.

use crate::engine::{CallEngine, EngineEvent, EngineSubscription, Snapshot};
use crate::errors::LayoutError;
use crate::layout::{partition, LayoutConfig, SlotAssignment};
use crate::observability::metrics as prom;
use crate::roster::{RosterChange, RosterStore};

use super::messages::{LayoutUpdate, SessionMessage, SessionState};
use super::metrics::{ActorMetrics, ActorType, MailboxMonitor};

use common::types::{Participant, ParticipantId, SessionId};
use std::future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

/// Per-session settings shared by every session the controller spawns.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub layout: Arc<LayoutConfig>,
    /// `None` recomputes synchronously on every mutation.
    pub debounce: Option<Duration>,
    /// Bound for the engine subscription and for the session mailbox.
    pub event_buffer: usize,
}

impl SessionSettings {
    /// Build settings from loaded service configuration.
    #[must_use]
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            layout: Arc::new(config.layout.clone()),
            debounce: config.debounce,
            event_buffer: config.event_buffer,
        }
    }
}

/// Handle to a `LayoutSessionActor`.
#[derive(Clone, Debug)]
pub struct LayoutSessionHandle {
    sender: mpsc::Sender<SessionMessage>,
    cancel_token: CancellationToken,
    session_id: SessionId,
    layout_rx: watch::Receiver<LayoutUpdate>,
}

impl LayoutSessionHandle {
    /// Session this handle is bound to.
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Replace the roster from a snapshot.
    ///
    /// A snapshot tagged with another session is discarded and reported as
    /// [`RosterChange::StaleDiscarded`].
    ///
    /// # Errors
    ///
    /// [`LayoutError::SessionClosed`] if the session has been torn down.
    pub async fn apply_snapshot(&self, snapshot: Snapshot) -> Result<RosterChange, LayoutError> {
        self.request(|respond_to| SessionMessage::ApplySnapshot {
            snapshot,
            respond_to,
        })
        .await
    }

    /// Apply a join as if the engine had delivered it.
    ///
    /// Commands are not ordered against the engine subscription: events the
    /// engine has already buffered are applied first, but an event delivered
    /// after this call was sent can still overtake it. Callers that need a
    /// strict order should feed the engine stream instead.
    ///
    /// # Errors
    ///
    /// [`LayoutError::SessionClosed`] if the session has been torn down.
    pub async fn join(&self, participant: Participant) -> Result<RosterChange, LayoutError> {
        self.request(|respond_to| SessionMessage::Join {
            participant,
            respond_to,
        })
        .await
    }

    /// Apply a leave as if the engine had delivered it. Ordering as for
    /// [`LayoutSessionHandle::join`].
    ///
    /// # Errors
    ///
    /// [`LayoutError::SessionClosed`] if the session has been torn down.
    pub async fn leave(&self, participant_id: ParticipantId) -> Result<RosterChange, LayoutError> {
        self.request(|respond_to| SessionMessage::Leave {
            participant_id,
            respond_to,
        })
        .await
    }

    /// Apply a role or media update as if the engine had delivered it.
    /// Ordering as for [`LayoutSessionHandle::join`].
    ///
    /// # Errors
    ///
    /// [`LayoutError::SessionClosed`] if the session has been torn down.
    pub async fn update(&self, participant: Participant) -> Result<RosterChange, LayoutError> {
        self.request(|respond_to| SessionMessage::Update {
            participant,
            respond_to,
        })
        .await
    }

    /// Owned copy of the current roster.
    ///
    /// # Errors
    ///
    /// [`LayoutError::SessionClosed`] if the session has been torn down.
    pub async fn current(&self) -> Result<Vec<Arc<Participant>>, LayoutError> {
        self.request(|respond_to| SessionMessage::GetRoster { respond_to })
            .await
    }

    /// Most recently published assignment. While a debounced recomputation
    /// is pending this lags the roster.
    ///
    /// # Errors
    ///
    /// [`LayoutError::SessionClosed`] if the session has been torn down.
    pub async fn assignment(&self) -> Result<Arc<SlotAssignment>, LayoutError> {
        self.request(|respond_to| SessionMessage::GetAssignment { respond_to })
            .await
    }

    /// Session state for debugging and health checks.
    ///
    /// # Errors
    ///
    /// [`LayoutError::SessionClosed`] if the session has been torn down.
    pub async fn state(&self) -> Result<SessionState, LayoutError> {
        self.request(|respond_to| SessionMessage::GetState { respond_to })
            .await
    }

    /// Receiver for published layouts. `changed()` resolves on every
    /// recomputation and errors once the session stops.
    #[must_use]
    pub fn subscribe_layout(&self) -> watch::Receiver<LayoutUpdate> {
        self.layout_rx.clone()
    }

    /// Cancel the session actor.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> SessionMessage,
    ) -> Result<T, LayoutError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(build(tx))
            .await
            .map_err(|_| LayoutError::SessionClosed)?;

        rx.await.map_err(|_| LayoutError::SessionClosed)
    }
}

/// The `LayoutSessionActor` implementation.
pub struct LayoutSessionActor {
    session_id: SessionId,
    receiver: mpsc::Receiver<SessionMessage>,
    subscription: EngineSubscription,
    cancel_token: CancellationToken,
    roster: RosterStore,
    settings: SessionSettings,
    /// Deadline of the armed debounced recomputation.
    pending_flush: Option<Instant>,
    revision: u64,
    events_processed: u64,
    publisher: watch::Sender<LayoutUpdate>,
    started_at: i64,
    metrics: Arc<ActorMetrics>,
    mailbox: MailboxMonitor,
}

impl LayoutSessionActor {
    /// Spawn a new session actor bound to `engine`.
    ///
    /// Returns a handle and the task join handle.
    pub fn spawn(
        engine: &dyn CallEngine,
        settings: SessionSettings,
        cancel_token: CancellationToken,
        metrics: Arc<ActorMetrics>,
    ) -> (LayoutSessionHandle, JoinHandle<()>) {
        let session_id = engine.session_id();
        let buffer = settings.event_buffer.max(1);
        let (sender, receiver) = mpsc::channel(buffer);

        let subscription = engine.subscribe(buffer);
        let mut roster = RosterStore::new(session_id);
        let change = roster.apply_snapshot(engine.snapshot());
        record_snapshot(change);

        let started = std::time::Instant::now();
        let assignment = Arc::new(partition(roster.current(), &settings.layout));
        prom::record_layout_recomputation(started.elapsed());
        metrics.record_recomputation();

        let (publisher, layout_rx) = watch::channel(LayoutUpdate {
            session_id,
            revision: 1,
            assignment,
        });

        let actor = Self {
            session_id,
            receiver,
            subscription,
            cancel_token: cancel_token.clone(),
            roster,
            settings,
            pending_flush: None,
            revision: 1,
            events_processed: 0,
            publisher,
            started_at: chrono::Utc::now().timestamp(),
            metrics,
            mailbox: MailboxMonitor::new(ActorType::Session, session_id.to_string()),
        };

        let task_handle = tokio::spawn(actor.run());

        let handle = LayoutSessionHandle {
            sender,
            cancel_token,
            session_id,
            layout_rx,
        };

        (handle, task_handle)
    }

    /// Run the actor message loop.
    #[instrument(skip_all, name = "lc.actor.session", fields(session_id = %self.session_id))]
    async fn run(mut self) {
        info!(
            target: "lc.actor.session",
            session_id = %self.session_id,
            participants = self.roster.len(),
            "LayoutSessionActor started"
        );

        loop {
            let flush_at = self.pending_flush;

            tokio::select! {
                biased;

                () = self.cancel_token.cancelled() => {
                    info!(
                        target: "lc.actor.session",
                        session_id = %self.session_id,
                        "LayoutSessionActor received cancellation signal"
                    );
                    break;
                }

                () = flush_due(flush_at) => {
                    self.pending_flush = None;
                    self.recompute();
                }

                event = self.subscription.recv() => {
                    match event {
                        Some(event) => self.handle_engine_event(event),
                        None => {
                            info!(
                                target: "lc.actor.session",
                                session_id = %self.session_id,
                                "Engine subscription closed, session ended"
                            );
                            break;
                        }
                    }
                }

                msg = self.receiver.recv() => {
                    match msg {
                        Some(message) => {
                            self.mailbox.record_received(self.receiver.len());
                            self.handle_message(message);
                            self.mailbox.record_processed();
                            self.metrics.record_message_processed();
                        }
                        None => {
                            info!(
                                target: "lc.actor.session",
                                session_id = %self.session_id,
                                "LayoutSessionActor channel closed, exiting"
                            );
                            break;
                        }
                    }
                }
            }
        }

        self.teardown();

        info!(
            target: "lc.actor.session",
            session_id = %self.session_id,
            participants = self.roster.len(),
            revision = self.revision,
            events_processed = self.events_processed,
            messages_processed = self.mailbox.messages_processed(),
            "LayoutSessionActor stopped"
        );
    }

    /// Handle a single mailbox message.
    fn handle_message(&mut self, message: SessionMessage) {
        match message {
            SessionMessage::ApplySnapshot {
                snapshot,
                respond_to,
            } => {
                let change = self.roster.apply_snapshot(snapshot);
                record_snapshot(change);
                self.after_change(change);
                let _ = respond_to.send(change);
            }

            SessionMessage::Join {
                participant,
                respond_to,
            } => {
                let change = self.apply_event(EngineEvent::Joined(participant));
                let _ = respond_to.send(change);
            }

            SessionMessage::Leave {
                participant_id,
                respond_to,
            } => {
                let change = self.roster.on_leave(&participant_id);
                prom::record_roster_event("participant-left", change.as_str());
                self.after_change(change);
                let _ = respond_to.send(change);
            }

            SessionMessage::Update {
                participant,
                respond_to,
            } => {
                let change = self.apply_event(EngineEvent::Updated(participant));
                let _ = respond_to.send(change);
            }

            SessionMessage::GetRoster { respond_to } => {
                let _ = respond_to.send(self.roster.snapshot());
            }

            SessionMessage::GetAssignment { respond_to } => {
                let assignment = Arc::clone(&self.publisher.borrow().assignment);
                let _ = respond_to.send(assignment);
            }

            SessionMessage::GetState { respond_to } => {
                let _ = respond_to.send(self.state());
            }
        }
    }

    fn handle_engine_event(&mut self, event: EngineEvent) {
        self.apply_event(event);
        self.metrics.record_message_processed();
    }

    fn apply_event(&mut self, event: EngineEvent) -> RosterChange {
        let name = event.name();
        let change = match event {
            EngineEvent::Joined(participant) => self.roster.on_join(participant),
            EngineEvent::Left(participant) => self.roster.on_leave(&participant.id),
            EngineEvent::Updated(participant) => self.roster.on_update(participant),
        };

        prom::record_roster_event(name, change.as_str());
        self.after_change(change);
        change
    }

    fn after_change(&mut self, change: RosterChange) {
        self.events_processed = self.events_processed.saturating_add(1);
        if change.is_mutation() {
            self.schedule_recompute();
        }
    }

    /// Recompute now, or arm the debounce timer if it is not already armed.
    fn schedule_recompute(&mut self) {
        match self.settings.debounce {
            None => self.recompute(),
            Some(window) => {
                if self.pending_flush.is_none() {
                    self.pending_flush = Some(Instant::now() + window);
                    debug!(
                        target: "lc.actor.session",
                        session_id = %self.session_id,
                        window_ms = window.as_millis(),
                        "Recomputation armed"
                    );
                }
            }
        }
    }

    fn recompute(&mut self) {
        let started = std::time::Instant::now();
        let assignment = Arc::new(partition(self.roster.current(), &self.settings.layout));
        prom::record_layout_recomputation(started.elapsed());
        self.metrics.record_recomputation();

        self.revision = self.revision.saturating_add(1);
        self.publisher.send_replace(LayoutUpdate {
            session_id: self.session_id,
            revision: self.revision,
            assignment,
        });

        debug!(
            target: "lc.layout",
            session_id = %self.session_id,
            revision = self.revision,
            participants = self.roster.len(),
            "Layout recomputed"
        );
    }

    fn state(&self) -> SessionState {
        SessionState {
            session_id: self.session_id,
            participant_count: self.roster.len(),
            revision: self.revision,
            recompute_pending: self.pending_flush.is_some(),
            events_processed: self.events_processed,
            started_at: self.started_at,
        }
    }

    /// Release the engine subscription and stop accepting commands. Pending
    /// recomputations are dropped; nothing is published after this point.
    fn teardown(&mut self) {
        if self.pending_flush.take().is_some() {
            debug!(
                target: "lc.actor.session",
                session_id = %self.session_id,
                "Discarding pending recomputation on teardown"
            );
        }
        self.subscription.close();
        self.receiver.close();
    }
}

fn record_snapshot(change: RosterChange) {
    if change == RosterChange::StaleDiscarded {
        prom::record_stale_snapshot();
    }
    prom::record_roster_event("snapshot", change.as_str());
}

async fn flush_due(at: Option<Instant>) {
    match at {
        Some(at) => tokio::time::sleep_until(at).await,
        None => future::pending().await,
    }
}
