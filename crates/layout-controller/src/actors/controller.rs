//! `LayoutControllerActor` - singleton supervisor for layout sessions.
//!
//! - Supervises N `LayoutSessionActor` instances keyed by `SessionId`
//! - Owns the root `CancellationToken`; each session gets a child token
//! - Monitors session task health (exit and panic detection via `JoinHandle`)
//!
//! # Graceful Shutdown
//!
//! On shutdown the controller stops accepting sessions, cancels the root
//! token (propagating to every session) and waits for session tasks to stop.

use crate::engine::CallEngine;
use crate::errors::LayoutError;

use super::messages::{ControllerMessage, ControllerStatus};
use super::metrics::{ActorMetrics, ActorType, MailboxMonitor};
use super::session::{LayoutSessionActor, LayoutSessionHandle, SessionSettings};

use common::types::SessionId;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// Default channel buffer size for the controller mailbox.
const CONTROLLER_CHANNEL_BUFFER: usize = 256;

/// How long to wait for a session task to stop when it is ended.
const SESSION_STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to the `LayoutControllerActor`.
#[derive(Clone)]
pub struct LayoutControllerActorHandle {
    sender: mpsc::Sender<ControllerMessage>,
    cancel_token: CancellationToken,
}

impl LayoutControllerActorHandle {
    /// Create a new `LayoutControllerActor` and return a handle to it.
    ///
    /// This spawns the actor task and returns immediately.
    #[must_use]
    pub fn new(settings: SessionSettings, metrics: Arc<ActorMetrics>) -> Self {
        let (sender, receiver) = mpsc::channel(CONTROLLER_CHANNEL_BUFFER);
        let cancel_token = CancellationToken::new();

        let actor = LayoutControllerActor::new(receiver, cancel_token.clone(), settings, metrics);

        tokio::spawn(actor.run());

        Self {
            sender,
            cancel_token,
        }
    }

    /// Start a layout session bound to `engine`.
    ///
    /// # Errors
    ///
    /// - [`LayoutError::Conflict`] if a session with the same ID is running
    /// - [`LayoutError::Draining`] if the controller is shutting down
    pub async fn start_session(
        &self,
        engine: Arc<dyn CallEngine>,
    ) -> Result<LayoutSessionHandle, LayoutError> {
        self.request(|respond_to| ControllerMessage::StartSession { engine, respond_to })
            .await?
    }

    /// Get the handle of a running session.
    ///
    /// # Errors
    ///
    /// [`LayoutError::SessionNotFound`] if no such session is running.
    pub async fn get_session(
        &self,
        session_id: SessionId,
    ) -> Result<LayoutSessionHandle, LayoutError> {
        self.request(|respond_to| ControllerMessage::GetSession {
            session_id,
            respond_to,
        })
        .await?
    }

    /// End a session and wait for its task to stop. The session's engine
    /// subscription is released before this returns.
    ///
    /// # Errors
    ///
    /// [`LayoutError::SessionNotFound`] if no such session is running.
    pub async fn end_session(&self, session_id: SessionId) -> Result<(), LayoutError> {
        self.request(|respond_to| ControllerMessage::EndSession {
            session_id,
            respond_to,
        })
        .await?
    }

    /// Get the current controller status.
    ///
    /// # Errors
    ///
    /// [`LayoutError::Internal`] if the controller has stopped.
    pub async fn get_status(&self) -> Result<ControllerStatus, LayoutError> {
        self.request(|respond_to| ControllerMessage::GetStatus { respond_to })
            .await
    }

    /// Stop accepting sessions, cancel every running session and wait for
    /// them to stop. Each session gets up to `deadline` to finish; the call
    /// returns once all of them have stopped or timed out.
    ///
    /// # Errors
    ///
    /// [`LayoutError::Internal`] if the controller has already stopped.
    pub async fn shutdown(&self, deadline: Duration) -> Result<(), LayoutError> {
        self.request(|respond_to| ControllerMessage::Shutdown {
            deadline,
            respond_to,
        })
        .await?
    }

    /// Cancel the actor (for immediate shutdown).
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> ControllerMessage,
    ) -> Result<T, LayoutError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(build(tx))
            .await
            .map_err(|e| LayoutError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| LayoutError::Internal(format!("response receive failed: {e}")))
    }
}

/// Internal state for a managed session.
struct ManagedSession {
    handle: LayoutSessionHandle,
    task_handle: JoinHandle<()>,
}

/// The `LayoutControllerActor` implementation.
pub struct LayoutControllerActor {
    receiver: mpsc::Receiver<ControllerMessage>,
    /// Root cancellation token.
    cancel_token: CancellationToken,
    sessions: HashMap<SessionId, ManagedSession>,
    settings: SessionSettings,
    accepting_new: bool,
    /// Per-session stop timeout used during shutdown.
    shutdown_deadline: Duration,
    /// Caller of `shutdown`, answered once sessions have drained.
    shutdown_reply: Option<oneshot::Sender<Result<(), LayoutError>>>,
    metrics: Arc<ActorMetrics>,
    mailbox: MailboxMonitor,
}

impl LayoutControllerActor {
    fn new(
        receiver: mpsc::Receiver<ControllerMessage>,
        cancel_token: CancellationToken,
        settings: SessionSettings,
        metrics: Arc<ActorMetrics>,
    ) -> Self {
        Self {
            receiver,
            cancel_token,
            sessions: HashMap::new(),
            settings,
            accepting_new: true,
            shutdown_deadline: SESSION_STOP_TIMEOUT,
            shutdown_reply: None,
            metrics,
            mailbox: MailboxMonitor::new(ActorType::Controller, "controller"),
        }
    }

    /// Run the actor message loop.
    #[instrument(skip_all, name = "lc.actor.controller")]
    async fn run(mut self) {
        info!(target: "lc.actor.controller", "LayoutControllerActor started");

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    info!(
                        target: "lc.actor.controller",
                        "LayoutControllerActor received cancellation signal"
                    );
                    self.graceful_shutdown().await;
                    break;
                }

                msg = self.receiver.recv() => {
                    match msg {
                        Some(message) => {
                            self.mailbox.record_received(self.receiver.len());
                            // Reap sessions whose task stopped on its own
                            self.check_session_health().await;
                            self.handle_message(message);
                            self.mailbox.record_processed();
                            self.metrics.record_message_processed();
                        }
                        None => {
                            info!(
                                target: "lc.actor.controller",
                                "LayoutControllerActor channel closed, exiting"
                            );
                            self.graceful_shutdown().await;
                            break;
                        }
                    }
                }
            }
        }

        info!(
            target: "lc.actor.controller",
            sessions_remaining = self.sessions.len(),
            messages_processed = self.mailbox.messages_processed(),
            "LayoutControllerActor stopped"
        );
    }

    /// Handle a single message.
    fn handle_message(&mut self, message: ControllerMessage) {
        match message {
            ControllerMessage::StartSession { engine, respond_to } => {
                let result = self.start_session(engine.as_ref());
                let _ = respond_to.send(result);
            }

            ControllerMessage::GetSession {
                session_id,
                respond_to,
            } => {
                let result = self
                    .sessions
                    .get(&session_id)
                    .map(|managed| managed.handle.clone())
                    .ok_or_else(|| LayoutError::SessionNotFound(session_id.to_string()));
                let _ = respond_to.send(result);
            }

            ControllerMessage::EndSession {
                session_id,
                respond_to,
            } => {
                self.end_session(session_id, respond_to);
            }

            ControllerMessage::GetStatus { respond_to } => {
                let _ = respond_to.send(self.get_status());
            }

            ControllerMessage::Shutdown {
                deadline,
                respond_to,
            } => {
                info!(
                    target: "lc.actor.controller",
                    session_count = self.sessions.len(),
                    "Initiating graceful shutdown"
                );
                self.accepting_new = false;
                self.shutdown_deadline = deadline;
                if let Some(previous) = self.shutdown_reply.replace(respond_to) {
                    let _ = previous.send(Ok(()));
                }
                self.cancel_token.cancel();
            }
        }
    }

    fn start_session(&mut self, engine: &dyn CallEngine) -> Result<LayoutSessionHandle, LayoutError> {
        if !self.accepting_new {
            return Err(LayoutError::Draining);
        }

        let session_id = engine.session_id();
        if self.sessions.contains_key(&session_id) {
            return Err(LayoutError::Conflict("Session already running".to_string()));
        }

        let (handle, task_handle) = LayoutSessionActor::spawn(
            engine,
            self.settings.clone(),
            self.cancel_token.child_token(),
            Arc::clone(&self.metrics),
        );

        self.sessions.insert(
            session_id,
            ManagedSession {
                handle: handle.clone(),
                task_handle,
            },
        );
        self.metrics.session_started();

        info!(
            target: "lc.actor.controller",
            session_id = %session_id,
            total_sessions = self.sessions.len(),
            "Layout session started"
        );

        Ok(handle)
    }

    /// Cancel a session and reply once its task has stopped. The wait runs
    /// in a background task so the message loop is never blocked.
    fn end_session(
        &mut self,
        session_id: SessionId,
        respond_to: oneshot::Sender<Result<(), LayoutError>>,
    ) {
        let Some(managed) = self.sessions.remove(&session_id) else {
            let _ = respond_to.send(Err(LayoutError::SessionNotFound(session_id.to_string())));
            return;
        };

        debug!(
            target: "lc.actor.controller",
            session_id = %session_id,
            "Ending layout session"
        );

        managed.handle.cancel();
        self.metrics.session_ended();

        let metrics = Arc::clone(&self.metrics);
        tokio::spawn(async move {
            let result = match tokio::time::timeout(SESSION_STOP_TIMEOUT, managed.task_handle).await
            {
                Ok(Ok(())) => {
                    debug!(
                        target: "lc.actor.controller",
                        session_id = %session_id,
                        "Session task completed cleanly"
                    );
                    Ok(())
                }
                Ok(Err(e)) => {
                    if e.is_panic() {
                        metrics.record_panic(ActorType::Session);
                    }
                    warn!(
                        target: "lc.actor.controller",
                        session_id = %session_id,
                        error = ?e,
                        "Session task failed during teardown"
                    );
                    Err(LayoutError::Internal("session task failed".to_string()))
                }
                Err(_) => {
                    warn!(
                        target: "lc.actor.controller",
                        session_id = %session_id,
                        "Session task teardown timed out"
                    );
                    Err(LayoutError::Internal("session teardown timed out".to_string()))
                }
            };
            let _ = respond_to.send(result);
        });

        info!(
            target: "lc.actor.controller",
            session_id = %session_id,
            total_sessions = self.sessions.len(),
            "Layout session ended"
        );
    }

    fn get_status(&self) -> ControllerStatus {
        ControllerStatus {
            session_count: self.sessions.len(),
            is_draining: !self.accepting_new,
            mailbox_depth: self.mailbox.current_depth(),
            total_recomputations: self.metrics.recomputation_count(),
        }
    }

    async fn graceful_shutdown(&mut self) {
        info!(
            target: "lc.actor.controller",
            session_count = self.sessions.len(),
            "Performing graceful shutdown"
        );

        self.accepting_new = false;

        // Already cancelled via the parent token; be explicit
        for managed in self.sessions.values() {
            managed.handle.cancel();
        }

        for (session_id, managed) in self.sessions.drain() {
            match tokio::time::timeout(self.shutdown_deadline, managed.task_handle).await {
                Ok(Ok(())) => {
                    debug!(
                        target: "lc.actor.controller",
                        session_id = %session_id,
                        "Session actor completed cleanly"
                    );
                }
                Ok(Err(e)) => {
                    warn!(
                        target: "lc.actor.controller",
                        session_id = %session_id,
                        error = ?e,
                        "Session task panicked during shutdown"
                    );
                }
                Err(_) => {
                    warn!(
                        target: "lc.actor.controller",
                        session_id = %session_id,
                        "Session shutdown timed out"
                    );
                }
            }
            self.metrics.session_ended();
        }

        info!(target: "lc.actor.controller", "Graceful shutdown complete");

        if let Some(respond_to) = self.shutdown_reply.take() {
            let _ = respond_to.send(Ok(()));
        }
    }

    /// Remove sessions whose task has finished (engine closed the stream or
    /// the task panicked).
    async fn check_session_health(&mut self) {
        let finished: Vec<SessionId> = self
            .sessions
            .iter()
            .filter(|(_, managed)| managed.task_handle.is_finished())
            .map(|(session_id, _)| *session_id)
            .collect();

        for session_id in finished {
            let Some(managed) = self.sessions.remove(&session_id) else {
                continue;
            };

            match managed.task_handle.await {
                Ok(()) => {
                    info!(
                        target: "lc.actor.controller",
                        session_id = %session_id,
                        "Session actor exited"
                    );
                }
                Err(join_error) if join_error.is_panic() => {
                    error!(
                        target: "lc.actor.controller",
                        session_id = %session_id,
                        error = ?join_error,
                        "Session actor panicked"
                    );
                    self.metrics.record_panic(ActorType::Session);
                }
                Err(join_error) => {
                    warn!(
                        target: "lc.actor.controller",
                        session_id = %session_id,
                        error = ?join_error,
                        "Session actor task cancelled"
                    );
                }
            }

            self.metrics.session_ended();
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::engine::{EngineSubscription, Snapshot};
    use crate::layout::LayoutConfig;
    use common::types::Role;

    struct IdleEngine {
        session_id: SessionId,
        // Held so the subscription stays open
        senders: std::sync::Mutex<Vec<mpsc::Sender<crate::engine::EngineEvent>>>,
    }

    impl IdleEngine {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                session_id: SessionId::new(),
                senders: std::sync::Mutex::new(Vec::new()),
            })
        }
    }

    impl CallEngine for IdleEngine {
        fn session_id(&self) -> SessionId {
            self.session_id
        }

        fn snapshot(&self) -> Snapshot {
            Snapshot {
                session_id: self.session_id,
                participants: Vec::new(),
            }
        }

        fn subscribe(&self, buffer: usize) -> EngineSubscription {
            let (tx, rx) = mpsc::channel(buffer);
            self.senders.lock().unwrap().push(tx);
            EngineSubscription::new(rx)
        }
    }

    fn settings() -> SessionSettings {
        let layout = LayoutConfig::builder()
            .slot("main")
            .map_role(Role::Arbiter, "main")
            .overflow_slot("main")
            .default_slot("main")
            .build()
            .unwrap();
        SessionSettings {
            layout: Arc::new(layout),
            debounce: None,
            event_buffer: 8,
        }
    }

    #[tokio::test]
    async fn test_controller_start_and_get_session() {
        let handle = LayoutControllerActorHandle::new(settings(), ActorMetrics::new());
        let engine = IdleEngine::new();

        let session = handle.start_session(engine.clone()).await.unwrap();
        assert_eq!(session.session_id(), engine.session_id);

        let found = handle.get_session(engine.session_id).await.unwrap();
        assert_eq!(found.session_id(), engine.session_id);

        handle.cancel();
    }

    #[tokio::test]
    async fn test_controller_duplicate_session() {
        let handle = LayoutControllerActorHandle::new(settings(), ActorMetrics::new());
        let engine = IdleEngine::new();

        handle.start_session(engine.clone()).await.unwrap();
        let result = handle.start_session(engine).await;
        assert!(matches!(result, Err(LayoutError::Conflict(_))));

        handle.cancel();
    }

    #[tokio::test]
    async fn test_controller_get_nonexistent_session() {
        let handle = LayoutControllerActorHandle::new(settings(), ActorMetrics::new());

        let result = handle.get_session(SessionId::new()).await;
        assert!(matches!(result, Err(LayoutError::SessionNotFound(_))));

        let result = handle.end_session(SessionId::new()).await;
        assert!(matches!(result, Err(LayoutError::SessionNotFound(_))));

        handle.cancel();
    }

    #[tokio::test]
    async fn test_controller_end_session() {
        let metrics = ActorMetrics::new();
        let handle = LayoutControllerActorHandle::new(settings(), Arc::clone(&metrics));
        let engine = IdleEngine::new();

        let session = handle.start_session(engine.clone()).await.unwrap();
        assert_eq!(metrics.session_count(), 1);

        handle.end_session(engine.session_id).await.unwrap();

        assert!(session.is_cancelled());
        assert_eq!(metrics.session_count(), 0);
        assert!(matches!(
            handle.get_session(engine.session_id).await,
            Err(LayoutError::SessionNotFound(_))
        ));

        handle.cancel();
    }

    #[tokio::test]
    async fn test_controller_status() {
        let handle = LayoutControllerActorHandle::new(settings(), ActorMetrics::new());

        let status = handle.get_status().await.unwrap();
        assert_eq!(status.session_count, 0);
        assert!(!status.is_draining);

        let first = IdleEngine::new();
        let second = IdleEngine::new();
        handle.start_session(first.clone()).await.unwrap();
        handle.start_session(second.clone()).await.unwrap();

        let status = handle.get_status().await.unwrap();
        assert_eq!(status.session_count, 2);
        assert_eq!(status.total_recomputations, 2);

        handle.cancel();
    }

    #[tokio::test]
    async fn test_controller_reaps_session_when_engine_closes() {
        let handle = LayoutControllerActorHandle::new(settings(), ActorMetrics::new());
        let engine = IdleEngine::new();
        handle.start_session(engine.clone()).await.unwrap();

        engine.senders.lock().unwrap().clear();
        tokio::time::sleep(Duration::from_millis(10)).await;

        // Health check runs before the next message is handled
        let status = handle.get_status().await.unwrap();
        assert_eq!(status.session_count, 0);

        handle.cancel();
    }

    #[tokio::test]
    async fn test_controller_shutdown_cancels_sessions() {
        let handle = LayoutControllerActorHandle::new(settings(), ActorMetrics::new());
        let engine = IdleEngine::new();
        let session = handle.start_session(engine.clone()).await.unwrap();

        handle.shutdown(Duration::from_secs(1)).await.unwrap();

        assert!(handle.is_cancelled());
        assert!(session.is_cancelled());

        // Reply arrives only after the session task has stopped
        assert!(engine.senders.lock().unwrap().iter().all(mpsc::Sender::is_closed));
        assert!(matches!(
            session.state().await,
            Err(LayoutError::SessionClosed)
        ));

        let result = handle.start_session(IdleEngine::new()).await;
        assert!(result.is_err());
    }
}
