//! Message types for actor communication.
//!
//! Commands travel over bounded `tokio::sync::mpsc` mailboxes; replies come
//! back over `tokio::sync::oneshot`.

use crate::engine::{CallEngine, Snapshot};
use crate::errors::LayoutError;
use crate::layout::SlotAssignment;
use crate::roster::RosterChange;

use super::session::LayoutSessionHandle;

use common::types::{Participant, ParticipantId, SessionId};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

/// Messages sent to `LayoutControllerActor`.
pub enum ControllerMessage {
    /// Bind a new layout session to a call engine.
    StartSession {
        engine: Arc<dyn CallEngine>,
        respond_to: oneshot::Sender<Result<LayoutSessionHandle, LayoutError>>,
    },

    /// Look up the handle of a running session.
    GetSession {
        session_id: SessionId,
        respond_to: oneshot::Sender<Result<LayoutSessionHandle, LayoutError>>,
    },

    /// Tear a session down. Replies once the session task has stopped.
    EndSession {
        session_id: SessionId,
        respond_to: oneshot::Sender<Result<(), LayoutError>>,
    },

    /// Get controller status (for health checks).
    GetStatus {
        respond_to: oneshot::Sender<ControllerStatus>,
    },

    /// Stop accepting sessions and cancel all running ones.
    Shutdown {
        /// How long to wait for each session task to stop.
        deadline: Duration,
        respond_to: oneshot::Sender<Result<(), LayoutError>>,
    },
}

/// Messages sent to `LayoutSessionActor`.
#[derive(Debug)]
pub enum SessionMessage {
    /// Replace the roster from a session-tagged snapshot.
    ApplySnapshot {
        snapshot: Snapshot,
        respond_to: oneshot::Sender<RosterChange>,
    },

    /// Apply a join outside the engine subscription.
    ///
    /// The mailbox and the engine subscription are separate queues with no
    /// relative ordering. Engine events already buffered when the command is
    /// handled are applied before it; events delivered later may be applied
    /// before a command that was sent earlier.
    Join {
        participant: Participant,
        respond_to: oneshot::Sender<RosterChange>,
    },

    /// Apply a leave outside the engine subscription. Same ordering caveat
    /// as [`SessionMessage::Join`].
    Leave {
        participant_id: ParticipantId,
        respond_to: oneshot::Sender<RosterChange>,
    },

    /// Apply a role or media update outside the engine subscription. Same
    /// ordering caveat as [`SessionMessage::Join`].
    Update {
        participant: Participant,
        respond_to: oneshot::Sender<RosterChange>,
    },

    /// Get an owned copy of the roster.
    GetRoster {
        respond_to: oneshot::Sender<Vec<Arc<Participant>>>,
    },

    /// Get the most recently published assignment.
    GetAssignment {
        respond_to: oneshot::Sender<Arc<SlotAssignment>>,
    },

    /// Get session state (for debugging/health).
    GetState {
        respond_to: oneshot::Sender<SessionState>,
    },
}

// ----------------------------------------------------------------------------
// Supporting Types
// ----------------------------------------------------------------------------

/// Value published to the rendering layer on every recomputation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutUpdate {
    pub session_id: SessionId,
    /// Increments by one per recomputation, starting at 1 for the seed layout.
    pub revision: u64,
    pub assignment: Arc<SlotAssignment>,
}

/// Point-in-time state of a session actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub session_id: SessionId,
    pub participant_count: usize,
    /// Revision of the last published layout.
    pub revision: u64,
    /// Whether a debounced recomputation is armed.
    pub recompute_pending: bool,
    /// Engine events and roster commands applied so far.
    pub events_processed: u64,
    /// Unix timestamp (seconds) when the session actor started.
    pub started_at: i64,
}

/// Controller status for health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerStatus {
    pub session_count: usize,
    pub is_draining: bool,
    pub mailbox_depth: usize,
    /// Partitioner runs across all sessions since startup.
    pub total_recomputations: u64,
}
