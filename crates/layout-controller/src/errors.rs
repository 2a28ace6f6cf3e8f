//! Layout Controller error types.
//!
//! Roster operations never fail: duplicate and out-of-order engine events are
//! absorbed by the store. The errors here cover structural misconfiguration
//! and the actor plumbing around the store.

use crate::config::ConfigError;
use thiserror::Error;

/// Layout Controller error type.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// Layout or service configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The session actor has stopped (session ended or torn down).
    #[error("Session closed")]
    SessionClosed,

    /// No session is registered under the given ID.
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Conflict error (e.g., session already registered).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Controller is shutting down and not accepting new sessions.
    #[error("Controller is draining")]
    Draining,

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LayoutError {
    /// Whether retrying the same call may succeed.
    ///
    /// A closed session never comes back; callers should rebind to the new
    /// session instead.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, LayoutError::Internal(_))
    }
}
