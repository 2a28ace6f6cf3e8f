//! # LC Test Utilities
//!
//! Shared test utilities for the Layout Controller (LC).
//!
//! This crate provides a mock call engine and test fixtures for exercising
//! roster sync and layout sessions without a real call engine.
//!
//! ## Modules
//!
//! - `mock_engine` - In-memory call engine with controllable event delivery
//! - `fixtures` - Participants, rosters and layout tables
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lc_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let engine = MockCallEngine::new().with_participants(debate_roster());
//!     let (handle, _task) = LayoutSessionActor::spawn(
//!         &engine,
//!         session_settings(None),
//!         CancellationToken::new(),
//!         ActorMetrics::new(),
//!     );
//!
//!     engine.join(TestParticipant::new("late").side_a().build()).await;
//!     let assignment = handle.assignment().await.unwrap();
//!     assert_eq!(assignment.slot_of(&"late".into()), Some("left"));
//! }
//! ```

pub mod fixtures;
pub mod mock_engine;

// Re-export commonly used items
pub use fixtures::*;
pub use mock_engine::*;
