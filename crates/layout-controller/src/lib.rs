//! Layout Controller (LC) Library
//!
//! This library provides the roster sync and layout partitioning core for
//! Dark Tower recording views:
//!
//! - Keeps a per-session roster eventually consistent with the call engine,
//!   tolerating duplicate and out-of-order join/leave notifications
//! - Partitions the roster into named display slots by participant role
//! - Publishes a fresh slot assignment to the rendering layer on every change
//!
//! # Architecture
//!
//! ```text
//! CallEngine ──snapshot + subscription──▶ LayoutSessionActor
//!                                          ├── RosterStore
//!                                          ├── partition(roster, LayoutConfig)
//!                                          └── watch::Sender<LayoutUpdate> ──▶ rendering layer
//! ```
//!
//! Sessions are supervised by a `LayoutControllerActor` keyed by `SessionId`.
//!
//! # Modules
//!
//! - [`actors`] - Session and controller actors
//! - [`config`] - Service configuration from environment
//! - [`engine`] - Call engine boundary (events, snapshots, subscriptions)
//! - [`errors`] - Error types
//! - [`layout`] - Layout table and the partitioner
//! - [`observability`] - Prometheus metrics
//! - [`roster`] - Idempotent roster store

pub mod actors;
pub mod config;
pub mod engine;
pub mod errors;
pub mod layout;
pub mod observability;
pub mod roster;

pub use engine::{CallEngine, EngineEvent, EngineSubscription, Snapshot};
pub use errors::LayoutError;
pub use layout::{partition, LayoutConfig, Slot, SlotAssignment};
pub use roster::{RosterChange, RosterStore};
