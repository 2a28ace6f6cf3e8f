//! Actor model implementation for the Layout Controller.
//!
//! ```text
//! LayoutControllerActor (singleton)
//! └── supervises N LayoutSessionActors
//!     └── LayoutSessionActor (one per call session)
//!         ├── owns the RosterStore
//!         ├── consumes the engine subscription
//!         └── publishes LayoutUpdate on a watch channel
//! ```
//!
//! # Key Design Decisions
//!
//! - **Single writer**: only the session actor mutates its roster; readers get copies
//! - **CancellationToken propagation**: sessions run on child tokens of the controller's
//! - **Bounded mailboxes**: backpressure instead of unbounded buffering
//!
//! # Modules
//!
//! - [`controller`] - `LayoutControllerActor` singleton that supervises sessions
//! - [`session`] - `LayoutSessionActor` per call session
//! - [`messages`] - Message types for actor communication
//! - [`metrics`] - Mailbox monitoring and actor metrics

pub mod controller;
pub mod messages;
pub mod metrics;
pub mod session;

// Re-export primary types
pub use controller::{LayoutControllerActor, LayoutControllerActorHandle};
pub use messages::*;
pub use metrics::{ActorMetrics, ActorType, MailboxMonitor};
pub use session::{LayoutSessionActor, LayoutSessionHandle, SessionSettings};
