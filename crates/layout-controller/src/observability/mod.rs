//! Observability module for the Layout Controller.
//!
//! # Privacy by Default
//!
//! Actor loops use `#[instrument(skip_all)]` with explicit fields. Participant
//! ids are logged; display names never are.
//!
//! # Metrics
//!
//! | Metric | Type | Labels | Purpose |
//! |--------|------|--------|---------|
//! | `lc_roster_events_total` | Counter | `event`, `outcome` | Engine events and their effect |
//! | `lc_layout_recomputations_total` | Counter | none | Partitioner runs |
//! | `lc_layout_recompute_duration_seconds` | Histogram | none | Partitioner latency |
//! | `lc_stale_snapshots_total` | Counter | none | Snapshots from a replaced session |
//! | `lc_sessions_active` | Gauge | none | Live layout sessions |
//! | `lc_actor_mailbox_depth` | Gauge | `actor_type` | Backpressure indicator |
//! | `lc_actor_panics_total` | Counter | `actor_type` | Session task panics |

pub mod metrics;

pub use metrics::{
    init_metrics_recorder, record_actor_panic, record_layout_recomputation, record_roster_event,
    record_stale_snapshot, set_actor_mailbox_depth, set_sessions_active,
};
