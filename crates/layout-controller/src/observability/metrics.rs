//! Metrics definitions for the Layout Controller.
//!
//! All metrics follow Prometheus naming conventions:
//! - `lc_` prefix for Layout Controller
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded by enums in code:
//! - `event`: 4 values (participant-joined, participant-left, participant-updated, snapshot)
//! - `outcome`: 6 values (`RosterChange` variants)
//! - `actor_type`: 2 values (controller, session)

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize the Prometheus metrics recorder and return the handle the host
/// application renders from.
///
/// Must be called before any metrics are recorded. Recompute buckets are
/// sized for a partitioner that runs in microseconds on realistic rosters.
///
/// # Errors
///
/// Returns error if the recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("lc_layout_recompute".to_string()),
            &[
                0.000_01, 0.000_05, 0.000_1, 0.000_5, 0.001, 0.005, 0.010, 0.050, 0.100,
            ],
        )
        .map_err(|e| format!("Failed to set recompute duration buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus metrics recorder: {e}"))
}

// ============================================================================
// Roster Metrics (Counters)
// ============================================================================

/// Record one roster event and what it did to the roster.
///
/// Metric: `lc_roster_events_total`
/// Labels: `event`, `outcome`
///
/// A high `outcome="unchanged"` rate means the engine is redelivering.
pub fn record_roster_event(event: &str, outcome: &str) {
    counter!("lc_roster_events_total",
        "event" => event.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record a snapshot discarded because it belonged to another session.
///
/// Metric: `lc_stale_snapshots_total`
/// Labels: none
pub fn record_stale_snapshot() {
    counter!("lc_stale_snapshots_total").increment(1);
}

// ============================================================================
// Layout Metrics
// ============================================================================

/// Record one partitioner run.
///
/// Metrics: `lc_layout_recomputations_total` (counter),
/// `lc_layout_recompute_duration_seconds` (histogram)
/// Labels: none
pub fn record_layout_recomputation(duration: Duration) {
    counter!("lc_layout_recomputations_total").increment(1);
    histogram!("lc_layout_recompute_duration_seconds").record(duration.as_secs_f64());
}

// ============================================================================
// Actor Metrics (Gauges)
// ============================================================================

/// Set the number of live layout sessions.
///
/// Metric: `lc_sessions_active`
/// Labels: none
pub fn set_sessions_active(count: usize) {
    // usize to f64 conversion is safe for realistic session counts (< 2^53)
    #[allow(clippy::cast_precision_loss)]
    gauge!("lc_sessions_active").set(count as f64);
}

/// Set the mailbox depth for an actor type.
///
/// Metric: `lc_actor_mailbox_depth`
/// Labels: `actor_type` (controller, session)
pub fn set_actor_mailbox_depth(actor_type: &str, depth: usize) {
    #[allow(clippy::cast_precision_loss)]
    gauge!("lc_actor_mailbox_depth", "actor_type" => actor_type.to_string()).set(depth as f64);
}

/// Record an actor panic event.
///
/// Metric: `lc_actor_panics_total`
/// Labels: `actor_type`
///
/// ALERT: Any non-zero value indicates a bug.
pub fn record_actor_panic(actor_type: &str) {
    counter!("lc_actor_panics_total", "actor_type" => actor_type.to_string()).increment(1);
}
