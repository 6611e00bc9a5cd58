//! # Transaction Lifecycle Metrics
//!
//! Prometheus metrics for monitoring settlement and finality flow.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! qc-18-tx-lifecycle = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `tx_lifecycle_settled_total` - Settled notifications (by outcome)
//! - `tx_lifecycle_done_total` - Done notifications
//! - `tx_lifecycle_reopened_total` - Settlements abandoned by a prune
//! - `tx_lifecycle_blocks_removed_total` - Blocks pruned or superseded
//! - `tx_lifecycle_collaborator_calls_total` - Chain reader calls (by method)
//! - `tx_lifecycle_cache_hits_total` - Memoized answers (by method)
//! - `tx_lifecycle_pending` - Transactions waiting for a settling block

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, IntCounter,
    IntCounterVec, IntGauge,
};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Settled notifications, labeled by outcome
    pub static ref SETTLED: IntCounterVec = register_int_counter_vec!(
        "tx_lifecycle_settled_total",
        "Total number of settled notifications",
        &["outcome"]
    )
    .expect("Failed to create SETTLED metric");

    /// Done notifications
    pub static ref DONE: IntCounter = register_int_counter!(
        "tx_lifecycle_done_total",
        "Total number of done notifications"
    )
    .expect("Failed to create DONE metric");

    /// Settlements abandoned by a prune
    pub static ref REOPENED: IntCounter = register_int_counter!(
        "tx_lifecycle_reopened_total",
        "Total number of settlements abandoned after their branch was pruned"
    )
    .expect("Failed to create REOPENED metric");

    /// Blocks removed from the tree
    pub static ref BLOCKS_REMOVED: IntCounter = register_int_counter!(
        "tx_lifecycle_blocks_removed_total",
        "Total number of blocks pruned or superseded by finality"
    )
    .expect("Failed to create BLOCKS_REMOVED metric");

    /// Chain reader calls, labeled by method
    pub static ref COLLABORATOR_CALLS: IntCounterVec = register_int_counter_vec!(
        "tx_lifecycle_collaborator_calls_total",
        "Total number of chain reader calls",
        &["method"]
    )
    .expect("Failed to create COLLABORATOR_CALLS metric");

    /// Memoized answers, labeled by method
    pub static ref CACHE_HITS: IntCounterVec = register_int_counter_vec!(
        "tx_lifecycle_cache_hits_total",
        "Total number of chain reader answers served from cache",
        &["method"]
    )
    .expect("Failed to create CACHE_HITS metric");

    /// Pending transactions
    pub static ref PENDING: IntGauge = register_int_gauge!(
        "tx_lifecycle_pending",
        "Transactions waiting for a settling block"
    )
    .expect("Failed to create PENDING metric");
}

// =============================================================================
// METRIC RECORDING FUNCTIONS
// =============================================================================

#[cfg(feature = "metrics")]
pub fn record_settled(outcome: &str) {
    SETTLED.with_label_values(&[outcome]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_done() {
    DONE.inc();
}

#[cfg(feature = "metrics")]
pub fn record_reopened(count: u64) {
    REOPENED.inc_by(count);
}

#[cfg(feature = "metrics")]
pub fn record_blocks_removed(count: u64) {
    BLOCKS_REMOVED.inc_by(count);
}

#[cfg(feature = "metrics")]
pub fn record_collaborator_call(method: &str) {
    COLLABORATOR_CALLS.with_label_values(&[method]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_cache_hit(method: &str) {
    CACHE_HITS.with_label_values(&[method]).inc();
}

#[cfg(feature = "metrics")]
pub fn set_pending(count: usize) {
    PENDING.set(count as i64);
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub fn record_settled(_outcome: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_done() {}

#[cfg(not(feature = "metrics"))]
pub fn record_reopened(_count: u64) {}

#[cfg(not(feature = "metrics"))]
pub fn record_blocks_removed(_count: u64) {}

#[cfg(not(feature = "metrics"))]
pub fn record_collaborator_call(_method: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_cache_hit(_method: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn set_pending(_count: usize) {}
