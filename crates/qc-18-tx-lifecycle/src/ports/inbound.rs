//! Driving Ports (API - Inbound)

use crate::domain::{BlockHash, TxId, TxState};
use crate::error::TrackerResult;
use crate::events::ChainEvent;
use serde::Serialize;

/// Summary of what one event changed
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventReport {
    /// Settled notifications emitted
    pub settled: usize,
    /// Done notifications emitted
    pub done: usize,
    /// Transactions sent back to pending by a prune
    pub reopened: usize,
    /// Blocks dropped from the tree (and unpinned)
    pub removed_blocks: Vec<BlockHash>,
}

impl EventReport {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Snapshot of tracker counters
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerStats {
    pub tracked_blocks: usize,
    pub transactions: usize,
    pub pending: usize,
    pub settled: usize,
    pub done: usize,
    pub events_processed: u64,
    pub settled_notifications: u64,
    pub done_notifications: u64,
    pub reopened: u64,
    pub blocks_unpinned: u64,
}

/// Primary Transaction Lifecycle API
///
/// One instance tracks one chain. Events must be fed strictly in the order
/// the client produced them; each call finishes all of its notifications
/// before returning.
pub trait TxLifecycleApi {
    /// Dispatch any chain event
    fn handle_event(&mut self, event: ChainEvent) -> TrackerResult<EventReport>;

    /// A new block arrived
    fn on_new_block(
        &mut self,
        block_hash: BlockHash,
        parent: Option<BlockHash>,
    ) -> TrackerResult<EventReport>;

    /// A transaction was submitted
    fn on_new_transaction(&mut self, tx_id: TxId) -> TrackerResult<EventReport>;

    /// A block was announced final
    fn on_finalized(&mut self, block_hash: BlockHash) -> TrackerResult<EventReport>;

    /// Current lifecycle state of a transaction
    fn tx_state(&self, tx_id: &TxId) -> Option<TxState>;

    /// Last announced final block
    fn last_finalized(&self) -> Option<BlockHash>;

    /// Number of blocks currently tracked
    fn tracked_blocks(&self) -> usize;

    /// Number of transactions waiting for a settling block
    fn pending_count(&self) -> usize;

    /// Counter snapshot
    fn stats(&self) -> TrackerStats;
}
