//! Driven Ports (SPI - Outbound Dependencies)
//!
//! The chain client answers read-only questions about blocks and receives
//! unpin hints. The settlement sink receives the two lifecycle
//! notifications. Both are called synchronously from inside event handling.

use crate::domain::{BlockHash, Settlement, TxId};
use crate::error::TrackerResult;
use std::sync::Arc;

/// Read access to the chain client
///
/// Calls are treated as deterministic and potentially expensive. The tracker
/// never issues the same query twice for a block it still tracks when
/// memoization is enabled.
pub trait ChainReader: Send + Sync {
    /// Ordered transaction ids included in `block`
    fn get_body(&self, block: &BlockHash) -> TrackerResult<Vec<TxId>>;

    /// Whether `tx` can still be included on the branch ending at `block`
    fn is_tx_valid(&self, block: &BlockHash, tx: &TxId) -> TrackerResult<bool>;

    /// Whether `tx`, included in `block`, executed successfully
    fn is_tx_successful(&self, block: &BlockHash, tx: &TxId) -> TrackerResult<bool>;

    /// Release hint for blocks the tracker will never query again.
    /// Fire-and-forget.
    fn unpin(&self, blocks: &[BlockHash]);
}

/// Receiver of lifecycle notifications
pub trait SettlementSink: Send + Sync {
    /// Transaction fate decided on some branch
    fn on_tx_settled(&self, tx: &TxId, settlement: &Settlement);

    /// Settling block finalized. Called once per transaction, ever.
    fn on_tx_done(&self, tx: &TxId, settlement: &Settlement);
}

impl<T: ChainReader + ?Sized> ChainReader for Arc<T> {
    fn get_body(&self, block: &BlockHash) -> TrackerResult<Vec<TxId>> {
        (**self).get_body(block)
    }

    fn is_tx_valid(&self, block: &BlockHash, tx: &TxId) -> TrackerResult<bool> {
        (**self).is_tx_valid(block, tx)
    }

    fn is_tx_successful(&self, block: &BlockHash, tx: &TxId) -> TrackerResult<bool> {
        (**self).is_tx_successful(block, tx)
    }

    fn unpin(&self, blocks: &[BlockHash]) {
        (**self).unpin(blocks)
    }
}

impl<T: SettlementSink + ?Sized> SettlementSink for Arc<T> {
    fn on_tx_settled(&self, tx: &TxId, settlement: &Settlement) {
        (**self).on_tx_settled(tx, settlement)
    }

    fn on_tx_done(&self, tx: &TxId, settlement: &Settlement) {
        (**self).on_tx_done(tx, settlement)
    }
}
