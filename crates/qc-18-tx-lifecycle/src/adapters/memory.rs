//! In-memory adapters.
//!
//! `InMemoryChain` answers chain queries from a scripted block table and
//! counts every call, so redundant collaborator traffic is observable.
//! `RecordingSink` keeps every notification in emission order.

use crate::domain::{BlockHash, Settlement, TxId};
use crate::error::{TrackerError, TrackerResult};
use crate::events::{NotificationKind, TxNotification};
use crate::ports::outbound::{ChainReader, SettlementSink};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Scripted answers for one block.
///
/// Transactions missing from `valid` / `successful` default to `true`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedBlock {
    #[serde(default)]
    pub body: Vec<TxId>,
    #[serde(default)]
    pub valid: HashMap<TxId, bool>,
    #[serde(default)]
    pub successful: HashMap<TxId, bool>,
}

/// Collaborator call counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallCounts {
    pub get_body: usize,
    pub is_tx_valid: usize,
    pub is_tx_successful: usize,
    /// Calls that repeated an earlier call with identical arguments
    pub redundant: usize,
}

impl CallCounts {
    pub fn total(&self) -> usize {
        self.get_body + self.is_tx_valid + self.is_tx_successful
    }
}

#[derive(Default)]
struct CallLog {
    counts: CallCounts,
    seen: HashSet<(&'static str, BlockHash, Option<TxId>)>,
}

impl CallLog {
    fn record(&mut self, method: &'static str, block: &BlockHash, tx: Option<&TxId>) {
        match method {
            "get_body" => self.counts.get_body += 1,
            "is_tx_valid" => self.counts.is_tx_valid += 1,
            _ => self.counts.is_tx_successful += 1,
        }
        if !self.seen.insert((method, block.clone(), tx.cloned())) {
            self.counts.redundant += 1;
        }
    }
}

/// Scripted chain reader
#[derive(Default)]
pub struct InMemoryChain {
    blocks: HashMap<BlockHash, ScriptedBlock>,
    failing: HashSet<BlockHash>,
    calls: Mutex<CallLog>,
    unpinned: Mutex<Vec<BlockHash>>,
}

impl InMemoryChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_blocks(blocks: HashMap<BlockHash, ScriptedBlock>) -> Self {
        Self {
            blocks,
            ..Self::default()
        }
    }

    fn block_mut(&mut self, block: &str) -> &mut ScriptedBlock {
        self.blocks.entry(BlockHash::from(block)).or_default()
    }

    /// Set the body of `block`
    pub fn with_body(mut self, block: &str, txs: &[&str]) -> Self {
        self.block_mut(block).body = txs.iter().map(|t| TxId::from(*t)).collect();
        self
    }

    /// Script `is_tx_valid(block, tx)`
    pub fn with_validity(mut self, block: &str, tx: &str, valid: bool) -> Self {
        self.block_mut(block).valid.insert(TxId::from(tx), valid);
        self
    }

    /// Script `is_tx_successful(block, tx)`
    pub fn with_success(mut self, block: &str, tx: &str, successful: bool) -> Self {
        self.block_mut(block)
            .successful
            .insert(TxId::from(tx), successful);
        self
    }

    /// Every query about `block` fails
    pub fn with_failing_block(mut self, block: &str) -> Self {
        self.failing.insert(BlockHash::from(block));
        self
    }

    pub fn calls(&self) -> CallCounts {
        self.calls.lock().counts
    }

    /// Every hash passed to `unpin`, in call order
    pub fn unpinned(&self) -> Vec<BlockHash> {
        self.unpinned.lock().clone()
    }

    fn check(&self, method: &'static str, block: &BlockHash) -> TrackerResult<()> {
        if self.failing.contains(block) {
            return Err(TrackerError::collaborator(
                method,
                format!("block {} unavailable", block),
            ));
        }
        Ok(())
    }
}

impl ChainReader for InMemoryChain {
    fn get_body(&self, block: &BlockHash) -> TrackerResult<Vec<TxId>> {
        self.calls.lock().record("get_body", block, None);
        self.check("get_body", block)?;
        Ok(self
            .blocks
            .get(block)
            .map(|b| b.body.clone())
            .unwrap_or_default())
    }

    fn is_tx_valid(&self, block: &BlockHash, tx: &TxId) -> TrackerResult<bool> {
        self.calls.lock().record("is_tx_valid", block, Some(tx));
        self.check("is_tx_valid", block)?;
        Ok(self
            .blocks
            .get(block)
            .and_then(|b| b.valid.get(tx).copied())
            .unwrap_or(true))
    }

    fn is_tx_successful(&self, block: &BlockHash, tx: &TxId) -> TrackerResult<bool> {
        self.calls.lock().record("is_tx_successful", block, Some(tx));
        self.check("is_tx_successful", block)?;
        Ok(self
            .blocks
            .get(block)
            .and_then(|b| b.successful.get(tx).copied())
            .unwrap_or(true))
    }

    fn unpin(&self, blocks: &[BlockHash]) {
        self.unpinned.lock().extend(blocks.iter().cloned());
    }
}

/// Sink that records notifications in order
#[derive(Default)]
pub struct RecordingSink {
    log: Mutex<Vec<TxNotification>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<TxNotification> {
        self.log.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.log.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.lock().is_empty()
    }

    fn of_kind(&self, kind: NotificationKind) -> Vec<(TxId, Settlement)> {
        self.log
            .lock()
            .iter()
            .filter(|n| n.kind == kind)
            .map(|n| (n.tx_id.clone(), n.settlement.clone()))
            .collect()
    }

    /// Settled notifications in emission order
    pub fn settled(&self) -> Vec<(TxId, Settlement)> {
        self.of_kind(NotificationKind::Settled)
    }

    /// Done notifications in emission order
    pub fn done(&self) -> Vec<(TxId, Settlement)> {
        self.of_kind(NotificationKind::Done)
    }

    /// Drop everything recorded so far
    pub fn clear(&self) {
        self.log.lock().clear();
    }
}

impl SettlementSink for RecordingSink {
    fn on_tx_settled(&self, tx: &TxId, settlement: &Settlement) {
        self.log
            .lock()
            .push(TxNotification::settled(tx.clone(), settlement.clone()));
    }

    fn on_tx_done(&self, tx: &TxId, settlement: &Settlement) {
        self.log
            .lock()
            .push(TxNotification::done(tx.clone(), settlement.clone()));
    }
}
