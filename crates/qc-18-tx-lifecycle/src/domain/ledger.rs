//! # Transaction Ledger
//!
//! Every transaction ever observed, in arrival order, with its lifecycle
//! state. Arrival order is the output order: whenever several transactions
//! transition in the same event their notifications follow `arrival_seq`.
//!
//! Entries are never removed, so a re-announced transaction is recognised
//! even after it is done. Done transactions leave the live index, which keeps
//! the per-block scans proportional to the undecided set.

use super::transition::{next_state, TxEvent, TxState};
use super::value_objects::{BlockHash, Settlement, TxId};
use crate::error::{TrackerError, TrackerResult};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Ledger record of one transaction
#[derive(Clone, Debug)]
pub struct LedgerEntry {
    pub id: TxId,
    pub arrival_seq: u64,
    pub state: TxState,
    /// Set when a prune sent the transaction back to pending; the next block
    /// event evaluates it against the whole live chain instead of one block.
    pub needs_rescan: bool,
}

/// Arrival-ordered transaction store
#[derive(Debug, Default)]
pub struct TxLedger {
    entries: HashMap<TxId, LedgerEntry>,
    /// Not-yet-done transactions by arrival sequence
    live: BTreeMap<u64, TxId>,
    /// Settled (not done) transactions grouped by settlement block
    settled_by_block: HashMap<BlockHash, BTreeSet<u64>>,
    next_seq: u64,
}

impl TxLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a transaction arrival. Returns the assigned sequence number
    /// for a new transaction, `None` for a duplicate announcement.
    pub fn observe(&mut self, tx_id: TxId) -> Option<u64> {
        if self.entries.contains_key(&tx_id) {
            return None;
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.live.insert(seq, tx_id.clone());
        self.entries.insert(
            tx_id.clone(),
            LedgerEntry {
                id: tx_id,
                arrival_seq: seq,
                state: TxState::Pending,
                needs_rescan: false,
            },
        );
        Some(seq)
    }

    pub fn contains(&self, tx_id: &TxId) -> bool {
        self.entries.contains_key(tx_id)
    }

    pub fn get(&self, tx_id: &TxId) -> Option<&LedgerEntry> {
        self.entries.get(tx_id)
    }

    pub fn state(&self, tx_id: &TxId) -> Option<&TxState> {
        self.entries.get(tx_id).map(|e| &e.state)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn live_in_arrival_order(&self) -> impl Iterator<Item = &LedgerEntry> + '_ {
        self.live
            .values()
            .filter_map(move |tx_id| self.entries.get(tx_id))
    }

    /// Pending transactions, oldest arrival first.
    ///
    /// Lazy; call again to restart.
    pub fn pending_in_arrival_order(&self) -> impl Iterator<Item = &LedgerEntry> + '_ {
        self.live_in_arrival_order()
            .filter(|entry| entry.state.is_pending())
    }

    /// Settled (not done) transactions, oldest arrival first.
    pub fn settled_in_arrival_order(&self) -> impl Iterator<Item = &LedgerEntry> + '_ {
        self.live_in_arrival_order()
            .filter(|entry| entry.state.is_settled())
    }

    /// Settled transactions whose settlement block is in `blocks`, oldest
    /// arrival first.
    pub fn settled_on(&self, blocks: &HashSet<BlockHash>) -> Vec<TxId> {
        let seqs: BTreeSet<u64> = blocks
            .iter()
            .filter_map(|block| self.settled_by_block.get(block))
            .flatten()
            .copied()
            .collect();

        seqs.iter()
            .filter_map(|seq| self.live.get(seq))
            .cloned()
            .collect()
    }

    pub fn pending_count(&self) -> usize {
        self.pending_in_arrival_order().count()
    }

    pub fn settled_count(&self) -> usize {
        self.settled_by_block.values().map(BTreeSet::len).sum()
    }

    pub fn done_count(&self) -> usize {
        self.entries.len() - self.live.len()
    }

    fn apply(&mut self, tx_id: &TxId, event: TxEvent) -> TrackerResult<&mut LedgerEntry> {
        let entry = self
            .entries
            .get_mut(tx_id)
            .ok_or_else(|| TrackerError::InvalidTransition {
                tx_id: tx_id.clone(),
                from: "unknown",
                to: event.target_name(),
            })?;

        let target = event.target_name();
        let next = next_state(&entry.state, event).ok_or(TrackerError::InvalidTransition {
            tx_id: tx_id.clone(),
            from: entry.state.name(),
            to: target,
        })?;
        entry.state = next;
        Ok(entry)
    }

    /// Pending → Settled
    pub fn settle(&mut self, tx_id: &TxId, settlement: Settlement) -> TrackerResult<()> {
        let block = settlement.block_hash.clone();
        let entry = self.apply(tx_id, TxEvent::Settle(settlement))?;
        entry.needs_rescan = false;
        let seq = entry.arrival_seq;

        self.settled_by_block.entry(block).or_default().insert(seq);
        Ok(())
    }

    /// Settled → Done. Returns the recorded settlement.
    pub fn mark_done(&mut self, tx_id: &TxId) -> TrackerResult<Settlement> {
        let entry = self.apply(tx_id, TxEvent::Finalize)?;
        let seq = entry.arrival_seq;
        let settlement = entry
            .state
            .settlement()
            .cloned()
            .ok_or(TrackerError::InvalidTransition {
                tx_id: tx_id.clone(),
                from: "settled",
                to: "done",
            })?;

        self.unindex(&settlement.block_hash, seq);
        self.live.remove(&seq);
        Ok(settlement)
    }

    /// Settled → Pending, after the settlement block was pruned.
    /// Returns the abandoned settlement.
    pub fn reopen(&mut self, tx_id: &TxId) -> TrackerResult<Settlement> {
        let abandoned = self
            .state(tx_id)
            .and_then(TxState::settlement)
            .cloned()
            .ok_or(TrackerError::InvalidTransition {
                tx_id: tx_id.clone(),
                from: "pending",
                to: "pending",
            })?;

        let entry = self.apply(tx_id, TxEvent::BranchPruned)?;
        entry.needs_rescan = true;
        let seq = entry.arrival_seq;

        self.unindex(&abandoned.block_hash, seq);
        Ok(abandoned)
    }

    fn unindex(&mut self, block: &BlockHash, seq: u64) {
        if let Some(seqs) = self.settled_by_block.get_mut(block) {
            seqs.remove(&seq);
            if seqs.is_empty() {
                self.settled_by_block.remove(block);
            }
        }
    }
}
