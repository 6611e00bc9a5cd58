//! Transaction Lifecycle Service - event dispatcher
//!
//! Routes chain events to the block tree and the ledger and emits the
//! lifecycle notifications.
//!
//! ## Event handling
//!
//! ```text
//! NewBlock(B)       ── insert B ──→ decide every pending tx against B ──→ settle (arrival order)
//! NewTransaction(t) ── observe t (idempotent)
//! Finalized(F)      ── settlements on root..F ──→ done
//!                   ── settlements on pruned branches ──→ reopen, decide again along root..F
//!                                                         ──→ settled + done, or pending
//!                   ── prune siblings + old blocks ──→ unpin removed blocks
//! ```
//!
//! Every collaborator query an event needs runs before the event commits
//! anything, so a failing query leaves the tracker exactly as it was and
//! emits nothing.

use crate::adapters::CachingChainReader;
use crate::config::TrackerConfig;
use crate::domain::{decide, BlockHash, BlockTree, Settlement, TxId, TxLedger, TxState};
use crate::error::{TrackerError, TrackerResult};
use crate::events::ChainEvent;
use crate::metrics;
use crate::ports::inbound::{EventReport, TrackerStats, TxLifecycleApi};
use crate::ports::outbound::{ChainReader, SettlementSink};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What a finalization does to one settled transaction
enum FinalStep {
    /// Settled on the newly final chain
    Complete,
    /// Settled on a branch about to be pruned, with the decision the final
    /// chain gives it
    Resettle(Option<Settlement>),
}

#[derive(Debug, Default)]
struct Counters {
    events_processed: u64,
    settled_notifications: u64,
    done_notifications: u64,
    reopened: u64,
    blocks_unpinned: u64,
}

/// Lifecycle tracker for one chain
pub struct TxLifecycleService<R, S>
where
    R: ChainReader,
    S: SettlementSink,
{
    config: TrackerConfig,
    reader: CachingChainReader<R>,
    sink: S,
    tree: BlockTree,
    ledger: TxLedger,
    last_finalized: Option<BlockHash>,
    counters: Counters,
}

impl<R, S> TxLifecycleService<R, S>
where
    R: ChainReader,
    S: SettlementSink,
{
    pub fn new(config: TrackerConfig, reader: R, sink: S) -> Self {
        let tree = BlockTree::new(config.max_ancestry_depth);
        let reader = CachingChainReader::new(reader, config.memoize_collaborator_calls);
        Self {
            config,
            reader,
            sink,
            tree,
            ledger: TxLedger::new(),
            last_finalized: None,
            counters: Counters::default(),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn reader(&self) -> &R {
        self.reader.inner()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn block_tree(&self) -> &BlockTree {
        &self.tree
    }

    pub fn ledger(&self) -> &TxLedger {
        &self.ledger
    }

    /// Decide `tx` against a single block.
    fn evaluate(&mut self, block: &BlockHash, tx: &TxId) -> TrackerResult<Option<Settlement>> {
        let reader = &self.reader;
        let included = self
            .tree
            .body(block, |hash| reader.get_body(hash))?
            .contains(tx);

        decide(
            block,
            included,
            || reader.is_tx_successful(block, tx),
            || reader.is_tx_valid(block, tx),
        )
    }

    /// Settlements produced by the arrival of `block`, in arrival order.
    ///
    /// Transactions sent back to pending by a prune are checked against the
    /// whole live chain ending at `block`, oldest first; all others only
    /// against `block`.
    fn collect_settlements(&mut self, block: &BlockHash) -> TrackerResult<Vec<(TxId, Settlement)>> {
        let pending: Vec<(TxId, bool)> = self
            .ledger
            .pending_in_arrival_order()
            .map(|entry| (entry.id.clone(), entry.needs_rescan))
            .collect();

        if pending.is_empty() {
            return Ok(Vec::new());
        }

        let single = vec![block.clone()];
        let chain = if pending.iter().any(|(_, rescan)| *rescan) {
            let mut path = self.tree.path_to_root(block)?;
            path.reverse();
            path
        } else {
            Vec::new()
        };

        let mut decisions = Vec::new();
        for (tx, rescan) in pending {
            let candidates = if rescan { &chain } else { &single };
            for candidate in candidates {
                if let Some(settlement) = self.evaluate(candidate, &tx)? {
                    decisions.push((tx, settlement));
                    break;
                }
            }
        }
        Ok(decisions)
    }

    fn emit_settled(&mut self, tx: &TxId, settlement: Settlement) -> TrackerResult<()> {
        self.ledger.settle(tx, settlement.clone())?;
        self.sink.on_tx_settled(tx, &settlement);
        self.counters.settled_notifications += 1;
        metrics::record_settled(settlement.outcome.label());

        info!(
            tx = %tx,
            block = %settlement.block_hash,
            outcome = settlement.outcome.label(),
            "Transaction settled"
        );
        Ok(())
    }

    fn emit_done(&mut self, tx: &TxId) -> TrackerResult<()> {
        let settlement = self.ledger.mark_done(tx)?;
        self.sink.on_tx_done(tx, &settlement);
        self.counters.done_notifications += 1;
        metrics::record_done();

        info!(
            tx = %tx,
            block = %settlement.block_hash,
            outcome = settlement.outcome.label(),
            "Transaction done"
        );
        Ok(())
    }

    /// Drop every block that can no longer become canonical once `finalized`
    /// is final: siblings along the newly finalized path, then the strict
    /// ancestors of `finalized`.
    fn prune_for(
        &mut self,
        finalized: &BlockHash,
        path: &[BlockHash],
    ) -> TrackerResult<Vec<BlockHash>> {
        let mut removed = Vec::new();

        // The last path element is the old root, which has no tracked siblings
        for block in path.iter().take(path.len().saturating_sub(1)) {
            for sibling in self.tree.siblings_of(block) {
                let pruned = self.tree.prune(&sibling, None);
                debug!(
                    sibling = %sibling,
                    blocks = pruned.len(),
                    "Pruned branch off finalized path"
                );
                removed.extend(pruned);
            }
        }

        removed.extend(self.tree.reroot(finalized)?);
        Ok(removed)
    }

    /// Fate of every settled transaction once `finalized` is final, in
    /// arrival order. `path` runs from `finalized` up to the current root.
    ///
    /// Settlements below `finalized` are untouched. Settlements on branches
    /// that will be pruned are decided again against the final chain, oldest
    /// block first, while its blocks are still tracked.
    fn plan_finalization(
        &mut self,
        finalized: &BlockHash,
        path: &[BlockHash],
    ) -> TrackerResult<Vec<(TxId, FinalStep)>> {
        let on_path: HashSet<&BlockHash> = path.iter().collect();
        let below: HashSet<BlockHash> = self.tree.descendants(finalized).into_iter().collect();

        let affected: Vec<(TxId, bool)> = self
            .ledger
            .settled_in_arrival_order()
            .filter_map(|entry| {
                let block = &entry.state.settlement()?.block_hash;
                if on_path.contains(block) {
                    Some((entry.id.clone(), true))
                } else if below.contains(block) {
                    None
                } else {
                    Some((entry.id.clone(), false))
                }
            })
            .collect();

        let mut plan = Vec::with_capacity(affected.len());
        for (tx, final_already) in affected {
            if final_already {
                plan.push((tx, FinalStep::Complete));
                continue;
            }

            let mut decision = None;
            for block in path.iter().rev() {
                if let Some(settlement) = self.evaluate(block, &tx)? {
                    decision = Some(settlement);
                    break;
                }
            }
            plan.push((tx, FinalStep::Resettle(decision)));
        }
        Ok(plan)
    }

    /// Send a settlement on a pruned branch back to pending.
    fn reopen(&mut self, tx: &TxId) -> TrackerResult<()> {
        let abandoned = self.ledger.reopen(tx)?;
        self.counters.reopened += 1;
        metrics::record_reopened(1);

        info!(
            tx = %tx,
            block = %abandoned.block_hash,
            "Settlement branch pruned; transaction pending again"
        );
        Ok(())
    }

    fn release(&mut self, removed: &[BlockHash]) {
        if removed.is_empty() {
            return;
        }

        if self.config.unpin_on_finalize {
            self.reader.unpin(removed);
            self.counters.blocks_unpinned += removed.len() as u64;
        } else {
            self.reader.evict(removed);
        }
        metrics::record_blocks_removed(removed.len() as u64);
    }
}

impl<R, S> TxLifecycleApi for TxLifecycleService<R, S>
where
    R: ChainReader,
    S: SettlementSink,
{
    fn handle_event(&mut self, event: ChainEvent) -> TrackerResult<EventReport> {
        let _span = tracing::debug_span!("chain_event", kind = event.kind()).entered();

        let report = match event {
            ChainEvent::NewBlock { block_hash, parent } => self.on_new_block(block_hash, parent),
            ChainEvent::NewTransaction { value } => self.on_new_transaction(value),
            ChainEvent::Finalized { block_hash } => self.on_finalized(block_hash),
        }?;

        self.counters.events_processed += 1;
        metrics::set_pending(self.ledger.pending_count());
        Ok(report)
    }

    fn on_new_block(
        &mut self,
        block_hash: BlockHash,
        parent: Option<BlockHash>,
    ) -> TrackerResult<EventReport> {
        debug!(block = %block_hash, parent = ?parent, "New block");

        if let Err(e) = self.tree.insert(block_hash.clone(), parent) {
            warn!(block = %block_hash, error = %e, "Rejected block");
            return Err(e);
        }

        let decisions = match self.collect_settlements(&block_hash) {
            Ok(decisions) => decisions,
            Err(e) => {
                self.tree.detach_leaf(&block_hash);
                warn!(block = %block_hash, error = %e, "Block processing aborted");
                return Err(e);
            }
        };

        let mut report = EventReport::empty();
        for (tx, settlement) in decisions {
            self.emit_settled(&tx, settlement)?;
            report.settled += 1;
        }
        Ok(report)
    }

    fn on_new_transaction(&mut self, tx_id: TxId) -> TrackerResult<EventReport> {
        match self.ledger.observe(tx_id.clone()) {
            Some(seq) => debug!(tx = %tx_id, arrival_seq = seq, "New transaction"),
            None => debug!(tx = %tx_id, "Duplicate transaction announcement ignored"),
        }
        Ok(EventReport::empty())
    }

    fn on_finalized(&mut self, block_hash: BlockHash) -> TrackerResult<EventReport> {
        if self.last_finalized.as_ref() == Some(&block_hash) {
            debug!(block = %block_hash, "Block already finalized");
            return Ok(EventReport::empty());
        }

        if !self.tree.contains(&block_hash) {
            let e = TrackerError::UnknownBlock { block_hash };
            warn!(error = %e, "Rejected finalization");
            return Err(e);
        }

        // F up to and including the previous final block (the current root)
        let path = self.tree.path_to_root(&block_hash)?;

        let plan = match self.plan_finalization(&block_hash, &path) {
            Ok(plan) => plan,
            Err(e) => {
                warn!(block = %block_hash, error = %e, "Finalization aborted");
                return Err(e);
            }
        };

        let mut report = EventReport::empty();
        for (tx, step) in plan {
            match step {
                FinalStep::Complete => {
                    self.emit_done(&tx)?;
                    report.done += 1;
                }
                FinalStep::Resettle(decision) => {
                    self.reopen(&tx)?;
                    report.reopened += 1;

                    // Decided on a block that is final as of this event
                    if let Some(settlement) = decision {
                        self.emit_settled(&tx, settlement)?;
                        self.emit_done(&tx)?;
                        report.settled += 1;
                        report.done += 1;
                    }
                }
            }
        }

        let removed = self.prune_for(&block_hash, &path)?;
        self.release(&removed);

        info!(
            block = %block_hash,
            newly_final = path.len(),
            done = report.done,
            removed = removed.len(),
            reopened = report.reopened,
            "Block finalized"
        );

        self.last_finalized = Some(block_hash);
        report.removed_blocks = removed;
        Ok(report)
    }

    fn tx_state(&self, tx_id: &TxId) -> Option<TxState> {
        self.ledger.state(tx_id).cloned()
    }

    fn last_finalized(&self) -> Option<BlockHash> {
        self.last_finalized.clone()
    }

    fn tracked_blocks(&self) -> usize {
        self.tree.len()
    }

    fn pending_count(&self) -> usize {
        self.ledger.pending_count()
    }

    fn stats(&self) -> TrackerStats {
        TrackerStats {
            tracked_blocks: self.tree.len(),
            transactions: self.ledger.len(),
            pending: self.ledger.pending_count(),
            settled: self.ledger.settled_count(),
            done: self.ledger.done_count(),
            events_processed: self.counters.events_processed,
            settled_notifications: self.counters.settled_notifications,
            done_notifications: self.counters.done_notifications,
            reopened: self.counters.reopened,
            blocks_unpinned: self.counters.blocks_unpinned,
        }
    }
}

/// Thread-safe handle: the whole tracker behind one lock.
pub struct SharedTxLifecycleService<R, S>
where
    R: ChainReader,
    S: SettlementSink,
{
    inner: Arc<Mutex<TxLifecycleService<R, S>>>,
}

impl<R, S> Clone for SharedTxLifecycleService<R, S>
where
    R: ChainReader,
    S: SettlementSink,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R, S> SharedTxLifecycleService<R, S>
where
    R: ChainReader,
    S: SettlementSink,
{
    pub fn new(service: TxLifecycleService<R, S>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(service)),
        }
    }

    pub fn handle_event(&self, event: ChainEvent) -> TrackerResult<EventReport> {
        self.inner.lock().handle_event(event)
    }

    pub fn tx_state(&self, tx_id: &TxId) -> Option<TxState> {
        self.inner.lock().tx_state(tx_id)
    }

    pub fn stats(&self) -> TrackerStats {
        self.inner.lock().stats()
    }

    /// Run `f` with exclusive access to the tracker.
    pub fn with<T>(&self, f: impl FnOnce(&mut TxLifecycleService<R, S>) -> T) -> T {
        f(&mut self.inner.lock())
    }
}
