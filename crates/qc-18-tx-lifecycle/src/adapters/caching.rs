//! Memoizing chain reader.
//!
//! Wraps a [`ChainReader`] and answers repeated `is_tx_valid` /
//! `is_tx_successful` queries from memory. Bodies pass straight through since
//! the block tree already caches them per node. Entries for a block are
//! dropped when the block is unpinned or evicted, because the tracker never
//! asks about a removed block again.

use crate::domain::{BlockHash, TxId};
use crate::error::TrackerResult;
use crate::metrics;
use crate::ports::outbound::ChainReader;
use parking_lot::Mutex;
use std::collections::HashMap;

type AnswerCache = HashMap<BlockHash, HashMap<TxId, bool>>;

pub struct CachingChainReader<R> {
    inner: R,
    enabled: bool,
    validity: Mutex<AnswerCache>,
    success: Mutex<AnswerCache>,
}

impl<R: ChainReader> CachingChainReader<R> {
    pub fn new(inner: R, enabled: bool) -> Self {
        Self {
            inner,
            enabled,
            validity: Mutex::new(HashMap::new()),
            success: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Number of memoized answers across both predicates
    pub fn cached_answers(&self) -> usize {
        let count = |cache: &Mutex<AnswerCache>| {
            cache.lock().values().map(HashMap::len).sum::<usize>()
        };
        count(&self.validity) + count(&self.success)
    }

    /// Forget every answer recorded for `blocks`.
    pub fn evict(&self, blocks: &[BlockHash]) {
        let mut validity = self.validity.lock();
        let mut success = self.success.lock();
        for block in blocks {
            validity.remove(block);
            success.remove(block);
        }
    }

    fn memoized<F>(
        &self,
        cache: &Mutex<AnswerCache>,
        method: &'static str,
        block: &BlockHash,
        tx: &TxId,
        query: F,
    ) -> TrackerResult<bool>
    where
        F: FnOnce() -> TrackerResult<bool>,
    {
        if !self.enabled {
            metrics::record_collaborator_call(method);
            return query();
        }

        if let Some(answer) = cache.lock().get(block).and_then(|answers| answers.get(tx)) {
            metrics::record_cache_hit(method);
            return Ok(*answer);
        }

        // Lock released while the collaborator runs; errors are not cached
        metrics::record_collaborator_call(method);
        let answer = query()?;
        cache
            .lock()
            .entry(block.clone())
            .or_default()
            .insert(tx.clone(), answer);
        Ok(answer)
    }
}

impl<R: ChainReader> ChainReader for CachingChainReader<R> {
    fn get_body(&self, block: &BlockHash) -> TrackerResult<Vec<TxId>> {
        metrics::record_collaborator_call("get_body");
        self.inner.get_body(block)
    }

    fn is_tx_valid(&self, block: &BlockHash, tx: &TxId) -> TrackerResult<bool> {
        self.memoized(&self.validity, "is_tx_valid", block, tx, || {
            self.inner.is_tx_valid(block, tx)
        })
    }

    fn is_tx_successful(&self, block: &BlockHash, tx: &TxId) -> TrackerResult<bool> {
        self.memoized(&self.success, "is_tx_successful", block, tx, || {
            self.inner.is_tx_successful(block, tx)
        })
    }

    fn unpin(&self, blocks: &[BlockHash]) {
        self.evict(blocks);
        self.inner.unpin(blocks);
    }
}
