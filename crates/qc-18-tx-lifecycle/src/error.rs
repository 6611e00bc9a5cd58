//! Error types for the Transaction Lifecycle subsystem
//!
//! Events come from a trusted client. Anything malformed is surfaced
//! immediately instead of being skipped.

use crate::domain::{BlockHash, TxId};
use thiserror::Error;

/// Transaction lifecycle errors
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Block announced with a parent that is not tracked (never seen or pruned)
    #[error("Unknown parent {parent} for block {block_hash}")]
    UnknownParent {
        block_hash: BlockHash,
        parent: BlockHash,
    },

    /// Block without a parent announced after the root was established
    #[error("Block {block_hash} has no parent but root {root} is already tracked")]
    OrphanBlock { block_hash: BlockHash, root: BlockHash },

    /// Block hash announced twice
    #[error("Duplicate block: {block_hash}")]
    DuplicateBlock { block_hash: BlockHash },

    /// Block referenced by an event is not tracked
    #[error("Unknown block: {block_hash}")]
    UnknownBlock { block_hash: BlockHash },

    /// Parent-link walk exceeded the configured bound
    #[error("Ancestry walk from {block_hash} exceeded {max_depth} blocks")]
    AncestryTooDeep {
        block_hash: BlockHash,
        max_depth: usize,
    },

    /// Ledger transition not allowed from the current state
    #[error("Invalid transition for transaction {tx_id}: {from} -> {to}")]
    InvalidTransition {
        tx_id: TxId,
        from: &'static str,
        to: &'static str,
    },

    /// Collaborator read API failed
    #[error("Collaborator call {method} failed: {reason}")]
    Collaborator {
        method: &'static str,
        reason: String,
    },
}

impl TrackerError {
    pub fn collaborator(method: &'static str, reason: impl Into<String>) -> Self {
        Self::Collaborator {
            method,
            reason: reason.into(),
        }
    }
}

/// Result type for lifecycle operations
pub type TrackerResult<T> = Result<T, TrackerError>;
