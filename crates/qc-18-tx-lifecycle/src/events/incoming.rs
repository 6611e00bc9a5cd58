//! Incoming events from the chain client
//!
//! Wire format matches the client's JSON event log:
//! `{"type":"newBlock","blockHash":"0x..","parent":"0x.."}`,
//! `{"type":"newTransaction","value":"0x.."}`,
//! `{"type":"finalized","blockHash":"0x.."}`.

use crate::domain::{BlockHash, TxId};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ChainEvent {
    #[serde(rename_all = "camelCase")]
    NewBlock {
        block_hash: BlockHash,
        #[serde(default)]
        parent: Option<BlockHash>,
    },
    NewTransaction { value: TxId },
    #[serde(rename_all = "camelCase")]
    Finalized { block_hash: BlockHash },
}

impl ChainEvent {
    pub fn new_block(block_hash: impl Into<BlockHash>, parent: impl Into<BlockHash>) -> Self {
        ChainEvent::NewBlock {
            block_hash: block_hash.into(),
            parent: Some(parent.into()),
        }
    }

    pub fn genesis(block_hash: impl Into<BlockHash>) -> Self {
        ChainEvent::NewBlock {
            block_hash: block_hash.into(),
            parent: None,
        }
    }

    pub fn new_transaction(tx_id: impl Into<TxId>) -> Self {
        ChainEvent::NewTransaction {
            value: tx_id.into(),
        }
    }

    pub fn finalized(block_hash: impl Into<BlockHash>) -> Self {
        ChainEvent::Finalized {
            block_hash: block_hash.into(),
        }
    }

    /// Short name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            ChainEvent::NewBlock { .. } => "newBlock",
            ChainEvent::NewTransaction { .. } => "newTransaction",
            ChainEvent::Finalized { .. } => "finalized",
        }
    }
}
