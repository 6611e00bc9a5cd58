//! Value objects for the Transaction Lifecycle subsystem.
//!
//! Opaque identifiers handed to us by the chain client, plus the settlement
//! record reported through the output port.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque block identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockHash(String);

impl BlockHash {
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlockHash {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for BlockHash {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Opaque transaction identifier, unique per submission.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxId(String);

impl TxId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TxId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TxId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Fate of a transaction on the branch where it settled.
///
/// Serialized the way the chain client reports it:
/// `{"type":"valid","successful":true}` or `{"type":"invalid"}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Outcome {
    /// Can never be included on this branch.
    Invalid,
    /// Included in the settling block.
    Valid { successful: bool },
}

impl Outcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, Outcome::Valid { .. })
    }

    /// Label used for logs and metric dimensions.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Invalid => "invalid",
            Outcome::Valid { successful: true } => "successful",
            Outcome::Valid { successful: false } => "failed",
        }
    }
}

/// The block at which a transaction's fate was decided, and that fate.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settlement {
    pub block_hash: BlockHash,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl Settlement {
    pub fn new(block_hash: BlockHash, outcome: Outcome) -> Self {
        Self {
            block_hash,
            outcome,
        }
    }

    pub fn valid(block_hash: BlockHash, successful: bool) -> Self {
        Self::new(block_hash, Outcome::Valid { successful })
    }

    pub fn invalid(block_hash: BlockHash) -> Self {
        Self::new(block_hash, Outcome::Invalid)
    }
}
