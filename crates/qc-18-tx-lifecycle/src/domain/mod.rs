//! Domain module for the Transaction Lifecycle subsystem
//!
//! ## Core Modules
//! - block_tree: fork tree of live blocks with ancestry queries and pruning
//! - ledger: arrival-ordered transaction store
//! - transition: pure lifecycle state machine
//! - value_objects: identifiers and settlement records

pub mod block_tree;
pub mod ledger;
pub mod transition;
pub mod value_objects;

pub use block_tree::{BlockBody, BlockNode, BlockTree};
pub use ledger::{LedgerEntry, TxLedger};
pub use transition::{decide, next_state, TxEvent, TxState};
pub use value_objects::{BlockHash, Outcome, Settlement, TxId};
