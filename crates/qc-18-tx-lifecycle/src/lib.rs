//! # qc-18-tx-lifecycle
//!
//! Transaction lifecycle tracker for a forking block tree.
//!
//! ## Overview
//!
//! This subsystem provides:
//! - **Settlement**: the first block on a live branch that decides a
//!   transaction's fate (included, or invalid against that block's state)
//! - **Done**: settlement block finalized, outcome final
//! - **Reorg handling**: settlements on pruned branches go back to pending
//!   and are decided again on the surviving chain
//! - **Frugal queries**: bodies and predicate answers are fetched at most once
//!   per block while the block is tracked
//!
//! ## Architecture
//!
//! ```text
//! Chain client ──ChainEvent──→ Tx Lifecycle (18)
//!                                   │
//!                                   ├── get_body / is_tx_valid / is_tx_successful ──→ ChainReader
//!                                   ├── unpin(pruned blocks) ──→ ChainReader
//!                                   │
//!                                   └── on_tx_settled / on_tx_done ──→ SettlementSink
//! ```
//!
//! ## Transaction Lifecycle
//!
//! ```text
//! [PENDING] ──settle──→ [SETTLED] ──finalize──→ [DONE]
//!     ↑                     │
//!     └──── branch pruned ──┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use qc_18_tx_lifecycle::{ChainEvent, TrackerConfig, TxLifecycleService};
//! use qc_18_tx_lifecycle::ports::inbound::TxLifecycleApi;
//!
//! let mut service = TxLifecycleService::new(TrackerConfig::from_env(), chain_reader, sink);
//!
//! service.handle_event(ChainEvent::genesis("0x00"))?;
//! service.handle_event(ChainEvent::new_transaction("0xt1"))?;
//! service.handle_event(ChainEvent::new_block("0x01", "0x00"))?;
//! service.handle_event(ChainEvent::finalized("0x01"))?;
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod events;
pub mod metrics;
pub mod ports;
pub mod service;

pub use adapters::{CachingChainReader, CallCounts, InMemoryChain, RecordingSink, ScriptedBlock};
pub use config::TrackerConfig;
pub use domain::{
    BlockBody, BlockHash, BlockNode, BlockTree, LedgerEntry, Outcome, Settlement, TxEvent,
    TxId, TxLedger, TxState,
};
pub use error::{TrackerError, TrackerResult};
pub use events::{ChainEvent, NotificationKind, TxNotification};
pub use ports::inbound::{EventReport, TrackerStats, TxLifecycleApi};
pub use ports::outbound::{ChainReader, SettlementSink};
pub use service::{SharedTxLifecycleService, TxLifecycleService};
