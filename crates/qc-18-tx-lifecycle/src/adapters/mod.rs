//! Adapters for the Transaction Lifecycle subsystem
//!
//! - caching: memoizing decorator over any chain reader
//! - memory: scripted chain and recording sink for replay and tests

pub mod caching;
pub mod memory;

pub use caching::CachingChainReader;
pub use memory::{CallCounts, InMemoryChain, RecordingSink, ScriptedBlock};
