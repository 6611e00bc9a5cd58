//! Ports module for the Transaction Lifecycle subsystem

pub mod inbound;
pub mod outbound;

pub use inbound::{EventReport, TrackerStats, TxLifecycleApi};
pub use outbound::{ChainReader, SettlementSink};
