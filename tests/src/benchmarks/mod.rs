//! # Quantum-Chain Benchmarks
//!
//! Performance benchmarks for the transaction lifecycle tracker.

pub mod qc_18_tx_lifecycle;
