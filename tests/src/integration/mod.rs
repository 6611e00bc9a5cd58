//! # Integration Tests
//!
//! Cross-module flows of the transaction lifecycle tracker.

pub mod lifecycle_flows;
