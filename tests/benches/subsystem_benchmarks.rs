//! # Quantum-Chain Subsystem Benchmarks
//!
//! | Subsystem | Claim | Target |
//! |-----------|-------|--------|
//! | qc-18 Tx Lifecycle | NewBlock scan over 10k pending | < 10ms |
//! | qc-18 Tx Lifecycle | Finalize with 500 losing branches | < 5ms |
//! | qc-18 Tx Lifecycle | Re-settle 5k reopened txs | < 20ms |

use criterion::{criterion_group, criterion_main};

use qc_tests::benchmarks::qc_18_tx_lifecycle::{
    brutal_fork_prune, brutal_pending_scan, brutal_reorg_resettlement,
};

criterion_group!(
    benches,
    brutal_pending_scan,
    brutal_fork_prune,
    brutal_reorg_resettlement,
);

criterion_main!(benches);
