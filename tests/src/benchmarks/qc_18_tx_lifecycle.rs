//! # QC-18 Transaction Lifecycle Benchmarks
//!
//! Claims to validate:
//! - NewBlock scan: O(pending) per block, one body fetch per block
//! - Finalized: O(path + pruned blocks + settled on them)
//! - Re-settlement after a reorg: O(reopened * path)
//!
//! Brutal Conditions:
//! - 10,000 pending transactions against every new block
//! - Wide forks pruned in one finalization
//! - Deep reorg reopening every settlement

use std::sync::Arc;
use std::time::Duration;

use criterion::{black_box, BatchSize, BenchmarkId, Criterion, Throughput};
use rand::Rng;

use qc_18_tx_lifecycle::{
    ChainEvent, InMemoryChain, RecordingSink, TrackerConfig, TxLifecycleApi, TxLifecycleService,
};

type Service = TxLifecycleService<Arc<InMemoryChain>, Arc<RecordingSink>>;

fn service(chain: InMemoryChain) -> Service {
    TxLifecycleService::new(
        TrackerConfig::default(),
        Arc::new(chain),
        Arc::new(RecordingSink::new()),
    )
}

fn tx_ids(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("0xt{:06}", i)).collect()
}

/// Genesis plus `count` announced transactions.
fn with_pending(chain: InMemoryChain, txs: &[String]) -> Service {
    let mut service = service(chain);
    service.handle_event(ChainEvent::genesis("G")).ok();
    for t in txs {
        service.handle_event(ChainEvent::new_transaction(t.as_str())).ok();
    }
    service
}

pub fn brutal_pending_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("qc-18/brutal/pending_scan");
    group.measurement_time(Duration::from_secs(10));

    // Nothing settles: every pending tx costs one validity query per block
    for count in [100, 1000, 10000] {
        let txs = tx_ids(count);

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("new_block_all_pending", count), &txs, |b, txs| {
            b.iter_batched(
                || with_pending(InMemoryChain::new(), txs),
                |mut service| black_box(service.handle_event(ChainEvent::new_block("A", "G")).ok()),
                BatchSize::LargeInput,
            )
        });
    }

    // Every tx included in the block
    for count in [100, 1000, 10000] {
        let txs = tx_ids(count);
        let refs: Vec<&str> = txs.iter().map(String::as_str).collect();
        let chain = || InMemoryChain::new().with_body("A", &refs);

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("new_block_all_included", count), &txs, |b, txs| {
            b.iter_batched(
                || with_pending(chain(), txs),
                |mut service| black_box(service.handle_event(ChainEvent::new_block("A", "G")).ok()),
                BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

pub fn brutal_fork_prune(c: &mut Criterion) {
    let mut group = c.benchmark_group("qc-18/brutal/fork_prune");
    group.measurement_time(Duration::from_secs(10));

    // `width` competing branches of depth 10, finalize one tip
    for width in [10, 100, 500] {
        group.throughput(Throughput::Elements((width * 10) as u64));
        group.bench_with_input(BenchmarkId::new("finalize_one_of", width), &width, |b, &width| {
            b.iter_batched(
                || {
                    let mut service = service(InMemoryChain::new());
                    service.handle_event(ChainEvent::genesis("G")).ok();
                    for branch in 0..width {
                        let mut parent = "G".to_string();
                        for depth in 0..10 {
                            let block = format!("b{}_{}", branch, depth);
                            service
                                .handle_event(ChainEvent::new_block(block.as_str(), parent.as_str()))
                                .ok();
                            parent = block;
                        }
                    }
                    service
                },
                |mut service| black_box(service.handle_event(ChainEvent::finalized("b0_9")).ok()),
                BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

pub fn brutal_reorg_resettlement(c: &mut Criterion) {
    let mut group = c.benchmark_group("qc-18/brutal/reorg");
    group.measurement_time(Duration::from_secs(10));

    // Every tx settles on branch A, which loses; all re-settle on A'
    for count in [100, 1000, 5000] {
        let txs = tx_ids(count);
        let refs: Vec<&str> = txs.iter().map(String::as_str).collect();
        let mut rng = rand::thread_rng();
        let mut chain = InMemoryChain::new()
            .with_body("A", &refs)
            .with_body("A'", &refs);
        for t in &refs {
            chain = chain.with_success("A'", t, rng.gen_bool(0.5));
        }
        let chain = Arc::new(chain);

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("reopen_and_resettle", count), &txs, |b, txs| {
            b.iter_batched(
                || {
                    let mut service = TxLifecycleService::new(
                        TrackerConfig::default(),
                        chain.clone(),
                        Arc::new(RecordingSink::new()),
                    );
                    service.handle_event(ChainEvent::genesis("G")).ok();
                    for t in txs {
                        service.handle_event(ChainEvent::new_transaction(t.as_str())).ok();
                    }
                    service.handle_event(ChainEvent::new_block("A", "G")).ok();
                    service.handle_event(ChainEvent::new_block("A'", "G")).ok();
                    service
                },
                |mut service| {
                    service.handle_event(ChainEvent::finalized("A'")).ok();
                    black_box(service.handle_event(ChainEvent::new_block("C", "A'")).ok())
                },
                BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

pub fn register_benchmarks(c: &mut Criterion) {
    brutal_pending_scan(c);
    brutal_fork_prune(c);
    brutal_reorg_resettlement(c);
}
