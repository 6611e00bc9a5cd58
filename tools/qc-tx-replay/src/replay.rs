//! Scenario replay and notification log comparison.

use anyhow::{Context, Result};
use qc_18_tx_lifecycle::{
    BlockHash, CallCounts, ChainEvent, InMemoryChain, RecordingSink, ScriptedBlock,
    TrackerConfig, TrackerStats, TxLifecycleApi, TxLifecycleService, TxNotification,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Scripted chain plus the event log to feed through the tracker
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub chain: HashMap<BlockHash, ScriptedBlock>,
    pub events: Vec<ChainEvent>,
}

impl Scenario {
    pub fn from_json(input: &str) -> Result<Self> {
        serde_json::from_str(input).context("Failed to parse scenario")
    }
}

/// Everything a replay produced
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayOutcome {
    pub notifications: Vec<TxNotification>,
    pub calls: CallCounts,
    pub stats: TrackerStats,
}

/// Feed every event of `scenario` through a fresh tracker.
///
/// Stops at the first rejected event.
pub fn replay(scenario: Scenario, config: TrackerConfig) -> Result<ReplayOutcome> {
    let chain = Arc::new(InMemoryChain::from_blocks(scenario.chain));
    let sink = Arc::new(RecordingSink::new());
    let mut service = TxLifecycleService::new(config, chain.clone(), sink.clone());

    let total = scenario.events.len();
    for (index, event) in scenario.events.into_iter().enumerate() {
        let kind = event.kind();
        let report = service
            .handle_event(event)
            .with_context(|| format!("Event #{} ({}) rejected", index, kind))?;
        debug!(index, kind, ?report, "Event replayed");
    }

    let outcome = ReplayOutcome {
        notifications: sink.notifications(),
        calls: chain.calls(),
        stats: service.stats(),
    };
    info!(
        events = total,
        notifications = outcome.notifications.len(),
        collaborator_calls = outcome.calls.total(),
        redundant_calls = outcome.calls.redundant,
        "Replay complete"
    );
    Ok(outcome)
}

/// First position where two logs disagree
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mismatch {
    pub index: usize,
    pub expected: Option<TxNotification>,
    pub actual: Option<TxNotification>,
}

/// Positional comparison of an actual log against an expected one
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Comparison {
    pub matched: usize,
    pub expected: usize,
    pub actual: usize,
    pub first_mismatch: Option<Mismatch>,
}

impl Comparison {
    pub fn compare(expected: &[TxNotification], actual: &[TxNotification]) -> Self {
        let matched = expected
            .iter()
            .zip(actual)
            .filter(|(e, a)| e == a)
            .count();

        let first_mismatch = (0..expected.len().max(actual.len()))
            .find(|&i| expected.get(i) != actual.get(i))
            .map(|index| Mismatch {
                index,
                expected: expected.get(index).cloned(),
                actual: actual.get(index).cloned(),
            });

        Self {
            matched,
            expected: expected.len(),
            actual: actual.len(),
            first_mismatch,
        }
    }

    pub fn is_exact(&self) -> bool {
        self.first_mismatch.is_none()
    }

    /// Matched fraction of the expected log; an empty expectation scores 1.0
    /// only against an empty log.
    pub fn score(&self) -> f64 {
        if self.expected == 0 {
            return if self.actual == 0 { 1.0 } else { 0.0 };
        }
        self.matched as f64 / self.expected as f64
    }
}
