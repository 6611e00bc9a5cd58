//! # Lifecycle Integration Flows
//!
//! Drives `qc-18-tx-lifecycle` through its public API with the in-memory
//! chain reader and recording sink.
//!
//! ## Flows Tested:
//!
//! 1. **NewBlock → onTxSettled**: inclusion and invalidity settle once per branch
//! 2. **Finalized → onTxDone**: every settlement on the finalized chain completes
//! 3. **Arrival order**: notifications within one event follow submission order
//! 4. **Collaborator traffic**: no query is ever repeated

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use qc_18_tx_lifecycle::{
        BlockHash, ChainEvent, EventReport, InMemoryChain, RecordingSink, Settlement,
        TrackerConfig, TrackerError, TxId, TxLifecycleApi, TxLifecycleService, TxNotification,
        TxState,
    };

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    struct Harness {
        service: TxLifecycleService<Arc<InMemoryChain>, Arc<RecordingSink>>,
        chain: Arc<InMemoryChain>,
        sink: Arc<RecordingSink>,
    }

    impl Harness {
        fn new(chain: InMemoryChain) -> Self {
            Self::with_config(chain, TrackerConfig::default())
        }

        fn with_config(chain: InMemoryChain, config: TrackerConfig) -> Self {
            let chain = Arc::new(chain);
            let sink = Arc::new(RecordingSink::new());
            let service = TxLifecycleService::new(config, chain.clone(), sink.clone());
            Self {
                service,
                chain,
                sink,
            }
        }

        fn feed(&mut self, events: Vec<ChainEvent>) -> Vec<EventReport> {
            events
                .into_iter()
                .map(|event| self.service.handle_event(event).unwrap())
                .collect()
        }
    }

    fn h(id: &str) -> BlockHash {
        BlockHash::from(id)
    }

    fn tx(id: &str) -> TxId {
        TxId::from(id)
    }

    // =============================================================================
    // SETTLEMENT AND COMPLETION
    // =============================================================================

    #[test]
    fn test_linear_chain_settles_and_completes() {
        let mut harness = Harness::new(InMemoryChain::new().with_body("A", &["t"]));

        let reports = harness.feed(vec![
            ChainEvent::genesis("G"),
            ChainEvent::new_transaction("t"),
            ChainEvent::new_block("A", "G"),
            ChainEvent::new_block("B", "A"),
            ChainEvent::finalized("B"),
        ]);

        let settlement = Settlement::valid(h("A"), true);
        assert_eq!(reports[2].settled, 1);
        assert_eq!(reports[3].settled, 0);
        assert_eq!(reports[4].done, 1);
        assert_eq!(
            harness.sink.notifications(),
            vec![
                TxNotification::settled(tx("t"), settlement.clone()),
                TxNotification::done(tx("t"), settlement),
            ]
        );
    }

    #[test]
    fn test_invalid_transaction_settles_once_on_linear_chain() {
        let chain = InMemoryChain::new()
            .with_validity("A", "t", false)
            .with_validity("B", "t", false)
            .with_validity("C", "t", false);
        let mut harness = Harness::new(chain);

        harness.feed(vec![
            ChainEvent::genesis("G"),
            ChainEvent::new_transaction("t"),
            ChainEvent::new_block("A", "G"),
            ChainEvent::new_block("B", "A"),
            ChainEvent::new_block("C", "B"),
            ChainEvent::finalized("C"),
        ]);

        assert_eq!(
            harness.sink.settled(),
            vec![(tx("t"), Settlement::invalid(h("A")))]
        );
        assert_eq!(
            harness.sink.done(),
            vec![(tx("t"), Settlement::invalid(h("A")))]
        );
        // Settled at A, so B and C are never asked about t
        assert_eq!(harness.chain.calls().is_tx_valid, 1);
    }

    #[test]
    fn test_notifications_follow_arrival_order() {
        let chain = InMemoryChain::new()
            .with_body("A", &["t3", "t2", "t1"])
            .with_success("A", "t2", false);
        let mut harness = Harness::new(chain);

        harness.feed(vec![
            ChainEvent::genesis("G"),
            ChainEvent::new_transaction("t1"),
            ChainEvent::new_transaction("t2"),
            ChainEvent::new_transaction("t3"),
            ChainEvent::new_block("A", "G"),
            ChainEvent::finalized("A"),
        ]);

        let settled: Vec<TxId> = harness.sink.settled().into_iter().map(|(t, _)| t).collect();
        let done: Vec<TxId> = harness.sink.done().into_iter().map(|(t, _)| t).collect();
        assert_eq!(settled, vec![tx("t1"), tx("t2"), tx("t3")]);
        assert_eq!(done, settled);
        assert_eq!(
            harness.service.tx_state(&tx("t2")),
            Some(TxState::Done(Settlement::valid(h("A"), false)))
        );
    }

    #[test]
    fn test_transaction_announced_after_inclusion_settles_on_later_block() {
        // t is in A but announced only after A arrived; B decides it
        let chain = InMemoryChain::new()
            .with_body("A", &["t"])
            .with_validity("B", "t", false);
        let mut harness = Harness::new(chain);

        harness.feed(vec![
            ChainEvent::genesis("G"),
            ChainEvent::new_block("A", "G"),
            ChainEvent::new_transaction("t"),
            ChainEvent::new_block("B", "A"),
        ]);

        assert_eq!(
            harness.sink.settled(),
            vec![(tx("t"), Settlement::invalid(h("B")))]
        );
    }

    #[test]
    fn test_done_is_exactly_once_across_finalizations() {
        let mut harness = Harness::new(InMemoryChain::new().with_body("A", &["t"]));

        harness.feed(vec![
            ChainEvent::genesis("G"),
            ChainEvent::new_transaction("t"),
            ChainEvent::new_block("A", "G"),
            ChainEvent::new_block("B", "A"),
            ChainEvent::new_block("C", "B"),
            ChainEvent::finalized("A"),
            ChainEvent::finalized("B"),
            ChainEvent::finalized("C"),
            ChainEvent::finalized("C"),
        ]);

        assert_eq!(harness.sink.done().len(), 1);
        assert_eq!(harness.service.last_finalized(), Some(h("C")));
        assert_eq!(harness.service.tracked_blocks(), 1);
    }

    #[test]
    fn test_duplicate_transaction_announcement_ignored() {
        let mut harness = Harness::new(InMemoryChain::new().with_body("A", &["t"]));

        harness.feed(vec![
            ChainEvent::genesis("G"),
            ChainEvent::new_transaction("t"),
            ChainEvent::new_block("A", "G"),
            ChainEvent::finalized("A"),
            ChainEvent::new_transaction("t"),
            ChainEvent::new_block("B", "A"),
        ]);

        assert_eq!(harness.sink.len(), 2);
        assert_eq!(harness.service.stats().transactions, 1);
    }

    // =============================================================================
    // COLLABORATOR TRAFFIC
    // =============================================================================

    #[test]
    fn test_no_collaborator_query_repeats() {
        // G ── A ── B ── C
        //       \
        //        A2 ── B2
        let chain = InMemoryChain::new()
            .with_body("B", &["t1"])
            .with_body("B2", &["t1", "t2"])
            .with_validity("C", "t3", false);
        let mut harness = Harness::new(chain);

        harness.feed(vec![
            ChainEvent::genesis("G"),
            ChainEvent::new_transaction("t1"),
            ChainEvent::new_transaction("t2"),
            ChainEvent::new_transaction("t3"),
            ChainEvent::new_block("A", "G"),
            ChainEvent::new_block("A2", "G"),
            ChainEvent::new_block("B", "A"),
            ChainEvent::new_block("B2", "A2"),
            ChainEvent::new_block("C", "B"),
            ChainEvent::finalized("B2"),
            ChainEvent::new_block("C2", "B2"),
            ChainEvent::finalized("C2"),
        ]);

        let calls = harness.chain.calls();
        assert_eq!(calls.redundant, 0);
        // Every block body is fetched at most once
        assert!(calls.get_body <= 7);
    }

    #[test]
    fn test_no_memoization_still_settles_identically() {
        let chain = || {
            InMemoryChain::new()
                .with_body("A", &["t1"])
                .with_validity("B", "t2", false)
        };
        let events = vec![
            ChainEvent::genesis("G"),
            ChainEvent::new_transaction("t1"),
            ChainEvent::new_transaction("t2"),
            ChainEvent::new_block("A", "G"),
            ChainEvent::new_block("B", "A"),
            ChainEvent::finalized("B"),
        ];

        let mut memoized = Harness::new(chain());
        let mut direct =
            Harness::with_config(chain(), TrackerConfig::default().with_memoization(false));
        memoized.feed(events.clone());
        direct.feed(events);

        assert_eq!(memoized.sink.notifications(), direct.sink.notifications());
    }

    // =============================================================================
    // FAILURES
    // =============================================================================

    #[test]
    fn test_failed_block_can_be_skipped_and_chain_continues() {
        let chain = InMemoryChain::new()
            .with_failing_block("A")
            .with_body("A2", &["t"]);
        let mut harness = Harness::new(chain);

        harness.feed(vec![ChainEvent::genesis("G"), ChainEvent::new_transaction("t")]);

        let failed = harness.service.handle_event(ChainEvent::new_block("A", "G"));
        assert!(matches!(failed, Err(TrackerError::Collaborator { .. })));
        assert!(harness.sink.is_empty());

        // A was rolled back, so a child of A is rejected
        assert!(matches!(
            harness.service.handle_event(ChainEvent::new_block("B", "A")),
            Err(TrackerError::UnknownParent { .. })
        ));

        harness.feed(vec![
            ChainEvent::new_block("A2", "G"),
            ChainEvent::finalized("A2"),
        ]);
        assert_eq!(
            harness.sink.done(),
            vec![(tx("t"), Settlement::valid(h("A2"), true))]
        );
    }

    #[test]
    fn test_orphan_after_root_rejected() {
        let mut harness = Harness::new(InMemoryChain::new());
        harness.feed(vec![ChainEvent::genesis("G")]);

        assert!(matches!(
            harness.service.handle_event(ChainEvent::genesis("H")),
            Err(TrackerError::OrphanBlock { .. })
        ));
        assert_eq!(harness.service.tracked_blocks(), 1);
    }
}
