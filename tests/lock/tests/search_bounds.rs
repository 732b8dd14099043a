//! Boundedness and accounting lock tests over generated topologies.
//!
//! Proves:
//! 1. Every fresh frame ends in exactly one dead end when a round completes
//! 2. Each attempt lands in exactly one outcome counter
//! 3. Ring frame counts follow `2^(n+1) - 1` when closures extend
//! 4. `max_frames_per_round` caps every round and marks it truncated

use handoff_harness::contract::ScenarioV1;
use handoff_harness::scenarios::catalog;
use handoff_harness::scenarios::generated::{MeshTopology, RingTopology};
use handoff_kernel::cell::CellSnapshotV1;
use handoff_search::contract::NullSink;
use handoff_search::evaluator::ProtocolRuleEvaluator;
use handoff_search::explorer::analyze;
use handoff_search::policy::{AnalysisPolicyV1, RootClosurePolicyV1};
use handoff_search::report::{AnalysisReportV1, MetadataBindings, RoundSummaryV1, RoundTerminationV1};

fn analyze_snapshot(snapshot: &CellSnapshotV1, policy: &AnalysisPolicyV1) -> AnalysisReportV1 {
    analyze(
        snapshot,
        policy,
        &ProtocolRuleEvaluator,
        &mut NullSink,
        &MetadataBindings::default(),
    )
    .unwrap()
}

fn assert_accounting(round: &RoundSummaryV1) {
    let outcomes = round.unknown_config
        + round.no_handoff
        + round.closures_escaped
        + round.closures_discarded
        + round.loops_reported
        + (round.frames_pushed - 1);
    assert_eq!(
        round.candidate_attempts, outcomes,
        "attempt accounting broken for root {}",
        round.root
    );
    assert_eq!(
        round.dead_ends, round.frames_pushed,
        "every frame must end in one dead end (root {})",
        round.root
    );
}

fn every_snapshot() -> Vec<(String, CellSnapshotV1)> {
    let mut snapshots: Vec<(String, CellSnapshotV1)> = catalog::all()
        .iter()
        .map(|s| (s.scenario_id().to_string(), s.snapshot().unwrap()))
        .collect();
    for scenario in [RingTopology::new(4, 1), RingTopology::new(5, -1)] {
        snapshots.push((scenario.scenario_id().to_string(), scenario.snapshot().unwrap()));
    }
    let mesh = MeshTopology::new(2, 3);
    snapshots.push((mesh.scenario_id().to_string(), mesh.snapshot().unwrap()));
    snapshots
}

#[test]
fn completed_rounds_account_for_every_attempt() {
    for closure in [
        RootClosurePolicyV1::ExtendThroughRoot,
        RootClosurePolicyV1::DiscardAtRoot,
    ] {
        let policy = AnalysisPolicyV1 {
            root_closure: closure,
            ..AnalysisPolicyV1::default()
        };
        for (id, snapshot) in every_snapshot() {
            let report = analyze_snapshot(&snapshot, &policy);
            assert_eq!(report.rounds.len(), snapshot.len(), "{id}: one round per cell");
            for round in &report.rounds {
                assert_eq!(round.termination, RoundTerminationV1::StackExhausted, "{id}");
                assert_accounting(round);
            }
        }
    }
}

#[test]
fn attempts_are_bounded_by_fresh_frames_and_degree() {
    for (id, snapshot) in every_snapshot() {
        let max_degree = snapshot
            .cells()
            .iter()
            .map(|c| c.neighbors.len() as u64)
            .max()
            .unwrap_or(0);
        let report = analyze_snapshot(&snapshot, &AnalysisPolicyV1::default());
        for round in &report.rounds {
            assert!(
                round.candidate_attempts <= 2 * max_degree * round.frames_pushed,
                "{id}: {} attempts over {} frames",
                round.candidate_attempts,
                round.frames_pushed
            );
        }
    }
}

#[test]
fn ring_frame_count_doubles_with_size() {
    for size in 2..=6_u32 {
        let snapshot = RingTopology::new(size as usize, 1).snapshot().unwrap();
        let report = analyze_snapshot(&snapshot, &AnalysisPolicyV1::default());
        let first = &report.rounds[0];
        assert_eq!(first.frames_pushed, (1_u64 << (size + 1)) - 1, "ring of {size}");
        assert_eq!(first.closures_extended, 1_u64 << size);
        assert!(report.loops.is_empty());
    }
}

#[test]
fn negative_offset_ring_reports_each_kind_sequence_once() {
    let report = analyze_snapshot(
        &RingTopology::new(5, -1).snapshot().unwrap(),
        &AnalysisPolicyV1::default(),
    );
    assert_eq!(report.loops.len(), 32);
    assert!(report.loops.iter().all(|l| l.closing_margin == -5));
    assert!(report.loops.iter().all(|l| l.root.as_str() == "r0"));
    let unique: std::collections::BTreeSet<String> =
        report.loops.iter().map(ToString::to_string).collect();
    assert_eq!(unique.len(), 32);
    assert_eq!(report.rounds[0].frames_pushed, 31);
}

#[test]
fn frame_budget_caps_every_round() {
    let snapshot = MeshTopology::new(4, 4).snapshot().unwrap();
    let policy = AnalysisPolicyV1 {
        max_frames_per_round: Some(64),
        ..AnalysisPolicyV1::default()
    };
    let report = analyze_snapshot(&snapshot, &policy);
    assert_eq!(report.rounds.len(), 16);
    assert!(report.rounds.iter().all(|r| r.frames_pushed <= 64));
    assert!(report.is_truncated());
    assert_eq!(
        report.metadata.truncated_rounds,
        report
            .rounds
            .iter()
            .filter(|r| r.termination == RoundTerminationV1::FrameBudgetExceeded)
            .count() as u64
    );
    assert!(!report.loops.is_empty(), "mesh loops appear before the budget");
}
