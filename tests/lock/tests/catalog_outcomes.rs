//! Catalog lock tests: every hand-built scenario yields exactly the loops
//! and round counters derived by tracing the search by hand.

use handoff_harness::contract::ScenarioV1;
use handoff_harness::scenarios::catalog::{
    EqualPreferenceRing, EscapeAtRoot, IsolatedCell, LegacyUndefinedPriority, PriorityEscalation,
    SameLayerPair, UnavailableConfig,
};
use handoff_search::evaluator::ProtocolRuleEvaluator;
use handoff_search::explorer::analyze;
use handoff_search::policy::{AnalysisPolicyV1, RootClosurePolicyV1};
use handoff_search::report::{AnalysisReportV1, LoopReportV1, MetadataBindings, RoundTerminationV1};

fn analyze_scenario(scenario: &dyn ScenarioV1, policy: &AnalysisPolicyV1) -> AnalysisReportV1 {
    let snapshot = scenario.snapshot().unwrap();
    let mut sink: Vec<LoopReportV1> = Vec::new();
    let report = analyze(
        &snapshot,
        policy,
        &ProtocolRuleEvaluator,
        &mut sink,
        &MetadataBindings::default(),
    )
    .unwrap();
    assert_eq!(sink, report.loops, "sink and report disagree");
    report
}

fn paths(report: &AnalysisReportV1) -> Vec<String> {
    report.loops.iter().map(ToString::to_string).collect()
}

fn roots(report: &AnalysisReportV1) -> Vec<&str> {
    report.rounds.iter().map(|r| r.root.as_str()).collect()
}

#[test]
fn same_layer_pair_has_no_loop() {
    let report = analyze_scenario(&SameLayerPair, &AnalysisPolicyV1::default());
    assert!(report.loops.is_empty());
    assert_eq!(roots(&report), ["A", "B"]);

    let first = &report.rounds[0];
    assert_eq!(first.frames_pushed, 7);
    assert_eq!(first.candidate_attempts, 6);
    assert_eq!(first.closures_extended, 4);
    assert_eq!(first.loops_reported, 0);
    assert_eq!(first.termination, RoundTerminationV1::StackExhausted);

    // A is closed once its round ends.
    let second = &report.rounds[1];
    assert_eq!(second.frames_pushed, 1);
    assert_eq!(second.candidate_attempts, 0);
}

#[test]
fn same_layer_pair_discard_at_root_prunes_extensions() {
    let policy = AnalysisPolicyV1 {
        root_closure: RootClosurePolicyV1::DiscardAtRoot,
        ..AnalysisPolicyV1::default()
    };
    let report = analyze_scenario(&SameLayerPair, &policy);
    assert!(report.loops.is_empty());
    let first = &report.rounds[0];
    assert_eq!(first.frames_pushed, 3);
    assert_eq!(first.closures_discarded, 4);
    assert_eq!(first.closures_extended, 0);
}

#[test]
fn equal_preference_ring_only_extends() {
    let report = analyze_scenario(&EqualPreferenceRing, &AnalysisPolicyV1::default());
    assert!(report.loops.is_empty());
    assert_eq!(roots(&report), ["A", "B", "C"]);
    let frames: Vec<u64> = report.rounds.iter().map(|r| r.frames_pushed).collect();
    assert_eq!(frames, [15, 3, 1]);
    assert_eq!(report.rounds[0].closures_extended, 8);
    assert_eq!(report.metadata.total_frames_pushed, 19);
}

#[test]
fn priority_escalation_reports_every_kind_combination() {
    let report = analyze_scenario(&PriorityEscalation, &AnalysisPolicyV1::default());
    assert_eq!(
        paths(&report),
        [
            "A(idle)->B(idle)->A",
            "A(idle)->B(active)->A",
            "A(active)->B(idle)->A",
            "A(active)->B(active)->A",
        ]
    );
    for l in &report.loops {
        assert_eq!(l.root.as_str(), "A");
        assert_eq!(l.closing_margin, -2);
        assert_eq!(l.hop_count(), 2);
    }
    assert_eq!(report.rounds[0].loops_reported, 4);
    assert_eq!(report.rounds[1].frames_pushed, 1);
    assert_eq!(report.rounds[1].candidate_attempts, 0);
    assert_eq!(report.metadata.total_loops, 4);
}

#[test]
fn priority_escalation_reports_regardless_of_closure_policy() {
    let policy = AnalysisPolicyV1 {
        root_closure: RootClosurePolicyV1::DiscardAtRoot,
        ..AnalysisPolicyV1::default()
    };
    let report = analyze_scenario(&PriorityEscalation, &policy);
    assert_eq!(report.loops.len(), 4);
}

#[test]
fn escape_at_root_reports_nothing() {
    let report = analyze_scenario(&EscapeAtRoot, &AnalysisPolicyV1::default());
    assert!(report.loops.is_empty());
    assert_eq!(roots(&report), ["A", "B"]);

    let first = &report.rounds[0];
    assert_eq!(first.frames_pushed, 3);
    assert_eq!(first.closures_escaped, 4);
    assert_eq!(first.closures_extended, 0);
    assert_eq!(first.loops_reported, 0);
    assert_eq!(first.termination, RoundTerminationV1::StackExhausted);

    assert_eq!(report.rounds[1].frames_pushed, 1);
    assert_eq!(report.metadata.total_loops, 0);
}

#[test]
fn escape_at_root_is_independent_of_closure_policy() {
    let policy = AnalysisPolicyV1 {
        root_closure: RootClosurePolicyV1::DiscardAtRoot,
        ..AnalysisPolicyV1::default()
    };
    let report = analyze_scenario(&EscapeAtRoot, &policy);
    assert!(report.loops.is_empty());
    assert_eq!(report.rounds[0].closures_escaped, 4);
    assert_eq!(report.rounds[0].closures_discarded, 0);
}

#[test]
fn isolated_cell_is_one_dead_end() {
    let report = analyze_scenario(&IsolatedCell, &AnalysisPolicyV1::default());
    assert!(report.loops.is_empty());
    assert_eq!(report.rounds.len(), 1);
    let round = &report.rounds[0];
    assert_eq!(round.frames_pushed, 1);
    assert_eq!(round.candidate_attempts, 0);
    assert_eq!(round.dead_ends, 1);
}

#[test]
fn unavailable_config_ends_every_round_at_the_root() {
    let report = analyze_scenario(&UnavailableConfig, &AnalysisPolicyV1::default());
    assert!(report.loops.is_empty());
    assert_eq!(roots(&report), ["A", "B", "C"]);

    let first = &report.rounds[0];
    assert_eq!(first.frames_pushed, 1);
    assert_eq!(first.candidate_attempts, 4);
    assert_eq!(first.unknown_config, 4);

    for later in &report.rounds[1..] {
        assert_eq!(later.frames_pushed, 1);
        assert_eq!(later.candidate_attempts, 0);
    }
}

#[test]
fn legacy_undefined_priority_loops_through_idle_only() {
    let report = analyze_scenario(&LegacyUndefinedPriority, &AnalysisPolicyV1::default());
    assert_eq!(
        paths(&report),
        ["U(idle)->L(idle)->U", "U(idle)->L(active)->U"]
    );
    assert!(report.loops.iter().all(|l| l.closing_margin == -4));
    // U has no measurement rule toward L.
    assert_eq!(report.rounds[0].unknown_config, 1);
}

#[test]
fn report_json_carries_the_round_counters() {
    let report = analyze_scenario(&PriorityEscalation, &AnalysisPolicyV1::default());
    let json = report.to_json_value();
    assert_eq!(json["schema_version"], "loop_report.v1");
    assert_eq!(json["metadata"]["total_loops"], 4);
    assert_eq!(json["rounds"][0]["root"], "A");
    assert_eq!(json["rounds"][0]["termination"], "stack_exhausted");
    assert_eq!(json["loops"][3]["path"], "A(active)->B(active)->A");
}
