//! Determinism lock tests: the same snapshot always produces the same
//! report bytes, and repeated analyzer passes start from scratch.

use handoff_harness::analyzer::HandoffLoopAnalyzer;
use handoff_harness::contract::ScenarioV1;
use handoff_harness::policy::{build_policy, PolicyConfig};
use handoff_harness::runner::{run, run_with_policy};
use handoff_harness::scenarios::catalog::{self, PriorityEscalation, SameLayerPair};
use handoff_harness::scenarios::generated::MeshTopology;
use handoff_search::report::LoopReportV1;

#[test]
fn catalog_bundles_are_identical_across_runs() {
    for scenario in catalog::all() {
        let first = run(scenario.as_ref()).unwrap();
        let second = run(scenario.as_ref()).unwrap();
        assert_eq!(first.digest, second.digest, "{}", scenario.scenario_id());
        assert_eq!(
            first.artifacts["loop_report.json"].content,
            second.artifacts["loop_report.json"].content
        );
    }
}

#[test]
fn truncated_mesh_is_deterministic() {
    let config = PolicyConfig {
        max_frames_per_round: Some(500),
        ..PolicyConfig::default()
    };
    let mesh = MeshTopology::new(4, 3);
    let a = run_with_policy(&mesh, &config).unwrap();
    let b = run_with_policy(&mesh, &config).unwrap();
    assert_eq!(a.digest, b.digest);
}

#[test]
fn analyzer_passes_are_idempotent() {
    let policy = build_policy(&PolicyConfig::default()).unwrap();
    let snapshot = PriorityEscalation.snapshot().unwrap();
    let mut analyzer = HandoffLoopAnalyzer::new(policy, Vec::<LoopReportV1>::new());

    let first = analyzer.on_repository_update(&snapshot).unwrap();
    let second = analyzer.on_repository_update(&snapshot).unwrap();
    assert_eq!(first.report, second.report);
    assert_eq!(first.forwarded, 4);
    assert_eq!(second.forwarded, 4);
    assert_eq!(analyzer.passes(), 2);
    assert_eq!(analyzer.sink().len(), 8);
}

#[test]
fn analyzer_can_suppress_repeat_reports() {
    let policy = build_policy(&PolicyConfig {
        suppress_repeat_reports: Some(true),
        ..PolicyConfig::default()
    })
    .unwrap();
    let escalation = PriorityEscalation.snapshot().unwrap();
    let quiet = SameLayerPair.snapshot().unwrap();
    let mut analyzer = HandoffLoopAnalyzer::new(policy, Vec::<LoopReportV1>::new());

    assert_eq!(analyzer.on_repository_update(&escalation).unwrap().forwarded, 4);
    assert_eq!(analyzer.on_repository_update(&quiet).unwrap().forwarded, 0);
    let repeat = analyzer.on_repository_update(&escalation).unwrap();
    assert_eq!(repeat.report.loops.len(), 4, "the pass still finds the loops");
    assert_eq!(repeat.forwarded, 0);
    assert_eq!(analyzer.into_sink().len(), 4);
}

#[test]
fn a_new_update_is_not_shadowed_by_the_previous_pass() {
    let policy = build_policy(&PolicyConfig::default()).unwrap();
    let mut analyzer = HandoffLoopAnalyzer::new(policy, Vec::<LoopReportV1>::new());

    let quiet = analyzer
        .on_repository_update(&SameLayerPair.snapshot().unwrap())
        .unwrap();
    assert!(quiet.report.loops.is_empty());
    // Same cell ids, new rules: every cell gets a fresh round.
    let loud = analyzer
        .on_repository_update(&PriorityEscalation.snapshot().unwrap())
        .unwrap();
    assert_eq!(loud.report.rounds.len(), 2);
    assert_eq!(loud.report.loops.len(), 4);
}
