//! Shared helpers for handoff benchmark suites.

use handoff_harness::contract::ScenarioV1;
use handoff_harness::policy::{build_policy, PolicyConfig};
use handoff_kernel::cell::CellSnapshotV1;
use handoff_search::contract::NullSink;
use handoff_search::evaluator::ProtocolRuleEvaluator;
use handoff_search::explorer::analyze;
use handoff_search::policy::AnalysisPolicyV1;
use handoff_search::report::{AnalysisReportV1, MetadataBindings};

/// Prepared inputs for calling `analyze()` directly, bypassing the runner's
/// canonicalization and bundling.
pub struct AnalysisSetup {
    pub snapshot: CellSnapshotV1,
    pub policy: AnalysisPolicyV1,
    pub bindings: MetadataBindings,
}

/// Materialize a scenario and resolve `config` once, outside the timed loop.
///
/// # Panics
///
/// Panics if the scenario does not build or the policy does not resolve.
/// Benchmark setup failures are fatal.
pub fn prepare_analysis<S: ScenarioV1>(scenario: &S, config: &PolicyConfig) -> AnalysisSetup {
    let snapshot = scenario.snapshot().expect("scenario snapshot");
    let policy = build_policy(config).expect("build_policy");
    let bindings = MetadataBindings {
        snapshot_digest: snapshot.digest().expect("snapshot digest").as_str().to_string(),
        policy_digest: policy.digest().as_str().to_string(),
    };
    AnalysisSetup {
        snapshot,
        policy: policy.analysis,
        bindings,
    }
}

/// One analysis pass over a prepared setup.
///
/// # Panics
///
/// Panics if the snapshot breaks the repository contract.
#[must_use]
pub fn analyze_setup(setup: &AnalysisSetup) -> AnalysisReportV1 {
    analyze(
        &setup.snapshot,
        &setup.policy,
        &ProtocolRuleEvaluator,
        &mut NullSink,
        &setup.bindings,
    )
    .expect("analyze")
}
