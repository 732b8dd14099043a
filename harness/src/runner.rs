//! Harness runner: runs one analysis pass and packages it as a bundle.
//!
//! # Pipeline
//!
//! ```text
//! build_policy() → snapshot() → canonical snapshot bytes
//!   → analyze() (loops go to the sink as found)
//!   → loop_report.json → enforce_report_bytes()
//!   → loop_report.txt → build_bundle()
//! ```

use handoff_kernel::cell::CellSnapshotV1;
use handoff_search::contract::{CellRepositoryV1, LoopReportSink, TracingSink};
use handoff_search::error::AnalysisError;
use handoff_search::evaluator::ProtocolRuleEvaluator;
use handoff_search::explorer::analyze;
use handoff_search::report::{AnalysisReportV1, MetadataBindings};
use tracing::info;

use crate::bundle::{build_bundle, ArtifactBundleV1, BundleBuildError};
use crate::contract::{ScenarioError, ScenarioV1};
use crate::policy::{build_policy, enforce_report_bytes, PolicyConfig, PolicySnapshotV1, PolicyViolation};

/// Error during a harness run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunError {
    /// Scenario construction failed.
    ScenarioError(ScenarioError),
    /// Policy construction failed.
    PolicyBuildFailed { detail: String },
    /// Canonical JSON serialization failed.
    CanonFailed { detail: String },
    /// The analysis rejected its inputs.
    AnalysisFailed(AnalysisError),
    /// Policy violation (fail-closed).
    PolicyViolation(PolicyViolation),
    /// Bundle assembly failed.
    BundleFailed(BundleBuildError),
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ScenarioError(e) => write!(f, "{e}"),
            Self::PolicyBuildFailed { detail } => write!(f, "policy build failed: {detail}"),
            Self::CanonFailed { detail } => write!(f, "canonical JSON error: {detail}"),
            Self::AnalysisFailed(e) => write!(f, "analysis failed: {e}"),
            Self::PolicyViolation(v) => write!(f, "policy violation: {v}"),
            Self::BundleFailed(e) => write!(f, "bundle assembly failed: {e}"),
        }
    }
}

impl std::error::Error for RunError {}

/// Run a scenario with the default policy, logging loops through `tracing`.
///
/// Equivalent to `run_with_policy(scenario, &PolicyConfig::default())`.
///
/// # Errors
///
/// Returns [`RunError`] at any pipeline step.
pub fn run(scenario: &dyn ScenarioV1) -> Result<ArtifactBundleV1, RunError> {
    run_with_policy(scenario, &PolicyConfig::default())
}

/// Run a scenario with explicit policy config, logging loops through
/// `tracing`.
///
/// # Errors
///
/// Returns [`RunError`] at any pipeline step.
pub fn run_with_policy(
    scenario: &dyn ScenarioV1,
    config: &PolicyConfig,
) -> Result<ArtifactBundleV1, RunError> {
    run_analysis(scenario, config, &mut TracingSink)
}

/// Run a scenario through the full pipeline, delivering loops to `sink`.
///
/// Produces an [`ArtifactBundleV1`] containing:
/// - `cell_snapshot.json` (normative): the analyzed cells, canonical JSON
/// - `policy_snapshot.json` (normative): resolved policy
/// - `loop_report.json` (normative): loops, round counters, digest bindings
/// - `loop_report.txt` (observational): human-readable rendering
///
/// # Errors
///
/// Returns [`RunError`] at any step. Fail-closed: partial bundles are not
/// produced.
pub fn run_analysis(
    scenario: &dyn ScenarioV1,
    config: &PolicyConfig,
    sink: &mut dyn LoopReportSink,
) -> Result<ArtifactBundleV1, RunError> {
    let scenario_id = scenario.scenario_id();

    // Phase 0: resolve policy.
    let policy = build_policy(config).map_err(|e| RunError::PolicyBuildFailed {
        detail: e.to_string(),
    })?;

    // Phase 1: materialize inputs.
    let snapshot = scenario.snapshot().map_err(RunError::ScenarioError)?;
    let snapshot_bytes = snapshot
        .to_canonical_json_bytes()
        .map_err(|e| RunError::CanonFailed {
            detail: format!("{e:?}"),
        })?;

    // Phase 2: analyze.
    let report = compute_report(&snapshot, &policy, sink)?;
    let report_bytes = report
        .to_canonical_json_bytes()
        .map_err(|e| RunError::CanonFailed {
            detail: format!("{e:?}"),
        })?;
    enforce_report_bytes(&report_bytes, &policy).map_err(RunError::PolicyViolation)?;

    info!(
        scenario = scenario_id,
        cells = report.metadata.cell_count,
        loops = report.metadata.total_loops,
        report_bytes = report_bytes.len(),
        "analysis run complete"
    );

    // Phase 3: bundle.
    let artifacts = vec![
        ("cell_snapshot.json".into(), snapshot_bytes, true),
        ("policy_snapshot.json".into(), policy.bytes, true),
        ("loop_report.json".into(), report_bytes, true),
        (
            "loop_report.txt".into(),
            report.render_text().into_bytes(),
            false,
        ),
    ];
    build_bundle(artifacts).map_err(RunError::BundleFailed)
}

/// Analyze `snapshot` under `policy`, binding the report to both inputs'
/// digests. Shared by the runner and by replay verification.
///
/// # Errors
///
/// Returns [`RunError::CanonFailed`] if the snapshot cannot be hashed, or
/// [`RunError::AnalysisFailed`] if the analysis rejects its inputs.
pub fn compute_report(
    snapshot: &CellSnapshotV1,
    policy: &PolicySnapshotV1,
    sink: &mut dyn LoopReportSink,
) -> Result<AnalysisReportV1, RunError> {
    let snapshot_digest = snapshot.digest().map_err(|e| RunError::CanonFailed {
        detail: format!("{e:?}"),
    })?;
    let bindings = MetadataBindings {
        snapshot_digest: snapshot_digest.as_str().to_string(),
        policy_digest: policy.digest().as_str().to_string(),
    };

    if policy.log_cell_configs {
        log_cell_configs(snapshot);
    }

    analyze(
        snapshot,
        &policy.analysis,
        &ProtocolRuleEvaluator,
        sink,
        &bindings,
    )
    .map_err(RunError::AnalysisFailed)
}

/// Dump every cell's configuration at `info`, in repository order.
pub fn log_cell_configs(repository: &dyn CellRepositoryV1) {
    for cell in repository.cell_list() {
        let Some(config) = repository.cell_config(&cell) else {
            continue;
        };
        info!(
            cell = %cell,
            neighbors = repository.cell_neighbors(&cell).len(),
            config = %config.dump(),
            "cell configuration"
        );
    }
}
