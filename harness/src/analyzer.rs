//! Event-driven analyzer: one fresh analysis pass per repository update.
//!
//! A message-driven host calls [`HandoffLoopAnalyzer::on_repository_update`]
//! after each decoded configuration message. Every call runs a complete
//! pass with a new visitation set; nothing from a previous pass leaks into
//! the search. Only the set of already-forwarded loop fingerprints survives
//! between passes, and only when `suppress_repeat_reports` is on.

use std::collections::BTreeSet;

use handoff_kernel::proof::canon::CanonError;
use handoff_search::contract::{CellRepositoryV1, LoopReportSink};
use handoff_search::error::AnalysisError;
use handoff_search::evaluator::ProtocolRuleEvaluator;
use handoff_search::explorer::analyze;
use handoff_search::report::{AnalysisReportV1, LoopReportV1, MetadataBindings};
use tracing::{debug, info, warn};

use crate::policy::PolicySnapshotV1;
use crate::runner::log_cell_configs;

/// Error from one analyzer pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalyzerError {
    Analysis(AnalysisError),
    /// A loop could not be fingerprinted for repeat suppression.
    Fingerprint(CanonError),
}

impl std::fmt::Display for AnalyzerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Analysis(e) => write!(f, "{e}"),
            Self::Fingerprint(e) => write!(f, "loop fingerprint failed: {e:?}"),
        }
    }
}

impl std::error::Error for AnalyzerError {}

/// Outcome of one pass.
#[derive(Debug, Clone)]
pub struct PassOutcome {
    pub report: AnalysisReportV1,
    /// Loops handed to the sink by this pass.
    pub forwarded: usize,
}

/// Long-lived analyzer owned by the host framework.
pub struct HandoffLoopAnalyzer<S: LoopReportSink> {
    policy: PolicySnapshotV1,
    sink: S,
    forwarded: BTreeSet<String>,
    passes: u64,
}

impl<S: LoopReportSink> HandoffLoopAnalyzer<S> {
    #[must_use]
    pub fn new(policy: PolicySnapshotV1, sink: S) -> Self {
        Self {
            policy,
            sink,
            forwarded: BTreeSet::new(),
            passes: 0,
        }
    }

    /// Re-analyze `repository` from scratch and forward its loops.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyzerError`] if the repository breaks its contract. The
    /// sink receives nothing from a failed pass.
    pub fn on_repository_update(
        &mut self,
        repository: &dyn CellRepositoryV1,
    ) -> Result<PassOutcome, AnalyzerError> {
        self.passes += 1;
        if self.policy.log_cell_configs {
            log_cell_configs(repository);
        }

        let bindings = MetadataBindings {
            snapshot_digest: String::new(),
            policy_digest: self.policy.digest().as_str().to_string(),
        };
        let mut found: Vec<LoopReportV1> = Vec::new();
        let report = analyze(
            repository,
            &self.policy.analysis,
            &ProtocolRuleEvaluator,
            &mut found,
            &bindings,
        )
        .map_err(AnalyzerError::Analysis)?;

        let mut forwarded = 0;
        for loop_report in &found {
            if self.policy.suppress_repeat_reports {
                let fingerprint = loop_report
                    .fingerprint()
                    .map_err(AnalyzerError::Fingerprint)?;
                if !self.forwarded.insert(fingerprint.as_str().to_string()) {
                    debug!(path = %loop_report, "loop already reported");
                    continue;
                }
            }
            warn!(
                root = %loop_report.root,
                hops = loop_report.hop_count(),
                closing_margin = loop_report.closing_margin,
                "Persistent loop: {loop_report}"
            );
            self.sink.report_loop(loop_report);
            forwarded += 1;
        }
        info!(
            pass = self.passes,
            loops = found.len(),
            forwarded,
            "repository update analyzed"
        );
        Ok(PassOutcome { report, forwarded })
    }

    /// Passes run so far, failed ones included.
    #[must_use]
    pub fn passes(&self) -> u64 {
        self.passes
    }

    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}
