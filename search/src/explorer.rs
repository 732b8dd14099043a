//! Path explorer: one depth-first round per unvisited cell.
//!
//! Each round keeps an explicit stack of [`SearchFrame`] values. The top
//! frame is popped, advanced toward its next candidate and re-pushed before
//! the candidate edge is evaluated, so a source stays available for its
//! remaining neighbors after any outcome. A candidate is rejected while it
//! sits on the live path anywhere except the root; reaching the root hands
//! the path to [`check_closure`].

use std::collections::BTreeSet;

use handoff_kernel::cell::{CellConfigV1, CellId};
use tracing::{debug, info};

use crate::contract::{CellRepositoryV1, LoopReportSink};
use crate::error::AnalysisError;
use crate::evaluator::{HandoffDecision, HandoffEvaluator};
use crate::frame::{AttemptState, NeighborAttempts, SearchFrame};
use crate::policy::{AnalysisPolicyV1, RootClosurePolicyV1};
use crate::report::{
    AnalysisMetadataV1, AnalysisReportV1, LoopReportV1, MetadataBindings, RoundSummaryV1,
    RoundTerminationV1,
};
use crate::validator::{check_closure, ClosingHop, ClosureVerdict};
use crate::visitation::VisitationTracker;

/// Run one full analysis pass over `repository`.
///
/// Every cell becomes a round root exactly once, in cell-list order. Each
/// persistent loop is handed to `sink` as soon as it is found and is also
/// collected into the returned report.
///
/// # Errors
///
/// Returns [`AnalysisError`] only for pre-flight failures: an invalid
/// policy, or a repository that breaks the [`CellRepositoryV1`] contract.
/// No round runs in that case.
pub fn analyze(
    repository: &dyn CellRepositoryV1,
    policy: &AnalysisPolicyV1,
    evaluator: &dyn HandoffEvaluator,
    sink: &mut dyn LoopReportSink,
    bindings: &MetadataBindings,
) -> Result<AnalysisReportV1, AnalysisError> {
    policy.validate()?;
    let cells = repository.cell_list();
    validate_repository(repository, &cells)?;

    let cell_count = cells.len() as u64;
    let mut tracker = VisitationTracker::new(cells);
    let mut rounds = Vec::new();
    let mut loops = Vec::new();

    while let Some(root) = tracker.pick_unvisited() {
        let round = Round {
            repository,
            policy,
            evaluator,
            tracker: &tracker,
            root: root.clone(),
        };
        let summary = round.run(sink, &mut loops)?;
        info!(
            root = %summary.root,
            frames = summary.frames_pushed,
            attempts = summary.candidate_attempts,
            loops = summary.loops_reported,
            termination = summary.termination.as_str(),
            "round complete"
        );
        rounds.push(summary);
        tracker.mark_visited(&root);
    }

    let metadata = AnalysisMetadataV1 {
        repository_id: repository.repository_id().to_string(),
        snapshot_digest: bindings.snapshot_digest.clone(),
        policy_digest: bindings.policy_digest.clone(),
        cell_count,
        total_rounds: rounds.len() as u64,
        total_frames_pushed: rounds.iter().map(|r| r.frames_pushed).sum(),
        total_loops: loops.len() as u64,
        truncated_rounds: rounds
            .iter()
            .filter(|r| r.termination == RoundTerminationV1::FrameBudgetExceeded)
            .count() as u64,
    };
    info!(
        cells = metadata.cell_count,
        rounds = metadata.total_rounds,
        frames = metadata.total_frames_pushed,
        loops = metadata.total_loops,
        "analysis pass complete"
    );

    Ok(AnalysisReportV1 {
        metadata,
        rounds,
        loops,
    })
}

/// Check the repository contract before any round runs.
fn validate_repository(
    repository: &dyn CellRepositoryV1,
    cells: &[CellId],
) -> Result<(), AnalysisError> {
    let mut listed = BTreeSet::new();
    for cell in cells {
        if !listed.insert(cell) {
            return Err(AnalysisError::DuplicateCell { cell: cell.clone() });
        }
    }
    for cell in cells {
        if repository.cell_config(cell).is_none() {
            return Err(AnalysisError::MissingCellConfig { cell: cell.clone() });
        }
        if let Some(neighbor) = repository
            .cell_neighbors(cell)
            .into_iter()
            .find(|n| !listed.contains(n))
        {
            return Err(AnalysisError::UnknownNeighbor {
                cell: cell.clone(),
                neighbor,
            });
        }
    }
    Ok(())
}

struct Round<'a> {
    repository: &'a dyn CellRepositoryV1,
    policy: &'a AnalysisPolicyV1,
    evaluator: &'a dyn HandoffEvaluator,
    tracker: &'a VisitationTracker,
    root: CellId,
}

impl Round<'_> {
    fn run(
        &self,
        sink: &mut dyn LoopReportSink,
        loops: &mut Vec<LoopReportV1>,
    ) -> Result<RoundSummaryV1, AnalysisError> {
        let mut summary = RoundSummaryV1::new(self.root.clone());
        let mut stack = vec![SearchFrame::root(
            self.root.clone(),
            self.fresh_attempts(&self.root),
        )];
        summary.frames_pushed = 1;

        while let Some(top) = stack.pop() {
            let src = top.cell.clone();
            debug!(root = %self.root, depth = stack.len(), cell = %src, margin = top.margin, "pop frame");

            // The live path is `stack` plus `src`; only its root may be revisited.
            let on_path = |c: &CellId| {
                stack.iter().skip(1).any(|f| &f.cell == c) || (!stack.is_empty() && c == &src)
            };
            let Some((frame, dst, kind)) = top.advance(on_path) else {
                summary.dead_ends += 1;
                debug!(cell = %src, "dead end");
                continue;
            };
            summary.candidate_attempts += 1;
            debug!(
                cell = %src,
                dst = %dst,
                kind = kind.as_str(),
                state = frame.attempts.state_of(&dst).map(AttemptState::as_u8),
                "candidate"
            );

            let src_config = self.config(&src)?;
            let dst_status = &self.config(&dst)?.status;
            let decision = self
                .evaluator
                .evaluate(src_config, dst_status, kind, frame.margin);
            stack.push(frame);

            let (clear, margin) = match decision {
                HandoffDecision::Unknown(reason) => {
                    summary.unknown_config += 1;
                    debug!(cell = %src, dst = %dst, ?reason, "configuration unknown");
                    continue;
                }
                HandoffDecision::NoHandoff => {
                    summary.no_handoff += 1;
                    continue;
                }
                HandoffDecision::Handoff { clear, margin } => (clear, margin),
            };

            if dst == self.root {
                let hop = ClosingHop {
                    kind,
                    clear,
                    margin,
                };
                match check_closure(self.repository, &stack, hop) {
                    ClosureVerdict::Escaped => {
                        summary.closures_escaped += 1;
                        continue;
                    }
                    ClosureVerdict::Persistent(report) => {
                        summary.loops_reported += 1;
                        sink.report_loop(&report);
                        loops.push(report);
                        continue;
                    }
                    ClosureVerdict::Transient => match self.policy.root_closure {
                        RootClosurePolicyV1::DiscardAtRoot => {
                            summary.closures_discarded += 1;
                            continue;
                        }
                        RootClosurePolicyV1::ExtendThroughRoot => {
                            summary.closures_extended += 1;
                        }
                    },
                }
            }

            if self.budget_exhausted(summary.frames_pushed) {
                summary.termination = RoundTerminationV1::FrameBudgetExceeded;
                info!(root = %self.root, frames = summary.frames_pushed, "frame budget reached");
                break;
            }
            let attempts = self.fresh_attempts(&dst);
            stack.push(SearchFrame::arrival(dst, attempts, kind, clear, margin));
            summary.frames_pushed += 1;
        }

        Ok(summary)
    }

    fn fresh_attempts(&self, cell: &CellId) -> NeighborAttempts {
        NeighborAttempts::seed(self.repository.cell_neighbors(cell), |n| {
            self.tracker.is_visited(n)
        })
    }

    fn config(&self, cell: &CellId) -> Result<&CellConfigV1, AnalysisError> {
        self.repository
            .cell_config(cell)
            .ok_or_else(|| AnalysisError::MissingCellConfig { cell: cell.clone() })
    }

    fn budget_exhausted(&self, frames_pushed: u64) -> bool {
        self.policy
            .max_frames_per_round
            .is_some_and(|max| frames_pushed >= max)
    }
}
