//! Loop reports and per-pass analysis reports.
//!
//! [`AnalysisReportV1`] is the normative output of one pass. Its canonical
//! JSON form is deterministic for a given snapshot and policy, which is what
//! replay verification compares byte for byte.

use std::fmt;

use handoff_kernel::cell::{CellId, HandoffKind};
use handoff_kernel::proof::canon::{canonical_json_bytes, CanonError};
use handoff_kernel::proof::hash::{canonical_hash, ContentHash, HashDomain};

/// Schema tag carried by the canonical analysis report.
pub const REPORT_SCHEMA_VERSION: &str = "loop_report.v1";

/// One hop of a loop: leave `cell` through a handoff of `kind`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopStepV1 {
    pub cell: CellId,
    pub kind: HandoffKind,
}

/// A persistent loop: the ordered path from the round root back to itself.
///
/// `steps[0].cell` is always `root`; the final hop re-enters `root`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopReportV1 {
    pub root: CellId,
    pub steps: Vec<LoopStepV1>,
    /// Margin carried by the closing hop into the root.
    pub closing_margin: i64,
}

impl LoopReportV1 {
    /// Number of handoffs in the loop.
    #[must_use]
    pub fn hop_count(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "closing_margin": self.closing_margin,
            "path": self.to_string(),
            "root": self.root.as_str(),
            "steps": self.steps.iter().map(|s| serde_json::json!({
                "cell": s.cell.as_str(),
                "kind": s.kind.as_str(),
            })).collect::<Vec<_>>(),
        })
    }

    /// Content hash of the canonical JSON form. Two passes that find the
    /// same loop produce the same fingerprint.
    ///
    /// # Errors
    ///
    /// Returns [`CanonError`] if canonicalization fails.
    pub fn fingerprint(&self) -> Result<ContentHash, CanonError> {
        let bytes = canonical_json_bytes(&self.to_json_value())?;
        Ok(canonical_hash(HashDomain::LoopReport, &bytes))
    }
}

impl fmt::Display for LoopReportV1 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            write!(f, "{}({})->", step.cell, step.kind)?;
        }
        write!(f, "{}", self.root)
    }
}

/// Why a round stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundTerminationV1 {
    /// The stack emptied; every reachable path was explored.
    StackExhausted,
    /// `max_frames_per_round` was reached before the stack emptied.
    FrameBudgetExceeded,
}

impl RoundTerminationV1 {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StackExhausted => "stack_exhausted",
            Self::FrameBudgetExceeded => "frame_budget_exceeded",
        }
    }
}

/// Counters for one DFS round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundSummaryV1 {
    pub root: CellId,
    /// Fresh frames pushed, the root frame included.
    pub frames_pushed: u64,
    /// Neighbor attempts made (each advances one attempt state).
    pub candidate_attempts: u64,
    pub unknown_config: u64,
    pub no_handoff: u64,
    pub dead_ends: u64,
    pub closures_escaped: u64,
    pub closures_extended: u64,
    pub closures_discarded: u64,
    pub loops_reported: u64,
    pub termination: RoundTerminationV1,
}

impl RoundSummaryV1 {
    #[must_use]
    pub fn new(root: CellId) -> Self {
        Self {
            root,
            frames_pushed: 0,
            candidate_attempts: 0,
            unknown_config: 0,
            no_handoff: 0,
            dead_ends: 0,
            closures_escaped: 0,
            closures_extended: 0,
            closures_discarded: 0,
            loops_reported: 0,
            termination: RoundTerminationV1::StackExhausted,
        }
    }

    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "candidate_attempts": self.candidate_attempts,
            "closures_discarded": self.closures_discarded,
            "closures_escaped": self.closures_escaped,
            "closures_extended": self.closures_extended,
            "dead_ends": self.dead_ends,
            "frames_pushed": self.frames_pushed,
            "loops_reported": self.loops_reported,
            "no_handoff": self.no_handoff,
            "root": self.root.as_str(),
            "termination": self.termination.as_str(),
            "unknown_config": self.unknown_config,
        })
    }
}

/// Digests of the inputs a report was computed from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MetadataBindings {
    pub snapshot_digest: String,
    pub policy_digest: String,
}

/// Pass-level metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisMetadataV1 {
    pub repository_id: String,
    pub snapshot_digest: String,
    pub policy_digest: String,
    pub cell_count: u64,
    pub total_rounds: u64,
    pub total_frames_pushed: u64,
    pub total_loops: u64,
    /// Rounds cut short by the frame budget.
    pub truncated_rounds: u64,
}

/// Result of one full analysis pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisReportV1 {
    pub metadata: AnalysisMetadataV1,
    pub rounds: Vec<RoundSummaryV1>,
    pub loops: Vec<LoopReportV1>,
}

impl AnalysisReportV1 {
    /// `true` when any round stopped on the frame budget, so the loop list
    /// may be incomplete.
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.metadata.truncated_rounds > 0
    }

    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        let m = &self.metadata;
        serde_json::json!({
            "loops": self.loops.iter().map(LoopReportV1::to_json_value).collect::<Vec<_>>(),
            "metadata": {
                "cell_count": m.cell_count,
                "policy_digest": m.policy_digest,
                "repository_id": m.repository_id,
                "snapshot_digest": m.snapshot_digest,
                "total_frames_pushed": m.total_frames_pushed,
                "total_loops": m.total_loops,
                "total_rounds": m.total_rounds,
                "truncated_rounds": m.truncated_rounds,
            },
            "rounds": self.rounds.iter().map(RoundSummaryV1::to_json_value).collect::<Vec<_>>(),
            "schema_version": REPORT_SCHEMA_VERSION,
        })
    }

    /// # Errors
    ///
    /// Returns [`CanonError`] if canonicalization fails.
    pub fn to_canonical_json_bytes(&self) -> Result<Vec<u8>, CanonError> {
        canonical_json_bytes(&self.to_json_value())
    }

    /// Human-readable rendering: one line per loop, then one per round.
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "repository={} cells={} rounds={} loops={}\n",
            self.metadata.repository_id,
            self.metadata.cell_count,
            self.metadata.total_rounds,
            self.metadata.total_loops,
        ));
        for report in &self.loops {
            out.push_str(&format!(
                "Persistent loop: {report} (closing margin {})\n",
                report.closing_margin
            ));
        }
        for round in &self.rounds {
            out.push_str(&format!(
                "round root={} frames={} attempts={} loops={} termination={}\n",
                round.root,
                round.frames_pushed,
                round.candidate_attempts,
                round.loops_reported,
                round.termination.as_str(),
            ));
        }
        out
    }
}
