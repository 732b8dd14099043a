//! Collaborator contracts: where cell data comes from and where loops go.

use handoff_kernel::cell::{CellConfigV1, CellId, CellSnapshotV1};
use tracing::warn;

use crate::report::LoopReportV1;

/// Read-only source of decoded cell configuration.
///
/// # Contract
///
/// - `cell_list` is deterministic and duplicate-free; its order is the
///   order in which cells become round roots.
/// - Every listed cell has a configuration.
/// - `cell_neighbors` returns only ids present in `cell_list`, in a
///   deterministic order (that order is the candidate order).
///
/// Violations are rejected by [`crate::explorer::analyze`] before any
/// round runs.
pub trait CellRepositoryV1 {
    /// Identifier recorded in report metadata.
    fn repository_id(&self) -> &str;

    /// All cells observed so far.
    fn cell_list(&self) -> Vec<CellId>;

    /// Configuration of one cell.
    fn cell_config(&self, cell: &CellId) -> Option<&CellConfigV1>;

    /// Ordered neighbor ids of one cell.
    fn cell_neighbors(&self, cell: &CellId) -> Vec<CellId>;
}

impl CellRepositoryV1 for CellSnapshotV1 {
    fn repository_id(&self) -> &str {
        "cell_snapshot"
    }

    fn cell_list(&self) -> Vec<CellId> {
        self.cell_ids().cloned().collect()
    }

    fn cell_config(&self, cell: &CellId) -> Option<&CellConfigV1> {
        self.config(cell)
    }

    fn cell_neighbors(&self, cell: &CellId) -> Vec<CellId> {
        self.neighbors(cell).to_vec()
    }
}

/// Receiver of persistent-loop events, called once per loop as it is found.
pub trait LoopReportSink {
    fn report_loop(&mut self, report: &LoopReportV1);
}

impl LoopReportSink for Vec<LoopReportV1> {
    fn report_loop(&mut self, report: &LoopReportV1) {
        self.push(report.clone());
    }
}

/// Sink that logs each loop at `warn` and keeps nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LoopReportSink for TracingSink {
    fn report_loop(&mut self, report: &LoopReportV1) {
        warn!(
            root = %report.root,
            hops = report.steps.len(),
            closing_margin = report.closing_margin,
            "Persistent loop: {report}"
        );
    }
}

/// Sink that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl LoopReportSink for NullSink {
    fn report_loop(&mut self, _report: &LoopReportV1) {}
}
