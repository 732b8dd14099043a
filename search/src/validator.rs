//! Closure test for paths that return to the round root.

use handoff_kernel::cell::{HandoffKind, PriorityRelation};

use crate::contract::CellRepositoryV1;
use crate::frame::SearchFrame;
use crate::report::{LoopReportV1, LoopStepV1};

/// The hop that would re-enter the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClosingHop {
    pub kind: HandoffKind,
    pub clear: bool,
    pub margin: i64,
}

/// What the explorer should do with a closure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClosureVerdict {
    /// The root would immediately hand off to a lower-priority layer and
    /// break the chain. Nothing is reported or pushed.
    Escaped,
    /// The rules would repeat this cycle indefinitely.
    Persistent(LoopReportV1),
    /// A transient cycle; the root-closure policy decides what happens next.
    Transient,
}

/// Classify a closure of `path` (root first, top of stack last) through
/// `hop`.
///
/// The escape check re-reads the root's configuration toward the first
/// cell after it, using the kind that cell was entered with. It is skipped
/// when the path has no such cell or the root has no configuration of
/// that kind toward it.
#[must_use]
pub fn check_closure(
    repository: &dyn CellRepositoryV1,
    path: &[SearchFrame],
    hop: ClosingHop,
) -> ClosureVerdict {
    let Some(root) = path.first() else {
        return ClosureVerdict::Transient;
    };

    if escapes_at_root(repository, path, hop.margin) {
        return ClosureVerdict::Escaped;
    }

    let persistent = !hop.clear || hop.margin < 0 || path.iter().any(|f| !f.clear);
    if !persistent {
        return ClosureVerdict::Transient;
    }

    let steps = path
        .iter()
        .enumerate()
        .map(|(i, frame)| LoopStepV1 {
            cell: frame.cell.clone(),
            kind: path
                .get(i + 1)
                .and_then(|next| next.arrived_via)
                .unwrap_or(hop.kind),
        })
        .collect();
    ClosureVerdict::Persistent(LoopReportV1 {
        root: root.cell.clone(),
        steps,
        closing_margin: hop.margin,
    })
}

fn escapes_at_root(repository: &dyn CellRepositoryV1, path: &[SearchFrame], margin: i64) -> bool {
    let (Some(root), Some(first)) = (path.first(), path.get(1)) else {
        return false;
    };
    let Some(kind) = first.arrived_via else {
        return false;
    };
    let (Some(root_config), Some(first_config)) = (
        repository.cell_config(&root.cell),
        repository.cell_config(&first.cell),
    ) else {
        return false;
    };
    let Some(toward_first) = root_config.config_for(kind, &first_config.status) else {
        return false;
    };
    root_config.serving_priority.relation_to(toward_first.priority) == PriorityRelation::Higher
        && margin > toward_first.threshold_serving_low
}
