//! Visitation tracker: which cells have already served as a round root.
//!
//! Uses a `BTreeSet` (not `HashSet`) so any iteration that leaks into
//! report output is deterministic. Round-root order is the repository's
//! cell-list order; a cursor walks that list once per pass.

use std::collections::BTreeSet;

use handoff_kernel::cell::CellId;

/// Per-pass record of completed round roots.
#[derive(Debug, Clone)]
pub struct VisitationTracker {
    order: Vec<CellId>,
    members: BTreeSet<CellId>,
    visited: BTreeSet<CellId>,
    cursor: usize,
}

impl VisitationTracker {
    /// A tracker over `cells` with nothing visited.
    #[must_use]
    pub fn new(cells: Vec<CellId>) -> Self {
        let members = cells.iter().cloned().collect();
        Self {
            order: cells,
            members,
            visited: BTreeSet::new(),
            cursor: 0,
        }
    }

    /// Whether every tracked cell has completed its round.
    #[must_use]
    pub fn all_visited(&self) -> bool {
        self.visited.len() == self.members.len()
    }

    /// First unvisited cell in list order.
    pub fn pick_unvisited(&mut self) -> Option<CellId> {
        while let Some(cell) = self.order.get(self.cursor) {
            if !self.visited.contains(cell) {
                return Some(cell.clone());
            }
            self.cursor += 1;
        }
        None
    }

    /// Record that `cell` has completed its round. Untracked ids are ignored.
    pub fn mark_visited(&mut self, cell: &CellId) {
        if self.members.contains(cell) {
            self.visited.insert(cell.clone());
        }
    }

    #[must_use]
    pub fn is_visited(&self, cell: &CellId) -> bool {
        self.visited.contains(cell)
    }

    #[must_use]
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
