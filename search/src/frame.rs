//! Search frames and per-neighbor attempt state.
//!
//! A frame is one node on the live DFS path. Each frame owns its own
//! attempt map; nothing is aliased between frames, so re-pushing a frame
//! after advancing it is the only way its state changes.

use handoff_kernel::cell::{CellId, HandoffKind};

/// How far a frame has tried one of its neighbors.
///
/// Transitions only move forward: `Unvisited → IdleAttempted →
/// ActiveAttempted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AttemptState {
    Unvisited = 0,
    /// Idle-state reselection has been tried.
    IdleAttempted = 1,
    /// Connected-state handover has been tried too; nothing left.
    ActiveAttempted = 2,
}

impl AttemptState {
    /// The next state and the handoff kind it represents, or `None` once
    /// both kinds have been tried.
    #[must_use]
    pub const fn advance(self) -> Option<(Self, HandoffKind)> {
        match self {
            Self::Unvisited => Some((Self::IdleAttempted, HandoffKind::Idle)),
            Self::IdleAttempted => Some((Self::ActiveAttempted, HandoffKind::Active)),
            Self::ActiveAttempted => None,
        }
    }

    #[must_use]
    pub const fn is_exhausted(self) -> bool {
        matches!(self, Self::ActiveAttempted)
    }

    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Ordered neighbor → attempt-state map owned by one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighborAttempts {
    entries: Vec<(CellId, AttemptState)>,
}

impl NeighborAttempts {
    /// Fresh map in neighbor-list order. Neighbors for which `is_closed`
    /// holds (cells that already finished their own round) start exhausted.
    #[must_use]
    pub fn seed(neighbors: Vec<CellId>, is_closed: impl Fn(&CellId) -> bool) -> Self {
        let entries = neighbors
            .into_iter()
            .map(|n| {
                let state = if is_closed(&n) {
                    AttemptState::ActiveAttempted
                } else {
                    AttemptState::Unvisited
                };
                (n, state)
            })
            .collect();
        Self { entries }
    }

    #[must_use]
    pub fn state_of(&self, cell: &CellId) -> Option<AttemptState> {
        self.entries.iter().find(|(n, _)| n == cell).map(|(_, s)| *s)
    }

    /// Neighbors with at least one attempt left.
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.entries.iter().filter(|(_, s)| !s.is_exhausted()).count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CellId, AttemptState)> {
        self.entries.iter().map(|(n, s)| (n, *s))
    }

    /// Index of the first open neighbor not rejected by `excluded`.
    fn next_candidate(&self, excluded: impl Fn(&CellId) -> bool) -> Option<usize> {
        self.entries
            .iter()
            .position(|(n, s)| !s.is_exhausted() && !excluded(n))
    }
}

/// One node on the live DFS path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFrame {
    pub cell: CellId,
    pub attempts: NeighborAttempts,
    /// `false` when the hop into this cell was a priority-escalating move.
    pub clear: bool,
    /// Accumulated hysteresis budget along the path so far.
    pub margin: i64,
    /// Kind of the hop that pushed this frame; `None` for the round root.
    pub arrived_via: Option<HandoffKind>,
}

impl SearchFrame {
    /// The frame that seeds a round.
    #[must_use]
    pub fn root(cell: CellId, attempts: NeighborAttempts) -> Self {
        Self {
            cell,
            attempts,
            clear: true,
            margin: 0,
            arrived_via: None,
        }
    }

    /// A frame reached through a handoff of `kind`.
    #[must_use]
    pub fn arrival(
        cell: CellId,
        attempts: NeighborAttempts,
        kind: HandoffKind,
        clear: bool,
        margin: i64,
    ) -> Self {
        Self {
            cell,
            attempts,
            clear,
            margin,
            arrived_via: Some(kind),
        }
    }

    /// Pick the first open neighbor not rejected by `excluded` and advance
    /// its attempt state by one step.
    ///
    /// Returns the updated frame with the chosen destination and the handoff
    /// kind now being tried, or `None` when the frame is a dead end (the
    /// frame is consumed either way).
    #[must_use]
    pub fn advance(
        mut self,
        excluded: impl Fn(&CellId) -> bool,
    ) -> Option<(Self, CellId, HandoffKind)> {
        let index = self.attempts.next_candidate(excluded)?;
        let (dst, state) = &mut self.attempts.entries[index];
        let (next, kind) = state.advance()?;
        *state = next;
        let dst = dst.clone();
        Some((self, dst, kind))
    }
}
