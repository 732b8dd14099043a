//! Cell identifiers and status descriptors.

/// Opaque identifier of an observed cell.
///
/// Ordering is byte order of the underlying string; it is used only for
/// deterministic map iteration, never for search order (search order is
/// the neighbor-list order supplied by the repository).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(String);

impl CellId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CellId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CellId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// The lookup key another cell uses to find its handoff rule toward this cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellStatus {
    pub cell_id: CellId,
    /// Carrier frequency (channel number in the radio generation's numbering).
    pub frequency: u32,
}

impl CellStatus {
    #[must_use]
    pub fn new(cell_id: impl Into<String>, frequency: u32) -> Self {
        Self {
            cell_id: CellId::new(cell_id),
            frequency,
        }
    }
}
