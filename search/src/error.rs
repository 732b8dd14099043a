//! Typed analysis errors.
//!
//! `AnalysisError` represents boundary failures only: a policy that cannot
//! run, or a repository that breaks its contract. Everything the search
//! itself decides (loop found, closure escaped, unknown configuration,
//! dead end, frame budget reached) is recorded in the
//! [`crate::report::AnalysisReportV1`] instead.

use handoff_kernel::cell::CellId;

/// Typed failure for analysis pre-flight validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// The policy carries a value the analysis cannot honor.
    InvalidPolicy { detail: String },
    /// A cell appears twice in the repository's cell list.
    DuplicateCell { cell: CellId },
    /// A listed cell has no configuration.
    MissingCellConfig { cell: CellId },
    /// A neighbor id is absent from the repository's cell list.
    UnknownNeighbor { cell: CellId, neighbor: CellId },
}

impl std::fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPolicy { detail } => write!(f, "invalid analysis policy: {detail}"),
            Self::DuplicateCell { cell } => write!(f, "cell {cell} listed twice"),
            Self::MissingCellConfig { cell } => {
                write!(f, "cell {cell} is listed but has no configuration")
            }
            Self::UnknownNeighbor { cell, neighbor } => {
                write!(f, "cell {cell} lists neighbor {neighbor}, which is not an observed cell")
            }
        }
    }
}

impl std::error::Error for AnalysisError {}
