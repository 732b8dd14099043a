//! Scenario contract: the minimal trait a cell scenario must implement.
//!
//! Scenarios provide domain data only: a decoded cell snapshot. They may
//! NOT run the analysis, hash artifacts or enforce policy; those are runner
//! concerns.

use handoff_kernel::cell::{CellSnapshotV1, SnapshotError};

/// Typed failure for scenario construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioError {
    /// The scenario's cells did not form a valid snapshot.
    BuildFailed { detail: String },
}

impl std::fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BuildFailed { detail } => write!(f, "scenario build failed: {detail}"),
        }
    }
}

impl std::error::Error for ScenarioError {}

impl From<SnapshotError> for ScenarioError {
    fn from(e: SnapshotError) -> Self {
        Self::BuildFailed {
            detail: e.to_string(),
        }
    }
}

/// The contract a scenario must implement to be run by the harness runner.
pub trait ScenarioV1 {
    /// Unique scenario identifier (e.g., `"priority_escalation"`).
    fn scenario_id(&self) -> &str;

    /// The cells to analyze.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::BuildFailed`] if the cells are inconsistent.
    fn snapshot(&self) -> Result<CellSnapshotV1, ScenarioError>;
}

/// A snapshot decoded from a file or message, named by its caller.
#[derive(Debug, Clone)]
pub struct LoadedScenario {
    id: String,
    snapshot: CellSnapshotV1,
}

impl LoadedScenario {
    /// # Errors
    ///
    /// Returns [`SnapshotError`] if `bytes` are not a valid cell snapshot.
    pub fn from_json_bytes(id: impl Into<String>, bytes: &[u8]) -> Result<Self, SnapshotError> {
        Ok(Self {
            id: id.into(),
            snapshot: CellSnapshotV1::from_json_bytes(bytes)?,
        })
    }
}

impl ScenarioV1 for LoadedScenario {
    fn scenario_id(&self) -> &str {
        &self.id
    }

    fn snapshot(&self) -> Result<CellSnapshotV1, ScenarioError> {
        Ok(self.snapshot.clone())
    }
}
