//! Fluent construction of cell snapshots for scenarios and tests.

use handoff_kernel::cell::{
    CellConfigV1, CellId, CellSnapshotV1, CellStatus, ConfigTarget, HandoffConfigV1,
    HandoffRuleV1, Priority, SnapshotCellV1,
};

use crate::contract::ScenarioError;

/// Which rule tables a rule is added to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleTables {
    /// Reselection only.
    Idle,
    /// Measurement only.
    Active,
    Both,
}

/// Builds a [`CellSnapshotV1`] cell by cell.
///
/// Neighbor and rule calls apply to the most recently added cell.
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    cells: Vec<SnapshotCellV1>,
    error: Option<String>,
}

impl SnapshotBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new cell.
    #[must_use]
    pub fn cell(mut self, id: &str, frequency: u32, priority: Priority) -> Self {
        self.cells.push(SnapshotCellV1 {
            config: CellConfigV1::new(CellStatus::new(id, frequency), priority),
            neighbors: Vec::new(),
        });
        self
    }

    #[must_use]
    pub fn neighbors(mut self, ids: &[&str]) -> Self {
        if let Some(cell) = self.current("neighbors") {
            cell.neighbors.extend(ids.iter().map(|n| CellId::new(*n)));
        }
        self
    }

    /// Add a rule toward one specific cell.
    #[must_use]
    pub fn rule_to(self, target: &str, tables: RuleTables, config: HandoffConfigV1) -> Self {
        self.rule(ConfigTarget::Cell(CellId::new(target)), tables, config)
    }

    /// Add a rule toward a whole frequency layer.
    #[must_use]
    pub fn layer_rule(self, frequency: u32, tables: RuleTables, config: HandoffConfigV1) -> Self {
        self.rule(ConfigTarget::Frequency(frequency), tables, config)
    }

    fn rule(mut self, target: ConfigTarget, tables: RuleTables, config: HandoffConfigV1) -> Self {
        if let Some(cell) = self.current("rule") {
            let rule = HandoffRuleV1 { target, config };
            if matches!(tables, RuleTables::Idle | RuleTables::Both) {
                cell.config.reselection.push(rule.clone());
            }
            if matches!(tables, RuleTables::Active | RuleTables::Both) {
                cell.config.measurement.push(rule);
            }
        }
        self
    }

    fn current(&mut self, call: &str) -> Option<&mut SnapshotCellV1> {
        if self.cells.is_empty() && self.error.is_none() {
            self.error = Some(format!("{call}() called before any cell()"));
        }
        self.cells.last_mut()
    }

    /// # Errors
    ///
    /// Returns [`ScenarioError::BuildFailed`] on misuse or duplicate ids.
    pub fn build(self) -> Result<CellSnapshotV1, ScenarioError> {
        if let Some(detail) = self.error {
            return Err(ScenarioError::BuildFailed { detail });
        }
        Ok(CellSnapshotV1::new(self.cells)?)
    }
}

/// A rule with explicit thresholds and no offset.
#[must_use]
pub const fn thresholds(
    priority: Priority,
    threshold_high: i64,
    threshold_low: i64,
    threshold_serving_low: i64,
) -> HandoffConfigV1 {
    HandoffConfigV1 {
        priority,
        offset: None,
        threshold_high,
        threshold_low,
        threshold_serving_low,
    }
}
