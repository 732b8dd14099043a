//! Handoff configuration: per-pair rules and the per-cell lookup operations.

use super::id::{CellId, CellStatus};
use super::priority::Priority;
use crate::proof::canon::canonical_json_bytes;

/// Which handoff mechanism a rule governs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HandoffKind {
    /// Idle-state cell reselection (reselection configuration).
    Idle,
    /// Connected-state handover (measurement configuration).
    Active,
}

impl HandoffKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Active => "active",
        }
    }

    /// Inverse of [`HandoffKind::as_str`].
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "idle" => Some(Self::Idle),
            "active" => Some(Self::Active),
            _ => None,
        }
    }
}

impl std::fmt::Display for HandoffKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handoff parameters a source cell advertises toward one destination.
///
/// All hysteresis values are integers in the protocol's configured units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandoffConfigV1 {
    /// The destination's advertised priority.
    pub priority: Priority,
    /// Equal-priority offset; `None` when the trace never carried one.
    pub offset: Option<i64>,
    /// Threshold for moving to a higher-priority destination.
    pub threshold_high: i64,
    /// Threshold the destination must exceed for a lower-priority move.
    pub threshold_low: i64,
    /// Serving-cell threshold below which a lower-priority move may trigger.
    pub threshold_serving_low: i64,
}

impl HandoffConfigV1 {
    /// An equal-priority rule carrying only an offset.
    #[must_use]
    pub const fn with_offset(priority: Priority, offset: i64) -> Self {
        Self {
            priority,
            offset: Some(offset),
            threshold_high: 0,
            threshold_low: 0,
            threshold_serving_low: 0,
        }
    }

    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "offset": self.offset,
            "priority": self.priority.value(),
            "threshold_high": self.threshold_high,
            "threshold_low": self.threshold_low,
            "threshold_serving_low": self.threshold_serving_low,
        })
    }
}

/// What a rule applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigTarget {
    /// One specific neighbor cell.
    Cell(CellId),
    /// Every cell on a frequency layer.
    Frequency(u32),
}

/// A handoff configuration bound to its target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoffRuleV1 {
    pub target: ConfigTarget,
    pub config: HandoffConfigV1,
}

impl HandoffRuleV1 {
    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        let target = match &self.target {
            ConfigTarget::Cell(id) => serde_json::json!({ "cell": id.as_str() }),
            ConfigTarget::Frequency(freq) => serde_json::json!({ "frequency": freq }),
        };
        let mut value = self.config.to_json_value();
        value["target"] = target;
        value
    }
}

/// Everything one cell broadcasts that matters to handoff decisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellConfigV1 {
    pub status: CellStatus,
    /// The serving cell's own priority.
    pub serving_priority: Priority,
    /// Idle-state rules, searched in order.
    pub reselection: Vec<HandoffRuleV1>,
    /// Connected-state rules, searched in order.
    pub measurement: Vec<HandoffRuleV1>,
}

impl CellConfigV1 {
    /// A cell with no rules yet.
    #[must_use]
    pub fn new(status: CellStatus, serving_priority: Priority) -> Self {
        Self {
            status,
            serving_priority,
            reselection: Vec::new(),
            measurement: Vec::new(),
        }
    }

    /// Idle-state configuration toward `target`, if the trace carried one.
    #[must_use]
    pub fn reselection_config(&self, target: &CellStatus) -> Option<&HandoffConfigV1> {
        lookup(&self.reselection, target)
    }

    /// Connected-state configuration toward `target`, if the trace carried one.
    #[must_use]
    pub fn measurement_config(&self, target: &CellStatus) -> Option<&HandoffConfigV1> {
        lookup(&self.measurement, target)
    }

    /// Dispatch to the lookup matching `kind`.
    #[must_use]
    pub fn config_for(&self, kind: HandoffKind, target: &CellStatus) -> Option<&HandoffConfigV1> {
        match kind {
            HandoffKind::Idle => self.reselection_config(target),
            HandoffKind::Active => self.measurement_config(target),
        }
    }

    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "frequency": self.status.frequency,
            "id": self.status.cell_id.as_str(),
            "measurement": self.measurement.iter().map(HandoffRuleV1::to_json_value).collect::<Vec<_>>(),
            "reselection": self.reselection.iter().map(HandoffRuleV1::to_json_value).collect::<Vec<_>>(),
            "serving_priority": self.serving_priority.value(),
        })
    }

    /// One-line canonical JSON rendering for log output.
    #[must_use]
    pub fn dump(&self) -> String {
        canonical_json_bytes(&self.to_json_value())
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .unwrap_or_else(|| format!("{self:?}"))
    }
}

/// Cell-specific rule first, then the rule for the target's frequency layer.
fn lookup<'a>(rules: &'a [HandoffRuleV1], target: &CellStatus) -> Option<&'a HandoffConfigV1> {
    rules
        .iter()
        .find(|r| matches!(&r.target, ConfigTarget::Cell(id) if *id == target.cell_id))
        .or_else(|| {
            rules
                .iter()
                .find(|r| matches!(r.target, ConfigTarget::Frequency(f) if f == target.frequency))
        })
        .map(|r| &r.config)
}
