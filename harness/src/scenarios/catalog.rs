//! Hand-built scenarios with known outcomes.
//!
//! Each scenario is small enough to trace by hand; the lock tests pin
//! the loops and round counters each one produces.

use handoff_kernel::cell::{CellSnapshotV1, HandoffConfigV1, Priority};

use super::builder::{thresholds, RuleTables, SnapshotBuilder};
use crate::contract::{ScenarioError, ScenarioV1};

/// Two same-frequency cells offering each other a +2 offset in both
/// states. Every closure is clear with a positive margin: no loop.
pub struct SameLayerPair;

impl ScenarioV1 for SameLayerPair {
    #[allow(clippy::unnecessary_literal_bound)]
    fn scenario_id(&self) -> &str {
        "same_layer_pair"
    }

    fn snapshot(&self) -> Result<CellSnapshotV1, ScenarioError> {
        let offset = HandoffConfigV1::with_offset(Priority::UNDEFINED, 2);
        SnapshotBuilder::new()
            .cell("A", 1850, Priority::UNDEFINED)
            .neighbors(&["B"])
            .rule_to("B", RuleTables::Both, offset)
            .cell("B", 1850, Priority::UNDEFINED)
            .neighbors(&["A"])
            .rule_to("A", RuleTables::Both, offset)
            .build()
    }
}

/// Directed ring A→B→C→A on one layer, each hop +1 through a
/// frequency-layer rule. The closing margin is 3, so the search extends
/// through the root instead of reporting.
pub struct EqualPreferenceRing;

impl ScenarioV1 for EqualPreferenceRing {
    #[allow(clippy::unnecessary_literal_bound)]
    fn scenario_id(&self) -> &str {
        "equal_preference_ring"
    }

    fn snapshot(&self) -> Result<CellSnapshotV1, ScenarioError> {
        let offset = HandoffConfigV1::with_offset(Priority::ranked(4), 1);
        SnapshotBuilder::new()
            .cell("A", 1850, Priority::ranked(4))
            .neighbors(&["B"])
            .layer_rule(1850, RuleTables::Both, offset)
            .cell("B", 1850, Priority::ranked(4))
            .neighbors(&["C"])
            .layer_rule(1850, RuleTables::Both, offset)
            .cell("C", 1850, Priority::ranked(4))
            .neighbors(&["A"])
            .layer_rule(1850, RuleTables::Both, offset)
            .build()
    }
}

/// A (priority 3) escalates to B (priority 5), which falls back to A
/// because B's serving threshold is above the reset margin. The closing
/// margin is 2 + 0 - 4 = -2: every kind combination is a persistent loop.
pub struct PriorityEscalation;

impl ScenarioV1 for PriorityEscalation {
    #[allow(clippy::unnecessary_literal_bound)]
    fn scenario_id(&self) -> &str {
        "priority_escalation"
    }

    fn snapshot(&self) -> Result<CellSnapshotV1, ScenarioError> {
        SnapshotBuilder::new()
            .cell("A", 1850, Priority::ranked(3))
            .neighbors(&["B"])
            .rule_to("B", RuleTables::Both, thresholds(Priority::ranked(5), 2, 0, 0))
            .cell("B", 2600, Priority::ranked(5))
            .neighbors(&["A"])
            .rule_to("A", RuleTables::Both, thresholds(Priority::ranked(3), 0, 0, 4))
            .build()
    }
}

/// A (priority 5) drops to B (priority 1) and B escalates straight back.
/// The return hop closes with margin 10, above A's serving threshold of 4
/// toward B, so A would hand off again: every closure escapes.
pub struct EscapeAtRoot;

impl ScenarioV1 for EscapeAtRoot {
    #[allow(clippy::unnecessary_literal_bound)]
    fn scenario_id(&self) -> &str {
        "escape_at_root"
    }

    fn snapshot(&self) -> Result<CellSnapshotV1, ScenarioError> {
        SnapshotBuilder::new()
            .cell("A", 1850, Priority::ranked(5))
            .neighbors(&["B"])
            .rule_to("B", RuleTables::Both, thresholds(Priority::ranked(1), 0, 0, 4))
            .cell("B", 2600, Priority::ranked(1))
            .neighbors(&["A"])
            .rule_to("A", RuleTables::Both, thresholds(Priority::ranked(5), 10, 0, 0))
            .build()
    }
}

/// A single cell with no neighbors.
pub struct IsolatedCell;

impl ScenarioV1 for IsolatedCell {
    #[allow(clippy::unnecessary_literal_bound)]
    fn scenario_id(&self) -> &str {
        "isolated_cell"
    }

    fn snapshot(&self) -> Result<CellSnapshotV1, ScenarioError> {
        SnapshotBuilder::new()
            .cell("A", 1850, Priority::ranked(1))
            .build()
    }
}

/// Three neighboring cells whose traces carried no handoff rules at all.
/// Every attempt is unknown; rounds end by exhausting the root.
pub struct UnavailableConfig;

impl ScenarioV1 for UnavailableConfig {
    #[allow(clippy::unnecessary_literal_bound)]
    fn scenario_id(&self) -> &str {
        "unavailable_config"
    }

    fn snapshot(&self) -> Result<CellSnapshotV1, ScenarioError> {
        SnapshotBuilder::new()
            .cell("A", 1850, Priority::ranked(2))
            .neighbors(&["B", "C"])
            .cell("B", 2600, Priority::ranked(4))
            .neighbors(&["A"])
            .cell("C", 2600, Priority::ranked(4))
            .neighbors(&["A"])
            .build()
    }
}

/// A legacy cell without priorities next to a ranked cell. The undefined
/// side forces equal-priority handling on both hops, and the negative
/// offsets leave the closing margin at -4.
///
/// A advertises only a reselection rule, so its active attempt is unknown.
pub struct LegacyUndefinedPriority;

impl ScenarioV1 for LegacyUndefinedPriority {
    #[allow(clippy::unnecessary_literal_bound)]
    fn scenario_id(&self) -> &str {
        "legacy_undefined_priority"
    }

    fn snapshot(&self) -> Result<CellSnapshotV1, ScenarioError> {
        SnapshotBuilder::new()
            .cell("U", 10_700, Priority::UNDEFINED)
            .neighbors(&["L"])
            .rule_to(
                "L",
                RuleTables::Idle,
                HandoffConfigV1::with_offset(Priority::ranked(5), -3),
            )
            .cell("L", 1850, Priority::ranked(5))
            .neighbors(&["U"])
            .rule_to(
                "U",
                RuleTables::Both,
                HandoffConfigV1::with_offset(Priority::UNDEFINED, -1),
            )
            .build()
    }
}

/// Every catalog scenario, in a fixed order.
#[must_use]
pub fn all() -> Vec<Box<dyn ScenarioV1>> {
    vec![
        Box::new(SameLayerPair),
        Box::new(EqualPreferenceRing),
        Box::new(PriorityEscalation),
        Box::new(EscapeAtRoot),
        Box::new(IsolatedCell),
        Box::new(UnavailableConfig),
        Box::new(LegacyUndefinedPriority),
    ]
}

/// Look up a catalog scenario by id.
#[must_use]
pub fn by_id(id: &str) -> Option<Box<dyn ScenarioV1>> {
    all().into_iter().find(|s| s.scenario_id() == id)
}
