//! Handoff decision evaluation.
//!
//! Given where a path currently stands (source cell and accumulated margin)
//! and a candidate destination, decide whether the configured rules move
//! the device there, and if so what clearance flag and margin the new hop
//! carries.

use handoff_kernel::cell::{
    CellConfigV1, CellStatus, HandoffConfigV1, HandoffKind, Priority, PriorityRelation,
};

/// Why an edge could not be decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownReason {
    /// The trace carried no configuration of the requested kind.
    ConfigUnavailable,
    /// Equal-preference rule applies but no offset was observed.
    OffsetUndefined,
}

/// Outcome of evaluating one candidate edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandoffDecision {
    /// Not enough data to decide; the edge is skipped for this attempt.
    Unknown(UnknownReason),
    /// The rules keep the device on the source cell.
    NoHandoff,
    /// The device moves. `clear == false` marks a priority-escalating move.
    Handoff { clear: bool, margin: i64 },
}

/// Trait for edge evaluation.
///
/// Implementations must be pure: the same inputs always yield the same
/// decision. The explorer relies on this for reproducible reports.
pub trait HandoffEvaluator {
    fn evaluate(
        &self,
        src: &CellConfigV1,
        dst: &CellStatus,
        kind: HandoffKind,
        src_margin: i64,
    ) -> HandoffDecision;
}

/// The priority / frequency / hysteresis rule table of idle reselection and
/// connected handover.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProtocolRuleEvaluator;

impl HandoffEvaluator for ProtocolRuleEvaluator {
    fn evaluate(
        &self,
        src: &CellConfigV1,
        dst: &CellStatus,
        kind: HandoffKind,
        src_margin: i64,
    ) -> HandoffDecision {
        let Some(config) = src.config_for(kind, dst) else {
            return HandoffDecision::Unknown(UnknownReason::ConfigUnavailable);
        };
        decide(
            src.serving_priority,
            src.status.frequency == dst.frequency,
            config,
            src_margin,
        )
    }
}

/// Apply the rule table to one resolved configuration.
///
/// Rules, first match wins:
/// 1. same frequency, or equal priority (either side undefined counts as
///    equal): hand off with `clear` and `margin + offset`; unknown if no
///    offset was observed.
/// 2. destination ranks higher: hand off without `clear`, and the margin
///    resets to `threshold_high`.
/// 3. destination ranks lower: stay if `margin > threshold_serving_low`,
///    otherwise hand off with `clear` and
///    `margin + threshold_low - threshold_serving_low`.
#[must_use]
pub fn decide(
    src_priority: Priority,
    same_frequency: bool,
    config: &HandoffConfigV1,
    src_margin: i64,
) -> HandoffDecision {
    let relation = src_priority.relation_to(config.priority);
    if same_frequency || relation == PriorityRelation::Equal {
        return match config.offset {
            Some(offset) => HandoffDecision::Handoff {
                clear: true,
                margin: src_margin.saturating_add(offset),
            },
            None => HandoffDecision::Unknown(UnknownReason::OffsetUndefined),
        };
    }
    if relation == PriorityRelation::Lower {
        return HandoffDecision::Handoff {
            clear: false,
            margin: config.threshold_high,
        };
    }
    if src_margin > config.threshold_serving_low {
        return HandoffDecision::NoHandoff;
    }
    HandoffDecision::Handoff {
        clear: true,
        margin: src_margin
            .saturating_add(config.threshold_low)
            .saturating_sub(config.threshold_serving_low),
    }
}
