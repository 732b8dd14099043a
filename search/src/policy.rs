//! Analysis policy types.

use crate::error::AnalysisError;

/// Search-level knobs for one analysis pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisPolicyV1 {
    /// What to do with a closure that is neither escaped nor persistent.
    pub root_closure: RootClosurePolicyV1,
    /// Cap on fresh frames pushed in one round. `None` means unbounded:
    /// a round only ever walks simple paths, so it terminates on its own.
    pub max_frames_per_round: Option<u64>,
}

impl AnalysisPolicyV1 {
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidPolicy`] for a zero frame budget,
    /// which would stop every round before its root is even pushed.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.max_frames_per_round == Some(0) {
            return Err(AnalysisError::InvalidPolicy {
                detail: "max_frames_per_round must be at least 1".into(),
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "max_frames_per_round": self.max_frames_per_round,
            "root_closure": self.root_closure.as_str(),
        })
    }
}

impl Default for AnalysisPolicyV1 {
    fn default() -> Self {
        Self {
            root_closure: RootClosurePolicyV1::ExtendThroughRoot,
            max_frames_per_round: None,
        }
    }
}

/// Handling of a non-persistent closure at the round root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootClosurePolicyV1 {
    /// Push the root again and keep searching past it. A single round may
    /// then report several loops sharing the root. Default.
    ExtendThroughRoot,
    /// Drop the closing edge; the path ends at the root.
    DiscardAtRoot,
}

impl RootClosurePolicyV1 {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ExtendThroughRoot => "extend_through_root",
            Self::DiscardAtRoot => "discard_at_root",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "extend_through_root" => Some(Self::ExtendThroughRoot),
            "discard_at_root" => Some(Self::DiscardAtRoot),
            _ => None,
        }
    }
}
