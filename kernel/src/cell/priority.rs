//! Optional cell priority with the equal-on-undefined comparison rule.
//!
//! Older radio generations broadcast no priority at all. Such a cell must
//! never be ranked against a cell that does carry one: if either side of a
//! comparison is undefined, both sides are treated as equal. `Priority`
//! therefore deliberately implements neither `PartialOrd` nor `Ord`; the
//! only way to compare two priorities is [`Priority::relation_to`].

/// A cell's reselection/handover priority, possibly undefined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Priority(Option<u32>);

/// How one priority relates to another under the undefined-fallback rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityRelation {
    /// Same rank, or at least one side undefined.
    Equal,
    /// `self` ranks below `other` (the other side is more preferred).
    Lower,
    /// `self` ranks above `other`.
    Higher,
}

impl Priority {
    /// No priority broadcast.
    pub const UNDEFINED: Self = Self(None);

    #[must_use]
    pub const fn ranked(value: u32) -> Self {
        Self(Some(value))
    }

    #[must_use]
    pub const fn from_option(value: Option<u32>) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn value(self) -> Option<u32> {
        self.0
    }

    #[must_use]
    pub const fn is_defined(self) -> bool {
        self.0.is_some()
    }

    /// Compare `self` against `other`, collapsing to `Equal` whenever either
    /// side is undefined.
    #[must_use]
    pub fn relation_to(self, other: Self) -> PriorityRelation {
        match (self.0, other.0) {
            (Some(a), Some(b)) if a < b => PriorityRelation::Lower,
            (Some(a), Some(b)) if a > b => PriorityRelation::Higher,
            _ => PriorityRelation::Equal,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{v}"),
            None => f.write_str("undefined"),
        }
    }
}
