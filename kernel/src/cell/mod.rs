//! Cell model: what the analysis reads about each observed cell.
//!
//! Everything here is owned by the configuration source and read-only to
//! the search. A [`CellSnapshotV1`] is the in-memory form of one decoded
//! trace: ordered cells, their neighbor lists and their handoff rules.

pub mod config;
pub mod id;
pub mod priority;
pub mod snapshot;

pub use config::{CellConfigV1, ConfigTarget, HandoffConfigV1, HandoffKind, HandoffRuleV1};
pub use id::{CellId, CellStatus};
pub use priority::{Priority, PriorityRelation};
pub use snapshot::{CellSnapshotV1, SnapshotCellV1, SnapshotError, SNAPSHOT_SCHEMA_VERSION};
