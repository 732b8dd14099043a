//! `CellSnapshotV1`: one decoded trace's worth of cell configuration.
//!
//! The snapshot is what the message-decoding layer hands to the analysis:
//! ordered cells, each with its configuration and ordered neighbor list.
//! Cell order and neighbor order are significant (they fix search order),
//! so both are preserved exactly through the JSON form.
//!
//! # JSON form
//!
//! ```text
//! {
//!   "schema_version": "cell_snapshot.v1",
//!   "cells": [
//!     { "id": "A", "frequency": 1850, "serving_priority": 3,
//!       "neighbors": ["B"],
//!       "reselection": [ { "target": {"cell": "B"}, "priority": 5,
//!                          "offset": null, "threshold_high": 2,
//!                          "threshold_low": 0, "threshold_serving_low": 4 } ],
//!       "measurement": [ ... ] }
//!   ]
//! }
//! ```
//!
//! `offset` and priorities may be absent or `null` (undefined). Absent
//! thresholds default to 0.

use std::collections::BTreeMap;

use super::config::{CellConfigV1, ConfigTarget, HandoffConfigV1, HandoffRuleV1};
use super::id::{CellId, CellStatus};
use super::priority::Priority;
use crate::proof::canon::{canonical_json_bytes, CanonError};
use crate::proof::hash::{canonical_hash, ContentHash, HashDomain};

/// Schema version tag carried by every serialized snapshot.
pub const SNAPSHOT_SCHEMA_VERSION: &str = "cell_snapshot.v1";

/// One observed cell with its neighbor relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotCellV1 {
    pub config: CellConfigV1,
    /// Ordered, duplicate-free neighbor ids.
    pub neighbors: Vec<CellId>,
}

impl SnapshotCellV1 {
    #[must_use]
    pub fn id(&self) -> &CellId {
        &self.config.status.cell_id
    }
}

/// Error building or parsing a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    /// Input bytes are not valid JSON.
    Parse { detail: String },
    /// `schema_version` missing or not recognized.
    SchemaVersion { found: String },
    /// A required field is absent.
    MissingField { path: String },
    /// A field is present but has the wrong type or range.
    InvalidField { path: String, detail: String },
    /// Two cells share one id.
    DuplicateCell { id: CellId },
}

impl std::fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse { detail } => write!(f, "snapshot is not valid JSON: {detail}"),
            Self::SchemaVersion { found } => {
                write!(f, "unsupported snapshot schema version: {found}")
            }
            Self::MissingField { path } => write!(f, "missing field: {path}"),
            Self::InvalidField { path, detail } => write!(f, "invalid field {path}: {detail}"),
            Self::DuplicateCell { id } => write!(f, "duplicate cell id: {id}"),
        }
    }
}

impl std::error::Error for SnapshotError {}

/// Ordered cells plus an id index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellSnapshotV1 {
    cells: Vec<SnapshotCellV1>,
    index: BTreeMap<CellId, usize>,
}

impl CellSnapshotV1 {
    /// Build a snapshot, rejecting duplicate cell ids and collapsing
    /// repeated neighbor ids to their first occurrence.
    ///
    /// Neighbor ids are NOT checked against the cell list here; that is a
    /// precondition the analysis enforces at its own boundary.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::DuplicateCell`] if two cells share an id.
    pub fn new(cells: Vec<SnapshotCellV1>) -> Result<Self, SnapshotError> {
        let mut index = BTreeMap::new();
        let mut deduped = Vec::with_capacity(cells.len());
        for (i, mut cell) in cells.into_iter().enumerate() {
            if index.insert(cell.id().clone(), i).is_some() {
                return Err(SnapshotError::DuplicateCell {
                    id: cell.id().clone(),
                });
            }
            let mut seen = std::collections::BTreeSet::new();
            cell.neighbors.retain(|n| seen.insert(n.clone()));
            deduped.push(cell);
        }
        Ok(Self {
            cells: deduped,
            index,
        })
    }

    #[must_use]
    pub fn cells(&self) -> &[SnapshotCellV1] {
        &self.cells
    }

    /// Cell ids in snapshot order.
    pub fn cell_ids(&self) -> impl Iterator<Item = &CellId> {
        self.cells.iter().map(SnapshotCellV1::id)
    }

    #[must_use]
    pub fn cell(&self, id: &CellId) -> Option<&SnapshotCellV1> {
        self.index.get(id).map(|&i| &self.cells[i])
    }

    #[must_use]
    pub fn config(&self, id: &CellId) -> Option<&CellConfigV1> {
        self.cell(id).map(|c| &c.config)
    }

    /// Neighbor ids of `id`, empty if the cell is unknown.
    #[must_use]
    pub fn neighbors(&self, id: &CellId) -> &[CellId] {
        self.cell(id).map(|c| c.neighbors.as_slice()).unwrap_or(&[])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Total number of directed neighbor relations.
    #[must_use]
    pub fn neighbor_relation_count(&self) -> usize {
        self.cells.iter().map(|c| c.neighbors.len()).sum()
    }

    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        let cells: Vec<serde_json::Value> = self
            .cells
            .iter()
            .map(|c| {
                let mut value = c.config.to_json_value();
                value["neighbors"] = c.neighbors.iter().map(CellId::as_str).collect();
                value
            })
            .collect();
        serde_json::json!({
            "cells": cells,
            "schema_version": SNAPSHOT_SCHEMA_VERSION,
        })
    }

    /// # Errors
    ///
    /// Returns [`CanonError`] if canonicalization fails (it cannot for a
    /// well-formed snapshot, which holds integers only).
    pub fn to_canonical_json_bytes(&self) -> Result<Vec<u8>, CanonError> {
        canonical_json_bytes(&self.to_json_value())
    }

    /// Content hash of the canonical form.
    ///
    /// # Errors
    ///
    /// Propagates [`CanonError`] from [`Self::to_canonical_json_bytes`].
    pub fn digest(&self) -> Result<ContentHash, CanonError> {
        Ok(canonical_hash(
            HashDomain::CellSnapshot,
            &self.to_canonical_json_bytes()?,
        ))
    }

    /// Parse the JSON form. Whitespace and key order are irrelevant.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError`] for invalid JSON, an unknown schema version,
    /// missing or ill-typed fields, or duplicate cell ids.
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        let value: serde_json::Value =
            serde_json::from_slice(bytes).map_err(|e| SnapshotError::Parse {
                detail: e.to_string(),
            })?;
        Self::from_json_value(&value)
    }

    /// # Errors
    ///
    /// See [`Self::from_json_bytes`].
    pub fn from_json_value(value: &serde_json::Value) -> Result<Self, SnapshotError> {
        let version = value["schema_version"].as_str().unwrap_or("<missing>");
        if version != SNAPSHOT_SCHEMA_VERSION {
            return Err(SnapshotError::SchemaVersion {
                found: version.to_string(),
            });
        }
        let cells = required_array(value, "cells", "cells")?
            .iter()
            .enumerate()
            .map(|(i, cell)| parse_cell(cell, &format!("cells[{i}]")))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(cells)
    }
}

fn parse_cell(value: &serde_json::Value, path: &str) -> Result<SnapshotCellV1, SnapshotError> {
    let id = required_str(value, "id", path)?;
    let frequency = required_u32(value, "frequency", path)?;
    let serving_priority = optional_priority(value, "serving_priority", path)?;

    let neighbors = match value.get("neighbors") {
        None | Some(serde_json::Value::Null) => Vec::new(),
        Some(_) => required_array(value, "neighbors", path)?
            .iter()
            .enumerate()
            .map(|(i, n)| {
                n.as_str().map(CellId::new).ok_or_else(|| SnapshotError::InvalidField {
                    path: format!("{path}.neighbors[{i}]"),
                    detail: "expected string".into(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?,
    };

    let mut config = CellConfigV1::new(CellStatus::new(id, frequency), serving_priority);
    config.reselection = parse_rules(value, "reselection", path)?;
    config.measurement = parse_rules(value, "measurement", path)?;

    Ok(SnapshotCellV1 { config, neighbors })
}

fn parse_rules(
    value: &serde_json::Value,
    key: &str,
    path: &str,
) -> Result<Vec<HandoffRuleV1>, SnapshotError> {
    match value.get(key) {
        None | Some(serde_json::Value::Null) => Ok(Vec::new()),
        Some(_) => required_array(value, key, path)?
            .iter()
            .enumerate()
            .map(|(i, rule)| parse_rule(rule, &format!("{path}.{key}[{i}]")))
            .collect(),
    }
}

fn parse_rule(value: &serde_json::Value, path: &str) -> Result<HandoffRuleV1, SnapshotError> {
    let target_value = value
        .get("target")
        .ok_or_else(|| SnapshotError::MissingField {
            path: format!("{path}.target"),
        })?;
    let target_path = format!("{path}.target");
    let target = if let Some(cell) = target_value.get("cell") {
        let id = cell.as_str().ok_or_else(|| SnapshotError::InvalidField {
            path: format!("{target_path}.cell"),
            detail: "expected string".into(),
        })?;
        ConfigTarget::Cell(CellId::new(id))
    } else if target_value.get("frequency").is_some() {
        ConfigTarget::Frequency(required_u32(target_value, "frequency", &target_path)?)
    } else {
        return Err(SnapshotError::InvalidField {
            path: target_path,
            detail: "expected {\"cell\": ..} or {\"frequency\": ..}".into(),
        });
    };

    let config = HandoffConfigV1 {
        priority: optional_priority(value, "priority", path)?,
        offset: optional_i64(value, "offset", path)?,
        threshold_high: optional_i64(value, "threshold_high", path)?.unwrap_or(0),
        threshold_low: optional_i64(value, "threshold_low", path)?.unwrap_or(0),
        threshold_serving_low: optional_i64(value, "threshold_serving_low", path)?.unwrap_or(0),
    };
    Ok(HandoffRuleV1 { target, config })
}

fn required_array<'a>(
    value: &'a serde_json::Value,
    key: &str,
    path: &str,
) -> Result<&'a Vec<serde_json::Value>, SnapshotError> {
    let field = value.get(key).ok_or_else(|| SnapshotError::MissingField {
        path: join(path, key),
    })?;
    field.as_array().ok_or_else(|| SnapshotError::InvalidField {
        path: join(path, key),
        detail: "expected array".into(),
    })
}

fn required_str<'a>(
    value: &'a serde_json::Value,
    key: &str,
    path: &str,
) -> Result<&'a str, SnapshotError> {
    let field = value.get(key).ok_or_else(|| SnapshotError::MissingField {
        path: join(path, key),
    })?;
    field.as_str().ok_or_else(|| SnapshotError::InvalidField {
        path: join(path, key),
        detail: "expected string".into(),
    })
}

fn required_u32(value: &serde_json::Value, key: &str, path: &str) -> Result<u32, SnapshotError> {
    let field = value.get(key).ok_or_else(|| SnapshotError::MissingField {
        path: join(path, key),
    })?;
    field
        .as_u64()
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| SnapshotError::InvalidField {
            path: join(path, key),
            detail: "expected unsigned 32-bit integer".into(),
        })
}

fn optional_i64(
    value: &serde_json::Value,
    key: &str,
    path: &str,
) -> Result<Option<i64>, SnapshotError> {
    match value.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(field) => field
            .as_i64()
            .map(Some)
            .ok_or_else(|| SnapshotError::InvalidField {
                path: join(path, key),
                detail: "expected integer".into(),
            }),
    }
}

fn optional_priority(
    value: &serde_json::Value,
    key: &str,
    path: &str,
) -> Result<Priority, SnapshotError> {
    let rank = match value.get(key) {
        None | Some(serde_json::Value::Null) => None,
        Some(_) => Some(required_u32(value, key, path)?),
    };
    Ok(Priority::from_option(rank))
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() || path == key {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}
