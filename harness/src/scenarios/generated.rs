//! Parameterized topologies for scale tests and benchmarks.

use handoff_kernel::cell::{CellSnapshotV1, HandoffConfigV1, Priority};

use super::builder::{thresholds, RuleTables, SnapshotBuilder};
use crate::contract::{ScenarioError, ScenarioV1};

const LOW_LAYER: u32 = 1850;
const HIGH_LAYER: u32 = 2600;

/// Directed ring `r0 → r1 → … → r0` on one layer with a fixed offset.
///
/// The first round enumerates every idle/active combination around the
/// ring, `2^size` closures. A non-negative offset keeps them transient;
/// a negative one makes each a persistent loop.
pub struct RingTopology {
    id: String,
    size: usize,
    offset: i64,
}

impl RingTopology {
    #[must_use]
    pub fn new(size: usize, offset: i64) -> Self {
        Self {
            id: format!("ring_{size}_offset_{offset}"),
            size,
            offset,
        }
    }
}

impl ScenarioV1 for RingTopology {
    fn scenario_id(&self) -> &str {
        &self.id
    }

    fn snapshot(&self) -> Result<CellSnapshotV1, ScenarioError> {
        let names: Vec<String> = (0..self.size).map(|i| format!("r{i}")).collect();
        let rule = HandoffConfigV1::with_offset(Priority::UNDEFINED, self.offset);
        let mut builder = SnapshotBuilder::new();
        for (i, name) in names.iter().enumerate() {
            let next = &names[(i + 1) % names.len()];
            builder = builder
                .cell(name, LOW_LAYER, Priority::UNDEFINED)
                .neighbors(&[next.as_str()])
                .layer_rule(LOW_LAYER, RuleTables::Both, rule);
        }
        builder.build()
    }
}

/// Checkerboard grid alternating between a low-priority and a
/// high-priority layer, with 4-neighborhoods.
///
/// Every hop either escalates (margin reset to 2) or falls back
/// (margin 2 - 4 = -2), so every closed path is persistent. The path count
/// grows exponentially; pair large meshes with `max_frames_per_round`.
pub struct MeshTopology {
    id: String,
    width: usize,
    height: usize,
}

impl MeshTopology {
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            id: format!("mesh_{width}x{height}"),
            width,
            height,
        }
    }

    fn name(x: usize, y: usize) -> String {
        format!("m{x}_{y}")
    }
}

impl ScenarioV1 for MeshTopology {
    fn scenario_id(&self) -> &str {
        &self.id
    }

    fn snapshot(&self) -> Result<CellSnapshotV1, ScenarioError> {
        let escalate = thresholds(Priority::ranked(5), 2, 0, 0);
        let fall_back = thresholds(Priority::ranked(3), 0, 0, 4);
        let mut builder = SnapshotBuilder::new();
        for y in 0..self.height {
            for x in 0..self.width {
                let mut neighbors = Vec::with_capacity(4);
                if x + 1 < self.width {
                    neighbors.push(Self::name(x + 1, y));
                }
                if y + 1 < self.height {
                    neighbors.push(Self::name(x, y + 1));
                }
                if x > 0 {
                    neighbors.push(Self::name(x - 1, y));
                }
                if y > 0 {
                    neighbors.push(Self::name(x, y - 1));
                }
                let refs: Vec<&str> = neighbors.iter().map(String::as_str).collect();

                builder = if (x + y) % 2 == 0 {
                    builder
                        .cell(&Self::name(x, y), LOW_LAYER, Priority::ranked(3))
                        .neighbors(&refs)
                        .layer_rule(HIGH_LAYER, RuleTables::Both, escalate)
                } else {
                    builder
                        .cell(&Self::name(x, y), HIGH_LAYER, Priority::ranked(5))
                        .neighbors(&refs)
                        .layer_rule(LOW_LAYER, RuleTables::Both, fall_back)
                };
            }
        }
        builder.build()
    }
}
