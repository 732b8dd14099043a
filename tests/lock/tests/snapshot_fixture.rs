//! Snapshot file lock tests: the JSON form loads, canonicalizes and
//! analyzes the same as its builder-made equivalent.

use std::path::Path;

use handoff_harness::bundle::verify_bundle;
use handoff_harness::contract::{LoadedScenario, ScenarioV1};
use handoff_harness::runner::run;
use handoff_kernel::cell::{CellId, CellSnapshotV1, SnapshotError};

fn fixture_bytes() -> Vec<u8> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../fixtures/escalation_fallback.json");
    std::fs::read(path).expect("fixture readable")
}

#[test]
fn fixture_loads_in_file_order() {
    let snapshot = CellSnapshotV1::from_json_bytes(&fixture_bytes()).unwrap();
    let ids: Vec<&str> = snapshot.cell_ids().map(CellId::as_str).collect();
    assert_eq!(ids, ["A", "B", "C"]);
    assert_eq!(snapshot.neighbor_relation_count(), 3);
    assert!(snapshot.config(&CellId::new("C")).unwrap().reselection.is_empty());
}

#[test]
fn canonical_bytes_reparse_to_the_same_snapshot() {
    let snapshot = CellSnapshotV1::from_json_bytes(&fixture_bytes()).unwrap();
    let canonical = snapshot.to_canonical_json_bytes().unwrap();
    let reparsed = CellSnapshotV1::from_json_bytes(&canonical).unwrap();
    assert_eq!(reparsed, snapshot);
    assert_eq!(reparsed.digest().unwrap(), snapshot.digest().unwrap());
}

#[test]
fn frequency_rule_drives_the_fallback_hop() {
    let scenario = LoadedScenario::from_json_bytes("fixture", &fixture_bytes()).unwrap();
    assert_eq!(scenario.scenario_id(), "fixture");
    let bundle = run(&scenario).unwrap();
    verify_bundle(&bundle).unwrap();

    let report: serde_json::Value =
        serde_json::from_slice(&bundle.artifacts["loop_report.json"].content).unwrap();
    assert_eq!(report["metadata"]["cell_count"], 3);
    assert_eq!(report["metadata"]["total_rounds"], 3);
    assert_eq!(report["metadata"]["total_loops"], 4);
    // C's only neighbor is visited by the time C is a root.
    assert_eq!(report["rounds"][2]["root"], "C");
    assert_eq!(report["rounds"][2]["candidate_attempts"], 0);
}

#[test]
fn malformed_snapshots_are_rejected_with_a_path() {
    let wrong_version = br#"{"schema_version": "cell_snapshot.v0", "cells": []}"#;
    assert!(matches!(
        CellSnapshotV1::from_json_bytes(wrong_version).unwrap_err(),
        SnapshotError::SchemaVersion { .. }
    ));

    let bad_neighbor = br#"{"schema_version": "cell_snapshot.v1",
        "cells": [{"id": "A", "frequency": 1, "neighbors": [7]}]}"#;
    match CellSnapshotV1::from_json_bytes(bad_neighbor).unwrap_err() {
        SnapshotError::InvalidField { path, .. } => assert_eq!(path, "cells[0].neighbors[0]"),
        other => panic!("unexpected error {other:?}"),
    }

    let duplicate = br#"{"schema_version": "cell_snapshot.v1",
        "cells": [{"id": "A", "frequency": 1}, {"id": "A", "frequency": 2}]}"#;
    assert!(matches!(
        CellSnapshotV1::from_json_bytes(duplicate).unwrap_err(),
        SnapshotError::DuplicateCell { .. }
    ));
}
