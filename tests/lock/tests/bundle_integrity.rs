//! Bundle lock tests: integrity, digest bindings, replay and the on-disk
//! directory form.

use handoff_harness::bundle::{
    build_bundle, verify_bundle, verify_bundle_with_profile, BundleVerifyError,
    VerificationProfile,
};
use handoff_harness::bundle_dir::{
    read_bundle_dir, verify_bundle_dir, write_bundle_dir, BundleDirReadError,
    BundleDirVerifyError,
};
use handoff_harness::policy::PolicyConfig;
use handoff_harness::runner::{run, run_with_policy};
use handoff_harness::scenarios::catalog::{PriorityEscalation, UnavailableConfig};
use lock_tests::bundle_test_helpers::{
    rebuild_with_modified_json, rebuild_with_modified_report, rebuild_without_artifact,
};

#[test]
fn fresh_bundle_passes_replay_verification() {
    let bundle = run(&PriorityEscalation).unwrap();
    verify_bundle(&bundle).unwrap();
    assert!(bundle.artifacts["cell_snapshot.json"].normative);
    assert!(bundle.artifacts["policy_snapshot.json"].normative);
    assert!(bundle.artifacts["loop_report.json"].normative);
    assert!(!bundle.artifacts["loop_report.txt"].normative);
}

#[test]
fn observational_text_does_not_move_the_digest() {
    let bundle = run(&PriorityEscalation).unwrap();
    let mut artifacts: Vec<(String, Vec<u8>, bool)> = bundle
        .artifacts
        .values()
        .map(|a| (a.name.clone(), a.content.clone(), a.normative))
        .collect();
    for artifact in &mut artifacts {
        if artifact.0 == "loop_report.txt" {
            artifact.1 = b"edited by hand".to_vec();
        }
    }
    let rebuilt = build_bundle(artifacts).unwrap();
    assert_eq!(rebuilt.digest, bundle.digest);
    assert_ne!(rebuilt.manifest, bundle.manifest);
}

#[test]
fn tampered_content_fails_hash_check() {
    let mut bundle = run(&PriorityEscalation).unwrap();
    bundle
        .artifacts
        .get_mut("loop_report.json")
        .unwrap()
        .content
        .push(b' ');
    let err = verify_bundle(&bundle).unwrap_err();
    assert!(matches!(err, BundleVerifyError::ContentHashMismatch { .. }), "{err:?}");
}

#[test]
fn forged_loop_list_is_caught_by_replay_only() {
    let bundle = run(&PriorityEscalation).unwrap();
    let forged = rebuild_with_modified_report(&bundle, |report| {
        report["loops"] = serde_json::json!([]);
        report["metadata"]["total_loops"] = serde_json::json!(0);
    });
    verify_bundle_with_profile(&forged, VerificationProfile::Integrity).unwrap();
    assert_eq!(
        verify_bundle(&forged).unwrap_err(),
        BundleVerifyError::ReplayDivergence
    );
}

#[test]
fn report_bound_to_other_snapshot_is_rejected() {
    let bundle = run(&PriorityEscalation).unwrap();
    let other = run(&UnavailableConfig).unwrap();
    let other_report = other.artifacts["loop_report.json"].content.clone();
    let spliced = rebuild_with_modified_report(&bundle, |report| {
        *report = serde_json::from_slice(&other_report).unwrap();
    });
    let err = verify_bundle_with_profile(&spliced, VerificationProfile::Integrity).unwrap_err();
    assert!(matches!(err, BundleVerifyError::SnapshotDigestMismatch { .. }), "{err:?}");
}

#[test]
fn edited_policy_breaks_the_policy_binding() {
    let bundle = run(&PriorityEscalation).unwrap();
    let edited = rebuild_with_modified_json(&bundle, "policy_snapshot.json", |policy| {
        policy["reporting"]["suppress_repeat_reports"] = serde_json::json!(true);
    });
    let err = verify_bundle(&edited).unwrap_err();
    assert!(matches!(err, BundleVerifyError::PolicyDigestMismatch { .. }), "{err:?}");
}

#[test]
fn report_without_inputs_is_rejected() {
    let bundle = run(&PriorityEscalation).unwrap();
    let stripped = rebuild_without_artifact(&bundle, "cell_snapshot.json");
    assert_eq!(
        verify_bundle(&stripped).unwrap_err(),
        BundleVerifyError::InputArtifactMissing {
            artifact: "cell_snapshot.json"
        }
    );
}

#[test]
fn policy_choice_reaches_the_replayed_report() {
    let config = PolicyConfig {
        max_frames_per_round: Some(1),
        ..PolicyConfig::default()
    };
    let bundle = run_with_policy(&PriorityEscalation, &config).unwrap();
    verify_bundle(&bundle).unwrap();
    let report: serde_json::Value =
        serde_json::from_slice(&bundle.artifacts["loop_report.json"].content).unwrap();
    assert_eq!(report["metadata"]["truncated_rounds"], 1);
    assert_eq!(report["loops"], serde_json::json!([]));
}

#[test]
fn bundle_dir_round_trips_and_verifies() {
    let bundle = run(&PriorityEscalation).unwrap();
    let dir = tempfile::tempdir().unwrap();
    write_bundle_dir(&bundle, dir.path()).unwrap();

    let loaded = read_bundle_dir(dir.path()).unwrap();
    assert_eq!(loaded.digest, bundle.digest);
    assert_eq!(loaded.artifacts.len(), bundle.artifacts.len());
    verify_bundle_dir(dir.path()).unwrap();
}

#[test]
fn bundle_dir_rejects_undeclared_files() {
    let bundle = run(&PriorityEscalation).unwrap();
    let dir = tempfile::tempdir().unwrap();
    write_bundle_dir(&bundle, dir.path()).unwrap();
    std::fs::write(dir.path().join("notes.txt"), b"stray").unwrap();

    let err = read_bundle_dir(dir.path()).unwrap_err();
    assert!(matches!(err, BundleDirReadError::ExtraFile { .. }), "{err:?}");
}

#[test]
fn bundle_dir_detects_edited_report_on_disk() {
    let bundle = run(&PriorityEscalation).unwrap();
    let dir = tempfile::tempdir().unwrap();
    write_bundle_dir(&bundle, dir.path()).unwrap();
    std::fs::write(dir.path().join("loop_report.json"), b"{}").unwrap();

    let err = verify_bundle_dir(dir.path()).unwrap_err();
    assert!(
        matches!(
            err,
            BundleDirVerifyError::VerifyError(BundleVerifyError::ContentHashMismatch { .. })
        ),
        "{err:?}"
    );
}
