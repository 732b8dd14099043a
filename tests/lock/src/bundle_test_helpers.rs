//! Shared test helpers for mutating and rebuilding artifact bundles.
//!
//! Every helper rebuilds through `build_bundle`, so hashes, manifest and
//! digest stay consistent. Negative tests then exercise the semantic check
//! they target instead of tripping an integrity check first.

use handoff_harness::bundle::{build_bundle, ArtifactBundleV1, ArtifactInput};
use handoff_kernel::proof::canon::canonical_json_bytes;

fn inputs(bundle: &ArtifactBundleV1) -> Vec<ArtifactInput> {
    bundle
        .artifacts
        .values()
        .map(|a| ArtifactInput::from((a.name.clone(), a.content.clone(), a.normative)))
        .collect()
}

/// Rebuild `bundle` with the JSON artifact `name` modified by `modify`.
///
/// # Panics
///
/// Panics if the artifact is missing or is not valid JSON.
pub fn rebuild_with_modified_json(
    bundle: &ArtifactBundleV1,
    name: &str,
    modify: impl FnOnce(&mut serde_json::Value),
) -> ArtifactBundleV1 {
    let mut artifacts = inputs(bundle);
    let target = artifacts
        .iter_mut()
        .find(|a| a.name == name)
        .unwrap_or_else(|| panic!("bundle has no {name}"));
    let mut value: serde_json::Value = serde_json::from_slice(&target.content).unwrap();
    modify(&mut value);
    target.content = canonical_json_bytes(&value).unwrap();
    build_bundle(artifacts).unwrap()
}

/// Rebuild `bundle` with `loop_report.json` modified by `modify`.
///
/// # Panics
///
/// Panics if the bundle has no parseable loop report.
pub fn rebuild_with_modified_report(
    bundle: &ArtifactBundleV1,
    modify: impl FnOnce(&mut serde_json::Value),
) -> ArtifactBundleV1 {
    rebuild_with_modified_json(bundle, "loop_report.json", modify)
}

/// Rebuild `bundle` without the artifact `name`.
///
/// # Panics
///
/// Panics if the rebuild fails.
pub fn rebuild_without_artifact(bundle: &ArtifactBundleV1, name: &str) -> ArtifactBundleV1 {
    let artifacts: Vec<ArtifactInput> = inputs(bundle)
        .into_iter()
        .filter(|a| a.name != name)
        .collect();
    build_bundle(artifacts).unwrap()
}
