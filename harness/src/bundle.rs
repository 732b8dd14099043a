//! In-memory artifact bundle: the output of a harness run.
//!
//! No file I/O in this module; see [`crate::bundle_dir`] for persistence.
//!
//! # Normative vs observational artifacts
//!
//! Each artifact is tagged `normative` (participates in bundle digest)
//! or observational (present in the manifest but excluded from digest).
//! `loop_report.txt` is observational: it is a rendering of
//! `loop_report.json` and carries no information of its own.
//!
//! The bundle digest is computed over the **digest basis**: a canonical
//! JSON projection of normative artifact hashes only.

use std::collections::BTreeMap;

use handoff_kernel::cell::CellSnapshotV1;
use handoff_kernel::proof::canon::{canonical_json_bytes, is_canonical};
use handoff_kernel::proof::hash::{canonical_hash, ContentHash, HashDomain};
use handoff_search::contract::NullSink;

use crate::policy::{PolicySnapshotV1, DOMAIN_POLICY_SNAPSHOT};
use crate::runner::compute_report;

/// Domain prefix for bundle artifact content hashing (harness-originated).
pub const DOMAIN_BUNDLE_ARTIFACT: HashDomain = HashDomain::BundleArtifact;

/// Domain prefix for bundle digest computation (harness-originated).
pub const DOMAIN_BUNDLE_DIGEST: HashDomain = HashDomain::BundleDigest;

const SNAPSHOT_ARTIFACT: &str = "cell_snapshot.json";
const POLICY_ARTIFACT: &str = "policy_snapshot.json";
const REPORT_ARTIFACT: &str = "loop_report.json";

/// A single artifact in the bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleArtifact {
    /// Logical filename (e.g., `"loop_report.json"`).
    pub name: String,
    pub content: Vec<u8>,
    /// `canonical_hash(DOMAIN_BUNDLE_ARTIFACT, content)`.
    pub content_hash: ContentHash,
    /// Whether this artifact participates in the bundle digest.
    pub normative: bool,
}

/// The complete artifact bundle from a harness run.
#[derive(Debug, Clone)]
pub struct ArtifactBundleV1 {
    /// Artifacts indexed by logical name, in sorted order (`BTreeMap`).
    pub artifacts: BTreeMap<String, BundleArtifact>,
    /// Full manifest: canonical JSON listing all artifacts with normative flags.
    pub manifest: Vec<u8>,
    /// Digest basis: canonical JSON listing normative artifact hashes only.
    pub digest_basis: Vec<u8>,
    /// `canonical_hash(DOMAIN_BUNDLE_DIGEST, digest_basis)`.
    pub digest: ContentHash,
}

/// Error building a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleBuildError {
    /// Canonical JSON serialization failed.
    CanonError { detail: String },
}

impl std::fmt::Display for BundleBuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CanonError { detail } => write!(f, "canonical JSON error: {detail}"),
        }
    }
}

impl std::error::Error for BundleBuildError {}

/// Input for bundle assembly. The content hash is always computed here.
pub struct ArtifactInput {
    pub name: String,
    pub content: Vec<u8>,
    pub normative: bool,
}

impl From<(String, Vec<u8>, bool)> for ArtifactInput {
    fn from((name, content, normative): (String, Vec<u8>, bool)) -> Self {
        Self {
            name,
            content,
            normative,
        }
    }
}

/// Build an `ArtifactBundleV1` from a list of artifact inputs.
///
/// Accepts `Vec<ArtifactInput>` or `Vec<(String, Vec<u8>, bool)>` (via `From`).
///
/// # Errors
///
/// Returns [`BundleBuildError`] if canonical JSON serialization of the
/// manifest or digest basis fails.
pub fn build_bundle(
    artifacts: Vec<impl Into<ArtifactInput>>,
) -> Result<ArtifactBundleV1, BundleBuildError> {
    let mut artifact_map = BTreeMap::new();

    for input in artifacts {
        let input = input.into();
        let content_hash = canonical_hash(DOMAIN_BUNDLE_ARTIFACT, &input.content);
        artifact_map.insert(
            input.name.clone(),
            BundleArtifact {
                name: input.name,
                content: input.content,
                content_hash,
                normative: input.normative,
            },
        );
    }

    let manifest = manifest_bytes(&artifact_map)
        .map_err(|detail| BundleBuildError::CanonError { detail })?;
    let digest_basis = digest_basis_bytes(&artifact_map)
        .map_err(|detail| BundleBuildError::CanonError { detail })?;
    let digest = canonical_hash(DOMAIN_BUNDLE_DIGEST, &digest_basis);

    Ok(ArtifactBundleV1 {
        artifacts: artifact_map,
        manifest,
        digest_basis,
        digest,
    })
}

/// Error from bundle verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleVerifyError {
    /// An artifact's stored `content_hash` does not match recomputed hash.
    ContentHashMismatch {
        artifact: String,
        expected: String,
        actual: String,
    },
    /// Stored `manifest` bytes do not match recomputed manifest from artifacts.
    ManifestMismatch,
    ManifestNotCanonical,
    /// Stored `digest_basis` bytes do not match recomputed normative projection.
    DigestBasisMismatch,
    DigestBasisNotCanonical,
    /// Stored `digest` does not match recomputed hash of `digest_basis`.
    DigestMismatch { expected: String, actual: String },
    /// A normative JSON artifact is not in canonical JSON form.
    ArtifactNotCanonical { artifact: String },
    /// `loop_report.json` is present but an input it binds to is not.
    InputArtifactMissing { artifact: &'static str },
    /// An artifact failed to parse.
    ArtifactParseError { artifact: &'static str, detail: String },
    /// `loop_report.json` is missing a required field.
    ReportFieldMissing { field: &'static str },
    /// Report `snapshot_digest` does not match `cell_snapshot.json`.
    SnapshotDigestMismatch { declared: String, recomputed: String },
    /// Report `policy_digest` does not match `policy_snapshot.json`.
    PolicyDigestMismatch { declared: String, recomputed: String },
    /// Re-running the analysis on the bundled inputs failed.
    ReplayFailed { detail: String },
    /// Re-running the analysis produced a different `loop_report.json`.
    ReplayDivergence,
    CanonError { detail: String },
}

impl std::fmt::Display for BundleVerifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ContentHashMismatch {
                artifact,
                expected,
                actual,
            } => write!(
                f,
                "content hash mismatch for {artifact}: stored={expected}, recomputed={actual}"
            ),
            Self::ManifestMismatch => {
                f.write_str("manifest does not match the projection of the artifacts")
            }
            Self::ManifestNotCanonical => f.write_str("manifest is not canonical JSON"),
            Self::DigestBasisMismatch => {
                f.write_str("digest basis does not match the normative artifacts")
            }
            Self::DigestBasisNotCanonical => f.write_str("digest basis is not canonical JSON"),
            Self::DigestMismatch { expected, actual } => {
                write!(f, "bundle digest mismatch: stored={expected}, recomputed={actual}")
            }
            Self::ArtifactNotCanonical { artifact } => {
                write!(f, "{artifact} is not canonical JSON")
            }
            Self::InputArtifactMissing { artifact } => write!(f, "missing input artifact {artifact}"),
            Self::ArtifactParseError { artifact, detail } => {
                write!(f, "{artifact} failed to parse: {detail}")
            }
            Self::ReportFieldMissing { field } => write!(f, "loop report missing field {field}"),
            Self::SnapshotDigestMismatch {
                declared,
                recomputed,
            } => write!(
                f,
                "snapshot digest mismatch: declared={declared}, recomputed={recomputed}"
            ),
            Self::PolicyDigestMismatch {
                declared,
                recomputed,
            } => write!(
                f,
                "policy digest mismatch: declared={declared}, recomputed={recomputed}"
            ),
            Self::ReplayFailed { detail } => write!(f, "replay failed: {detail}"),
            Self::ReplayDivergence => f.write_str("replayed loop report differs from bundled one"),
            Self::CanonError { detail } => write!(f, "canonical JSON error: {detail}"),
        }
    }
}

impl std::error::Error for BundleVerifyError {}

/// How much verification to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerificationProfile {
    /// Hashes, manifest, digest, canonical form and digest bindings only.
    Integrity,
    /// Everything in `Integrity`, plus re-running the analysis from the
    /// bundled snapshot and policy and comparing the report byte for byte.
    #[default]
    Replay,
}

/// Verify a bundle with the default `Replay` profile.
///
/// # Errors
///
/// Returns the first [`BundleVerifyError`] encountered.
pub fn verify_bundle(bundle: &ArtifactBundleV1) -> Result<(), BundleVerifyError> {
    verify_bundle_with_profile(bundle, VerificationProfile::Replay)
}

/// Verify a bundle with an explicit profile.
///
/// Checks, in order:
///
/// 1. Each artifact's `content_hash` matches its content.
/// 2. `manifest` matches the projection recomputed from all artifacts and
///    is canonical.
/// 3. `digest_basis` matches the projection recomputed from normative
///    artifacts and is canonical.
/// 4. `digest` matches `canonical_hash(DOMAIN_BUNDLE_DIGEST, digest_basis)`.
/// 5. Normative `.json` artifacts are canonical.
/// 6. If `loop_report.json` exists, both inputs exist and its
///    `snapshot_digest` / `policy_digest` match them.
/// 7. (`Replay` only) re-running the analysis reproduces `loop_report.json`.
///
/// # Errors
///
/// Returns the first [`BundleVerifyError`] encountered.
pub fn verify_bundle_with_profile(
    bundle: &ArtifactBundleV1,
    profile: VerificationProfile,
) -> Result<(), BundleVerifyError> {
    for artifact in bundle.artifacts.values() {
        let recomputed = canonical_hash(DOMAIN_BUNDLE_ARTIFACT, &artifact.content);
        if recomputed != artifact.content_hash {
            return Err(BundleVerifyError::ContentHashMismatch {
                artifact: artifact.name.clone(),
                expected: artifact.content_hash.as_str().to_string(),
                actual: recomputed.as_str().to_string(),
            });
        }
    }

    let expected_manifest =
        manifest_bytes(&bundle.artifacts).map_err(|detail| BundleVerifyError::CanonError { detail })?;
    if expected_manifest != bundle.manifest {
        return Err(BundleVerifyError::ManifestMismatch);
    }
    if !is_canonical(&bundle.manifest) {
        return Err(BundleVerifyError::ManifestNotCanonical);
    }

    let expected_basis = digest_basis_bytes(&bundle.artifacts)
        .map_err(|detail| BundleVerifyError::CanonError { detail })?;
    if expected_basis != bundle.digest_basis {
        return Err(BundleVerifyError::DigestBasisMismatch);
    }
    if !is_canonical(&bundle.digest_basis) {
        return Err(BundleVerifyError::DigestBasisNotCanonical);
    }

    let recomputed_digest = canonical_hash(DOMAIN_BUNDLE_DIGEST, &bundle.digest_basis);
    if recomputed_digest != bundle.digest {
        return Err(BundleVerifyError::DigestMismatch {
            expected: bundle.digest.as_str().to_string(),
            actual: recomputed_digest.as_str().to_string(),
        });
    }

    for artifact in bundle.artifacts.values() {
        let is_json = std::path::Path::new(&artifact.name)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if artifact.normative && is_json && !is_canonical(&artifact.content) {
            return Err(BundleVerifyError::ArtifactNotCanonical {
                artifact: artifact.name.clone(),
            });
        }
    }

    let Some(report) = bundle.artifacts.get(REPORT_ARTIFACT) else {
        return Ok(());
    };
    let snapshot = required(bundle, SNAPSHOT_ARTIFACT)?;
    let policy = required(bundle, POLICY_ARTIFACT)?;
    verify_report_bindings(&report.content, &snapshot.content, &policy.content)?;

    if profile == VerificationProfile::Replay {
        verify_replay(&report.content, &snapshot.content, &policy.content)?;
    }
    Ok(())
}

fn required<'a>(
    bundle: &'a ArtifactBundleV1,
    artifact: &'static str,
) -> Result<&'a BundleArtifact, BundleVerifyError> {
    bundle
        .artifacts
        .get(artifact)
        .ok_or(BundleVerifyError::InputArtifactMissing { artifact })
}

/// The report's declared input digests must match the bundled inputs.
fn verify_report_bindings(
    report: &[u8],
    snapshot: &[u8],
    policy: &[u8],
) -> Result<(), BundleVerifyError> {
    let report: serde_json::Value =
        serde_json::from_slice(report).map_err(|e| BundleVerifyError::ArtifactParseError {
            artifact: REPORT_ARTIFACT,
            detail: e.to_string(),
        })?;
    let metadata = &report["metadata"];

    let declared_snapshot = metadata["snapshot_digest"]
        .as_str()
        .ok_or(BundleVerifyError::ReportFieldMissing {
            field: "metadata.snapshot_digest",
        })?;
    let recomputed_snapshot = canonical_hash(HashDomain::CellSnapshot, snapshot);
    if declared_snapshot != recomputed_snapshot.as_str() {
        return Err(BundleVerifyError::SnapshotDigestMismatch {
            declared: declared_snapshot.to_string(),
            recomputed: recomputed_snapshot.as_str().to_string(),
        });
    }

    let declared_policy = metadata["policy_digest"]
        .as_str()
        .ok_or(BundleVerifyError::ReportFieldMissing {
            field: "metadata.policy_digest",
        })?;
    let recomputed_policy = canonical_hash(DOMAIN_POLICY_SNAPSHOT, policy);
    if declared_policy != recomputed_policy.as_str() {
        return Err(BundleVerifyError::PolicyDigestMismatch {
            declared: declared_policy.to_string(),
            recomputed: recomputed_policy.as_str().to_string(),
        });
    }
    Ok(())
}

/// Re-run the analysis from the bundled inputs and compare reports.
fn verify_replay(report: &[u8], snapshot: &[u8], policy: &[u8]) -> Result<(), BundleVerifyError> {
    let snapshot = CellSnapshotV1::from_json_bytes(snapshot).map_err(|e| {
        BundleVerifyError::ArtifactParseError {
            artifact: SNAPSHOT_ARTIFACT,
            detail: e.to_string(),
        }
    })?;
    let policy =
        PolicySnapshotV1::from_bytes(policy).map_err(|e| BundleVerifyError::ArtifactParseError {
            artifact: POLICY_ARTIFACT,
            detail: e.to_string(),
        })?;

    let replayed = compute_report(&snapshot, &policy, &mut NullSink)
        .map_err(|e| BundleVerifyError::ReplayFailed {
            detail: e.to_string(),
        })?
        .to_canonical_json_bytes()
        .map_err(|e| BundleVerifyError::CanonError {
            detail: format!("{e:?}"),
        })?;
    if replayed != report {
        return Err(BundleVerifyError::ReplayDivergence);
    }
    Ok(())
}

fn manifest_bytes(artifacts: &BTreeMap<String, BundleArtifact>) -> Result<Vec<u8>, String> {
    let entries: Vec<serde_json::Value> = artifacts
        .values()
        .map(|a| {
            serde_json::json!({
                "content_hash": a.content_hash.as_str(),
                "name": a.name,
                "normative": a.normative,
            })
        })
        .collect();
    canonical_json_bytes(&serde_json::json!({
        "artifacts": entries,
        "schema_version": "bundle.v1",
    }))
    .map_err(|e| format!("{e:?}"))
}

fn digest_basis_bytes(artifacts: &BTreeMap<String, BundleArtifact>) -> Result<Vec<u8>, String> {
    let entries: Vec<serde_json::Value> = artifacts
        .values()
        .filter(|a| a.normative)
        .map(|a| {
            serde_json::json!({
                "content_hash": a.content_hash.as_str(),
                "name": a.name,
            })
        })
        .collect();
    canonical_json_bytes(&serde_json::json!({
        "artifacts": entries,
        "schema_version": "bundle_digest_basis.v1",
    }))
    .map_err(|e| format!("{e:?}"))
}
