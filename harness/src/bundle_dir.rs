//! Bundle directory persistence: write, read and verify an
//! [`ArtifactBundleV1`] on disk.
//!
//! # Directory layout
//!
//! ```text
//! <dir>/
//!   bundle_manifest.json       canonical JSON, full artifact listing
//!   bundle_digest_basis.json   canonical JSON, normative projection only
//!   bundle_digest.txt          ASCII digest string ("sha256:...")
//!   cell_snapshot.json         normative
//!   policy_snapshot.json       normative
//!   loop_report.json           normative
//!   loop_report.txt            observational
//! ```
//!
//! The directory path is never part of any hash surface. The manifest's
//! declared list is the source of truth: missing declared files and extra
//! undeclared files are both errors.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use handoff_kernel::proof::hash::{canonical_hash, ContentHash};

use crate::bundle::{
    verify_bundle, ArtifactBundleV1, BundleArtifact, BundleVerifyError, DOMAIN_BUNDLE_DIGEST,
};

const MANIFEST_FILENAME: &str = "bundle_manifest.json";
const DIGEST_BASIS_FILENAME: &str = "bundle_digest_basis.json";
const DIGEST_FILENAME: &str = "bundle_digest.txt";
const METADATA_FILENAMES: [&str; 3] = [MANIFEST_FILENAME, DIGEST_BASIS_FILENAME, DIGEST_FILENAME];
const TEMP_PREFIX: &str = ".tmp_";

/// Error writing a bundle directory.
#[derive(Debug)]
pub enum BundleDirWriteError {
    Io { detail: String },
}

impl std::fmt::Display for BundleDirWriteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { detail } => write!(f, "I/O error: {detail}"),
        }
    }
}

impl std::error::Error for BundleDirWriteError {}

/// Error reading a bundle directory.
#[derive(Debug)]
pub enum BundleDirReadError {
    Io { detail: String },
    /// A required metadata file is missing.
    MissingMetadata { filename: String },
    /// A declared artifact file is missing from the directory.
    MissingArtifact { name: String },
    /// An undeclared file exists in the directory.
    ExtraFile { name: String },
    /// `bundle_manifest.json` is not the expected JSON shape.
    ManifestParseError { detail: String },
    /// Manifest `schema_version` is not `bundle.v1`.
    ManifestVersionMismatch { found: String },
    /// `bundle_digest.txt` doesn't match the digest of the stored basis.
    DigestMismatch { stored: String, recomputed: String },
}

impl std::fmt::Display for BundleDirReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { detail } => write!(f, "I/O error: {detail}"),
            Self::MissingMetadata { filename } => write!(f, "missing metadata file: {filename}"),
            Self::MissingArtifact { name } => write!(f, "missing artifact: {name}"),
            Self::ExtraFile { name } => write!(f, "undeclared extra file: {name}"),
            Self::ManifestParseError { detail } => write!(f, "manifest parse error: {detail}"),
            Self::ManifestVersionMismatch { found } => {
                write!(f, "manifest version mismatch: {found}")
            }
            Self::DigestMismatch { stored, recomputed } => {
                write!(f, "digest mismatch: stored={stored}, recomputed={recomputed}")
            }
        }
    }
}

impl std::error::Error for BundleDirReadError {}

/// Error verifying a bundle directory.
#[derive(Debug)]
pub enum BundleDirVerifyError {
    ReadError(BundleDirReadError),
    VerifyError(BundleVerifyError),
}

impl std::fmt::Display for BundleDirVerifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReadError(e) => write!(f, "read error: {e}"),
            Self::VerifyError(e) => write!(f, "verify error: {e}"),
        }
    }
}

impl std::error::Error for BundleDirVerifyError {}

/// Write `bundle` into `dir`, creating it if needed.
///
/// # Errors
///
/// Returns [`BundleDirWriteError`] on I/O failure.
pub fn write_bundle_dir(bundle: &ArtifactBundleV1, dir: &Path) -> Result<(), BundleDirWriteError> {
    std::fs::create_dir_all(dir).map_err(|e| BundleDirWriteError::Io {
        detail: format!("create {}: {e}", dir.display()),
    })?;
    for artifact in bundle.artifacts.values() {
        write_atomic(dir, &artifact.name, &artifact.content)?;
    }
    write_atomic(dir, MANIFEST_FILENAME, &bundle.manifest)?;
    write_atomic(dir, DIGEST_BASIS_FILENAME, &bundle.digest_basis)?;
    write_atomic(dir, DIGEST_FILENAME, bundle.digest.as_str().as_bytes())
}

/// Read a bundle directory back into memory.
///
/// Only structure is checked here (declared files present, no extras,
/// stored digest consistent with the stored basis). Use
/// [`verify_bundle_dir`] for full verification.
///
/// # Errors
///
/// Returns [`BundleDirReadError`] on any structural failure.
pub fn read_bundle_dir(dir: &Path) -> Result<ArtifactBundleV1, BundleDirReadError> {
    let manifest = read_required(dir, MANIFEST_FILENAME)?;
    let digest_basis = read_required(dir, DIGEST_BASIS_FILENAME)?;
    let stored_digest = read_required(dir, DIGEST_FILENAME)?;

    let mut artifacts = BTreeMap::new();
    for entry in parse_manifest(&manifest)? {
        let content = std::fs::read(dir.join(&entry.name)).map_err(|_| {
            BundleDirReadError::MissingArtifact {
                name: entry.name.clone(),
            }
        })?;
        artifacts.insert(
            entry.name.clone(),
            BundleArtifact {
                name: entry.name,
                content,
                content_hash: entry.content_hash,
                normative: entry.normative,
            },
        );
    }

    if let Some(extra) = list_files(dir)?
        .into_iter()
        .find(|f| !artifacts.contains_key(f) && !METADATA_FILENAMES.contains(&f.as_str()))
    {
        return Err(BundleDirReadError::ExtraFile { name: extra });
    }

    let digest = canonical_hash(DOMAIN_BUNDLE_DIGEST, &digest_basis);
    let stored = String::from_utf8_lossy(&stored_digest).trim().to_string();
    if digest.as_str() != stored {
        return Err(BundleDirReadError::DigestMismatch {
            stored,
            recomputed: digest.as_str().to_string(),
        });
    }

    Ok(ArtifactBundleV1 {
        artifacts,
        manifest,
        digest_basis,
        digest,
    })
}

/// Read `dir`, then run [`verify_bundle`] (including replay).
///
/// # Errors
///
/// Returns [`BundleDirVerifyError`] on read failure or verification failure.
pub fn verify_bundle_dir(dir: &Path) -> Result<(), BundleDirVerifyError> {
    let bundle = read_bundle_dir(dir).map_err(BundleDirVerifyError::ReadError)?;
    verify_bundle(&bundle).map_err(BundleDirVerifyError::VerifyError)
}

struct ManifestEntry {
    name: String,
    content_hash: ContentHash,
    normative: bool,
}

fn parse_manifest(bytes: &[u8]) -> Result<Vec<ManifestEntry>, BundleDirReadError> {
    let bad = |detail: String| BundleDirReadError::ManifestParseError { detail };
    let value: serde_json::Value =
        serde_json::from_slice(bytes).map_err(|e| bad(e.to_string()))?;

    let version = value["schema_version"].as_str().unwrap_or("");
    if version != "bundle.v1" {
        return Err(BundleDirReadError::ManifestVersionMismatch {
            found: version.to_string(),
        });
    }

    let entries = value["artifacts"]
        .as_array()
        .ok_or_else(|| bad("\"artifacts\" is not an array".into()))?;
    entries
        .iter()
        .map(|entry| {
            let name = entry["name"]
                .as_str()
                .ok_or_else(|| bad("entry without \"name\"".into()))?;
            // Names are plain filenames; anything else could escape the directory.
            if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
                return Err(bad(format!("invalid artifact name {name:?}")));
            }
            let content_hash = entry["content_hash"]
                .as_str()
                .and_then(ContentHash::parse)
                .ok_or_else(|| bad(format!("invalid \"content_hash\" for {name}")))?;
            let normative = entry["normative"]
                .as_bool()
                .ok_or_else(|| bad(format!("missing \"normative\" for {name}")))?;
            Ok(ManifestEntry {
                name: name.to_string(),
                content_hash,
                normative,
            })
        })
        .collect()
}

/// Write via a temp file in the same directory, then rename.
fn write_atomic(dir: &Path, filename: &str, content: &[u8]) -> Result<(), BundleDirWriteError> {
    let path = dir.join(filename);
    let temp = dir.join(format!("{TEMP_PREFIX}{filename}"));
    std::fs::write(&temp, content).map_err(|e| BundleDirWriteError::Io {
        detail: format!("write {}: {e}", temp.display()),
    })?;
    std::fs::rename(&temp, &path).map_err(|e| BundleDirWriteError::Io {
        detail: format!("rename {} to {}: {e}", temp.display(), path.display()),
    })
}

fn read_required(dir: &Path, filename: &str) -> Result<Vec<u8>, BundleDirReadError> {
    std::fs::read(dir.join(filename)).map_err(|_| BundleDirReadError::MissingMetadata {
        filename: filename.to_string(),
    })
}

/// Regular files in `dir`, leftover temp files excluded.
fn list_files(dir: &Path) -> Result<BTreeSet<String>, BundleDirReadError> {
    let io = |e: std::io::Error| BundleDirReadError::Io {
        detail: format!("list {}: {e}", dir.display()),
    };
    let mut files = BTreeSet::new();
    for entry in std::fs::read_dir(dir).map_err(io)? {
        let entry = entry.map_err(io)?;
        if !entry.file_type().map_err(io)?.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if !name.starts_with(TEMP_PREFIX) {
                files.insert(name.to_string());
            }
        }
    }
    Ok(files)
}
