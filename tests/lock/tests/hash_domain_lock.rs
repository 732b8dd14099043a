//! Hash domain governance lock tests.
//!
//! Proves:
//! 1. The domain set has the expected size (catches silent additions)
//! 2. Domain bytes are unique, null-terminated and `HANDOFF::*::V1\0`
//! 3. Digests are pinned: changing a prefix breaks stored bundles
//! 4. No raw `HANDOFF::` literals in production source outside `hash_domain.rs`

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use handoff_kernel::proof::hash::canonical_hash;
use handoff_kernel::proof::hash_domain::HashDomain;

#[test]
fn hash_domain_canonical_set_count() {
    assert_eq!(
        HashDomain::ALL.len(),
        6,
        "expected 6 domain variants; if you added a new domain, update this count"
    );
}

#[test]
fn hash_domain_bytes_are_well_formed() {
    let mut seen = BTreeSet::new();
    for domain in HashDomain::ALL {
        let bytes = domain.as_bytes();
        assert!(seen.insert(bytes), "duplicate domain bytes: {domain}");
        assert!(bytes.starts_with(b"HANDOFF::"), "{domain} prefix");
        assert!(bytes.ends_with(b"::V1\0"), "{domain} suffix");
        assert_eq!(
            bytes.iter().filter(|&&b| b == 0).count(),
            1,
            "{domain} has an interior null"
        );
    }
}

#[test]
fn pinned_digests() {
    assert_eq!(
        canonical_hash(HashDomain::LoopReport, b"{}").as_str(),
        "sha256:4789880176df47b2fcd2b24d4e5f05026f35fbffeeff823fed0a14d432568dfc"
    );
    assert_eq!(
        canonical_hash(HashDomain::BundleDigest, b"{}").as_str(),
        "sha256:848d84407f15c398e249a3ada507cb687af2980b2c7ba3c179dcfcbe7fc9e18b"
    );
}

#[test]
fn no_raw_domain_literals_outside_authority() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../..");
    let mut violations = Vec::new();
    for crate_dir in ["kernel/src", "search/src", "harness/src"] {
        for path in rust_files(&root.join(crate_dir)) {
            if path.file_name().and_then(|n| n.to_str()) == Some("hash_domain.rs") {
                continue;
            }
            let Ok(content) = std::fs::read_to_string(&path) else {
                continue;
            };
            for (i, line) in content.lines().enumerate() {
                let trimmed = line.trim();
                if !trimmed.starts_with("//") && trimmed.contains("b\"HANDOFF::") {
                    violations.push(format!("  {}:{}: {trimmed}", path.display(), i + 1));
                }
            }
        }
    }
    assert!(
        violations.is_empty(),
        "raw HANDOFF:: domain literals found outside hash_domain.rs:\n{}",
        violations.join("\n")
    );
}

fn rust_files(dir: &Path) -> Vec<PathBuf> {
    let mut results = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                results.extend(rust_files(&path));
            } else if path.extension().is_some_and(|e| e == "rs") {
                results.push(path);
            }
        }
    }
    results
}
