//! Proof module: canonical JSON and content hashing.
//!
//! Every artifact the analysis persists goes through these two modules, so
//! identical inputs always produce identical bytes and digests.

pub mod canon;
pub mod hash;
pub mod hash_domain;
