//! Handoff Kernel: the read-only data model for handoff loop analysis.
//!
//! # API Surface
//!
//! - [`cell`] -- cell identifiers, status descriptors, optional priorities,
//!   handoff configurations and the [`cell::CellSnapshotV1`] document
//! - [`proof`] -- canonical JSON bytes and domain-separated content hashing
//!
//! # Module Dependency Direction
//!
//! `cell` ← `proof`
//!
//! One-way only. `cell` uses `proof` to serialize snapshots; `proof` knows
//! nothing about cells.

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod cell;
pub mod proof;
