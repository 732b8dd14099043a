//! Handoff Harness: runs the loop analysis and packages its evidence.
//!
//! The harness resolves policy, runs a scenario's cell snapshot through
//! `handoff_search::analyze` and packages inputs and report as a
//! self-contained artifact bundle that can be re-verified by replay.
//!
//! The harness does NOT implement detection logic; it delegates to the
//! search crate. Scenarios provide cell data only.

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod analyzer;
pub mod bundle;
pub mod bundle_dir;
pub mod contract;
pub mod policy;
pub mod runner;
pub mod scenarios;
