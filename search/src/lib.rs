//! Handoff Search: depth-first detection of persistent handoff loops.
//!
//! This crate holds the analysis core. It depends only on `handoff_kernel`
//! and does NOT depend on `handoff_harness`.
//!
//! # Crate dependency graph
//!
//! ```text
//! handoff_kernel  ←  handoff_search  ←  handoff_harness
//! (cells, canon)     (DFS, evaluator)   (policy, bundles, CLI)
//! ```
//!
//! # Key types
//!
//! - [`CellRepositoryV1`]: read-only source of cell configuration
//! - [`HandoffEvaluator`]: per-edge handoff decision rules
//! - [`SearchFrame`]: one node on the live DFS path
//! - [`AnalysisPolicyV1`]: root-closure handling and frame budget
//! - [`AnalysisReportV1`]: loops plus per-round counters (normative artifact)
//! - [`analyze`]: one full pass, one round per cell

#![forbid(unsafe_code)]

pub mod contract;
pub mod error;
pub mod evaluator;
pub mod explorer;
pub mod frame;
pub mod policy;
pub mod report;
pub mod validator;
pub mod visitation;

pub use contract::{CellRepositoryV1, LoopReportSink, NullSink, TracingSink};
pub use error::AnalysisError;
pub use evaluator::{HandoffDecision, HandoffEvaluator, ProtocolRuleEvaluator};
pub use explorer::analyze;
pub use frame::SearchFrame;
pub use policy::{AnalysisPolicyV1, RootClosurePolicyV1};
pub use report::{AnalysisReportV1, LoopReportV1, MetadataBindings};
