//! Scenario implementations for the harness runner.

pub mod builder;
pub mod catalog;
pub mod generated;
