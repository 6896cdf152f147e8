//! wordcat-core: adaptive vocabulary checklist engine.
//!
//! This crate defines the item bank, the 4PL IRT math, item selection,
//! ability estimation, the adaptive session state machine, and the
//! norm-table vocabulary-size estimator that the `wordcat` CLI builds on.

pub mod bank;
pub mod config;
pub mod error;
pub mod estimation;
pub mod irt;
pub mod norms;
pub mod report;
pub mod scoring;
pub mod selection;
pub mod session;
pub mod traits;
