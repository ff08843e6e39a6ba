//! Transformation module.
//!
//! - Cleaner: the fixed column extraction / rename / reorder rules
//! - Pipeline: read → clean → export for one upload

pub mod cleaner;
pub mod pipeline;

pub use cleaner::{clean_table, extract_domain, CleanOutcome};
pub use pipeline::*;
