//! Shared vocabulary for the record-array reducer: configuration, budgets,
//! field tags, per-array plans and the metadata every reduction reports.

pub mod config;
pub mod error;
pub mod skip;
pub mod types;

pub use config::ReducerConfig;
pub use error::{ReducerError, Result};
pub use skip::SkipRules;
pub use types::*;
