//! CLI command handlers.
//!
//! This module contains the implementation for each CLI subcommand,
//! delegating to the risk engine and report writers.

mod analyze;
mod validate;

pub use analyze::run_analyze;
pub use validate::run_validate_config;
