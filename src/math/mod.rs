//! Mathematical utilities for risk analysis.
//!
//! This module provides the statistical primitives used by the volatility
//! and floor calculations: log returns, sample standard deviation and
//! linearly interpolated percentiles.

pub mod stats;

pub use stats::{annualization_factor, log_returns, percentile_linear, sample_std_dev};
