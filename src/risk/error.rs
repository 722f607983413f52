//! Error types for the risk engine

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while analyzing a single asset or validating settings.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RiskError {
    /// Not enough usable history (also covers provider failures)
    #[error("Insufficient data for {asset}: {reason}")]
    DataInsufficient { asset: String, reason: String },

    /// A multiplier, percentile or window outside its valid domain
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    /// Effective volatility is zero, negative or non-finite
    #[error("Invalid volatility for {asset}: {value} ({context})")]
    InvalidVolatility {
        asset: String,
        value: f64,
        context: String,
    },
}

impl RiskError {
    pub fn data_insufficient(asset: &str, reason: impl Into<String>) -> Self {
        Self::DataInsufficient {
            asset: asset.to_string(),
            reason: reason.into(),
        }
    }

    pub fn invalid_volatility(asset: &str, value: f64, context: impl Into<String>) -> Self {
        Self::InvalidVolatility {
            asset: asset.to_string(),
            value,
            context: context.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DataInsufficient { .. } => ErrorKind::DataInsufficient,
            Self::ConfigInvalid(_) => ErrorKind::ConfigInvalid,
            Self::InvalidVolatility { .. } => ErrorKind::InvalidVolatility,
        }
    }
}

/// Tag attached to error placeholders in the report tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    DataInsufficient,
    ConfigInvalid,
    InvalidVolatility,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DataInsufficient => write!(f, "DataInsufficient"),
            Self::ConfigInvalid => write!(f, "ConfigInvalid"),
            Self::InvalidVolatility => write!(f, "InvalidVolatility"),
        }
    }
}
