//! Risk Engine Module
//!
//! Volatility-conditioned leverage safety:
//! - `VolatilityProfile` - rolling realized volatility and its lookback distribution
//! - `DynamicFloor` - percentile floor that suppresses false-calm readings
//! - `CurrentRiskAnalyzer` - safe entry leverage for a position opened today
//! - `DriftAnalyzer` - whether a cycle-high position has drifted unsafe
//! - `RiskReport` - the two output tables

pub mod current;
pub mod drift;
pub mod error;
pub mod floor;
pub mod report;
pub mod volatility;

pub use current::{
    CurrentRisk, CurrentRiskAnalyzer, CurrentRiskRow, CycleHighContext, LeverageClamp, TierPrice,
};
pub use drift::{DriftAnalyzer, DriftRisk, DriftStatus};
pub use error::{ErrorKind, RiskError};
pub use floor::DynamicFloor;
pub use report::{AssetFailure, ReportRow, RiskReport, RowOutcome};
pub use volatility::{VolatilityParams, VolatilityProfile, VolatilitySample};
