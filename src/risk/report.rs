//! Report aggregation.
//!
//! Collects per-asset outcomes into the two output tables. Rows keep the
//! asset input order; nothing is recomputed, sorted or filtered here.

use super::current::CurrentRiskRow;
use super::drift::DriftRisk;
use super::error::{ErrorKind, RiskError};
use serde::{Deserialize, Serialize};

/// Why a row could not be computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetFailure {
    pub kind: ErrorKind,
    pub reason: String,
}

impl From<&RiskError> for AssetFailure {
    fn from(err: &RiskError) -> Self {
        Self {
            kind: err.kind(),
            reason: err.to_string(),
        }
    }
}

impl From<RiskError> for AssetFailure {
    fn from(err: RiskError) -> Self {
        Self::from(&err)
    }
}

/// Either computed numbers or an error placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum RowOutcome<T> {
    Computed(T),
    Failed(AssetFailure),
}

impl<T> RowOutcome<T> {
    pub fn is_computed(&self) -> bool {
        matches!(self, Self::Computed(_))
    }

    pub fn computed(&self) -> Option<&T> {
        match self {
            Self::Computed(value) => Some(value),
            Self::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&AssetFailure> {
        match self {
            Self::Computed(_) => None,
            Self::Failed(failure) => Some(failure),
        }
    }
}

impl<T> From<Result<T, RiskError>> for RowOutcome<T> {
    fn from(result: Result<T, RiskError>) -> Self {
        match result {
            Ok(value) => Self::Computed(value),
            Err(err) => Self::Failed(AssetFailure::from(&err)),
        }
    }
}

/// One table row keyed by asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow<T> {
    pub asset: String,
    pub outcome: RowOutcome<T>,
}

impl<T> ReportRow<T> {
    pub fn new(asset: impl Into<String>, outcome: RowOutcome<T>) -> Self {
        Self {
            asset: asset.into(),
            outcome,
        }
    }
}

/// The two output tables plus run-level warnings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    current: Vec<ReportRow<CurrentRiskRow>>,
    drift: Vec<ReportRow<DriftRisk>>,
    warnings: Vec<String>,
}

impl RiskReport {
    /// Pure aggregation in input order.
    pub fn aggregate(
        current: Vec<ReportRow<CurrentRiskRow>>,
        drift: Vec<ReportRow<DriftRisk>>,
    ) -> Self {
        Self {
            current,
            drift,
            warnings: Vec::new(),
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn current(&self) -> &[ReportRow<CurrentRiskRow>] {
        &self.current
    }

    pub fn drift(&self) -> &[ReportRow<DriftRisk>] {
        &self.drift
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Rows (across both tables) that carry an error placeholder.
    pub fn failure_count(&self) -> usize {
        self.current.iter().filter(|r| !r.outcome.is_computed()).count()
            + self.drift.iter().filter(|r| !r.outcome.is_computed()).count()
    }
}
