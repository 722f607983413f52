//! Market Data Sources
//!
//! Price-history acquisition sits behind the `PriceSource` trait so the risk
//! engine never sees how data was fetched:
//! - `CsvPriceSource` - daily closes from `<dir>/<ASSET>.csv`
//! - `SyntheticPriceSource` - deterministic generated series for offline runs
//!
//! A source must surface "no data" as an error rather than returning an
//! empty or partial series silently.

pub mod csv_source;
pub mod synthetic;

use crate::types::PriceHistory;
use async_trait::async_trait;
use thiserror::Error;

pub use csv_source::CsvPriceSource;
pub use synthetic::SyntheticPriceSource;

/// Errors raised by a data source.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Provider returned nothing for the asset
    #[error("No data for {asset}")]
    NoData { asset: String },

    /// Fetch or read failed
    #[error("Fetch failed for {asset}: {reason}")]
    Fetch { asset: String, reason: String },

    /// Data arrived but could not form a valid history
    #[error("Malformed data for {asset}: {reason}")]
    Malformed { asset: String, reason: String },
}

/// Source of daily close histories.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Fetch the full available history for `asset`.
    async fn fetch_history(&self, asset: &str) -> Result<PriceHistory, ProviderError>;
}
