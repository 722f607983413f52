//! CSV Price Source
//!
//! Reads `<dir>/<ASSET>.csv` (falling back to the lowercase file name) with
//! `date` (YYYY-MM-DD) and `close` columns. Rows with a missing close are
//! dropped; rows are sorted by date before validation.

use super::{PriceSource, ProviderError};
use crate::types::{PriceHistory, PricePoint};
use async_trait::async_trait;
use chrono::NaiveDate;
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const DATE_COLUMN: &str = "date";
const CLOSE_COLUMN: &str = "close";

pub struct CsvPriceSource {
    dir: PathBuf,
}

impl CsvPriceSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn candidate_paths(&self, asset: &str) -> [PathBuf; 2] {
        [
            self.dir.join(format!("{}.csv", asset)),
            self.dir.join(format!("{}.csv", asset.to_lowercase())),
        ]
    }

    /// Blocking read; `fetch_history` runs it on the blocking pool.
    pub fn load(&self, asset: &str) -> Result<PriceHistory, ProviderError> {
        let path = self
            .candidate_paths(asset)
            .into_iter()
            .find(|p| p.exists())
            .ok_or_else(|| ProviderError::NoData {
                asset: asset.to_string(),
            })?;

        info!(asset = %asset, path = %path.display(), "Loading CSV data");
        let points = read_points(asset, &path)?;

        if points.is_empty() {
            return Err(ProviderError::NoData {
                asset: asset.to_string(),
            });
        }
        debug!(asset = %asset, rows = points.len(), "CSV rows parsed");

        PriceHistory::new(asset, points).map_err(|e| ProviderError::Malformed {
            asset: asset.to_string(),
            reason: e.to_string(),
        })
    }
}

fn read_points(asset: &str, path: &Path) -> Result<Vec<PricePoint>, ProviderError> {
    let fetch_err = |reason: String| ProviderError::Fetch {
        asset: asset.to_string(),
        reason,
    };
    let malformed = |reason: String| ProviderError::Malformed {
        asset: asset.to_string(),
        reason,
    };

    let file = File::open(path).map_err(|e| fetch_err(e.to_string()))?;
    let df = CsvReader::new(file)
        .finish()
        .map_err(|e| malformed(e.to_string()))?;

    let dates = df
        .column(DATE_COLUMN)
        .and_then(|s| s.cast(&DataType::String))
        .map_err(|e| malformed(e.to_string()))?;
    let closes = df
        .column(CLOSE_COLUMN)
        .and_then(|s| s.cast(&DataType::Float64))
        .map_err(|e| malformed(e.to_string()))?;

    let dates = dates.str().map_err(|e| malformed(e.to_string()))?;
    let closes = closes.f64().map_err(|e| malformed(e.to_string()))?;

    let mut points = Vec::with_capacity(df.height());
    for (date, close) in dates.into_iter().zip(closes.into_iter()) {
        let (Some(date), Some(close)) = (date, close) else {
            continue;
        };
        let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
            .map_err(|e| malformed(format!("bad date '{}': {}", date, e)))?;
        points.push(PricePoint::new(date, close));
    }

    points.sort_by_key(|p| p.date);
    Ok(points)
}

#[async_trait]
impl PriceSource for CsvPriceSource {
    async fn fetch_history(&self, asset: &str) -> Result<PriceHistory, ProviderError> {
        let source = CsvPriceSource::new(self.dir.clone());
        let owned_asset = asset.to_string();

        tokio::task::spawn_blocking(move || source.load(&owned_asset))
            .await
            .map_err(|e| ProviderError::Fetch {
                asset: asset.to_string(),
                reason: e.to_string(),
            })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_csv(dir: &Path, name: &str, body: &str) {
        let mut file = File::create(dir.join(name)).unwrap();
        file.write_all(body.as_bytes()).unwrap();
    }

    #[test]
    fn test_load_sorts_and_skips_missing_close() {
        let dir = tempdir().unwrap();
        write_csv(
            dir.path(),
            "SPY.csv",
            "date,close\n2024-01-03,102.5\n2024-01-01,100\n2024-01-02,\n",
        );

        let history = CsvPriceSource::new(dir.path()).load("SPY").unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history.points()[0].close, 100.0);
        assert_eq!(history.latest().close, 102.5);
    }

    #[test]
    fn test_lowercase_fallback() {
        let dir = tempdir().unwrap();
        write_csv(dir.path(), "btc-usd.csv", "date,close\n2024-01-01,42000.0\n");

        let history = CsvPriceSource::new(dir.path()).load("BTC-USD").unwrap();
        assert_eq!(history.asset(), "BTC-USD");
    }

    #[test]
    fn test_missing_file_is_no_data() {
        let dir = tempdir().unwrap();
        let err = CsvPriceSource::new(dir.path()).load("NOPE").unwrap_err();
        assert_eq!(
            err,
            ProviderError::NoData {
                asset: "NOPE".to_string()
            }
        );
    }

    #[test]
    fn test_duplicate_dates_are_malformed() {
        let dir = tempdir().unwrap();
        write_csv(
            dir.path(),
            "X.csv",
            "date,close\n2024-01-01,1.0\n2024-01-01,2.0\n",
        );
        let err = CsvPriceSource::new(dir.path()).load("X").unwrap_err();
        assert!(matches!(err, ProviderError::Malformed { .. }));
    }

    #[tokio::test]
    async fn test_fetch_history_async() {
        let dir = tempdir().unwrap();
        write_csv(dir.path(), "QQQ.csv", "date,close\n2024-01-01,400\n2024-01-02,401\n");

        let source = CsvPriceSource::new(dir.path());
        let history = source.fetch_history("QQQ").await.unwrap();
        assert_eq!(history.len(), 2);
    }
}
