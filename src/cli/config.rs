//! CLI configuration structs bridging CLI arguments to domain types.
//!
//! Command handlers work with a validated `AnalyzeCliConfig` rather than raw
//! argument strings.

use chrono::{NaiveDate, Utc};
use std::path::PathBuf;
use thiserror::Error;

/// Where price histories come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSourceKind {
    /// `<dir>/<ASSET>.csv` files
    Csv(PathBuf),
    /// Deterministic generated series
    Synthetic {
        years: u32,
        seed: u64,
        end_date: NaiveDate,
    },
}

/// Validated arguments for the `analyze` command.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzeCliConfig {
    pub config_path: PathBuf,
    pub source: DataSourceKind,
    pub output_dir: PathBuf,
    pub parallel: bool,
}

/// Errors that can occur when interpreting `analyze` arguments.
#[derive(Debug, Error)]
pub enum AnalyzeConfigError {
    #[error("Either --data-dir or --synthetic is required")]
    MissingDataSource,

    #[error("Invalid end date '{0}'. Expected format: YYYY-MM-DD")]
    InvalidEndDate(String),

    #[error("--synthetic-years must be at least 1")]
    ZeroSyntheticYears,
}

impl AnalyzeCliConfig {
    #[allow(clippy::too_many_arguments)]
    pub fn from_args(
        config: &str,
        data_dir: Option<&str>,
        synthetic: bool,
        synthetic_years: u32,
        seed: u64,
        end_date: Option<&str>,
        output_dir: &str,
        parallel: bool,
    ) -> Result<Self, AnalyzeConfigError> {
        let source = if synthetic {
            if synthetic_years == 0 {
                return Err(AnalyzeConfigError::ZeroSyntheticYears);
            }
            let end_date = match end_date {
                Some(raw) => parse_date(raw)?,
                None => Utc::now().date_naive(),
            };
            DataSourceKind::Synthetic {
                years: synthetic_years,
                seed,
                end_date,
            }
        } else {
            match data_dir {
                Some(dir) => DataSourceKind::Csv(PathBuf::from(dir)),
                None => return Err(AnalyzeConfigError::MissingDataSource),
            }
        };

        Ok(Self {
            config_path: PathBuf::from(config),
            source,
            output_dir: PathBuf::from(output_dir),
            parallel,
        })
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, AnalyzeConfigError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AnalyzeConfigError::InvalidEndDate(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_args() {
        let config = AnalyzeCliConfig::from_args(
            "risk.json",
            None,
            true,
            7,
            42,
            Some("2024-06-28"),
            "out",
            true,
        )
        .unwrap();

        assert_eq!(
            config.source,
            DataSourceKind::Synthetic {
                years: 7,
                seed: 42,
                end_date: NaiveDate::from_ymd_opt(2024, 6, 28).unwrap(),
            }
        );
        assert!(config.parallel);
    }

    #[test]
    fn test_csv_args() {
        let config =
            AnalyzeCliConfig::from_args("risk.json", Some("data"), false, 7, 42, None, "out", false)
                .unwrap();
        assert_eq!(config.source, DataSourceKind::Csv(PathBuf::from("data")));
    }

    #[test]
    fn test_missing_source_and_bad_date() {
        assert!(matches!(
            AnalyzeCliConfig::from_args("risk.json", None, false, 7, 42, None, "out", false),
            Err(AnalyzeConfigError::MissingDataSource)
        ));
        assert!(matches!(
            AnalyzeCliConfig::from_args("risk.json", None, true, 7, 42, Some("28/06/2024"), "out", false),
            Err(AnalyzeConfigError::InvalidEndDate(_))
        ));
        assert!(matches!(
            AnalyzeCliConfig::from_args("risk.json", None, true, 0, 42, None, "out", false),
            Err(AnalyzeConfigError::ZeroSyntheticYears)
        ));
    }
}
