//! Report Output
//!
//! Renders a `RiskReport` for people and downstream tools:
//! - `risk_report.json` - the full report, serialized with serde
//! - `current_risk.csv` / `leverage_drift.csv` - one table each
//! - a console summary of both tables
//!
//! Rendering never recomputes anything; it only formats report rows.

pub mod console;
pub mod csv;

pub use console::print_summary;

use crate::risk::RiskReport;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub const JSON_REPORT_FILE: &str = "risk_report.json";
pub const CURRENT_CSV_FILE: &str = "current_risk.csv";
pub const DRIFT_CSV_FILE: &str = "leverage_drift.csv";

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

/// Files written for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct WrittenReport {
    pub json: PathBuf,
    pub current_csv: PathBuf,
    pub drift_csv: PathBuf,
}

/// Writes report files into an output directory.
pub struct ReportWriter {
    dir: PathBuf,
    tier_names: Vec<String>,
}

impl ReportWriter {
    /// `tier_names` fixes the tier columns of the current-risk CSV.
    pub fn new(dir: impl Into<PathBuf>, tier_names: Vec<String>) -> Self {
        Self {
            dir: dir.into(),
            tier_names,
        }
    }

    /// Write the JSON report and both CSV tables, creating the directory if needed.
    pub fn write(&self, report: &RiskReport) -> Result<WrittenReport, OutputError> {
        fs::create_dir_all(&self.dir).map_err(|source| OutputError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let json_path = self.dir.join(JSON_REPORT_FILE);
        let json = serde_json::to_string_pretty(report)?;
        write_file(&json_path, json.as_bytes())?;

        let current_path = self.dir.join(CURRENT_CSV_FILE);
        let mut lines = vec![csv::current_csv_header(&self.tier_names)];
        lines.extend(
            report
                .current()
                .iter()
                .map(|row| csv::current_to_csv_line(row, self.tier_names.len())),
        );
        write_lines(&current_path, &lines)?;

        let drift_path = self.dir.join(DRIFT_CSV_FILE);
        let mut lines = vec![csv::drift_csv_header(&self.tier_names)];
        lines.extend(
            report
                .drift()
                .iter()
                .map(|row| csv::drift_to_csv_line(row, self.tier_names.len())),
        );
        write_lines(&drift_path, &lines)?;

        info!(
            dir = %self.dir.display(),
            rows = report.current().len(),
            "Report written"
        );

        Ok(WrittenReport {
            json: json_path,
            current_csv: current_path,
            drift_csv: drift_path,
        })
    }
}

fn write_lines(path: &Path, lines: &[String]) -> Result<(), OutputError> {
    let body = lines.join("\n") + "\n";
    write_file(path, body.as_bytes())
}

fn write_file(path: &Path, contents: &[u8]) -> Result<(), OutputError> {
    fs::write(path, contents).map_err(|source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    })
}
