//! CLI argument parsing using clap.
//!
//! Defines the command-line interface for the risk suite: a full analysis
//! run and a configuration check.

mod config;

pub use config::{AnalyzeCliConfig, AnalyzeConfigError, DataSourceKind};

use clap::{Parser, Subcommand};

/// Risk Suite - volatility-conditioned leverage safety analysis
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Set the verbosity level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    pub verbose: String,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Analyze every configured asset and write the risk report
    Analyze {
        /// Path to the JSON configuration document
        #[arg(long)]
        config: String,
        /// Directory holding one `<ASSET>.csv` file per asset (date,close)
        #[arg(long, conflicts_with = "synthetic")]
        data_dir: Option<String>,
        /// Use generated price histories (no CSV files required)
        #[arg(long, default_value_t = false)]
        synthetic: bool,
        /// Years of synthetic history per asset
        #[arg(long, default_value_t = 7)]
        synthetic_years: u32,
        /// Seed for the synthetic generator
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Last synthetic trading date (YYYY-MM-DD); defaults to today
        #[arg(long)]
        end_date: Option<String>,
        /// Output directory for the report files
        #[arg(long, default_value = "risk_reports")]
        output_dir: String,
        /// Analyze assets concurrently
        #[arg(long, default_value_t = false)]
        parallel: bool,
    },

    /// Load and validate a configuration document without running
    ValidateConfig {
        /// Path to the JSON configuration document
        #[arg(long)]
        config: String,
    },
}
