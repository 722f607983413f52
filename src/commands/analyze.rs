//! Risk analysis command handler.
//!
//! Implements the `analyze` subcommand: load the configuration, pick a price
//! source, run the engine and write the report.

use crate::cli::{AnalyzeCliConfig, DataSourceKind};
use crate::config::RiskConfig;
use crate::data::{CsvPriceSource, PriceSource, SyntheticPriceSource};
use crate::engine::RiskEngine;
use crate::output::{print_summary, ReportWriter};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Run a full risk analysis.
///
/// Per-asset failures are reported in the output and do not fail the
/// command; an invalid configuration or an unwritable output directory does.
///
/// # Errors
/// Returns error if the configuration cannot be loaded or validated, or the
/// report cannot be written.
pub async fn run_analyze(config: AnalyzeCliConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!("--- Risk Suite: Leverage Safety Analysis ---");

    let risk_config = match RiskConfig::load(&config.config_path) {
        Ok(c) => c,
        Err(e) => {
            error!(path = %config.config_path.display(), error = %e, "Configuration rejected");
            return Err(e.into());
        }
    };

    info!(
        assets = risk_config.assets.len(),
        overrides = risk_config.overrides.len(),
        tiers = risk_config.risk_tiers.len(),
        parallel = config.parallel,
        "Configuration loaded"
    );

    let tier_names: Vec<String> = risk_config.risk_tiers.iter().map(|t| t.name.clone()).collect();
    let engine = RiskEngine::new(risk_config)?;

    let source: Arc<dyn PriceSource> = match &config.source {
        DataSourceKind::Csv(dir) => {
            info!(dir = %dir.display(), "Reading prices from CSV files");
            Arc::new(CsvPriceSource::new(dir))
        }
        DataSourceKind::Synthetic {
            years,
            seed,
            end_date,
        } => {
            info!(years, seed, end_date = %end_date, "Using synthetic prices");
            Arc::new(SyntheticPriceSource::new(*years, *end_date, *seed))
        }
    };

    let report = if config.parallel {
        engine.run_parallel(source).await
    } else {
        engine.run(source.as_ref()).await
    };

    if report.failure_count() > 0 {
        warn!(
            failed_rows = report.failure_count(),
            "Some assets could not be analyzed; see the error columns"
        );
    }

    print_summary(&report);

    let written = ReportWriter::new(&config.output_dir, tier_names).write(&report)?;
    println!("\n✓ Saved report to {}", written.json.display());
    println!("  Current risk: {}", written.current_csv.display());
    println!("  Leverage drift: {}", written.drift_csv.display());

    Ok(())
}
