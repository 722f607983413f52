//! Configuration check command handler.

use crate::config::RiskConfig;
use tracing::info;

/// Load the configuration and report how each asset resolves.
///
/// # Errors
/// Returns error if the document cannot be read, parsed or validated.
pub fn run_validate_config(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = RiskConfig::load(path)?;
    info!(path, assets = config.assets.len(), "Configuration is valid");

    println!(
        "\n{:<10} | {:>6} | {:>6} | {:>6} | {:>5} | {:>7} | {}",
        "Asset", "Days", "Death", "Margin", "Pct", "Horizon", "Notes"
    );
    println!("{}", "-".repeat(70));
    for asset in &config.assets {
        let resolved = config.resolve(asset);
        let c = &resolved.config;
        println!(
            "{:<10} | {:>6} | {:>6.2} | {:>6.2} | {:>5.1} | {:>7} | {}",
            asset,
            c.trading_days_per_year,
            c.death_floor_multiplier,
            c.safety_margin_multiplier,
            c.floor_percentile,
            c.horizon_days
                .map(|h| format!("{}d", h))
                .unwrap_or_else(|| "1y".to_string()),
            resolved.warning.as_deref().unwrap_or("")
        );
    }

    println!("\n✓ {} is valid", path);
    Ok(())
}
