//! Console summary tables.

use crate::risk::{RiskReport, RowOutcome};

/// Print both tables and any warnings to stdout.
pub fn print_summary(report: &RiskReport) {
    println!("\n=== CURRENT RISK ===");
    println!(
        "{:<10} | {:>12} | {:>8} | {:>8} | {:>5} | {:>12} | {:>8} | {:>8}",
        "Asset", "Price", "Vol", "Eff Vol", "Floor", "Death Floor", "Max Lev", "Drawdown"
    );
    println!("{}", "-".repeat(92));
    for row in report.current() {
        match &row.outcome {
            RowOutcome::Computed(r) => println!(
                "{:<10} | {:>12.2} | {:>7.1}% | {:>7.1}% | {:>5} | {:>12.2} | {:>7.2}x | {:>7.1}%",
                row.asset,
                r.risk.current_price,
                r.risk.raw_volatility * 100.0,
                r.risk.effective_volatility * 100.0,
                if r.risk.floor_active { "yes" } else { "no" },
                r.risk.death_floor_price,
                r.risk.max_safe_leverage,
                r.cycle.drawdown * 100.0
            ),
            RowOutcome::Failed(f) => println!("{:<10} | ERROR {}: {}", row.asset, f.kind, f.reason),
        }
    }

    println!("\n=== LEVERAGE DRIFT ===");
    println!(
        "{:<10} | {:>10} | {:>12} | {:>8} | {:>12} | {:>8} | {:>8} | {:>10}",
        "Asset", "High Date", "Cycle High", "Hist Lev", "Liq Price", "Dist", "Req", "Status"
    );
    println!("{}", "-".repeat(98));
    for row in report.drift() {
        match &row.outcome {
            RowOutcome::Computed(d) => println!(
                "{:<10} | {:>10} | {:>12.2} | {:>7.2}x | {:>12.2} | {:>7.1}% | {:>7.1}% | {:>10}",
                row.asset,
                d.cycle_high_date.to_string(),
                d.cycle_high_price,
                d.historical_leverage,
                d.liquidation_price,
                d.liquidation_distance * 100.0,
                d.required_distance * 100.0,
                d.status.to_string()
            ),
            RowOutcome::Failed(f) => println!("{:<10} | ERROR {}: {}", row.asset, f.kind, f.reason),
        }
    }

    if !report.warnings().is_empty() {
        println!("\nWarnings:");
        for warning in report.warnings() {
            println!("  - {}", warning);
        }
    }
}
