//! CSV rendering of the two report tables.
//!
//! One line per asset in report order. Failed rows keep the asset and the
//! error columns and leave every numeric column empty.

use crate::risk::{AssetFailure, CurrentRiskRow, DriftRisk, ReportRow, RowOutcome};

const CURRENT_COLUMNS: &[&str] = &[
    "asset",
    "outcome",
    "current_price",
    "raw_volatility",
    "floor_volatility",
    "floor_active",
    "effective_volatility",
    "horizon_scale",
    "death_floor_move",
    "death_floor_price",
    "crash_capped",
    "raw_leverage",
    "max_safe_leverage",
    "leverage_clamp",
    "liquidation_distance",
    "cycle_high_date",
    "cycle_high",
    "drawdown",
];

const DRIFT_COLUMNS: &[&str] = &[
    "asset",
    "outcome",
    "cycle_high_date",
    "cycle_high_price",
    "historical_volatility",
    "historical_floor_active",
    "historical_leverage",
    "liquidation_price",
    "current_price",
    "current_effective_volatility",
    "liquidation_distance",
    "required_distance",
    "effective_leverage_now",
    "drift_status",
];

const ERROR_COLUMNS: &[&str] = &["error_kind", "error"];

/// Header for the current-risk table; one price column per risk tier.
pub fn current_csv_header(tier_names: &[String]) -> String {
    let mut columns: Vec<String> = CURRENT_COLUMNS.iter().map(|c| c.to_string()).collect();
    columns.extend(tier_names.iter().map(|name| escape(&format!("tier_{}", name))));
    columns.extend(ERROR_COLUMNS.iter().map(|c| c.to_string()));
    columns.join(",")
}

/// Header for the drift table; one cycle-high price column per risk tier.
pub fn drift_csv_header(tier_names: &[String]) -> String {
    let mut columns: Vec<String> = DRIFT_COLUMNS.iter().map(|c| c.to_string()).collect();
    columns.extend(tier_names.iter().map(|name| escape(&format!("ath_tier_{}", name))));
    columns.extend(ERROR_COLUMNS.iter().map(|c| c.to_string()));
    columns.join(",")
}

pub fn current_to_csv_line(row: &ReportRow<CurrentRiskRow>, tier_count: usize) -> String {
    match &row.outcome {
        RowOutcome::Computed(CurrentRiskRow { risk, cycle }) => {
            let mut fields = vec![
                escape(&row.asset),
                "computed".to_string(),
                risk.current_price.to_string(),
                risk.raw_volatility.to_string(),
                risk.floor_volatility.to_string(),
                risk.floor_active.to_string(),
                risk.effective_volatility.to_string(),
                risk.horizon_scale.to_string(),
                risk.death_floor_move.to_string(),
                risk.death_floor_price.to_string(),
                risk.crash_capped.to_string(),
                risk.raw_leverage.to_string(),
                risk.max_safe_leverage.to_string(),
                risk.leverage_clamp.to_string(),
                risk.liquidation_distance.to_string(),
                cycle.cycle_high_date.to_string(),
                cycle.cycle_high.to_string(),
                cycle.drawdown.to_string(),
            ];
            fields.extend(cycle.tiers.iter().map(|t| t.price.to_string()));
            fields.resize(CURRENT_COLUMNS.len() + tier_count, String::new());
            fields.extend([String::new(), String::new()]);
            fields.join(",")
        }
        RowOutcome::Failed(failure) => {
            failed_line(&row.asset, CURRENT_COLUMNS.len() + tier_count, failure)
        }
    }
}

pub fn drift_to_csv_line(row: &ReportRow<DriftRisk>, tier_count: usize) -> String {
    match &row.outcome {
        RowOutcome::Computed(d) => {
            let mut fields = vec![
                escape(&row.asset),
                "computed".to_string(),
                d.cycle_high_date.to_string(),
                d.cycle_high_price.to_string(),
                d.historical_volatility.to_string(),
                d.historical_floor_active.to_string(),
                d.historical_leverage.to_string(),
                d.liquidation_price.to_string(),
                d.current_price.to_string(),
                d.current_effective_volatility.to_string(),
                d.liquidation_distance.to_string(),
                d.required_distance.to_string(),
                d.effective_leverage_now
                    .map(|l| l.to_string())
                    .unwrap_or_default(),
                d.status.to_string(),
            ];
            fields.extend(d.tiers.iter().map(|t| t.price.to_string()));
            fields.resize(DRIFT_COLUMNS.len() + tier_count, String::new());
            fields.extend([String::new(), String::new()]);
            fields.join(",")
        }
        RowOutcome::Failed(failure) => {
            failed_line(&row.asset, DRIFT_COLUMNS.len() + tier_count, failure)
        }
    }
}

fn failed_line(asset: &str, width: usize, failure: &AssetFailure) -> String {
    let mut fields = vec![escape(asset), "failed".to_string()];
    fields.resize(width, String::new());
    fields.push(failure.kind.to_string());
    fields.push(escape(&failure.reason));
    fields.join(",")
}

/// Quote a field if it contains a delimiter, quote or newline.
fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::{DriftStatus, RiskError, TierPrice};

    #[test]
    fn test_escape_quotes_delimiters() {
        assert_eq!(escape("SPY"), "SPY");
        assert_eq!(escape("a,b"), "\"a,b\"");
        assert_eq!(escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_failed_line_matches_header_width() {
        let err = RiskError::data_insufficient("SPY", "need 1290 closes, have 40");
        let row: ReportRow<DriftRisk> = ReportRow::new("SPY", RowOutcome::from(Err(err)));

        let line = drift_to_csv_line(&row, 0);
        assert!(line.starts_with("SPY,failed,"));
        assert!(line.contains("DataInsufficient"));
        // The reason contains a comma and must be quoted
        assert!(line.ends_with("have 40\""));

        let header = drift_csv_header(&[]);
        let unquoted_fields = line.split("\"").next().unwrap().split(',').count();
        assert_eq!(unquoted_fields, header.split(',').count());
    }

    #[test]
    fn test_current_header_includes_tiers() {
        let header = current_csv_header(&["Half Kelly".to_string(), "Extreme".to_string()]);
        assert!(header.contains("tier_Half Kelly,tier_Extreme,error_kind,error"));
        assert!(header.starts_with("asset,outcome,current_price"));

        let header = drift_csv_header(&["Half Kelly".to_string()]);
        assert!(header.ends_with("drift_status,ath_tier_Half Kelly,error_kind,error"));
    }

    #[test]
    fn test_drift_line_carries_tier_prices() {
        let drift = DriftRisk {
            asset: "SPY".to_string(),
            cycle_high_date: chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            cycle_high_price: 120.0,
            historical_volatility: 0.2,
            historical_floor_active: false,
            historical_leverage: 2.0,
            liquidation_price: 60.0,
            current_price: 100.0,
            current_effective_volatility: 0.25,
            liquidation_distance: 0.4,
            required_distance: 0.3,
            effective_leverage_now: Some(2.5),
            status: DriftStatus::Safe,
            tiers: vec![TierPrice {
                name: "Half Kelly".to_string(),
                multiplier: 1.5,
                price: 84.0,
                crash_capped: false,
            }],
        };
        let row = ReportRow::new("SPY", RowOutcome::Computed(drift));

        let line = drift_to_csv_line(&row, 1);
        assert!(line.ends_with(",SAFE,84,,"));
        let header = drift_csv_header(&["Half Kelly".to_string()]);
        assert_eq!(line.split(',').count(), header.split(',').count());
    }
}
