//! Risk Engine
//!
//! Drives the per-asset pipeline and assembles the report:
//!
//! ```text
//! PriceSource ──► PriceHistory ──► VolatilityProfile ──► DynamicFloor
//!                                                          │
//!                               ┌──────────────────────────┤
//!                               ▼                          ▼
//!                      CurrentRiskAnalyzer          DriftAnalyzer
//!                               └──────────► RiskReport ◄──┘
//! ```
//!
//! Each asset is analyzed independently against the read-only configuration.
//! A failure is recorded in that asset's rows and never stops the others.

use crate::config::RiskConfig;
use crate::data::{PriceSource, ProviderError};
use crate::risk::{
    CurrentRiskAnalyzer, CurrentRiskRow, CycleHighContext, DriftAnalyzer, DriftRisk, DynamicFloor,
    ReportRow, RiskError, RiskReport, RowOutcome, VolatilityProfile,
};
use crate::types::PriceHistory;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Both rows for one asset, plus any configuration warning.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetAnalysis {
    pub asset: String,
    pub current: RowOutcome<CurrentRiskRow>,
    pub drift: RowOutcome<DriftRisk>,
    pub warning: Option<String>,
}

impl AssetAnalysis {
    /// Both rows failed for the same reason.
    fn failed(asset: &str, err: RiskError, warning: Option<String>) -> Self {
        warn!(asset = %asset, kind = %err.kind(), error = %err, "Asset analysis failed");
        Self {
            asset: asset.to_string(),
            current: RowOutcome::from(Err(err.clone())),
            drift: RowOutcome::from(Err(err)),
            warning,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RiskEngine {
    config: Arc<RiskConfig>,
}

impl RiskEngine {
    /// Create an engine for a validated configuration.
    ///
    /// # Errors
    /// Returns `ConfigInvalid` if the document fails global validation; the
    /// run must not start.
    pub fn new(config: RiskConfig) -> Result<Self, RiskError> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Analyze one asset's history. Never fails: errors land in the rows.
    pub fn analyze_history(&self, history: &PriceHistory) -> AssetAnalysis {
        let asset = history.asset();
        let resolved = self.config.resolve(asset);
        let config = &resolved.config;

        debug!(
            asset = %asset,
            observations = history.len(),
            trading_days = config.trading_days_per_year,
            "Analyzing asset"
        );

        let profile = match VolatilityProfile::build(history, config.volatility_params()) {
            Ok(profile) => profile,
            Err(e) => return AssetAnalysis::failed(asset, e, resolved.warning),
        };
        let floor = match DynamicFloor::compute(&profile, config.floor_percentile) {
            Ok(floor) => floor,
            Err(e) => return AssetAnalysis::failed(asset, e, resolved.warning),
        };

        if floor.is_active() {
            info!(
                asset = %asset,
                current_vol = floor.current_volatility,
                floor_vol = floor.floor_volatility,
                "Volatility floor active"
            );
        }

        let current = CurrentRiskAnalyzer::analyze(history.latest().close, &floor, config).map(
            |risk| {
                let cycle = CycleHighContext::compute(
                    history,
                    floor.effective_volatility,
                    config,
                    &self.config.risk_tiers,
                );
                CurrentRiskRow { risk, cycle }
            },
        );
        match &current {
            Ok(row) => info!(
                asset = %asset,
                effective_vol = row.risk.effective_volatility,
                max_safe_leverage = row.risk.max_safe_leverage,
                clamp = %row.risk.leverage_clamp,
                "Current risk"
            ),
            Err(e) => warn!(asset = %asset, error = %e, "Current risk failed"),
        }

        let drift =
            DriftAnalyzer::analyze(history, &profile, &floor, config, &self.config.risk_tiers);
        match &drift {
            Ok(d) => info!(
                asset = %asset,
                cycle_high_date = %d.cycle_high_date,
                historical_leverage = d.historical_leverage,
                status = %d.status,
                "Leverage drift"
            ),
            Err(e) => warn!(asset = %asset, error = %e, "Drift analysis failed"),
        }

        AssetAnalysis {
            asset: asset.to_string(),
            current: current.into(),
            drift: drift.into(),
            warning: resolved.warning,
        }
    }

    /// Analyze the outcome of a fetch. Provider failures become
    /// `DataInsufficient` rows for the asset.
    pub fn analyze_fetched(
        &self,
        asset: &str,
        fetched: Result<PriceHistory, ProviderError>,
    ) -> AssetAnalysis {
        match fetched {
            Ok(history) => {
                let mut analysis = self.analyze_history(&history);
                analysis.asset = asset.to_string();
                analysis
            }
            Err(e) => {
                let warning = self.config.resolve(asset).warning;
                AssetAnalysis::failed(asset, RiskError::data_insufficient(asset, e.to_string()), warning)
            }
        }
    }

    /// Analyze every configured asset, one after another.
    pub async fn run(&self, source: &dyn PriceSource) -> RiskReport {
        info!(assets = self.config.assets.len(), "Starting sequential risk run");

        let mut analyses = Vec::with_capacity(self.config.assets.len());
        for asset in &self.config.assets {
            let fetched = source.fetch_history(asset).await;
            analyses.push(self.analyze_fetched(asset, fetched));
        }
        self.assemble(analyses)
    }

    /// Analyze every configured asset concurrently, one task per asset.
    ///
    /// Results arrive in completion order and are put back into the
    /// configured asset order before aggregation.
    pub async fn run_parallel(&self, source: Arc<dyn PriceSource>) -> RiskReport {
        info!(assets = self.config.assets.len(), "Starting parallel risk run");

        let mut join_set: JoinSet<(usize, AssetAnalysis)> = JoinSet::new();
        for (index, asset) in self.config.assets.iter().enumerate() {
            let engine = self.clone();
            let source = Arc::clone(&source);
            let asset = asset.clone();
            join_set.spawn(async move {
                let fetched = source.fetch_history(&asset).await;
                (index, engine.analyze_fetched(&asset, fetched))
            });
        }

        let mut slots: Vec<Option<AssetAnalysis>> = vec![None; self.config.assets.len()];
        while let Some(result) = join_set.join_next().await {
            match result {
                Ok((index, analysis)) => slots[index] = Some(analysis),
                Err(e) => error!(error = %e, "Asset task did not complete"),
            }
        }

        let analyses = slots
            .into_iter()
            .zip(&self.config.assets)
            .map(|(slot, asset)| {
                slot.unwrap_or_else(|| {
                    AssetAnalysis::failed(
                        asset,
                        RiskError::data_insufficient(asset, "analysis task aborted"),
                        None,
                    )
                })
            })
            .collect();
        self.assemble(analyses)
    }

    fn assemble(&self, analyses: Vec<AssetAnalysis>) -> RiskReport {
        let mut current = Vec::with_capacity(analyses.len());
        let mut drift = Vec::with_capacity(analyses.len());
        let mut warnings = Vec::new();

        for analysis in analyses {
            current.push(ReportRow::new(analysis.asset.clone(), analysis.current));
            drift.push(ReportRow::new(analysis.asset, analysis.drift));
            warnings.extend(analysis.warning);
        }

        let report = RiskReport::aggregate(current, drift).with_warnings(warnings);
        info!(
            assets = report.current().len(),
            failed_rows = report.failure_count(),
            warnings = report.warnings().len(),
            "Risk run complete"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SafetyOverride;
    use crate::data::SyntheticPriceSource;
    use crate::risk::ErrorKind;
    use chrono::NaiveDate;

    fn end_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 28).unwrap()
    }

    #[test]
    fn test_invalid_config_aborts() {
        let config = RiskConfig::with_assets(vec![]);
        assert!(matches!(
            RiskEngine::new(config),
            Err(RiskError::ConfigInvalid(_))
        ));
    }

    #[test]
    fn test_short_history_fails_both_rows() {
        let engine = RiskEngine::new(RiskConfig::with_assets(vec!["SPY".to_string()])).unwrap();
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let history = PriceHistory::from_closes("SPY", start, &[100.0; 40]).unwrap();

        let analysis = engine.analyze_history(&history);
        assert_eq!(
            analysis.current.failure().unwrap().kind,
            ErrorKind::DataInsufficient
        );
        assert_eq!(
            analysis.drift.failure().unwrap().kind,
            ErrorKind::DataInsufficient
        );
    }

    #[test]
    fn test_provider_error_maps_to_data_insufficient() {
        let engine = RiskEngine::new(RiskConfig::with_assets(vec!["SPY".to_string()])).unwrap();
        let analysis = engine.analyze_fetched(
            "SPY",
            Err(ProviderError::NoData {
                asset: "SPY".to_string(),
            }),
        );
        let failure = analysis.current.failure().unwrap();
        assert_eq!(failure.kind, ErrorKind::DataInsufficient);
        assert!(failure.reason.contains("No data"));
    }

    #[tokio::test]
    async fn test_synthetic_run_computes_rows() {
        let assets = vec!["SPY".to_string(), "BTC-USD".to_string()];
        let engine = RiskEngine::new(RiskConfig::with_assets(assets)).unwrap();
        let source = SyntheticPriceSource::new(7, end_date(), 42);

        let report = engine.run(&source).await;
        assert_eq!(report.current().len(), 2);
        assert!(report.current().iter().all(|r| r.outcome.is_computed()));
        assert!(report.drift().iter().all(|r| r.outcome.is_computed()));
        assert_eq!(report.failure_count(), 0);
    }

    #[tokio::test]
    async fn test_parallel_matches_sequential() {
        let assets = vec!["QQQ".to_string(), "ETH-USD".to_string(), "SPY".to_string()];
        let engine = RiskEngine::new(RiskConfig::with_assets(assets)).unwrap();
        let source = Arc::new(SyntheticPriceSource::new(7, end_date(), 3));

        let sequential = engine.run(source.as_ref()).await;
        let parallel = engine.run_parallel(source).await;
        assert_eq!(sequential, parallel);
    }

    #[tokio::test]
    async fn test_rejected_override_is_reported() {
        let mut config = RiskConfig::with_assets(vec!["SPY".to_string()]);
        config.overrides.insert(
            "SPY".to_string(),
            SafetyOverride {
                max_crash_cap: Some(2.0),
                ..Default::default()
            },
        );
        let engine = RiskEngine::new(config).unwrap();
        let source = SyntheticPriceSource::new(7, end_date(), 1);

        let report = engine.run(&source).await;
        assert_eq!(report.warnings().len(), 1);
        assert!(report.warnings()[0].contains("SPY"));
        assert!(report.current()[0].outcome.is_computed());
    }
}
