//! Configuration for the risk analysis run
//!
//! A single JSON document lists the assets to analyze, global safety
//! defaults, optional per-asset overrides and named risk tiers. The document
//! is loaded once, validated, and then shared read-only by every analysis.

use crate::risk::volatility::VolatilityParams;
use crate::risk::RiskError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Errors that can occur while loading the configuration document.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Invalid(#[from] RiskError),
}

/// Resolved safety parameters for one asset.
///
/// Built from the document defaults, the asset class and any per-asset
/// override. Passed by reference into every analyzer call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyConfig {
    /// Effective-volatility units of adverse move that define the death floor
    #[serde(default = "default_death_floor_multiplier")]
    pub death_floor_multiplier: f64,

    /// Extra cushion applied on top of the death-floor move for safe leverage
    #[serde(default = "default_safety_margin_multiplier")]
    pub safety_margin_multiplier: f64,

    /// Percentile (0-100) of historical volatility used as the floor
    #[serde(default = "default_floor_percentile")]
    pub floor_percentile: f64,

    /// Years of volatility history in the floor distribution
    #[serde(default = "default_lookback_years")]
    pub lookback_years: u32,

    /// Rolling window (in observations) for realized volatility
    #[serde(default = "default_rolling_window_days")]
    pub rolling_window_days: usize,

    /// Annualization constant
    #[serde(default = "default_trading_days_per_year")]
    pub trading_days_per_year: u32,

    /// Analysis horizon in trading days; `None` means one trading year
    #[serde(default)]
    pub horizon_days: Option<f64>,

    /// Ceiling for recommended leverage
    #[serde(default = "default_max_leverage")]
    pub max_leverage: f64,

    /// Largest fractional crash used when projecting prices (0-1]
    #[serde(default = "default_max_crash_cap")]
    pub max_crash_cap: f64,

    /// Observations used for the cycle high in the current-risk table
    #[serde(default = "default_cycle_high_lookback_days")]
    pub cycle_high_lookback_days: usize,

    /// Observations used for the drift cycle high; `None` means the floor lookback
    #[serde(default)]
    pub drift_lookback_days: Option<usize>,
}

// Default value functions for serde
fn default_death_floor_multiplier() -> f64 {
    2.5
}
fn default_safety_margin_multiplier() -> f64 {
    1.2
}
fn default_floor_percentile() -> f64 {
    25.0
}
fn default_lookback_years() -> u32 {
    5
}
fn default_rolling_window_days() -> usize {
    30
}
fn default_trading_days_per_year() -> u32 {
    crate::risk::volatility::DEFAULT_TRADING_DAYS_PER_YEAR
}
fn default_crypto_trading_days_per_year() -> u32 {
    365
}
fn default_max_leverage() -> f64 {
    10.0
}
fn default_max_crash_cap() -> f64 {
    0.85
}
fn default_cycle_high_lookback_days() -> usize {
    365
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            death_floor_multiplier: default_death_floor_multiplier(),
            safety_margin_multiplier: default_safety_margin_multiplier(),
            floor_percentile: default_floor_percentile(),
            lookback_years: default_lookback_years(),
            rolling_window_days: default_rolling_window_days(),
            trading_days_per_year: default_trading_days_per_year(),
            horizon_days: None,
            max_leverage: default_max_leverage(),
            max_crash_cap: default_max_crash_cap(),
            cycle_high_lookback_days: default_cycle_high_lookback_days(),
            drift_lookback_days: None,
        }
    }
}

impl SafetyConfig {
    /// Full domain validation for a configuration document.
    pub fn validate(&self) -> Result<(), RiskError> {
        if !self.death_floor_multiplier.is_finite() || self.death_floor_multiplier < 1.0 {
            return Err(RiskError::ConfigInvalid(format!(
                "deathFloorMultiplier must be at least 1.0, got {}",
                self.death_floor_multiplier
            )));
        }
        self.check_multipliers()?;
        self.check_percentile()?;
        if self.lookback_years == 0 {
            return Err(RiskError::ConfigInvalid(
                "lookbackYears must be at least 1".to_string(),
            ));
        }
        if self.rolling_window_days < 2 {
            return Err(RiskError::ConfigInvalid(format!(
                "rollingWindowDays must be at least 2, got {}",
                self.rolling_window_days
            )));
        }
        if self.trading_days_per_year == 0 {
            return Err(RiskError::ConfigInvalid(
                "tradingDaysPerYear must be positive".to_string(),
            ));
        }
        if let Some(h) = self.horizon_days {
            if !h.is_finite() || h <= 0.0 {
                return Err(RiskError::ConfigInvalid(format!(
                    "horizonDays must be positive, got {}",
                    h
                )));
            }
        }
        if self.cycle_high_lookback_days == 0 || self.drift_lookback_days == Some(0) {
            return Err(RiskError::ConfigInvalid(
                "cycle high lookbacks must be at least 1 observation".to_string(),
            ));
        }
        Ok(())
    }

    /// Checks the analyzers rely on: positive, finite multipliers, a usable
    /// leverage ceiling and crash cap.
    ///
    /// Unlike [`validate`](Self::validate) this accepts a death-floor
    /// multiplier below 1.0.
    pub fn check_multipliers(&self) -> Result<(), RiskError> {
        if !self.death_floor_multiplier.is_finite() || self.death_floor_multiplier <= 0.0 {
            return Err(RiskError::ConfigInvalid(format!(
                "deathFloorMultiplier must be positive, got {}",
                self.death_floor_multiplier
            )));
        }
        if !self.safety_margin_multiplier.is_finite() || self.safety_margin_multiplier <= 0.0 {
            return Err(RiskError::ConfigInvalid(format!(
                "safetyMarginMultiplier must be positive, got {}",
                self.safety_margin_multiplier
            )));
        }
        if !self.max_leverage.is_finite() || self.max_leverage < 1.0 {
            return Err(RiskError::ConfigInvalid(format!(
                "maxLeverage must be at least 1.0, got {}",
                self.max_leverage
            )));
        }
        if !(self.max_crash_cap > 0.0 && self.max_crash_cap <= 1.0) {
            return Err(RiskError::ConfigInvalid(format!(
                "maxCrashCap must be in (0, 1], got {}",
                self.max_crash_cap
            )));
        }
        Ok(())
    }

    pub fn check_percentile(&self) -> Result<(), RiskError> {
        check_percentile(self.floor_percentile)
    }

    /// Scaling factor that converts annualized volatility to the analysis horizon.
    pub fn horizon_scale(&self) -> f64 {
        let year = self.trading_days_per_year as f64;
        match self.horizon_days {
            Some(days) => (days / year).sqrt(),
            None => 1.0,
        }
    }

    pub fn volatility_params(&self) -> VolatilityParams {
        VolatilityParams {
            window: self.rolling_window_days,
            lookback_years: self.lookback_years,
            trading_days_per_year: self.trading_days_per_year,
        }
    }

    /// Observations in the drift window.
    pub fn drift_lookback_observations(&self) -> usize {
        self.drift_lookback_days
            .unwrap_or_else(|| self.volatility_params().lookback_samples())
    }
}

/// Reject percentiles outside 0-100.
pub fn check_percentile(percentile: f64) -> Result<(), RiskError> {
    if (0.0..=100.0).contains(&percentile) {
        Ok(())
    } else {
        Err(RiskError::ConfigInvalid(format!(
            "floorPercentile must be within [0, 100], got {}",
            percentile
        )))
    }
}

/// Document-level defaults: the shared safety parameters plus the crypto
/// annualization constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetySettings {
    #[serde(flatten)]
    pub safety: SafetyConfig,

    /// Annualization constant for assets that trade every calendar day
    #[serde(default = "default_crypto_trading_days_per_year")]
    pub crypto_trading_days_per_year: u32,
}

impl Default for SafetySettings {
    fn default() -> Self {
        Self {
            safety: SafetyConfig::default(),
            crypto_trading_days_per_year: default_crypto_trading_days_per_year(),
        }
    }
}

impl SafetySettings {
    /// Defaults specialised to the asset's class.
    pub fn for_asset(&self, asset: &str) -> SafetyConfig {
        let mut config = self.safety.clone();
        if is_crypto(asset) {
            config.trading_days_per_year = self.crypto_trading_days_per_year;
        }
        config
    }
}

/// Assets quoted as `BASE-QUOTE` (e.g. "BTC-USD") trade around the clock.
pub fn is_crypto(asset: &str) -> bool {
    asset.contains('-')
}

/// Optional per-asset replacements for the defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyOverride {
    pub death_floor_multiplier: Option<f64>,
    pub safety_margin_multiplier: Option<f64>,
    pub floor_percentile: Option<f64>,
    pub lookback_years: Option<u32>,
    pub rolling_window_days: Option<usize>,
    pub trading_days_per_year: Option<u32>,
    pub horizon_days: Option<f64>,
    pub max_leverage: Option<f64>,
    pub max_crash_cap: Option<f64>,
    pub cycle_high_lookback_days: Option<usize>,
    pub drift_lookback_days: Option<usize>,
}

impl SafetyOverride {
    pub fn apply(&self, base: &SafetyConfig) -> SafetyConfig {
        SafetyConfig {
            death_floor_multiplier: self
                .death_floor_multiplier
                .unwrap_or(base.death_floor_multiplier),
            safety_margin_multiplier: self
                .safety_margin_multiplier
                .unwrap_or(base.safety_margin_multiplier),
            floor_percentile: self.floor_percentile.unwrap_or(base.floor_percentile),
            lookback_years: self.lookback_years.unwrap_or(base.lookback_years),
            rolling_window_days: self.rolling_window_days.unwrap_or(base.rolling_window_days),
            trading_days_per_year: self
                .trading_days_per_year
                .unwrap_or(base.trading_days_per_year),
            horizon_days: self.horizon_days.or(base.horizon_days),
            max_leverage: self.max_leverage.unwrap_or(base.max_leverage),
            max_crash_cap: self.max_crash_cap.unwrap_or(base.max_crash_cap),
            cycle_high_lookback_days: self
                .cycle_high_lookback_days
                .unwrap_or(base.cycle_high_lookback_days),
            drift_lookback_days: self.drift_lookback_days.or(base.drift_lookback_days),
        }
    }
}

/// Named multiplier used to project a safe price from the cycle high.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskTier {
    pub name: String,
    pub multiplier: f64,
}

/// Safety parameters resolved for one asset.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSafety {
    pub config: SafetyConfig,
    /// Set when the asset's override was rejected and defaults were used
    pub warning: Option<String>,
}

/// The whole configuration document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskConfig {
    pub assets: Vec<String>,

    #[serde(default)]
    pub defaults: SafetySettings,

    #[serde(default)]
    pub overrides: BTreeMap<String, SafetyOverride>,

    #[serde(default)]
    pub risk_tiers: Vec<RiskTier>,
}

impl RiskConfig {
    /// Create a config for the given assets with default settings.
    pub fn with_assets(assets: Vec<String>) -> Self {
        Self {
            assets,
            defaults: SafetySettings::default(),
            overrides: BTreeMap::new(),
            risk_tiers: Vec::new(),
        }
    }

    /// Load and validate a configuration document.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read, is not valid JSON,
    /// or fails global validation.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: RiskConfig = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a configuration document held in memory.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: RiskConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Global validation. Any failure here aborts the run.
    pub fn validate(&self) -> Result<(), RiskError> {
        if self.assets.is_empty() {
            return Err(RiskError::ConfigInvalid(
                "assets list cannot be empty".to_string(),
            ));
        }
        self.defaults.safety.validate()?;
        if self.defaults.crypto_trading_days_per_year == 0 {
            return Err(RiskError::ConfigInvalid(
                "cryptoTradingDaysPerYear must be positive".to_string(),
            ));
        }
        for tier in &self.risk_tiers {
            if !tier.multiplier.is_finite() || tier.multiplier <= 0.0 {
                return Err(RiskError::ConfigInvalid(format!(
                    "risk tier '{}' multiplier must be positive, got {}",
                    tier.name, tier.multiplier
                )));
            }
        }
        for asset in self.overrides.keys() {
            if !self.assets.contains(asset) {
                warn!(asset = %asset, "Override configured for an asset that is not analyzed");
            }
        }
        Ok(())
    }

    /// Merge the asset's override over the defaults.
    ///
    /// An override that produces an invalid configuration is dropped; the
    /// asset uses the defaults and the returned warning explains why.
    pub fn resolve(&self, asset: &str) -> ResolvedSafety {
        let base = self.defaults.for_asset(asset);

        let Some(overrides) = self.overrides.get(asset) else {
            return ResolvedSafety {
                config: base,
                warning: None,
            };
        };

        let merged = overrides.apply(&base);
        match merged.validate() {
            Ok(()) => ResolvedSafety {
                config: merged,
                warning: None,
            },
            Err(e) => {
                let warning = format!("{}: override rejected, using defaults ({})", asset, e);
                warn!(asset = %asset, error = %e, "Invalid per-asset override, falling back to defaults");
                ResolvedSafety {
                    config: base,
                    warning: Some(warning),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    const SAMPLE: &str = r#"{
        "assets": ["BTC-USD", "SPY"],
        "defaults": { "deathFloorMultiplier": 3.0, "floorPercentile": 20.0 },
        "overrides": { "BTC-USD": { "safetyMarginMultiplier": 1.5 } },
        "riskTiers": [ { "name": "Half Kelly", "multiplier": 1.5 } ]
    }"#;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SafetyConfig::default().validate().is_ok());
        let config = RiskConfig::with_assets(vec!["SPY".to_string()]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_document_applies_serde_defaults() {
        let config = RiskConfig::from_json_str(SAMPLE).unwrap();
        assert_eq!(config.assets, vec!["BTC-USD", "SPY"]);
        assert_eq!(config.defaults.safety.death_floor_multiplier, 3.0);
        assert_eq!(config.defaults.safety.floor_percentile, 20.0);
        assert_eq!(config.defaults.safety.safety_margin_multiplier, 1.2);
        assert_eq!(config.defaults.safety.rolling_window_days, 30);
        assert_eq!(config.defaults.crypto_trading_days_per_year, 365);
        assert_eq!(config.risk_tiers.len(), 1);
    }

    #[test]
    fn test_resolve_uses_asset_class_and_override() {
        let config = RiskConfig::from_json_str(SAMPLE).unwrap();

        let btc = config.resolve("BTC-USD");
        assert!(btc.warning.is_none());
        assert_eq!(btc.config.trading_days_per_year, 365);
        assert_eq!(btc.config.safety_margin_multiplier, 1.5);

        let spy = config.resolve("SPY");
        assert_eq!(spy.config.trading_days_per_year, 252);
        assert_eq!(spy.config.safety_margin_multiplier, 1.2);
    }

    #[test]
    fn test_invalid_override_falls_back_with_warning() {
        let mut config = RiskConfig::with_assets(vec!["SPY".to_string()]);
        config.overrides.insert(
            "SPY".to_string(),
            SafetyOverride {
                floor_percentile: Some(150.0),
                ..Default::default()
            },
        );

        let resolved = config.resolve("SPY");
        assert_eq!(resolved.config, config.defaults.for_asset("SPY"));
        assert!(resolved.warning.unwrap().contains("floorPercentile"));
    }

    #[test]
    fn test_death_floor_below_one_rejected() {
        let config = SafetyConfig {
            death_floor_multiplier: 0.5,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(RiskError::ConfigInvalid(_))));
        // Analyzers only require positivity
        assert!(config.check_multipliers().is_ok());
    }

    #[test]
    fn test_invalid_domains_rejected() {
        let cases = [
            SafetyConfig {
                safety_margin_multiplier: 0.0,
                ..Default::default()
            },
            SafetyConfig {
                floor_percentile: -1.0,
                ..Default::default()
            },
            SafetyConfig {
                lookback_years: 0,
                ..Default::default()
            },
            SafetyConfig {
                rolling_window_days: 1,
                ..Default::default()
            },
            SafetyConfig {
                max_crash_cap: 1.5,
                ..Default::default()
            },
            SafetyConfig {
                horizon_days: Some(0.0),
                ..Default::default()
            },
        ];
        for case in cases {
            assert!(case.validate().is_err(), "expected rejection: {:?}", case);
        }
    }

    #[test]
    fn test_empty_assets_invalid() {
        let config = RiskConfig::with_assets(vec![]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_horizon_scale() {
        let annual = SafetyConfig::default();
        assert_eq!(annual.horizon_scale(), 1.0);

        let monthly = SafetyConfig {
            horizon_days: Some(63.0),
            ..Default::default()
        };
        assert!((monthly.horizon_scale() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_drift_lookback_defaults_to_floor_lookback() {
        let config = SafetyConfig::default();
        assert_eq!(config.drift_lookback_observations(), 5 * 252);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut file = File::create(&path).unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = RiskConfig::load(&path).unwrap();
        assert_eq!(config.assets.len(), 2);
    }

    #[test]
    fn test_missing_file_and_malformed_json() {
        assert!(matches!(
            RiskConfig::load("non_existent.json"),
            Err(ConfigError::Io { .. })
        ));
        assert!(matches!(
            RiskConfig::from_json_str("{broken_json: "),
            Err(ConfigError::Json(_))
        ));
    }
}
