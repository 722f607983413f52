//! Realized volatility profile.
//!
//! Turns a daily close history into a rolling, annualized realized-volatility
//! series and exposes the trailing multi-year distribution that the dynamic
//! floor draws its percentile from.
//!
//! # Model
//!
//! ```text
//! r[t]   = ln(p[t] / p[t-1])
//! σ[t]   = stdev(r[t-w+1..=t]) × √D        (sample stdev, D trading days/year)
//! dist   = last (years × D) samples of σ
//! ```
//!
//! A sample exists only for dates with a full `w`-return window behind them.

use super::error::RiskError;
use crate::math::{annualization_factor, log_returns, sample_std_dev};
use crate::types::PriceHistory;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Trading days per year used for annualization unless configured otherwise.
pub const DEFAULT_TRADING_DAYS_PER_YEAR: u32 = 252;

/// Window and lookback parameters for a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolatilityParams {
    /// Returns per rolling window
    pub window: usize,
    /// Years in the floor distribution
    pub lookback_years: u32,
    /// Annualization constant
    pub trading_days_per_year: u32,
}

impl VolatilityParams {
    /// Number of volatility samples in a full lookback distribution.
    pub fn lookback_samples(&self) -> usize {
        self.lookback_years as usize * self.trading_days_per_year as usize
    }

    /// Closes required to fill the lookback distribution.
    pub fn required_observations(&self) -> usize {
        self.lookback_samples() + self.window
    }
}

/// Annualized realized volatility of the window ending at `date`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolatilitySample {
    pub date: NaiveDate,
    pub value: f64,
}

/// Rolling volatility history for one asset.
#[derive(Debug, Clone, PartialEq)]
pub struct VolatilityProfile {
    asset: String,
    params: VolatilityParams,
    samples: Vec<VolatilitySample>,
    /// Index into `samples` where the floor distribution begins
    distribution_start: usize,
}

impl VolatilityProfile {
    /// Build the profile from a price history.
    ///
    /// # Errors
    /// - `ConfigInvalid` if the window is shorter than 2 returns or the
    ///   lookback is empty
    /// - `DataInsufficient` if the history cannot fill a full lookback
    ///   distribution, naming the shortfall
    pub fn build(history: &PriceHistory, params: VolatilityParams) -> Result<Self, RiskError> {
        if params.window < 2 {
            return Err(RiskError::ConfigInvalid(format!(
                "rolling window must cover at least 2 returns, got {}",
                params.window
            )));
        }
        if params.lookback_samples() == 0 {
            return Err(RiskError::ConfigInvalid(
                "volatility lookback must span at least one trading day".to_string(),
            ));
        }

        let required = params.required_observations();
        if history.len() < required {
            return Err(RiskError::data_insufficient(
                history.asset(),
                format!(
                    "{}y lookback with a {}-day window needs {} closes, have {} (short by {})",
                    params.lookback_years,
                    params.window,
                    required,
                    history.len(),
                    required - history.len()
                ),
            ));
        }

        let samples = rolling_volatility(history, &params);
        debug!(
            asset = %history.asset(),
            samples = samples.len(),
            window = params.window,
            "Volatility profile built"
        );

        Self::from_samples(history.asset(), params, samples, params.lookback_samples())
    }

    fn from_samples(
        asset: &str,
        params: VolatilityParams,
        samples: Vec<VolatilitySample>,
        min_distribution: usize,
    ) -> Result<Self, RiskError> {
        if samples.len() < min_distribution.max(1) {
            return Err(RiskError::data_insufficient(
                asset,
                format!(
                    "need {} volatility samples, have {}",
                    min_distribution.max(1),
                    samples.len()
                ),
            ));
        }

        let distribution_start = samples.len().saturating_sub(params.lookback_samples());
        Ok(Self {
            asset: asset.to_string(),
            params,
            samples,
            distribution_start,
        })
    }

    /// The profile as it would have looked at the close of `date`.
    ///
    /// Keeps only samples on or before `date`; the distribution is the
    /// trailing lookback ending there. When the history before `date` is
    /// shorter than the full lookback, the available samples are used as long
    /// as they cover at least one trading year.
    ///
    /// # Errors
    /// Returns `DataInsufficient` if too few samples precede `date`.
    pub fn as_of(&self, date: NaiveDate) -> Result<Self, RiskError> {
        let end = self.samples.partition_point(|s| s.date <= date);
        let minimum = (self.params.trading_days_per_year as usize).min(self.params.lookback_samples());

        self.clone_prefix(end, minimum).map_err(|_| {
            RiskError::data_insufficient(
                &self.asset,
                format!(
                    "only {} volatility samples on or before {}, need {}",
                    end, date, minimum
                ),
            )
        })
    }

    fn clone_prefix(&self, end: usize, minimum: usize) -> Result<Self, RiskError> {
        Self::from_samples(
            &self.asset,
            self.params,
            self.samples[..end].to_vec(),
            minimum,
        )
    }

    pub fn asset(&self) -> &str {
        &self.asset
    }

    /// Full volatility series, oldest first.
    pub fn samples(&self) -> &[VolatilitySample] {
        &self.samples
    }

    /// Sample ending at the most recent date.
    pub fn current(&self) -> VolatilitySample {
        // Non-empty by construction.
        self.samples[self.samples.len() - 1]
    }

    pub fn current_volatility(&self) -> f64 {
        self.current().value
    }

    /// Samples in the trailing lookback window.
    pub fn distribution(&self) -> &[VolatilitySample] {
        &self.samples[self.distribution_start..]
    }

    pub fn distribution_values(&self) -> Vec<f64> {
        self.distribution().iter().map(|s| s.value).collect()
    }
}

/// Annualized rolling standard deviation of log returns.
fn rolling_volatility(history: &PriceHistory, params: &VolatilityParams) -> Vec<VolatilitySample> {
    let points = history.points();
    let returns = log_returns(&history.closes());
    let factor = annualization_factor(params.trading_days_per_year);

    // returns[i] is the move into points[i + 1]
    returns
        .windows(params.window)
        .enumerate()
        .filter_map(|(i, window)| {
            let std_dev = sample_std_dev(window)?;
            Some(VolatilitySample {
                date: points[i + params.window].date,
                value: std_dev * factor,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2018, 1, 1).unwrap()
    }

    /// Prices whose log returns alternate between +amp and -amp.
    fn zigzag(n: usize, amp: f64) -> Vec<f64> {
        (0..n)
            .map(|i| if i % 2 == 0 { 100.0 } else { 100.0 * amp.exp() })
            .collect()
    }

    fn params() -> VolatilityParams {
        VolatilityParams {
            window: 20,
            lookback_years: 1,
            trading_days_per_year: 252,
        }
    }

    #[test]
    fn test_zigzag_volatility_matches_closed_form() {
        let history = PriceHistory::from_closes("X", start(), &zigzag(300, 0.01)).unwrap();
        let profile = VolatilityProfile::build(&history, params()).unwrap();

        // Even window: mean 0, sample variance = w·amp² / (w - 1)
        let expected = 0.01 * (20.0f64 / 19.0).sqrt() * 252f64.sqrt();
        assert!((profile.current_volatility() - expected).abs() < 1e-12);
        assert!(profile.samples().iter().all(|s| s.value >= 0.0));
    }

    #[test]
    fn test_sample_dates_align_with_window_end() {
        let history = PriceHistory::from_closes("X", start(), &zigzag(300, 0.01)).unwrap();
        let profile = VolatilityProfile::build(&history, params()).unwrap();

        assert_eq!(profile.samples().len(), 300 - 20);
        assert_eq!(profile.samples()[0].date, history.points()[20].date);
        assert_eq!(profile.current().date, history.latest().date);
    }

    #[test]
    fn test_distribution_spans_lookback() {
        let history = PriceHistory::from_closes("X", start(), &zigzag(400, 0.01)).unwrap();
        let profile = VolatilityProfile::build(&history, params()).unwrap();

        assert_eq!(profile.distribution().len(), 252);
        assert_eq!(profile.distribution().last().unwrap().date, history.latest().date);
    }

    #[test]
    fn test_insufficient_history_reports_shortfall() {
        let history = PriceHistory::from_closes("SHORT", start(), &zigzag(100, 0.01)).unwrap();
        let err = VolatilityProfile::build(&history, params()).unwrap_err();

        match err {
            RiskError::DataInsufficient { asset, reason } => {
                assert_eq!(asset, "SHORT");
                assert!(reason.contains("short by 172"), "{}", reason);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_window_too_small_is_config_error() {
        let history = PriceHistory::from_closes("X", start(), &zigzag(300, 0.01)).unwrap();
        let bad = VolatilityParams { window: 1, ..params() };
        assert!(matches!(
            VolatilityProfile::build(&history, bad),
            Err(RiskError::ConfigInvalid(_))
        ));
    }

    #[test]
    fn test_constant_growth_has_zero_volatility() {
        let closes: Vec<f64> = (0..300).map(|i| 100.0 * 1.01f64.powi(i)).collect();
        let history = PriceHistory::from_closes("X", start(), &closes).unwrap();
        let profile = VolatilityProfile::build(&history, params()).unwrap();
        assert!(profile.current_volatility().abs() < 1e-12);
    }

    #[test]
    fn test_as_of_truncates_and_requires_one_year() {
        let history = PriceHistory::from_closes("X", start(), &zigzag(600, 0.01)).unwrap();
        let profile = VolatilityProfile::build(&history, params()).unwrap();

        let date = history.points()[400].date;
        let past = profile.as_of(date).unwrap();
        assert_eq!(past.current().date, date);
        assert!(past.samples().iter().all(|s| s.date <= date));
        assert_eq!(past.distribution().len(), 252);

        let too_early = history.points()[100].date;
        assert!(matches!(
            profile.as_of(too_early),
            Err(RiskError::DataInsufficient { .. })
        ));
    }
}
