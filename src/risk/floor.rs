//! Dynamic volatility floor.
//!
//! A short-lived volatility contraction must not make leverage look safer
//! than the asset's long-run behaviour. The floor is a percentile of the
//! trailing volatility distribution and the effective volatility used by
//! every downstream calculation is
//!
//! ```text
//! effective = max(current, floor)
//! ```

use super::error::RiskError;
use super::volatility::VolatilityProfile;
use crate::config::check_percentile;
use crate::math::percentile_linear;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Floor decision for one asset at one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicFloor {
    pub asset: String,
    /// Date of the current volatility sample
    pub as_of: NaiveDate,
    /// Percentile threshold on the 0-100 scale
    pub percentile: f64,
    pub current_volatility: f64,
    pub floor_volatility: f64,
    pub effective_volatility: f64,
}

impl DynamicFloor {
    /// Compute the floor from a profile's distribution.
    ///
    /// Pure and deterministic: the same profile and percentile always give
    /// the same floor.
    ///
    /// # Errors
    /// - `ConfigInvalid` if `percentile` is outside [0, 100]
    /// - `InvalidVolatility` if the distribution holds non-finite samples
    pub fn compute(profile: &VolatilityProfile, percentile: f64) -> Result<Self, RiskError> {
        check_percentile(percentile)?;

        let values = profile.distribution_values();
        let floor = percentile_linear(&values, percentile).ok_or_else(|| {
            RiskError::invalid_volatility(
                profile.asset(),
                f64::NAN,
                "volatility distribution contains non-finite samples",
            )
        })?;

        let current = profile.current();
        Ok(Self::new(
            profile.asset(),
            current.date,
            percentile,
            current.value,
            floor,
        ))
    }

    /// Assemble a floor from already-known volatilities.
    pub fn new(
        asset: &str,
        as_of: NaiveDate,
        percentile: f64,
        current_volatility: f64,
        floor_volatility: f64,
    ) -> Self {
        Self {
            asset: asset.to_string(),
            as_of,
            percentile,
            current_volatility,
            floor_volatility,
            effective_volatility: current_volatility.max(floor_volatility),
        }
    }

    /// True when the floor replaced the current reading.
    pub fn is_active(&self) -> bool {
        self.floor_volatility > self.current_volatility
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::volatility::VolatilityParams;
    use crate::types::PriceHistory;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    /// Loud zigzag history that goes quiet for the final stretch.
    fn calm_ending_profile() -> VolatilityProfile {
        let mut closes = Vec::new();
        let mut price = 100.0f64;
        for i in 0..400 {
            let amp: f64 = if i < 360 { 0.03 } else { 0.002 };
            price *= if i % 2 == 0 { amp.exp() } else { (-amp).exp() };
            closes.push(price);
        }
        let start = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
        let history = PriceHistory::from_closes("X", start, &closes).unwrap();
        VolatilityProfile::build(
            &history,
            VolatilityParams {
                window: 20,
                lookback_years: 1,
                trading_days_per_year: 252,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_floor_applies_when_current_is_calm() {
        let profile = calm_ending_profile();
        let floor = DynamicFloor::compute(&profile, 25.0).unwrap();

        assert!(floor.is_active());
        assert!(floor.floor_volatility > floor.current_volatility);
        assert_eq!(floor.effective_volatility, floor.floor_volatility);
    }

    #[test]
    fn test_effective_is_max_of_current_and_floor() {
        let calm = DynamicFloor::new("X", day(), 25.0, 0.40, 0.55);
        assert_eq!(calm.effective_volatility, 0.55);
        assert!(calm.is_active());

        let loud = DynamicFloor::new("X", day(), 25.0, 0.90, 0.55);
        assert_eq!(loud.effective_volatility, 0.90);
        assert!(!loud.is_active());
    }

    #[test]
    fn test_zero_percentile_is_distribution_minimum() {
        let profile = calm_ending_profile();
        let floor = DynamicFloor::compute(&profile, 0.0).unwrap();
        let min = profile
            .distribution_values()
            .into_iter()
            .fold(f64::INFINITY, f64::min);
        assert_eq!(floor.floor_volatility, min);
    }

    #[test]
    fn test_percentile_out_of_range_is_config_invalid() {
        let profile = calm_ending_profile();
        assert!(matches!(
            DynamicFloor::compute(&profile, 101.0),
            Err(RiskError::ConfigInvalid(_))
        ));
        assert!(matches!(
            DynamicFloor::compute(&profile, -0.1),
            Err(RiskError::ConfigInvalid(_))
        ));
    }

    #[test]
    fn test_compute_is_deterministic() {
        let profile = calm_ending_profile();
        let a = DynamicFloor::compute(&profile, 25.0).unwrap();
        let b = DynamicFloor::compute(&profile, 25.0).unwrap();
        assert_eq!(a, b);
    }
}
