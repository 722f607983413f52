//! Leverage drift analysis.
//!
//! Answers "would the leverage recommended at the cycle high still be safe
//! today?". The historical leverage is rebuilt from the volatility profile
//! truncated at the cycle-high date, so only information available at that
//! decision point is used.
//!
//! ```text
//! L_h    = safe leverage at the cycle high (same model as today)
//! P_liq  = P_high × (1 − 1/L_h)
//! d      = (P_now − P_liq) / P_now
//! req    = min(k × σ_now × h × s, 1)
//!
//! status = Liquidated  if P_now ≤ P_liq
//!          Safe        if d ≥ req
//!          Unsafe      otherwise
//! ```

use super::current::{tier_prices, CurrentRiskAnalyzer, TierPrice};
use super::error::RiskError;
use super::floor::DynamicFloor;
use super::volatility::VolatilityProfile;
use crate::config::{RiskTier, SafetyConfig};
use crate::types::PriceHistory;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Float slack when comparing the remaining distance with the requirement.
const DISTANCE_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriftStatus {
    Safe,
    Unsafe,
    Liquidated,
}

impl std::fmt::Display for DriftStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Safe => write!(f, "SAFE"),
            Self::Unsafe => write!(f, "UNSAFE"),
            Self::Liquidated => write!(f, "LIQUIDATED"),
        }
    }
}

/// Drift metrics for a position notionally opened at the cycle high.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftRisk {
    pub asset: String,
    pub cycle_high_date: NaiveDate,
    pub cycle_high_price: f64,
    /// Effective volatility at the cycle high (floor applied, no lookahead)
    pub historical_volatility: f64,
    pub historical_floor_active: bool,
    /// Leverage recommended at the cycle high
    pub historical_leverage: f64,
    pub liquidation_price: f64,
    pub current_price: f64,
    pub current_effective_volatility: f64,
    /// Remaining distance to liquidation as a fraction of today's price
    pub liquidation_distance: f64,
    /// Distance a position needs today to count as safe
    pub required_distance: f64,
    /// Leverage the cycle-high position is running at today
    pub effective_leverage_now: Option<f64>,
    pub status: DriftStatus,
    /// Tier safe prices projected from the cycle high with its volatility
    pub tiers: Vec<TierPrice>,
}

pub struct DriftAnalyzer;

impl DriftAnalyzer {
    /// Analyze drift for the position opened at the cycle high.
    ///
    /// `profile` must be built from `history`; `floor` is today's floor.
    /// Each tier in `tiers` gets a safe price below the cycle high.
    ///
    /// # Errors
    /// - `DataInsufficient` if less than a trading year of volatility
    ///   precedes the cycle high
    /// - `InvalidVolatility` if today's or the historical effective volatility
    ///   is unusable
    /// - `ConfigInvalid` for invalid multipliers or percentile
    pub fn analyze(
        history: &PriceHistory,
        profile: &VolatilityProfile,
        floor: &DynamicFloor,
        config: &SafetyConfig,
        tiers: &[RiskTier],
    ) -> Result<DriftRisk, RiskError> {
        config.check_multipliers()?;

        let sigma_now = floor.effective_volatility;
        if !sigma_now.is_finite() || sigma_now <= 0.0 {
            return Err(RiskError::invalid_volatility(
                history.asset(),
                sigma_now,
                "current effective volatility for drift",
            ));
        }

        let high = *history.max_close_in_tail(config.drift_lookback_observations());

        // Same floor logic, on the data available at the cycle high.
        let past_profile = profile.as_of(high.date)?;
        let past_floor = DynamicFloor::compute(&past_profile, config.floor_percentile)?;
        let past_risk = CurrentRiskAnalyzer::analyze(high.close, &past_floor, config)?;

        let historical_leverage = past_risk.max_safe_leverage;
        let liquidation_price = high.close * (1.0 - 1.0 / historical_leverage);
        let current_price = history.latest().close;

        let required_distance = (config.death_floor_multiplier
            * sigma_now
            * config.horizon_scale()
            * config.safety_margin_multiplier)
            .min(1.0);

        let liquidation_distance = (current_price - liquidation_price) / current_price;
        let status = if current_price <= liquidation_price {
            DriftStatus::Liquidated
        } else if liquidation_distance + DISTANCE_TOLERANCE >= required_distance {
            DriftStatus::Safe
        } else {
            DriftStatus::Unsafe
        };

        let effective_leverage_now = if current_price > liquidation_price {
            Some(current_price / (current_price - liquidation_price))
        } else {
            None
        };

        debug!(
            asset = %history.asset(),
            cycle_high = high.close,
            cycle_high_date = %high.date,
            historical_leverage,
            liquidation_price,
            liquidation_distance,
            required_distance,
            status = %status,
            "Drift computed"
        );

        Ok(DriftRisk {
            asset: history.asset().to_string(),
            cycle_high_date: high.date,
            cycle_high_price: high.close,
            historical_volatility: past_floor.effective_volatility,
            historical_floor_active: past_floor.is_active(),
            historical_leverage,
            liquidation_price,
            current_price,
            current_effective_volatility: sigma_now,
            liquidation_distance,
            required_distance,
            effective_leverage_now,
            status,
            tiers: tier_prices(high.close, past_floor.effective_volatility, config, tiers),
        })
    }
}
