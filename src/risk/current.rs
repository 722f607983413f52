//! Current-risk analysis: safe entry leverage for a position opened today.
//!
//! # Model
//!
//! With effective volatility `σ`, horizon scale `h`, death-floor multiplier
//! `k` and safety margin `s`:
//!
//! ```text
//! death move      m  = k × σ × h
//! death floor     P_d = P × (1 − min(m, cap))
//! safe leverage   L  = 1 / (m × s)
//! ```
//!
//! A position at leverage `L` is liquidated by a `1/L` adverse move, so `L`
//! is the largest leverage whose liquidation distance still covers the
//! cushioned death move. The reported leverage is clamped to
//! `[1, maxLeverage]`; a value below 1 means even an unlevered position
//! cannot absorb the move.

use super::error::RiskError;
use super::floor::DynamicFloor;
use crate::config::{RiskTier, SafetyConfig};
use crate::types::PriceHistory;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How the recommended leverage was bounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeverageClamp {
    /// Within `[1, maxLeverage]`
    None,
    /// Raw leverage exceeded the configured ceiling
    Ceiling,
    /// Raw leverage fell below 1x; reported as unlevered
    Spot,
}

impl std::fmt::Display for LeverageClamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Ceiling => write!(f, "ceiling"),
            Self::Spot => write!(f, "spot"),
        }
    }
}

/// Safe-entry metrics for one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentRisk {
    pub asset: String,
    pub current_price: f64,
    pub raw_volatility: f64,
    pub floor_volatility: f64,
    pub floor_active: bool,
    pub effective_volatility: f64,
    pub horizon_scale: f64,
    /// Fractional adverse move `k × σ × h` (may exceed 1.0)
    pub death_floor_move: f64,
    /// Price after the (capped) death-floor move
    pub death_floor_price: f64,
    /// True when the death move exceeded the crash cap
    pub crash_capped: bool,
    /// `1 / (m × s)` before clamping
    pub raw_leverage: f64,
    /// Recommended maximum leverage after clamping
    pub max_safe_leverage: f64,
    pub leverage_clamp: LeverageClamp,
    /// Fractional adverse move that liquidates at the recommended leverage
    pub liquidation_distance: f64,
}

pub struct CurrentRiskAnalyzer;

impl CurrentRiskAnalyzer {
    /// Safe entry leverage for a position opened at `current_price`.
    ///
    /// # Errors
    /// - `InvalidVolatility` if the effective volatility is zero, negative or
    ///   non-finite
    /// - `ConfigInvalid` for non-positive multipliers, ceiling or crash cap
    /// - `DataInsufficient` for a non-positive or non-finite price
    pub fn analyze(
        current_price: f64,
        floor: &DynamicFloor,
        config: &SafetyConfig,
    ) -> Result<CurrentRisk, RiskError> {
        config.check_multipliers()?;

        let sigma = floor.effective_volatility;
        if !sigma.is_finite() || sigma <= 0.0 {
            return Err(RiskError::invalid_volatility(
                &floor.asset,
                sigma,
                "effective volatility after floor",
            ));
        }
        if !current_price.is_finite() || current_price <= 0.0 {
            return Err(RiskError::data_insufficient(
                &floor.asset,
                format!("current price {} is not usable", current_price),
            ));
        }

        let horizon_scale = config.horizon_scale();
        let death_floor_move = config.death_floor_multiplier * sigma * horizon_scale;
        let (crash, crash_capped) = cap_crash(death_floor_move, config.max_crash_cap);
        let death_floor_price = current_price * (1.0 - crash);

        let cushioned_move = death_floor_move * config.safety_margin_multiplier;
        let raw_leverage = 1.0 / cushioned_move;
        let (max_safe_leverage, leverage_clamp) = clamp_leverage(raw_leverage, config.max_leverage);

        debug!(
            asset = %floor.asset,
            sigma,
            death_floor_move,
            raw_leverage,
            max_safe_leverage,
            clamp = %leverage_clamp,
            "Current risk computed"
        );

        Ok(CurrentRisk {
            asset: floor.asset.clone(),
            current_price,
            raw_volatility: floor.current_volatility,
            floor_volatility: floor.floor_volatility,
            floor_active: floor.is_active(),
            effective_volatility: sigma,
            horizon_scale,
            death_floor_move,
            death_floor_price,
            crash_capped,
            raw_leverage,
            max_safe_leverage,
            leverage_clamp,
            liquidation_distance: 1.0 / max_safe_leverage,
        })
    }
}

/// Cap a fractional crash so projected prices stay positive.
fn cap_crash(crash: f64, cap: f64) -> (f64, bool) {
    if crash > cap {
        (cap, true)
    } else {
        (crash, false)
    }
}

fn clamp_leverage(raw: f64, ceiling: f64) -> (f64, LeverageClamp) {
    if raw > ceiling {
        (ceiling, LeverageClamp::Ceiling)
    } else if raw < 1.0 {
        (1.0, LeverageClamp::Spot)
    } else {
        (raw, LeverageClamp::None)
    }
}

/// Safe price for one named risk tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierPrice {
    pub name: String,
    pub multiplier: f64,
    pub price: f64,
    pub crash_capped: bool,
}

/// Safe price per tier below `reference`: `reference × (1 − min(m × σ × h, cap))`.
pub(crate) fn tier_prices(
    reference: f64,
    effective_volatility: f64,
    config: &SafetyConfig,
    tiers: &[RiskTier],
) -> Vec<TierPrice> {
    let scale = config.horizon_scale();
    tiers
        .iter()
        .map(|tier| {
            let (crash, crash_capped) =
                cap_crash(effective_volatility * tier.multiplier * scale, config.max_crash_cap);
            TierPrice {
                name: tier.name.clone(),
                multiplier: tier.multiplier,
                price: reference * (1.0 - crash),
                crash_capped,
            }
        })
        .collect()
}

/// Where today's price sits relative to the recent cycle high.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleHighContext {
    pub cycle_high_date: NaiveDate,
    pub cycle_high: f64,
    /// Fractional decline from the cycle high (0 at the high)
    pub drawdown: f64,
    pub tiers: Vec<TierPrice>,
}

impl CycleHighContext {
    /// Cycle high over `cycleHighLookbackDays` and a safe price per tier:
    /// `high × (1 − min(m × σ × h, cap))`.
    pub fn compute(
        history: &PriceHistory,
        effective_volatility: f64,
        config: &SafetyConfig,
        tiers: &[RiskTier],
    ) -> Self {
        let high = history.max_close_in_tail(config.cycle_high_lookback_days);
        let current = history.latest().close;

        Self {
            cycle_high_date: high.date,
            cycle_high: high.close,
            drawdown: (high.close - current) / high.close,
            tiers: tier_prices(high.close, effective_volatility, config, tiers),
        }
    }
}

/// A populated row of the current-risk table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentRiskRow {
    pub risk: CurrentRisk,
    pub cycle: CycleHighContext,
}
