//! Synthetic Price Source
//!
//! Generates reproducible daily closes without any network or file access.
//! Each asset gets its own seed (derived from its name) and follows a
//! geometric random walk whose volatility switches between calm, normal and
//! stressed regimes, so both floored and unfloored readings occur.
//!
//! Crypto assets (`BASE-QUOTE`) print every calendar day; everything else
//! prints on weekdays only.

use super::{PriceSource, ProviderError};
use crate::config::is_crypto;
use crate::types::{PriceHistory, PricePoint};
use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};
use tracing::info;

/// Annualized volatility per regime (calm, normal, stressed).
const CRYPTO_REGIMES: [f64; 3] = [0.30, 0.60, 1.00];
const EQUITY_REGIMES: [f64; 3] = [0.10, 0.18, 0.35];

/// Daily probability of leaving the current regime.
const REGIME_SWITCH_PROBABILITY: f64 = 1.0 / 60.0;

const ANNUAL_DRIFT: f64 = 0.05;

pub struct SyntheticPriceSource {
    years: u32,
    end_date: NaiveDate,
    seed: u64,
}

impl SyntheticPriceSource {
    pub fn new(years: u32, end_date: NaiveDate, seed: u64) -> Self {
        Self {
            years,
            end_date,
            seed,
        }
    }

    /// Generate the series for `asset`.
    pub fn generate(&self, asset: &str) -> Result<PriceHistory, ProviderError> {
        if self.years == 0 {
            return Err(ProviderError::NoData {
                asset: asset.to_string(),
            });
        }

        let crypto = is_crypto(asset);
        let (days_per_year, regimes) = if crypto {
            (365usize, CRYPTO_REGIMES)
        } else {
            (252usize, EQUITY_REGIMES)
        };
        let count = self.years as usize * days_per_year;

        let dates = trading_dates(self.end_date, count, crypto);
        let asset_seed: u64 = asset.bytes().map(|b| b as u64).sum();
        let mut rng = StdRng::seed_from_u64(self.seed ^ asset_seed.wrapping_mul(0x9E37_79B9_7F4A_7C15));

        let dt = 1.0 / days_per_year as f64;
        let mut regime = 1usize;
        let mut price = 50.0 + 100.0 * rng.random::<f64>();
        let mut points = Vec::with_capacity(count);

        for date in dates {
            if rng.random::<f64>() < REGIME_SWITCH_PROBABILITY {
                regime = rng.random_range(0..regimes.len());
            }
            let sigma = regimes[regime];
            let shock: f64 = StandardNormal.sample(&mut rng);
            price *= ((ANNUAL_DRIFT - 0.5 * sigma * sigma) * dt + sigma * dt.sqrt() * shock).exp();
            points.push(PricePoint::new(date, price));
        }

        PriceHistory::new(asset, points).map_err(|e| ProviderError::Malformed {
            asset: asset.to_string(),
            reason: e.to_string(),
        })
    }
}

/// The last `count` trading dates ending at `end`, oldest first.
fn trading_dates(end: NaiveDate, count: usize, every_day: bool) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(count);
    let mut date = end;
    while dates.len() < count {
        let weekend = matches!(date.weekday(), Weekday::Sat | Weekday::Sun);
        if every_day || !weekend {
            dates.push(date);
        }
        date -= Duration::days(1);
    }
    dates.reverse();
    dates
}

#[async_trait]
impl PriceSource for SyntheticPriceSource {
    async fn fetch_history(&self, asset: &str) -> Result<PriceHistory, ProviderError> {
        info!(asset = %asset, years = self.years, "Generating synthetic data");
        self.generate(asset)
    }
}
