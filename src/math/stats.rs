//! Statistical primitives for volatility estimation.
//!
//! # Conventions
//!
//! - Returns are natural-log price ratios: `r[t] = ln(p[t] / p[t-1])`
//! - Standard deviation uses the sample (n-1) denominator
//! - Percentiles interpolate linearly between the two nearest ranked samples:
//!
//! ```text
//! h = (n - 1) × q
//! P(q) = x[⌊h⌋] + (h - ⌊h⌋) × (x[⌈h⌉] - x[⌊h⌋])
//! ```
//!
//! Nearest-rank rounding would move the threshold by a whole sample, which
//! matters when the distribution is short.

/// Compute log returns between consecutive prices.
///
/// Returns `n - 1` values for `n` prices. Callers are expected to supply
/// strictly positive prices; a non-positive price yields a non-finite return.
pub fn log_returns(prices: &[f64]) -> Vec<f64> {
    prices.windows(2).map(|w| (w[1] / w[0]).ln()).collect()
}

/// Sample standard deviation (n-1 denominator).
///
/// Returns `None` for fewer than two values or a non-finite result.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std_dev = variance.sqrt();

    if std_dev.is_finite() {
        Some(std_dev)
    } else {
        None
    }
}

/// Percentile with linear interpolation between ranked samples.
///
/// `percentile` is expressed on the 0–100 scale. Returns `None` for an empty
/// slice, an out-of-range percentile, or any non-finite input value.
pub fn percentile_linear(values: &[f64], percentile: f64) -> Option<f64> {
    if values.is_empty() || !(0.0..=100.0).contains(&percentile) {
        return None;
    }
    if values.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = (sorted.len() - 1) as f64 * (percentile / 100.0);
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;

    Some(sorted[lower] + weight * (sorted[upper] - sorted[lower]))
}

/// Square-root-of-time factor that annualizes a daily standard deviation.
pub fn annualization_factor(trading_days_per_year: u32) -> f64 {
    (trading_days_per_year as f64).sqrt()
}
