//! Common Types Module
//!
//! Price data shared between the data sources and the risk engine.

use crate::risk::RiskError;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// A single daily close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// Immutable daily close history for one asset.
///
/// Guarantees at least one observation, strictly ascending dates (so no
/// duplicates) and finite, positive closes.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceHistory {
    asset: String,
    points: Vec<PricePoint>,
}

impl PriceHistory {
    /// Validate and wrap a series of closes.
    ///
    /// # Errors
    /// Returns `RiskError::DataInsufficient` when the series is empty, out of
    /// order, or contains a non-positive or non-finite close.
    pub fn new(asset: impl Into<String>, points: Vec<PricePoint>) -> Result<Self, RiskError> {
        let asset = asset.into();

        if points.is_empty() {
            return Err(RiskError::data_insufficient(&asset, "price history is empty"));
        }

        for pair in points.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(RiskError::data_insufficient(
                    &asset,
                    format!(
                        "dates must be strictly ascending ({} follows {})",
                        pair[1].date, pair[0].date
                    ),
                ));
            }
        }

        if let Some(bad) = points.iter().find(|p| !p.close.is_finite() || p.close <= 0.0) {
            return Err(RiskError::data_insufficient(
                &asset,
                format!("invalid close {} on {}", bad.close, bad.date),
            ));
        }

        Ok(Self { asset, points })
    }

    /// Build a history of consecutive calendar days starting at `start`.
    pub fn from_closes(
        asset: impl Into<String>,
        start: NaiveDate,
        closes: &[f64],
    ) -> Result<Self, RiskError> {
        let points = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PricePoint::new(start + Duration::days(i as i64), close))
            .collect();
        Self::new(asset, points)
    }

    pub fn asset(&self) -> &str {
        &self.asset
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false; an empty history cannot be constructed.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    /// Most recent observation.
    pub fn latest(&self) -> &PricePoint {
        // Non-empty by construction.
        &self.points[self.points.len() - 1]
    }

    /// The last `n` observations (or all of them if fewer exist).
    pub fn tail(&self, n: usize) -> &[PricePoint] {
        let start = self.points.len().saturating_sub(n);
        &self.points[start..]
    }

    /// Highest close among the last `n` observations, earliest date on ties.
    pub fn max_close_in_tail(&self, n: usize) -> &PricePoint {
        let tail = self.tail(n.max(1));
        let mut best = &tail[0];
        for point in &tail[1..] {
            if point.close > best.close {
                best = point;
            }
        }
        best
    }

    /// History restricted to observations on or before `date`.
    ///
    /// Returns `None` when no observation is that old.
    pub fn truncated_to(&self, date: NaiveDate) -> Option<Self> {
        let end = self.points.partition_point(|p| p.date <= date);
        if end == 0 {
            return None;
        }
        Some(Self {
            asset: self.asset.clone(),
            points: self.points[..end].to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_rejects_empty_history() {
        let err = PriceHistory::new("BTC-USD", vec![]).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_rejects_duplicate_and_unordered_dates() {
        let dup = vec![PricePoint::new(day(1), 1.0), PricePoint::new(day(1), 2.0)];
        assert!(PriceHistory::new("X", dup).is_err());

        let unordered = vec![PricePoint::new(day(2), 1.0), PricePoint::new(day(1), 2.0)];
        assert!(PriceHistory::new("X", unordered).is_err());
    }

    #[test]
    fn test_rejects_non_positive_close() {
        let points = vec![PricePoint::new(day(1), 1.0), PricePoint::new(day(2), 0.0)];
        assert!(PriceHistory::new("X", points).is_err());

        let nan = vec![PricePoint::new(day(1), f64::NAN)];
        assert!(PriceHistory::new("X", nan).is_err());
    }

    #[test]
    fn test_max_close_in_tail_prefers_earliest_tie() {
        let history =
            PriceHistory::from_closes("X", day(1), &[5.0, 9.0, 3.0, 9.0, 4.0]).unwrap();
        let high = history.max_close_in_tail(5);
        assert_eq!(high.date, day(2));

        // Window that excludes the first peak
        let high = history.max_close_in_tail(3);
        assert_eq!(high.date, day(4));
    }

    #[test]
    fn test_truncated_to() {
        let history = PriceHistory::from_closes("X", day(2), &[1.0, 2.0, 3.0]).unwrap();
        assert!(history.truncated_to(day(1)).is_none());

        let cut = history.truncated_to(day(3)).unwrap();
        assert_eq!(cut.len(), 2);
        assert_eq!(cut.latest().close, 2.0);
    }
}
