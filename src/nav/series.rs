//! Per-fund NAV series with binary-search date resolution
//!
//! Series are sparse: weekends, market holidays, and declaration gaps leave
//! holes, so planned transaction dates are resolved to actual tradable dates
//! with `next_on_or_after` / `latest_on_or_before`. Absence is an explicit
//! `None`, never a panic; callers decide whether absence is fatal.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{EngineError, Result};

/// A single (date, NAV) observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NavPoint {
    pub date: NaiveDate,
    pub nav: f64,
}

impl NavPoint {
    pub fn new(date: NaiveDate, nav: f64) -> Self {
        Self { date, nav }
    }
}

/// Validated NAV series for one fund, strictly ascending by date
///
/// Construction enforces the invariants the resolver relies on; the engine
/// never sorts implicitly, so out-of-order input is a construction error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavSeries {
    points: Vec<NavPoint>,
}

impl NavSeries {
    /// Build a series from observations, validating non-emptiness, strictly
    /// ascending dates, and positive NAVs.
    pub fn from_points(points: Vec<NavPoint>) -> Result<Self> {
        if points.is_empty() {
            return Err(EngineError::EmptySeries);
        }
        for (i, point) in points.iter().enumerate() {
            if point.nav <= 0.0 || !point.nav.is_finite() {
                return Err(EngineError::NonPositiveNav {
                    nav: point.nav,
                    index: i,
                });
            }
            if i > 0 && points[i - 1].date >= point.date {
                return Err(EngineError::UnsortedSeries { index: i });
            }
        }
        Ok(Self { points })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[NavPoint] {
        &self.points
    }

    /// Earliest observation (the series is never empty by construction)
    pub fn first(&self) -> &NavPoint {
        &self.points[0]
    }

    /// Latest observation
    pub fn last(&self) -> &NavPoint {
        &self.points[self.points.len() - 1]
    }

    /// First entry with date >= target, or None when the series ends earlier.
    /// Converts a planned transaction date into the next tradable date.
    pub fn next_on_or_after(&self, date: NaiveDate) -> Option<&NavPoint> {
        let idx = self.points.partition_point(|p| p.date < date);
        self.points.get(idx)
    }

    /// Last entry with date <= target, or None when the series starts later.
    /// Used for valuations at a requested date.
    pub fn latest_on_or_before(&self, date: NaiveDate) -> Option<&NavPoint> {
        let idx = self.points.partition_point(|p| p.date <= date);
        idx.checked_sub(1).map(|i| &self.points[i])
    }
}

/// NAV histories for a bucket, keyed by scheme code
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NavHistory {
    series: HashMap<u32, NavSeries>,
}

impl NavHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, scheme_code: u32, series: NavSeries) {
        self.series.insert(scheme_code, series);
    }

    pub fn get(&self, scheme_code: u32) -> Option<&NavSeries> {
        self.series.get(&scheme_code)
    }

    /// Series for a selected fund. A selected fund without history is fatal
    /// to the whole run; downstream aggregates would otherwise misrepresent
    /// the portfolio.
    pub fn series(&self, scheme_code: u32) -> Result<&NavSeries> {
        self.series
            .get(&scheme_code)
            .ok_or(EngineError::MissingNavHistory { scheme_code })
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn scheme_codes(&self) -> impl Iterator<Item = u32> + '_ {
        self.series.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Weekday-only series for Jan 2024, skipping Jan 26 (market holiday)
    fn sparse_series() -> NavSeries {
        let points = vec![
            NavPoint::new(date(2024, 1, 22), 100.0),
            NavPoint::new(date(2024, 1, 23), 100.5),
            NavPoint::new(date(2024, 1, 24), 101.2),
            NavPoint::new(date(2024, 1, 25), 100.9),
            // Jan 26: Republic Day; Jan 27-28: weekend
            NavPoint::new(date(2024, 1, 29), 101.8),
            NavPoint::new(date(2024, 1, 30), 102.1),
        ];
        NavSeries::from_points(points).unwrap()
    }

    #[test]
    fn test_next_on_or_after_exact_and_gap() {
        let series = sparse_series();

        let exact = series.next_on_or_after(date(2024, 1, 24)).unwrap();
        assert_eq!(exact.date, date(2024, 1, 24));

        // Planned on the holiday resolves to the next trading day
        let resolved = series.next_on_or_after(date(2024, 1, 26)).unwrap();
        assert_eq!(resolved.date, date(2024, 1, 29));

        // Before the series starts resolves to the first point
        let first = series.next_on_or_after(date(2024, 1, 1)).unwrap();
        assert_eq!(first.date, date(2024, 1, 22));

        // After the series ends: not found
        assert!(series.next_on_or_after(date(2024, 1, 31)).is_none());
    }

    #[test]
    fn test_latest_on_or_before_exact_and_gap() {
        let series = sparse_series();

        let exact = series.latest_on_or_before(date(2024, 1, 25)).unwrap();
        assert_eq!(exact.date, date(2024, 1, 25));

        // Valuation over the weekend uses the last traded NAV
        let resolved = series.latest_on_or_before(date(2024, 1, 28)).unwrap();
        assert_eq!(resolved.date, date(2024, 1, 25));

        let last = series.latest_on_or_before(date(2024, 2, 15)).unwrap();
        assert_eq!(last.date, date(2024, 1, 30));

        // Before the series starts: not found
        assert!(series.latest_on_or_before(date(2024, 1, 21)).is_none());
    }

    #[test]
    fn test_resolution_contract_over_all_dates() {
        let series = sparse_series();

        // For every probe date, next_on_or_after returns an entry with
        // date >= probe or nothing; symmetric for latest_on_or_before.
        let mut probe = date(2024, 1, 15);
        while probe <= date(2024, 2, 5) {
            if let Some(p) = series.next_on_or_after(probe) {
                assert!(p.date >= probe);
            } else {
                assert!(series.last().date < probe);
            }
            if let Some(p) = series.latest_on_or_before(probe) {
                assert!(p.date <= probe);
            } else {
                assert!(series.first().date > probe);
            }
            probe = probe.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_construction_rejects_bad_input() {
        assert!(matches!(
            NavSeries::from_points(vec![]),
            Err(EngineError::EmptySeries)
        ));

        let unsorted = vec![
            NavPoint::new(date(2024, 1, 2), 10.0),
            NavPoint::new(date(2024, 1, 1), 11.0),
        ];
        assert!(matches!(
            NavSeries::from_points(unsorted),
            Err(EngineError::UnsortedSeries { index: 1 })
        ));

        let duplicate = vec![
            NavPoint::new(date(2024, 1, 1), 10.0),
            NavPoint::new(date(2024, 1, 1), 10.0),
        ];
        assert!(matches!(
            NavSeries::from_points(duplicate),
            Err(EngineError::UnsortedSeries { index: 1 })
        ));

        let non_positive = vec![
            NavPoint::new(date(2024, 1, 1), 10.0),
            NavPoint::new(date(2024, 1, 2), 0.0),
        ];
        assert!(matches!(
            NavSeries::from_points(non_positive),
            Err(EngineError::NonPositiveNav { index: 1, .. })
        ));
    }

    #[test]
    fn test_history_missing_fund_is_fatal() {
        let mut history = NavHistory::new();
        history.insert(118550, sparse_series());

        assert!(history.series(118550).is_ok());
        assert!(matches!(
            history.series(999999),
            Err(EngineError::MissingNavHistory { scheme_code: 999999 })
        ));
    }
}
