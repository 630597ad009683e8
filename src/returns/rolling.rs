//! Rolling-return analysis over fixed-length windows
//!
//! Slides a window over a NAV series and annualizes the return of every
//! window whose end observation lands within a tolerance band of the target
//! end date. A series too young to span even one window yields a first-class
//! `Insufficient` outcome, not an error.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::nav::NavSeries;
use super::cagr::{cagr, years_between};
use super::stats;

/// Tolerance around the window end date when matching an actual observation
const END_TOLERANCE_DAYS: i64 = 30;

/// Supported rolling window lengths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RollingWindow {
    OneYear,
    ThreeYear,
}

impl RollingWindow {
    pub fn days(&self) -> i64 {
        match self {
            RollingWindow::OneYear => 365,
            RollingWindow::ThreeYear => 1095,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RollingWindow::OneYear => "1-year",
            RollingWindow::ThreeYear => "3-year",
        }
    }
}

/// One computed window: start observation date and annualized return (percent)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RollingPoint {
    pub start: NaiveDate,
    pub annualized_pct: f64,
}

/// Distribution statistics over every computed window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollingStats {
    pub window: RollingWindow,
    /// Ordered (start date, annualized return) points; bucket-level
    /// combination consumes these rather than the summary figures
    pub points: Vec<RollingPoint>,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    /// Percent of windows with return strictly above zero
    pub positive_pct: f64,
}

/// Outcome of a rolling analysis. Young funds routinely lack a full window,
/// so insufficiency is an expected state callers branch on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RollingOutcome {
    Computed(RollingStats),
    Insufficient,
}

impl RollingOutcome {
    pub fn is_insufficient(&self) -> bool {
        matches!(self, RollingOutcome::Insufficient)
    }

    pub fn stats(&self) -> Option<&RollingStats> {
        match self {
            RollingOutcome::Computed(stats) => Some(stats),
            RollingOutcome::Insufficient => None,
        }
    }
}

/// Derive distribution statistics from computed window points
pub(crate) fn stats_from_points(window: RollingWindow, points: Vec<RollingPoint>) -> RollingOutcome {
    if points.is_empty() {
        return RollingOutcome::Insufficient;
    }
    let returns: Vec<f64> = points.iter().map(|p| p.annualized_pct).collect();
    RollingOutcome::Computed(RollingStats {
        window,
        mean: stats::mean(&returns).unwrap_or(0.0),
        median: stats::median(&returns).unwrap_or(0.0),
        // A single window has no spread
        std_dev: stats::std_dev(&returns).unwrap_or(0.0),
        min: stats::min(&returns).unwrap_or(0.0),
        max: stats::max(&returns).unwrap_or(0.0),
        positive_pct: stats::positive_share(&returns).unwrap_or(0.0),
        points,
    })
}

/// Roll a window over the series: for every observation, annualize the
/// return to the closest observation within ±30 days of the target end
/// date, skipping start points with no end observation in the band.
pub fn rolling_returns(series: &NavSeries, window: RollingWindow) -> RollingOutcome {
    let mut points = Vec::new();

    for start in series.points() {
        let target = start.date + Duration::days(window.days());
        let Some(end) = series.latest_on_or_before(target + Duration::days(END_TOLERANCE_DAYS))
        else {
            continue;
        };
        if (end.date - target).num_days().abs() > END_TOLERANCE_DAYS || end.date <= start.date {
            continue;
        }

        let years = years_between(start.date, end.date);
        points.push(RollingPoint {
            start: start.date,
            annualized_pct: cagr(start.nav, end.nav, years),
        });
    }

    stats_from_points(window, points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::NavPoint;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Weekly observations compounding at a steady weekly rate
    fn steady_series(weeks: usize, weekly_growth: f64) -> NavSeries {
        let start = date(2018, 1, 1);
        let mut nav = 100.0;
        let mut points = Vec::new();
        for w in 0..weeks {
            points.push(NavPoint::new(start + Duration::days(7 * w as i64), nav));
            nav *= 1.0 + weekly_growth;
        }
        NavSeries::from_points(points).unwrap()
    }

    #[test]
    fn test_short_series_is_insufficient_for_any_window() {
        // Six months of data cannot span a 1-year window even with tolerance
        let series = steady_series(26, 0.002);
        assert!(rolling_returns(&series, RollingWindow::OneYear).is_insufficient());
        assert!(rolling_returns(&series, RollingWindow::ThreeYear).is_insufficient());
    }

    #[test]
    fn test_one_year_windows_on_steady_growth() {
        // Three years of weekly data: plenty of 1-year windows
        let series = steady_series(156, 0.002);
        let outcome = rolling_returns(&series, RollingWindow::OneYear);
        let stats = outcome.stats().expect("computed");

        assert!(!stats.points.is_empty());
        // 0.2% weekly compounds to ~11% a year; every window sees the same rate
        assert!((stats.mean - 11.0).abs() < 1.0, "mean {}", stats.mean);
        assert!(stats.std_dev < 0.2);
        assert_eq!(stats.positive_pct, 100.0);
        assert!((stats.median - stats.mean).abs() < 0.5);

        // Start dates are emitted in series order
        for pair in stats.points.windows(2) {
            assert!(pair[0].start < pair[1].start);
        }
    }

    #[test]
    fn test_three_year_window_needs_three_years() {
        let series = steady_series(156, 0.002); // barely under 3 years
        let outcome = rolling_returns(&series, RollingWindow::ThreeYear);
        // length is 155 weeks = 1085 days; 1095 target misses by 10 days,
        // inside the band, so exactly the earliest starts qualify
        match outcome {
            RollingOutcome::Computed(stats) => {
                assert!(stats.points.len() < 5);
            }
            RollingOutcome::Insufficient => panic!("1085-day span is within the band"),
        }
    }

    #[test]
    fn test_flat_series_has_zero_positive_share() {
        let start = date(2019, 1, 1);
        let points: Vec<NavPoint> = (0..160)
            .map(|w| NavPoint::new(start + Duration::days(7 * w), 42.0))
            .collect();
        let series = NavSeries::from_points(points).unwrap();

        let stats = rolling_returns(&series, RollingWindow::OneYear)
            .stats()
            .cloned()
            .expect("computed");
        assert_eq!(stats.mean, 0.0);
        // Flat returns are not strictly positive
        assert_eq!(stats.positive_pct, 0.0);
        assert_eq!(stats.min, 0.0);
        assert_eq!(stats.max, 0.0);
    }

    #[test]
    fn test_end_tolerance_band_is_exact() {
        // Two observations 365 + 31 days apart: outside the band
        let outside = NavSeries::from_points(vec![
            NavPoint::new(date(2020, 1, 1), 100.0),
            NavPoint::new(date(2020, 1, 1) + Duration::days(396), 110.0),
        ])
        .unwrap();
        assert!(rolling_returns(&outside, RollingWindow::OneYear).is_insufficient());

        // 365 + 30 days: exactly on the band edge, admitted
        let edge = NavSeries::from_points(vec![
            NavPoint::new(date(2020, 1, 1), 100.0),
            NavPoint::new(date(2020, 1, 1) + Duration::days(395), 110.0),
        ])
        .unwrap();
        let outcome = rolling_returns(&edge, RollingWindow::OneYear);
        assert!(!outcome.is_insufficient());

        // Early end inside the band too: 365 - 30
        let early = NavSeries::from_points(vec![
            NavPoint::new(date(2020, 1, 1), 100.0),
            NavPoint::new(date(2020, 1, 1) + Duration::days(335), 110.0),
        ])
        .unwrap();
        assert!(!rolling_returns(&early, RollingWindow::OneYear).is_insufficient());
    }

    #[test]
    fn test_annualization_uses_actual_window_span() {
        // One window, 10% over exactly 365 days
        let series = NavSeries::from_points(vec![
            NavPoint::new(date(2020, 1, 1), 100.0),
            NavPoint::new(date(2020, 12, 31), 110.0),
        ])
        .unwrap();
        let stats = rolling_returns(&series, RollingWindow::OneYear)
            .stats()
            .cloned()
            .expect("computed");
        let expected = ((1.1_f64).powf(365.25 / 365.0) - 1.0) * 100.0;
        assert!((stats.mean - expected).abs() < 1e-9);
    }
}
