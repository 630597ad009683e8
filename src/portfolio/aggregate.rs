//! Weighted bucket aggregation
//!
//! Young funds routinely lack the history for a metric, so per-fund figures
//! arrive as options. Aggregation skips absent values and renormalizes the
//! weights that did contribute; a missing fund never drags an average
//! toward zero.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{EngineError, Result};
use crate::returns::{stats_from_points, RollingOutcome, RollingPoint, RollingWindow};

/// Per-fund historical metrics feeding bucket aggregation
#[derive(Debug, Clone, Serialize)]
pub struct FundMetrics {
    pub scheme_code: u32,
    pub name: String,
    pub weight_pct: f64,
    /// First-to-latest annualized growth of the NAV series
    pub cagr_pct: Option<f64>,
    /// Annualized standard deviation of daily returns
    pub volatility_pct: Option<f64>,
    pub xirr_pct: Option<f64>,
}

/// Weighted metrics over the whole bucket
#[derive(Debug, Clone, Serialize)]
pub struct BucketMetrics {
    pub cagr_pct: Option<f64>,
    pub volatility_pct: Option<f64>,
    pub xirr_pct: Option<f64>,
    /// Weighted CAGR divided by the risk factor
    pub safe_withdrawal_rate_annual_pct: Option<f64>,
}

/// Weighted mean over (weight, value) pairs. Absent values are excluded
/// together with their weights; `None` when nothing contributes.
pub fn weighted_average(pairs: &[(f64, Option<f64>)]) -> Option<f64> {
    let mut acc = 0.0;
    let mut weight_sum = 0.0;
    for (weight, value) in pairs {
        if let Some(v) = value {
            acc += weight * v;
            weight_sum += weight;
        }
    }
    if weight_sum > 0.0 {
        Some(acc / weight_sum)
    } else {
        None
    }
}

/// Aggregate per-fund metrics into bucket metrics, deriving the safe
/// withdrawal rate from the weighted CAGR and the given risk factor
pub fn bucket_metrics(funds: &[FundMetrics], risk_factor: f64) -> Result<BucketMetrics> {
    if risk_factor <= 0.0 || !risk_factor.is_finite() {
        return Err(EngineError::NonPositiveRiskFactor {
            factor: risk_factor,
        });
    }

    let cagr_pairs: Vec<(f64, Option<f64>)> =
        funds.iter().map(|f| (f.weight_pct, f.cagr_pct)).collect();
    let vol_pairs: Vec<(f64, Option<f64>)> = funds
        .iter()
        .map(|f| (f.weight_pct, f.volatility_pct))
        .collect();
    let xirr_pairs: Vec<(f64, Option<f64>)> =
        funds.iter().map(|f| (f.weight_pct, f.xirr_pct)).collect();

    let cagr_pct = weighted_average(&cagr_pairs);
    Ok(BucketMetrics {
        cagr_pct,
        volatility_pct: weighted_average(&vol_pairs),
        xirr_pct: weighted_average(&xirr_pairs),
        safe_withdrawal_rate_annual_pct: cagr_pct.map(|c| c / risk_factor),
    })
}

/// Combine per-fund rolling outcomes into one bucket outcome.
///
/// For every window start date, the combined return is the weighted mean of
/// the funds that computed a window there, renormalized over the weights
/// that contributed; funds whose history misses a date simply sit that date
/// out. Insufficient when no fund computed anything.
pub fn combine_rolling(window: RollingWindow, parts: &[(f64, &RollingOutcome)]) -> RollingOutcome {
    let mut by_start: BTreeMap<NaiveDate, (f64, f64)> = BTreeMap::new();
    for (weight, outcome) in parts {
        let Some(stats) = outcome.stats() else {
            continue;
        };
        for point in &stats.points {
            let slot = by_start.entry(point.start).or_insert((0.0, 0.0));
            slot.0 += weight * point.annualized_pct;
            slot.1 += weight;
        }
    }

    let points: Vec<RollingPoint> = by_start
        .into_iter()
        .filter(|&(_, (_, weight_sum))| weight_sum > 0.0)
        .map(|(start, (acc, weight_sum))| RollingPoint {
            start,
            annualized_pct: acc / weight_sum,
        })
        .collect();
    stats_from_points(window, points)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn metrics(weight_pct: f64, cagr: Option<f64>, vol: Option<f64>) -> FundMetrics {
        FundMetrics {
            scheme_code: 0,
            name: String::new(),
            weight_pct,
            cagr_pct: cagr,
            volatility_pct: vol,
            xirr_pct: None,
        }
    }

    #[test]
    fn test_weighted_average_renormalizes_over_present_values() {
        let full = [(60.0, Some(10.0)), (40.0, Some(20.0))];
        assert!((weighted_average(&full).unwrap() - 14.0).abs() < 1e-9);

        // A fund with no value drops out entirely instead of counting as 0
        let partial = [(50.0, Some(10.0)), (50.0, None)];
        assert!((weighted_average(&partial).unwrap() - 10.0).abs() < 1e-9);

        let none: [(f64, Option<f64>); 2] = [(50.0, None), (50.0, None)];
        assert!(weighted_average(&none).is_none());
    }

    #[test]
    fn test_bucket_metrics_weights_and_safe_rate() {
        let funds = vec![
            metrics(60.0, Some(15.0), Some(20.0)),
            metrics(40.0, Some(9.0), None),
        ];
        let bucket = bucket_metrics(&funds, 3.0).unwrap();

        assert!((bucket.cagr_pct.unwrap() - 12.6).abs() < 1e-9);
        assert!((bucket.volatility_pct.unwrap() - 20.0).abs() < 1e-9);
        assert!(bucket.xirr_pct.is_none());
        assert!((bucket.safe_withdrawal_rate_annual_pct.unwrap() - 4.2).abs() < 1e-9);
    }

    #[test]
    fn test_bucket_metrics_rejects_bad_risk_factor() {
        assert!(matches!(
            bucket_metrics(&[metrics(100.0, Some(10.0), None)], 0.0),
            Err(EngineError::NonPositiveRiskFactor { .. })
        ));
        assert!(matches!(
            bucket_metrics(&[metrics(100.0, Some(10.0), None)], -2.0),
            Err(EngineError::NonPositiveRiskFactor { .. })
        ));
    }

    #[test]
    fn test_combine_rolling_weights_per_start_date() {
        let window = RollingWindow::OneYear;
        let a = stats_from_points(
            window,
            vec![
                RollingPoint {
                    start: date(2023, 1, 1),
                    annualized_pct: 10.0,
                },
                RollingPoint {
                    start: date(2023, 1, 2),
                    annualized_pct: 12.0,
                },
            ],
        );
        let b = stats_from_points(
            window,
            vec![RollingPoint {
                start: date(2023, 1, 1),
                annualized_pct: 20.0,
            }],
        );

        let combined = combine_rolling(window, &[(50.0, &a), (50.0, &b)]);
        let stats = combined.stats().unwrap();

        // Jan 1 averages both funds; Jan 2 renormalizes to the only fund
        // with a window there
        assert_eq!(stats.points.len(), 2);
        assert!((stats.points[0].annualized_pct - 15.0).abs() < 1e-9);
        assert!((stats.points[1].annualized_pct - 12.0).abs() < 1e-9);
        assert!((stats.mean - 13.5).abs() < 1e-9);
    }

    #[test]
    fn test_combine_rolling_skips_insufficient_funds() {
        let window = RollingWindow::ThreeYear;
        let computed = stats_from_points(
            window,
            vec![RollingPoint {
                start: date(2023, 1, 1),
                annualized_pct: 8.0,
            }],
        );

        let combined = combine_rolling(
            window,
            &[(70.0, &computed), (30.0, &RollingOutcome::Insufficient)],
        );
        let stats = combined.stats().unwrap();
        assert_eq!(stats.points.len(), 1);
        assert!((stats.points[0].annualized_pct - 8.0).abs() < 1e-9);

        let empty = combine_rolling(
            window,
            &[
                (70.0, &RollingOutcome::Insufficient),
                (30.0, &RollingOutcome::Insufficient),
            ],
        );
        assert!(empty.is_insufficient());
    }
}
