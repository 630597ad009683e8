//! Descriptive statistics over return distributions and value timelines

use crate::nav::NavSeries;

/// Trading days per year, used to annualize daily volatility
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Sample standard deviation (n - 1); None for fewer than two values
pub fn std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let variance =
        values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

pub fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

/// Percent of values strictly greater than zero
pub fn positive_share(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let positives = values.iter().filter(|v| **v > 0.0).count();
    Some(positives as f64 / values.len() as f64 * 100.0)
}

/// Day-over-day simple returns of a NAV path
pub fn daily_returns(navs: &[f64]) -> Vec<f64> {
    navs.windows(2).map(|w| w[1] / w[0] - 1.0).collect()
}

/// Annualized volatility of a NAV series, in percent: sample standard
/// deviation of daily simple returns scaled by sqrt(252). None for series
/// too short to produce two returns.
pub fn annualized_volatility(series: &NavSeries) -> Option<f64> {
    let navs: Vec<f64> = series.points().iter().map(|p| p.nav).collect();
    let returns = daily_returns(&navs);
    let sd = std_dev(&returns)?;
    Some(sd * TRADING_DAYS_PER_YEAR.sqrt() * 100.0)
}

/// Largest peak-to-trough percentage decline of a value timeline.
/// Returns a non-negative percentage; 0 for monotone or short inputs.
pub fn max_drawdown(values: &[f64]) -> f64 {
    let mut peak = f64::MIN;
    let mut worst = 0.0_f64;

    for &value in values {
        if value > peak {
            peak = value;
        }
        if peak > 0.0 {
            let drawdown = (peak - value) / peak * 100.0;
            if drawdown > worst {
                worst = drawdown;
            }
        }
    }

    worst
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::NavPoint;
    use chrono::NaiveDate;

    fn series_from(navs: &[f64]) -> NavSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let points = navs
            .iter()
            .enumerate()
            .map(|(i, &nav)| NavPoint::new(start + chrono::Duration::days(i as i64), nav))
            .collect();
        NavSeries::from_points(points).unwrap()
    }

    #[test]
    fn test_central_moments() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((mean(&values).unwrap() - 5.0).abs() < 1e-12);
        assert!((median(&values).unwrap() - 4.5).abs() < 1e-12);
        // Sample std dev of this classic set is ~2.138
        assert!((std_dev(&values).unwrap() - 2.13809).abs() < 1e-4);
        assert_eq!(min(&values), Some(2.0));
        assert_eq!(max(&values), Some(9.0));
    }

    #[test]
    fn test_empty_and_short_inputs() {
        assert_eq!(mean(&[]), None);
        assert_eq!(median(&[]), None);
        assert_eq!(std_dev(&[]), None);
        assert_eq!(std_dev(&[1.0]), None);
        assert_eq!(min(&[]), None);
        assert_eq!(positive_share(&[]), None);
        assert_eq!(median(&[3.0]), Some(3.0));
    }

    #[test]
    fn test_positive_share() {
        let values = [1.0, -2.0, 3.0, 0.0];
        assert!((positive_share(&values).unwrap() - 50.0).abs() < 1e-12);
    }

    #[test]
    fn test_daily_returns() {
        let returns = daily_returns(&[100.0, 110.0, 99.0]);
        assert_eq!(returns.len(), 2);
        assert!((returns[0] - 0.10).abs() < 1e-12);
        assert!((returns[1] - -0.10).abs() < 1e-12);
    }

    #[test]
    fn test_flat_series_has_zero_volatility() {
        let series = series_from(&[50.0, 50.0, 50.0, 50.0]);
        let vol = annualized_volatility(&series).unwrap();
        assert!(vol.abs() < 1e-12);
    }

    #[test]
    fn test_volatility_needs_three_points() {
        let series = series_from(&[50.0, 51.0]);
        assert_eq!(annualized_volatility(&series), None);

        let series = series_from(&[50.0, 51.0, 50.5]);
        assert!(annualized_volatility(&series).is_some());
    }

    #[test]
    fn test_max_drawdown_peak_to_trough() {
        // Peak 120, trough 84: 30% decline, worse than the later 10% dip
        let values = [100.0, 120.0, 102.0, 84.0, 110.0, 99.0];
        let dd = max_drawdown(&values);
        assert!((dd - 30.0).abs() < 1e-9, "got {}", dd);
    }

    #[test]
    fn test_max_drawdown_monotone_is_zero() {
        assert_eq!(max_drawdown(&[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(max_drawdown(&[]), 0.0);
        assert_eq!(max_drawdown(&[5.0]), 0.0);
    }
}
