//! Two-point compound annual growth rate

use chrono::NaiveDate;

/// Days per year for all calendar year fractions (CAGR elapsed years and
/// XIRR exponents share this day count)
pub const DAYS_PER_YEAR: f64 = 365.25;

/// CAGR between two values over `years`, in percent.
///
/// Degenerate inputs (non-positive values or years) return 0 rather than an
/// error: callers render that as "not yet computable" without branching.
pub fn cagr(begin_value: f64, end_value: f64, years: f64) -> f64 {
    if begin_value <= 0.0 || end_value <= 0.0 || years <= 0.0 {
        return 0.0;
    }
    ((end_value / begin_value).powf(1.0 / years) - 1.0) * 100.0
}

/// Calendar year fraction between two dates
pub fn years_between(start: NaiveDate, end: NaiveDate) -> f64 {
    (end - start).num_days() as f64 / DAYS_PER_YEAR
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_flat_value_is_zero_growth() {
        for v in [0.01, 1.0, 57.3, 1_000_000.0] {
            for years in [0.1, 1.0, 3.0, 25.0] {
                assert_eq!(cagr(v, v, years), 0.0);
            }
        }
    }

    #[test]
    fn test_doubling_in_two_years() {
        let rate = cagr(100.0, 200.0, 2.0);
        // 2^(1/2) - 1 = 41.4214%
        assert!((rate - 41.4214).abs() < 1e-3, "got {}", rate);
    }

    #[test]
    fn test_decline_is_negative() {
        let rate = cagr(100.0, 50.0, 1.0);
        assert!((rate - -50.0).abs() < 1e-9, "got {}", rate);
    }

    #[test]
    fn test_degenerate_inputs_return_zero() {
        assert_eq!(cagr(0.0, 100.0, 1.0), 0.0);
        assert_eq!(cagr(-5.0, 100.0, 1.0), 0.0);
        assert_eq!(cagr(100.0, 0.0, 1.0), 0.0);
        assert_eq!(cagr(100.0, 120.0, 0.0), 0.0);
        assert_eq!(cagr(100.0, 120.0, -2.0), 0.0);
    }

    #[test]
    fn test_years_between_uses_calendar_day_count() {
        let years = years_between(date(2020, 1, 1), date(2023, 1, 1));
        // 1096 days across a leap year
        assert!((years - 1096.0 / 365.25).abs() < 1e-12);

        assert_eq!(years_between(date(2020, 1, 1), date(2020, 1, 1)), 0.0);
        assert!(years_between(date(2020, 6, 1), date(2020, 1, 1)) < 0.0);
    }
}
