//! Deterministic synthetic NAV histories
//!
//! Used by the demo binary and integration-style tests when no CSV data is
//! wired up. Paths are seeded by scheme code and shaped by risk category
//! (drift and wobble amplitude), with weekend gaps and periodic pseudo
//! holidays so date resolution is exercised the way real histories would.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::fund::{Fund, RiskCategory};
use super::{NavHistory, NavPoint, NavSeries};

/// Annual drift and wobble amplitude per risk category
fn path_profile(category: RiskCategory) -> (f64, f64) {
    match category {
        RiskCategory::Liquid => (0.055, 0.002),
        RiskCategory::Debt => (0.070, 0.015),
        RiskCategory::Hybrid => (0.090, 0.060),
        RiskCategory::EquityLarge => (0.120, 0.140),
        RiskCategory::EquityMid => (0.140, 0.180),
        RiskCategory::EquitySmall => (0.160, 0.220),
    }
}

fn is_trading_day(date: NaiveDate) -> bool {
    if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
        return false;
    }
    // Every 37th day of the year is a pseudo market holiday
    date.ordinal() % 37 != 0
}

/// Generate a deterministic NAV path for one fund between two dates.
/// The same inputs always produce the same series.
pub fn synthetic_series(
    scheme_code: u32,
    category: RiskCategory,
    start: NaiveDate,
    end: NaiveDate,
) -> NavSeries {
    let (drift, amplitude) = path_profile(category);
    let daily_drift = drift / 252.0;
    let daily_amplitude = amplitude / (252.0_f64).sqrt();
    let seed = f64::from(scheme_code % 977) * 0.137;

    let mut points = Vec::new();
    let mut nav = 25.0 + f64::from(scheme_code % 173);
    let mut day_index = 0u32;
    let mut date = start;

    while date <= end {
        if is_trading_day(date) {
            let t = f64::from(day_index);
            // Two incommensurate frequencies give a wobble with near-zero
            // long-run mean while staying small enough to keep nav > 0
            let wobble = 0.7 * (t * 0.83 + seed).sin() + 0.5 * (t * 0.312 + seed * 2.0).cos();
            nav *= 1.0 + daily_drift + daily_amplitude * wobble * 0.6;
            points.push(NavPoint::new(date, nav));
            day_index += 1;
        }
        date += Duration::days(1);
    }

    // Generated points are ascending and positive by construction
    NavSeries::from_points(points).expect("synthetic series must be valid")
}

/// Generate a history covering every fund in a bucket. Funds without a risk
/// category fall back to a hybrid-shaped path.
pub fn synthetic_history(funds: &[Fund], start: NaiveDate, end: NaiveDate) -> NavHistory {
    let mut history = NavHistory::new();
    for fund in funds {
        let category = fund.risk_category.unwrap_or(RiskCategory::Hybrid);
        history.insert(
            fund.scheme_code,
            synthetic_series(fund.scheme_code, category, start, end),
        );
    }
    history
}

/// A ready-made three-fund bucket with ~11.5 years of history, used by the
/// demo binary and the report binaries when no CSV paths are configured.
pub fn demo_bucket() -> (Vec<Fund>, NavHistory) {
    let inception = NaiveDate::from_ymd_opt(2014, 1, 1).expect("valid date");
    let funds = vec![
        Fund::new(118550, "Bluechip Growth Fund", 50.0, inception)
            .with_risk_category(RiskCategory::EquityLarge),
        Fund::new(120503, "Balanced Advantage Fund", 30.0, inception)
            .with_risk_category(RiskCategory::Hybrid),
        Fund::new(119091, "Short Duration Debt Fund", 20.0, inception)
            .with_risk_category(RiskCategory::Debt),
    ];
    let end = NaiveDate::from_ymd_opt(2025, 6, 30).expect("valid date");
    let history = synthetic_history(&funds, inception, end);
    (funds, history)
}
