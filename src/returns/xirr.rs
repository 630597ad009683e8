//! Money-weighted annualized return for irregular cash flows
//!
//! Solves for the annual rate r with sum(amount_i / (1+r)^(years_i)) = 0,
//! years measured from the earliest flow at 365.25 days per year. Failure to
//! converge is a normal outcome (young funds, one-sided flows), reported as
//! `None` and logged for diagnostics, never raised.

use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};

use super::cagr::DAYS_PER_YEAR;

/// A dated, signed cash flow: negative = money in (purchase), positive =
/// money out (redemption or terminal value)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CashFlow {
    pub date: NaiveDate,
    pub amount: f64,
}

impl CashFlow {
    pub fn new(date: NaiveDate, amount: f64) -> Self {
        Self { date, amount }
    }
}

const TOLERANCE: f64 = 1e-7;
const MAX_ITERATIONS: u32 = 100;
const BISECTION_ITERATIONS: u32 = 200;
// Rate bounds: a fund cannot lose more than everything or plausibly
// compound past 10000% a year
const RATE_FLOOR: f64 = -0.9999;
const RATE_CEIL: f64 = 100.0;

/// XIRR of a cash-flow sequence, in percent.
///
/// Newton-Raphson from a 10% guess with a bisection fallback. Returns `None`
/// when preconditions fail (fewer than two flows, or no sign change) or when
/// no root is found within the iteration cap.
pub fn xirr(flows: &[CashFlow]) -> Option<f64> {
    if flows.len() < 2 {
        return None;
    }
    let has_negative = flows.iter().any(|f| f.amount < -1e-10);
    let has_positive = flows.iter().any(|f| f.amount > 1e-10);
    if !has_negative || !has_positive {
        return None;
    }

    let t0 = flows.iter().map(|f| f.date).min()?;
    let years: Vec<f64> = flows
        .iter()
        .map(|f| (f.date - t0).num_days() as f64 / DAYS_PER_YEAR)
        .collect();
    let amounts: Vec<f64> = flows.iter().map(|f| f.amount).collect();
    // Residual tolerance scaled to the flow magnitudes
    let residual_tolerance = 1e-6 * amounts.iter().map(|a| a.abs()).sum::<f64>();

    let mut rate = 0.1;
    for _ in 0..MAX_ITERATIONS {
        let (npv, dnpv) = npv_and_derivative(&amounts, &years, rate);

        if dnpv.abs() < 1e-12 {
            debug!("xirr: derivative vanished at rate {rate}, falling back to bisection");
            return bisection(&amounts, &years, residual_tolerance);
        }

        let next = (rate - npv / dnpv).clamp(RATE_FLOOR, RATE_CEIL);

        if (next - rate).abs() < TOLERANCE {
            let (residual, _) = npv_and_derivative(&amounts, &years, next);
            if residual.abs() <= residual_tolerance {
                return Some(next * 100.0);
            }
            // Stalled against a clamp without an actual root nearby
            debug!("xirr: Newton-Raphson stalled at rate {next}, falling back to bisection");
            return bisection(&amounts, &years, residual_tolerance);
        }

        rate = next;
    }

    debug!("xirr: Newton-Raphson did not converge, falling back to bisection");
    bisection(&amounts, &years, residual_tolerance)
}

/// NPV and its derivative with respect to the annual rate
fn npv_and_derivative(amounts: &[f64], years: &[f64], rate: f64) -> (f64, f64) {
    let base = 1.0 + rate;
    let mut npv = 0.0;
    let mut dnpv = 0.0;

    for (&amount, &t) in amounts.iter().zip(years) {
        let discount = base.powf(t);
        npv += amount / discount;
        dnpv -= t * amount / (discount * base);
    }

    (npv, dnpv)
}

fn npv_at_rate(amounts: &[f64], years: &[f64], rate: f64) -> f64 {
    let base = 1.0 + rate;
    amounts
        .iter()
        .zip(years)
        .map(|(&amount, &t)| amount / base.powf(t))
        .sum()
}

/// Fallback root search over the full rate bracket
fn bisection(amounts: &[f64], years: &[f64], residual_tolerance: f64) -> Option<f64> {
    let mut low = RATE_FLOOR;
    let mut high = RATE_CEIL;

    let npv_low = npv_at_rate(amounts, years, low);
    let npv_high = npv_at_rate(amounts, years, high);

    if npv_low * npv_high > 0.0 {
        debug!("xirr: no sign change across the rate bracket, no solution");
        return None;
    }

    for _ in 0..BISECTION_ITERATIONS {
        let mid = (low + high) / 2.0;
        let npv_mid = npv_at_rate(amounts, years, mid);

        if npv_mid.abs() <= residual_tolerance || (high - low) / 2.0 < TOLERANCE {
            return Some(mid * 100.0);
        }

        if npv_mid * npv_at_rate(amounts, years, low) < 0.0 {
            high = mid;
        } else {
            low = mid;
        }
    }

    debug!("xirr: bisection did not converge");
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_two_flow_one_year() {
        // -100 at day 0, +121 at day 365. The exact root of the 365.25-day
        // discounting equation is (1.21)^(365.25/365) - 1, a hair over 21%.
        let flows = [
            CashFlow::new(date(2020, 1, 1), -100.0),
            CashFlow::new(date(2020, 12, 31), 121.0),
        ];
        let rate = xirr(&flows).expect("root exists");
        let expected = ((1.21_f64).powf(365.25 / 365.0) - 1.0) * 100.0;
        assert!((rate - expected).abs() < 1e-3, "got {}, want {}", rate, expected);
        assert!((rate - 21.0).abs() < 0.05);
    }

    #[test]
    fn test_break_even_flows() {
        // 12 monthly purchases of 100, redeemed for exactly 1200: rate 0
        let mut flows: Vec<CashFlow> = (0..12)
            .map(|m| CashFlow::new(date(2023, 1 + m, 1), -100.0))
            .collect();
        flows.push(CashFlow::new(date(2024, 1, 1), 1200.0));

        let rate = xirr(&flows).expect("root exists");
        assert!(rate.abs() < 1e-4, "got {}", rate);
    }

    #[test]
    fn test_loss_is_negative() {
        let flows = [
            CashFlow::new(date(2020, 1, 1), -100.0),
            CashFlow::new(date(2021, 1, 1), 60.0),
        ];
        let rate = xirr(&flows).expect("root exists");
        assert!(rate < -35.0 && rate > -45.0, "got {}", rate);
    }

    #[test]
    fn test_preconditions_return_none() {
        // Too few flows
        assert_eq!(xirr(&[CashFlow::new(date(2020, 1, 1), -100.0)]), None);
        assert_eq!(xirr(&[]), None);

        // No sign change: only purchases so far
        let one_sided = [
            CashFlow::new(date(2020, 1, 1), -100.0),
            CashFlow::new(date(2020, 2, 1), -100.0),
        ];
        assert_eq!(xirr(&one_sided), None);

        let all_inflows = [
            CashFlow::new(date(2020, 1, 1), 100.0),
            CashFlow::new(date(2020, 2, 1), 100.0),
        ];
        assert_eq!(xirr(&all_inflows), None);
    }

    #[test]
    fn test_unordered_flows_use_earliest_as_epoch() {
        let ordered = [
            CashFlow::new(date(2020, 1, 1), -100.0),
            CashFlow::new(date(2021, 1, 1), 110.0),
        ];
        let shuffled = [
            CashFlow::new(date(2021, 1, 1), 110.0),
            CashFlow::new(date(2020, 1, 1), -100.0),
        ];
        let a = xirr(&ordered).unwrap();
        let b = xirr(&shuffled).unwrap();
        assert!((a - b).abs() < 1e-9);
    }

    #[test]
    fn test_solution_zeroes_the_npv() {
        let flows = [
            CashFlow::new(date(2019, 3, 5), -5000.0),
            CashFlow::new(date(2019, 9, 17), -3000.0),
            CashFlow::new(date(2020, 2, 2), 1500.0),
            CashFlow::new(date(2021, 6, 30), 8200.0),
        ];
        let rate = xirr(&flows).expect("root exists") / 100.0;

        let t0 = date(2019, 3, 5);
        let npv: f64 = flows
            .iter()
            .map(|f| {
                let t = (f.date - t0).num_days() as f64 / DAYS_PER_YEAR;
                f.amount / (1.0 + rate).powf(t)
            })
            .sum();
        assert!(npv.abs() < 1e-2, "npv at solution was {}", npv);
    }
}
