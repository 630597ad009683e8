//! Lumpsum and SIP investment simulation
//!
//! A run buys into every fund of the bucket on a purchase schedule, values
//! the holdings at the end of the range, and reports per-fund and blended
//! performance. Purchase dates are planned on calendar anchors and resolved
//! forward to actual NAV dates; missing data inside the range is fatal,
//! while a schedule running off the end of the data is a clean stop.

use std::collections::HashMap;

use chrono::NaiveDate;
use log::debug;

use crate::error::{EngineError, Result};
use crate::fund::{validate_weights, Fund};
use crate::nav::NavHistory;
use crate::returns::{cagr, xirr, years_between, CashFlow};

use super::ledger::UnitLedger;
use super::results::{FundPerformance, InvestmentOutcome};
use super::schedule::{admits_installment, past_schedule, Frequency};

/// Where an extra lumpsum lands inside a SIP run
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LumpsumTarget {
    /// Split across the bucket by allocation weight
    ProportionalToWeights,
    /// Entirely into one fund of the bucket
    SingleFund(u32),
}

/// A one-off purchase layered on top of a SIP schedule
#[derive(Debug, Clone, Copy)]
pub struct LumpsumInjection {
    pub amount: f64,
    /// Planned date; resolved forward like any installment. Must fall
    /// within the simulation range.
    pub date: NaiveDate,
    pub target: LumpsumTarget,
}

/// How money enters the bucket over the simulation range
#[derive(Debug, Clone)]
pub enum InvestmentMode {
    /// Single purchase at the range start
    Lumpsum { amount: f64 },
    /// Recurring purchases on the frequency schedule
    Sip { amount_per_period: f64 },
    /// Recurring purchases plus a one-off injection
    SipWithLumpsum {
        amount_per_period: f64,
        injection: LumpsumInjection,
    },
}

#[derive(Debug, Clone)]
pub struct InvestmentParams {
    pub mode: InvestmentMode,
    pub frequency: Frequency,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Per-fund purchase record accumulated during a run
#[derive(Debug, Default)]
struct FundBook {
    invested: f64,
    flows: Vec<CashFlow>,
    first_buy: Option<NaiveDate>,
}

/// Investment simulator over a fund bucket and its NAV history.
///
/// Borrows the bucket and history; each `run` call owns its ledger and
/// books, so simulators are cheap to share across parameter sweeps.
pub struct InvestmentSimulator<'a> {
    funds: &'a [Fund],
    history: &'a NavHistory,
}

impl<'a> InvestmentSimulator<'a> {
    pub fn new(funds: &'a [Fund], history: &'a NavHistory) -> Self {
        Self { funds, history }
    }

    pub fn run(&self, params: &InvestmentParams) -> Result<InvestmentOutcome> {
        self.validate(params)?;

        // Normalize by the actual total so allocations sum exactly to the
        // purchase amount even when weights carry rounding slack.
        let total_weight: f64 = self.funds.iter().map(|f| f.weight_pct).sum();
        let shares: Vec<(u32, f64)> = self
            .funds
            .iter()
            .map(|f| (f.scheme_code, f.weight_pct / total_weight))
            .collect();

        let mut ledger = UnitLedger::new();
        let mut books: HashMap<u32, FundBook> = HashMap::new();
        let mut purchase_count = 0usize;

        match &params.mode {
            InvestmentMode::Lumpsum { amount } => {
                if self.execute_purchase(
                    params.start,
                    params.end,
                    *amount,
                    &shares,
                    &mut ledger,
                    &mut books,
                )? {
                    purchase_count += 1;
                }
            }
            InvestmentMode::Sip { amount_per_period }
            | InvestmentMode::SipWithLumpsum {
                amount_per_period, ..
            } => {
                let mut k = 0u32;
                loop {
                    let Some(planned) = params.frequency.planned_date(params.start, k) else {
                        break;
                    };
                    if past_schedule(planned, params.end) {
                        break;
                    }
                    if self.execute_purchase(
                        planned,
                        params.end,
                        *amount_per_period,
                        &shares,
                        &mut ledger,
                        &mut books,
                    )? {
                        purchase_count += 1;
                    }
                    k += 1;
                }

                if let InvestmentMode::SipWithLumpsum { injection, .. } = &params.mode {
                    let injection_shares = match injection.target {
                        LumpsumTarget::ProportionalToWeights => shares.clone(),
                        LumpsumTarget::SingleFund(scheme_code) => vec![(scheme_code, 1.0)],
                    };
                    if self.execute_purchase(
                        injection.date,
                        params.end,
                        injection.amount,
                        &injection_shares,
                        &mut ledger,
                        &mut books,
                    )? {
                        purchase_count += 1;
                    }
                }
            }
        }

        self.value_holdings(params, ledger, books, purchase_count)
    }

    fn validate(&self, params: &InvestmentParams) -> Result<()> {
        validate_weights(self.funds)?;
        if params.start > params.end {
            return Err(EngineError::InvalidDateRange {
                start: params.start,
                end: params.end,
            });
        }
        if let Frequency::CustomDays(days) = params.frequency {
            if days == 0 {
                return Err(EngineError::ZeroDayInterval);
            }
        }
        match &params.mode {
            InvestmentMode::Lumpsum { amount } => ensure_positive(*amount)?,
            InvestmentMode::Sip { amount_per_period } => ensure_positive(*amount_per_period)?,
            InvestmentMode::SipWithLumpsum {
                amount_per_period,
                injection,
            } => {
                ensure_positive(*amount_per_period)?;
                ensure_positive(injection.amount)?;
                if injection.date < params.start || injection.date > params.end {
                    return Err(EngineError::InjectionOutsideRange {
                        date: injection.date,
                    });
                }
                if let LumpsumTarget::SingleFund(scheme_code) = injection.target {
                    if !self.funds.iter().any(|f| f.scheme_code == scheme_code) {
                        return Err(EngineError::UnknownFund { scheme_code });
                    }
                }
            }
        }
        Ok(())
    }

    /// Execute one planned purchase date across the given shares.
    ///
    /// Per fund: a resolution inside the admission band buys; a resolution
    /// past the band is dropped; no resolution is fatal when the planned
    /// date is still inside the range and a clean stop once past it.
    /// Returns whether any fund admitted the purchase.
    fn execute_purchase(
        &self,
        planned: NaiveDate,
        end: NaiveDate,
        total_amount: f64,
        shares: &[(u32, f64)],
        ledger: &mut UnitLedger,
        books: &mut HashMap<u32, FundBook>,
    ) -> Result<bool> {
        let mut admitted = false;
        for &(scheme_code, share) in shares {
            let series = self.history.series(scheme_code)?;
            match series.next_on_or_after(planned) {
                Some(point) => {
                    if !admits_installment(point.date, end) {
                        debug!(
                            "fund {scheme_code}: installment planned {planned} resolves to {} past the range, dropped",
                            point.date
                        );
                        continue;
                    }
                    let allocation = total_amount * share;
                    ledger.credit(scheme_code, allocation, point.nav);
                    let book = books.entry(scheme_code).or_default();
                    book.invested += allocation;
                    book.flows.push(CashFlow::new(point.date, -allocation));
                    if book.first_buy.is_none() {
                        book.first_buy = Some(point.date);
                    }
                    admitted = true;
                }
                None => {
                    if planned <= end {
                        return Err(EngineError::NoNavOnOrAfter {
                            scheme_code,
                            date: planned,
                        });
                    }
                    // The schedule ran off the end of the data; the range
                    // itself was fully served.
                }
            }
        }
        Ok(admitted)
    }

    fn value_holdings(
        &self,
        params: &InvestmentParams,
        ledger: UnitLedger,
        mut books: HashMap<u32, FundBook>,
        purchase_count: usize,
    ) -> Result<InvestmentOutcome> {
        let mut funds_out = Vec::with_capacity(self.funds.len());
        let mut all_flows: Vec<CashFlow> = Vec::new();
        let mut invested_total = 0.0;
        let mut value_total = 0.0;
        let mut valuation_date = params.start;
        let mut earliest_buy: Option<NaiveDate> = None;

        for fund in self.funds {
            let series = self.history.series(fund.scheme_code)?;
            let valuation =
                series
                    .latest_on_or_before(params.end)
                    .ok_or(EngineError::NoNavOnOrBefore {
                        scheme_code: fund.scheme_code,
                        date: params.end,
                    })?;

            let book = books.remove(&fund.scheme_code).unwrap_or_default();
            let units = ledger.units(fund.scheme_code);
            let current_value = units * valuation.nav;
            let profit = current_value - book.invested;
            let profit_pct = if book.invested > 0.0 {
                profit / book.invested * 100.0
            } else {
                0.0
            };

            let years = book
                .first_buy
                .map(|d| years_between(d, valuation.date))
                .unwrap_or(0.0);
            let cagr_pct = cagr(book.invested, current_value, years);

            let xirr_pct = if book.invested > 0.0 {
                let mut flows = book.flows.clone();
                flows.push(CashFlow::new(valuation.date, current_value));
                xirr(&flows)
            } else {
                None
            };

            invested_total += book.invested;
            value_total += current_value;
            valuation_date = valuation_date.max(valuation.date);
            if let Some(d) = book.first_buy {
                earliest_buy = Some(earliest_buy.map_or(d, |e: NaiveDate| e.min(d)));
            }
            all_flows.extend(book.flows.iter().copied());
            if current_value > 0.0 {
                all_flows.push(CashFlow::new(valuation.date, current_value));
            }

            funds_out.push(FundPerformance {
                scheme_code: fund.scheme_code,
                name: fund.name.clone(),
                invested: book.invested,
                current_value,
                profit,
                profit_pct,
                cagr_pct,
                xirr_pct,
                units,
            });
        }

        let profit = value_total - invested_total;
        let profit_pct = if invested_total > 0.0 {
            profit / invested_total * 100.0
        } else {
            0.0
        };
        let years = earliest_buy
            .map(|d| years_between(d, valuation_date))
            .unwrap_or(0.0);

        Ok(InvestmentOutcome {
            invested: invested_total,
            current_value: value_total,
            profit,
            profit_pct,
            cagr_pct: cagr(invested_total, value_total, years),
            xirr_pct: xirr(&all_flows),
            purchase_count,
            valuation_date,
            funds: funds_out,
        })
    }
}

pub(super) fn ensure_positive(amount: f64) -> Result<()> {
    if amount <= 0.0 || !amount.is_finite() {
        return Err(EngineError::NonPositiveAmount { amount });
    }
    Ok(())
}
