//! Systematic withdrawal simulation with pluggable redemption strategies
//!
//! A run buys the corpus into the bucket at the range start, then redeems a
//! fixed amount on every scheduled date until the range ends, the data runs
//! out, or the portfolio can no longer cover the amount. Which funds supply
//! each redemption is the strategy's decision; everything else (schedule,
//! depletion, ledger, reporting) is shared.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::fund::{validate_weights, Fund, RiskCategory};
use crate::nav::{NavHistory, NavPoint};
use crate::returns::stats::max_drawdown;
use crate::returns::{xirr, CashFlow};

use super::investment::ensure_positive;
use super::ledger::UnitLedger;
use super::results::{
    FundSnapshot, OpeningPosition, TimelineAction, TimelineEntry, WithdrawalOutcome,
};
use super::schedule::Frequency;

/// Balances below this are treated as drained
const DUST: f64 = 1e-9;

/// How each scheduled redemption is split across the bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WithdrawalStrategy {
    /// Split by target allocation weight, spilling over when a fund runs dry
    Proportional,
    /// Drain funds sitting above their post-withdrawal target value first
    OverweightFirst,
    /// Drain risk categories in priority order, safest first
    RiskBucket,
}

impl WithdrawalStrategy {
    pub fn all() -> [WithdrawalStrategy; 3] {
        [
            WithdrawalStrategy::Proportional,
            WithdrawalStrategy::OverweightFirst,
            WithdrawalStrategy::RiskBucket,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WithdrawalStrategy::Proportional => "proportional",
            WithdrawalStrategy::OverweightFirst => "overweight-first",
            WithdrawalStrategy::RiskBucket => "risk-bucket",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "proportional" => Some(WithdrawalStrategy::Proportional),
            "overweight-first" => Some(WithdrawalStrategy::OverweightFirst),
            "risk-bucket" => Some(WithdrawalStrategy::RiskBucket),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WithdrawalParams {
    pub strategy: WithdrawalStrategy,
    /// Amount bought into the bucket at the range start
    pub corpus: f64,
    /// Amount redeemed on every scheduled date
    pub amount_per_period: f64,
    pub frequency: Frequency,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// One fund's state at a withdrawal date, as seen by a strategy
#[derive(Debug, Clone, Copy)]
struct Holding {
    scheme_code: u32,
    weight_pct: f64,
    value: f64,
    risk_category: Option<RiskCategory>,
}

/// Withdrawal simulator over a fund bucket and its NAV history
pub struct WithdrawalSimulator<'a> {
    funds: &'a [Fund],
    history: &'a NavHistory,
}

impl<'a> WithdrawalSimulator<'a> {
    pub fn new(funds: &'a [Fund], history: &'a NavHistory) -> Self {
        Self { funds, history }
    }

    pub fn run(&self, params: &WithdrawalParams) -> Result<WithdrawalOutcome> {
        self.validate(params)?;

        let total_weight: f64 = self.funds.iter().map(|f| f.weight_pct).sum();

        let mut ledger = UnitLedger::new();
        let mut flows: Vec<CashFlow> = Vec::new();
        let mut opening = Vec::with_capacity(self.funds.len());
        // Latest observed NAV per fund, for snapshots of drained funds
        let mut last_nav: HashMap<u32, NavPoint> = HashMap::new();

        for fund in self.funds {
            let series = self.history.series(fund.scheme_code)?;
            let buy = series
                .next_on_or_after(params.start)
                .ok_or(EngineError::NoNavOnOrAfter {
                    scheme_code: fund.scheme_code,
                    date: params.start,
                })?;
            let allocation = params.corpus * fund.weight_pct / total_weight;
            let units = ledger.credit(fund.scheme_code, allocation, buy.nav);
            flows.push(CashFlow::new(buy.date, -allocation));
            last_nav.insert(fund.scheme_code, *buy);
            opening.push(OpeningPosition {
                scheme_code: fund.scheme_code,
                nav: buy.nav,
                nav_date: buy.date,
                amount: allocation,
                units,
            });
        }

        let mut timeline: Vec<TimelineEntry> = Vec::new();
        let mut values = vec![params.corpus];
        let mut total_withdrawn = 0.0;
        let mut depleted_on: Option<NaiveDate> = None;

        let mut k = 1u32;
        loop {
            let Some(planned) = params.frequency.planned_date(params.start, k) else {
                break;
            };
            if planned > params.end {
                break;
            }

            // Resolve a NAV for every fund still holding units. A gap in one
            // fund while others continue is bad data and fatal; all funds
            // ending together means the history is exhausted and the run
            // stops cleanly.
            let mut resolved: Vec<(&Fund, NavPoint)> = Vec::new();
            let mut missing: Option<u32> = None;
            let mut any_active = false;
            for fund in self.funds {
                if ledger.units(fund.scheme_code) <= DUST {
                    continue;
                }
                any_active = true;
                let series = self.history.series(fund.scheme_code)?;
                match series.next_on_or_after(planned) {
                    Some(point) => resolved.push((fund, *point)),
                    None => missing = missing.or(Some(fund.scheme_code)),
                }
            }
            if !any_active || resolved.is_empty() {
                break;
            }
            if let Some(scheme_code) = missing {
                return Err(EngineError::NoNavOnOrAfter {
                    scheme_code,
                    date: planned,
                });
            }

            for (fund, point) in &resolved {
                last_nav.insert(fund.scheme_code, *point);
            }

            let holdings: Vec<Holding> = resolved
                .iter()
                .map(|(fund, point)| Holding {
                    scheme_code: fund.scheme_code,
                    weight_pct: fund.weight_pct,
                    value: ledger.units(fund.scheme_code) * point.nav,
                    risk_category: fund.risk_category,
                })
                .collect();
            let portfolio_value: f64 = holdings.iter().map(|h| h.value).sum();

            if portfolio_value <= params.amount_per_period {
                depleted_on = Some(planned);
                let funds = self.snapshot_bucket(&ledger, &last_nav, &HashMap::new());
                timeline.push(TimelineEntry {
                    date: planned,
                    action: TimelineAction::Depleted {
                        requested: params.amount_per_period,
                        remaining_value: portfolio_value,
                    },
                    funds,
                    portfolio_value,
                });
                values.push(portfolio_value);
                break;
            }

            let takes = plan_takes(params.strategy, &holdings, params.amount_per_period);

            let mut redeemed: HashMap<u32, (f64, f64)> = HashMap::new();
            let mut redeemed_total = 0.0;
            for ((fund, point), take) in resolved.iter().zip(&takes) {
                if *take > DUST {
                    let units = ledger.debit(fund.scheme_code, *take, point.nav);
                    flows.push(CashFlow::new(point.date, *take));
                    redeemed.insert(fund.scheme_code, (units, *take));
                    redeemed_total += *take;
                }
            }

            let funds = self.snapshot_bucket(&ledger, &last_nav, &redeemed);
            let after_value: f64 = funds.iter().map(|s| s.value_remaining).sum();
            total_withdrawn += redeemed_total;
            timeline.push(TimelineEntry {
                date: planned,
                action: TimelineAction::Withdrawal {
                    requested: params.amount_per_period,
                    redeemed: redeemed_total,
                },
                funds,
                portfolio_value: after_value,
            });
            values.push(after_value);
            k += 1;
        }

        // Terminal valuation: the remaining value at depletion, or the value
        // at the range end (latest available NAV) otherwise
        let final_value = if let Some(date) = depleted_on {
            let remaining = values.last().copied().unwrap_or(0.0);
            if remaining > DUST {
                flows.push(CashFlow::new(date, remaining));
            }
            remaining
        } else {
            let mut total = 0.0;
            for fund in self.funds {
                let units = ledger.units(fund.scheme_code);
                if units <= DUST {
                    continue;
                }
                let series = self.history.series(fund.scheme_code)?;
                let point = series.latest_on_or_before(params.end).ok_or(
                    EngineError::NoNavOnOrBefore {
                        scheme_code: fund.scheme_code,
                        date: params.end,
                    },
                )?;
                let value = units * point.nav;
                total += value;
                flows.push(CashFlow::new(point.date, value));
            }
            values.push(total);
            total
        };

        let survival_periods = timeline
            .iter()
            .filter(|e| matches!(e.action, TimelineAction::Withdrawal { .. }))
            .count();

        Ok(WithdrawalOutcome {
            strategy: params.strategy,
            invested: params.corpus,
            opening,
            timeline,
            total_withdrawn,
            survival_periods,
            depleted_on,
            final_value,
            max_drawdown_pct: max_drawdown(&values),
            xirr_pct: xirr(&flows),
            profit: total_withdrawn + final_value - params.corpus,
        })
    }

    fn validate(&self, params: &WithdrawalParams) -> Result<()> {
        validate_weights(self.funds)?;
        if params.start > params.end {
            return Err(EngineError::InvalidDateRange {
                start: params.start,
                end: params.end,
            });
        }
        ensure_positive(params.corpus)?;
        ensure_positive(params.amount_per_period)?;
        if let Frequency::CustomDays(days) = params.frequency {
            if days == 0 {
                return Err(EngineError::ZeroDayInterval);
            }
        }
        if params.strategy == WithdrawalStrategy::RiskBucket {
            for fund in self.funds {
                if fund.risk_category.is_none() {
                    return Err(EngineError::MissingRiskCategory {
                        scheme_code: fund.scheme_code,
                    });
                }
            }
        }
        Ok(())
    }

    /// Snapshot every fund of the bucket at its latest observed NAV so each
    /// timeline entry carries the same fund list, drained funds included
    fn snapshot_bucket(
        &self,
        ledger: &UnitLedger,
        last_nav: &HashMap<u32, NavPoint>,
        redeemed: &HashMap<u32, (f64, f64)>,
    ) -> Vec<FundSnapshot> {
        let mut snapshots = Vec::with_capacity(self.funds.len());
        for fund in self.funds {
            // Buy-in recorded a NAV for every fund
            let Some(point) = last_nav.get(&fund.scheme_code) else {
                continue;
            };
            let (units_redeemed, amount_redeemed) = redeemed
                .get(&fund.scheme_code)
                .copied()
                .unwrap_or((0.0, 0.0));
            let units_remaining = ledger.units(fund.scheme_code);
            snapshots.push(FundSnapshot {
                scheme_code: fund.scheme_code,
                nav: point.nav,
                nav_date: point.date,
                units_redeemed,
                amount_redeemed,
                units_remaining,
                value_remaining: units_remaining * point.nav,
            });
        }
        snapshots
    }
}

/// Per-fund redemption amounts for one scheduled withdrawal, aligned with
/// `holdings`. Callers only invoke this when the portfolio covers the
/// amount, so the takes always sum to it.
fn plan_takes(strategy: WithdrawalStrategy, holdings: &[Holding], amount: f64) -> Vec<f64> {
    match strategy {
        WithdrawalStrategy::Proportional => proportional_takes(holdings, amount),
        WithdrawalStrategy::OverweightFirst => overweight_first_takes(holdings, amount),
        WithdrawalStrategy::RiskBucket => risk_bucket_takes(holdings, amount),
    }
}

/// Split by weight, capped at each fund's value, spilling uncovered amounts
/// over to the funds that still have room
fn proportional_takes(holdings: &[Holding], amount: f64) -> Vec<f64> {
    let total_weight: f64 = holdings.iter().map(|h| h.weight_pct).sum();
    let mut takes: Vec<f64> = holdings
        .iter()
        .map(|h| (amount * h.weight_pct / total_weight).min(h.value))
        .collect();

    let mut shortfall = amount - takes.iter().sum::<f64>();
    let mut passes = 0;
    while shortfall > DUST && passes <= holdings.len() {
        let spare: Vec<f64> = holdings
            .iter()
            .zip(&takes)
            .map(|(h, t)| h.value - t)
            .collect();
        let open_weight: f64 = holdings
            .iter()
            .zip(&spare)
            .filter(|(_, s)| **s > DUST)
            .map(|(h, _)| h.weight_pct)
            .sum();
        if open_weight <= 0.0 {
            break;
        }
        for (i, holding) in holdings.iter().enumerate() {
            if spare[i] <= DUST {
                continue;
            }
            takes[i] += (shortfall * holding.weight_pct / open_weight).min(spare[i]);
        }
        shortfall = amount - takes.iter().sum::<f64>();
        passes += 1;
    }
    if shortfall > DUST {
        // float dust after the passes lands on the first fund with room
        for (i, holding) in holdings.iter().enumerate() {
            if holding.value - takes[i] >= shortfall {
                takes[i] += shortfall;
                break;
            }
        }
    }
    takes
}

/// Drain funds above their post-withdrawal target value, most overweight
/// first, then fall back to a proportional split of anything left
fn overweight_first_takes(holdings: &[Holding], amount: f64) -> Vec<f64> {
    let total_value: f64 = holdings.iter().map(|h| h.value).sum();
    let total_weight: f64 = holdings.iter().map(|h| h.weight_pct).sum();
    let target_total = total_value - amount;

    let excess: Vec<f64> = holdings
        .iter()
        .map(|h| h.value - target_total * h.weight_pct / total_weight)
        .collect();
    let mut order: Vec<usize> = (0..holdings.len()).collect();
    order.sort_by(|&a, &b| excess[b].total_cmp(&excess[a]));

    let mut takes = vec![0.0; holdings.len()];
    let mut remaining = amount;
    for &i in &order {
        if remaining <= DUST {
            break;
        }
        let take = excess[i].max(0.0).min(remaining).min(holdings[i].value);
        takes[i] = take;
        remaining -= take;
    }

    // The excesses sum to the amount, so this only catches float dust
    if remaining > DUST {
        let reduced: Vec<Holding> = holdings
            .iter()
            .zip(&takes)
            .map(|(h, t)| Holding {
                value: h.value - t,
                ..*h
            })
            .collect();
        for (i, extra) in proportional_takes(&reduced, remaining).into_iter().enumerate() {
            takes[i] += extra;
        }
    }
    takes
}

/// Drain risk categories in priority order; within a category, split
/// proportionally by weight
fn risk_bucket_takes(holdings: &[Holding], amount: f64) -> Vec<f64> {
    let mut takes = vec![0.0; holdings.len()];
    let mut remaining = amount;

    for category in RiskCategory::priority_order() {
        if remaining <= DUST {
            break;
        }
        let members: Vec<usize> = holdings
            .iter()
            .enumerate()
            .filter(|(_, h)| h.risk_category == Some(category) && h.value > DUST)
            .map(|(i, _)| i)
            .collect();
        if members.is_empty() {
            continue;
        }
        let category_value: f64 = members.iter().map(|&i| holdings[i].value).sum();
        let category_take = remaining.min(category_value);

        let member_holdings: Vec<Holding> = members.iter().map(|&i| holdings[i]).collect();
        let member_takes = proportional_takes(&member_holdings, category_take);
        for (j, &i) in members.iter().enumerate() {
            takes[i] = member_takes[j];
        }
        remaining -= category_take;
    }
    takes
}
