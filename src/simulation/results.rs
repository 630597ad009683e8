//! Result types produced by the investment and withdrawal simulators

use chrono::NaiveDate;
use serde::Serialize;

use super::withdrawal::WithdrawalStrategy;

/// Per-fund performance figures for an investment run
#[derive(Debug, Clone, Serialize)]
pub struct FundPerformance {
    pub scheme_code: u32,
    pub name: String,
    /// Total amount put into this fund across all purchases
    pub invested: f64,
    /// Units held multiplied by the valuation-date NAV
    pub current_value: f64,
    pub profit: f64,
    pub profit_pct: f64,
    /// Annualized growth from the first purchase to the valuation date
    pub cagr_pct: f64,
    /// Money-weighted return over the purchase flows; absent when the
    /// solver fails to converge
    pub xirr_pct: Option<f64>,
    pub units: f64,
}

/// Blended outcome of an investment run across the whole bucket
#[derive(Debug, Clone, Serialize)]
pub struct InvestmentOutcome {
    pub invested: f64,
    pub current_value: f64,
    pub profit: f64,
    pub profit_pct: f64,
    pub cagr_pct: f64,
    pub xirr_pct: Option<f64>,
    /// Number of admitted installment dates (1 for a pure lumpsum)
    pub purchase_count: usize,
    pub valuation_date: NaiveDate,
    pub funds: Vec<FundPerformance>,
}

/// The buy-in executed at the start of a withdrawal run
#[derive(Debug, Clone, Serialize)]
pub struct OpeningPosition {
    pub scheme_code: u32,
    pub nav: f64,
    pub nav_date: NaiveDate,
    pub amount: f64,
    pub units: f64,
}

/// What happened on one timeline date
#[derive(Debug, Clone, Serialize)]
pub enum TimelineAction {
    Withdrawal { requested: f64, redeemed: f64 },
    /// The portfolio could no longer cover the scheduled amount; this is
    /// always the final entry of a depleted run
    Depleted { requested: f64, remaining_value: f64 },
}

/// Per-fund state captured on a timeline date
#[derive(Debug, Clone, Serialize)]
pub struct FundSnapshot {
    pub scheme_code: u32,
    pub nav: f64,
    pub nav_date: NaiveDate,
    pub units_redeemed: f64,
    pub amount_redeemed: f64,
    pub units_remaining: f64,
    pub value_remaining: f64,
}

/// One scheduled withdrawal date in a run's ledger
#[derive(Debug, Clone, Serialize)]
pub struct TimelineEntry {
    pub date: NaiveDate,
    pub action: TimelineAction,
    pub funds: Vec<FundSnapshot>,
    /// Portfolio value after the action on this date
    pub portfolio_value: f64,
}

/// Full outcome of a withdrawal run
#[derive(Debug, Clone, Serialize)]
pub struct WithdrawalOutcome {
    pub strategy: WithdrawalStrategy,
    pub invested: f64,
    pub opening: Vec<OpeningPosition>,
    pub timeline: Vec<TimelineEntry>,
    pub total_withdrawn: f64,
    /// Count of fully honored withdrawals
    pub survival_periods: usize,
    pub depleted_on: Option<NaiveDate>,
    pub final_value: f64,
    /// Largest peak-to-trough decline of the portfolio value path, percent
    pub max_drawdown_pct: f64,
    pub xirr_pct: Option<f64>,
    /// total_withdrawn + final_value - invested
    pub profit: f64,
}

impl WithdrawalOutcome {
    pub fn is_depleted(&self) -> bool {
        self.depleted_on.is_some()
    }
}
