//! High-level facade binding a fund bucket to its NAV history
//!
//! Reports and the service entry points all drive the engine through this
//! type: construct it once (from CSVs or the synthetic demo data), then run
//! simulations and analytics against the owned bucket.

use std::error::Error;
use std::path::Path;

use crate::error::Result;
use crate::fund::{load_funds, validate_weights, Fund};
use crate::nav::{load_nav_history, synthetic, NavHistory};
use crate::portfolio::{
    bucket_metrics, combine_rolling, withdrawal_insights, BucketMetrics, FundMetrics,
    InsightParams, WithdrawalInsights,
};
use crate::returns::stats::annualized_volatility;
use crate::returns::{cagr, rolling_returns, years_between, RollingOutcome, RollingWindow};
use crate::simulation::{
    InvestmentOutcome, InvestmentParams, InvestmentSimulator, WithdrawalOutcome, WithdrawalParams,
    WithdrawalSimulator,
};
use crate::EngineError;

/// An owned bucket plus history, validated at construction
pub struct SimulationRunner {
    funds: Vec<Fund>,
    history: NavHistory,
}

impl SimulationRunner {
    /// Build a runner, checking the weights and that every selected fund
    /// actually carries NAV history
    pub fn new(funds: Vec<Fund>, history: NavHistory) -> Result<Self> {
        validate_weights(&funds)?;
        for fund in &funds {
            history.series(fund.scheme_code)?;
        }
        Ok(Self { funds, history })
    }

    /// Deterministic three-fund bucket with synthetic history
    pub fn demo() -> Self {
        let (funds, history) = synthetic::demo_bucket();
        Self { funds, history }
    }

    /// Load the bucket and its NAV dump from CSV files
    pub fn from_csv_paths(
        funds_path: &Path,
        nav_path: &Path,
    ) -> std::result::Result<Self, Box<dyn Error>> {
        let funds = load_funds(funds_path)?;
        let history = load_nav_history(nav_path)?;
        Ok(Self::new(funds, history)?)
    }

    pub fn funds(&self) -> &[Fund] {
        &self.funds
    }

    pub fn history(&self) -> &NavHistory {
        &self.history
    }

    pub fn invest(&self, params: &InvestmentParams) -> Result<InvestmentOutcome> {
        InvestmentSimulator::new(&self.funds, &self.history).run(params)
    }

    pub fn withdraw(&self, params: &WithdrawalParams) -> Result<WithdrawalOutcome> {
        WithdrawalSimulator::new(&self.funds, &self.history).run(params)
    }

    /// Rolling returns for one fund of the bucket
    pub fn rolling(&self, scheme_code: u32, window: RollingWindow) -> Result<RollingOutcome> {
        if !self.funds.iter().any(|f| f.scheme_code == scheme_code) {
            return Err(EngineError::UnknownFund { scheme_code });
        }
        Ok(rolling_returns(self.history.series(scheme_code)?, window))
    }

    /// Weighted rolling returns across the whole bucket
    pub fn bucket_rolling(&self, window: RollingWindow) -> Result<RollingOutcome> {
        let mut outcomes = Vec::with_capacity(self.funds.len());
        for fund in &self.funds {
            let series = self.history.series(fund.scheme_code)?;
            outcomes.push((fund.weight_pct, rolling_returns(series, window)));
        }
        let parts: Vec<(f64, &RollingOutcome)> =
            outcomes.iter().map(|(w, o)| (*w, o)).collect();
        Ok(combine_rolling(window, &parts))
    }

    /// Historical metrics per fund: full-series CAGR and annualized
    /// volatility. Funds with a single observation report neither.
    pub fn fund_metrics(&self) -> Result<Vec<FundMetrics>> {
        let mut metrics = Vec::with_capacity(self.funds.len());
        for fund in &self.funds {
            let series = self.history.series(fund.scheme_code)?;
            let first = series.first();
            let last = series.last();
            let years = years_between(first.date, last.date);
            let cagr_pct = if years > 0.0 {
                Some(cagr(first.nav, last.nav, years))
            } else {
                None
            };
            metrics.push(FundMetrics {
                scheme_code: fund.scheme_code,
                name: fund.name.clone(),
                weight_pct: fund.weight_pct,
                cagr_pct,
                volatility_pct: annualized_volatility(series),
                xirr_pct: None,
            });
        }
        Ok(metrics)
    }

    pub fn bucket_metrics(&self, risk_factor: f64) -> Result<BucketMetrics> {
        bucket_metrics(&self.fund_metrics()?, risk_factor)
    }

    /// Withdrawal sizing insights for the bucket
    pub fn insights(&self, params: &InsightParams) -> Result<WithdrawalInsights> {
        let metrics = self.bucket_metrics(params.risk_factor)?;
        withdrawal_insights(&metrics, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::{Frequency, InvestmentMode, WithdrawalStrategy};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_demo_runner_is_ready() {
        let runner = SimulationRunner::demo();
        assert_eq!(runner.funds().len(), 3);
        for fund in runner.funds() {
            assert!(runner.history().get(fund.scheme_code).is_some());
        }
    }

    #[test]
    fn test_new_rejects_fund_without_history() {
        let (mut funds, history) = synthetic::demo_bucket();
        funds[0].scheme_code = 424242;
        assert!(matches!(
            SimulationRunner::new(funds, history),
            Err(EngineError::MissingNavHistory {
                scheme_code: 424242
            })
        ));
    }

    #[test]
    fn test_facade_runs_both_simulators() {
        let runner = SimulationRunner::demo();

        let invested = runner
            .invest(&InvestmentParams {
                mode: InvestmentMode::Sip {
                    amount_per_period: 10_000.0,
                },
                frequency: Frequency::Monthly,
                start: date(2018, 1, 1),
                end: date(2020, 12, 31),
            })
            .unwrap();
        assert!(invested.purchase_count >= 36);
        assert!((invested.invested - invested.purchase_count as f64 * 10_000.0).abs() < 1e-6);
        assert!(invested.current_value > 0.0);
        assert!(invested.xirr_pct.is_some());

        let withdrawn = runner
            .withdraw(&WithdrawalParams {
                strategy: WithdrawalStrategy::RiskBucket,
                corpus: 1_000_000.0,
                amount_per_period: 8_000.0,
                frequency: Frequency::Monthly,
                start: date(2020, 1, 1),
                end: date(2024, 12, 31),
            })
            .unwrap();
        assert!(withdrawn.survival_periods > 0);
        assert!(
            (withdrawn.total_withdrawn
                - withdrawn.survival_periods as f64 * 8_000.0)
                .abs()
                < 1e-6
        );
    }

    #[test]
    fn test_rolling_requires_bucket_membership() {
        let runner = SimulationRunner::demo();
        assert!(matches!(
            runner.rolling(42, RollingWindow::OneYear),
            Err(EngineError::UnknownFund { scheme_code: 42 })
        ));

        let outcome = runner.rolling(118550, RollingWindow::OneYear).unwrap();
        assert!(!outcome.is_insufficient());
    }

    #[test]
    fn test_bucket_analytics_and_insights() {
        let runner = SimulationRunner::demo();

        let combined = runner.bucket_rolling(RollingWindow::ThreeYear).unwrap();
        assert!(!combined.is_insufficient());

        let metrics = runner.bucket_metrics(3.0).unwrap();
        assert!(metrics.cagr_pct.unwrap() > 0.0);
        assert!(metrics.volatility_pct.unwrap() > 0.0);

        let insights = runner
            .insights(&InsightParams {
                desired_withdrawal_per_period: 10_000.0,
                frequency: Frequency::Monthly,
                risk_factor: 3.0,
                horizon_periods: 120,
                corpus: None,
            })
            .unwrap();
        assert!(insights.required_corpus_indefinite.unwrap() > 0.0);
        assert!(insights.required_corpus_fixed_horizon > 0.0);
    }
}
