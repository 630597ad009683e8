//! Withdrawal sizing from bucket metrics
//!
//! Answers "how much can this bucket sustain" three ways: a safe rate per
//! period, the corpus whose growth covers a withdrawal indefinitely, and an
//! annuity corpus that lasts exactly a fixed horizon when discounted at the
//! bucket's volatility-adjusted growth rate.

use serde::Serialize;

use crate::error::{EngineError, Result};
use crate::simulation::Frequency;

use super::aggregate::BucketMetrics;

/// Divisor applied to the bucket growth rate when deriving the safe rate
pub const DEFAULT_RISK_FACTOR: f64 = 3.0;

#[derive(Debug, Clone)]
pub struct InsightParams {
    pub desired_withdrawal_per_period: f64,
    pub frequency: Frequency,
    /// Higher is more conservative; see [`DEFAULT_RISK_FACTOR`]
    pub risk_factor: f64,
    /// Number of scheduled withdrawals the fixed-horizon corpus must cover
    pub horizon_periods: u32,
    /// Available corpus, when the caller wants a suggested withdrawal size
    pub corpus: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WithdrawalInsights {
    pub annual_safe_rate_pct: Option<f64>,
    pub per_period_safe_rate_pct: Option<f64>,
    pub periods_per_year: f64,
    /// Corpus times the per-period safe rate, when a corpus was given
    pub suggested_withdrawal: Option<f64>,
    /// Corpus whose safe-rate income covers the withdrawal forever; absent
    /// when the safe rate is not positive
    pub required_corpus_indefinite: Option<f64>,
    /// Annuity present value covering exactly `horizon_periods` withdrawals
    pub required_corpus_fixed_horizon: f64,
    pub horizon_periods: u32,
}

/// Derive withdrawal sizing insights from bucket metrics.
///
/// The safe rate comes from the metrics (weighted CAGR over the risk
/// factor); the fixed-horizon corpus discounts at the CAGR haircut by the
/// bucket volatility, falling back to an ungrown flat sum when the haircut
/// consumes the whole rate.
pub fn withdrawal_insights(
    metrics: &BucketMetrics,
    params: &InsightParams,
) -> Result<WithdrawalInsights> {
    let withdrawal = params.desired_withdrawal_per_period;
    if withdrawal <= 0.0 || !withdrawal.is_finite() {
        return Err(EngineError::NonPositiveAmount { amount: withdrawal });
    }

    let periods_per_year = params.frequency.periods_per_year();
    let annual_safe_rate_pct = metrics.safe_withdrawal_rate_annual_pct;
    let per_period_safe_rate_pct = annual_safe_rate_pct.map(|rate| rate / periods_per_year);

    let suggested_withdrawal = match (params.corpus, per_period_safe_rate_pct) {
        (Some(corpus), Some(rate)) => Some(corpus * rate.max(0.0) / 100.0),
        _ => None,
    };

    let required_corpus_indefinite = per_period_safe_rate_pct.and_then(|rate| {
        if rate > 0.0 {
            Some(withdrawal / (rate / 100.0))
        } else {
            None
        }
    });

    Ok(WithdrawalInsights {
        annual_safe_rate_pct,
        per_period_safe_rate_pct,
        periods_per_year,
        suggested_withdrawal,
        required_corpus_indefinite,
        required_corpus_fixed_horizon: annuity_corpus(
            withdrawal,
            metrics.cagr_pct,
            metrics.volatility_pct,
            periods_per_year,
            params.horizon_periods,
        ),
        horizon_periods: params.horizon_periods,
    })
}

/// Present value of `periods` level withdrawals at the volatility-adjusted
/// growth rate; a flat sum when the adjusted rate rounds to zero
fn annuity_corpus(
    withdrawal: f64,
    cagr_pct: Option<f64>,
    volatility_pct: Option<f64>,
    periods_per_year: f64,
    periods: u32,
) -> f64 {
    let adjusted_annual_pct =
        (cagr_pct.unwrap_or(0.0) - volatility_pct.unwrap_or(0.0)).max(0.0);
    let rate = adjusted_annual_pct / periods_per_year / 100.0;
    if rate <= f64::EPSILON {
        return withdrawal * periods as f64;
    }
    withdrawal * (1.0 - (1.0 + rate).powi(-(periods as i32))) / rate
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket(cagr: Option<f64>, vol: Option<f64>, risk_factor: f64) -> BucketMetrics {
        BucketMetrics {
            cagr_pct: cagr,
            volatility_pct: vol,
            xirr_pct: None,
            safe_withdrawal_rate_annual_pct: cagr.map(|c| c / risk_factor),
        }
    }

    fn params(withdrawal: f64, corpus: Option<f64>) -> InsightParams {
        InsightParams {
            desired_withdrawal_per_period: withdrawal,
            frequency: Frequency::Monthly,
            risk_factor: DEFAULT_RISK_FACTOR,
            horizon_periods: 240,
            corpus,
        }
    }

    #[test]
    fn test_monthly_insights_worked_example() {
        // 12% growth over risk factor 3: 4% a year, 1/3% a month
        let metrics = bucket(Some(12.0), Some(10.0), 3.0);
        let insights =
            withdrawal_insights(&metrics, &params(50_000.0, Some(12_000_000.0))).unwrap();

        assert!((insights.periods_per_year - 12.0).abs() < 1e-12);
        assert!((insights.annual_safe_rate_pct.unwrap() - 4.0).abs() < 1e-9);
        assert!((insights.per_period_safe_rate_pct.unwrap() - 1.0 / 3.0).abs() < 1e-9);
        assert!((insights.suggested_withdrawal.unwrap() - 40_000.0).abs() < 1e-6);
        assert!((insights.required_corpus_indefinite.unwrap() - 15_000_000.0).abs() < 1.0);

        // 240 months at a 2% adjusted annual rate: an annuity well below
        // the flat 12,000,000 but above what any higher rate would need
        let fixed = insights.required_corpus_fixed_horizon;
        assert!(fixed > 9.8e6 && fixed < 9.95e6, "annuity corpus {fixed}");
        assert!(fixed < 50_000.0 * 240.0);
        assert_eq!(insights.horizon_periods, 240);
    }

    #[test]
    fn test_flat_horizon_when_volatility_consumes_growth() {
        let metrics = bucket(Some(8.0), Some(12.0), 3.0);
        let insights = withdrawal_insights(&metrics, &params(10_000.0, None)).unwrap();

        assert!((insights.required_corpus_fixed_horizon - 2_400_000.0).abs() < 1e-6);
        assert!(insights.suggested_withdrawal.is_none());
    }

    #[test]
    fn test_unknown_growth_degrades_cleanly() {
        let metrics = bucket(None, None, 3.0);
        let insights =
            withdrawal_insights(&metrics, &params(10_000.0, Some(1_000_000.0))).unwrap();

        assert!(insights.annual_safe_rate_pct.is_none());
        assert!(insights.per_period_safe_rate_pct.is_none());
        assert!(insights.suggested_withdrawal.is_none());
        assert!(insights.required_corpus_indefinite.is_none());
        // Fixed-horizon sizing still answers with the ungrown sum
        assert!((insights.required_corpus_fixed_horizon - 2_400_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_negative_growth_never_suggests_income() {
        let metrics = bucket(Some(-6.0), Some(4.0), 3.0);
        let insights =
            withdrawal_insights(&metrics, &params(10_000.0, Some(1_000_000.0))).unwrap();

        assert!(insights.annual_safe_rate_pct.unwrap() < 0.0);
        assert!(insights.required_corpus_indefinite.is_none());
        assert_eq!(insights.suggested_withdrawal, Some(0.0));
    }

    #[test]
    fn test_rejects_non_positive_withdrawal() {
        let metrics = bucket(Some(12.0), Some(10.0), 3.0);
        assert!(matches!(
            withdrawal_insights(&metrics, &params(0.0, None)),
            Err(EngineError::NonPositiveAmount { .. })
        ));
    }
}
