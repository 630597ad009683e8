//! Portfolio Engine CLI
//!
//! Demo run over the synthetic three-fund bucket

use chrono::NaiveDate;
use std::fs::File;
use std::io::Write;

use portfolio_engine::portfolio::{InsightParams, DEFAULT_RISK_FACTOR};
use portfolio_engine::simulation::{InvestmentMode, InvestmentParams, TimelineAction, WithdrawalParams};
use portfolio_engine::{Frequency, RollingWindow, SimulationRunner, WithdrawalStrategy};

fn main() {
    env_logger::init();

    println!("Portfolio Engine v0.1.0");
    println!("=======================\n");

    let runner = SimulationRunner::demo();

    println!("Bucket:");
    for fund in runner.funds() {
        println!(
            "  {} {} ({}%, {})",
            fund.scheme_code,
            fund.name,
            fund.weight_pct,
            fund.risk_category.map(|c| c.as_str()).unwrap_or("untagged"),
        );
    }
    println!();

    // Accumulation: ten years of monthly SIP
    let start = NaiveDate::from_ymd_opt(2015, 1, 1).expect("valid date");
    let end = NaiveDate::from_ymd_opt(2024, 12, 31).expect("valid date");
    let sip = runner
        .invest(&InvestmentParams {
            mode: InvestmentMode::Sip {
                amount_per_period: 10_000.0,
            },
            frequency: Frequency::Monthly,
            start,
            end,
        })
        .expect("SIP simulation failed");

    println!("SIP 10000/month, {} to {} ({} installments):", start, end, sip.purchase_count);
    println!(
        "{:>8} {:>24} {:>12} {:>14} {:>8} {:>8}",
        "Scheme", "Fund", "Invested", "Value", "CAGR%", "XIRR%"
    );
    println!("{}", "-".repeat(80));
    for fund in &sip.funds {
        println!(
            "{:>8} {:>24} {:>12.2} {:>14.2} {:>8.2} {:>8}",
            fund.scheme_code,
            fund.name,
            fund.invested,
            fund.current_value,
            fund.cagr_pct,
            fund.xirr_pct.map(|r| format!("{r:.2}")).unwrap_or_else(|| "-".into()),
        );
    }
    println!("{}", "-".repeat(80));
    println!(
        "{:>8} {:>24} {:>12.2} {:>14.2} {:>8.2} {:>8}",
        "",
        "bucket",
        sip.invested,
        sip.current_value,
        sip.cagr_pct,
        sip.xirr_pct.map(|r| format!("{r:.2}")).unwrap_or_else(|| "-".into()),
    );
    println!();

    // Rolling return distribution across the bucket
    for window in [RollingWindow::OneYear, RollingWindow::ThreeYear] {
        match runner.bucket_rolling(window).expect("rolling analysis failed").stats() {
            Some(stats) => println!(
                "Rolling {}: mean {:.2}%  median {:.2}%  min {:.2}%  max {:.2}%  positive {:.1}%  ({} windows)",
                window.as_str(),
                stats.mean,
                stats.median,
                stats.min,
                stats.max,
                stats.positive_pct,
                stats.points.len(),
            ),
            None => println!("Rolling {}: insufficient history", window.as_str()),
        }
    }
    println!();

    // Decumulation: the same corpus under each redemption strategy
    let corpus = 2_500_000.0;
    let withdrawal = 20_000.0;
    let swp_start = NaiveDate::from_ymd_opt(2020, 1, 1).expect("valid date");
    let swp_end = NaiveDate::from_ymd_opt(2025, 6, 30).expect("valid date");

    println!(
        "SWP {:.0}/month from a {:.0} corpus, {} to {}:",
        withdrawal, corpus, swp_start, swp_end
    );
    println!(
        "{:>18} {:>9} {:>14} {:>14} {:>10} {:>8}",
        "Strategy", "Periods", "Withdrawn", "Final Value", "Drawdown%", "XIRR%"
    );
    println!("{}", "-".repeat(78));
    let mut risk_bucket_run = None;
    for strategy in WithdrawalStrategy::all() {
        let outcome = runner
            .withdraw(&WithdrawalParams {
                strategy,
                corpus,
                amount_per_period: withdrawal,
                frequency: Frequency::Monthly,
                start: swp_start,
                end: swp_end,
            })
            .expect("SWP simulation failed");
        println!(
            "{:>18} {:>9} {:>14.2} {:>14.2} {:>10.2} {:>8}",
            strategy.as_str(),
            outcome.survival_periods,
            outcome.total_withdrawn,
            outcome.final_value,
            outcome.max_drawdown_pct,
            outcome.xirr_pct.map(|r| format!("{r:.2}")).unwrap_or_else(|| "-".into()),
        );
        if strategy == WithdrawalStrategy::RiskBucket {
            risk_bucket_run = Some(outcome);
        }
    }
    println!();

    // Write the risk-bucket timeline to CSV
    let sample = risk_bucket_run.expect("risk-bucket run missing");
    let csv_path = "swp_timeline.csv";
    let mut file = File::create(csv_path).expect("Unable to create CSV file");
    writeln!(file, "Date,Action,Requested,Redeemed,PortfolioValue").unwrap();
    for entry in &sample.timeline {
        let (action, requested, redeemed) = match entry.action {
            TimelineAction::Withdrawal {
                requested,
                redeemed,
            } => ("withdrawal", requested, redeemed),
            TimelineAction::Depleted { requested, .. } => ("depleted", requested, 0.0),
        };
        writeln!(
            file,
            "{},{},{:.2},{:.2},{:.2}",
            entry.date, action, requested, redeemed, entry.portfolio_value
        )
        .unwrap();
    }
    println!("Full risk-bucket timeline written to: {}", csv_path);

    // Withdrawal sizing summary
    let insights = runner
        .insights(&InsightParams {
            desired_withdrawal_per_period: withdrawal,
            frequency: Frequency::Monthly,
            risk_factor: DEFAULT_RISK_FACTOR,
            horizon_periods: 240,
            corpus: Some(corpus),
        })
        .expect("insight computation failed");

    println!("\nWithdrawal sizing (risk factor {}):", DEFAULT_RISK_FACTOR);
    if let Some(rate) = insights.annual_safe_rate_pct {
        println!("  Annual safe rate: {:.2}%", rate);
    }
    if let Some(rate) = insights.per_period_safe_rate_pct {
        println!("  Monthly safe rate: {:.4}%", rate);
    }
    if let Some(amount) = insights.suggested_withdrawal {
        println!("  Sustainable withdrawal on {:.0}: {:.2}/month", corpus, amount);
    }
    if let Some(required) = insights.required_corpus_indefinite {
        println!("  Corpus for {:.0}/month indefinitely: {:.2}", withdrawal, required);
    }
    println!(
        "  Corpus for {} months: {:.2}",
        insights.horizon_periods, insights.required_corpus_fixed_horizon
    );
}
