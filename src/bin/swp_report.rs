//! Compare systematic withdrawal strategies over one bucket and corpus
//!
//! Runs the same withdrawal plan under each strategy (or a single one via
//! --strategy), prints a survival comparison, sizing insights, and optional
//! per-strategy timeline CSVs.

use anyhow::{bail, Context};
use chrono::{Months, NaiveDate};
use clap::Parser;
use portfolio_engine::portfolio::{InsightParams, WithdrawalInsights, DEFAULT_RISK_FACTOR};
use portfolio_engine::simulation::TimelineAction;
use portfolio_engine::{
    EngineError, Frequency, SimulationRunner, WithdrawalOutcome, WithdrawalParams,
    WithdrawalStrategy,
};
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Compare SWP strategies against a fund bucket
#[derive(Parser, Debug)]
#[command(name = "swp_report", version, about)]
struct Args {
    /// Corpus bought into the bucket at the range start
    #[arg(long, default_value_t = 2_500_000.0)]
    corpus: f64,

    /// Amount withdrawn on each scheduled date
    #[arg(long, default_value_t = 20_000.0)]
    amount: f64,

    /// Withdrawal cadence: monthly | quarterly
    #[arg(long, default_value = "monthly")]
    frequency: String,

    /// Fixed interval in days, overriding --frequency
    #[arg(long)]
    interval_days: Option<u32>,

    /// Range start (YYYY-MM-DD); defaults to five years before the data end
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Range end (YYYY-MM-DD); defaults to the last date every fund covers
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Run one strategy only: proportional | overweight-first | risk-bucket
    #[arg(long)]
    strategy: Option<String>,

    /// Bucket definition CSV; the synthetic demo bucket when omitted
    #[arg(long, requires = "nav_csv")]
    funds_csv: Option<PathBuf>,

    /// NAV history CSV
    #[arg(long, requires = "funds_csv")]
    nav_csv: Option<PathBuf>,

    /// Divisor applied to the bucket CAGR for the safe-rate insights
    #[arg(long, default_value_t = DEFAULT_RISK_FACTOR)]
    risk_factor: f64,

    /// Insights horizon, in scheduled withdrawals
    #[arg(long, default_value_t = 240)]
    horizon_periods: u32,

    /// Directory receiving one timeline CSV per strategy
    #[arg(long)]
    timeline_dir: Option<PathBuf>,

    /// Emit the full report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct SwpReport {
    corpus: f64,
    amount_per_period: f64,
    frequency: String,
    start: NaiveDate,
    end: NaiveDate,
    runs: Vec<StrategySummary>,
    insights: WithdrawalInsights,
    execution_time_ms: u64,
}

#[derive(Serialize)]
struct StrategySummary {
    strategy: WithdrawalStrategy,
    survival_periods: usize,
    total_withdrawn: f64,
    final_value: f64,
    depleted_on: Option<NaiveDate>,
    max_drawdown_pct: f64,
    xirr_pct: Option<f64>,
    profit: f64,
}

impl StrategySummary {
    fn from_outcome(outcome: &WithdrawalOutcome) -> Self {
        Self {
            strategy: outcome.strategy,
            survival_periods: outcome.survival_periods,
            total_withdrawn: outcome.total_withdrawn,
            final_value: outcome.final_value,
            depleted_on: outcome.depleted_on,
            max_drawdown_pct: outcome.max_drawdown_pct,
            xirr_pct: outcome.xirr_pct,
            profit: outcome.profit,
        }
    }
}

fn write_timeline(dir: &Path, outcome: &WithdrawalOutcome) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;
    let path = dir.join(format!("swp_{}.csv", outcome.strategy.as_str()));
    let mut file =
        File::create(&path).with_context(|| format!("failed to create {}", path.display()))?;

    writeln!(file, "date,action,requested,redeemed,portfolio_value")?;
    for entry in &outcome.timeline {
        let (label, requested, redeemed) = match entry.action {
            TimelineAction::Withdrawal {
                requested,
                redeemed,
            } => ("withdrawal", requested, redeemed),
            TimelineAction::Depleted { requested, .. } => ("depleted", requested, 0.0),
        };
        writeln!(
            file,
            "{},{},{:.2},{:.2},{:.2}",
            entry.date, label, requested, redeemed, entry.portfolio_value
        )?;
    }
    Ok(path)
}

fn format_opt(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => "n/a".to_string(),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();
    let start_time = Instant::now();

    let runner = match (&args.funds_csv, &args.nav_csv) {
        (Some(funds_path), Some(nav_path)) => {
            SimulationRunner::from_csv_paths(funds_path, nav_path)
                .map_err(|e| anyhow::anyhow!("{e}"))
                .context("failed to load bucket CSVs")?
        }
        _ => SimulationRunner::demo(),
    };

    let frequency = match args.interval_days {
        Some(days) => Frequency::CustomDays(days),
        None => match args.frequency.as_str() {
            "monthly" => Frequency::Monthly,
            "quarterly" => Frequency::Quarterly,
            other => bail!("unknown frequency '{other}' (expected monthly or quarterly)"),
        },
    };

    let strategies: Vec<WithdrawalStrategy> = match &args.strategy {
        Some(label) => match WithdrawalStrategy::from_str_opt(label) {
            Some(strategy) => vec![strategy],
            None => bail!(
                "unknown strategy '{label}' (expected proportional, overweight-first or risk-bucket)"
            ),
        },
        None => WithdrawalStrategy::all().to_vec(),
    };

    let data_end = runner
        .funds()
        .iter()
        .filter_map(|f| runner.history().get(f.scheme_code).map(|s| s.last().date))
        .min()
        .context("bucket has no NAV coverage")?;
    let end = args.end.unwrap_or(data_end);
    let start = match args.start {
        Some(date) => date,
        None => end
            .checked_sub_months(Months::new(60))
            .context("end date is out of range")?,
    };

    let results: Vec<(WithdrawalStrategy, Result<WithdrawalOutcome, EngineError>)> = strategies
        .par_iter()
        .map(|&strategy| {
            let outcome = runner.withdraw(&WithdrawalParams {
                strategy,
                corpus: args.corpus,
                amount_per_period: args.amount,
                frequency,
                start,
                end,
            });
            (strategy, outcome)
        })
        .collect();

    let mut outcomes = Vec::with_capacity(results.len());
    for (strategy, result) in results {
        match result {
            Ok(outcome) => outcomes.push(outcome),
            // An untagged bucket simply cannot run risk-bucket; only fail
            // hard when the caller asked for that strategy by name
            Err(EngineError::MissingRiskCategory { scheme_code }) if args.strategy.is_none() => {
                log::warn!(
                    "skipping risk-bucket: fund {} has no risk category",
                    scheme_code
                );
            }
            Err(err) => bail!("{} run failed: {err}", strategy.as_str()),
        }
    }
    if outcomes.is_empty() {
        bail!("no strategy could run against this bucket");
    }

    let insights = runner
        .insights(&InsightParams {
            desired_withdrawal_per_period: args.amount,
            frequency,
            risk_factor: args.risk_factor,
            horizon_periods: args.horizon_periods,
            corpus: Some(args.corpus),
        })
        .map_err(|e| anyhow::anyhow!("{e}"))
        .context("insights failed")?;

    let mut timeline_paths = Vec::new();
    if let Some(dir) = &args.timeline_dir {
        for outcome in &outcomes {
            timeline_paths.push(write_timeline(dir, outcome)?);
        }
    }

    let execution_time_ms = start_time.elapsed().as_millis() as u64;

    if args.json {
        let report = SwpReport {
            corpus: args.corpus,
            amount_per_period: args.amount,
            frequency: frequency.as_str().to_string(),
            start,
            end,
            runs: outcomes.iter().map(StrategySummary::from_outcome).collect(),
            insights,
            execution_time_ms,
        };
        println!("{}", serde_json::to_string(&report)?);
        return Ok(());
    }

    println!(
        "SWP of {:.2} {} from a corpus of {:.2}, {} to {}",
        args.amount,
        frequency.as_str(),
        args.corpus,
        start,
        end
    );
    println!(
        "\n{:<18} {:>9} {:>14} {:>14} {:>10} {:>8} {:>12}",
        "Strategy", "Survived", "Withdrawn", "Final Value", "Max DD%", "XIRR%", "Depleted"
    );
    println!("{}", "-".repeat(92));
    for outcome in &outcomes {
        println!(
            "{:<18} {:>9} {:>14.2} {:>14.2} {:>10.2} {:>8} {:>12}",
            outcome.strategy.as_str(),
            outcome.survival_periods,
            outcome.total_withdrawn,
            outcome.final_value,
            outcome.max_drawdown_pct,
            format_opt(outcome.xirr_pct),
            outcome
                .depleted_on
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string()),
        );
    }

    println!("\n========================================");
    println!("  WITHDRAWAL SIZING (risk factor {:.1})", args.risk_factor);
    match insights.annual_safe_rate_pct {
        Some(rate) => println!("  Annual safe rate:    {:.2}%", rate),
        None => println!("  Annual safe rate:    n/a (no bucket growth figure)"),
    }
    if let Some(rate) = insights.per_period_safe_rate_pct {
        println!("  Per-period rate:     {:.3}%", rate);
    }
    if let Some(suggested) = insights.suggested_withdrawal {
        println!("  Suggested amount:    {:.2} per period", suggested);
    }
    match insights.required_corpus_indefinite {
        Some(corpus) => println!("  Corpus (indefinite): {:.2}", corpus),
        None => println!("  Corpus (indefinite): n/a"),
    }
    println!(
        "  Corpus ({} periods): {:.2}",
        insights.horizon_periods, insights.required_corpus_fixed_horizon
    );
    println!("========================================");

    for path in &timeline_paths {
        println!("Timeline written to {}", path.display());
    }
    println!("\nTotal time: {:?}", start_time.elapsed());

    Ok(())
}
