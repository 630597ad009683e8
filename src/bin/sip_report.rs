//! Report SIP performance for every fund and the blended bucket
//!
//! This binary replays a systematic investment plan against each fund on its
//! own (full allocation) and against the weighted bucket, then prints a
//! comparison table with rolling-return context.
//! Supports JSON output for API integration via --json flag
//! Accepts config via environment variables:
//!   FUNDS_CSV, NAV_CSV (bucket definition; synthetic demo bucket when unset)
//!   SIP_AMOUNT, START_DATE, END_DATE, FREQUENCY (monthly|quarterly), INTERVAL_DAYS

use chrono::{Months, NaiveDate};
use portfolio_engine::returns::{RollingOutcome, RollingWindow};
use portfolio_engine::simulation::{
    Frequency, InvestmentMode, InvestmentParams, InvestmentSimulator,
};
use portfolio_engine::{EngineError, InvestmentOutcome, SimulationRunner};
use rayon::prelude::*;
use serde::Serialize;
use std::env;
use std::path::Path;
use std::time::Instant;

#[derive(Serialize)]
struct SipReport {
    sip_amount: f64,
    frequency: String,
    start: NaiveDate,
    end: NaiveDate,
    bucket: BucketRow,
    funds: Vec<FundRow>,
    rolling: Vec<RollingRow>,
    execution_time_ms: u64,
}

#[derive(Serialize)]
struct BucketRow {
    invested: f64,
    current_value: f64,
    profit_pct: f64,
    cagr_pct: f64,
    xirr_pct: Option<f64>,
    purchase_count: usize,
    valuation_date: NaiveDate,
}

#[derive(Serialize)]
struct FundRow {
    scheme_code: u32,
    name: String,
    weight_pct: f64,
    invested: f64,
    current_value: f64,
    profit_pct: f64,
    cagr_pct: f64,
    xirr_pct: Option<f64>,
}

#[derive(Serialize)]
struct RollingRow {
    window: String,
    windows: usize,
    mean_pct: f64,
    median_pct: f64,
    min_pct: f64,
    max_pct: f64,
    positive_pct: f64,
}

fn load_runner(json_output: bool) -> SimulationRunner {
    match (env::var("FUNDS_CSV"), env::var("NAV_CSV")) {
        (Ok(funds_path), Ok(nav_path)) => {
            if !json_output {
                println!("Loading bucket from {} and {}...", funds_path, nav_path);
            }
            SimulationRunner::from_csv_paths(Path::new(&funds_path), Path::new(&nav_path))
                .expect("Failed to load bucket CSVs")
        }
        _ => {
            if !json_output {
                println!("FUNDS_CSV/NAV_CSV not set, using the synthetic demo bucket");
            }
            SimulationRunner::demo()
        }
    }
}

fn format_opt(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => "n/a".to_string(),
    }
}

fn main() {
    env_logger::init();

    let json_output = env::args().any(|arg| arg == "--json");
    let start_time = Instant::now();

    let runner = load_runner(json_output);

    // Read config from environment or use defaults
    let sip_amount: f64 = env::var("SIP_AMOUNT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(10_000.0);

    let interval_days: Option<u32> = env::var("INTERVAL_DAYS")
        .ok()
        .and_then(|s| s.parse().ok());

    let frequency = match interval_days {
        Some(days) => Frequency::CustomDays(days),
        None => match env::var("FREQUENCY").ok().as_deref() {
            Some("quarterly") => Frequency::Quarterly,
            _ => Frequency::Monthly,
        },
    };

    // Default range: the last ten years covered by every fund in the bucket
    let data_end = runner
        .funds()
        .iter()
        .filter_map(|f| runner.history().get(f.scheme_code).map(|s| s.last().date))
        .min()
        .expect("validated bucket has NAV coverage");

    let end: NaiveDate = env::var("END_DATE")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(data_end);

    let start: NaiveDate = env::var("START_DATE")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            end.checked_sub_months(Months::new(120))
                .expect("end date in range")
        });

    let params = InvestmentParams {
        mode: InvestmentMode::Sip {
            amount_per_period: sip_amount,
        },
        frequency,
        start,
        end,
    };

    if !json_output {
        println!(
            "Running {} SIP of {:.2} from {} to {}...",
            frequency.as_str(),
            sip_amount,
            start,
            end
        );
    }

    let bucket_outcome = runner.invest(&params).expect("Bucket SIP run failed");

    // Replay the same plan into each fund alone for the comparison table
    let solo_results: Vec<(u32, Result<InvestmentOutcome, EngineError>)> = runner
        .funds()
        .par_iter()
        .map(|fund| {
            let mut solo = fund.clone();
            solo.weight_pct = 100.0;
            let bucket = [solo];
            let outcome = InvestmentSimulator::new(&bucket, runner.history()).run(&params);
            (fund.scheme_code, outcome)
        })
        .collect();

    let mut fund_rows = Vec::with_capacity(solo_results.len());
    for (scheme_code, result) in solo_results {
        let fund = runner
            .funds()
            .iter()
            .find(|f| f.scheme_code == scheme_code)
            .expect("solo run came from the bucket");
        match result {
            Ok(outcome) => fund_rows.push(FundRow {
                scheme_code,
                name: fund.name.clone(),
                weight_pct: fund.weight_pct,
                invested: outcome.invested,
                current_value: outcome.current_value,
                profit_pct: outcome.profit_pct,
                cagr_pct: outcome.cagr_pct,
                xirr_pct: outcome.xirr_pct,
            }),
            Err(err) => {
                log::warn!("skipping {} in the solo table: {}", fund.name, err);
            }
        }
    }

    let rolling_rows: Vec<RollingRow> = [RollingWindow::OneYear, RollingWindow::ThreeYear]
        .iter()
        .filter_map(|&window| {
            let outcome = runner.bucket_rolling(window).expect("bucket has history");
            match outcome {
                RollingOutcome::Computed(stats) => Some(RollingRow {
                    window: window.as_str().to_string(),
                    windows: stats.points.len(),
                    mean_pct: stats.mean,
                    median_pct: stats.median,
                    min_pct: stats.min,
                    max_pct: stats.max,
                    positive_pct: stats.positive_pct,
                }),
                RollingOutcome::Insufficient => None,
            }
        })
        .collect();

    let execution_time_ms = start_time.elapsed().as_millis() as u64;

    if json_output {
        let report = SipReport {
            sip_amount,
            frequency: frequency.as_str().to_string(),
            start,
            end,
            bucket: BucketRow {
                invested: bucket_outcome.invested,
                current_value: bucket_outcome.current_value,
                profit_pct: bucket_outcome.profit_pct,
                cagr_pct: bucket_outcome.cagr_pct,
                xirr_pct: bucket_outcome.xirr_pct,
                purchase_count: bucket_outcome.purchase_count,
                valuation_date: bucket_outcome.valuation_date,
            },
            funds: fund_rows,
            rolling: rolling_rows,
            execution_time_ms,
        };
        println!("{}", serde_json::to_string(&report).unwrap());
    } else {
        println!(
            "\n{:<8} {:<28} {:>7} {:>12} {:>14} {:>9} {:>8} {:>8}",
            "Scheme", "Fund (run alone)", "Wt%", "Invested", "Value", "Profit%", "CAGR%", "XIRR%"
        );
        println!("{}", "-".repeat(100));
        for row in &fund_rows {
            println!(
                "{:<8} {:<28} {:>7.1} {:>12.2} {:>14.2} {:>9.2} {:>8.2} {:>8}",
                row.scheme_code,
                row.name,
                row.weight_pct,
                row.invested,
                row.current_value,
                row.profit_pct,
                row.cagr_pct,
                format_opt(row.xirr_pct),
            );
        }
        println!("{}", "-".repeat(100));
        println!(
            "{:<8} {:<28} {:>7.1} {:>12.2} {:>14.2} {:>9.2} {:>8.2} {:>8}",
            "",
            "WEIGHTED BUCKET",
            100.0,
            bucket_outcome.invested,
            bucket_outcome.current_value,
            bucket_outcome.profit_pct,
            bucket_outcome.cagr_pct,
            format_opt(bucket_outcome.xirr_pct),
        );
        println!(
            "\n{} installments, valued on {}",
            bucket_outcome.purchase_count, bucket_outcome.valuation_date
        );

        if !rolling_rows.is_empty() {
            println!("\nBucket rolling returns:");
            for row in &rolling_rows {
                println!(
                    "  {:<8} {:>4} windows  mean {:>6.2}%  median {:>6.2}%  range [{:>6.2}%, {:>6.2}%]  positive {:>5.1}%",
                    row.window, row.windows, row.mean_pct, row.median_pct, row.min_pct, row.max_pct, row.positive_pct
                );
            }
        }

        println!("\nTotal time: {:?}", start_time.elapsed());
    }
}
