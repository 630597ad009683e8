//! AWS Lambda handler for the withdrawal simulation API
//!
//! Accepts an API Gateway v2 JSON body describing a withdrawal plan, runs it
//! under the requested strategy (or all three), and returns the comparison
//! plus sizing insights. The bucket comes from FUNDS_CSV/NAV_CSV when set,
//! otherwise the synthetic demo bucket.

use aws_lambda_events::encodings::Body;
use aws_lambda_events::event::apigw::{ApiGatewayV2httpRequest, ApiGatewayV2httpResponse};
use aws_lambda_events::http::{HeaderMap, HeaderValue, Method};
use chrono::{Months, NaiveDate};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

use portfolio_engine::portfolio::{InsightParams, WithdrawalInsights, DEFAULT_RISK_FACTOR};
use portfolio_engine::simulation::TimelineEntry;
use portfolio_engine::{
    EngineError, Frequency, SimulationRunner, WithdrawalParams, WithdrawalStrategy,
};

/// Request body for the simulation endpoint; every field has a default so
/// an empty POST runs the stock comparison
#[derive(Debug, Deserialize)]
struct SimulationRequest {
    #[serde(default = "default_corpus")]
    corpus: f64,

    #[serde(default = "default_withdrawal")]
    withdrawal_per_period: f64,

    /// proportional | overweight-first | risk-bucket; all three when absent
    #[serde(default)]
    strategy: Option<String>,

    /// monthly | quarterly
    #[serde(default = "default_frequency")]
    frequency: String,

    /// Fixed interval in days, overriding `frequency`
    #[serde(default)]
    interval_days: Option<u32>,

    #[serde(default)]
    start: Option<NaiveDate>,

    #[serde(default)]
    end: Option<NaiveDate>,

    #[serde(default = "default_risk_factor")]
    risk_factor: f64,

    #[serde(default = "default_horizon_periods")]
    horizon_periods: u32,

    /// Include the full per-date timeline in each run
    #[serde(default)]
    include_timeline: bool,
}

fn default_corpus() -> f64 {
    2_500_000.0
}

fn default_withdrawal() -> f64 {
    20_000.0
}

fn default_frequency() -> String {
    "monthly".to_string()
}

fn default_risk_factor() -> f64 {
    DEFAULT_RISK_FACTOR
}

fn default_horizon_periods() -> u32 {
    240
}

#[derive(Serialize)]
struct SimulationResponse {
    corpus: f64,
    withdrawal_per_period: f64,
    frequency: String,
    start: NaiveDate,
    end: NaiveDate,
    bucket: Vec<BucketFund>,
    runs: Vec<StrategyRun>,
    insights: WithdrawalInsights,
    execution_time_ms: u64,
}

#[derive(Serialize)]
struct BucketFund {
    scheme_code: u32,
    name: String,
    weight_pct: f64,
    risk_category: Option<&'static str>,
}

#[derive(Serialize)]
struct StrategyRun {
    strategy: WithdrawalStrategy,
    survival_periods: usize,
    total_withdrawn: f64,
    final_value: f64,
    depleted_on: Option<NaiveDate>,
    max_drawdown_pct: f64,
    xirr_pct: Option<f64>,
    profit: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeline: Option<Vec<TimelineEntry>>,
}

fn cors_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("Content-Type", HeaderValue::from_static("application/json"));
    headers.insert(
        "Access-Control-Allow-Origin",
        HeaderValue::from_static("*"),
    );
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static("POST, OPTIONS"),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static("Content-Type"),
    );
    headers
}

fn error_response(status: i64, message: &str) -> ApiGatewayV2httpResponse {
    ApiGatewayV2httpResponse {
        status_code: status,
        headers: cors_headers(),
        body: Some(Body::Text(format!(r#"{{"error":"{}"}}"#, message))),
        is_base64_encoded: false,
        ..Default::default()
    }
}

fn json_response(body: &SimulationResponse) -> ApiGatewayV2httpResponse {
    ApiGatewayV2httpResponse {
        status_code: 200,
        headers: cors_headers(),
        body: Some(Body::Text(serde_json::to_string(body).unwrap())),
        is_base64_encoded: false,
        ..Default::default()
    }
}

/// FUNDS_CSV/NAV_CSV when both are configured, the demo bucket otherwise
fn load_runner() -> Result<SimulationRunner, String> {
    match (env::var("FUNDS_CSV"), env::var("NAV_CSV")) {
        (Ok(funds_path), Ok(nav_path)) => {
            SimulationRunner::from_csv_paths(Path::new(&funds_path), Path::new(&nav_path))
                .map_err(|e| e.to_string())
        }
        _ => Ok(SimulationRunner::demo()),
    }
}

/// Lambda handler function
async fn handler(
    event: LambdaEvent<ApiGatewayV2httpRequest>,
) -> Result<ApiGatewayV2httpResponse, Error> {
    let start_time = std::time::Instant::now();

    // Handle CORS preflight
    if event.payload.request_context.http.method == Method::OPTIONS {
        return Ok(ApiGatewayV2httpResponse {
            status_code: 200,
            headers: cors_headers(),
            is_base64_encoded: false,
            ..Default::default()
        });
    }

    if event.payload.is_base64_encoded {
        return Ok(error_response(400, "base64-encoded bodies are not supported"));
    }

    // Parse request body; an empty body runs the defaults
    let body_str = match &event.payload.body {
        Some(body) if !body.is_empty() => body.as_str(),
        _ => "{}",
    };

    let request: SimulationRequest = match serde_json::from_str(body_str) {
        Ok(r) => r,
        Err(e) => {
            return Ok(error_response(400, &format!("Invalid JSON: {}", e)));
        }
    };

    let frequency = match request.interval_days {
        Some(days) => Frequency::CustomDays(days),
        None => match request.frequency.as_str() {
            "monthly" => Frequency::Monthly,
            "quarterly" => Frequency::Quarterly,
            other => {
                return Ok(error_response(400, &format!("Unknown frequency '{}'", other)));
            }
        },
    };

    let strategies: Vec<WithdrawalStrategy> = match &request.strategy {
        Some(label) => match WithdrawalStrategy::from_str_opt(label) {
            Some(strategy) => vec![strategy],
            None => {
                return Ok(error_response(400, &format!("Unknown strategy '{}'", label)));
            }
        },
        None => WithdrawalStrategy::all().to_vec(),
    };

    let runner = match load_runner() {
        Ok(r) => r,
        Err(e) => {
            return Ok(error_response(500, &format!("Failed to load bucket: {}", e)));
        }
    };

    // Default range: the last five years covered by every fund
    let data_end = runner
        .funds()
        .iter()
        .filter_map(|f| runner.history().get(f.scheme_code).map(|s| s.last().date))
        .min();
    let end = match request.end.or(data_end) {
        Some(date) => date,
        None => return Ok(error_response(500, "bucket has no NAV coverage")),
    };
    let start = match request.start {
        Some(date) => date,
        None => match end.checked_sub_months(Months::new(60)) {
            Some(date) => date,
            None => return Ok(error_response(400, "end date is out of range")),
        },
    };

    // Run the strategies in parallel
    let results: Vec<_> = strategies
        .par_iter()
        .map(|&strategy| {
            runner.withdraw(&WithdrawalParams {
                strategy,
                corpus: request.corpus,
                amount_per_period: request.withdrawal_per_period,
                frequency,
                start,
                end,
            })
        })
        .collect();

    let mut runs = Vec::with_capacity(results.len());
    for result in results {
        match result {
            Ok(outcome) => runs.push(StrategyRun {
                strategy: outcome.strategy,
                survival_periods: outcome.survival_periods,
                total_withdrawn: outcome.total_withdrawn,
                final_value: outcome.final_value,
                depleted_on: outcome.depleted_on,
                max_drawdown_pct: outcome.max_drawdown_pct,
                xirr_pct: outcome.xirr_pct,
                profit: outcome.profit,
                timeline: request.include_timeline.then(|| outcome.timeline),
            }),
            // An untagged bucket cannot run risk-bucket; drop that run
            // unless the caller asked for it by name
            Err(EngineError::MissingRiskCategory { scheme_code })
                if request.strategy.is_none() =>
            {
                log::warn!(
                    "skipping risk-bucket: fund {} has no risk category",
                    scheme_code
                );
            }
            Err(e) => {
                return Ok(error_response(422, &format!("Simulation failed: {}", e)));
            }
        }
    }
    if runs.is_empty() {
        return Ok(error_response(422, "no strategy could run against this bucket"));
    }

    let insights = match runner.insights(&InsightParams {
        desired_withdrawal_per_period: request.withdrawal_per_period,
        frequency,
        risk_factor: request.risk_factor,
        horizon_periods: request.horizon_periods,
        corpus: Some(request.corpus),
    }) {
        Ok(i) => i,
        Err(e) => {
            return Ok(error_response(422, &format!("Insights failed: {}", e)));
        }
    };

    let bucket: Vec<BucketFund> = runner
        .funds()
        .iter()
        .map(|f| BucketFund {
            scheme_code: f.scheme_code,
            name: f.name.clone(),
            weight_pct: f.weight_pct,
            risk_category: f.risk_category.map(|c| c.as_str()),
        })
        .collect();

    let execution_time_ms = start_time.elapsed().as_millis() as u64;

    let response = SimulationResponse {
        corpus: request.corpus,
        withdrawal_per_period: request.withdrawal_per_period,
        frequency: frequency.as_str().to_string(),
        start,
        end,
        bucket,
        runs,
        insights,
        execution_time_ms,
    };

    Ok(json_response(&response))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();
    run(service_fn(handler)).await
}
