//! Fund data structures matching the bucket allocation format

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Tolerance when checking that bucket weights sum to 100
const WEIGHT_SUM_TOLERANCE: f64 = 0.01;

/// Risk category of a fund
///
/// Also defines the redemption priority for the risk-bucket withdrawal
/// strategy: liquid drains first, small-cap equity last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiskCategory {
    Liquid,
    Debt,
    Hybrid,
    EquityLarge,
    EquityMid,
    EquitySmall,
}

impl RiskCategory {
    /// Redemption priority (lower drains first)
    pub fn redemption_priority(&self) -> u8 {
        match self {
            RiskCategory::Liquid => 0,
            RiskCategory::Debt => 1,
            RiskCategory::Hybrid => 2,
            RiskCategory::EquityLarge => 3,
            RiskCategory::EquityMid => 4,
            RiskCategory::EquitySmall => 5,
        }
    }

    /// All categories in redemption priority order
    pub fn priority_order() -> [RiskCategory; 6] {
        [
            RiskCategory::Liquid,
            RiskCategory::Debt,
            RiskCategory::Hybrid,
            RiskCategory::EquityLarge,
            RiskCategory::EquityMid,
            RiskCategory::EquitySmall,
        ]
    }

    /// String representation matching the bucket CSV format
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::Liquid => "liquid",
            RiskCategory::Debt => "debt",
            RiskCategory::Hybrid => "hybrid",
            RiskCategory::EquityLarge => "equity-large",
            RiskCategory::EquityMid => "equity-mid",
            RiskCategory::EquitySmall => "equity-small",
        }
    }

    /// Parse the CSV representation
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "liquid" => Some(RiskCategory::Liquid),
            "debt" => Some(RiskCategory::Debt),
            "hybrid" => Some(RiskCategory::Hybrid),
            "equity-large" => Some(RiskCategory::EquityLarge),
            "equity-mid" => Some(RiskCategory::EquityMid),
            "equity-small" => Some(RiskCategory::EquitySmall),
            _ => None,
        }
    }
}

/// A fund selected into a bucket with its target allocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fund {
    /// AMFI scheme code (unique fund identifier)
    pub scheme_code: u32,

    /// Display name
    pub name: String,

    /// Target allocation weight within the bucket (percent; a bucket sums to 100)
    pub weight_pct: f64,

    /// Risk category; required only by the risk-bucket withdrawal strategy
    #[serde(default)]
    pub risk_category: Option<RiskCategory>,

    /// Fund inception date
    pub inception_date: NaiveDate,
}

impl Fund {
    /// Create a fund with required fields
    pub fn new(
        scheme_code: u32,
        name: impl Into<String>,
        weight_pct: f64,
        inception_date: NaiveDate,
    ) -> Self {
        Self {
            scheme_code,
            name: name.into(),
            weight_pct,
            risk_category: None,
            inception_date,
        }
    }

    /// Attach a risk category
    pub fn with_risk_category(mut self, category: RiskCategory) -> Self {
        self.risk_category = Some(category);
        self
    }

    /// Target weight as a fraction of 1.0
    pub fn weight_fraction(&self) -> f64 {
        self.weight_pct / 100.0
    }
}

/// Validate a bucket selection: non-empty, every weight positive, and the
/// total within tolerance of 100. Simulators normalize by the actual total
/// afterwards so the arithmetic downstream is exact.
pub fn validate_weights(funds: &[Fund]) -> Result<()> {
    if funds.is_empty() {
        return Err(EngineError::NoFundsSelected);
    }
    for fund in funds {
        if fund.weight_pct <= 0.0 || !fund.weight_pct.is_finite() {
            return Err(EngineError::NonPositiveWeight {
                scheme_code: fund.scheme_code,
                weight: fund.weight_pct,
            });
        }
    }
    let total: f64 = funds.iter().map(|f| f.weight_pct).sum();
    if (total - 100.0).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(EngineError::InvalidWeights { total });
    }
    Ok(())
}
