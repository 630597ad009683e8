//! Engine error types
//!
//! Precondition failures and missing required data are errors; data
//! insufficiency (short history, too few cash flows) is a result state
//! carried by the individual calculators, not an error.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors surfaced by the simulation engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("no funds selected for the run")]
    NoFundsSelected,

    #[error("allocation weights sum to {total:.4}, expected 100")]
    InvalidWeights { total: f64 },

    #[error("fund {scheme_code} has a non-positive allocation weight ({weight})")]
    NonPositiveWeight { scheme_code: u32, weight: f64 },

    #[error("invalid date range: start {start} is after end {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("amount must be positive, got {amount}")]
    NonPositiveAmount { amount: f64 },

    #[error("risk factor must be positive, got {factor}")]
    NonPositiveRiskFactor { factor: f64 },

    #[error("custom interval must be at least 1 day")]
    ZeroDayInterval,

    #[error("lumpsum injection date {date} falls outside the simulation range")]
    InjectionOutsideRange { date: NaiveDate },

    #[error("fund {scheme_code} is not part of the selected bucket")]
    UnknownFund { scheme_code: u32 },

    #[error("fund {scheme_code} has no NAV history")]
    MissingNavHistory { scheme_code: u32 },

    #[error("fund {scheme_code} has no NAV on or after {date}")]
    NoNavOnOrAfter { scheme_code: u32, date: NaiveDate },

    #[error("fund {scheme_code} has no NAV on or before {date}")]
    NoNavOnOrBefore { scheme_code: u32, date: NaiveDate },

    #[error("fund {scheme_code} has no risk category; the risk-bucket strategy requires one for every fund")]
    MissingRiskCategory { scheme_code: u32 },

    #[error("NAV series is empty")]
    EmptySeries,

    #[error("NAV series dates are not strictly ascending at index {index}")]
    UnsortedSeries { index: usize },

    #[error("NAV must be positive, got {nav} at index {index}")]
    NonPositiveNav { nav: f64, index: usize },
}

/// Convenience alias used throughout the engine
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_error_messages_are_user_facing() {
        let err = EngineError::InvalidWeights { total: 98.5 };
        assert!(err.to_string().contains("98.5"));

        let err = EngineError::NoNavOnOrAfter {
            scheme_code: 118550,
            date: NaiveDate::from_ymd_opt(2024, 1, 26).unwrap(),
        };
        assert!(err.to_string().contains("118550"));
        assert!(err.to_string().contains("2024-01-26"));
    }
}
