//! Portfolio Engine - Returns analytics and cash-flow simulation for mutual fund buckets
//!
//! This library provides:
//! - Validated NAV histories with holiday-safe date resolution
//! - Point and rolling return calculators (CAGR, XIRR, windows)
//! - SIP and lumpsum investment simulation
//! - Systematic withdrawal simulation with pluggable redemption strategies
//! - Bucket-level aggregation and withdrawal sizing insights

pub mod error;
pub mod fund;
pub mod nav;
pub mod portfolio;
pub mod returns;
pub mod runner;
pub mod simulation;

// Re-export commonly used types
pub use error::{EngineError, Result};
pub use fund::{Fund, RiskCategory};
pub use nav::{NavHistory, NavPoint, NavSeries};
pub use returns::{cagr, xirr, CashFlow, RollingOutcome, RollingWindow};
pub use runner::SimulationRunner;
pub use simulation::{
    Frequency, InvestmentMode, InvestmentOutcome, InvestmentParams, InvestmentSimulator,
    WithdrawalOutcome, WithdrawalParams, WithdrawalSimulator, WithdrawalStrategy,
};
