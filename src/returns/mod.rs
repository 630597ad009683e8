//! Return calculators: CAGR, XIRR, rolling windows, and series statistics

mod cagr;
mod rolling;
mod xirr;
pub mod stats;

pub use cagr::{cagr, years_between, DAYS_PER_YEAR};
pub use rolling::{rolling_returns, RollingOutcome, RollingPoint, RollingStats, RollingWindow};
pub(crate) use rolling::stats_from_points;
pub use xirr::{xirr, CashFlow};
