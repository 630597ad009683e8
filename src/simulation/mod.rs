//! Cash-flow simulation: schedules, ledgers, and the two simulators

mod investment;
mod ledger;
mod results;
mod schedule;
mod withdrawal;

pub use investment::{
    InvestmentMode, InvestmentParams, InvestmentSimulator, LumpsumInjection, LumpsumTarget,
};
pub use ledger::UnitLedger;
pub use results::{
    FundPerformance, FundSnapshot, InvestmentOutcome, OpeningPosition, TimelineAction,
    TimelineEntry, WithdrawalOutcome,
};
pub use schedule::{admits_installment, past_schedule, Frequency};
pub use withdrawal::{WithdrawalParams, WithdrawalSimulator, WithdrawalStrategy};
