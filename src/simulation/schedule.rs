//! Transaction scheduling: frequencies, planned dates, and the end-of-range
//! admission rule for terminal installments

use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::returns::DAYS_PER_YEAR;

/// Grace window after the end date inside which a resolved terminal
/// installment is still admitted
const END_GRACE_DAYS: i64 = 7;

/// Hard stop: planned dates beyond this overrun are never admitted, which
/// bounds the schedule loop
const SCHEDULE_OVERRUN_DAYS: i64 = 32;

/// Cadence of a systematic schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Frequency {
    Monthly,
    Quarterly,
    /// Fixed interval in days (must be at least 1)
    CustomDays(u32),
}

impl Frequency {
    pub fn periods_per_year(&self) -> f64 {
        match self {
            Frequency::Monthly => 12.0,
            Frequency::Quarterly => 4.0,
            Frequency::CustomDays(days) => DAYS_PER_YEAR / f64::from((*days).max(1)),
        }
    }

    /// The k-th planned date counting from `start` (k = 0 is the start
    /// itself). Month-based cadences anchor to the original start date so a
    /// clamped month-end (e.g. Jan 31 -> Feb 28) does not shift the rest of
    /// the schedule.
    pub fn planned_date(&self, start: NaiveDate, k: u32) -> Option<NaiveDate> {
        match self {
            Frequency::Monthly => start.checked_add_months(Months::new(k)),
            Frequency::Quarterly => start.checked_add_months(Months::new(3 * k)),
            Frequency::CustomDays(days) => {
                start.checked_add_signed(Duration::days(i64::from(*days) * i64::from(k)))
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Monthly => "monthly",
            Frequency::Quarterly => "quarterly",
            Frequency::CustomDays(_) => "custom",
        }
    }
}

/// End-of-range admission rule for a resolved installment date: admitted
/// when it lands on or before the end date, in the same calendar month as
/// the end date, or within the 7-day grace window after it.
pub fn admits_installment(resolved: NaiveDate, end: NaiveDate) -> bool {
    resolved <= end
        || same_calendar_month(resolved, end)
        || (resolved - end).num_days() <= END_GRACE_DAYS
}

/// True once a planned date has overrun the end date far enough that no
/// resolution of it could ever be admitted
pub fn past_schedule(planned: NaiveDate, end: NaiveDate) -> bool {
    (planned - end).num_days() > SCHEDULE_OVERRUN_DAYS
}

fn same_calendar_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}
