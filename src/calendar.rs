use chrono::{Days, Months, NaiveDate};

use crate::errors::{EngineError, Result};
use crate::types::{Cadence, CalendarUnit, LoanDuration};

/// length of one period in days, `None` for calendar months
pub fn step_days(cadence: Cadence) -> Option<u32> {
    match cadence {
        Cadence::FixedDays(n) => Some(n),
        Cadence::Calendar(unit, _) => unit.unit_days(),
    }
}

/// move a date forward by one payment period
pub fn advance(date: NaiveDate, cadence: Cadence) -> Result<NaiveDate> {
    payment_date(date, cadence, 1)
}

/// date of the k-th period counted from `start`
///
/// Month cadence is anchored at `start` so a start on the 31st yields the
/// last day of shorter months without drifting for the rest of the loan.
pub fn payment_date(start: NaiveDate, cadence: Cadence, k: u32) -> Result<NaiveDate> {
    let shifted = match step_days(cadence) {
        Some(days) => (days as u64)
            .checked_mul(k as u64)
            .and_then(|total| start.checked_add_days(Days::new(total))),
        None => start.checked_add_months(Months::new(k)),
    };
    shifted.ok_or_else(|| EngineError::InvalidDate {
        message: format!("period {} from {} is out of calendar range", k, start),
    })
}

/// number of payments implied by a loan duration
///
/// Month cadence with a month duration uses the month count directly;
/// every other combination covers the duration's day span with whole
/// periods, rounding up.
pub fn period_count(start: NaiveDate, duration: LoanDuration, cadence: Cadence) -> Result<u32> {
    let end = match duration {
        LoanDuration::Months(0) | LoanDuration::Days(0) => {
            tracing::warn!(?duration, "rejected zero-length loan term");
            return Err(EngineError::InvalidTerm {
                message: "loan term must cover at least one payment".to_string(),
            });
        }
        LoanDuration::Months(m) => {
            if let Cadence::Calendar(CalendarUnit::Month, _) = cadence {
                return Ok(m);
            }
            start.checked_add_months(Months::new(m))
        }
        LoanDuration::Days(d) => start.checked_add_days(Days::new(d as u64)),
    }
    .ok_or_else(|| EngineError::InvalidDate {
        message: format!("loan end from {} is out of calendar range", start),
    })?;

    let total_days = (end - start).num_days();

    let count = match step_days(cadence) {
        Some(0) => {
            return Err(EngineError::InvalidTerm {
                message: "cadence step must be at least one day".to_string(),
            })
        }
        Some(step) => {
            let step = step as i64;
            (total_days + step - 1) / step
        }
        None => {
            let mut k: u32 = 0;
            let mut date = start;
            while date < end {
                k += 1;
                date = payment_date(start, cadence, k)?;
            }
            k as i64
        }
    };

    u32::try_from(count).map_err(|_| EngineError::InvalidTerm {
        message: format!("derived payment count {} is out of range", count),
    })
}
