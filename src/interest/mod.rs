pub mod overdue;

use rust_decimal::Decimal;

use crate::decimal::{Money, Rate};
use crate::errors::{EngineError, Result};
use crate::types::Cadence;

pub use overdue::{days_late, overdue_interest, OverdueCalculator, OverdueConfig, OverdueQuote, OverdueSummary};

/// days in the year used for day-based rates
pub const DAYS_PER_YEAR: u32 = 365;

/// interest rate for one payment period
///
/// Fixed-day cadences scale the daily rate by the period length; calendar
/// cadences divide the annual rate by the number of periods per year.
pub fn period_rate(annual_rate: Rate, cadence: Cadence) -> Result<Rate> {
    let rate = match cadence {
        Cadence::FixedDays(days) => annual_rate
            .daily_rate()
            .as_decimal()
            .checked_mul(Decimal::from(days))
            .map(Rate::from_decimal),
        Cadence::Calendar(_, 0) => {
            return Err(EngineError::invalid_terms(
                "calendar cadence needs a positive count per year",
            ))
        }
        Cadence::Calendar(_, count_per_year) => annual_rate.per_period(count_per_year),
    };
    rate.ok_or_else(|| EngineError::overflow("period rate"))
}

/// unrounded interest on a balance for one period
pub fn period_interest(balance: Money, rate: Rate) -> Result<Money> {
    balance
        .checked_mul(rate.as_decimal())
        .ok_or_else(|| EngineError::overflow("period interest"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CalendarUnit;
    use rust_decimal_macros::dec;

    #[test]
    fn test_fixed_day_rate() {
        let rate = period_rate(Rate::from_decimal(dec!(0.365)), Cadence::FixedDays(30)).unwrap();
        assert_eq!(rate.as_decimal(), dec!(0.03));
    }

    #[test]
    fn test_calendar_rate() {
        let annual = Rate::from_percentage(12);
        assert_eq!(
            period_rate(annual, Cadence::monthly()).unwrap().as_decimal(),
            dec!(0.01)
        );
        let weekly = period_rate(Rate::from_decimal(dec!(0.52)), Cadence::weekly()).unwrap();
        assert_eq!(weekly.as_decimal(), dec!(0.01));
        assert!(period_rate(annual, Cadence::Calendar(CalendarUnit::Month, 0)).is_err());
    }

    #[test]
    fn test_period_interest() {
        let interest = period_interest(Money::from_major(1_000_000), Rate::from_decimal(dec!(0.01))).unwrap();
        assert_eq!(interest, Money::from_major(10_000));
    }
}
