use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{EngineError, Result};
use crate::rounding::RoundingPolicy;
use crate::schedule::{Installment, Schedule};
use crate::types::InstallmentStatus;

/// overdue interest configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverdueConfig {
    /// rounding of the computed interest
    pub rounding: RoundingPolicy,
    /// days after the due date before interest starts to run
    pub grace_period_days: u32,
}

impl Default for OverdueConfig {
    fn default() -> Self {
        Self {
            rounding: RoundingPolicy::exact(),
            grace_period_days: 0,
        }
    }
}

/// whole days between a due date and `today`, never negative
pub fn days_late(payment_date: NaiveDate, today: NaiveDate) -> u32 {
    let days = (today - payment_date).num_days();
    u32::try_from(days.max(0)).unwrap_or(u32::MAX)
}

/// simple interest on an overdue amount, rounded to whole currency units
///
/// `round(base_amount * annual_rate / 365 * days_late)`. A non-positive
/// `days_late` yields zero.
pub fn overdue_interest(base_amount: Money, days_late: i64, annual_rate: Rate) -> Result<Money> {
    simple_interest(base_amount, days_late, annual_rate, RoundingPolicy::exact())
}

fn simple_interest(
    base_amount: Money,
    days_late: i64,
    annual_rate: Rate,
    rounding: RoundingPolicy,
) -> Result<Money> {
    if days_late <= 0 {
        return Ok(Money::ZERO);
    }
    let raw = u32::try_from(days_late)
        .ok()
        .and_then(|days| base_amount.apply_rate(annual_rate, days))
        .ok_or_else(|| EngineError::overflow("overdue interest"))?;
    rounding.round_amount(raw)
}

/// overdue interest owed on one installment as of a date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverdueQuote {
    pub period: u32,
    pub payment_date: NaiveDate,
    pub as_of: NaiveDate,
    pub base_amount: Money,
    /// days past due, before any grace period is applied
    pub days_late: u32,
    pub rate: Rate,
    pub interest_amount: Money,
}

/// overdue quotes across a schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverdueSummary {
    pub as_of: NaiveDate,
    pub quotes: Vec<OverdueQuote>,
    pub total_base: Money,
    pub total_interest: Money,
}

impl OverdueSummary {
    /// base plus interest
    pub fn total_due(&self) -> Result<Money> {
        self.total_base
            .checked_add(self.total_interest)
            .ok_or_else(|| EngineError::overflow("overdue total due"))
    }
}

/// computes overdue interest with the configured rounding and grace period
#[derive(Debug, Clone, Default)]
pub struct OverdueCalculator {
    pub config: OverdueConfig,
}

impl OverdueCalculator {
    pub fn new(config: OverdueConfig) -> Self {
        Self { config }
    }

    /// interest for `days_late` days past due, after the grace period
    pub fn interest(&self, base_amount: Money, days_late: i64, annual_rate: Rate) -> Result<Money> {
        let charged = days_late - self.config.grace_period_days as i64;
        simple_interest(base_amount, charged, annual_rate, self.config.rounding)
    }

    /// quote for an unpaid installment past its due date, `None` otherwise
    pub fn quote(
        &self,
        installment: &Installment,
        annual_rate: Rate,
        today: NaiveDate,
    ) -> Result<Option<OverdueQuote>> {
        if installment.status == InstallmentStatus::Paid || installment.payment_date >= today {
            return Ok(None);
        }
        let days = days_late(installment.payment_date, today);
        let interest_amount = self.interest(installment.total, days as i64, annual_rate)?;

        Ok(Some(OverdueQuote {
            period: installment.period,
            payment_date: installment.payment_date,
            as_of: today,
            base_amount: installment.total,
            days_late: days,
            rate: annual_rate,
            interest_amount,
        }))
    }

    /// quote as of the provider's current date
    pub fn quote_now(
        &self,
        installment: &Installment,
        annual_rate: Rate,
        time_provider: &SafeTimeProvider,
    ) -> Result<Option<OverdueQuote>> {
        self.quote(installment, annual_rate, time_provider.now().date_naive())
    }

    /// quotes for every unpaid past-due installment
    pub fn quote_schedule(
        &self,
        schedule: &Schedule,
        annual_rate: Rate,
        today: NaiveDate,
    ) -> Result<OverdueSummary> {
        let mut quotes = Vec::new();
        let mut total_base = Money::ZERO;
        let mut total_interest = Money::ZERO;

        for installment in schedule.installments() {
            if let Some(quote) = self.quote(installment, annual_rate, today)? {
                total_base = total_base
                    .checked_add(quote.base_amount)
                    .ok_or_else(|| EngineError::overflow("overdue totals"))?;
                total_interest = total_interest
                    .checked_add(quote.interest_amount)
                    .ok_or_else(|| EngineError::overflow("overdue totals"))?;
                quotes.push(quote);
            }
        }

        tracing::debug!(
            loan_id = %schedule.loan_id(),
            %today,
            overdue = quotes.len(),
            %total_interest,
            "quoted overdue interest"
        );

        Ok(OverdueSummary {
            as_of: today,
            quotes,
            total_base,
            total_interest,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::schedule::ScheduleGenerator;
    use crate::types::{AmortizationMethod, Cadence, LoanTerms};
    use chrono::{TimeZone, Utc};
    use hourglass_rs::TimeSource;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn schedule() -> Schedule {
        let terms = LoanTerms::new(
            date(2024, 1, 1),
            Money::from_major(1_200_000),
            Rate::from_decimal(dec!(0.28)),
            12,
            Cadence::FixedDays(30),
            AmortizationMethod::EqualPrincipal,
        );
        ScheduleGenerator::new(EngineConfig::day_cadence())
            .generate(&terms)
            .unwrap()
    }

    #[test]
    fn test_overdue_interest_example() {
        let interest =
            overdue_interest(Money::from_major(100_000), 10, Rate::from_decimal(dec!(0.28))).unwrap();
        assert_eq!(interest, Money::from_major(767));
    }

    #[test]
    fn test_overdue_interest_is_repeatable() {
        let rate = Rate::from_decimal(dec!(0.28));
        let first = overdue_interest(Money::from_major(123_456), 17, rate).unwrap();
        let second = overdue_interest(Money::from_major(123_456), 17, rate).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_non_positive_days() {
        let rate = Rate::from_decimal(dec!(0.28));
        assert_eq!(overdue_interest(Money::from_major(100_000), 0, rate).unwrap(), Money::ZERO);
        assert_eq!(overdue_interest(Money::from_major(100_000), -5, rate).unwrap(), Money::ZERO);
    }

    #[test]
    fn test_days_late() {
        assert_eq!(days_late(date(2024, 3, 1), date(2024, 3, 11)), 10);
        assert_eq!(days_late(date(2024, 3, 11), date(2024, 3, 1)), 0);
    }

    #[test]
    fn test_grace_period_and_rounding() {
        let calculator = OverdueCalculator::new(OverdueConfig {
            rounding: RoundingPolicy::ceiling(100),
            grace_period_days: 5,
        });
        let rate = Rate::from_decimal(dec!(0.28));

        assert_eq!(calculator.interest(Money::from_major(100_000), 5, rate).unwrap(), Money::ZERO);
        // 5 charged days: 383.56 -> 400
        assert_eq!(
            calculator.interest(Money::from_major(100_000), 10, rate).unwrap(),
            Money::from_major(400)
        );
    }

    #[test]
    fn test_quote_skips_paid_and_future() {
        let schedule = schedule();
        let calculator = OverdueCalculator::default();
        let rate = Rate::from_decimal(dec!(0.28));
        let first = schedule.installment(1).unwrap();

        assert!(calculator.quote(first, rate, first.payment_date).unwrap().is_none());

        let paid = crate::lifecycle::mark_paid(first).unwrap();
        assert!(calculator
            .quote(&paid, rate, date(2024, 12, 31))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_quote_schedule() {
        let schedule = schedule();
        let calculator = OverdueCalculator::default();
        let rate = Rate::from_decimal(dec!(0.28));

        // first payment 2024-01-31, second 2024-03-01
        let today = date(2024, 3, 11);
        let summary = calculator.quote_schedule(&schedule, rate, today).unwrap();

        assert_eq!(summary.quotes.len(), 2);
        assert_eq!(summary.quotes[0].days_late, 40);
        assert_eq!(summary.quotes[1].days_late, 10);

        let expected_base = schedule.installment(1).unwrap().total + schedule.installment(2).unwrap().total;
        assert_eq!(summary.total_base, expected_base);
        assert_eq!(
            summary.total_interest,
            summary.quotes[0].interest_amount + summary.quotes[1].interest_amount
        );
        assert_eq!(summary.total_due().unwrap(), summary.total_base + summary.total_interest);
    }

    #[test]
    fn test_quote_now_uses_time_provider() {
        let schedule = schedule();
        let calculator = OverdueCalculator::default();
        let rate = Rate::from_decimal(dec!(0.28));
        let time = SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2024, 2, 10, 9, 0, 0).unwrap(),
        ));

        let first = schedule.installment(1).unwrap();
        let quote = calculator.quote_now(first, rate, &time).unwrap().unwrap();
        assert_eq!(quote.days_late, 10);
        assert_eq!(quote.as_of, date(2024, 2, 10));

        let expected = overdue_interest(first.total, 10, rate).unwrap();
        assert_eq!(quote.interest_amount, expected);
    }
}
