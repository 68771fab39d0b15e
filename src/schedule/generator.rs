use rust_decimal::Decimal;
use uuid::Uuid;

use crate::calendar;
use crate::config::{EngineConfig, RoundingConfig};
use crate::decimal::{Money, Rate};
use crate::errors::{EngineError, Result};
use crate::events::{Event, EventStore};
use crate::interest::{period_interest, period_rate};
use crate::rounding::reconciliation_residual;
use crate::schedule::{Installment, Schedule};
use crate::types::{AmortizationMethod, InstallmentStatus, LoanId, LoanTerms};

/// generate a schedule with the default configuration
pub fn generate_schedule(terms: &LoanTerms) -> Result<Schedule> {
    ScheduleGenerator::default().generate(terms)
}

/// builds repayment schedules for all amortization methods
///
/// Periods `1..n-1` are computed from the method's formula with every
/// amount rounded; period `n` takes whatever principal remains, so the
/// principal column always sums to the contracted principal.
#[derive(Debug, Clone, Default)]
pub struct ScheduleGenerator {
    rounding: RoundingConfig,
}

impl ScheduleGenerator {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_rounding(config.rounding)
    }

    pub fn with_rounding(rounding: RoundingConfig) -> Self {
        Self { rounding }
    }

    pub fn rounding(&self) -> RoundingConfig {
        self.rounding
    }

    /// generate a schedule for a new loan
    pub fn generate(&self, terms: &LoanTerms) -> Result<Schedule> {
        self.generate_for(Uuid::new_v4(), terms)
    }

    /// generate a schedule owned by an existing loan
    pub fn generate_for(&self, loan_id: LoanId, terms: &LoanTerms) -> Result<Schedule> {
        terms.validate()?;
        self.rounding.payment.validate()?;
        self.rounding.split.validate()?;

        tracing::debug!(
            %loan_id,
            method = ?terms.method,
            cadence = ?terms.cadence,
            num_payments = terms.num_payments,
            principal = %terms.principal,
            "generating repayment schedule"
        );

        let installments = self.calculate_installments(terms)?;
        let schedule = Schedule::from_parts(loan_id, installments);

        tracing::debug!(
            %loan_id,
            installments = schedule.len(),
            "repayment schedule generated"
        );
        Ok(schedule)
    }

    /// generate and record the generation in an event store
    pub fn generate_recorded(
        &self,
        loan_id: LoanId,
        terms: &LoanTerms,
        events: &mut EventStore,
    ) -> Result<Schedule> {
        let schedule = self.generate_for(loan_id, terms)?;
        let totals = schedule.totals()?;
        events.emit(Event::ScheduleGenerated {
            loan_id,
            method: terms.method,
            num_payments: terms.num_payments,
            principal: totals.principal,
            total_interest: totals.interest,
            first_payment_date: schedule.installment(1)?.payment_date,
        });
        Ok(schedule)
    }

    fn calculate_installments(&self, terms: &LoanTerms) -> Result<Vec<Installment>> {
        let n = terms.num_payments;
        // the last date is the latest one, so an out-of-range term fails before any row is built
        calendar::payment_date(terms.start_date, terms.cadence, n)?;

        let rate = period_rate(terms.annual_interest_rate, terms.cadence)?;
        let level = self.level_amount(terms, rate)?;

        let mut installments = Vec::new();
        let mut allocated = Vec::new();
        let mut remaining = terms.principal;

        for period in 1..=n {
            let payment_date = calendar::payment_date(terms.start_date, terms.cadence, period)?;
            let interest = self.rounding.split.round_amount(period_interest(remaining, rate)?)?;

            let principal = if period == n {
                // the final period carries every unit still owed
                reconciliation_residual(terms.principal, &allocated)?
            } else {
                let nominal = match terms.method {
                    AmortizationMethod::EqualPayment => {
                        let split = level
                            .checked_sub(interest)
                            .ok_or_else(|| EngineError::overflow("principal split"))?;
                        self.rounding.split.round_amount(split)?
                    }
                    AmortizationMethod::EqualPrincipal => level,
                    AmortizationMethod::Bullet => Money::ZERO,
                };
                nominal.max(Money::ZERO).min(remaining)
            };

            allocated.push(principal);
            let total = principal
                .checked_add(interest)
                .ok_or_else(|| EngineError::overflow("installment total"))?;
            remaining = remaining
                .checked_sub(principal)
                .ok_or_else(|| EngineError::overflow("remaining balance"))?;
            debug_assert!(!remaining.is_negative(), "remaining balance went negative");

            installments.push(Installment {
                period,
                payment_date,
                principal,
                interest,
                total,
                remaining_balance: remaining,
                status: InstallmentStatus::Scheduled,
            });
        }

        Ok(installments)
    }

    /// level payment for equal payment, level principal for equal principal
    fn level_amount(&self, terms: &LoanTerms, rate: Rate) -> Result<Money> {
        let n = Decimal::from(terms.num_payments);
        let raw = match terms.method {
            AmortizationMethod::EqualPayment => annuity_payment(terms.principal, rate, terms.num_payments)?,
            AmortizationMethod::EqualPrincipal => terms
                .principal
                .checked_div(n)
                .ok_or_else(|| EngineError::overflow("level principal"))?,
            AmortizationMethod::Bullet => return Ok(Money::ZERO),
        };
        self.rounding.payment.round_amount(raw)
    }
}

/// unrounded annuity payment `P * r * (1+r)^n / ((1+r)^n - 1)`
fn annuity_payment(principal: Money, rate: Rate, periods: u32) -> Result<Money> {
    let r = rate.as_decimal();
    let overflow = || EngineError::overflow("annuity payment");

    let compound = compound_factor(Decimal::ONE + r, periods).ok_or_else(overflow)?;
    let denominator = compound - Decimal::ONE;
    if r.is_zero() || denominator.is_zero() {
        return principal
            .checked_div(Decimal::from(periods))
            .ok_or_else(overflow);
    }

    principal
        .checked_mul(r)
        .and_then(|v| v.checked_mul(compound))
        .and_then(|v| v.checked_div(denominator))
        .ok_or_else(overflow)
}

/// `base^exp` by repeated squaring, `None` on overflow
fn compound_factor(base: Decimal, mut exp: u32) -> Option<Decimal> {
    let mut result = Decimal::ONE;
    let mut square = base;
    while exp > 0 {
        if exp & 1 == 1 {
            result = result.checked_mul(square)?;
        }
        exp >>= 1;
        if exp > 0 {
            square = square.checked_mul(square)?;
        }
    }
    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rounding::RoundingPolicy;
    use crate::types::{Cadence, CalendarUnit};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn scenario(method: AmortizationMethod) -> LoanTerms {
        LoanTerms::new(
            date(2024, 1, 1),
            Money::from_major(1_200_000),
            Rate::from_decimal(dec!(0.28)),
            12,
            Cadence::FixedDays(30),
            method,
        )
    }

    fn day_generator() -> ScheduleGenerator {
        ScheduleGenerator::new(EngineConfig::day_cadence())
    }

    fn m(v: i64) -> Money {
        Money::from_major(v)
    }

    fn assert_reconciled(schedule: &Schedule, principal: Money) {
        assert_eq!(schedule.principal(), principal);
        assert_eq!(schedule.last().unwrap().remaining_balance, Money::ZERO);
        for pair in schedule.installments().windows(2) {
            assert!(pair[1].payment_date > pair[0].payment_date);
            assert_eq!(pair[0].remaining_balance - pair[1].principal, pair[1].remaining_balance);
        }
        for inst in schedule.installments() {
            assert_eq!(inst.total, inst.principal + inst.interest);
            assert!(!inst.principal.is_negative());
            assert!(!inst.interest.is_negative());
        }
    }

    #[test]
    fn test_equal_payment_scenario() {
        let schedule = day_generator()
            .generate(&scenario(AmortizationMethod::EqualPayment))
            .unwrap();

        assert_eq!(schedule.len(), 12);
        assert_reconciled(&schedule, m(1_200_000));

        // level payment 115,578.4 rounded up to the hundred
        for inst in &schedule.installments()[..11] {
            assert_eq!(inst.total, m(115_600));
        }
        let first = schedule.installment(1).unwrap();
        assert_eq!((first.principal, first.interest), (m(87_900), m(27_700)));

        let last = schedule.installment(12).unwrap();
        assert_eq!(last.principal, m(113_500));
        assert_eq!(last.interest, m(2_700));
        assert_eq!(last.total, m(116_200));
    }

    #[test]
    fn test_equal_principal_scenario() {
        let schedule = day_generator()
            .generate(&scenario(AmortizationMethod::EqualPrincipal))
            .unwrap();

        assert_eq!(schedule.len(), 12);
        assert_reconciled(&schedule, m(1_200_000));
        for inst in schedule.installments() {
            assert_eq!(inst.principal, m(100_000));
        }
        for pair in schedule.installments().windows(2) {
            assert!(pair[1].interest < pair[0].interest);
        }
        assert_eq!(schedule.installment(1).unwrap().interest, m(27_700));
        assert_eq!(schedule.installment(12).unwrap().interest, m(2_400));
    }

    #[test]
    fn test_bullet_scenario() {
        let schedule = day_generator()
            .generate(&scenario(AmortizationMethod::Bullet))
            .unwrap();

        assert_reconciled(&schedule, m(1_200_000));
        for inst in &schedule.installments()[..11] {
            assert_eq!(inst.principal, Money::ZERO);
            assert_eq!(inst.remaining_balance, m(1_200_000));
        }
        for inst in schedule.installments() {
            assert_eq!(inst.interest, m(27_700));
        }
        let last = schedule.last().unwrap();
        assert_eq!(last.principal, m(1_200_000));
        assert_eq!(last.total, m(1_227_700));
    }

    #[test]
    fn test_fixed_day_dates() {
        let schedule = day_generator()
            .generate(&scenario(AmortizationMethod::EqualPayment))
            .unwrap();
        assert_eq!(schedule.installment(1).unwrap().payment_date, date(2024, 1, 31));
        assert_eq!(schedule.installment(2).unwrap().payment_date, date(2024, 3, 1));
        assert_eq!(schedule.installment(12).unwrap().payment_date, date(2024, 12, 26));
    }

    #[test]
    fn test_calendar_cadence_equal_payment() {
        let terms = LoanTerms::new(
            date(2024, 1, 31),
            m(1_000_000),
            Rate::from_percentage(12),
            12,
            Cadence::monthly(),
            AmortizationMethod::EqualPayment,
        );
        let schedule = ScheduleGenerator::new(EngineConfig::calendar_cadence())
            .generate(&terms)
            .unwrap();

        assert_reconciled(&schedule, m(1_000_000));
        let first = schedule.installment(1).unwrap();
        assert_eq!(first.payment_date, date(2024, 2, 29));
        assert_eq!((first.principal, first.interest), (m(78_900), m(10_000)));
        assert_eq!(schedule.installment(2).unwrap().payment_date, date(2024, 3, 31));

        let last = schedule.last().unwrap();
        assert_eq!((last.principal, last.interest, last.total), (m(87_300), m(900), m(88_200)));
    }

    #[test]
    fn test_exact_rounding() {
        let terms = LoanTerms::new(
            date(2024, 1, 1),
            m(1_000_000),
            Rate::from_percentage(12),
            12,
            Cadence::monthly(),
            AmortizationMethod::EqualPayment,
        );
        let schedule = ScheduleGenerator::new(EngineConfig::exact()).generate(&terms).unwrap();

        assert_reconciled(&schedule, m(1_000_000));
        assert_eq!(schedule.installment(1).unwrap().total, m(88_849));
        let last = schedule.last().unwrap();
        assert_eq!((last.principal, last.interest), (m(87_967), m(880)));
    }

    #[test]
    fn test_zero_rate() {
        for method in [
            AmortizationMethod::EqualPayment,
            AmortizationMethod::EqualPrincipal,
            AmortizationMethod::Bullet,
        ] {
            let terms = LoanTerms::new(
                date(2024, 1, 1),
                m(1_000),
                Rate::ZERO,
                3,
                Cadence::weekly(),
                method,
            );
            let schedule = ScheduleGenerator::new(EngineConfig::exact()).generate(&terms).unwrap();
            assert_reconciled(&schedule, m(1_000));
            assert!(schedule.installments().iter().all(|i| i.interest.is_zero()));
        }
    }

    #[test]
    fn test_coarse_rounding_never_overdraws() {
        // level principal rounds up to 200, which would overshoot by period 6
        let terms = LoanTerms::new(
            date(2024, 1, 1),
            m(1_000),
            Rate::from_decimal(dec!(0.1)),
            7,
            Cadence::calendar(CalendarUnit::TwoWeeks),
            AmortizationMethod::EqualPrincipal,
        );
        let schedule = ScheduleGenerator::with_rounding(RoundingConfig::uniform(RoundingPolicy::ceiling(100)))
            .generate(&terms)
            .unwrap();

        assert_reconciled(&schedule, m(1_000));
        assert_eq!(schedule.len(), 7);
        assert_eq!(schedule.installment(6).unwrap().principal, Money::ZERO);
        assert_eq!(schedule.last().unwrap().principal, Money::ZERO);
    }

    #[test]
    fn test_single_payment() {
        let mut terms = scenario(AmortizationMethod::EqualPayment);
        terms.num_payments = 1;
        let schedule = day_generator().generate(&terms).unwrap();
        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule.last().unwrap().principal, m(1_200_000));
        assert_eq!(schedule.last().unwrap().interest, m(27_700));
    }

    #[test]
    fn test_invalid_terms() {
        let mut terms = scenario(AmortizationMethod::EqualPayment);
        terms.annual_interest_rate = Rate::from_decimal(dec!(28));
        assert!(matches!(
            day_generator().generate(&terms),
            Err(EngineError::InvalidLoanTerms { .. })
        ));

        let mut terms = scenario(AmortizationMethod::Bullet);
        terms.num_payments = 0;
        assert!(generate_schedule(&terms).is_err());
    }

    #[test]
    fn test_overflow_is_reported() {
        let terms = LoanTerms::new(
            date(2024, 1, 1),
            Money::from_decimal(Decimal::MAX),
            Rate::from_decimal(dec!(0.99)),
            600,
            Cadence::FixedDays(365),
            AmortizationMethod::EqualPayment,
        );
        assert!(matches!(
            day_generator().generate(&terms),
            Err(EngineError::ArithmeticOverflow { .. })
        ));
    }

    #[test]
    fn test_payment_count_beyond_calendar_range() {
        let mut terms = scenario(AmortizationMethod::EqualPayment);
        terms.num_payments = u32::MAX;
        terms.cadence = Cadence::FixedDays(1);
        assert!(matches!(
            day_generator().generate(&terms),
            Err(EngineError::InvalidDate { .. })
        ));
    }

    #[test]
    fn test_column_sums_overflow_reported() {
        // every row fits in a Decimal, the interest column does not
        let terms = LoanTerms::new(
            date(2024, 1, 1),
            Money::from_decimal(Decimal::from_i128_with_scale(10_000_000_000_000_000_000_000_000_000, 0)),
            Rate::from_decimal(dec!(0.99)),
            120,
            Cadence::FixedDays(30),
            AmortizationMethod::Bullet,
        );
        let generator = day_generator();

        let schedule = generator.generate(&terms).unwrap();
        assert_eq!(schedule.len(), 120);
        assert!(matches!(
            schedule.totals(),
            Err(EngineError::ArithmeticOverflow { .. })
        ));
        assert!(matches!(
            schedule.balance_as_of(date(2040, 1, 1)),
            Err(EngineError::ArithmeticOverflow { .. })
        ));

        let mut events = EventStore::new();
        assert!(matches!(
            generator.generate_recorded(Uuid::new_v4(), &terms, &mut events),
            Err(EngineError::ArithmeticOverflow { .. })
        ));
        assert!(events.events().is_empty());
    }

    #[test]
    fn test_generate_recorded() {
        let mut events = EventStore::new();
        let loan_id = Uuid::new_v4();
        let schedule = day_generator()
            .generate_recorded(loan_id, &scenario(AmortizationMethod::EqualPrincipal), &mut events)
            .unwrap();

        assert_eq!(schedule.loan_id(), loan_id);
        match &events.events()[0] {
            Event::ScheduleGenerated {
                num_payments,
                total_interest,
                first_payment_date,
                ..
            } => {
                assert_eq!(*num_payments, 12);
                assert_eq!(*total_interest, m(180_600));
                assert_eq!(*first_payment_date, date(2024, 1, 31));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_compound_factor() {
        assert_eq!(compound_factor(dec!(2), 10), Some(dec!(1024)));
        assert_eq!(compound_factor(dec!(1.5), 0), Some(Decimal::ONE));
        assert_eq!(compound_factor(Decimal::MAX, 2), None);
    }
}
