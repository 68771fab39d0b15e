use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calendar;
use crate::decimal::{Money, Rate};
use crate::errors::{EngineError, Result};

/// unique identifier for the loan owning a schedule
pub type LoanId = Uuid;

/// repayment method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AmortizationMethod {
    /// level total payment (annuity)
    EqualPayment,
    /// level principal, interest on remaining
    EqualPrincipal,
    /// interest only, all principal at maturity
    Bullet,
}

/// calendar unit between installments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CalendarUnit {
    Week,
    TwoWeeks,
    FourWeeks,
    Month,
}

impl CalendarUnit {
    /// fixed length in days, `None` for calendar months
    pub fn unit_days(&self) -> Option<u32> {
        match self {
            CalendarUnit::Week => Some(7),
            CalendarUnit::TwoWeeks => Some(14),
            CalendarUnit::FourWeeks => Some(28),
            CalendarUnit::Month => None,
        }
    }

    /// conventional number of periods per year
    pub fn default_count_per_year(&self) -> u32 {
        match self {
            CalendarUnit::Week => 52,
            CalendarUnit::TwoWeeks => 26,
            CalendarUnit::FourWeeks => 13,
            CalendarUnit::Month => 12,
        }
    }
}

/// time between installments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cadence {
    /// fixed number of days; per-period rate is annual / 365 * days
    FixedDays(u32),
    /// calendar unit with its periods per year; per-period rate is annual / count
    Calendar(CalendarUnit, u32),
}

impl Cadence {
    pub fn monthly() -> Self {
        Cadence::calendar(CalendarUnit::Month)
    }

    pub fn weekly() -> Self {
        Cadence::calendar(CalendarUnit::Week)
    }

    /// calendar cadence with the unit's conventional count per year
    pub fn calendar(unit: CalendarUnit) -> Self {
        Cadence::Calendar(unit, unit.default_count_per_year())
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Cadence::FixedDays(0) => Err(EngineError::invalid_terms(
                "fixed-day cadence must be at least one day",
            )),
            Cadence::Calendar(_, 0) => Err(EngineError::invalid_terms(
                "calendar cadence needs a positive count per year",
            )),
            _ => Ok(()),
        }
    }
}

/// installment payment status
///
/// The numeric codes are the ones persisted by existing stored schedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum InstallmentStatus {
    /// due in the future or not yet settled
    #[default]
    Scheduled,
    /// payment received
    Paid,
    /// past due and unpaid
    Overdue,
}

impl InstallmentStatus {
    pub fn code(&self) -> u8 {
        match self {
            InstallmentStatus::Scheduled => 0,
            InstallmentStatus::Paid => 1,
            InstallmentStatus::Overdue => 2,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(InstallmentStatus::Scheduled),
            1 => Some(InstallmentStatus::Paid),
            2 => Some(InstallmentStatus::Overdue),
            _ => None,
        }
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, InstallmentStatus::Paid)
    }
}

/// total loan duration when the payment count is not known directly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanDuration {
    Months(u32),
    Days(u32),
}

/// contracted loan terms, input to schedule generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub start_date: NaiveDate,
    pub principal: Money,
    pub annual_interest_rate: Rate,
    pub num_payments: u32,
    pub cadence: Cadence,
    pub method: AmortizationMethod,
}

impl LoanTerms {
    pub fn new(
        start_date: NaiveDate,
        principal: Money,
        annual_interest_rate: Rate,
        num_payments: u32,
        cadence: Cadence,
        method: AmortizationMethod,
    ) -> Self {
        Self {
            start_date,
            principal,
            annual_interest_rate,
            num_payments,
            cadence,
            method,
        }
    }

    /// build terms whose payment count is derived from a loan duration
    pub fn from_duration(
        start_date: NaiveDate,
        principal: Money,
        annual_interest_rate: Rate,
        duration: LoanDuration,
        cadence: Cadence,
        method: AmortizationMethod,
    ) -> Result<Self> {
        let num_payments = calendar::period_count(start_date, duration, cadence)?;
        Ok(Self::new(
            start_date,
            principal,
            annual_interest_rate,
            num_payments,
            cadence,
            method,
        ))
    }

    /// same terms with a different method
    pub fn with_method(&self, method: AmortizationMethod) -> Self {
        Self {
            method,
            ..self.clone()
        }
    }

    /// reject anything the generator cannot honor; nothing is clamped
    pub fn validate(&self) -> Result<()> {
        if !self.principal.is_positive() {
            return Err(EngineError::invalid_terms(format!(
                "principal must be positive, got {}",
                self.principal
            )));
        }
        if !self.principal.is_integral() {
            return Err(EngineError::invalid_terms(format!(
                "principal must be whole currency units, got {}",
                self.principal
            )));
        }
        if self.num_payments == 0 {
            return Err(EngineError::invalid_terms("number of payments must be positive"));
        }
        let rate = self.annual_interest_rate;
        if rate.is_negative() || rate >= Rate::ONE {
            return Err(EngineError::invalid_terms(format!(
                "annual interest rate must be a fraction in [0, 1), got {}",
                rate.as_decimal()
            )));
        }
        self.cadence.validate()
    }
}
