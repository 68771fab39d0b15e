pub mod generator;
pub mod serialization;

use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{EngineError, Result};
use crate::events::{Event, EventStore};
use crate::lifecycle::{self, Transition};
use crate::types::{AmortizationMethod, Cadence, InstallmentStatus, LoanId, LoanTerms};

pub use generator::{generate_schedule, ScheduleGenerator};
pub use serialization::{InstallmentRecord, ScheduleDocument};

/// one row of a repayment schedule
///
/// Only `status` changes after generation; amounts and dates are fixed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Installment {
    pub period: u32,
    pub payment_date: NaiveDate,
    pub principal: Money,
    pub interest: Money,
    pub total: Money,
    pub remaining_balance: Money,
    pub status: InstallmentStatus,
}

impl Installment {
    pub fn is_paid(&self) -> bool {
        self.status.is_settled()
    }

    /// unpaid and due before `today`
    pub fn is_past_due(&self, today: NaiveDate) -> bool {
        !self.is_paid() && self.payment_date < today
    }
}

/// display "Total" row: column sums over a schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleTotals {
    pub principal: Money,
    pub interest: Money,
    pub total: Money,
}

/// balance position of a schedule on a given date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceReport {
    pub as_of: NaiveDate,
    pub paid_principal: Money,
    pub paid_interest: Money,
    pub outstanding_principal: Money,
    /// principal of unpaid installments already past due
    pub overdue_principal: Money,
    /// principal plus interest of unpaid installments already past due
    pub overdue_amount: Money,
    pub overdue_count: u32,
    pub next_due: Option<NaiveDate>,
}

/// ordered repayment schedule owned by one loan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    loan_id: LoanId,
    installments: Vec<Installment>,
}

impl Schedule {
    /// build a schedule from stored installments, checking the ledger invariants
    pub fn new(loan_id: LoanId, installments: Vec<Installment>) -> Result<Self> {
        validate_installments(&installments)?;
        Ok(Self::from_parts(loan_id, installments))
    }

    pub(crate) fn from_parts(loan_id: LoanId, installments: Vec<Installment>) -> Self {
        Self {
            loan_id,
            installments,
        }
    }

    pub fn loan_id(&self) -> LoanId {
        self.loan_id
    }

    pub fn installments(&self) -> &[Installment] {
        &self.installments
    }

    pub fn len(&self) -> usize {
        self.installments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.installments.is_empty()
    }

    pub fn last(&self) -> Option<&Installment> {
        self.installments.last()
    }

    pub fn installment(&self, period: u32) -> Result<&Installment> {
        period
            .checked_sub(1)
            .and_then(|idx| self.installments.get(idx as usize))
            .ok_or(EngineError::PeriodNotFound { period })
    }

    fn index_of(&self, period: u32) -> Result<usize> {
        self.installment(period)?;
        Ok((period - 1) as usize)
    }

    /// contracted principal, the sum of the principal column
    ///
    /// Partial sums never exceed the first row's principal plus its remaining
    /// balance, so this cannot overflow on a validated schedule.
    pub fn principal(&self) -> Money {
        self.installments.iter().map(|i| i.principal).sum()
    }

    /// column sums; the interest and total columns may exceed `Decimal` range
    /// even when every row fits
    pub fn totals(&self) -> Result<ScheduleTotals> {
        let column = |pick: fn(&Installment) -> Money| {
            Money::checked_sum(self.installments.iter().map(pick))
                .ok_or_else(|| EngineError::overflow("schedule totals"))
        };
        Ok(ScheduleTotals {
            principal: column(|i| i.principal)?,
            interest: column(|i| i.interest)?,
            total: column(|i| i.total)?,
        })
    }

    /// principal not yet marked paid
    pub fn unpaid_principal(&self) -> Money {
        self.installments
            .iter()
            .filter(|i| !i.is_paid())
            .map(|i| i.principal)
            .sum()
    }

    pub fn balance_as_of(&self, today: NaiveDate) -> Result<BalanceReport> {
        let mut report = BalanceReport {
            as_of: today,
            paid_principal: Money::ZERO,
            paid_interest: Money::ZERO,
            outstanding_principal: Money::ZERO,
            overdue_principal: Money::ZERO,
            overdue_amount: Money::ZERO,
            overdue_count: 0,
            next_due: None,
        };
        let add = |acc: Money, amount: Money| {
            acc.checked_add(amount)
                .ok_or_else(|| EngineError::overflow("balance report"))
        };

        for installment in &self.installments {
            if installment.is_paid() {
                report.paid_principal = add(report.paid_principal, installment.principal)?;
                report.paid_interest = add(report.paid_interest, installment.interest)?;
                continue;
            }
            report.outstanding_principal = add(report.outstanding_principal, installment.principal)?;
            if installment.is_past_due(today) {
                report.overdue_principal = add(report.overdue_principal, installment.principal)?;
                report.overdue_amount = add(report.overdue_amount, installment.total)?;
                report.overdue_count += 1;
            } else if report.next_due.is_none() {
                report.next_due = Some(installment.payment_date);
            }
        }

        Ok(report)
    }

    /// apply one lifecycle transition in place
    pub fn apply(
        &mut self,
        period: u32,
        transition: Transition,
        today: NaiveDate,
        events: &mut EventStore,
    ) -> Result<&Installment> {
        let idx = self.index_of(period)?;
        let updated = lifecycle::apply(&self.installments[idx], transition, today)?;
        let old_status = self.installments[idx].status;

        events.emit(Event::InstallmentStatusChanged {
            loan_id: self.loan_id,
            period,
            old_status,
            new_status: updated.status,
            transition,
            on: today,
        });
        self.installments[idx] = updated;
        Ok(&self.installments[idx])
    }

    /// apply a transition as of the provider's current date
    pub fn apply_now(
        &mut self,
        period: u32,
        transition: Transition,
        time_provider: &SafeTimeProvider,
        events: &mut EventStore,
    ) -> Result<&Installment> {
        self.apply(period, transition, time_provider.now().date_naive(), events)
    }

    /// batch repayment: every unpaid installment up to and including `period`
    ///
    /// Either all of them are marked paid or, on error, none are.
    pub fn mark_paid_through(
        &mut self,
        period: u32,
        today: NaiveDate,
        events: &mut EventStore,
    ) -> Result<Vec<u32>> {
        let end = self.index_of(period)? + 1;
        let mut updated = self.installments.clone();
        let mut pending = Vec::new();

        for installment in updated[..end].iter_mut().filter(|i| !i.is_paid()) {
            let paid = lifecycle::mark_paid(installment)?;
            pending.push(Event::InstallmentStatusChanged {
                loan_id: self.loan_id,
                period: installment.period,
                old_status: installment.status,
                new_status: paid.status,
                transition: Transition::MarkPaid,
                on: today,
            });
            *installment = paid;
        }

        let periods = pending
            .iter()
            .filter_map(|e| match e {
                Event::InstallmentStatusChanged { period, .. } => Some(*period),
                _ => None,
            })
            .collect();
        self.installments = updated;
        pending.into_iter().for_each(|e| events.emit(e));

        tracing::debug!(loan_id = %self.loan_id, through = period, ?periods, "batch repayment applied");
        Ok(periods)
    }

    /// overdue registration: flag every scheduled installment due before `today`
    pub fn sweep_overdue(&mut self, today: NaiveDate, events: &mut EventStore) -> Vec<u32> {
        let mut flagged = Vec::new();
        for installment in self.installments.iter_mut() {
            if installment.status != InstallmentStatus::Scheduled {
                continue;
            }
            if let Ok(overdue) = lifecycle::mark_overdue(installment, today) {
                events.emit(Event::InstallmentStatusChanged {
                    loan_id: self.loan_id,
                    period: installment.period,
                    old_status: installment.status,
                    new_status: overdue.status,
                    transition: Transition::MarkOverdue,
                    on: today,
                });
                flagged.push(installment.period);
                *installment = overdue;
            }
        }
        flagged
    }

    /// overdue conversion: a fresh schedule for the unpaid principal from a new start date
    ///
    /// The current schedule is left untouched; the caller decides how to
    /// retire it.
    pub fn reroot(
        &self,
        start_date: NaiveDate,
        annual_interest_rate: Rate,
        num_payments: u32,
        cadence: Cadence,
        method: AmortizationMethod,
        generator: &ScheduleGenerator,
        events: &mut EventStore,
    ) -> Result<Schedule> {
        let principal = self.unpaid_principal();
        let terms = LoanTerms::new(
            start_date,
            principal,
            annual_interest_rate,
            num_payments,
            cadence,
            method,
        );
        let rerooted = generator.generate_for(self.loan_id, &terms)?;

        events.emit(Event::ScheduleRerooted {
            loan_id: self.loan_id,
            start_date,
            principal,
            num_payments,
            method,
        });
        Ok(rerooted)
    }
}

fn validate_installments(installments: &[Installment]) -> Result<()> {
    let invalid = |message: String| EngineError::Serialization { message };

    let last = installments
        .last()
        .ok_or_else(|| invalid("schedule has no installments".to_string()))?;
    if !last.remaining_balance.is_zero() {
        return Err(invalid(format!(
            "final installment leaves a balance of {}",
            last.remaining_balance
        )));
    }

    let mut previous: Option<&Installment> = None;
    for (idx, inst) in installments.iter().enumerate() {
        if inst.period as usize != idx + 1 {
            return Err(invalid(format!(
                "expected period {} at position {}, found {}",
                idx + 1,
                idx,
                inst.period
            )));
        }
        let amounts = [inst.principal, inst.interest, inst.total, inst.remaining_balance];
        if amounts.iter().any(|m| m.is_negative() || !m.is_integral()) {
            return Err(invalid(format!(
                "installment {} has a negative or fractional amount",
                inst.period
            )));
        }
        if inst.principal.checked_add(inst.interest) != Some(inst.total) {
            return Err(invalid(format!(
                "installment {} total does not equal principal plus interest",
                inst.period
            )));
        }
        if let Some(prev) = previous {
            if inst.payment_date <= prev.payment_date {
                return Err(invalid(format!(
                    "installment {} is not dated after installment {}",
                    inst.period, prev.period
                )));
            }
            if prev.remaining_balance.checked_sub(inst.principal) != Some(inst.remaining_balance) {
                return Err(invalid(format!(
                    "installment {} balance does not follow from installment {}",
                    inst.period, prev.period
                )));
            }
        }
        previous = Some(inst);
    }
    Ok(())
}
