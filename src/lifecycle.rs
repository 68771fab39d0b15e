use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{EngineError, Result};
use crate::schedule::Installment;
use crate::types::InstallmentStatus;

/// externally triggered status change
///
/// Transitions take the installment as the caller last read it and fail
/// rather than overwrite when its status does not allow the move. Callers
/// persisting the result guard the write (version check or a single writer
/// per loan) so at most one transition commits per read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Transition {
    /// Scheduled or Overdue -> Paid
    MarkPaid,
    /// Paid -> Scheduled, undoes an erroneous payment marking
    RevertToScheduled,
    /// Scheduled -> Overdue, once the due date has passed
    MarkOverdue,
    /// Overdue -> Scheduled
    CancelOverdue,
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = match self {
            Transition::MarkPaid => "mark paid",
            Transition::RevertToScheduled => "revert to scheduled",
            Transition::MarkOverdue => "mark overdue",
            Transition::CancelOverdue => "cancel overdue",
        };
        f.write_str(action)
    }
}

impl Transition {
    /// status reached from `from`, if the transition is allowed
    pub fn target(&self, from: InstallmentStatus) -> Option<InstallmentStatus> {
        use InstallmentStatus::*;
        match (self, from) {
            (Transition::MarkPaid, Scheduled | Overdue) => Some(Paid),
            (Transition::RevertToScheduled, Paid) => Some(Scheduled),
            (Transition::MarkOverdue, Scheduled) => Some(Overdue),
            (Transition::CancelOverdue, Overdue) => Some(Scheduled),
            _ => None,
        }
    }
}

fn transition(installment: &Installment, action: Transition) -> Result<Installment> {
    let rejected = || {
        tracing::warn!(
            period = installment.period,
            from = ?installment.status,
            %action,
            "rejected installment transition"
        );
        EngineError::InvalidTransition {
            period: installment.period,
            from: installment.status,
            action,
        }
    };

    let status = action.target(installment.status).ok_or_else(rejected)?;

    tracing::debug!(
        period = installment.period,
        from = ?installment.status,
        to = ?status,
        "installment transition"
    );
    Ok(Installment {
        status,
        ..installment.clone()
    })
}

/// Scheduled or Overdue -> Paid
pub fn mark_paid(installment: &Installment) -> Result<Installment> {
    transition(installment, Transition::MarkPaid)
}

/// Paid -> Scheduled
pub fn revert_to_scheduled(installment: &Installment) -> Result<Installment> {
    transition(installment, Transition::RevertToScheduled)
}

/// Scheduled -> Overdue, only when the payment date is before `today`
pub fn mark_overdue(installment: &Installment, today: NaiveDate) -> Result<Installment> {
    if installment.payment_date >= today {
        tracing::warn!(
            period = installment.period,
            payment_date = %installment.payment_date,
            %today,
            "installment not yet due"
        );
        return Err(EngineError::InvalidTransition {
            period: installment.period,
            from: installment.status,
            action: Transition::MarkOverdue,
        });
    }
    transition(installment, Transition::MarkOverdue)
}

/// Scheduled -> Overdue as of the provider's current date
pub fn mark_overdue_now(installment: &Installment, time_provider: &SafeTimeProvider) -> Result<Installment> {
    mark_overdue(installment, time_provider.now().date_naive())
}

/// Overdue -> Scheduled
pub fn cancel_overdue(installment: &Installment) -> Result<Installment> {
    transition(installment, Transition::CancelOverdue)
}

/// dispatch any transition; `today` is only consulted by `MarkOverdue`
pub fn apply(installment: &Installment, action: Transition, today: NaiveDate) -> Result<Installment> {
    match action {
        Transition::MarkOverdue => mark_overdue(installment, today),
        other => transition(installment, other),
    }
}
