use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::lifecycle::Transition;
use crate::types::{AmortizationMethod, InstallmentStatus, LoanId};

/// schedule events for callers that keep an audit trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    ScheduleGenerated {
        loan_id: LoanId,
        method: AmortizationMethod,
        num_payments: u32,
        principal: Money,
        total_interest: Money,
        first_payment_date: NaiveDate,
    },
    InstallmentStatusChanged {
        loan_id: LoanId,
        period: u32,
        old_status: InstallmentStatus,
        new_status: InstallmentStatus,
        transition: Transition,
        on: NaiveDate,
    },
    ScheduleRerooted {
        loan_id: LoanId,
        start_date: NaiveDate,
        principal: Money,
        num_payments: u32,
        method: AmortizationMethod,
    },
}

impl Event {
    pub fn loan_id(&self) -> LoanId {
        match self {
            Event::ScheduleGenerated { loan_id, .. }
            | Event::InstallmentStatusChanged { loan_id, .. }
            | Event::ScheduleRerooted { loan_id, .. } => *loan_id,
        }
    }
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// events belonging to one loan
    pub fn for_loan(&self, loan_id: LoanId) -> impl Iterator<Item = &Event> {
        self.events.iter().filter(move |e| e.loan_id() == loan_id)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
