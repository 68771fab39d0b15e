use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::decimal::Money;
use crate::errors::{EngineError, Result};
use crate::schedule::{Installment, Schedule};
use crate::types::{InstallmentStatus, LoanId};

/// stored installment row: integer amounts, ISO-8601 date, numeric status
/// (0 = scheduled, 1 = paid, 2 = overdue)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallmentRecord {
    pub period: u32,
    pub payment_date: NaiveDate,
    pub principal: i64,
    pub interest: i64,
    pub total: i64,
    pub remaining_balance: i64,
    pub status: u8,
}

/// stored schedule document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleDocument {
    pub loan_id: LoanId,
    pub installments: Vec<InstallmentRecord>,
}

fn to_units(amount: Money, field: &str, period: u32) -> Result<i64> {
    amount.to_major().ok_or_else(|| EngineError::Serialization {
        message: format!(
            "installment {} {} of {} is not a whole i64 amount",
            period, field, amount
        ),
    })
}

impl TryFrom<&Installment> for InstallmentRecord {
    type Error = EngineError;

    fn try_from(inst: &Installment) -> Result<Self> {
        Ok(InstallmentRecord {
            period: inst.period,
            payment_date: inst.payment_date,
            principal: to_units(inst.principal, "principal", inst.period)?,
            interest: to_units(inst.interest, "interest", inst.period)?,
            total: to_units(inst.total, "total", inst.period)?,
            remaining_balance: to_units(inst.remaining_balance, "remaining balance", inst.period)?,
            status: inst.status.code(),
        })
    }
}

impl TryFrom<InstallmentRecord> for Installment {
    type Error = EngineError;

    fn try_from(record: InstallmentRecord) -> Result<Self> {
        let status = InstallmentStatus::from_code(record.status).ok_or_else(|| {
            EngineError::Serialization {
                message: format!(
                    "installment {} has unknown status code {}",
                    record.period, record.status
                ),
            }
        })?;
        Ok(Installment {
            period: record.period,
            payment_date: record.payment_date,
            principal: Money::from_major(record.principal),
            interest: Money::from_major(record.interest),
            total: Money::from_major(record.total),
            remaining_balance: Money::from_major(record.remaining_balance),
            status,
        })
    }
}

impl Serialize for Installment {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        InstallmentRecord::try_from(self)
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Installment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let record = InstallmentRecord::deserialize(deserializer)?;
        Installment::try_from(record).map_err(serde::de::Error::custom)
    }
}

impl Schedule {
    pub fn to_records(&self) -> Result<Vec<InstallmentRecord>> {
        self.installments().iter().map(InstallmentRecord::try_from).collect()
    }

    /// rebuild a stored schedule, checking the ledger invariants
    pub fn from_records(loan_id: LoanId, records: Vec<InstallmentRecord>) -> Result<Self> {
        let installments = records
            .into_iter()
            .map(Installment::try_from)
            .collect::<Result<Vec<_>>>()?;
        Schedule::new(loan_id, installments)
    }

    pub fn to_document(&self) -> Result<ScheduleDocument> {
        Ok(ScheduleDocument {
            loan_id: self.loan_id(),
            installments: self.to_records()?,
        })
    }

    pub fn from_document(document: ScheduleDocument) -> Result<Self> {
        Schedule::from_records(document.loan_id, document.installments)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_document()?)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Schedule::from_document(serde_json::from_str(json)?)
    }
}
