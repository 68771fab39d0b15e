pub mod calendar;
pub mod config;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod interest;
pub mod lifecycle;
pub mod rounding;
pub mod schedule;
pub mod types;

// re-export key types
pub use config::{EngineConfig, RoundingConfig};
pub use decimal::{Money, Rate};
pub use errors::{EngineError, Result};
pub use events::{Event, EventStore};
pub use interest::{
    days_late, overdue_interest, OverdueCalculator, OverdueConfig, OverdueQuote, OverdueSummary,
};
pub use lifecycle::{cancel_overdue, mark_overdue, mark_paid, revert_to_scheduled, Transition};
pub use rounding::{RoundingMode, RoundingPolicy};
pub use schedule::{
    generate_schedule, BalanceReport, Installment, InstallmentRecord, Schedule, ScheduleDocument,
    ScheduleGenerator, ScheduleTotals,
};
pub use types::{
    AmortizationMethod, Cadence, CalendarUnit, InstallmentStatus, LoanDuration, LoanId, LoanTerms,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
