use thiserror::Error;

use crate::types::InstallmentStatus;
use crate::lifecycle::Transition;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("invalid loan terms: {message}")]
    InvalidLoanTerms {
        message: String,
    },

    #[error("invalid term: {message}")]
    InvalidTerm {
        message: String,
    },

    #[error("arithmetic overflow during {operation}")]
    ArithmeticOverflow {
        operation: &'static str,
    },

    #[error("invalid transition: cannot {action} installment {period} from {from:?}")]
    InvalidTransition {
        period: u32,
        from: InstallmentStatus,
        action: Transition,
    },

    #[error("installment {period} not found in schedule")]
    PeriodNotFound {
        period: u32,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("invalid date: {message}")]
    InvalidDate {
        message: String,
    },

    #[error("serialization error: {message}")]
    Serialization {
        message: String,
    },
}

impl EngineError {
    pub(crate) fn invalid_terms(message: impl Into<String>) -> Self {
        EngineError::InvalidLoanTerms {
            message: message.into(),
        }
    }

    pub(crate) fn overflow(operation: &'static str) -> Self {
        EngineError::ArithmeticOverflow { operation }
    }

    /// whether the caller may re-read current state and try again
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidTransition { .. } | EngineError::PeriodNotFound { .. }
        )
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Serialization {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
