use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{EngineError, Result};

/// how a value is brought onto a multiple of the rounding unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoundingMode {
    /// next multiple at or above the value; never under-collects
    Ceiling,
    /// closest multiple, halves away from zero
    Nearest,
}

/// rounding unit and mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoundingPolicy {
    /// currency units per step, e.g. 100 rounds to the nearest hundred
    pub unit: u32,
    pub mode: RoundingMode,
}

impl RoundingPolicy {
    pub const DEFAULT_UNIT: u32 = 100;

    pub fn new(unit: u32, mode: RoundingMode) -> Self {
        Self { unit, mode }
    }

    pub fn ceiling(unit: u32) -> Self {
        Self::new(unit, RoundingMode::Ceiling)
    }

    pub fn nearest(unit: u32) -> Self {
        Self::new(unit, RoundingMode::Nearest)
    }

    /// whole currency units, no coarser rounding
    pub fn exact() -> Self {
        Self::nearest(1)
    }

    pub fn validate(&self) -> Result<()> {
        if self.unit == 0 {
            return Err(EngineError::InvalidConfiguration {
                message: "rounding unit must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// round `value` onto a multiple of the unit
    pub fn round_amount(&self, value: Money) -> Result<Money> {
        self.validate()?;
        let unit = Decimal::from(self.unit);
        let steps = value
            .as_decimal()
            .checked_div(unit)
            .ok_or_else(|| EngineError::overflow("rounding"))?;
        let steps = match self.mode {
            RoundingMode::Ceiling => steps.ceil(),
            RoundingMode::Nearest => {
                steps.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            }
        };
        steps
            .checked_mul(unit)
            .map(Money::from_decimal)
            .ok_or_else(|| EngineError::overflow("rounding"))
    }
}

/// what the final period must carry so allocations sum to the contracted amount
///
/// Every earlier period may carry rounding noise; the residual absorbs all
/// of it, so the result is exact and unrounded.
pub fn reconciliation_residual(contracted: Money, allocated: &[Money]) -> Result<Money> {
    allocated.iter().try_fold(contracted, |remaining, part| {
        remaining
            .checked_sub(*part)
            .ok_or_else(|| EngineError::overflow("reconciliation"))
    })
}
