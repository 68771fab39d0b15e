use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::interest::OverdueConfig;
use crate::rounding::RoundingPolicy;

/// engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub rounding: RoundingConfig,
    #[serde(default)]
    pub overdue: OverdueConfig,
}

/// rounding applied during schedule generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundingConfig {
    /// level payment (equal payment) and level principal (equal principal)
    pub payment: RoundingPolicy,
    /// per-period interest and principal splits
    pub split: RoundingPolicy,
}

impl RoundingConfig {
    /// one policy for everything
    pub fn uniform(policy: RoundingPolicy) -> Self {
        Self {
            payment: policy,
            split: policy,
        }
    }
}

impl Default for RoundingConfig {
    fn default() -> Self {
        EngineConfig::default().rounding
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::day_cadence()
    }
}

impl EngineConfig {
    /// fixed-day cadence loans: ceiling to the hundred everywhere
    pub fn day_cadence() -> Self {
        Self {
            rounding: RoundingConfig::uniform(RoundingPolicy::ceiling(RoundingPolicy::DEFAULT_UNIT)),
            overdue: OverdueConfig::default(),
        }
    }

    /// calendar cadence loans: ceiling on the level payment, nearest hundred on splits
    pub fn calendar_cadence() -> Self {
        Self {
            rounding: RoundingConfig {
                payment: RoundingPolicy::ceiling(RoundingPolicy::DEFAULT_UNIT),
                split: RoundingPolicy::nearest(RoundingPolicy::DEFAULT_UNIT),
            },
            overdue: OverdueConfig::default(),
        }
    }

    /// whole-unit rounding, nearest
    pub fn exact() -> Self {
        Self {
            rounding: RoundingConfig::uniform(RoundingPolicy::exact()),
            overdue: OverdueConfig::default(),
        }
    }

    pub fn with_rounding(mut self, rounding: RoundingConfig) -> Self {
        self.rounding = rounding;
        self
    }

    pub fn with_overdue(mut self, overdue: OverdueConfig) -> Self {
        self.overdue = overdue;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.rounding.payment.validate()?;
        self.rounding.split.validate()?;
        self.overdue.rounding.validate()
    }

    /// parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
