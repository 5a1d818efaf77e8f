//! User tier classification: a (time, money) budget pair mapped onto one of
//! nine ordinal buckets.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::step::Step;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Low,
    Medium,
    High,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserTier {
    LTLC,
    LTMC,
    LTHC,
    MTLC,
    MTMC,
    MTHC,
    HTLC,
    HTMC,
    HTHC,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("cannot classify {axis} value {value} with thresholds low<{low}, high>{high}")]
pub struct InvalidTierError {
    pub axis: &'static str,
    pub value: i64,
    pub low: i64,
    pub high: i64,
}

/// Axis boundaries. A value below `*_low` is low, above `*_high` is high,
/// anything in between (inclusive) is medium.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TierThresholds {
    pub time_low: i64,
    pub time_high: i64,
    pub money_low: i64,
    pub money_high: i64,
}

impl TierThresholds {
    pub const fn canonical() -> Self {
        Self { time_low: 5, time_high: 20, money_low: 50_000, money_high: 100_000 }
    }

    /// Thresholds of the older table-lookup generator, which put the low-money
    /// boundary at 30 000 won. Kept for comparison; the allocator does not use it.
    pub const fn legacy() -> Self {
        Self { money_low: 30_000, ..Self::canonical() }
    }

    pub fn time_level(&self, time_minutes: i64) -> Result<Level, InvalidTierError> {
        level("time", time_minutes, self.time_low, self.time_high)
    }

    pub fn money_level(&self, money_won: i64) -> Result<Level, InvalidTierError> {
        level("money", money_won, self.money_low, self.money_high)
    }

    pub fn classify(&self, time_minutes: i64, money_won: i64) -> Result<UserTier, InvalidTierError> {
        let time = self.time_level(time_minutes)?;
        let money = self.money_level(money_won)?;
        Ok(UserTier::from_levels(time, money))
    }
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self::canonical()
    }
}

fn level(axis: &'static str, value: i64, low: i64, high: i64) -> Result<Level, InvalidTierError> {
    if low > high {
        return Err(InvalidTierError { axis, value, low, high });
    }
    Ok(if value < low {
        Level::Low
    } else if value <= high {
        Level::Medium
    } else {
        Level::High
    })
}

/// Classifies with the canonical thresholds.
pub fn classify(time_minutes: i64, money_won: i64) -> Result<UserTier, InvalidTierError> {
    TierThresholds::canonical().classify(time_minutes, money_won)
}

impl UserTier {
    pub const ALL: [UserTier; 9] = [
        UserTier::LTLC,
        UserTier::LTMC,
        UserTier::LTHC,
        UserTier::MTLC,
        UserTier::MTMC,
        UserTier::MTHC,
        UserTier::HTLC,
        UserTier::HTMC,
        UserTier::HTHC,
    ];

    pub fn from_levels(time: Level, money: Level) -> Self {
        use Level::*;

        match (time, money) {
            (Low, Low) => Self::LTLC,
            (Low, Medium) => Self::LTMC,
            (Low, High) => Self::LTHC,
            (Medium, Low) => Self::MTLC,
            (Medium, Medium) => Self::MTMC,
            (Medium, High) => Self::MTHC,
            (High, Low) => Self::HTLC,
            (High, Medium) => Self::HTMC,
            (High, High) => Self::HTHC,
        }
    }

    pub fn time_level(self) -> Level {
        match self {
            Self::LTLC | Self::LTMC | Self::LTHC => Level::Low,
            Self::MTLC | Self::MTMC | Self::MTHC => Level::Medium,
            Self::HTLC | Self::HTMC | Self::HTHC => Level::High,
        }
    }

    pub fn money_level(self) -> Level {
        match self {
            Self::LTLC | Self::MTLC | Self::HTLC => Level::Low,
            Self::LTMC | Self::MTMC | Self::HTMC => Level::Medium,
            Self::LTHC | Self::MTHC | Self::HTHC => Level::High,
        }
    }

    /// Routine steps a user of this tier is eligible for.
    pub fn steps(self) -> &'static [Step] {
        const BASIC: &[Step] = &[Step::Cleansing, Step::Moisturizing, Step::SunCare];
        const STANDARD: &[Step] = &[
            Step::Cleansing,
            Step::Toner,
            Step::ConcentrationCare,
            Step::Moisturizing,
            Step::SunCare,
        ];
        const WITH_MASK: &[Step] = &[
            Step::Cleansing,
            Step::Toner,
            Step::ConcentrationCare,
            Step::Moisturizing,
            Step::SunCare,
            Step::MaskPack,
        ];
        const FULL: &[Step] = &[
            Step::Cleansing,
            Step::Toner,
            Step::ConcentrationCare,
            Step::Moisturizing,
            Step::SunCare,
            Step::MaskPack,
            Step::SleepingPack,
        ];

        match self {
            Self::LTLC | Self::MTLC | Self::HTLC => BASIC,
            Self::LTMC | Self::LTHC => STANDARD,
            Self::MTMC | Self::MTHC => WITH_MASK,
            Self::HTMC | Self::HTHC => FULL,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::LTLC => "LTLC",
            Self::LTMC => "LTMC",
            Self::LTHC => "LTHC",
            Self::MTLC => "MTLC",
            Self::MTMC => "MTMC",
            Self::MTHC => "MTHC",
            Self::HTLC => "HTLC",
            Self::HTMC => "HTMC",
            Self::HTHC => "HTHC",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tier| tier.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

impl fmt::Display for UserTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
