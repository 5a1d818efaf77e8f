use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Cleansing,
    CleansingCare,
    Toner,
    ConcentrationCare,
    Moisturizing,
    SunCare,
    SleepingPack,
    MaskPack,
}

impl Step {
    pub const ALL: [Step; 8] = [
        Step::Cleansing,
        Step::CleansingCare,
        Step::Toner,
        Step::ConcentrationCare,
        Step::Moisturizing,
        Step::SunCare,
        Step::SleepingPack,
        Step::MaskPack,
    ];

    /// Stage sequence used to order the morning and evening lists. It has no
    /// influence on allocation priority.
    pub fn sequence(self) -> u8 {
        match self {
            Self::Cleansing | Self::CleansingCare => 1,
            Self::Toner | Self::MaskPack => 2,
            Self::ConcentrationCare => 3,
            Self::Moisturizing => 4,
            Self::SunCare => 5,
            Self::SleepingPack => 6,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Cleansing => "클렌징",
            Self::CleansingCare => "클렌징 단계 추가 케어",
            Self::Toner => "결정리",
            Self::ConcentrationCare => "집중 케어",
            Self::Moisturizing => "보습",
            Self::SunCare => "선케어",
            Self::SleepingPack => "수면 중 보습 케어",
            Self::MaskPack => "시간 투자형 집중케어",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cleansing => "cleansing",
            Self::CleansingCare => "cleansing_care",
            Self::Toner => "toner",
            Self::ConcentrationCare => "concentration_care",
            Self::Moisturizing => "moisturizing",
            Self::SunCare => "sun_care",
            Self::SleepingPack => "sleeping_pack",
            Self::MaskPack => "mask_pack",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageTime {
    Morning,
    Evening,
}

impl UsageTime {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Evening => "evening",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "morning" => Some(Self::Morning),
            "evening" => Some(Self::Evening),
            _ => None,
        }
    }
}

impl fmt::Display for UsageTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::{Step, UsageTime};

    #[test]
    fn stage_sequences_stay_within_one_to_six() {
        for step in Step::ALL {
            assert!((1..=6).contains(&step.sequence()), "{step} out of range");
        }
        assert_eq!(Step::MaskPack.sequence(), Step::Toner.sequence());
        assert!(Step::SunCare.sequence() < Step::SleepingPack.sequence());
    }

    #[test]
    fn usage_time_parse_is_case_insensitive() {
        assert_eq!(UsageTime::parse(" Evening "), Some(UsageTime::Evening));
        assert_eq!(UsageTime::parse("noon"), None);
    }
}
