use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::routine::UserId;
use super::step::UsageTime;

/// Item name -> whether the user actually applied it.
pub type RoutinePractice = BTreeMap<String, bool>;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRoutineRecord {
    pub date: NaiveDate,
    #[serde(default)]
    pub morning: RoutinePractice,
    #[serde(default)]
    pub evening: RoutinePractice,
}

impl DailyRoutineRecord {
    pub fn empty(date: NaiveDate) -> Self {
        Self { date, morning: RoutinePractice::new(), evening: RoutinePractice::new() }
    }

    /// Replaces one half of the day; the other half is left untouched.
    pub fn apply(&mut self, usage_time: UsageTime, practice: RoutinePractice) {
        match usage_time {
            UsageTime::Morning => self.morning = practice,
            UsageTime::Evening => self.evening = practice,
        }
    }

    pub fn completion_ratio(&self) -> f64 {
        let total = self.morning.len() + self.evening.len();
        if total == 0 {
            return 0.0;
        }
        let done = self.morning.values().chain(self.evening.values()).filter(|done| **done).count();
        done as f64 / total as f64
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutineRecord {
    pub user_id: UserId,
    pub records: Vec<DailyRoutineRecord>,
}
