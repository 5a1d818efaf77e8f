use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::step::UsageTime;
use crate::errors::DomainError;
use crate::tier::UserTier;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoutineId(pub String);

impl RoutineId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for RoutineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One product in a generated routine, as exposed to clients.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutineItem {
    pub name: String,
    pub usage_time: Vec<UsageTime>,
    pub frequency: u32,
    pub instructions: String,
    pub sequence: u8,
    pub time: u32,
    pub cost: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutineCreate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<UserTier>,
    #[serde(default)]
    pub time_minutes: i64,
    #[serde(default)]
    pub money_won: i64,
    pub morning_routine: Vec<RoutineItem>,
    pub evening_routine: Vec<RoutineItem>,
}

impl RoutineCreate {
    /// Checks a client-supplied routine body. Stored routines never carry
    /// negative budgets or item costs.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.time_minutes < 0 || self.money_won < 0 {
            return Err(DomainError::InvalidRoutine(
                "time_minutes and money_won must not be negative".to_owned(),
            ));
        }
        let lists =
            [("morning_routine", &self.morning_routine), ("evening_routine", &self.evening_routine)];
        for (list, items) in lists {
            if let Some(item) = items.iter().find(|item| item.cost < 0) {
                return Err(DomainError::InvalidRoutine(format!(
                    "{list} item `{}` has negative cost {}",
                    item.name, item.cost
                )));
            }
        }
        Ok(())
    }

    pub fn total_cost(&self) -> i64 {
        // Items used both morning and evening are bought once.
        let mut seen = std::collections::HashSet::new();
        self.morning_routine
            .iter()
            .chain(self.evening_routine.iter())
            .filter(|item| seen.insert(item.name.as_str()))
            .map(|item| item.cost)
            .sum()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Routine {
    pub id: RoutineId,
    #[serde(flatten)]
    pub body: RoutineCreate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Routine {
    pub fn new(body: RoutineCreate) -> Self {
        let now = Utc::now();
        Self { id: RoutineId::generate(), body, created_at: now, updated_at: now }
    }
}
