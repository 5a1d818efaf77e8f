//! Budget-constrained routine allocation.
//!
//! A request's (time, money) budget picks a tier and therefore a step set.
//! Steps are filled in a fixed priority order by a greedy seed, then a
//! simulated-annealing pass trades products and prices against an objective
//! that favours spending the budget while keeping high-priority steps filled.

pub mod annealing;
pub mod neighbor;
pub mod scoring;
pub mod seed;
pub mod solution;

use std::time::{Duration, Instant};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::routine::{RoutineCreate, UserId};
use crate::errors::DomainError;
use crate::pricing::PriceSegmentTable;
use crate::splitter::{split, ResolvedPick, SplitRoutine};
use crate::tier::{TierThresholds, UserTier};

pub use annealing::{AnnealingOutcome, AnnealingSchedule, StopSignal};
pub use scoring::{ScoreBreakdown, Scorer, DEFAULT_PENALTY_WEIGHT};
pub use solution::{AllocationContext, Assignment, PrioritySlot, Solution, OWNED_PRICE, PRIORITY_ORDER};

#[derive(Clone, Debug, PartialEq)]
pub struct AllocatorSettings {
    pub schedule: AnnealingSchedule,
    pub penalty_weight: f64,
    pub deadline: Option<Duration>,
    pub thresholds: TierThresholds,
}

impl Default for AllocatorSettings {
    fn default() -> Self {
        Self {
            schedule: AnnealingSchedule::default(),
            penalty_weight: DEFAULT_PENALTY_WEIGHT,
            deadline: None,
            thresholds: TierThresholds::canonical(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationRequest {
    pub time_minutes: i64,
    pub money_won: i64,
    /// Display names of products the user already has.
    #[serde(default)]
    pub owned_cosmetics: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct Allocation {
    pub tier: UserTier,
    pub picks: Vec<ResolvedPick>,
    pub score: f64,
    pub breakdown: Option<ScoreBreakdown>,
    pub total_minutes: i64,
    pub total_money: i64,
    pub iterations: u32,
    pub stopped_early: bool,
}

impl Allocation {
    pub fn split(&self) -> SplitRoutine {
        split(&self.picks)
    }

    pub fn into_routine(self, request: &AllocationRequest, user_id: Option<UserId>) -> RoutineCreate {
        let SplitRoutine { morning, evening } = self.split();
        RoutineCreate {
            user_id,
            tier: Some(self.tier),
            time_minutes: request.time_minutes,
            money_won: request.money_won,
            morning_routine: morning,
            evening_routine: evening,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct RoutineAllocator {
    settings: AllocatorSettings,
}

impl RoutineAllocator {
    pub fn new(settings: AllocatorSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &AllocatorSettings {
        &self.settings
    }

    pub fn allocate<R: Rng + ?Sized>(
        &self,
        request: &AllocationRequest,
        segments: &PriceSegmentTable,
        stop: &StopSignal,
        rng: &mut R,
    ) -> Result<Allocation, DomainError> {
        if request.time_minutes < 0 {
            return Err(DomainError::InvalidAllocationRequest(
                "time_minutes must not be negative".to_owned(),
            ));
        }
        if request.money_won < 0 {
            return Err(DomainError::InvalidAllocationRequest(
                "money_won must not be negative".to_owned(),
            ));
        }

        let tier = self.settings.thresholds.classify(request.time_minutes, request.money_won)?;
        let ctx = AllocationContext::new(
            tier.steps(),
            request.time_minutes,
            request.money_won,
            &request.owned_cosmetics,
            segments,
        );
        let scorer = Scorer::new(self.settings.penalty_weight);
        let stop = match self.settings.deadline {
            Some(budget) => stop.clone().tighten_deadline(Instant::now() + budget),
            None => stop.clone(),
        };

        let initial = seed::initial_solution(&ctx);
        let outcome = annealing::anneal(&ctx, initial, &scorer, &self.settings.schedule, &stop, rng);
        if !ctx.is_feasible(&outcome.best) {
            return Err(DomainError::InvariantViolation(
                "allocator returned a solution over budget".to_owned(),
            ));
        }

        let picks: Vec<ResolvedPick> = outcome
            .best
            .assignments
            .iter()
            .filter_map(|assignment| {
                assignment.option.map(|option| ResolvedPick {
                    option,
                    minutes: assignment.minutes,
                    cost: assignment.price,
                })
            })
            .collect();

        let allocation = Allocation {
            tier,
            breakdown: scorer.breakdown(&ctx, &outcome.best),
            total_minutes: outcome.best.total_minutes(),
            total_money: outcome.best.total_money(),
            score: outcome.best_score,
            iterations: outcome.iterations,
            stopped_early: outcome.stopped_early,
            picks,
        };

        info!(
            event_name = "routine.allocate.completed",
            tier = %allocation.tier,
            picks = allocation.picks.len(),
            total_minutes = allocation.total_minutes,
            total_money = allocation.total_money,
            iterations = allocation.iterations,
            stopped_early = allocation.stopped_early,
            "routine allocated"
        );

        Ok(allocation)
    }

    /// Allocates and splits into a routine ready to be persisted.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        request: &AllocationRequest,
        user_id: Option<UserId>,
        segments: &PriceSegmentTable,
        stop: &StopSignal,
        rng: &mut R,
    ) -> Result<RoutineCreate, DomainError> {
        let allocation = self.allocate(request, segments, stop, rng)?;
        Ok(allocation.into_routine(request, user_id))
    }
}
