use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rand::Rng;
use tracing::debug;

use super::neighbor::neighbor;
use super::scoring::Scorer;
use super::solution::{AllocationContext, Solution};

pub const DEFAULT_ITERATIONS: u32 = 5_000;
pub const DEFAULT_INITIAL_TEMPERATURE: f64 = 10_000.0;
pub const DEFAULT_COOLING_RATE: f64 = 0.99;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnnealingSchedule {
    pub iterations: u32,
    pub initial_temperature: f64,
    pub cooling_rate: f64,
}

impl Default for AnnealingSchedule {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            initial_temperature: DEFAULT_INITIAL_TEMPERATURE,
            cooling_rate: DEFAULT_COOLING_RATE,
        }
    }
}

/// Cooperative stop condition checked once per iteration.
#[derive(Clone, Debug, Default)]
pub struct StopSignal {
    deadline: Option<Instant>,
    cancelled: Option<Arc<AtomicBool>>,
}

impl StopSignal {
    pub fn never() -> Self {
        Self::default()
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Keeps whichever deadline comes first.
    pub fn tighten_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn with_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancelled = Some(flag);
        self
    }

    pub fn should_stop(&self) -> bool {
        if self.cancelled.as_ref().map(|flag| flag.load(Ordering::Relaxed)).unwrap_or(false) {
            return true;
        }
        self.deadline.map(|deadline| Instant::now() >= deadline).unwrap_or(false)
    }
}

#[derive(Clone, Debug)]
pub struct AnnealingOutcome {
    pub best: Solution,
    pub best_score: f64,
    pub iterations: u32,
    pub accepted: u32,
    pub stopped_early: bool,
}

/// Metropolis acceptance: always take an improvement, otherwise take the worse
/// move with probability `exp(-delta / temperature)`. Infinite scores never
/// pass because `exp` of a NaN or -inf never beats the draw.
fn accept<R: Rng + ?Sized>(current: f64, candidate: f64, temperature: f64, rng: &mut R) -> bool {
    if candidate < current {
        return true;
    }
    let probability = (-(candidate - current) / temperature).exp();
    rng.gen::<f64>() < probability
}

pub fn anneal<R: Rng + ?Sized>(
    ctx: &AllocationContext<'_>,
    initial: Solution,
    scorer: &Scorer,
    schedule: &AnnealingSchedule,
    stop: &StopSignal,
    rng: &mut R,
) -> AnnealingOutcome {
    let mut current_score = scorer.score(ctx, &initial);
    let mut current = initial;
    let mut best = current.clone();
    let mut best_score = current_score;
    let mut temperature = schedule.initial_temperature;
    let mut iterations = 0;
    let mut accepted = 0;
    let mut stopped_early = false;

    while iterations < schedule.iterations {
        if stop.should_stop() {
            stopped_early = true;
            break;
        }

        let candidate = neighbor(ctx, &current, rng);
        let candidate_score = scorer.score(ctx, &candidate);
        if accept(current_score, candidate_score, temperature, rng) {
            current = candidate;
            current_score = candidate_score;
            accepted += 1;
            if current_score < best_score {
                best = current.clone();
                best_score = current_score;
            }
        }

        temperature *= schedule.cooling_rate;
        iterations += 1;
    }

    debug!(
        event_name = "allocator.anneal.finished",
        iterations,
        accepted,
        best_score,
        stopped_early,
        "annealing finished"
    );

    AnnealingOutcome { best, best_score, iterations, accepted, stopped_early }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use rand::{rngs::StdRng, SeedableRng};

    use super::{accept, anneal, AnnealingSchedule, StopSignal};
    use crate::allocator::scoring::Scorer;
    use crate::allocator::seed::initial_solution;
    use crate::allocator::solution::AllocationContext;
    use crate::pricing::PriceSegmentTable;
    use crate::tier::UserTier;

    #[test]
    fn acceptance_never_takes_an_infeasible_candidate() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..1_000 {
            assert!(!accept(100.0, f64::INFINITY, 1e12, &mut rng));
            assert!(!accept(f64::INFINITY, f64::INFINITY, 1e12, &mut rng));
        }
        assert!(accept(f64::INFINITY, 5.0, 1.0, &mut rng));
        assert!(accept(10.0, 5.0, 0.0, &mut rng));
    }

    #[test]
    fn best_never_scores_worse_than_the_start() {
        let table = PriceSegmentTable::empty();
        let ctx = AllocationContext::new(UserTier::MTMC.steps(), 15, 80_000, &[], &table);
        let scorer = Scorer::default();
        let initial = initial_solution(&ctx);
        let start = scorer.score(&ctx, &initial);

        let outcome = anneal(
            &ctx,
            initial,
            &scorer,
            &AnnealingSchedule::default(),
            &StopSignal::never(),
            &mut StdRng::seed_from_u64(42),
        );

        assert!(outcome.best_score <= start);
        assert!(ctx.is_feasible(&outcome.best));
        assert_eq!(outcome.iterations, 5_000);
        assert!(!outcome.stopped_early);
    }

    #[test]
    fn raised_flag_stops_before_the_first_iteration() {
        let table = PriceSegmentTable::empty();
        let ctx = AllocationContext::new(UserTier::LTLC.steps(), 10, 20_000, &[], &table);
        let flag = Arc::new(AtomicBool::new(true));
        let initial = initial_solution(&ctx);

        let outcome = anneal(
            &ctx,
            initial.clone(),
            &Scorer::default(),
            &AnnealingSchedule::default(),
            &StopSignal::never().with_flag(flag),
            &mut StdRng::seed_from_u64(42),
        );

        assert!(outcome.stopped_early);
        assert_eq!(outcome.iterations, 0);
        assert_eq!(outcome.best, initial);
    }

    #[test]
    fn expired_deadline_stops_and_keeps_a_feasible_best() {
        let table = PriceSegmentTable::empty();
        let ctx = AllocationContext::new(UserTier::HTHC.steps(), 30, 150_000, &[], &table);
        let past = Instant::now() - Duration::from_millis(1);

        let outcome = anneal(
            &ctx,
            initial_solution(&ctx),
            &Scorer::default(),
            &AnnealingSchedule::default(),
            &StopSignal::never().with_deadline(past),
            &mut StdRng::seed_from_u64(42),
        );

        assert!(outcome.stopped_early);
        assert!(ctx.is_feasible(&outcome.best));
    }
}
