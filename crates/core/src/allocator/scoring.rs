//! Objective function. Lower is better; infeasible solutions score infinity.

use serde::Serialize;

use super::seed::MASK_PACK_MIN_BUDGET;
use super::solution::{AllocationContext, Solution};
use crate::domain::step::Step;

pub const DEFAULT_PENALTY_WEIGHT: f64 = 1_000_000.0;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub time_left: i64,
    pub money_left: i64,
    pub base: f64,
    pub imbalance: f64,
    pub priority_penalty: f64,
    pub total: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scorer {
    penalty_weight: f64,
}

impl Scorer {
    pub fn new(penalty_weight: f64) -> Self {
        Self { penalty_weight }
    }

    pub fn penalty_weight(&self) -> f64 {
        self.penalty_weight
    }

    pub fn score(&self, ctx: &AllocationContext<'_>, solution: &Solution) -> f64 {
        self.breakdown(ctx, solution).map(|breakdown| breakdown.total).unwrap_or(f64::INFINITY)
    }

    /// Component view of the score; `None` when the solution exceeds a budget.
    pub fn breakdown(&self, ctx: &AllocationContext<'_>, solution: &Solution) -> Option<ScoreBreakdown> {
        if !ctx.is_feasible(solution) {
            return None;
        }

        let time_left = ctx.time_budget - solution.total_minutes();
        let money_left = ctx.money_budget - solution.total_money();
        let base = (time_left as f64).powi(2) + (money_left as f64).powi(2);
        let imbalance = price_imbalance(ctx, solution);
        let priority_penalty = self.priority_penalty(ctx, solution);

        // A wider price spread lowers the score.
        let total = base - imbalance * self.penalty_weight + priority_penalty;
        Some(ScoreBreakdown { time_left, money_left, base, imbalance, priority_penalty, total })
    }

    fn priority_penalty(&self, ctx: &AllocationContext<'_>, solution: &Solution) -> f64 {
        let mut penalty = 0.0;
        let mut mask_charge = 0.0;
        for (index, (slot, assignment)) in ctx.slots.iter().zip(&solution.assignments).enumerate() {
            if assignment.is_empty() {
                let charge = ctx.priority_weight(index) * self.penalty_weight;
                penalty += charge;
                if slot.step == Step::MaskPack {
                    mask_charge += charge;
                }
            }
        }

        if ctx.includes(Step::MaskPack) && ctx.time_budget >= MASK_PACK_MIN_BUDGET {
            penalty = (penalty - mask_charge).max(0.0);
        }
        penalty
    }
}

impl Default for Scorer {
    fn default() -> Self {
        Self::new(DEFAULT_PENALTY_WEIGHT)
    }
}

/// Population standard deviation of each bought pick's relative distance from
/// its category median. Owned picks are left out.
pub fn price_imbalance(ctx: &AllocationContext<'_>, solution: &Solution) -> f64 {
    let deviations: Vec<f64> = solution
        .assignments
        .iter()
        .filter(|assignment| !assignment.is_owned())
        .filter_map(|assignment| {
            assignment.option.map(|option| ctx.segment(option).deviation(assignment.price))
        })
        .collect();

    if deviations.len() < 2 {
        return 0.0;
    }

    let count = deviations.len() as f64;
    let mean = deviations.iter().sum::<f64>() / count;
    let variance = deviations.iter().map(|value| (value - mean).powi(2)).sum::<f64>() / count;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::{price_imbalance, Scorer};
    use crate::allocator::solution::{AllocationContext, Assignment, Solution};
    use crate::domain::catalog;
    use crate::domain::step::Step;
    use crate::pricing::PriceSegmentTable;
    use crate::tier::UserTier;

    fn pick(step: Step, price: i64) -> Assignment {
        let option = &catalog::options(step)[0];
        Assignment::filled(option, price, option.minutes)
    }

    #[test]
    fn over_budget_scores_infinity() {
        let table = PriceSegmentTable::empty();
        let ctx = AllocationContext::new(UserTier::LTLC.steps(), 10, 4_000, &[], &table);
        let solution = Solution {
            assignments: vec![pick(Step::Cleansing, 5_000), Assignment::EMPTY, Assignment::EMPTY, Assignment::EMPTY],
        };

        assert!(Scorer::default().score(&ctx, &solution).is_infinite());
        assert!(Scorer::default().breakdown(&ctx, &solution).is_none());
    }

    #[test]
    fn empty_high_priority_slot_costs_more_than_low_priority() {
        let table = PriceSegmentTable::empty();
        let ctx = AllocationContext::new(UserTier::LTLC.steps(), 10, 40_000, &[], &table);
        let scorer = Scorer::new(1_000.0);

        let missing_first = Solution {
            assignments: vec![
                Assignment::EMPTY,
                pick(Step::SunCare, 10_000),
                pick(Step::Moisturizing, 10_000),
                pick(Step::Cleansing, 10_000),
            ],
        };
        let missing_last = Solution {
            assignments: vec![
                pick(Step::Cleansing, 10_000),
                pick(Step::SunCare, 10_000),
                pick(Step::Moisturizing, 10_000),
                Assignment::EMPTY,
            ],
        };

        let first = scorer.breakdown(&ctx, &missing_first).expect("feasible");
        let last = scorer.breakdown(&ctx, &missing_last).expect("feasible");
        assert_eq!(first.priority_penalty, 4_000.0);
        assert_eq!(last.priority_penalty, 1_000.0);
    }

    #[test]
    fn imbalance_ignores_owned_picks_and_needs_two_prices() {
        let table = PriceSegmentTable::empty();
        let ctx = AllocationContext::new(UserTier::LTLC.steps(), 10, 40_000, &[], &table);
        let foam = &catalog::options(Step::Cleansing)[1];

        let single = Solution {
            assignments: vec![
                Assignment::owned(foam),
                pick(Step::SunCare, 20_000),
                Assignment::EMPTY,
                Assignment::EMPTY,
            ],
        };
        assert_eq!(price_imbalance(&ctx, &single), 0.0);

        let spread = Solution {
            assignments: vec![
                Assignment::owned(foam),
                pick(Step::SunCare, 20_000),
                pick(Step::Moisturizing, 5_000),
                Assignment::EMPTY,
            ],
        };
        // deviations +1.0 and -0.5 around the 10 000 won median
        assert!((price_imbalance(&ctx, &spread) - 0.75).abs() < 1e-9);
    }

    #[test]
    fn empty_mask_slot_is_forgiven_when_time_allows() {
        let table = PriceSegmentTable::empty();
        let scorer = Scorer::new(1_000.0);
        let ctx = AllocationContext::new(UserTier::MTMC.steps(), 30, 200_000, &[], &table);
        let solution = Solution::empty(ctx.slots.len());

        let all_empty: f64 = (0..ctx.slots.len()).map(|index| ctx.priority_weight(index)).sum::<f64>() * 1_000.0;
        let mask = ctx.slots.iter().position(|slot| slot.step == Step::MaskPack).expect("mask");
        let expected = all_empty - ctx.priority_weight(mask) * 1_000.0;

        let breakdown = scorer.breakdown(&ctx, &solution).expect("feasible");
        assert_eq!(breakdown.priority_penalty, expected);

        let short = AllocationContext::new(UserTier::MTMC.steps(), 10, 200_000, &[], &table);
        let breakdown = scorer.breakdown(&short, &Solution::empty(short.slots.len())).expect("feasible");
        assert_eq!(breakdown.priority_penalty, all_empty);
    }

    #[test]
    fn spending_closer_to_budget_scores_lower() {
        let table = PriceSegmentTable::empty();
        let ctx = AllocationContext::new(UserTier::LTLC.steps(), 10, 40_000, &[], &table);
        let scorer = Scorer::new(0.0);

        let cheap = Solution {
            assignments: vec![pick(Step::Cleansing, 5_000), Assignment::EMPTY, Assignment::EMPTY, Assignment::EMPTY],
        };
        let pricier = Solution {
            assignments: vec![pick(Step::Cleansing, 15_000), Assignment::EMPTY, Assignment::EMPTY, Assignment::EMPTY],
        };

        assert!(scorer.score(&ctx, &pricier) < scorer.score(&ctx, &cheap));
    }
}
