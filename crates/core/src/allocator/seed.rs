//! Initial solution: owned products, the pinned anchors and the mask pack,
//! followed by greedy completion of whatever budget is left.

use tracing::debug;

use super::solution::{AllocationContext, Assignment, Solution};
use crate::domain::step::Step;

/// Minutes charged for a mask pack when it is seeded. Completion and mutation
/// charge the catalog value instead.
pub const MASK_PACK_SEED_MINUTES: u32 = 8;

/// Remaining time a user needs before a mask pack is considered at all.
pub const MASK_PACK_MIN_BUDGET: i64 = 15;

pub fn seed(ctx: &AllocationContext<'_>) -> Solution {
    let mut solution = Solution::empty(ctx.slots.len());
    let mut remaining = ctx.time_budget;

    for (index, slot) in ctx.slots.iter().enumerate() {
        let owned = slot.candidates().find(|option| {
            ctx.is_owned(option)
                && i64::from(option.minutes) <= remaining
                && !solution.holds_elsewhere(&ctx.slots, slot.step, option.key, index)
        });
        if let Some(option) = owned {
            solution.assignments[index] = Assignment::owned(option);
            remaining -= i64::from(option.minutes);
            continue;
        }

        if slot.step == Step::MaskPack {
            if remaining >= MASK_PACK_MIN_BUDGET {
                if let Some(option) = slot.candidates().next() {
                    let price = ctx.segment(option).low;
                    solution.assignments[index] =
                        Assignment::filled(option, price, MASK_PACK_SEED_MINUTES);
                    remaining -= i64::from(MASK_PACK_SEED_MINUTES);
                }
            }
            continue;
        }

        if let Some(option) = slot.pinned_option() {
            if i64::from(option.minutes) <= remaining
                && !solution.holds_elsewhere(&ctx.slots, slot.step, option.key, index)
            {
                let price = ctx.segment(option).low;
                solution.assignments[index] = Assignment::filled(option, price, option.minutes);
                remaining -= i64::from(option.minutes);
            }
        }
    }

    solution
}

/// Drops non-owned picks, lowest priority first, until the solution fits both
/// budgets. Seeding never checks money, so a tight budget can need this.
pub fn repair(ctx: &AllocationContext<'_>, solution: &mut Solution) -> usize {
    let mut dropped = 0;
    while !ctx.is_feasible(solution) {
        let victim = solution
            .assignments
            .iter()
            .rposition(|assignment| !assignment.is_empty() && !assignment.is_owned());
        match victim {
            Some(index) => {
                solution.assignments[index] = Assignment::EMPTY;
                dropped += 1;
            }
            None => break,
        }
    }
    if dropped > 0 {
        debug!(
            event_name = "allocator.seed.repaired",
            dropped,
            money = solution.total_money(),
            minutes = solution.total_minutes(),
            "dropped seeded picks to fit budget"
        );
    }
    dropped
}

/// Fills every empty slot with its cheapest option, in priority order, as long
/// as cumulative time and money stay within budget.
pub fn complete(ctx: &AllocationContext<'_>, solution: &mut Solution) {
    let mut minutes = solution.total_minutes();
    let mut money = solution.total_money();

    for (index, slot) in ctx.slots.iter().enumerate() {
        if !solution.assignments[index].is_empty() {
            continue;
        }

        let cheapest = slot
            .candidates()
            .filter(|option| !solution.holds_elsewhere(&ctx.slots, slot.step, option.key, index))
            .min_by_key(|option| ctx.segment(option).low);
        let Some(option) = cheapest else {
            continue;
        };

        let assignment = if ctx.is_owned(option) {
            Assignment::owned(option)
        } else {
            Assignment::filled(option, ctx.segment(option).low, option.minutes)
        };
        let next_minutes = minutes + i64::from(assignment.minutes);
        let next_money = money + assignment.spend();
        if next_minutes <= ctx.time_budget && next_money <= ctx.money_budget {
            solution.assignments[index] = assignment;
            minutes = next_minutes;
            money = next_money;
        }
    }
}

/// Seed, repair and complete in one go.
pub fn initial_solution(ctx: &AllocationContext<'_>) -> Solution {
    let mut solution = seed(ctx);
    repair(ctx, &mut solution);
    complete(ctx, &mut solution);
    solution
}

#[cfg(test)]
mod tests {
    use super::{complete, initial_solution, repair, seed, MASK_PACK_SEED_MINUTES};
    use crate::allocator::solution::{AllocationContext, Solution, OWNED_PRICE};
    use crate::domain::catalog::{CLEANSING_FOAM, SUNCREAM};
    use crate::domain::step::Step;
    use crate::pricing::{PriceSegment, PriceSegmentTable};
    use crate::tier::UserTier;

    fn keys(ctx: &AllocationContext<'_>, solution: &Solution) -> Vec<(Step, Option<&'static str>)> {
        ctx.slots
            .iter()
            .zip(&solution.assignments)
            .map(|(slot, assignment)| (slot.step, assignment.option.map(|option| option.key)))
            .collect()
    }

    #[test]
    fn seed_pins_foam_and_suncream_at_low_price() {
        let table = PriceSegmentTable::empty();
        let ctx = AllocationContext::new(UserTier::LTLC.steps(), 3, 10_000, &[], &table);

        let solution = seed(&ctx);
        let picked = keys(&ctx, &solution);

        assert_eq!(picked[0], (Step::Cleansing, Some(CLEANSING_FOAM)));
        assert_eq!(picked[1], (Step::SunCare, Some(SUNCREAM)));
        assert_eq!(picked[2], (Step::Moisturizing, None));
        assert_eq!(solution.assignments[0].price, 5_000);
        assert_eq!(solution.total_minutes(), 3);
    }

    #[test]
    fn owned_option_takes_the_slot_at_sentinel_price() {
        let table = PriceSegmentTable::empty();
        let owned = vec!["선크림".to_string()];
        let ctx = AllocationContext::new(UserTier::LTLC.steps(), 10, 10_000, &owned, &table);

        let solution = seed(&ctx);

        assert_eq!(solution.assignments[1].price, OWNED_PRICE);
        assert!(solution.assignments[1].is_owned());
        assert_eq!(solution.total_money(), 5_000);
    }

    #[test]
    fn mask_pack_is_seeded_only_with_enough_time() {
        let table = PriceSegmentTable::empty();
        let ctx = AllocationContext::new(UserTier::MTMC.steps(), 18, 80_000, &[], &table);
        let mask = ctx.slots.iter().position(|slot| slot.step == Step::MaskPack).expect("mask slot");

        let roomy = seed(&ctx);
        assert_eq!(roomy.assignments[mask].minutes, MASK_PACK_SEED_MINUTES);

        let ctx = AllocationContext::new(UserTier::MTMC.steps(), 17, 80_000, &[], &table);
        let tight = seed(&ctx);
        assert!(tight.assignments[mask].is_empty());
    }

    #[test]
    fn repair_drops_lowest_priority_picks_first() {
        let table = PriceSegmentTable::new(vec![
            ("클렌징폼".to_string(), PriceSegment::new(8_000, 9_000, 10_000)),
            ("선크림".to_string(), PriceSegment::new(8_000, 9_000, 10_000)),
        ]);
        let ctx = AllocationContext::new(UserTier::LTLC.steps(), 10, 9_000, &[], &table);

        let mut solution = seed(&ctx);
        assert_eq!(solution.total_money(), 16_000);

        let dropped = repair(&ctx, &mut solution);
        assert_eq!(dropped, 1);
        assert!(solution.assignments[1].is_empty());
        assert!(!solution.assignments[0].is_empty());
        assert!(ctx.is_feasible(&solution));
    }

    #[test]
    fn completion_respects_cumulative_budgets() {
        let table = PriceSegmentTable::empty();
        let ctx = AllocationContext::new(UserTier::LTLC.steps(), 4, 15_000, &[], &table);

        let mut solution = seed(&ctx);
        complete(&ctx, &mut solution);

        assert_eq!(solution.filled_count(), 3);
        assert_eq!(solution.total_minutes(), 4);
        assert!(solution.assignments[3].is_empty());
        assert!(ctx.is_feasible(&solution));
    }

    #[test]
    fn second_cleansing_slot_never_repeats_the_first() {
        let table = PriceSegmentTable::empty();
        let ctx = AllocationContext::new(UserTier::HTHC.steps(), 60, 500_000, &[], &table);

        let solution = initial_solution(&ctx);
        let cleansing: Vec<&str> = ctx
            .slots
            .iter()
            .zip(&solution.assignments)
            .filter(|(slot, _)| slot.step == Step::Cleansing)
            .filter_map(|(_, assignment)| assignment.option.map(|option| option.key))
            .collect();

        assert_eq!(cleansing.len(), 2);
        assert_ne!(cleansing[0], cleansing[1]);
        assert!(!cleansing[1..].contains(&CLEANSING_FOAM));
    }
}
