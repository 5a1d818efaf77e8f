use rand::distributions::Distribution;
use rand::seq::SliceRandom;
use rand::Rng;

use super::solution::{AllocationContext, Assignment, Solution};
use crate::domain::catalog::ProductOption;
use crate::domain::step::Step;

/// Derives a neighbouring solution by mutating a single slot. Low-priority
/// slots are picked more often. Owned picks never change.
pub fn neighbor<R: Rng + ?Sized>(ctx: &AllocationContext<'_>, current: &Solution, rng: &mut R) -> Solution {
    let mut next = current.clone();
    let Some(picker) = ctx.slot_picker() else {
        return next;
    };

    let index = picker.sample(rng);
    let slot = ctx.slots[index];
    let assignment = next.assignments[index];

    if assignment.is_owned() {
        return next;
    }

    if matches!(slot.step, Step::Cleansing | Step::SunCare) {
        if let Some(option) = assignment.option {
            next.assignments[index].price = ctx.segment(option).sample(rng);
            return next;
        }
    }

    if rng.gen_bool(0.5) {
        next.assignments[index] = Assignment::EMPTY;
        return next;
    }

    let candidates: Vec<&'static ProductOption> = slot
        .candidates()
        .filter(|option| !next.holds_elsewhere(&ctx.slots, slot.step, option.key, index))
        .collect();
    if let Some(option) = candidates.choose(rng).copied() {
        next.assignments[index] = if ctx.is_owned(option) {
            Assignment::owned(option)
        } else {
            Assignment::filled(option, ctx.segment(option).sample(rng), option.minutes)
        };
    }

    next
}
