//! Turns the allocator's flat pick list into the morning and evening routines.

use serde::Serialize;

use crate::domain::catalog::ProductOption;
use crate::domain::routine::RoutineItem;
use crate::domain::step::{Step, UsageTime};

/// Minutes shown for a mask pack in the evening list, whatever time the
/// allocator charged for it.
pub const EVENING_MASK_PACK_MINUTES: u32 = 15;

/// A product chosen by the allocator, with the time and cost it was assigned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolvedPick {
    pub option: &'static ProductOption,
    pub minutes: u32,
    pub cost: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SplitRoutine {
    pub morning: Vec<RoutineItem>,
    pub evening: Vec<RoutineItem>,
}

/// Places each pick into every usage time it declares, then orders both lists
/// by stage sequence. Ties keep allocation order. Owned-product sentinels are
/// reported at zero cost.
pub fn split(picks: &[ResolvedPick]) -> SplitRoutine {
    let mut routine = SplitRoutine::default();

    for pick in picks {
        for usage_time in pick.option.usage_time {
            let item = to_item(pick, *usage_time);
            match usage_time {
                UsageTime::Morning => routine.morning.push(item),
                UsageTime::Evening => routine.evening.push(item),
            }
        }
    }

    routine.morning.sort_by_key(|item| item.sequence);
    routine.evening.sort_by_key(|item| item.sequence);
    routine
}

fn to_item(pick: &ResolvedPick, usage_time: UsageTime) -> RoutineItem {
    let time = if pick.option.step == Step::MaskPack && usage_time == UsageTime::Evening {
        EVENING_MASK_PACK_MINUTES
    } else {
        pick.minutes
    };

    RoutineItem {
        name: pick.option.name.to_owned(),
        usage_time: pick.option.usage_time.to_vec(),
        frequency: pick.option.frequency,
        instructions: pick.option.instructions.to_owned(),
        sequence: pick.option.sequence(),
        time,
        cost: pick.cost.max(0),
    }
}
