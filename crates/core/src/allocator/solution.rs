use std::collections::HashSet;
use std::sync::OnceLock;

use rand::distributions::WeightedIndex;

use crate::domain::catalog::{self, ProductOption, CLEANSING_FOAM, SUNCREAM};
use crate::domain::step::Step;
use crate::pricing::{PriceSegment, PriceSegmentTable};

/// Price marker for a product the user already owns. Costs nothing.
pub const OWNED_PRICE: i64 = -100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrioritySlot {
    pub step: Step,
    pub pinned: Option<&'static str>,
    pub excluded: Option<&'static str>,
}

impl PrioritySlot {
    const fn pinned(step: Step, key: &'static str) -> Self {
        Self { step, pinned: Some(key), excluded: None }
    }

    const fn free(step: Step) -> Self {
        Self { step, pinned: None, excluded: None }
    }

    pub fn pinned_option(&self) -> Option<&'static ProductOption> {
        self.pinned.and_then(|key| catalog::find(self.step, key))
    }

    /// Catalog options this slot may hold, in catalog order.
    pub fn candidates(&self) -> impl Iterator<Item = &'static ProductOption> + '_ {
        catalog::options(self.step).iter().filter(move |option| Some(option.key) != self.excluded)
    }
}

/// Order in which steps are considered. The second cleansing slot never takes
/// the foam so it cannot duplicate the pinned first slot.
pub const PRIORITY_ORDER: [PrioritySlot; 9] = [
    PrioritySlot::pinned(Step::Cleansing, CLEANSING_FOAM),
    PrioritySlot::pinned(Step::SunCare, SUNCREAM),
    PrioritySlot::free(Step::Moisturizing),
    PrioritySlot::free(Step::Toner),
    PrioritySlot::free(Step::MaskPack),
    PrioritySlot::free(Step::ConcentrationCare),
    PrioritySlot { step: Step::Cleansing, pinned: None, excluded: Some(CLEANSING_FOAM) },
    PrioritySlot::free(Step::CleansingCare),
    PrioritySlot::free(Step::SleepingPack),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Assignment {
    pub option: Option<&'static ProductOption>,
    pub price: i64,
    pub minutes: u32,
}

impl Assignment {
    pub const EMPTY: Assignment = Assignment { option: None, price: 0, minutes: 0 };

    pub fn filled(option: &'static ProductOption, price: i64, minutes: u32) -> Self {
        Self { option: Some(option), price, minutes }
    }

    pub fn owned(option: &'static ProductOption) -> Self {
        Self::filled(option, OWNED_PRICE, option.minutes)
    }

    pub fn is_empty(&self) -> bool {
        self.option.is_none()
    }

    pub fn is_owned(&self) -> bool {
        self.option.is_some() && self.price == OWNED_PRICE
    }

    /// Money this pick consumes from the budget.
    pub fn spend(&self) -> i64 {
        match self.option {
            Some(_) => self.price.max(0),
            None => 0,
        }
    }
}

/// One assignment per active priority slot, in priority order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Solution {
    pub assignments: Vec<Assignment>,
}

impl Solution {
    pub fn empty(len: usize) -> Self {
        Self { assignments: vec![Assignment::EMPTY; len] }
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.iter().all(Assignment::is_empty)
    }

    pub fn total_minutes(&self) -> i64 {
        self.assignments.iter().filter(|a| !a.is_empty()).map(|a| i64::from(a.minutes)).sum()
    }

    pub fn total_money(&self) -> i64 {
        self.assignments.iter().map(Assignment::spend).sum()
    }

    pub fn filled_count(&self) -> usize {
        self.assignments.iter().filter(|a| !a.is_empty()).count()
    }

    /// True when another slot of the same step already holds `key`.
    pub fn holds_elsewhere(
        &self,
        slots: &[PrioritySlot],
        step: Step,
        key: &str,
        index: usize,
    ) -> bool {
        self.assignments.iter().zip(slots).enumerate().any(|(other, (assignment, slot))| {
            other != index
                && slot.step == step
                && assignment.option.map(|option| option.key == key).unwrap_or(false)
        })
    }
}

/// Everything one allocation run reads: the active slots, the budgets, the
/// owned categories and the price snapshot.
pub struct AllocationContext<'a> {
    pub slots: Vec<PrioritySlot>,
    pub time_budget: i64,
    pub money_budget: i64,
    owned: HashSet<&'a str>,
    segments: &'a PriceSegmentTable,
    slot_picker: OnceLock<Option<WeightedIndex<f64>>>,
}

impl<'a> AllocationContext<'a> {
    pub fn new(
        steps: &[Step],
        time_budget: i64,
        money_budget: i64,
        owned_cosmetics: &'a [String],
        segments: &'a PriceSegmentTable,
    ) -> Self {
        let slots =
            PRIORITY_ORDER.iter().copied().filter(|slot| steps.contains(&slot.step)).collect();
        Self {
            slots,
            time_budget,
            money_budget,
            owned: owned_cosmetics.iter().map(String::as_str).collect(),
            segments,
            slot_picker: OnceLock::new(),
        }
    }

    pub fn is_owned(&self, option: &ProductOption) -> bool {
        self.owned.contains(option.name)
    }

    pub fn segment(&self, option: &ProductOption) -> PriceSegment {
        self.segments.segment_or_default(option.name)
    }

    /// Weight of keeping slot `index` filled. Earlier slots weigh more.
    pub fn priority_weight(&self, index: usize) -> f64 {
        self.slots.len().saturating_sub(index) as f64
    }

    pub fn includes(&self, step: Step) -> bool {
        self.slots.iter().any(|slot| slot.step == step)
    }

    pub fn is_feasible(&self, solution: &Solution) -> bool {
        solution.total_minutes() <= self.time_budget && solution.total_money() <= self.money_budget
    }

    /// Sampling distribution over slot indices, proportional to
    /// `1 / (priority_weight + 1)`. `None` when there are no slots.
    pub fn slot_picker(&self) -> Option<&WeightedIndex<f64>> {
        self.slot_picker
            .get_or_init(|| {
                let weights: Vec<f64> = (0..self.slots.len())
                    .map(|index| 1.0 / (self.priority_weight(index) + 1.0))
                    .collect();
                WeightedIndex::new(weights).ok()
            })
            .as_ref()
    }
}
