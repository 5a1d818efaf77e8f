//! Per-category price segments (low/mid/high percentiles in won) and the
//! aggregation that derives them from observed retail prices.

mod store;

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

pub use store::PriceSegmentStore;

pub const LOW_PERCENTILE: f64 = 25.0;
pub const MID_PERCENTILE: f64 = 50.0;
pub const HIGH_PERCENTILE: f64 = 75.0;

/// Band used for categories without observations.
pub const DEFAULT_SEGMENT: PriceSegment = PriceSegment { low: 5_000, mid: 10_000, high: 20_000 };

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSegment {
    pub low: i64,
    pub mid: i64,
    pub high: i64,
}

impl PriceSegment {
    /// Builds a segment, reordering the bounds so `low <= mid <= high` holds.
    pub fn new(low: i64, mid: i64, high: i64) -> Self {
        let mut bounds = [low, mid, high];
        bounds.sort_unstable();
        Self { low: bounds[0], mid: bounds[1], high: bounds[2] }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> i64 {
        rng.gen_range(self.low..=self.high)
    }

    /// Fractional distance of `price` from the median price of the category.
    pub fn deviation(&self, price: i64) -> f64 {
        if self.mid == 0 {
            return 0.0;
        }
        (price - self.mid) as f64 / self.mid as f64
    }
}

impl Default for PriceSegment {
    fn default() -> Self {
        DEFAULT_SEGMENT
    }
}

/// One observed retail price for a category.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub category: String,
    pub price_won: i64,
    pub observed_at: DateTime<Utc>,
}

impl PriceObservation {
    pub fn new(category: impl Into<String>, price_won: i64) -> Self {
        Self { category: category.into(), price_won, observed_at: Utc::now() }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceSegmentTable {
    segments: BTreeMap<String, PriceSegment>,
    default_segment: PriceSegment,
    computed_at: DateTime<Utc>,
}

impl PriceSegmentTable {
    pub fn new(segments: impl IntoIterator<Item = (String, PriceSegment)>) -> Self {
        Self {
            segments: segments.into_iter().collect(),
            default_segment: DEFAULT_SEGMENT,
            computed_at: Utc::now(),
        }
    }

    pub fn empty() -> Self {
        Self::new(std::iter::empty())
    }

    pub fn with_default(mut self, default_segment: PriceSegment) -> Self {
        self.default_segment = default_segment;
        self
    }

    /// Aggregates observed `(category, price)` pairs into percentile segments.
    /// Negative prices are ignored.
    pub fn from_observations(observations: impl IntoIterator<Item = (String, i64)>) -> Self {
        let mut by_category: HashMap<String, Vec<i64>> = HashMap::new();
        for (category, price) in observations {
            if price >= 0 {
                by_category.entry(category).or_default().push(price);
            }
        }

        let segments = by_category.into_iter().filter_map(|(category, mut prices)| {
            prices.sort_unstable();
            let low = percentile(&prices, LOW_PERCENTILE)?;
            let mid = percentile(&prices, MID_PERCENTILE)?;
            let high = percentile(&prices, HIGH_PERCENTILE)?;
            Some((category, PriceSegment::new(low, mid, high)))
        });

        Self::new(segments)
    }

    pub fn get(&self, category: &str) -> Option<&PriceSegment> {
        self.segments.get(category)
    }

    pub fn segment_or_default(&self, category: &str) -> PriceSegment {
        self.get(category).copied().unwrap_or(self.default_segment)
    }

    pub fn default_segment(&self) -> PriceSegment {
        self.default_segment
    }

    pub fn computed_at(&self) -> DateTime<Utc> {
        self.computed_at
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PriceSegment)> {
        self.segments.iter().map(|(category, segment)| (category.as_str(), segment))
    }
}

impl Default for PriceSegmentTable {
    fn default() -> Self {
        Self::empty()
    }
}

/// Linear-interpolated percentile over an ascending slice, rounded to won.
pub fn percentile(sorted: &[i64], pct: f64) -> Option<i64> {
    match sorted {
        [] => None,
        [only] => Some(*only),
        _ => {
            let rank = (pct.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
            let lower = rank.floor() as usize;
            let upper = rank.ceil() as usize;
            let fraction = rank - lower as f64;
            let value = sorted[lower] as f64 + (sorted[upper] - sorted[lower]) as f64 * fraction;
            Some(value.round() as i64)
        }
    }
}
