use std::sync::{Arc, RwLock};

use tracing::info;

use super::PriceSegmentTable;

/// Holds the current price segment snapshot. Readers clone the `Arc` and keep
/// working against it; a refresh swaps in a whole new table.
#[derive(Debug, Default)]
pub struct PriceSegmentStore {
    current: RwLock<Arc<PriceSegmentTable>>,
}

impl PriceSegmentStore {
    pub fn new(table: PriceSegmentTable) -> Self {
        Self { current: RwLock::new(Arc::new(table)) }
    }

    pub fn snapshot(&self) -> Arc<PriceSegmentTable> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Publishes `table` and returns the snapshot it replaced.
    pub fn publish(&self, table: PriceSegmentTable) -> Arc<PriceSegmentTable> {
        let next = Arc::new(table);
        let categories = next.len();
        let previous = match self.current.write() {
            Ok(mut guard) => std::mem::replace(&mut *guard, next),
            Err(poisoned) => std::mem::replace(&mut *poisoned.into_inner(), next),
        };
        info!(
            event_name = "price_segments.published",
            categories,
            previous_categories = previous.len(),
            "price segment snapshot published"
        );
        previous
    }
}
