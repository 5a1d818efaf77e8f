use std::sync::Arc;

use dewy_core::config::PriceSegmentConfig;
use dewy_core::pricing::{PriceSegment, PriceSegmentStore};
use dewy_db::{PriceObservationRepository, RepositoryError};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

/// Recomputes the segment table from stored observations and publishes it.
/// Returns the number of categories in the new snapshot.
pub async fn refresh_once(
    observations: &dyn PriceObservationRepository,
    store: &PriceSegmentStore,
    default_band: PriceSegment,
) -> Result<usize, RepositoryError> {
    let table = observations.load_segments().await?.with_default(default_band);
    let categories = table.len();
    store.publish(table);
    Ok(categories)
}

/// Periodic refresh. The first tick of the interval completes immediately and
/// is skipped because bootstrap has already loaded a snapshot.
pub fn spawn(
    observations: Arc<dyn PriceObservationRepository>,
    store: Arc<PriceSegmentStore>,
    config: PriceSegmentConfig,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(config.refresh_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match refresh_once(observations.as_ref(), &store, config.default_band()).await {
                Ok(categories) => info!(
                    event_name = "price_segments.refresh.completed",
                    categories,
                    "price segments refreshed"
                ),
                Err(error) => warn!(
                    event_name = "price_segments.refresh.failed",
                    error = %error,
                    "price segment refresh failed; keeping previous snapshot"
                ),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use dewy_core::pricing::{PriceObservation, PriceSegment, PriceSegmentStore, PriceSegmentTable};
    use dewy_db::repositories::InMemoryPriceObservationRepository;
    use dewy_db::{PriceObservationRepository, RepositoryError};

    use super::refresh_once;

    struct Unreachable;

    #[async_trait]
    impl PriceObservationRepository for Unreachable {
        async fn record(&self, _observation: PriceObservation) -> Result<(), RepositoryError> {
            Err(RepositoryError::Decode("store offline".to_string()))
        }

        async fn list(&self) -> Result<Vec<PriceObservation>, RepositoryError> {
            Err(RepositoryError::Decode("store offline".to_string()))
        }
    }

    #[tokio::test]
    async fn refresh_publishes_table_with_configured_default_band() {
        let repo = InMemoryPriceObservationRepository::default();
        repo.record(PriceObservation::new("토너", 12_000)).await.expect("record");
        let store = PriceSegmentStore::default();
        let band = PriceSegment::new(3_000, 6_000, 9_000);

        let categories = refresh_once(&repo, &store, band).await.expect("refresh");

        assert_eq!(categories, 1);
        let snapshot = store.snapshot();
        assert_eq!(snapshot.segment_or_default("토너").mid, 12_000);
        assert_eq!(snapshot.segment_or_default("앰플"), band);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_snapshot() {
        let previous = PriceSegmentTable::new(vec![(
            "크림".to_string(),
            PriceSegment::new(10_000, 20_000, 30_000),
        )]);
        let store = Arc::new(PriceSegmentStore::new(previous.clone()));

        let result = refresh_once(&Unreachable, &store, PriceSegment::default()).await;

        assert!(result.is_err());
        assert_eq!(*store.snapshot(), previous);
    }
}
