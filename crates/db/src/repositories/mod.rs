use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use dewy_core::domain::record::{DailyRoutineRecord, RoutinePractice, RoutineRecord};
use dewy_core::domain::routine::{Routine, RoutineCreate, RoutineId, UserId};
use dewy_core::domain::step::UsageTime;
use dewy_core::pricing::{PriceObservation, PriceSegmentTable};

pub mod memory;
pub mod price_observation;
pub mod record;
pub mod routine;

pub use memory::{
    InMemoryPriceObservationRepository, InMemoryRoutineRecordRepository,
    InMemoryRoutineRepository,
};
pub use price_observation::SqlPriceObservationRepository;
pub use record::SqlRoutineRecordRepository;
pub use routine::SqlRoutineRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("invalid value: {0}")]
    Invalid(String),
}

#[async_trait]
pub trait RoutineRepository: Send + Sync {
    async fn create(&self, routine: Routine) -> Result<(), RepositoryError>;
    async fn find_by_id(&self, id: &RoutineId) -> Result<Option<Routine>, RepositoryError>;
    /// Most recently created routine of `user_id`.
    async fn find_latest_for_user(&self, user_id: &UserId)
        -> Result<Option<Routine>, RepositoryError>;
    /// Replaces the body of an existing routine. `None` when `id` is unknown.
    async fn replace(
        &self,
        id: &RoutineId,
        body: RoutineCreate,
    ) -> Result<Option<Routine>, RepositoryError>;
    async fn delete(&self, id: &RoutineId) -> Result<bool, RepositoryError>;
}

#[async_trait]
pub trait RoutineRecordRepository: Send + Sync {
    /// Upserts one half of a day's practice and returns the whole day.
    async fn save_practice(
        &self,
        user_id: &UserId,
        date: NaiveDate,
        usage_time: UsageTime,
        practice: RoutinePractice,
    ) -> Result<DailyRoutineRecord, RepositoryError>;

    async fn find_by_user(&self, user_id: &UserId)
        -> Result<Option<RoutineRecord>, RepositoryError>;
}

#[async_trait]
pub trait PriceObservationRepository: Send + Sync {
    async fn record(&self, observation: PriceObservation) -> Result<(), RepositoryError>;
    async fn list(&self) -> Result<Vec<PriceObservation>, RepositoryError>;

    /// Aggregates every stored observation into a fresh segment table.
    async fn load_segments(&self) -> Result<PriceSegmentTable, RepositoryError> {
        let observations = self.list().await?;
        Ok(PriceSegmentTable::from_observations(
            observations.into_iter().map(|observation| (observation.category, observation.price_won)),
        ))
    }
}

pub(crate) fn reject_negative_price(observation: &PriceObservation) -> Result<(), RepositoryError> {
    if observation.price_won < 0 {
        return Err(RepositoryError::Invalid(format!(
            "price for `{}` must not be negative: {}",
            observation.category, observation.price_won
        )));
    }
    Ok(())
}
