use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;

use dewy_core::domain::record::{DailyRoutineRecord, RoutinePractice, RoutineRecord};
use dewy_core::domain::routine::{Routine, RoutineCreate, RoutineId, UserId};
use dewy_core::domain::step::UsageTime;
use dewy_core::pricing::PriceObservation;

use super::{
    reject_negative_price, PriceObservationRepository, RepositoryError, RoutineRecordRepository,
    RoutineRepository,
};

#[derive(Default)]
pub struct InMemoryRoutineRepository {
    routines: RwLock<HashMap<String, (u64, Routine)>>,
    sequence: RwLock<u64>,
}

#[async_trait::async_trait]
impl RoutineRepository for InMemoryRoutineRepository {
    async fn create(&self, routine: Routine) -> Result<(), RepositoryError> {
        let mut sequence = self.sequence.write().await;
        *sequence += 1;
        let mut routines = self.routines.write().await;
        routines.insert(routine.id.0.clone(), (*sequence, routine));
        Ok(())
    }

    async fn find_by_id(&self, id: &RoutineId) -> Result<Option<Routine>, RepositoryError> {
        let routines = self.routines.read().await;
        Ok(routines.get(&id.0).map(|(_, routine)| routine.clone()))
    }

    async fn find_latest_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Routine>, RepositoryError> {
        let routines = self.routines.read().await;
        Ok(routines
            .values()
            .filter(|(_, routine)| routine.body.user_id.as_ref() == Some(user_id))
            .max_by_key(|(inserted, routine)| (routine.created_at, *inserted))
            .map(|(_, routine)| routine.clone()))
    }

    async fn replace(
        &self,
        id: &RoutineId,
        body: RoutineCreate,
    ) -> Result<Option<Routine>, RepositoryError> {
        let mut routines = self.routines.write().await;
        Ok(routines.get_mut(&id.0).map(|(_, routine)| {
            routine.body = body;
            routine.updated_at = Utc::now();
            routine.clone()
        }))
    }

    async fn delete(&self, id: &RoutineId) -> Result<bool, RepositoryError> {
        let mut routines = self.routines.write().await;
        Ok(routines.remove(&id.0).is_some())
    }
}

#[derive(Default)]
pub struct InMemoryRoutineRecordRepository {
    records: RwLock<HashMap<String, BTreeMap<NaiveDate, DailyRoutineRecord>>>,
}

#[async_trait::async_trait]
impl RoutineRecordRepository for InMemoryRoutineRecordRepository {
    async fn save_practice(
        &self,
        user_id: &UserId,
        date: NaiveDate,
        usage_time: UsageTime,
        practice: RoutinePractice,
    ) -> Result<DailyRoutineRecord, RepositoryError> {
        let mut records = self.records.write().await;
        let day = records
            .entry(user_id.0.clone())
            .or_default()
            .entry(date)
            .or_insert_with(|| DailyRoutineRecord::empty(date));
        day.apply(usage_time, practice);
        Ok(day.clone())
    }

    async fn find_by_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<RoutineRecord>, RepositoryError> {
        let records = self.records.read().await;
        Ok(records.get(&user_id.0).filter(|days| !days.is_empty()).map(|days| RoutineRecord {
            user_id: user_id.clone(),
            records: days.values().cloned().collect(),
        }))
    }
}

#[derive(Default)]
pub struct InMemoryPriceObservationRepository {
    observations: RwLock<Vec<PriceObservation>>,
}

#[async_trait::async_trait]
impl PriceObservationRepository for InMemoryPriceObservationRepository {
    async fn record(&self, observation: PriceObservation) -> Result<(), RepositoryError> {
        reject_negative_price(&observation)?;
        self.observations.write().await.push(observation);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<PriceObservation>, RepositoryError> {
        Ok(self.observations.read().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use dewy_core::domain::record::RoutinePractice;
    use dewy_core::domain::routine::{Routine, RoutineCreate, UserId};
    use dewy_core::domain::step::UsageTime;
    use dewy_core::pricing::{PriceObservation, DEFAULT_SEGMENT};

    use crate::repositories::{
        InMemoryPriceObservationRepository, InMemoryRoutineRecordRepository,
        InMemoryRoutineRepository, PriceObservationRepository, RoutineRecordRepository,
        RoutineRepository,
    };

    fn body(user: &str) -> RoutineCreate {
        RoutineCreate {
            user_id: Some(UserId(user.to_string())),
            tier: None,
            time_minutes: 5,
            money_won: 10_000,
            morning_routine: Vec::new(),
            evening_routine: Vec::new(),
        }
    }

    #[tokio::test]
    async fn in_memory_routine_repo_round_trip() {
        let repo = InMemoryRoutineRepository::default();
        let routine = Routine::new(body("user-1"));

        repo.create(routine.clone()).await.expect("save routine");
        let found = repo.find_by_id(&routine.id).await.expect("find routine");

        assert_eq!(found, Some(routine));
    }

    #[tokio::test]
    async fn in_memory_latest_for_user_uses_insert_order_on_ties() {
        let repo = InMemoryRoutineRepository::default();
        let first = Routine::new(body("user-1"));
        let mut second = Routine::new(body("user-1"));
        second.created_at = first.created_at;

        repo.create(first).await.expect("save first");
        repo.create(second.clone()).await.expect("save second");

        let latest = repo
            .find_latest_for_user(&UserId("user-1".to_string()))
            .await
            .expect("find")
            .expect("present");
        assert_eq!(latest.id, second.id);
    }

    #[tokio::test]
    async fn in_memory_record_repo_merges_halves() {
        let repo = InMemoryRoutineRecordRepository::default();
        let user = UserId("user-1".to_string());
        let date = NaiveDate::from_ymd_opt(2026, 5, 1).expect("date");

        repo.save_practice(&user, date, UsageTime::Evening, RoutinePractice::from([("크림".to_string(), true)]))
            .await
            .expect("save evening");
        let day = repo
            .save_practice(&user, date, UsageTime::Morning, RoutinePractice::new())
            .await
            .expect("save morning");

        assert_eq!(day.evening.len(), 1);
        assert!(day.morning.is_empty());
    }

    #[tokio::test]
    async fn in_memory_price_repo_falls_back_to_default_band() {
        let repo = InMemoryPriceObservationRepository::default();
        repo.record(PriceObservation::new("토너", 9_000)).await.expect("record");

        let table = repo.load_segments().await.expect("segments");
        assert_eq!(table.segment_or_default("토너").mid, 9_000);
        assert_eq!(table.segment_or_default("선크림"), DEFAULT_SEGMENT);
    }
}
