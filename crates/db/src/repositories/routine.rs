use chrono::{DateTime, Utc};
use sqlx::Row;

use dewy_core::domain::routine::{Routine, RoutineCreate, RoutineId, RoutineItem, UserId};
use dewy_core::tier::UserTier;

use super::{RepositoryError, RoutineRepository};
use crate::DbPool;

pub struct SqlRoutineRepository {
    pool: DbPool,
}

impl SqlRoutineRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const ROUTINE_COLUMNS: &str = "id, user_id, tier, time_minutes, money_won, morning_routine,
                               evening_routine, created_at, updated_at";

fn parse_timestamp(column: &str, value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("{column}: {e}")))
}

fn decode_items(column: &str, raw: &str) -> Result<Vec<RoutineItem>, RepositoryError> {
    serde_json::from_str(raw).map_err(|e| RepositoryError::Decode(format!("{column}: {e}")))
}

fn encode_items(items: &[RoutineItem]) -> Result<String, RepositoryError> {
    serde_json::to_string(items).map_err(|e| RepositoryError::Decode(e.to_string()))
}

fn row_to_routine(row: &sqlx::sqlite::SqliteRow) -> Result<Routine, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let user_id: Option<String> =
        row.try_get("user_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let tier: Option<String> =
        row.try_get("tier").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let time_minutes: i64 =
        row.try_get("time_minutes").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let money_won: i64 =
        row.try_get("money_won").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let morning: String =
        row.try_get("morning_routine").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let evening: String =
        row.try_get("evening_routine").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let updated_at: String =
        row.try_get("updated_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let tier = match tier {
        Some(value) => Some(
            UserTier::parse(&value)
                .ok_or_else(|| RepositoryError::Decode(format!("unknown tier `{value}`")))?,
        ),
        None => None,
    };

    Ok(Routine {
        id: RoutineId(id),
        body: RoutineCreate {
            user_id: user_id.map(UserId),
            tier,
            time_minutes,
            money_won,
            morning_routine: decode_items("morning_routine", &morning)?,
            evening_routine: decode_items("evening_routine", &evening)?,
        },
        created_at: parse_timestamp("created_at", &created_at)?,
        updated_at: parse_timestamp("updated_at", &updated_at)?,
    })
}

#[async_trait::async_trait]
impl RoutineRepository for SqlRoutineRepository {
    async fn create(&self, routine: Routine) -> Result<(), RepositoryError> {
        let morning = encode_items(&routine.body.morning_routine)?;
        let evening = encode_items(&routine.body.evening_routine)?;

        sqlx::query(
            "INSERT INTO routine (id, user_id, tier, time_minutes, money_won, morning_routine,
                                  evening_routine, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&routine.id.0)
        .bind(routine.body.user_id.as_ref().map(|user| user.0.as_str()))
        .bind(routine.body.tier.map(UserTier::as_str))
        .bind(routine.body.time_minutes)
        .bind(routine.body.money_won)
        .bind(morning)
        .bind(evening)
        .bind(routine.created_at.to_rfc3339())
        .bind(routine.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: &RoutineId) -> Result<Option<Routine>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {ROUTINE_COLUMNS} FROM routine WHERE id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_routine).transpose()
    }

    async fn find_latest_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Routine>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {ROUTINE_COLUMNS} FROM routine
             WHERE user_id = ?
             ORDER BY created_at DESC, rowid DESC
             LIMIT 1"
        ))
        .bind(&user_id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_routine).transpose()
    }

    async fn replace(
        &self,
        id: &RoutineId,
        body: RoutineCreate,
    ) -> Result<Option<Routine>, RepositoryError> {
        let updated_at = Utc::now();
        let morning = encode_items(&body.morning_routine)?;
        let evening = encode_items(&body.evening_routine)?;

        // A row deleted concurrently matches nothing and returns no row.
        let row = sqlx::query(
            "UPDATE routine
             SET user_id = ?, tier = ?, time_minutes = ?, money_won = ?,
                 morning_routine = ?, evening_routine = ?, updated_at = ?
             WHERE id = ?
             RETURNING created_at",
        )
        .bind(body.user_id.as_ref().map(|user| user.0.as_str()))
        .bind(body.tier.map(UserTier::as_str))
        .bind(body.time_minutes)
        .bind(body.money_won)
        .bind(morning)
        .bind(evening)
        .bind(updated_at.to_rfc3339())
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let created_at: String =
            row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
        let created_at = parse_timestamp("created_at", &created_at)?;

        Ok(Some(Routine { id: id.clone(), body, created_at, updated_at }))
    }

    async fn delete(&self, id: &RoutineId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM routine WHERE id = ?")
            .bind(&id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use dewy_core::domain::routine::{Routine, RoutineCreate, RoutineId, RoutineItem, UserId};
    use dewy_core::domain::step::UsageTime;
    use dewy_core::tier::UserTier;

    use super::SqlRoutineRepository;
    use crate::repositories::RoutineRepository;
    use crate::{connect_with_settings, migrations};

    async fn setup() -> SqlRoutineRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        SqlRoutineRepository::new(pool)
    }

    fn body(user: &str, cost: i64) -> RoutineCreate {
        RoutineCreate {
            user_id: Some(UserId(user.to_string())),
            tier: Some(UserTier::MTMC),
            time_minutes: 12,
            money_won: 60_000,
            morning_routine: vec![RoutineItem {
                name: "선크림".to_string(),
                usage_time: vec![UsageTime::Morning],
                frequency: 1,
                instructions: "외출 30분 전에 사용합니다.".to_string(),
                sequence: 5,
                time: 1,
                cost,
            }],
            evening_routine: Vec::new(),
        }
    }

    #[tokio::test]
    async fn create_then_find_round_trips_document() {
        let repo = setup().await;
        let routine = Routine::new(body("user-1", 15_000));

        repo.create(routine.clone()).await.expect("create");
        let found = repo.find_by_id(&routine.id).await.expect("find").expect("present");

        assert_eq!(found.body, routine.body);
        assert_eq!(found.created_at.timestamp(), routine.created_at.timestamp());
    }

    #[tokio::test]
    async fn unknown_id_is_none() {
        let repo = setup().await;
        let found = repo.find_by_id(&RoutineId("missing".to_string())).await.expect("find");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn latest_for_user_prefers_newest() {
        let repo = setup().await;
        let mut older = Routine::new(body("user-2", 10_000));
        older.created_at = Utc::now() - Duration::days(1);
        let newer = Routine::new(body("user-2", 20_000));

        repo.create(older).await.expect("create older");
        repo.create(newer.clone()).await.expect("create newer");

        let latest = repo
            .find_latest_for_user(&UserId("user-2".to_string()))
            .await
            .expect("find latest")
            .expect("present");
        assert_eq!(latest.id, newer.id);
    }

    #[tokio::test]
    async fn replace_and_delete_report_missing_ids() {
        let repo = setup().await;
        let routine = Routine::new(body("user-3", 10_000));
        repo.create(routine.clone()).await.expect("create");

        let replaced = repo
            .replace(&routine.id, body("user-3", 30_000))
            .await
            .expect("replace")
            .expect("present");
        assert_eq!(replaced.body.morning_routine[0].cost, 30_000);
        assert_eq!(replaced.created_at, routine.created_at);

        let missing = RoutineId("nope".to_string());
        assert!(repo.replace(&missing, body("user-3", 1)).await.expect("replace").is_none());

        assert!(repo.delete(&routine.id).await.expect("delete"));
        assert!(!repo.delete(&routine.id).await.expect("second delete"));
        assert!(repo.find_by_id(&routine.id).await.expect("find").is_none());
    }

    #[tokio::test]
    async fn replace_returns_the_row_as_stored() {
        let repo = setup().await;
        let routine = Routine::new(body("user-4", 10_000));
        repo.create(routine.clone()).await.expect("create");

        let replaced = repo
            .replace(&routine.id, body("user-4", 25_000))
            .await
            .expect("replace")
            .expect("present");
        let stored = repo.find_by_id(&routine.id).await.expect("find").expect("present");

        assert_eq!(stored.body, replaced.body);
        assert_eq!(stored.created_at.timestamp(), replaced.created_at.timestamp());
        assert_eq!(stored.updated_at.timestamp(), replaced.updated_at.timestamp());
    }

    #[tokio::test]
    async fn replace_after_delete_does_not_resurrect_the_routine() {
        let repo = setup().await;
        let routine = Routine::new(body("user-5", 10_000));
        repo.create(routine.clone()).await.expect("create");
        assert!(repo.delete(&routine.id).await.expect("delete"));

        let replaced = repo.replace(&routine.id, body("user-5", 1)).await.expect("replace");

        assert!(replaced.is_none());
        assert!(repo.find_by_id(&routine.id).await.expect("find").is_none());
    }
}
