use chrono::{NaiveDate, Utc};
use sqlx::Row;

use dewy_core::domain::record::{DailyRoutineRecord, RoutinePractice, RoutineRecord};
use dewy_core::domain::routine::UserId;
use dewy_core::domain::step::UsageTime;

use super::{RepositoryError, RoutineRecordRepository};
use crate::DbPool;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct SqlRoutineRecordRepository {
    pool: DbPool,
}

impl SqlRoutineRecordRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn decode_practice(column: &str, raw: &str) -> Result<RoutinePractice, RepositoryError> {
    serde_json::from_str(raw).map_err(|e| RepositoryError::Decode(format!("{column}: {e}")))
}

fn row_to_day(row: &sqlx::sqlite::SqliteRow) -> Result<DailyRoutineRecord, RepositoryError> {
    let date: String =
        row.try_get("record_date").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let morning: String =
        row.try_get("morning").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let evening: String =
        row.try_get("evening").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(DailyRoutineRecord {
        date: NaiveDate::parse_from_str(&date, DATE_FORMAT)
            .map_err(|e| RepositoryError::Decode(format!("record_date: {e}")))?,
        morning: decode_practice("morning", &morning)?,
        evening: decode_practice("evening", &evening)?,
    })
}

#[async_trait::async_trait]
impl RoutineRecordRepository for SqlRoutineRecordRepository {
    async fn save_practice(
        &self,
        user_id: &UserId,
        date: NaiveDate,
        usage_time: UsageTime,
        practice: RoutinePractice,
    ) -> Result<DailyRoutineRecord, RepositoryError> {
        let encoded =
            serde_json::to_string(&practice).map_err(|e| RepositoryError::Decode(e.to_string()))?;
        let date_str = date.format(DATE_FORMAT).to_string();

        // Only the column for this half of the day is touched on conflict.
        let statement = match usage_time {
            UsageTime::Morning => {
                "INSERT INTO routine_record (user_id, record_date, morning, updated_at)
                 VALUES (?, ?, ?, ?)
                 ON CONFLICT(user_id, record_date) DO UPDATE SET
                     morning = excluded.morning,
                     updated_at = excluded.updated_at"
            }
            UsageTime::Evening => {
                "INSERT INTO routine_record (user_id, record_date, evening, updated_at)
                 VALUES (?, ?, ?, ?)
                 ON CONFLICT(user_id, record_date) DO UPDATE SET
                     evening = excluded.evening,
                     updated_at = excluded.updated_at"
            }
        };

        sqlx::query(statement)
            .bind(&user_id.0)
            .bind(&date_str)
            .bind(encoded)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;

        let row = sqlx::query(
            "SELECT record_date, morning, evening FROM routine_record
             WHERE user_id = ? AND record_date = ?",
        )
        .bind(&user_id.0)
        .bind(&date_str)
        .fetch_one(&self.pool)
        .await?;

        row_to_day(&row)
    }

    async fn find_by_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<RoutineRecord>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT record_date, morning, evening FROM routine_record
             WHERE user_id = ? ORDER BY record_date ASC",
        )
        .bind(&user_id.0)
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Ok(None);
        }

        let records = rows.iter().map(row_to_day).collect::<Result<Vec<_>, _>>()?;
        Ok(Some(RoutineRecord { user_id: user_id.clone(), records }))
    }
}
