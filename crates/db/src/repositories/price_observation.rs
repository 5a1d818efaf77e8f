use chrono::{DateTime, Utc};
use sqlx::Row;
use tracing::debug;

use dewy_core::pricing::PriceObservation;

use super::{reject_negative_price, PriceObservationRepository, RepositoryError};
use crate::DbPool;

pub struct SqlPriceObservationRepository {
    pool: DbPool,
}

impl SqlPriceObservationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_observation(row: &sqlx::sqlite::SqliteRow) -> Result<PriceObservation, RepositoryError> {
    let category: String =
        row.try_get("category").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let price_won: i64 =
        row.try_get("price_won").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let observed_at: String =
        row.try_get("observed_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let observed_at = DateTime::parse_from_rfc3339(&observed_at)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("observed_at: {e}")))?;

    Ok(PriceObservation { category, price_won, observed_at })
}

#[async_trait::async_trait]
impl PriceObservationRepository for SqlPriceObservationRepository {
    async fn record(&self, observation: PriceObservation) -> Result<(), RepositoryError> {
        reject_negative_price(&observation)?;

        sqlx::query(
            "INSERT INTO price_observation (category, price_won, observed_at) VALUES (?, ?, ?)",
        )
        .bind(&observation.category)
        .bind(observation.price_won)
        .bind(observation.observed_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list(&self) -> Result<Vec<PriceObservation>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT category, price_won, observed_at FROM price_observation ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        let observations = rows.iter().map(row_to_observation).collect::<Result<Vec<_>, _>>()?;
        debug!(
            event_name = "price_segments.observations.loaded",
            count = observations.len(),
            "loaded price observations"
        );
        Ok(observations)
    }
}
