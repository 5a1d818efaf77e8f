use std::sync::Arc;

use axum::Router;
use dewy_core::allocator::RoutineAllocator;
use dewy_core::config::{AppConfig, ConfigError};
use dewy_core::pricing::{PriceSegmentStore, PriceSegmentTable};
use dewy_db::repositories::SqlPriceObservationRepository;
use dewy_db::{connect_from_config, migrations, DbPool, PriceObservationRepository};
use thiserror::Error;
use tracing::{info, warn};

use crate::health::{self, HealthState};
use crate::refresh;
use crate::routes::{self, AppState};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub segments: Arc<PriceSegmentStore>,
    pub observations: Arc<dyn PriceObservationRepository>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

impl Application {
    pub fn router(&self) -> Router {
        let allocator = RoutineAllocator::new(self.config.allocator.settings());
        let state = AppState::sqlite(self.db_pool.clone(), Arc::clone(&self.segments), allocator);
        routes::router(state).merge(health::router(HealthState {
            db_pool: self.db_pool.clone(),
            segments: Arc::clone(&self.segments),
        }))
    }
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", correlation_id = "bootstrap", "starting application bootstrap");

    let db_pool = connect_from_config(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let default_band = config.price_segments.default_band();
    let segments = Arc::new(PriceSegmentStore::new(PriceSegmentTable::empty().with_default(default_band)));
    let observations: Arc<dyn PriceObservationRepository> =
        Arc::new(SqlPriceObservationRepository::new(db_pool.clone()));

    // A missing segment table only degrades pricing to the default band.
    match refresh::refresh_once(observations.as_ref(), &segments, default_band).await {
        Ok(categories) => info!(
            event_name = "system.bootstrap.price_segments_loaded",
            correlation_id = "bootstrap",
            categories,
            "price segments loaded"
        ),
        Err(error) => warn!(
            event_name = "price_segments.refresh.failed",
            correlation_id = "bootstrap",
            error = %error,
            "initial price segment load failed; using default band"
        ),
    }

    Ok(Application { config, db_pool, segments, observations })
}
