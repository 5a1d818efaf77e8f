//! Routine HTTP API.
//!
//! - `POST   /routine`                   generate and persist a routine
//! - `GET    /routine/{routine_id}`      fetch a routine
//! - `PUT    /routine/{routine_id}`      replace a routine body
//! - `DELETE /routine/{routine_id}`      delete a routine
//! - `GET    /routine/user/{user_id}`    latest routine of a user
//! - `POST   /routine/record`            record one half of a day's practice
//! - `GET    /routine/record/{user_id}`  practice history of a user

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use dewy_core::allocator::{AllocationRequest, RoutineAllocator, StopSignal};
use dewy_core::domain::record::{DailyRoutineRecord, RoutinePractice, RoutineRecord};
use dewy_core::domain::routine::{Routine, RoutineCreate, RoutineId, UserId};
use dewy_core::domain::step::UsageTime;
use dewy_core::errors::{ApplicationError, InterfaceError};
use dewy_core::pricing::PriceSegmentStore;
use dewy_db::repositories::{SqlRoutineRecordRepository, SqlRoutineRepository};
use dewy_db::{DbPool, RepositoryError, RoutineRecordRepository, RoutineRepository};
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub routines: Arc<dyn RoutineRepository>,
    pub records: Arc<dyn RoutineRecordRepository>,
    pub segments: Arc<PriceSegmentStore>,
    pub allocator: Arc<RoutineAllocator>,
}

impl AppState {
    pub fn sqlite(
        db_pool: DbPool,
        segments: Arc<PriceSegmentStore>,
        allocator: RoutineAllocator,
    ) -> Self {
        Self {
            routines: Arc::new(SqlRoutineRepository::new(db_pool.clone())),
            records: Arc::new(SqlRoutineRecordRepository::new(db_pool)),
            segments,
            allocator: Arc::new(allocator),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GenerateRoutineRequest {
    pub time_minutes: i64,
    pub money_won: i64,
    #[serde(default)]
    pub owned_cosmetics: Vec<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecordPracticeRequest {
    pub user_id: String,
    pub date: NaiveDate,
    pub usage_time: UsageTime,
    #[serde(default)]
    pub routine_practice: RoutinePractice,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/routine", post(create_routine))
        .route("/routine/record", post(record_practice))
        .route("/routine/record/{user_id}", get(get_records))
        .route("/routine/user/{user_id}", get(get_latest_for_user))
        .route(
            "/routine/{routine_id}",
            get(get_routine).put(replace_routine).delete(delete_routine),
        )
        .with_state(state)
}

async fn create_routine(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRoutineRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Routine>), ApiError> {
    let correlation_id = Uuid::new_v4().to_string();
    let Json(payload) = payload.map_err(|rejection| bad_json(rejection, &correlation_id))?;

    let request = AllocationRequest {
        time_minutes: payload.time_minutes,
        money_won: payload.money_won,
        owned_cosmetics: payload.owned_cosmetics,
    };
    let user_id = payload.user_id.map(UserId);
    let segments = state.segments.snapshot();
    let allocator = Arc::clone(&state.allocator);

    let generated = tokio::task::spawn_blocking(move || {
        let mut rng = StdRng::from_entropy();
        allocator.generate(&request, user_id, &segments, &StopSignal::never(), &mut rng)
    })
    .await
    .map_err(|join_error| {
        reject(InterfaceError::Internal {
            message: format!("allocation task failed: {join_error}"),
            correlation_id: correlation_id.clone(),
        })
    })?
    .map_err(|domain_error| reject(ApplicationError::from(domain_error).into_interface(&correlation_id)))?;

    let routine = Routine::new(generated);
    state.routines.create(routine.clone()).await.map_err(|err| persistence(err, &correlation_id))?;

    info!(
        event_name = "routine.created",
        correlation_id = %correlation_id,
        routine_id = %routine.id,
        morning = routine.body.morning_routine.len(),
        evening = routine.body.evening_routine.len(),
        total_cost = routine.body.total_cost(),
        "routine generated and stored"
    );

    Ok((StatusCode::CREATED, Json(routine)))
}

async fn get_routine(
    State(state): State<AppState>,
    Path(routine_id): Path<String>,
) -> Result<Json<Routine>, ApiError> {
    let correlation_id = Uuid::new_v4().to_string();
    let id = RoutineId(routine_id);
    state
        .routines
        .find_by_id(&id)
        .await
        .map_err(|err| persistence(err, &correlation_id))?
        .map(Json)
        .ok_or_else(|| not_found("routine", &id.0, &correlation_id))
}

async fn replace_routine(
    State(state): State<AppState>,
    Path(routine_id): Path<String>,
    payload: Result<Json<RoutineCreate>, JsonRejection>,
) -> Result<Json<Routine>, ApiError> {
    let correlation_id = Uuid::new_v4().to_string();
    let Json(body) = payload.map_err(|rejection| bad_json(rejection, &correlation_id))?;
    body.validate()
        .map_err(|domain_error| reject(ApplicationError::from(domain_error).into_interface(&correlation_id)))?;
    let id = RoutineId(routine_id);

    let replaced = state
        .routines
        .replace(&id, body)
        .await
        .map_err(|err| persistence(err, &correlation_id))?
        .ok_or_else(|| not_found("routine", &id.0, &correlation_id))?;

    info!(
        event_name = "routine.replaced",
        correlation_id = %correlation_id,
        routine_id = %replaced.id,
        "routine replaced"
    );
    Ok(Json(replaced))
}

async fn delete_routine(
    State(state): State<AppState>,
    Path(routine_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let correlation_id = Uuid::new_v4().to_string();
    let id = RoutineId(routine_id);

    if !state.routines.delete(&id).await.map_err(|err| persistence(err, &correlation_id))? {
        return Err(not_found("routine", &id.0, &correlation_id));
    }

    info!(event_name = "routine.deleted", correlation_id = %correlation_id, routine_id = %id, "routine deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn get_latest_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Routine>, ApiError> {
    let correlation_id = Uuid::new_v4().to_string();
    let user_id = UserId(user_id);
    state
        .routines
        .find_latest_for_user(&user_id)
        .await
        .map_err(|err| persistence(err, &correlation_id))?
        .map(Json)
        .ok_or_else(|| not_found("routine for user", &user_id.0, &correlation_id))
}

async fn record_practice(
    State(state): State<AppState>,
    payload: Result<Json<RecordPracticeRequest>, JsonRejection>,
) -> Result<Json<DailyRoutineRecord>, ApiError> {
    let correlation_id = Uuid::new_v4().to_string();
    let Json(payload) = payload.map_err(|rejection| bad_json(rejection, &correlation_id))?;
    let user_id = UserId(payload.user_id);

    let day = state
        .records
        .save_practice(&user_id, payload.date, payload.usage_time, payload.routine_practice)
        .await
        .map_err(|err| persistence(err, &correlation_id))?;

    info!(
        event_name = "routine_record.saved",
        correlation_id = %correlation_id,
        user_id = %user_id,
        date = %payload.date,
        usage_time = %payload.usage_time,
        "routine practice recorded"
    );
    Ok(Json(day))
}

async fn get_records(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<RoutineRecord>, ApiError> {
    let correlation_id = Uuid::new_v4().to_string();
    let user_id = UserId(user_id);
    state
        .records
        .find_by_user(&user_id)
        .await
        .map_err(|err| persistence(err, &correlation_id))?
        .map(Json)
        .ok_or_else(|| not_found("routine record", &user_id.0, &correlation_id))
}

fn reject(error: InterfaceError) -> ApiError {
    let (status, message) = match &error {
        InterfaceError::BadRequest { message, .. } => (StatusCode::BAD_REQUEST, message.clone()),
        InterfaceError::NotFound { message, .. } => (StatusCode::NOT_FOUND, message.clone()),
        InterfaceError::ServiceUnavailable { .. } => {
            (StatusCode::SERVICE_UNAVAILABLE, error.user_message().to_string())
        }
        InterfaceError::Internal { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, error.user_message().to_string())
        }
    };

    if status.is_server_error() {
        error!(
            event_name = "routine.request.failed",
            correlation_id = %error.correlation_id(),
            status = status.as_u16(),
            error = %error,
            "routine request failed"
        );
    } else {
        warn!(
            event_name = "routine.request.rejected",
            correlation_id = %error.correlation_id(),
            status = status.as_u16(),
            error = %error,
            "routine request rejected"
        );
    }

    (status, Json(ErrorBody { error: message }))
}

fn bad_json(rejection: JsonRejection, correlation_id: &str) -> ApiError {
    reject(InterfaceError::BadRequest {
        message: rejection.body_text(),
        correlation_id: correlation_id.to_string(),
    })
}

fn not_found(entity: &'static str, id: &str, correlation_id: &str) -> ApiError {
    reject(ApplicationError::NotFound { entity, id: id.to_string() }.into_interface(correlation_id))
}

fn persistence(error: RepositoryError, correlation_id: &str) -> ApiError {
    reject(ApplicationError::Persistence(error.to_string()).into_interface(correlation_id))
}
