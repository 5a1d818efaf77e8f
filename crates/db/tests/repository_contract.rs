use chrono::NaiveDate;

use dewy_core::domain::record::RoutinePractice;
use dewy_core::domain::routine::{Routine, RoutineCreate, RoutineId, UserId};
use dewy_core::domain::step::UsageTime;
use dewy_core::pricing::{PriceObservation, PriceSegment};
use dewy_db::repositories::{
    InMemoryPriceObservationRepository, InMemoryRoutineRecordRepository,
    InMemoryRoutineRepository, SqlPriceObservationRepository, SqlRoutineRecordRepository,
    SqlRoutineRepository,
};
use dewy_db::{
    connect_with_settings, migrations, DbPool, PriceObservationRepository,
    RoutineRecordRepository, RoutineRepository,
};

type ContractResult<T = ()> = Result<T, String>;

macro_rules! require {
    ($cond:expr, $($arg:tt)*) => {
        if !$cond {
            return Err(format!($($arg)*));
        }
    };
}

async fn migrated_pool() -> ContractResult<DbPool> {
    let pool = connect_with_settings("sqlite::memory:", 1, 30)
        .await
        .map_err(|err| format!("connect failed: {err}"))?;
    migrations::run_pending(&pool).await.map_err(|err| format!("migrations failed: {err}"))?;
    Ok(pool)
}

fn body(user: &str, money_won: i64) -> RoutineCreate {
    RoutineCreate {
        user_id: Some(UserId(user.to_string())),
        tier: None,
        time_minutes: 10,
        money_won,
        morning_routine: Vec::new(),
        evening_routine: Vec::new(),
    }
}

async fn routine_contract(repo: &dyn RoutineRepository) -> ContractResult {
    let routine = Routine::new(body("contract-user", 50_000));
    repo.create(routine.clone()).await.map_err(|err| err.to_string())?;

    let found = repo.find_by_id(&routine.id).await.map_err(|err| err.to_string())?;
    require!(found.as_ref().map(|r| &r.body) == Some(&routine.body), "created routine should be found");

    let latest = repo
        .find_latest_for_user(&UserId("contract-user".to_string()))
        .await
        .map_err(|err| err.to_string())?;
    require!(latest.map(|r| r.id) == Some(routine.id.clone()), "latest routine should be the created one");

    let replaced =
        repo.replace(&routine.id, body("contract-user", 70_000)).await.map_err(|err| err.to_string())?;
    require!(
        replaced.map(|r| r.body.money_won) == Some(70_000),
        "replace should return the new body"
    );

    let missing = RoutineId("does-not-exist".to_string());
    require!(
        repo.replace(&missing, body("x", 1)).await.map_err(|err| err.to_string())?.is_none(),
        "replacing an unknown routine should report none"
    );

    require!(repo.delete(&routine.id).await.map_err(|err| err.to_string())?, "delete should remove");
    require!(
        !repo.delete(&routine.id).await.map_err(|err| err.to_string())?,
        "second delete should report nothing removed"
    );
    Ok(())
}

async fn record_contract(repo: &dyn RoutineRecordRepository) -> ContractResult {
    let user = UserId("contract-user".to_string());
    let date = NaiveDate::from_ymd_opt(2026, 6, 1).ok_or("bad date")?;

    repo.save_practice(&user, date, UsageTime::Morning, RoutinePractice::from([("선크림".to_string(), true)]))
        .await
        .map_err(|err| err.to_string())?;
    let day = repo
        .save_practice(&user, date, UsageTime::Evening, RoutinePractice::from([("크림".to_string(), true)]))
        .await
        .map_err(|err| err.to_string())?;
    require!(day.morning.len() == 1 && day.evening.len() == 1, "both halves should be kept");

    let record = repo.find_by_user(&user).await.map_err(|err| err.to_string())?;
    require!(record.map(|r| r.records.len()) == Some(1), "one day should be stored");
    Ok(())
}

async fn price_contract(repo: &dyn PriceObservationRepository) -> ContractResult {
    for price in [10_000, 20_000, 30_000, 40_000, 50_000] {
        repo.record(PriceObservation::new("에센스", price)).await.map_err(|err| err.to_string())?;
    }
    require!(repo.record(PriceObservation::new("에센스", -5)).await.is_err(), "negative price must fail");

    let table = repo.load_segments().await.map_err(|err| err.to_string())?;
    require!(
        table.get("에센스") == Some(&PriceSegment::new(20_000, 30_000, 40_000)),
        "segment should use 25/50/75 percentiles, got {:?}",
        table.get("에센스")
    );
    Ok(())
}

#[tokio::test]
async fn sql_repositories_satisfy_contract() -> ContractResult {
    let pool = migrated_pool().await?;
    routine_contract(&SqlRoutineRepository::new(pool.clone())).await?;
    record_contract(&SqlRoutineRecordRepository::new(pool.clone())).await?;
    price_contract(&SqlPriceObservationRepository::new(pool)).await
}

#[tokio::test]
async fn in_memory_repositories_satisfy_contract() -> ContractResult {
    routine_contract(&InMemoryRoutineRepository::default()).await?;
    record_contract(&InMemoryRoutineRecordRepository::default()).await?;
    price_contract(&InMemoryPriceObservationRepository::default()).await
}
