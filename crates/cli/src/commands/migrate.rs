use crate::commands::{build_runtime, load_config, open_database, CommandResult, Failure};
use dewy_db::migrations;

pub fn run() -> CommandResult {
    let config = match load_config("migrate") {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match build_runtime("migrate") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = open_database(&config).await?;
        let versions = migrations::applied_versions(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;
        pool.close().await;
        Ok::<Vec<i64>, Failure>(versions)
    });

    match result {
        Ok(versions) => {
            let versions =
                versions.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");
            CommandResult::success(
                "migrate",
                format!("applied pending migrations (schema versions: {versions})"),
            )
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("migrate", error_class, message, exit_code)
        }
    }
}
