use crate::commands::{build_runtime, load_config, open_database, CommandResult, Failure};
use dewy_core::config::AppConfig;
use dewy_core::pricing::PriceSegmentTable;
use dewy_db::repositories::SqlPriceObservationRepository;
use dewy_db::PriceObservationRepository;

pub fn run() -> CommandResult {
    let config = match load_config("segments") {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match build_runtime("segments") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    match runtime.block_on(load_table(&config)) {
        Ok(table) => CommandResult::success("segments", render(&table)),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("segments", error_class, message, exit_code)
        }
    }
}

/// Aggregates stored price observations into a table whose fallback is the
/// configured default band.
pub(crate) async fn load_table(config: &AppConfig) -> Result<PriceSegmentTable, Failure> {
    let pool = open_database(config).await?;
    let table = SqlPriceObservationRepository::new(pool.clone())
        .load_segments()
        .await
        .map_err(|error| ("segments_query", error.to_string(), 8u8))?;
    pool.close().await;
    Ok(table.with_default(config.price_segments.default_band()))
}

fn render(table: &PriceSegmentTable) -> String {
    let band = table.default_segment();
    let mut lines =
        vec![format!("default band: low={} mid={} high={}", band.low, band.mid, band.high)];

    let mut rows: Vec<_> = table.iter().collect();
    rows.sort_by(|(left, _), (right, _)| left.cmp(right));
    if rows.is_empty() {
        lines.push("no price observations recorded; every category uses the default band".to_string());
    }
    for (category, segment) in rows {
        lines.push(format!(
            "- {category}: low={} mid={} high={}",
            segment.low, segment.mid, segment.high
        ));
    }

    lines.join("\n")
}
