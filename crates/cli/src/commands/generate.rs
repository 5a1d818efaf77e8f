use crate::commands::segments::load_table;
use crate::commands::{build_runtime, load_config, CommandResult};
use dewy_core::allocator::{AllocationRequest, RoutineAllocator, StopSignal};
use dewy_core::domain::routine::RoutineCreate;
use dewy_core::errors::DomainError;
use dewy_core::pricing::PriceSegmentTable;
use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;

#[derive(Clone, Debug, Default)]
pub struct GenerateArgs {
    pub time_minutes: i64,
    pub money_won: i64,
    pub owned: Vec<String>,
    pub seed: Option<u64>,
}

#[derive(Debug, Serialize)]
struct GenerateReport {
    price_source: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    fallback_reason: Option<String>,
    routine: RoutineCreate,
}

/// Allocates a routine offline. Prices come from the configured database when
/// it is reachable, otherwise from the default band alone.
pub fn run(args: GenerateArgs) -> CommandResult {
    let config = match load_config("generate") {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match build_runtime("generate") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let (table, price_source, fallback_reason) = match runtime.block_on(load_table(&config)) {
        Ok(table) => (table, "database", None),
        Err((error_class, message, _)) => (
            PriceSegmentTable::empty().with_default(config.price_segments.default_band()),
            "default_band",
            Some(format!("{error_class}: {message}")),
        ),
    };

    let request = AllocationRequest {
        time_minutes: args.time_minutes,
        money_won: args.money_won,
        owned_cosmetics: args.owned,
    };
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let allocator = RoutineAllocator::new(config.allocator.settings());
    let routine = match allocator.generate(&request, None, &table, &StopSignal::never(), &mut rng) {
        Ok(routine) => routine,
        Err(error @ DomainError::InvalidAllocationRequest(_)) => {
            return CommandResult::failure("generate", "invalid_request", error.to_string(), 7);
        }
        Err(error) => {
            return CommandResult::failure("generate", "allocation", error.to_string(), 9);
        }
    };

    let report = GenerateReport { price_source, fallback_reason, routine };
    match serde_json::to_string(&report) {
        Ok(json) => CommandResult::success("generate", json),
        Err(error) => CommandResult::failure("generate", "serialization", error.to_string(), 1),
    }
}
