use crate::commands::{build_runtime, open_database, CommandResult};
use dewy_core::allocator::{AllocationRequest, RoutineAllocator, StopSignal};
use dewy_core::config::{AppConfig, LoadOptions};
use dewy_core::pricing::PriceSegmentTable;
use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();

    let message = if json_output {
        match serde_json::to_string(&report) {
            Ok(json) => json,
            Err(error) => {
                return CommandResult::failure("doctor", "serialization", error.to_string(), 1);
            }
        }
    } else {
        render_human(&report)
    };

    if report.overall_status == CheckStatus::Pass {
        CommandResult::success("doctor", message)
    } else {
        CommandResult::failure("doctor", "readiness", message, 6)
    }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_allocator(&config));
            checks.push(check_database(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(skipped("allocator_dry_run"));
            checks.push(skipped("database_connectivity"));
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn skipped(name: &'static str) -> DoctorCheck {
    DoctorCheck {
        name,
        status: CheckStatus::Skipped,
        details: "skipped because configuration did not load".to_string(),
    }
}

/// Runs the configured allocator once on a small fixed budget.
fn check_allocator(config: &AppConfig) -> DoctorCheck {
    let allocator = RoutineAllocator::new(config.allocator.settings());
    let request = AllocationRequest { time_minutes: 10, money_won: 50_000, owned_cosmetics: Vec::new() };
    let table = PriceSegmentTable::empty().with_default(config.price_segments.default_band());

    match allocator.allocate(&request, &table, &StopSignal::never(), &mut StdRng::seed_from_u64(0)) {
        Ok(allocation) => DoctorCheck {
            name: "allocator_dry_run",
            status: CheckStatus::Pass,
            details: format!(
                "tier {} with {} picks after {} iterations",
                allocation.tier,
                allocation.picks.len(),
                allocation.iterations
            ),
        },
        Err(error) => DoctorCheck {
            name: "allocator_dry_run",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

fn check_database(config: &AppConfig) -> DoctorCheck {
    let runtime = match build_runtime("doctor") {
        Ok(runtime) => runtime,
        Err(result) => {
            return DoctorCheck {
                name: "database_connectivity",
                status: CheckStatus::Fail,
                details: result.output,
            };
        }
    };

    let result = runtime.block_on(async {
        let pool = open_database(config).await?;
        pool.close().await;
        Ok::<(), crate::commands::Failure>(())
    });

    match result {
        Ok(()) => DoctorCheck {
            name: "database_connectivity",
            status: CheckStatus::Pass,
            details: format!("connected and migrated using `{}`", config.database.url),
        },
        Err((error_class, message, _)) => DoctorCheck {
            name: "database_connectivity",
            status: CheckStatus::Fail,
            details: format!("{error_class}: {message}"),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}
