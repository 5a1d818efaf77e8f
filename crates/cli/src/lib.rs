pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use commands::generate::GenerateArgs;

#[derive(Debug, Parser)]
#[command(
    name = "dewy",
    about = "Dewy operator CLI",
    long_about = "Apply migrations, inspect configuration, check readiness, and generate skincare routines offline.",
    after_help = "Examples:\n  dewy doctor --json\n  dewy generate --time 20 --money 80000 --owned 선크림 --seed 7\n  dewy segments"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config, allocator settings, and DB connectivity")]
    Doctor {
        #[arg(long, help = "Emit the readiness report as JSON")]
        json: bool,
    },
    #[command(about = "Generate a routine for a time and money budget without the server")]
    Generate {
        #[arg(long, allow_negative_numbers = true, help = "Daily time budget in minutes")]
        time: i64,
        #[arg(long, allow_negative_numbers = true, help = "Money budget in won")]
        money: i64,
        #[arg(long, num_args = 1.., help = "Display names of products already owned")]
        owned: Vec<String>,
        #[arg(long, help = "Seed for a reproducible routine")]
        seed: Option<u64>,
    },
    #[command(about = "Recompute the price segment table from stored observations")]
    Segments,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Config => commands::config::run(),
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Generate { time, money, owned, seed } => commands::generate::run(GenerateArgs {
            time_minutes: time,
            money_won: money,
            owned,
            seed,
        }),
        Command::Segments => commands::segments::run(),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
