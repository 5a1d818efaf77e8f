use std::process::ExitCode;

fn main() -> ExitCode {
    dewy_cli::run()
}
