//! Run a grid search described by a JSON config file and print the report as JSON.
//!
//! Usage: `lsh-sweep <config.json>`. Log verbosity follows `RUST_LOG`
//! (defaults to `info`).

use std::process::ExitCode;

use lshblock::{run_experiment, ExperimentConfig};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let Some(path) = std::env::args_os().nth(1) else {
        eprintln!("usage: lsh-sweep <config.json>");
        return ExitCode::from(2);
    };

    let report = match ExperimentConfig::from_path(&path).and_then(|c| run_experiment(&c)) {
        Ok(report) => report,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match serde_json::to_string_pretty(&report) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("failed to serialize report: {e}");
            ExitCode::FAILURE
        }
    }
}
