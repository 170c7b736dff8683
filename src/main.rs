use std::process::ExitCode;

use clap::Parser;
use testsift::cli::{Cli, Commands};
use testsift::error::TestsiftError;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "TESTSIFT_LOG";

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match run() {
        Ok(Output::Json(output)) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Ok(Output::Text(output)) => {
            print!("{output}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            tracing::debug!(%error, "command failed");
            let serialized = serde_json::to_string_pretty(&error.to_error_response()).unwrap_or_else(
                |_| {
                    "{\"error\":{\"type\":\"serialization_error\",\"message\":\"Failed to serialize error response\"}}"
                        .to_string()
                },
            );
            println!("{serialized}");
            ExitCode::FAILURE
        }
    }
}

enum Output {
    Json(String),
    Text(String),
}

fn run() -> Result<Output, TestsiftError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze(args) => to_json(&testsift::cli::analyze::run_analyze(args)?),
        Commands::Blocks(args) => to_json(&testsift::cli::blocks::run_blocks(args)?),
        Commands::Classify(args) => testsift::cli::classify::run_classify(args).map(Output::Text),
        Commands::Args(args) => to_json(&testsift::cli::args::run_args(args)?),
    }
}

fn to_json<T: serde::Serialize>(response: &T) -> Result<Output, TestsiftError> {
    serde_json::to_string_pretty(response)
        .map(Output::Json)
        .map_err(|source| TestsiftError::ResponseSerialization { source })
}
