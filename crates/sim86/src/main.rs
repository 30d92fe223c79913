//! CLI entry point for the sim86 binary.

use std::process::ExitCode;

use anyhow as _;
use clap::Parser;
use serde as _;
use serde_json as _;
use sim86::cli::{self, Args};
use sim86_core as _;
#[cfg(test)]
use tempfile as _;
use tracing::error;
use tracing_subscriber as _;

fn main() -> ExitCode {
    cli::init_logging();
    let args = Args::parse();

    match cli::execute(&args) {
        Ok(output) => {
            print!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "run failed");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
