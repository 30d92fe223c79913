//! Argument parsing and command execution.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use sim86_core::{
    disassemble, run, FlagPolicy, MemoryModel, SimConfig, Traversal, DEFAULT_STEP_LIMIT,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::report;

/// Command-line arguments for the `sim86` binary.
#[derive(Parser, Debug)]
#[command(
    name = "sim86",
    about = "Decode and execute a raw 8086 machine-code file, printing a trace and the final registers."
)]
#[allow(clippy::struct_excessive_bools)]
pub struct Args {
    /// Raw machine-code file
    pub input: PathBuf,

    /// Only decode and print a NASM listing
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub disassemble: bool,

    /// Emit JSON instead of text
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub json: bool,

    /// Fetch at IP after each instruction so taken jumps redirect decoding
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub follow_ip: bool,

    /// Maximum instructions executed with --follow-ip
    #[arg(long, value_name = "N", default_value_t = DEFAULT_STEP_LIMIT)]
    pub step_limit: usize,

    /// Leave flags untouched on mov
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub arithmetic_flags_only: bool,

    /// Compute memory addresses but read zero and drop writes
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub inert_memory: bool,
}

impl Args {
    /// Builds the core configuration selected by the flags.
    #[must_use]
    pub const fn config(&self) -> SimConfig {
        SimConfig {
            flag_policy: if self.arithmetic_flags_only {
                FlagPolicy::ArithmeticOnly
            } else {
                FlagPolicy::IncludeMoves
            },
            memory: if self.inert_memory {
                MemoryModel::Inert
            } else {
                MemoryModel::Backed
            },
            traversal: if self.follow_ip {
                Traversal::FollowIp
            } else {
                Traversal::Sweep
            },
            step_limit: Some(self.step_limit),
        }
    }
}

/// Installs a stderr `tracing` subscriber filtered by `RUST_LOG`.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}

/// Loads the input file and produces the requested output text.
///
/// # Errors
///
/// Fails when the file cannot be read, when any instruction fails to decode
/// or execute, or when JSON serialization fails.
pub fn execute(args: &Args) -> anyhow::Result<String> {
    let bytes = fs::read(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    debug!(path = %args.input.display(), len = bytes.len(), "loaded input");

    if args.disassemble {
        let rows = disassemble(&bytes).context("disassembly failed")?;
        return if args.json {
            report::listing_json(&rows)
        } else {
            Ok(report::format_listing(&rows))
        };
    }

    let report = run(&bytes, &args.config()).context("simulation failed")?;
    if args.json {
        report::trace_json(&report)
    } else {
        Ok(report::format_trace(&report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_map_to_default_config() {
        let args = Args::parse_from(["sim86", "program.bin"]);
        assert_eq!(args.input, PathBuf::from("program.bin"));
        assert_eq!(args.config(), SimConfig::default());
        assert!(!args.disassemble);
        assert!(!args.json);
    }

    #[test]
    fn flags_select_config_variants() {
        let args = Args::parse_from([
            "sim86",
            "--follow-ip",
            "--step-limit",
            "50",
            "--arithmetic-flags-only",
            "--inert-memory",
            "loop.bin",
        ]);
        assert_eq!(
            args.config(),
            SimConfig {
                flag_policy: FlagPolicy::ArithmeticOnly,
                memory: MemoryModel::Inert,
                traversal: Traversal::FollowIp,
                step_limit: Some(50),
            }
        );
    }

    #[test]
    fn missing_input_is_reported_with_path() {
        let args = Args::parse_from(["sim86", "/nonexistent/sim86-input.bin"]);
        let err = execute(&args).expect_err("file is missing");
        assert!(format!("{err:#}").contains("sim86-input.bin"));
    }

    #[test]
    fn executes_from_a_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("mov.bin");
        fs::write(&path, [0xB8, 0x05, 0x00]).expect("writes");

        let args = Args::parse_from([std::ffi::OsStr::new("sim86"), path.as_os_str()]);
        let output = execute(&args).expect("runs");
        assert!(output.starts_with("mov ax, 5 ; b8 05 00 |"));
        assert!(output.contains("      ax: 0x0005 (5)"));
    }
}
