//! Command-line front end for `sim86-core`: file loading, argument parsing
//! and trace rendering.

/// Argument parsing and command execution.
pub mod cli;
/// Text and JSON rendering.
pub mod report;

#[cfg(test)]
use tempfile as _;
