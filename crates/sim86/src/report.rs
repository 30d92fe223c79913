//! Text and JSON rendering of run reports and listings.

use std::fmt::Write as _;

use anyhow::Context;
use serde::Serialize;
use sim86_core::{hex_bytes, DisassemblyRow, RunReport, TraceRecord};

/// Renders one trace line.
///
/// `mov ax, 5 ; b8 05 00 | ax:0x0000->0x0005 ip:0x0000->0x0003 flags:->`
#[must_use]
pub fn format_record(record: &TraceRecord) -> String {
    let instr = &record.instruction;
    let mut line = format!("{instr} ; {} |", hex_bytes(&instr.bytes));
    if !instr.operation.is_jump() {
        let _ = write!(
            line,
            " {}:0x{:04x}->0x{:04x}",
            instr.destination, record.before, record.after
        );
    }
    let _ = write!(
        line,
        " ip:0x{:04x}->0x{:04x} flags:{}->{}",
        record.ip_before, record.ip_after, record.flags_before, record.flags_after
    );
    line
}

/// Renders the trace followed by the final register dump.
#[must_use]
pub fn format_trace(report: &RunReport) -> String {
    let mut out = String::new();
    for record in &report.records {
        out.push_str(&format_record(record));
        out.push('\n');
    }

    out.push_str("\nFinal registers:\n");
    for (register, value) in report.final_registers() {
        let _ = writeln!(out, "{:>8}: 0x{value:04x} ({value})", register.name());
    }
    let ip = report.final_state.ip;
    let _ = writeln!(out, "{:>8}: 0x{ip:04x} ({ip})", "ip");
    let _ = writeln!(out, "{:>8}: {}", "flags", report.final_state.flags);
    out
}

/// Renders a NASM-compatible listing with offsets and bytes as comments.
#[must_use]
pub fn format_listing(rows: &[DisassemblyRow]) -> String {
    let mut out = String::from("bits 16\n\n");
    for row in rows {
        let _ = writeln!(
            out,
            "{:<32}; {:04x}: {}",
            row.to_string(),
            row.offset,
            hex_bytes(&row.bytes)
        );
    }
    out
}

#[derive(Debug, Serialize)]
struct RegisterEntry {
    name: &'static str,
    value: u16,
}

#[derive(Debug, Serialize)]
struct TraceDocument<'a> {
    records: &'a [TraceRecord],
    final_registers: Vec<RegisterEntry>,
    ip: u16,
    flags: String,
}

/// Serializes a run report as pretty JSON.
///
/// # Errors
///
/// Fails only if serialization fails.
pub fn trace_json(report: &RunReport) -> anyhow::Result<String> {
    let document = TraceDocument {
        records: &report.records,
        final_registers: report
            .final_registers()
            .iter()
            .map(|(register, value)| RegisterEntry {
                name: register.name(),
                value: *value,
            })
            .collect(),
        ip: report.final_state.ip,
        flags: report.final_state.flags.to_string(),
    };
    serde_json::to_string_pretty(&document).context("failed to serialize run report")
}

/// Serializes a listing as pretty JSON.
///
/// # Errors
///
/// Fails only if serialization fails.
pub fn listing_json(rows: &[DisassemblyRow]) -> anyhow::Result<String> {
    serde_json::to_string_pretty(rows).context("failed to serialize listing")
}
