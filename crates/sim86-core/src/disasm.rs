//! Instruction disassembly.
//!
//! Renders decoded instructions as NASM-compatible text and decodes whole
//! streams without executing them.

use std::fmt;

use crate::fault::SimError;
use crate::instruction::Instruction;
use crate::state::RegisterFile;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single disassembled instruction row.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DisassemblyRow {
    /// Offset of the first byte in the stream.
    pub offset: usize,
    /// Raw instruction bytes.
    pub bytes: Vec<u8>,
    /// The instruction mnemonic (e.g. "mov", "jne").
    pub mnemonic: String,
    /// The formatted operands (e.g. "word [bx + 4], 12").
    pub operands: String,
}

impl fmt::Display for DisassemblyRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.operands.is_empty() {
            f.write_str(&self.mnemonic)
        } else {
            write!(f, "{} {}", self.mnemonic, self.operands)
        }
    }
}

impl From<&Instruction> for DisassemblyRow {
    fn from(instr: &Instruction) -> Self {
        Self {
            offset: instr.offset,
            bytes: instr.bytes.clone(),
            mnemonic: instr.operation.mnemonic().to_string(),
            operands: format_operands(instr),
        }
    }
}

fn format_operands(instr: &Instruction) -> String {
    let destination = match instr.size_hint() {
        Some(width) => format!("{} {}", width.keyword(), instr.destination),
        None => instr.destination.to_string(),
    };
    match &instr.source {
        Some(source) => format!("{destination}, {source}"),
        None => destination,
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.operation, format_operands(self))
    }
}

/// Formats bytes as space-separated lowercase hex pairs.
#[must_use]
pub fn hex_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Decodes `bytes` front to back without executing anything.
///
/// Effective addresses are computed against zeroed registers; the text does
/// not depend on them.
///
/// # Errors
///
/// Stops at the first instruction that fails to decode.
pub fn disassemble(bytes: &[u8]) -> Result<Vec<DisassemblyRow>, SimError> {
    let registers = RegisterFile::default();
    let mut rows = Vec::new();
    let mut offset = 0;

    while offset < bytes.len() {
        let instr = Instruction::decode(&bytes[offset..], offset, &registers)?;
        offset = instr.end();
        rows.push(DisassemblyRow::from(&instr));
    }

    Ok(rows)
}
