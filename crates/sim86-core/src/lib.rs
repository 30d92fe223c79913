//! Decode-and-execute core for a subset of the 8086 instruction set.

/// Bit-field extraction and little-endian byte reads.
pub mod bits;
pub use bits::sign_extend_byte;

/// Operation table keyed by opcode selector.
pub mod encoding;
pub use encoding::{lookup_operation, OpcodeSelector, Operation, OPERATION_TABLE};

/// Instruction layout classification.
pub mod pattern;
pub use pattern::{classify, DecodePattern};

/// Per-layout header field decoding.
pub mod decoder;
pub use decoder::{decode_fields, Direction, FieldEncoding, Mode};

/// Operand resolution and effective addresses.
pub mod operand;
pub use operand::{resolve_operands, Location, Operand, ResolvedOperands};

/// Decoded instruction record.
pub mod instruction;
pub use instruction::Instruction;

/// NASM-style text rendering.
pub mod disasm;
pub use disasm::{disassemble, hex_bytes, DisassemblyRow};

/// Register file, flags and memory.
pub mod state;
pub use state::{
    CpuState, Flag, FlagsRegister, ImageSizeError, Memory, Register, RegisterFile, RegisterPart,
    RegisterRef, Width, CANONICAL_ORDER, GENERAL_REGISTER_COUNT, MEMORY_BYTES,
};

/// Run configuration.
pub mod config;
pub use config::{FlagPolicy, MemoryModel, SimConfig, Traversal, DEFAULT_STEP_LIMIT};

/// Instruction execution pipeline.
pub mod execute;
pub use execute::{
    commit_execution, execute, execute_instruction, DestinationWrite, ExecuteOutcome,
    ExecuteState, FlagsUpdate,
};

/// Classify, decode, resolve and execute loop.
pub mod driver;
pub use driver::{run, ByteStream, RunReport, Simulator, TraceRecord};

/// Error taxonomy.
pub mod fault;
pub use fault::{DecodeError, ErrorClass, SimError};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
