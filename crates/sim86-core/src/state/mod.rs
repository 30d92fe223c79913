//! Mutable CPU state owned by one simulation run.

/// Flags register and flag bit positions.
pub mod flags;
/// Flat little-endian memory image.
pub mod memory;
/// Register file, register views and operand widths.
pub mod registers;

pub use flags::{Flag, FlagsRegister};
pub use memory::{ImageSizeError, Memory, MEMORY_BYTES};
pub use registers::{
    Register, RegisterFile, RegisterPart, RegisterRef, Width, CANONICAL_ORDER,
    GENERAL_REGISTER_COUNT,
};

/// Everything an instruction can observe or mutate.
///
/// Created zeroed at the start of a run and handed back in the run report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CpuState {
    /// General-purpose registers.
    pub registers: RegisterFile,
    /// Flags register.
    pub flags: FlagsRegister,
    /// Instruction pointer; written by the driver on fetch and by jumps.
    pub ip: u16,
    /// Data memory for memory operands.
    pub memory: Memory,
}
