//! Instruction execution pipeline.
//!
//! Execution runs in two phases:
//! 1. Read operands and compute the result, destination write, FLAGS update
//!    and IP change into an [`ExecuteState`] without touching the CPU.
//! 2. Commit the collected side effects.
//!
//! A failing instruction therefore leaves no partial side effects behind.

mod flags;

pub use flags::FlagsUpdate;

use crate::config::{MemoryModel, SimConfig};
use crate::encoding::Operation;
use crate::fault::DecodeError;
use crate::instruction::Instruction;
use crate::operand::{Location, Operand};
use crate::state::{CpuState, Flag, Width};

/// Observable result of one executed instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ExecuteOutcome {
    /// Destination value before execution (IP for jumps).
    pub before: u16,
    /// Destination value after execution (IP for jumps).
    pub after: u16,
    /// Whether a conditional jump was taken; `None` for data operations.
    pub branch_taken: Option<bool>,
}

/// A pending write to the destination operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DestinationWrite {
    /// Register or memory target.
    pub location: Location,
    /// Access width.
    pub width: Width,
    /// Value to store, already masked to `width`.
    pub value: u16,
}

/// Side effects accumulated before commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecuteState {
    /// Destination value read during the operand phase.
    pub before: u16,
    /// Computed result (new IP for jumps).
    pub result: u16,
    /// Destination store, if the operation writes one.
    pub dest_write: Option<DestinationWrite>,
    /// FLAGS update to apply.
    pub flags_update: FlagsUpdate,
    /// New IP value to set after commit.
    pub next_ip: Option<u16>,
    /// Branch decision for conditional jumps.
    pub branch_taken: Option<bool>,
}

impl ExecuteState {
    /// Outcome reported once the state is committed.
    #[must_use]
    pub const fn outcome(&self) -> ExecuteOutcome {
        ExecuteOutcome {
            before: self.before,
            after: self.result,
            branch_taken: self.branch_taken,
        }
    }
}

fn read_operand(state: &CpuState, operand: &Operand, memory: MemoryModel) -> u16 {
    match (operand.location, memory) {
        (Location::Register(slot), _) => state.registers.read(slot),
        (Location::Memory(_), MemoryModel::Inert) => 0,
        (Location::Memory(addr), MemoryModel::Backed) => match operand.width {
            Width::Byte => u16::from(state.memory.read_u8(addr)),
            Width::Word => state.memory.read_u16_le(addr),
        },
        (Location::Immediate(value), _) => value,
    }
}

fn source_value(
    instr: &Instruction,
    state: &CpuState,
    memory: MemoryModel,
) -> Result<u16, DecodeError> {
    instr
        .source
        .as_ref()
        .map(|source| read_operand(state, source, memory))
        .ok_or_else(|| DecodeError::UnhandledPattern {
            pattern: instr.pattern,
        })
}

fn writable(operand: &Operand) -> Result<Location, DecodeError> {
    match operand.location {
        Location::Immediate(_) => Err(DecodeError::ReadOnlyDestination {
            text: operand.text.clone(),
        }),
        location => Ok(location),
    }
}

/// Computes the effects of `instr` against `state` without applying them.
///
/// For jumps, `state.ip` must already point just past the jump; the
/// displacement is added to it.
///
/// # Errors
///
/// - [`DecodeError::ReadOnlyDestination`] when a data operation would write
///   an immediate.
/// - [`DecodeError::UnhandledPattern`] when a data operation has no source.
pub fn execute_instruction(
    instr: &Instruction,
    state: &CpuState,
    config: &SimConfig,
) -> Result<ExecuteState, DecodeError> {
    match instr.operation {
        Operation::Mov => {
            let location = writable(&instr.destination)?;
            let width = instr.destination.width;
            let before = read_operand(state, &instr.destination, config.memory);
            let result = source_value(instr, state, config.memory)? & width.mask();
            let flags_update = if config.flag_policy.moves_update_flags() {
                FlagsUpdate::from_result(result, width)
            } else {
                FlagsUpdate::None
            };
            Ok(ExecuteState {
                before,
                result,
                dest_write: Some(DestinationWrite {
                    location,
                    width,
                    value: result,
                }),
                flags_update,
                next_ip: None,
                branch_taken: None,
            })
        }
        Operation::Add | Operation::Sub | Operation::Cmp => execute_alu(instr, state, config),
        Operation::Je => Ok(execute_branch(instr, state, state.flags.is_set(Flag::Zero))),
        Operation::Jne => Ok(execute_branch(instr, state, !state.flags.is_set(Flag::Zero))),
        Operation::Js => Ok(execute_branch(instr, state, state.flags.is_set(Flag::Sign))),
        Operation::Jns => Ok(execute_branch(instr, state, !state.flags.is_set(Flag::Sign))),
    }
}

fn execute_alu(
    instr: &Instruction,
    state: &CpuState,
    config: &SimConfig,
) -> Result<ExecuteState, DecodeError> {
    let width = instr.destination.width;
    let dest = read_operand(state, &instr.destination, config.memory);
    let source = source_value(instr, state, config.memory)?;

    let computed = match instr.operation {
        Operation::Add => dest.wrapping_add(source),
        _ => dest.wrapping_sub(source),
    } & width.mask();
    let flags_update = FlagsUpdate::from_result(computed, width);

    // cmp only sets flags; the destination keeps its value.
    if instr.operation == Operation::Cmp {
        return Ok(ExecuteState {
            before: dest,
            result: dest,
            dest_write: None,
            flags_update,
            next_ip: None,
            branch_taken: None,
        });
    }

    Ok(ExecuteState {
        before: dest,
        result: computed,
        dest_write: Some(DestinationWrite {
            location: writable(&instr.destination)?,
            width,
            value: computed,
        }),
        flags_update,
        next_ip: None,
        branch_taken: None,
    })
}

fn execute_branch(instr: &Instruction, state: &CpuState, taken: bool) -> ExecuteState {
    let ip = state.ip;
    let next_ip = match instr.destination.location {
        Location::Immediate(displacement) if taken => ip.wrapping_add(displacement),
        _ => ip,
    };
    ExecuteState {
        before: ip,
        result: next_ip,
        dest_write: None,
        flags_update: FlagsUpdate::None,
        next_ip: Some(next_ip),
        branch_taken: Some(taken),
    }
}

/// Applies previously computed side effects.
#[allow(clippy::cast_possible_truncation)]
pub fn commit_execution(state: &mut CpuState, exec: &ExecuteState, config: &SimConfig) {
    if let Some(write) = exec.dest_write {
        match (write.location, config.memory) {
            (Location::Register(slot), _) => state.registers.write(slot, write.value),
            (Location::Memory(addr), MemoryModel::Backed) => match write.width {
                Width::Byte => state.memory.write_u8(addr, write.value as u8),
                Width::Word => state.memory.write_u16_le(addr, write.value),
            },
            (Location::Memory(_), MemoryModel::Inert) | (Location::Immediate(_), _) => {}
        }
    }

    exec.flags_update.apply(&mut state.flags);

    if let Some(ip) = exec.next_ip {
        state.ip = ip;
    }
}

/// Executes one instruction and commits its effects.
///
/// # Errors
///
/// See [`execute_instruction`]. On error `state` is unchanged.
pub fn execute(
    instr: &Instruction,
    state: &mut CpuState,
    config: &SimConfig,
) -> Result<ExecuteOutcome, DecodeError> {
    let exec = execute_instruction(instr, state, config)?;
    commit_execution(state, &exec, config);
    Ok(exec.outcome())
}
