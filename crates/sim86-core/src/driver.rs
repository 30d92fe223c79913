//! Stream driver: the classify, decode, resolve, execute loop.

use tracing::{debug, trace};

use crate::config::{SimConfig, Traversal};
use crate::execute::execute;
use crate::fault::SimError;
use crate::instruction::Instruction;
use crate::state::{CpuState, FlagsRegister, Register, GENERAL_REGISTER_COUNT};

/// Immutable instruction bytes plus a read cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteStream {
    bytes: Vec<u8>,
    cursor: usize,
}

impl ByteStream {
    /// Wraps `bytes` with the cursor at offset 0.
    #[must_use]
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            cursor: 0,
        }
    }

    /// Total stream length.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` for an empty stream.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Current offset.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Returns `true` once the cursor has reached the end.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.bytes.len()
    }

    /// Bytes from the cursor to the end.
    #[must_use]
    pub fn remaining(&self) -> &[u8] {
        self.bytes.get(self.cursor..).unwrap_or_default()
    }

    /// Whole stream.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Moves the cursor forward by `count`, never past the end.
    pub fn advance(&mut self, count: usize) {
        self.cursor = self.cursor.saturating_add(count).min(self.bytes.len());
    }

    /// Re-seats the cursor at `offset`.
    ///
    /// Only IP-following runs move the cursor backwards.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::JumpOutOfRange`] when `offset` is past the end.
    pub fn seek(&mut self, offset: u16) -> Result<(), SimError> {
        let target = usize::from(offset);
        if target > self.bytes.len() {
            return Err(SimError::JumpOutOfRange {
                target: offset,
                len: self.bytes.len(),
            });
        }
        self.cursor = target;
        Ok(())
    }
}

/// One executed instruction with its observable effects.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct TraceRecord {
    /// Decoded instruction, including its offset and raw bytes.
    pub instruction: Instruction,
    /// Destination value before execution.
    pub before: u16,
    /// Destination value after execution.
    pub after: u16,
    /// Flags before execution.
    pub flags_before: FlagsRegister,
    /// Flags after execution.
    pub flags_after: FlagsRegister,
    /// Instruction pointer before fetch.
    pub ip_before: u16,
    /// Instruction pointer after execution.
    pub ip_after: u16,
}

impl TraceRecord {
    /// Stream offset of the instruction.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.instruction.offset
    }
}

/// Everything a completed run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Per-instruction records in execution order.
    pub records: Vec<TraceRecord>,
    /// CPU state at end of stream.
    pub final_state: CpuState,
}

impl RunReport {
    /// Final register values in the canonical `ax bx cx dx sp bp si di` order.
    #[must_use]
    pub fn final_registers(&self) -> [(Register, u16); GENERAL_REGISTER_COUNT] {
        self.final_state.registers.canonical_dump()
    }
}

/// Owns the stream, the CPU state and the configuration of one run.
#[derive(Debug, Clone)]
pub struct Simulator {
    stream: ByteStream,
    cpu: CpuState,
    config: SimConfig,
    executed: usize,
}

impl Simulator {
    /// Creates a simulator with zeroed CPU state.
    #[must_use]
    pub fn new(bytes: impl Into<Vec<u8>>, config: SimConfig) -> Self {
        Self {
            stream: ByteStream::new(bytes),
            cpu: CpuState::default(),
            config,
            executed: 0,
        }
    }

    /// Current CPU state.
    #[must_use]
    pub const fn cpu(&self) -> &CpuState {
        &self.cpu
    }

    /// Underlying byte stream.
    #[must_use]
    pub const fn stream(&self) -> &ByteStream {
        &self.stream
    }

    /// Number of instructions executed so far.
    #[must_use]
    pub const fn executed(&self) -> usize {
        self.executed
    }

    /// Decodes and executes exactly one instruction.
    ///
    /// Returns `Ok(None)` once the stream is exhausted.
    ///
    /// # Errors
    ///
    /// - [`SimError::Instruction`] for any decode, resolve or execute failure,
    ///   annotated with the offset and the bytes consumed so far.
    /// - [`SimError::StepLimitExceeded`] when an IP-following run exhausts its
    ///   budget.
    /// - [`SimError::JumpOutOfRange`] when IP leaves the stream.
    #[allow(clippy::cast_possible_truncation)]
    pub fn step(&mut self) -> Result<Option<TraceRecord>, SimError> {
        if self.stream.is_exhausted() {
            return Ok(None);
        }
        if let Some(limit) = self.config.effective_step_limit() {
            if self.executed >= limit {
                return Err(SimError::StepLimitExceeded { limit });
            }
        }

        let offset = self.stream.cursor();
        let instruction = Instruction::decode(self.stream.remaining(), offset, &self.cpu.registers)?;
        trace!(
            offset,
            pattern = ?instruction.pattern,
            len = instruction.len(),
            text = %instruction,
            "decoded instruction"
        );

        let ip_before = self.cpu.ip;
        let flags_before = self.cpu.flags;
        // IP addresses the byte after the instruction before it executes.
        let end = instruction.end();
        let next_ip = u16::try_from(end).ok();
        self.cpu.ip = next_ip.unwrap_or(end as u16);

        let outcome = match execute(&instruction, &mut self.cpu, &self.config) {
            Ok(outcome) => outcome,
            Err(source) => {
                self.cpu.ip = ip_before;
                return Err(SimError::Instruction {
                    offset,
                    bytes: instruction.bytes,
                    source,
                });
            }
        };

        match self.config.traversal {
            Traversal::Sweep => self.stream.advance(instruction.len()),
            Traversal::FollowIp => match next_ip {
                // Falling through past 0xffff only ends the run at the stream end.
                None if outcome.branch_taken != Some(true) => {
                    if end != self.stream.len() {
                        return Err(SimError::JumpOutOfRange {
                            target: self.cpu.ip,
                            len: self.stream.len(),
                        });
                    }
                    self.stream.advance(instruction.len());
                }
                _ => self.stream.seek(self.cpu.ip)?,
            },
        }
        self.executed += 1;

        Ok(Some(TraceRecord {
            before: outcome.before,
            after: outcome.after,
            flags_before,
            flags_after: self.cpu.flags,
            ip_before,
            ip_after: self.cpu.ip,
            instruction,
        }))
    }

    /// Runs until the stream is exhausted.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by [`Simulator::step`]; earlier records
    /// are discarded with the run.
    pub fn run(mut self) -> Result<RunReport, SimError> {
        debug!(
            len = self.stream.len(),
            traversal = ?self.config.traversal,
            flag_policy = ?self.config.flag_policy,
            memory = ?self.config.memory,
            "starting run"
        );

        let mut records = Vec::new();
        loop {
            match self.step() {
                Ok(Some(record)) => records.push(record),
                Ok(None) => break,
                Err(err) => {
                    debug!(error = %err, executed = self.executed, "run aborted");
                    return Err(err);
                }
            }
        }

        debug!(executed = self.executed, ip = self.cpu.ip, "run finished");
        Ok(RunReport {
            records,
            final_state: self.cpu,
        })
    }
}

/// Runs `bytes` to completion under `config`.
///
/// # Errors
///
/// See [`Simulator::run`].
pub fn run(bytes: &[u8], config: &SimConfig) -> Result<RunReport, SimError> {
    Simulator::new(bytes, config.clone()).run()
}
