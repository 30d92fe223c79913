//! Decoded instruction record and the single-instruction decode pipeline.

use crate::decoder::decode_fields;
use crate::encoding::Operation;
use crate::fault::{DecodeError, SimError};
use crate::operand::{resolve_operands, Operand};
use crate::pattern::{classify, DecodePattern};
use crate::state::{RegisterFile, Width};

/// One fully decoded instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Instruction {
    /// Stream offset of the first byte.
    pub offset: usize,
    /// Layout the bytes were decoded with.
    pub pattern: DecodePattern,
    /// Operation to perform.
    pub operation: Operation,
    /// Destination operand.
    pub destination: Operand,
    /// Source operand; `None` for jumps.
    pub source: Option<Operand>,
    /// Data width, `None` for jumps.
    pub width: Option<Width>,
    /// Exact bytes consumed from the stream.
    pub bytes: Vec<u8>,
}

impl Instruction {
    /// Decodes the instruction at the start of `bytes`.
    ///
    /// `offset` is where `bytes` begins in the whole stream and is only used
    /// for the record and for error annotation. `registers` feeds effective
    /// address computation.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Instruction`] wrapping the first classify, decode
    /// or resolve failure together with the bytes consumed up to that point.
    pub fn decode(
        bytes: &[u8],
        offset: usize,
        registers: &RegisterFile,
    ) -> Result<Self, SimError> {
        let fail = |consumed: usize, source: DecodeError| SimError::Instruction {
            offset,
            bytes: bytes[..consumed.min(bytes.len())].to_vec(),
            source,
        };

        let pattern = classify(bytes).map_err(|err| fail(1, err))?;
        let header_len = pattern.header_len();
        let (fields, header) = decode_fields(bytes, pattern).map_err(|err| fail(header_len, err))?;

        let trailing = &bytes[header..];
        let resolved = resolve_operands(&fields, trailing, registers).map_err(|err| match err {
            DecodeError::StreamExhausted { needed, available } => fail(
                bytes.len(),
                DecodeError::StreamExhausted {
                    needed: header + needed,
                    available: header + available,
                },
            ),
            other => fail(header, other),
        })?;

        let len = header + resolved.consumed;
        let operation = fields.operation();
        let width = (!operation.is_jump()).then_some(resolved.destination.width);

        Ok(Self {
            offset,
            pattern,
            operation,
            destination: resolved.destination,
            source: resolved.source,
            width,
            bytes: bytes[..len].to_vec(),
        })
    }

    /// Number of bytes the instruction occupies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always `false`; every decoded instruction spans at least one byte.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Offset of the byte following this instruction.
    #[must_use]
    pub fn end(&self) -> usize {
        self.offset + self.len()
    }

    /// Explicit size keyword needed to disambiguate the text.
    ///
    /// Only a memory destination paired with an immediate source leaves the
    /// width unstated by either operand.
    #[must_use]
    pub fn size_hint(&self) -> Option<Width> {
        let source = self.source.as_ref()?;
        (self.destination.is_memory() && source.is_immediate()).then_some(self.destination.width)
    }
}

#[cfg(test)]
mod tests {
    use super::Instruction;
    use crate::encoding::{OpcodeSelector, Operation};
    use crate::fault::{DecodeError, SimError};
    use crate::operand::Location;
    use crate::pattern::DecodePattern;
    use crate::state::{Register, RegisterFile, RegisterRef, Width};

    #[test]
    fn short_form_move_spans_three_bytes() {
        let instr = Instruction::decode(&[0xB8, 0x05, 0x00, 0x90], 0, &RegisterFile::default())
            .expect("decodes");
        assert_eq!(instr.operation, Operation::Mov);
        assert_eq!(instr.pattern, DecodePattern::ImmediateToRegister);
        assert_eq!(
            instr.destination.location,
            Location::Register(RegisterRef::full(Register::Ax))
        );
        assert_eq!(
            instr.source.as_ref().map(|s| s.location),
            Some(Location::Immediate(5))
        );
        assert_eq!(instr.width, Some(Width::Word));
        assert_eq!(instr.bytes, [0xB8, 0x05, 0x00]);
        assert_eq!(instr.len(), 3);
    }

    #[test]
    fn jumps_carry_no_width() {
        let instr =
            Instruction::decode(&[0x74, 0xFB], 8, &RegisterFile::default()).expect("decodes");
        assert_eq!(instr.width, None);
        assert!(instr.source.is_none());
        assert_eq!(instr.end(), 10);
        assert_eq!(instr.size_hint(), None);
    }

    #[test]
    fn size_hint_only_for_memory_immediate_pairs() {
        let registers = RegisterFile::default();
        let store = Instruction::decode(&[0xC6, 0x03, 0x07], 0, &registers).expect("decodes");
        assert_eq!(store.size_hint(), Some(Width::Byte));

        let load = Instruction::decode(&[0x8B, 0x07], 0, &registers).expect("decodes");
        assert_eq!(load.size_hint(), None);

        let immediate = Instruction::decode(&[0x83, 0xC6, 0x02], 0, &registers).expect("decodes");
        assert_eq!(immediate.size_hint(), None);
    }

    #[test]
    fn truncated_operand_reports_whole_instruction_span() {
        let err = Instruction::decode(&[0x81, 0x07, 0xE8], 4, &RegisterFile::default())
            .expect_err("immediate is cut short");
        assert_eq!(
            err,
            SimError::Instruction {
                offset: 4,
                bytes: vec![0x81, 0x07, 0xE8],
                source: DecodeError::StreamExhausted {
                    needed: 4,
                    available: 3
                },
            }
        );
    }

    #[test]
    fn unknown_operation_reports_header_bytes() {
        let err = Instruction::decode(&[0x8E, 0xD8, 0x00], 2, &RegisterFile::default())
            .expect_err("segment move is unsupported");
        assert_eq!(
            err,
            SimError::Instruction {
                offset: 2,
                bytes: vec![0x8E, 0xD8],
                source: DecodeError::UnknownOperation {
                    selector: OpcodeSelector::Primary(0b10_0011)
                },
            }
        );
    }
}
