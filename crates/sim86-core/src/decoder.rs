//! Field decoding for each instruction layout.
//!
//! A classified pattern fixes which sub-byte fields exist. Fields that a
//! layout does not carry are simply absent from its variant, so there is no
//! way to read a "zero" `mod` out of a short-form move.

use crate::bits;
use crate::encoding::{lookup_operation, OpcodeSelector, Operation};
use crate::fault::DecodeError;
use crate::pattern::DecodePattern;
use crate::state::Width;

/// Primary opcode of `mov r/m, imm`, which shares its layout with the
/// arithmetic immediate group but carries no sign-extend bit.
pub const MOVE_IMMEDIATE_OPCODE: u8 = 0b11_0001;

/// Which operand the `reg` side of an instruction lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Direction {
    /// The register (or accumulator) is the destination.
    ToRegister,
    /// The register (or accumulator) is the source.
    FromRegister,
}

/// The `mod` addressing field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Mode {
    /// `00`: memory, no displacement (`r/m = 110` is a direct address).
    Memory,
    /// `01`: memory with an 8-bit sign-extended displacement.
    Memory8,
    /// `10`: memory with a 16-bit displacement.
    Memory16,
    /// `11`: register direct.
    Register,
}

impl Mode {
    /// Converts a 2-bit `mod` value.
    #[must_use]
    pub const fn from_u2(value: u8) -> Option<Self> {
        match value {
            0b00 => Some(Self::Memory),
            0b01 => Some(Self::Memory8),
            0b10 => Some(Self::Memory16),
            0b11 => Some(Self::Register),
            _ => None,
        }
    }
}

/// Raw fields of one instruction header, shaped by its layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(missing_docs)]
pub enum FieldEncoding {
    RegisterMemory {
        operation: Operation,
        direction: Direction,
        width: Width,
        mode: Mode,
        reg: u8,
        rm: u8,
    },
    ImmediateToRegister {
        operation: Operation,
        width: Width,
        reg: u8,
    },
    ImmediateToRegisterMemory {
        operation: Operation,
        sign_extend: bool,
        width: Width,
        mode: Mode,
        rm: u8,
    },
    ImmediateToAccumulator {
        operation: Operation,
        width: Width,
    },
    MemoryAccumulator {
        operation: Operation,
        direction: Direction,
        width: Width,
    },
    ShortJump {
        operation: Operation,
    },
}

impl FieldEncoding {
    /// Operation selected by the header.
    #[must_use]
    pub const fn operation(&self) -> Operation {
        match *self {
            Self::RegisterMemory { operation, .. }
            | Self::ImmediateToRegister { operation, .. }
            | Self::ImmediateToRegisterMemory { operation, .. }
            | Self::ImmediateToAccumulator { operation, .. }
            | Self::MemoryAccumulator { operation, .. }
            | Self::ShortJump { operation } => operation,
        }
    }

    /// Layout these fields were decoded from.
    #[must_use]
    pub const fn pattern(&self) -> DecodePattern {
        match self {
            Self::RegisterMemory { .. } => DecodePattern::RegisterMemory,
            Self::ImmediateToRegister { .. } => DecodePattern::ImmediateToRegister,
            Self::ImmediateToRegisterMemory { .. } => DecodePattern::ImmediateToRegisterMemory,
            Self::ImmediateToAccumulator { .. } => DecodePattern::ImmediateToAccumulator,
            Self::MemoryAccumulator { .. } => DecodePattern::MemoryAccumulator,
            Self::ShortJump { .. } => DecodePattern::ShortJump,
        }
    }
}

fn operation_for(selector: OpcodeSelector) -> Result<Operation, DecodeError> {
    lookup_operation(selector).ok_or(DecodeError::UnknownOperation { selector })
}

fn decode_mode(byte: u8) -> Result<Mode, DecodeError> {
    let value = bits::ensure_range("mod", bits::mod_field(byte), 2)?;
    Mode::from_u2(value).ok_or(DecodeError::FieldOutOfRange {
        field: "mod",
        value,
        bits: 2,
    })
}

const fn direction_from_d(bit: u8) -> Direction {
    if bit == 0 {
        Direction::FromRegister
    } else {
        Direction::ToRegister
    }
}

/// Decodes the fixed-size header of a classified instruction.
///
/// Returns the fields and the number of header bytes consumed. Displacement
/// and immediate bytes are left for operand resolution.
///
/// # Errors
///
/// - [`DecodeError::StreamExhausted`] when the header is cut short.
/// - [`DecodeError::UnknownOperation`] when the opcode is not in the table.
/// - [`DecodeError::FieldOutOfRange`] when a field escapes its bit width.
/// - [`DecodeError::UnhandledPattern`] when no header bytes were consumed.
pub fn decode_fields(
    bytes: &[u8],
    pattern: DecodePattern,
) -> Result<(FieldEncoding, usize), DecodeError> {
    let first = bits::read_u8(bytes, 0)?;

    let fields = match pattern {
        DecodePattern::RegisterMemory => {
            let second = bits::read_u8(bytes, 1)?;
            let opcode = bits::ensure_range("opcode", bits::opcode6(first), 6)?;
            FieldEncoding::RegisterMemory {
                operation: operation_for(OpcodeSelector::Primary(opcode))?,
                direction: direction_from_d(bits::bit1(first)),
                width: Width::from_w(bits::bit0(first)),
                mode: decode_mode(second)?,
                reg: bits::ensure_range("reg", bits::reg_field(second), 3)?,
                rm: bits::ensure_range("r/m", bits::rm_field(second), 3)?,
            }
        }
        DecodePattern::ImmediateToRegister => {
            let nibble = bits::ensure_range("opcode", bits::high_nibble(first), 4)?;
            FieldEncoding::ImmediateToRegister {
                operation: operation_for(OpcodeSelector::ShortForm(nibble))?,
                width: Width::from_w(bits::short_form_width(first)),
                reg: bits::ensure_range("reg", bits::rm_field(first), 3)?,
            }
        }
        DecodePattern::ImmediateToRegisterMemory => {
            // The group opcode lives in byte 1, so byte 1 is read before the
            // generic mod/reg/r-m split.
            let second = bits::read_u8(bytes, 1)?;
            let opcode = bits::ensure_range("opcode", bits::opcode6(first), 6)?;
            let (selector, sign_extend) = if opcode == MOVE_IMMEDIATE_OPCODE {
                // Only 1100011w with reg = 000 is a move; les/lds share the prefix.
                if bits::bit1(first) != 1 || bits::reg_field(second) != 0 {
                    return Err(DecodeError::UnknownOperation {
                        selector: OpcodeSelector::Full(first),
                    });
                }
                (OpcodeSelector::Primary(opcode), false)
            } else {
                let group = bits::ensure_range("group", bits::reg_field(second), 3)?;
                (OpcodeSelector::Group(group), bits::bit1(first) == 1)
            };
            FieldEncoding::ImmediateToRegisterMemory {
                operation: operation_for(selector)?,
                sign_extend,
                width: Width::from_w(bits::bit0(first)),
                mode: decode_mode(second)?,
                rm: bits::ensure_range("r/m", bits::rm_field(second), 3)?,
            }
        }
        DecodePattern::ImmediateToAccumulator => {
            let opcode = bits::ensure_range("opcode", bits::opcode6(first), 6)?;
            FieldEncoding::ImmediateToAccumulator {
                operation: operation_for(OpcodeSelector::Primary(opcode))?,
                width: Width::from_w(bits::bit0(first)),
            }
        }
        DecodePattern::MemoryAccumulator => {
            let opcode = bits::ensure_range("opcode", bits::opcode6(first), 6)?;
            // d = 0 loads the accumulator, d = 1 stores it.
            let direction = if bits::bit1(first) == 0 {
                Direction::ToRegister
            } else {
                Direction::FromRegister
            };
            FieldEncoding::MemoryAccumulator {
                operation: operation_for(OpcodeSelector::Primary(opcode))?,
                direction,
                width: Width::from_w(bits::bit0(first)),
            }
        }
        DecodePattern::ShortJump => FieldEncoding::ShortJump {
            operation: operation_for(OpcodeSelector::Full(first))?,
        },
    };

    let consumed = fields.pattern().header_len();
    if consumed == 0 {
        return Err(DecodeError::UnhandledPattern { pattern });
    }
    Ok((fields, consumed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_memory_splits_every_field() {
        // mov [bp + di + 5], dl
        let (fields, consumed) =
            decode_fields(&[0x88, 0x53, 0x05], DecodePattern::RegisterMemory).expect("decodes");
        assert_eq!(consumed, 2);
        assert_eq!(
            fields,
            FieldEncoding::RegisterMemory {
                operation: Operation::Mov,
                direction: Direction::FromRegister,
                width: Width::Byte,
                mode: Mode::Memory8,
                reg: 0b010,
                rm: 0b011,
            }
        );
    }

    #[test]
    fn short_form_move_consumes_one_byte() {
        let (fields, consumed) =
            decode_fields(&[0xB8, 0x05, 0x00], DecodePattern::ImmediateToRegister)
                .expect("decodes");
        assert_eq!(consumed, 1);
        assert_eq!(
            fields,
            FieldEncoding::ImmediateToRegister {
                operation: Operation::Mov,
                width: Width::Word,
                reg: 0,
            }
        );
    }

    #[test]
    fn immediate_group_reads_opcode_from_second_byte() {
        // sub si, 2  (83 ee 02)
        let (fields, consumed) = decode_fields(
            &[0x83, 0xEE, 0x02],
            DecodePattern::ImmediateToRegisterMemory,
        )
        .expect("decodes");
        assert_eq!(consumed, 2);
        assert_eq!(
            fields,
            FieldEncoding::ImmediateToRegisterMemory {
                operation: Operation::Sub,
                sign_extend: true,
                width: Width::Word,
                mode: Mode::Register,
                rm: 0b110,
            }
        );
    }

    #[test]
    fn move_immediate_ignores_bit_one() {
        // mov byte [bp + di], 7  (c6 03 07)
        let (fields, _) = decode_fields(
            &[0xC6, 0x03, 0x07],
            DecodePattern::ImmediateToRegisterMemory,
        )
        .expect("decodes");
        assert_eq!(
            fields,
            FieldEncoding::ImmediateToRegisterMemory {
                operation: Operation::Mov,
                sign_extend: false,
                width: Width::Byte,
                mode: Mode::Memory,
                rm: 0b011,
            }
        );
    }

    #[test]
    fn accumulator_forms_decode_direction_and_width() {
        let (fields, consumed) =
            decode_fields(&[0xA3, 0x0F, 0x00], DecodePattern::MemoryAccumulator)
                .expect("decodes");
        assert_eq!(consumed, 1);
        assert_eq!(
            fields,
            FieldEncoding::MemoryAccumulator {
                operation: Operation::Mov,
                direction: Direction::FromRegister,
                width: Width::Word,
            }
        );

        let (fields, _) = decode_fields(&[0x3C, 0xE2], DecodePattern::ImmediateToAccumulator)
            .expect("decodes");
        assert_eq!(
            fields,
            FieldEncoding::ImmediateToAccumulator {
                operation: Operation::Cmp,
                width: Width::Byte,
            }
        );
    }

    #[test]
    fn jump_uses_the_whole_first_byte() {
        let (fields, consumed) =
            decode_fields(&[0x75, 0xFC], DecodePattern::ShortJump).expect("decodes");
        assert_eq!(consumed, 1);
        assert_eq!(
            fields,
            FieldEncoding::ShortJump {
                operation: Operation::Jne
            }
        );
    }

    #[test]
    fn unknown_primary_opcode_is_reported() {
        // mov sr, r/m is not part of the supported subset.
        assert_eq!(
            decode_fields(&[0x8E, 0xD8], DecodePattern::RegisterMemory),
            Err(DecodeError::UnknownOperation {
                selector: OpcodeSelector::Primary(0b10_0011)
            })
        );
    }

    #[test]
    fn unknown_group_opcode_is_reported() {
        // or r/m, imm (group 001)
        assert_eq!(
            decode_fields(&[0x83, 0xC8, 0x01], DecodePattern::ImmediateToRegisterMemory),
            Err(DecodeError::UnknownOperation {
                selector: OpcodeSelector::Group(0b001)
            })
        );
    }

    #[test]
    fn load_pointer_and_nonzero_reg_are_not_moves() {
        // les bx, [256]
        assert_eq!(
            decode_fields(&[0xC4, 0x1E, 0x00, 0x01], DecodePattern::ImmediateToRegisterMemory),
            Err(DecodeError::UnknownOperation {
                selector: OpcodeSelector::Full(0xC4)
            })
        );
        // lds ax, [bx]
        assert_eq!(
            decode_fields(&[0xC5, 0x07], DecodePattern::ImmediateToRegisterMemory),
            Err(DecodeError::UnknownOperation {
                selector: OpcodeSelector::Full(0xC5)
            })
        );
        // C7 with reg = 001
        assert_eq!(
            decode_fields(&[0xC7, 0x0F, 0x05, 0x00], DecodePattern::ImmediateToRegisterMemory),
            Err(DecodeError::UnknownOperation {
                selector: OpcodeSelector::Full(0xC7)
            })
        );
    }

    #[test]
    fn truncated_header_is_exhausted() {
        assert_eq!(
            decode_fields(&[0x89], DecodePattern::RegisterMemory),
            Err(DecodeError::StreamExhausted {
                needed: 2,
                available: 1
            })
        );
    }

    #[test]
    fn field_patterns_round_trip() {
        let fields = FieldEncoding::ShortJump {
            operation: Operation::Je,
        };
        assert_eq!(fields.pattern(), DecodePattern::ShortJump);
        assert_eq!(fields.operation(), Operation::Je);
    }
}
