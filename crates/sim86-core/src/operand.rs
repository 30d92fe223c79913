//! Operand resolution and effective-address computation.
//!
//! Turns decoded header fields plus the trailing displacement/immediate bytes
//! into concrete operands: display text, width, and the storage each operand
//! refers to.

use std::fmt;

use crate::bits;
use crate::decoder::{Direction, FieldEncoding, Mode};
use crate::fault::DecodeError;
use crate::state::{Register, RegisterFile, RegisterPart, RegisterRef, Width};

/// `r/m` code that means "direct address" when `mod = 00`.
pub const DIRECT_ADDRESS_RM: u8 = 0b110;

/// Effective-address bases indexed by `r/m`: display text, base, optional index.
pub const EFFECTIVE_ADDRESS_TABLE: [(&str, Register, Option<Register>); 8] = [
    ("bx + si", Register::Bx, Some(Register::Si)),
    ("bx + di", Register::Bx, Some(Register::Di)),
    ("bp + si", Register::Bp, Some(Register::Si)),
    ("bp + di", Register::Bp, Some(Register::Di)),
    ("si", Register::Si, None),
    ("di", Register::Di, None),
    ("bp", Register::Bp, None),
    ("bx", Register::Bx, None),
];

/// Where an operand's value lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Location {
    /// A register view.
    Register(RegisterRef),
    /// A computed memory address.
    Memory(u16),
    /// An immediate, already extended to the operand width.
    Immediate(u16),
}

/// A fully resolved operand.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Operand {
    /// Assembly text (`ax`, `[bx + si - 4]`, `-12`).
    pub text: String,
    /// Operand width.
    pub width: Width,
    /// Storage handle.
    pub location: Location,
}

impl Operand {
    /// Register operand named after its view.
    #[must_use]
    pub fn register(slot: RegisterRef) -> Self {
        Self {
            text: slot.name().to_string(),
            width: slot.width(),
            location: Location::Register(slot),
        }
    }

    /// Immediate operand rendered in signed decimal when its top bit is set.
    #[must_use]
    pub fn immediate(value: u16, width: Width) -> Self {
        Self {
            text: signed_decimal(value, width),
            width,
            location: Location::Immediate(value & width.mask()),
        }
    }

    /// Returns true for memory operands.
    #[must_use]
    pub const fn is_memory(&self) -> bool {
        matches!(self.location, Location::Memory(_))
    }

    /// Returns true for immediate operands.
    #[must_use]
    pub const fn is_immediate(&self) -> bool {
        matches!(self.location, Location::Immediate(_))
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Operands of one instruction and the trailing bytes they consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOperands {
    /// Destination operand (the displacement for jumps).
    pub destination: Operand,
    /// Source operand, absent for jumps.
    pub source: Option<Operand>,
    /// Trailing bytes consumed after the header.
    pub consumed: usize,
}

/// Renders `value` at `width` as decimal, negative when the top bit is set.
#[must_use]
pub fn signed_decimal(value: u16, width: Width) -> String {
    let value = value & width.mask();
    if value & width.sign_bit() == 0 {
        value.to_string()
    } else {
        format!("-{}", value.wrapping_neg() & width.mask())
    }
}

/// Cursor over the displacement/immediate bytes following a header.
struct Trailing<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Trailing<'a> {
    const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn byte(&mut self) -> Result<u8, DecodeError> {
        let value = bits::read_u8(self.bytes, self.pos)?;
        self.pos += 1;
        Ok(value)
    }

    fn word(&mut self) -> Result<u16, DecodeError> {
        let value = bits::read_u16_le(self.bytes, self.pos)?;
        self.pos += 2;
        Ok(value)
    }

    fn data(&mut self, width: Width) -> Result<u16, DecodeError> {
        match width {
            Width::Byte => self.byte().map(u16::from),
            Width::Word => self.word(),
        }
    }
}

fn register_operand(bits: u8, width: Width, field: &'static str) -> Result<Operand, DecodeError> {
    RegisterRef::from_field(bits, width)
        .map(Operand::register)
        .ok_or(DecodeError::FieldOutOfRange {
            field,
            value: bits,
            bits: 3,
        })
}

fn accumulator(width: Width) -> Operand {
    Operand::register(match width {
        Width::Byte => RegisterRef {
            register: Register::Ax,
            part: RegisterPart::Low,
        },
        Width::Word => RegisterRef::full(Register::Ax),
    })
}

fn direct_memory(address: u16, width: Width) -> Operand {
    Operand {
        text: format!("[{address}]"),
        width,
        location: Location::Memory(address),
    }
}

/// Resolves the `mod`/`r/m` pair into a register or memory operand.
fn rm_operand(
    mode: Mode,
    rm: u8,
    width: Width,
    trailing: &mut Trailing<'_>,
    registers: &RegisterFile,
) -> Result<Operand, DecodeError> {
    let displacement = match mode {
        Mode::Register => return register_operand(rm, width, "r/m"),
        Mode::Memory if rm == DIRECT_ADDRESS_RM => {
            return Ok(direct_memory(trailing.word()?, width));
        }
        Mode::Memory => 0,
        Mode::Memory8 => bits::sign_extend_byte(trailing.byte()?),
        Mode::Memory16 => trailing.word()?,
    };

    let (base_text, base, index) =
        EFFECTIVE_ADDRESS_TABLE
            .get(usize::from(rm))
            .ok_or(DecodeError::FieldOutOfRange {
                field: "r/m",
                value: rm,
                bits: 3,
            })?;

    let address = index
        .map_or(0, |index| registers.get(index))
        .wrapping_add(registers.get(*base))
        .wrapping_add(displacement);

    let text = match displacement {
        0 => format!("[{base_text}]"),
        d if d & Width::Word.sign_bit() != 0 => {
            format!("[{base_text} - {}]", d.wrapping_neg())
        }
        d => format!("[{base_text} + {d}]"),
    };

    Ok(Operand {
        text,
        width,
        location: Location::Memory(address),
    })
}

/// Resolves the operands of a decoded header.
///
/// `trailing` holds the bytes after the header. Register values are read to
/// compute effective addresses, never written.
///
/// # Errors
///
/// - [`DecodeError::StreamExhausted`] when displacement or immediate bytes are
///   missing; `needed`/`available` count from the start of `trailing`.
/// - [`DecodeError::FieldOutOfRange`] for register or `r/m` codes above 7.
pub fn resolve_operands(
    fields: &FieldEncoding,
    trailing: &[u8],
    registers: &RegisterFile,
) -> Result<ResolvedOperands, DecodeError> {
    let mut cursor = Trailing::new(trailing);

    let (destination, source) = match *fields {
        FieldEncoding::RegisterMemory {
            direction,
            width,
            mode,
            reg,
            rm,
            ..
        } => {
            let reg = register_operand(reg, width, "reg")?;
            let rm = rm_operand(mode, rm, width, &mut cursor, registers)?;
            match direction {
                Direction::ToRegister => (reg, Some(rm)),
                Direction::FromRegister => (rm, Some(reg)),
            }
        }
        FieldEncoding::ImmediateToRegister { width, reg, .. } => {
            let destination = register_operand(reg, width, "reg")?;
            let value = cursor.data(width)?;
            (destination, Some(Operand::immediate(value, width)))
        }
        FieldEncoding::ImmediateToRegisterMemory {
            sign_extend,
            width,
            mode,
            rm,
            ..
        } => {
            let destination = rm_operand(mode, rm, width, &mut cursor, registers)?;
            let value = match (sign_extend, width) {
                (false, Width::Word) => cursor.word()?,
                (true, Width::Word) => bits::sign_extend_byte(cursor.byte()?),
                (_, Width::Byte) => u16::from(cursor.byte()?),
            };
            (destination, Some(Operand::immediate(value, width)))
        }
        FieldEncoding::ImmediateToAccumulator { width, .. } => {
            let value = cursor.data(width)?;
            (accumulator(width), Some(Operand::immediate(value, width)))
        }
        FieldEncoding::MemoryAccumulator {
            direction, width, ..
        } => {
            let memory = direct_memory(cursor.word()?, width);
            match direction {
                Direction::ToRegister => (accumulator(width), Some(memory)),
                Direction::FromRegister => (memory, Some(accumulator(width))),
            }
        }
        FieldEncoding::ShortJump { .. } => {
            let displacement = bits::sign_extend_byte(cursor.byte()?);
            (jump_target(displacement), None)
        }
    };

    Ok(ResolvedOperands {
        destination,
        source,
        consumed: cursor.pos,
    })
}

/// Jump displacement operand, shown NASM-style relative to the jump itself.
#[allow(clippy::cast_possible_wrap)]
fn jump_target(displacement: u16) -> Operand {
    let relative = i32::from(displacement as i16) + 2;
    let text = if relative < 0 {
        format!("$-{}", -relative)
    } else {
        format!("$+{relative}")
    };
    Operand {
        text,
        width: Width::Word,
        location: Location::Immediate(displacement),
    }
}
