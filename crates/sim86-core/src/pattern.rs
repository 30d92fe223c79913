//! Instruction layout classification.
//!
//! Layouts overlap once you look at fewer bits than their own selector, so
//! classification walks an ordered rule list and the first match wins. The
//! generic mod/reg/r-m layout is the fallback when nothing else matches.

use crate::bits;
use crate::fault::DecodeError;

/// Closed set of recognised bit-field layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum DecodePattern {
    /// `oooooodw mod reg r/m`: register/memory to or from register.
    RegisterMemory,
    /// `1011wreg`: immediate to register, short form.
    ImmediateToRegister,
    /// `100000sw mod ooo r/m` and `1100011w mod 000 r/m`.
    ImmediateToRegisterMemory,
    /// `ooooooow`: immediate to `al`/`ax`.
    ImmediateToAccumulator,
    /// `101000dw addr`: direct memory to or from `al`/`ax`.
    MemoryAccumulator,
    /// `0111cccc disp8`: short conditional jump.
    ShortJump,
}

impl DecodePattern {
    /// Bytes taken by the fixed-size header of this layout.
    ///
    /// Displacement and immediate bytes are not included.
    #[must_use]
    pub const fn header_len(self) -> usize {
        match self {
            Self::ImmediateToRegister
            | Self::ImmediateToAccumulator
            | Self::MemoryAccumulator
            | Self::ShortJump => 1,
            Self::RegisterMemory | Self::ImmediateToRegisterMemory => 2,
        }
    }
}

/// Which part of byte 0 a rule compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Selector {
    HighNibble(u8),
    Opcode(u8),
    Byte(u8),
}

impl Selector {
    const fn matches(self, byte: u8, opcode: u8) -> bool {
        match self {
            Self::HighNibble(nibble) => bits::high_nibble(byte) == nibble,
            Self::Opcode(code) => opcode == code,
            Self::Byte(value) => byte == value,
        }
    }
}

/// Classification rules in priority order.
const CLASSIFICATION_RULES: &[(Selector, DecodePattern)] = &[
    (
        Selector::HighNibble(0b1011),
        DecodePattern::ImmediateToRegister,
    ),
    (
        Selector::Opcode(0b11_0001),
        DecodePattern::ImmediateToRegisterMemory,
    ),
    (
        Selector::Opcode(0b10_0000),
        DecodePattern::ImmediateToRegisterMemory,
    ),
    (Selector::Opcode(0b10_1000), DecodePattern::MemoryAccumulator),
    (
        Selector::Opcode(0b00_0001),
        DecodePattern::ImmediateToAccumulator,
    ),
    (
        Selector::Opcode(0b00_1011),
        DecodePattern::ImmediateToAccumulator,
    ),
    (
        Selector::Opcode(0b00_1111),
        DecodePattern::ImmediateToAccumulator,
    ),
    (Selector::Byte(0x74), DecodePattern::ShortJump),
    (Selector::Byte(0x75), DecodePattern::ShortJump),
    (Selector::Byte(0x78), DecodePattern::ShortJump),
    (Selector::Byte(0x79), DecodePattern::ShortJump),
];

/// Selects the layout of the instruction starting at `bytes[0]`.
///
/// Only the first byte is inspected.
///
/// # Errors
///
/// Returns [`DecodeError::StreamExhausted`] for an empty slice and
/// [`DecodeError::FieldOutOfRange`] if the opcode selector falls outside six
/// bits.
pub fn classify(bytes: &[u8]) -> Result<DecodePattern, DecodeError> {
    let first = bits::read_u8(bytes, 0)?;
    let opcode = bits::ensure_range("opcode", bits::opcode6(first), 6)?;

    Ok(CLASSIFICATION_RULES
        .iter()
        .find(|(selector, _)| selector.matches(first, opcode))
        .map_or(DecodePattern::RegisterMemory, |(_, pattern)| *pattern))
}
