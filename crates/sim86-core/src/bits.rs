//! Bit-field extraction over raw instruction bytes.
//!
//! Every helper here is a pure slice of a known bit range. Range checks are
//! kept separate (`ensure_range`) so that callers decide which fields are
//! validated and under which name they are reported.

#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]

use crate::fault::DecodeError;

/// Extracts `width` bits of `byte` starting at bit `shift` (LSB = bit 0).
#[must_use]
pub const fn field(byte: u8, shift: u32, width: u32) -> u8 {
    (byte >> shift) & (((1_u16 << width) - 1) as u8)
}

/// High nibble (bits 7..4), the short-form immediate-move selector.
#[must_use]
pub const fn high_nibble(byte: u8) -> u8 {
    field(byte, 4, 4)
}

/// Primary 6-bit opcode (bits 7..2).
#[must_use]
pub const fn opcode6(byte: u8) -> u8 {
    field(byte, 2, 6)
}

/// Bit 1: direction (`d`) or sign-extend (`s`) depending on pattern.
#[must_use]
pub const fn bit1(byte: u8) -> u8 {
    field(byte, 1, 1)
}

/// Bit 0: the width (`w`) bit of most patterns.
#[must_use]
pub const fn bit0(byte: u8) -> u8 {
    field(byte, 0, 1)
}

/// Bit 3: the width bit of the short-form immediate move.
#[must_use]
pub const fn short_form_width(byte: u8) -> u8 {
    field(byte, 3, 1)
}

/// Bits 7..6 of a mod/reg/r-m byte.
#[must_use]
pub const fn mod_field(byte: u8) -> u8 {
    field(byte, 6, 2)
}

/// Bits 5..3 of a mod/reg/r-m byte (register or group opcode).
#[must_use]
pub const fn reg_field(byte: u8) -> u8 {
    field(byte, 3, 3)
}

/// Bits 2..0 of a mod/reg/r-m byte, also the short-form register selector.
#[must_use]
pub const fn rm_field(byte: u8) -> u8 {
    field(byte, 0, 3)
}

/// Validates that `value` fits in `bits` bits.
///
/// # Errors
///
/// Returns [`DecodeError::FieldOutOfRange`] when `value >= 2^bits`.
pub const fn ensure_range(name: &'static str, value: u8, bits: u8) -> Result<u8, DecodeError> {
    if bits < 8 && (value >> bits) != 0 {
        return Err(DecodeError::FieldOutOfRange {
            field: name,
            value,
            bits,
        });
    }
    Ok(value)
}

/// Reads the byte at `offset`.
///
/// # Errors
///
/// Returns [`DecodeError::StreamExhausted`] when `offset` is past the end.
pub fn read_u8(bytes: &[u8], offset: usize) -> Result<u8, DecodeError> {
    bytes
        .get(offset)
        .copied()
        .ok_or(DecodeError::StreamExhausted {
            needed: offset + 1,
            available: bytes.len(),
        })
}

/// Reads a little-endian 16-bit value at `offset`.
///
/// # Errors
///
/// Returns [`DecodeError::StreamExhausted`] when fewer than two bytes remain.
pub fn read_u16_le(bytes: &[u8], offset: usize) -> Result<u16, DecodeError> {
    match bytes.get(offset..offset + 2) {
        Some(&[lo, hi]) => Ok(u16::from_le_bytes([lo, hi])),
        _ => Err(DecodeError::StreamExhausted {
            needed: offset + 2,
            available: bytes.len(),
        }),
    }
}

/// Sign-extends an 8-bit value to 16 bits.
#[must_use]
pub const fn sign_extend_byte(value: u8) -> u16 {
    value as i8 as i16 as u16
}
