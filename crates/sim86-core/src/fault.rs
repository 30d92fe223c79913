use thiserror::Error;

use crate::disasm::hex_bytes;
use crate::encoding::OpcodeSelector;
use crate::pattern::DecodePattern;

/// Error classes used for diagnostics and run-abort policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ErrorClass {
    /// A decoded sub-field exceeded its bit-width domain.
    Range,
    /// A decode stage consumed no bytes for a classified pattern.
    UnhandledPattern,
    /// The operation selector has no entry in the operation table.
    UnknownOperation,
    /// Operand resolution needed more bytes than the stream holds.
    StreamExhausted,
}

/// Failure raised while decoding, resolving or executing one instruction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// A sub-field value does not fit the number of bits it was declared with.
    #[error("{field} field value {value:#b} exceeds its {bits}-bit range")]
    FieldOutOfRange {
        /// Name of the offending field.
        field: &'static str,
        /// Extracted value.
        value: u8,
        /// Declared bit width.
        bits: u8,
    },
    /// The field decoder produced a zero-length header for a pattern.
    #[error("decode stage for {pattern:?} consumed no bytes")]
    UnhandledPattern {
        /// Pattern that fell through.
        pattern: DecodePattern,
    },
    /// No operation is assigned to the selector.
    #[error("no operation assigned to opcode {selector}")]
    UnknownOperation {
        /// Selector that failed the table lookup.
        selector: OpcodeSelector,
    },
    /// The instruction runs past the end of the stream.
    #[error("instruction needs {needed} bytes but only {available} remain")]
    StreamExhausted {
        /// Bytes required by the instruction so far.
        needed: usize,
        /// Bytes left in the stream.
        available: usize,
    },
    /// An executor write targeted an operand with no storage.
    #[error("destination `{text}` is not writable")]
    ReadOnlyDestination {
        /// Display text of the operand.
        text: String,
    },
}

impl DecodeError {
    /// Returns the taxonomy class for this error.
    ///
    /// A write to an immediate can only come from a broken pattern branch, so
    /// it is reported with the unhandled-pattern class.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::FieldOutOfRange { .. } => ErrorClass::Range,
            Self::UnhandledPattern { .. } | Self::ReadOnlyDestination { .. } => {
                ErrorClass::UnhandledPattern
            }
            Self::UnknownOperation { .. } => ErrorClass::UnknownOperation,
            Self::StreamExhausted { .. } => ErrorClass::StreamExhausted,
        }
    }
}

/// Run-level failure. Every variant aborts the stream driver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    /// One instruction failed; carries the bytes consumed before the failure.
    #[error("instruction at offset {offset:#06x} [{}]: {source}", hex_bytes(.bytes))]
    Instruction {
        /// Stream offset of the first byte of the instruction.
        offset: usize,
        /// Raw bytes consumed before the failure.
        bytes: Vec<u8>,
        /// Underlying decode failure.
        #[source]
        source: DecodeError,
    },
    /// A taken jump left the instruction pointer beyond the stream.
    #[error("jump target {target:#06x} is outside the {len}-byte stream")]
    JumpOutOfRange {
        /// Instruction pointer after the jump.
        target: u16,
        /// Stream length.
        len: usize,
    },
    /// The configured instruction budget ran out.
    #[error("step limit of {limit} instructions exceeded")]
    StepLimitExceeded {
        /// Configured limit.
        limit: usize,
    },
}

impl SimError {
    /// Returns the per-instruction decode error, if this is one.
    #[must_use]
    pub const fn decode_error(&self) -> Option<&DecodeError> {
        match self {
            Self::Instruction { source, .. } => Some(source),
            Self::JumpOutOfRange { .. } | Self::StepLimitExceeded { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DecodeError, ErrorClass, SimError};
    use crate::encoding::OpcodeSelector;
    use crate::pattern::DecodePattern;

    #[test]
    fn class_mapping_matches_error_taxonomy() {
        let range = DecodeError::FieldOutOfRange {
            field: "mod",
            value: 4,
            bits: 2,
        };
        assert_eq!(range.class(), ErrorClass::Range);
        assert_eq!(
            DecodeError::UnhandledPattern {
                pattern: DecodePattern::ShortJump
            }
            .class(),
            ErrorClass::UnhandledPattern
        );
        assert_eq!(
            DecodeError::UnknownOperation {
                selector: OpcodeSelector::Primary(0b11_1111)
            }
            .class(),
            ErrorClass::UnknownOperation
        );
        assert_eq!(
            DecodeError::StreamExhausted {
                needed: 3,
                available: 2
            }
            .class(),
            ErrorClass::StreamExhausted
        );
    }

    #[test]
    fn instruction_error_message_carries_offset_and_bytes() {
        let err = SimError::Instruction {
            offset: 0x12,
            bytes: vec![0xb8, 0x05],
            source: DecodeError::StreamExhausted {
                needed: 3,
                available: 2,
            },
        };
        let message = err.to_string();
        assert!(message.contains("0x0012"), "{message}");
        assert!(message.contains("b8 05"), "{message}");
        assert!(message.contains("needs 3 bytes"), "{message}");
        assert!(err.decode_error().is_some());
    }

    #[test]
    fn run_level_errors_have_no_decode_source() {
        assert!(SimError::StepLimitExceeded { limit: 10 }
            .decode_error()
            .is_none());
        assert!(SimError::JumpOutOfRange {
            target: 0x40,
            len: 8
        }
        .decode_error()
        .is_none());
    }
}
