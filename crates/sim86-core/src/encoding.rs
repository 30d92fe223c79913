use std::fmt;

/// Operations the executor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(missing_docs)]
pub enum Operation {
    Mov,
    Add,
    Sub,
    Cmp,
    Je,
    Jne,
    Js,
    Jns,
}

impl Operation {
    /// Assembly mnemonic.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Mov => "mov",
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Cmp => "cmp",
            Self::Je => "je",
            Self::Jne => "jne",
            Self::Js => "js",
            Self::Jns => "jns",
        }
    }

    /// Returns true for the short conditional jumps.
    #[must_use]
    pub const fn is_jump(self) -> bool {
        matches!(self, Self::Je | Self::Jne | Self::Js | Self::Jns)
    }

    /// Returns true for operations that always recompute ZF/SF.
    #[must_use]
    pub const fn is_arithmetic(self) -> bool {
        matches!(self, Self::Add | Self::Sub | Self::Cmp)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// An opcode value tagged with the bit space it was extracted from.
///
/// Equal numbers in different spaces are different opcodes: the group code
/// `000` (add) and the primary code `000000` (add r/m) only coincide by
/// accident, and primary `000101` has nothing to do with group `101` (sub).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum OpcodeSelector {
    /// High nibble of byte 0 (short-form immediate move).
    ShortForm(u8),
    /// Bits 7..2 of byte 0.
    Primary(u8),
    /// Bits 5..3 of byte 1 for the immediate-to-register/memory group.
    Group(u8),
    /// The whole of byte 0.
    Full(u8),
}

impl fmt::Display for OpcodeSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShortForm(code) => write!(f, "{code:04b}"),
            Self::Primary(code) => write!(f, "{code:06b}"),
            Self::Group(code) => write!(f, "{code:03b} (group)"),
            Self::Full(code) => write!(f, "{code:08b}"),
        }
    }
}

/// Single source-of-truth operation table.
///
/// Any selector not present here is an unknown operation.
pub const OPERATION_TABLE: &[(OpcodeSelector, Operation)] = &[
    (OpcodeSelector::ShortForm(0b1011), Operation::Mov),
    (OpcodeSelector::Primary(0b10_0010), Operation::Mov),
    (OpcodeSelector::Primary(0b11_0001), Operation::Mov),
    (OpcodeSelector::Primary(0b10_1000), Operation::Mov),
    (OpcodeSelector::Primary(0b00_0000), Operation::Add),
    (OpcodeSelector::Primary(0b00_0001), Operation::Add),
    (OpcodeSelector::Primary(0b00_1010), Operation::Sub),
    (OpcodeSelector::Primary(0b00_1011), Operation::Sub),
    (OpcodeSelector::Primary(0b00_1110), Operation::Cmp),
    (OpcodeSelector::Primary(0b00_1111), Operation::Cmp),
    (OpcodeSelector::Group(0b000), Operation::Add),
    (OpcodeSelector::Group(0b101), Operation::Sub),
    (OpcodeSelector::Group(0b111), Operation::Cmp),
    (OpcodeSelector::Full(0x74), Operation::Je),
    (OpcodeSelector::Full(0x75), Operation::Jne),
    (OpcodeSelector::Full(0x78), Operation::Js),
    (OpcodeSelector::Full(0x79), Operation::Jns),
];

/// Looks up the operation assigned to a selector.
///
/// `None` means the selector is not part of the supported subset.
#[must_use]
pub fn lookup_operation(selector: OpcodeSelector) -> Option<Operation> {
    OPERATION_TABLE
        .iter()
        .find_map(|(entry, operation)| (*entry == selector).then_some(*operation))
}
