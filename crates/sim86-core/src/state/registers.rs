use std::fmt;

/// Number of general-purpose registers.
pub const GENERAL_REGISTER_COUNT: usize = 8;

/// Presentation order of the final register dump, as register indices.
pub const CANONICAL_ORDER: [usize; GENERAL_REGISTER_COUNT] = [0, 3, 1, 2, 4, 5, 6, 7];

/// Operand width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Width {
    /// 8-bit.
    Byte,
    /// 16-bit.
    Word,
}

impl Width {
    /// Decodes a `w` bit.
    #[must_use]
    pub const fn from_w(bit: u8) -> Self {
        if bit == 0 {
            Self::Byte
        } else {
            Self::Word
        }
    }

    /// Size in bytes.
    #[must_use]
    pub const fn bytes(self) -> usize {
        match self {
            Self::Byte => 1,
            Self::Word => 2,
        }
    }

    /// Mask of the bits a value of this width may occupy.
    #[must_use]
    pub const fn mask(self) -> u16 {
        match self {
            Self::Byte => 0x00FF,
            Self::Word => 0xFFFF,
        }
    }

    /// Most significant bit at this width.
    #[must_use]
    pub const fn sign_bit(self) -> u16 {
        match self {
            Self::Byte => 0x0080,
            Self::Word => 0x8000,
        }
    }

    /// Size keyword used in assembly text.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Byte => "byte",
            Self::Word => "word",
        }
    }
}

/// General-purpose register, numbered by its 3-bit encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
#[allow(missing_docs)]
pub enum Register {
    Ax = 0,
    Cx = 1,
    Dx = 2,
    Bx = 3,
    Sp = 4,
    Bp = 5,
    Si = 6,
    Di = 7,
}

impl Register {
    /// All registers in encoding order.
    pub const ALL: [Self; GENERAL_REGISTER_COUNT] = [
        Self::Ax,
        Self::Cx,
        Self::Dx,
        Self::Bx,
        Self::Sp,
        Self::Bp,
        Self::Si,
        Self::Di,
    ];

    /// Returns the storage index (`0..=7`).
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Decodes a 3-bit register field.
    #[must_use]
    pub const fn from_u3(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::Ax),
            1 => Some(Self::Cx),
            2 => Some(Self::Dx),
            3 => Some(Self::Bx),
            4 => Some(Self::Sp),
            5 => Some(Self::Bp),
            6 => Some(Self::Si),
            7 => Some(Self::Di),
            _ => None,
        }
    }

    /// 16-bit register name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ax => "ax",
            Self::Cx => "cx",
            Self::Dx => "dx",
            Self::Bx => "bx",
            Self::Sp => "sp",
            Self::Bp => "bp",
            Self::Si => "si",
            Self::Di => "di",
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which bytes of a register's 2-byte cell an access touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RegisterPart {
    /// Both bytes.
    Full,
    /// Byte 0 of the cell (`al`, `cl`, `dl`, `bl`).
    Low,
    /// Byte 1 of the cell (`ah`, `ch`, `dh`, `bh`).
    High,
}

/// A register slot at a given width, the storage handle of register operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RegisterRef {
    /// Backing register cell.
    pub register: Register,
    /// Bytes of the cell addressed.
    pub part: RegisterPart,
}

impl RegisterRef {
    /// Full-width view of `register`.
    #[must_use]
    pub const fn full(register: Register) -> Self {
        Self {
            register,
            part: RegisterPart::Full,
        }
    }

    /// Decodes a 3-bit register field at `width`.
    ///
    /// Byte-width codes `0..=3` alias the low bytes of `ax..bx`, codes `4..=7`
    /// alias the high bytes of the same four cells.
    #[must_use]
    pub const fn from_field(bits: u8, width: Width) -> Option<Self> {
        match width {
            Width::Word => match Register::from_u3(bits) {
                Some(register) => Some(Self::full(register)),
                None => None,
            },
            Width::Byte => {
                let (cell, part) = if bits < 4 {
                    (bits, RegisterPart::Low)
                } else {
                    (bits.wrapping_sub(4), RegisterPart::High)
                };
                match Register::from_u3(cell) {
                    Some(register) if cell < 4 => Some(Self { register, part }),
                    _ => None,
                }
            }
        }
    }

    /// Width of this view.
    #[must_use]
    pub const fn width(self) -> Width {
        match self.part {
            RegisterPart::Full => Width::Word,
            RegisterPart::Low | RegisterPart::High => Width::Byte,
        }
    }

    /// Assembly name of this view.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match (self.register, self.part) {
            (register, RegisterPart::Full) => register.name(),
            (Register::Ax, RegisterPart::Low) => "al",
            (Register::Cx, RegisterPart::Low) => "cl",
            (Register::Dx, RegisterPart::Low) => "dl",
            (Register::Bx, RegisterPart::Low) => "bl",
            (Register::Ax, RegisterPart::High) => "ah",
            (Register::Cx, RegisterPart::High) => "ch",
            (Register::Dx, RegisterPart::High) => "dh",
            (Register::Bx, RegisterPart::High) => "bh",
            (register, _) => register.name(),
        }
    }
}

/// Eight 2-byte little-endian register cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RegisterFile {
    cells: [[u8; 2]; GENERAL_REGISTER_COUNT],
}

impl RegisterFile {
    /// Reads a full 16-bit register.
    #[must_use]
    pub const fn get(&self, register: Register) -> u16 {
        u16::from_le_bytes(self.cells[register.index()])
    }

    /// Writes a full 16-bit register.
    pub const fn set(&mut self, register: Register, value: u16) {
        self.cells[register.index()] = value.to_le_bytes();
    }

    /// Reads through a register view; byte views return the byte zero-extended.
    #[must_use]
    pub const fn read(&self, slot: RegisterRef) -> u16 {
        let cell = self.cells[slot.register.index()];
        match slot.part {
            RegisterPart::Full => u16::from_le_bytes(cell),
            RegisterPart::Low => cell[0] as u16,
            RegisterPart::High => cell[1] as u16,
        }
    }

    /// Writes through a register view.
    ///
    /// Byte views store the low byte of `value` into their own byte of the
    /// cell and leave the partner byte untouched.
    #[allow(clippy::cast_possible_truncation)]
    pub const fn write(&mut self, slot: RegisterRef, value: u16) {
        let cell = &mut self.cells[slot.register.index()];
        match slot.part {
            RegisterPart::Full => *cell = value.to_le_bytes(),
            RegisterPart::Low => cell[0] = value as u8,
            RegisterPart::High => cell[1] = value as u8,
        }
    }

    /// All registers in the canonical dump order (`ax bx cx dx sp bp si di`).
    #[must_use]
    pub fn canonical_dump(&self) -> [(Register, u16); GENERAL_REGISTER_COUNT] {
        CANONICAL_ORDER.map(|index| {
            let register = Register::ALL[index];
            (register, self.get(register))
        })
    }
}
