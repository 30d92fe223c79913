//! FLAGS update behaviors for different instruction classes.

use crate::state::{Flag, FlagsRegister, Width};

/// Describes how FLAGS should be updated after an instruction executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlagsUpdate {
    /// No change to FLAGS.
    #[default]
    None,
    /// Update the zero and sign flags.
    UpdateZs {
        /// Zero flag.
        zero: bool,
        /// Sign flag.
        sign: bool,
    },
}

impl FlagsUpdate {
    /// Derives ZF/SF from a result at `width`.
    #[must_use]
    pub const fn from_result(value: u16, width: Width) -> Self {
        let value = value & width.mask();
        Self::UpdateZs {
            zero: value == 0,
            sign: value & width.sign_bit() != 0,
        }
    }

    /// Applies the update; other flag bits are left alone.
    pub const fn apply(self, flags: &mut FlagsRegister) {
        if let Self::UpdateZs { zero, sign } = self {
            flags.set(Flag::Zero, zero);
            flags.set(Flag::Sign, sign);
        }
    }
}
