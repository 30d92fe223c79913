use std::fmt;

/// Bit position of the zero flag.
pub const FLAG_ZERO_BIT: u8 = 6;
/// Bit position of the sign flag.
pub const FLAG_SIGN_BIT: u8 = 7;

/// Flags evaluated by this core. All other bits are reserved and stay clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Flag {
    /// Result was zero.
    Zero,
    /// Most significant bit of the result was set.
    Sign,
}

impl Flag {
    /// Evaluated flags in display order.
    pub const ALL: [Self; 2] = [Self::Sign, Self::Zero];

    /// Bit position inside the flags register.
    #[must_use]
    pub const fn bit(self) -> u8 {
        match self {
            Self::Zero => FLAG_ZERO_BIT,
            Self::Sign => FLAG_SIGN_BIT,
        }
    }

    /// Single-bit mask.
    #[must_use]
    pub const fn mask(self) -> u16 {
        1 << self.bit()
    }

    /// Letter used in flag listings.
    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            Self::Zero => 'Z',
            Self::Sign => 'S',
        }
    }
}

/// Bit-addressable 16-bit flags cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct FlagsRegister(u16);

impl FlagsRegister {
    /// Raw register value.
    #[must_use]
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Returns `true` when `flag` is set.
    #[must_use]
    pub const fn is_set(self, flag: Flag) -> bool {
        (self.0 & flag.mask()) != 0
    }

    /// Sets or clears `flag`.
    pub const fn set(&mut self, flag: Flag, enabled: bool) {
        if enabled {
            self.0 |= flag.mask();
        } else {
            self.0 &= !flag.mask();
        }
    }
}

impl fmt::Display for FlagsRegister {
    /// Lists set flags by letter (`SZ`), empty when none are set.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for flag in Flag::ALL {
            if self.is_set(flag) {
                write!(f, "{}", flag.letter())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Flag, FlagsRegister};

    #[test]
    fn flags_sit_at_their_architectural_positions() {
        assert_eq!(Flag::Zero.mask(), 0x0040);
        assert_eq!(Flag::Sign.mask(), 0x0080);
    }

    #[test]
    fn flags_individual_bits_can_be_set_and_cleared() {
        let mut flags = FlagsRegister::default();
        for flag in Flag::ALL {
            flags.set(flag, true);
            assert!(flags.is_set(flag));
        }
        assert_eq!(flags.bits(), 0x00C0);
        assert_eq!(flags.to_string(), "SZ");

        flags.set(Flag::Sign, false);
        assert!(!flags.is_set(Flag::Sign));
        assert!(flags.is_set(Flag::Zero));
        assert_eq!(flags.to_string(), "Z");
    }
}
