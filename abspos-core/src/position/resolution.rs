//! Encoder resolution and raw samples

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Counts per revolution of an encoder
///
/// Always a power of two between 2 and 2^14, so `mask()` extracts a position
/// from a response word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Cpr(u16);

impl Cpr {
    /// Largest supported counts per revolution (14-bit window)
    pub const MAX: u16 = 1 << 14;

    /// Validate a counts-per-revolution value
    pub const fn new(cpr: u16) -> Option<Self> {
        if cpr >= 2 && cpr <= Self::MAX && cpr.is_power_of_two() {
            Some(Self(cpr))
        } else {
            None
        }
    }

    /// Counts per revolution
    pub const fn get(self) -> u16 {
        self.0
    }

    /// Mask selecting a position inside one revolution (`cpr - 1`)
    pub const fn mask(self) -> u16 {
        self.0 - 1
    }

    /// Half a revolution in counts
    pub const fn half(self) -> i32 {
        (self.0 / 2) as i32
    }
}

/// Position resolution of an encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Resolution {
    /// 12 bits, 4096 counts per revolution
    #[default]
    Bits12,
    /// 14 bits, 16384 counts per revolution
    Bits14,
}

impl Resolution {
    /// Resolution from a bit count (12 or 14)
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            12 => Some(Self::Bits12),
            14 => Some(Self::Bits14),
            _ => None,
        }
    }

    /// Window width in bits
    pub const fn bits(self) -> u8 {
        match self {
            Self::Bits12 => 12,
            Self::Bits14 => 14,
        }
    }

    /// Counts per revolution
    pub const fn cpr(self) -> Cpr {
        Cpr(1 << self.bits())
    }
}

/// A position inside one revolution, always below the encoder's `cpr`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawSample(u16);

impl RawSample {
    /// Accept `value` only if it lies inside the window
    pub const fn new(value: u16, cpr: Cpr) -> Option<Self> {
        if value < cpr.get() {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Extract the window bits of a response word payload
    pub const fn from_word(word: u16, cpr: Cpr) -> Self {
        Self(word & cpr.mask())
    }

    /// The sample value
    pub const fn get(self) -> u16 {
        self.0
    }
}
