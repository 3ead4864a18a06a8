//! Checksummed 16-bit response words.
//!
//! Every encoder response is one little-endian 16-bit word:
//! - bits 0-13: data (position, or the turn counter)
//! - bit 14 (K0): odd parity over the even data bits
//! - bit 15 (K1): odd parity over the odd data bits
//!
//! A parity bit is the complement of the XOR of the bits it covers, so each
//! covered group together with its check bit has an odd number of ones.

/// Data bits carried by one response word
pub const DATA_BITS: u32 = 14;

/// Mask of the data bits of a response word
pub const DATA_MASK: u16 = (1 << DATA_BITS) - 1;

/// Data bits covered by K1 (bits 1, 3, 5, 7, 9, 11, 13)
const ODD_BITS: u16 = 0x2AAA;

/// Data bits covered by K0 (bits 0, 2, 4, 6, 8, 10, 12)
const EVEN_BITS: u16 = 0x1555;

const K1: u16 = 1 << 15;
const K0: u16 = 1 << 14;

/// Errors that can occur while decoding or encoding frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Check bits do not match the data bits
    InvalidChecksum,
    /// Buffer length is not a whole number of words, or too long
    Length,
    /// Node address overlaps the command bits
    InvalidAddress,
}

/// Compute the expected check bits `(k1, k0)` for a response word
pub fn checksum_bits(low: u8, high: u8) -> (bool, bool) {
    let word = u16::from_le_bytes([low, high]);
    let k1 = (word & ODD_BITS).count_ones() % 2 == 0;
    let k0 = (word & EVEN_BITS).count_ones() % 2 == 0;
    (k1, k0)
}

/// Check whether a response word carries valid check bits
pub fn is_valid(low: u8, high: u8) -> bool {
    let (k1, k0) = checksum_bits(low, high);
    k1 == (high & 0x80 != 0) && k0 == (high & 0x40 != 0)
}

/// Build the `(low, high)` bytes of a valid word carrying `payload`
///
/// Bits of `payload` above the 14 data bits are discarded.
pub fn with_checksum(payload: u16) -> [u8; 2] {
    let data = payload & DATA_MASK;
    let [low, high] = data.to_le_bytes();
    let (k1, k0) = checksum_bits(low, high);
    let mut word = data;
    if k1 {
        word |= K1;
    }
    if k0 {
        word |= K0;
    }
    word.to_le_bytes()
}

/// A response word whose check bits were verified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ResponseWord(u16);

impl ResponseWord {
    /// Validate the `(low, high)` bytes of a response
    pub fn parse(low: u8, high: u8) -> Result<Self, FrameError> {
        if is_valid(low, high) {
            Ok(Self(u16::from_le_bytes([low, high])))
        } else {
            Err(FrameError::InvalidChecksum)
        }
    }

    /// Validate a response from a 2-byte slice
    pub fn from_slice(bytes: &[u8]) -> Result<Self, FrameError> {
        match bytes {
            &[low, high] => Self::parse(low, high),
            _ => Err(FrameError::Length),
        }
    }

    /// The 14 data bits
    pub fn payload(&self) -> u16 {
        self.0 & DATA_MASK
    }

    /// The data bits masked to a position window
    ///
    /// `mask` is `cpr - 1` for a power-of-two resolution.
    pub fn position(&self, mask: u16) -> u16 {
        self.0 & mask
    }

    /// The data bits read as a turn counter
    pub fn turns(&self) -> u16 {
        self.payload()
    }

    /// The raw word including check bits
    pub fn raw(&self) -> u16 {
        self.0
    }
}
