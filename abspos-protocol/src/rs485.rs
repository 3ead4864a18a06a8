//! Half-duplex (RS-485) request frames.
//!
//! A request is a single byte: the node address in the upper six bits and a
//! command in the lowest two. Extended commands follow the `0x02` byte with a
//! second opcode byte. Each read request is answered by one 2-byte
//! [`ResponseWord`](crate::ResponseWord); extended commands are not answered.

use crate::frame::FrameError;

/// Factory default node address
pub const DEFAULT_ADDRESS: u8 = 0x54;

/// Bits of the request byte reserved for the command
pub const COMMAND_MASK: u8 = 0x03;

/// Bytes in every read response
pub const RESPONSE_LEN: usize = 2;

/// Extended opcode: store the current position as zero
pub const ZERO_POINT: u8 = 0x5E;

/// Extended opcode: restart the encoder
pub const RESET: u8 = 0x75;

/// A validated node address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Address(u8);

impl Address {
    /// Validate a node address
    ///
    /// The two lowest bits carry the command and must be clear.
    pub const fn new(address: u8) -> Result<Self, FrameError> {
        if address & COMMAND_MASK != 0 {
            Err(FrameError::InvalidAddress)
        } else {
            Ok(Self(address))
        }
    }

    /// The address byte
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Build the request byte for `command`
    pub const fn request(self, command: Command) -> u8 {
        self.0 | command as u8
    }
}

impl Default for Address {
    fn default() -> Self {
        Self(DEFAULT_ADDRESS)
    }
}

impl TryFrom<u8> for Address {
    type Error = FrameError;

    fn try_from(address: u8) -> Result<Self, FrameError> {
        Self::new(address)
    }
}

/// Request commands (low two bits of the request byte)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Command {
    /// Read the position word
    Position = 0x00,
    /// Read the turn counter word (multi-turn encoders only)
    Turns = 0x01,
    /// Extended command; an opcode byte follows
    Extended = 0x02,
}

/// Request for the position word
pub const fn position_request(address: Address) -> [u8; 1] {
    [address.request(Command::Position)]
}

/// Request for the turn counter word
pub const fn turns_request(address: Address) -> [u8; 1] {
    [address.request(Command::Turns)]
}

/// Extended command carrying `opcode`
pub const fn extended(address: Address, opcode: u8) -> [u8; 2] {
    [address.request(Command::Extended), opcode]
}

/// Extended command storing the current position as zero
pub const fn zero_point_request(address: Address) -> [u8; 2] {
    extended(address, ZERO_POINT)
}

/// Extended command restarting the encoder
pub const fn reset_request(address: Address) -> [u8; 2] {
    extended(address, RESET)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_address_requests() {
        let address = Address::default();
        assert_eq!(address.get(), 0x54);
        assert_eq!(position_request(address), [0x54]);
        assert_eq!(turns_request(address), [0x55]);
        assert_eq!(zero_point_request(address), [0x56, 0x5E]);
        assert_eq!(reset_request(address), [0x56, 0x75]);
    }

    #[test]
    fn test_address_with_command_bits_rejected() {
        assert_eq!(Address::new(0x55), Err(FrameError::InvalidAddress));
        assert_eq!(Address::try_from(0x56), Err(FrameError::InvalidAddress));
        assert_eq!(Address::new(0x58).map(Address::get), Ok(0x58));
    }

    #[test]
    fn test_other_address_requests() {
        let address = Address::new(0xA4).unwrap();
        assert_eq!(position_request(address), [0xA4]);
        assert_eq!(turns_request(address), [0xA5]);
        assert_eq!(extended(address, 0x12), [0xA6, 0x12]);
    }
}
