//! Synchronous (SPI) command frames.
//!
//! Commands are clocked out one byte per exchange while the encoder answers
//! on MISO. The response bytes are captured in reverse order, so byte `i` of
//! an `n`-byte exchange is stored at index `n - i - 1`. Read that way, the
//! capture buffer is a sequence of little-endian `(low, high)` words: the
//! position word last, preceded by the turn counter word on multi-turn reads.

use heapless::Vec;

use crate::frame::{FrameError, ResponseWord};

/// Read the position
pub const SINGLE_TURN_READ: [u8; 2] = [0x00, 0x00];

/// Read position and turn counter
pub const MULTI_TURN_READ: [u8; 4] = [0x00, 0xA0, 0x00, 0x00];

/// Store the current position as zero
pub const ZERO_POINT: [u8; 2] = [0x00, 0x70];

/// Restart the encoder
pub const RESET: [u8; 2] = [0x00, 0x60];

/// Longest command in bytes
pub const MAX_COMMAND_LEN: usize = 4;

/// Most words in one response
pub const MAX_WORDS: usize = MAX_COMMAND_LEN / 2;

/// Validate every word of a reversed capture buffer
///
/// Fails on the first word with bad check bits; nothing is returned for a
/// partially valid buffer.
pub fn decode_words(captured: &[u8]) -> Result<Vec<ResponseWord, MAX_WORDS>, FrameError> {
    if captured.is_empty() || captured.len() % 2 != 0 || captured.len() > MAX_COMMAND_LEN {
        return Err(FrameError::Length);
    }

    let mut words = Vec::new();
    for pair in captured.chunks_exact(2) {
        let word = ResponseWord::from_slice(pair)?;
        words.push(word).map_err(|_| FrameError::Length)?;
    }
    Ok(words)
}
