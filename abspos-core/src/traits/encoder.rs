//! Absolute encoder driver trait
//!
//! This trait abstracts over encoder families and their buses (AMT21 on
//! RS-485, AMT22 on SPI).

use abspos_hal::TransportError;
use abspos_protocol::FrameError;

use crate::position::{Cpr, TurnMode};

/// Errors that can occur while talking to an encoder
///
/// On any error the tracked position is left exactly as it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncoderError {
    /// The bus rejected the transfer
    TransportStart,
    /// The transfer did not complete in time
    TransportTimeout,
    /// The bus was shut down during the transfer
    TransportAborted,
    /// A response word failed its checksum
    ChecksumMismatch,
    /// A response had the wrong shape
    MalformedFrame,
    /// A direction-enable or chip-select line could not be driven
    Line,
}

impl From<TransportError> for EncoderError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Start => EncoderError::TransportStart,
            TransportError::Timeout => EncoderError::TransportTimeout,
            TransportError::Aborted => EncoderError::TransportAborted,
            TransportError::Length => EncoderError::MalformedFrame,
        }
    }
}

impl From<FrameError> for EncoderError {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::InvalidChecksum => EncoderError::ChecksumMismatch,
            FrameError::Length | FrameError::InvalidAddress => EncoderError::MalformedFrame,
        }
    }
}

/// Trait for absolute rotary encoder drivers
///
/// Implementations are polled: every `update` reads the encoder once and
/// folds the reading into a cumulative count.
pub trait AbsoluteEncoder {
    /// Read the encoder and update the cumulative count
    fn update(&mut self) -> Result<(), EncoderError>;

    /// Make the current shaft position the encoder's zero
    ///
    /// The cumulative count resets to zero only once the encoder accepted
    /// the command.
    fn set_zero_point(&mut self) -> Result<(), EncoderError>;

    /// Cumulative count
    fn count(&self) -> i64;

    /// Overwrite the cumulative count
    fn set_count(&mut self, count: i64);

    /// Counts per revolution
    fn cpr(&self) -> Cpr;

    /// Tracking mode
    fn mode(&self) -> TurnMode;

    /// Cumulative position in revolutions
    fn revolutions(&self) -> f32 {
        self.count() as f32 / f32::from(self.cpr().get())
    }
}
