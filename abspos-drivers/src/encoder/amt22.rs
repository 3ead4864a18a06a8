//! AMT22 absolute encoder (SPI)
//!
//! Every command is clocked out one byte per exchange with chip select held
//! low for the whole command. The encoder shifts its answer out on MISO at
//! the same time, high byte of each word first.
//!
//! # Protocol
//!
//! ```text
//! MOSI: 0x00 0x00            MISO: [pos hi] [pos lo]
//! MOSI: 0x00 0xA0 0x00 0x00  MISO: [pos hi] [pos lo] [turns hi] [turns lo]
//! MOSI: 0x00 0x70            zero point
//! MOSI: 0x00 0x60            reset
//! ```

use core::slice;

use abspos_core::config::{ConfigError, EncoderConfig};
use abspos_core::position::{Cpr, PositionTracker, RawSample, TurnMode};
use abspos_core::traits::{AbsoluteEncoder, EncoderError};
use abspos_hal::spi::SpiConfig;
use abspos_hal::{SpiPort, Ticks};
use abspos_protocol::spi::{self as commands, decode_words};
use abspos_protocol::FrameError;
use embedded_hal::digital::OutputPin;

/// Bus side of the driver: port and chip select
struct Link<S, CS> {
    port: S,
    cs: CS,
    timeout: Ticks,
}

impl<S: SpiPort, CS: OutputPin> Link<S, CS> {
    /// Clock `command` out with chip select asserted
    ///
    /// Returns the answer in capture order (last byte on the wire first).
    /// Chip select is released on every path.
    fn exchange<const N: usize>(&mut self, command: &[u8; N]) -> Result<[u8; N], EncoderError> {
        if self.cs.set_low().is_err() {
            let _ = self.cs.set_high();
            return Err(EncoderError::Line);
        }

        let mut captured = [0u8; N];
        let clocked = captured
            .iter_mut()
            .rev()
            .zip(command)
            .try_for_each(|(slot, byte)| {
                self.port
                    .transmit_receive(slice::from_ref(byte), slice::from_mut(slot), self.timeout)
            });

        let released = self.cs.set_high();
        clocked?;
        released.map_err(|_| EncoderError::Line)?;
        Ok(captured)
    }
}

/// AMT22 encoder on an SPI bus
pub struct Amt22<S, CS> {
    link: Link<S, CS>,
    tracker: PositionTracker,
}

impl<S: SpiPort, CS: OutputPin> Amt22<S, CS> {
    /// Create a driver; `cs` should already be idle high
    pub fn new(port: S, cs: CS, config: &EncoderConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            link: Link {
                port,
                cs,
                timeout: config.timeout_ticks,
            },
            tracker: PositionTracker::new(config.resolution.cpr(), config.mode),
        })
    }

    /// Recommended bus settings for AMT22 encoders (2 MHz, mode 0)
    pub fn spi_config() -> SpiConfig {
        SpiConfig::default()
    }

    /// Read the position (and turn counter) and update the cumulative count
    pub fn update(&mut self) -> Result<(), EncoderError> {
        let cpr = self.tracker.cpr();
        match &mut self.tracker {
            PositionTracker::SingleTurn(tracker) => {
                let captured = self.link.exchange(&commands::SINGLE_TURN_READ)?;
                let words = decode_words(&captured).map_err(bad_frame)?;
                let position = words.last().ok_or(EncoderError::MalformedFrame)?;
                tracker.update(RawSample::from_word(position.payload(), cpr));
            }
            PositionTracker::MultiTurn(tracker) => {
                let captured = self.link.exchange(&commands::MULTI_TURN_READ)?;
                let words = decode_words(&captured).map_err(bad_frame)?;
                let [turns, position] = words.as_slice() else {
                    return Err(EncoderError::MalformedFrame);
                };
                tracker.update(turns.turns(), RawSample::from_word(position.payload(), cpr));
            }
        }
        Ok(())
    }

    /// Store the current shaft position as the encoder's zero
    ///
    /// The cumulative count is reset only if the encoder's answer to the
    /// command passes its checksum.
    pub fn set_zero_point(&mut self) -> Result<(), EncoderError> {
        let captured = self.link.exchange(&commands::ZERO_POINT)?;
        decode_words(&captured).map_err(bad_frame)?;
        self.tracker.set_zero_point();
        abspos_hal::info!("amt22: zero point set");
        Ok(())
    }

    /// Restart the encoder
    ///
    /// The encoder's answer carries no information and is not checked. The
    /// cumulative count is left untouched.
    pub fn reset(&mut self) -> Result<(), EncoderError> {
        self.link.exchange(&commands::RESET)?;
        abspos_hal::info!("amt22: reset");
        Ok(())
    }

    /// The position tracker
    pub fn tracker(&self) -> &PositionTracker {
        &self.tracker
    }

    /// Release the bus port and chip select
    pub fn release(self) -> (S, CS) {
        (self.link.port, self.link.cs)
    }
}

fn bad_frame(err: FrameError) -> EncoderError {
    abspos_hal::warn!("amt22: rejected response ({})", err);
    EncoderError::from(err)
}

impl<S: SpiPort, CS: OutputPin> AbsoluteEncoder for Amt22<S, CS> {
    fn update(&mut self) -> Result<(), EncoderError> {
        Amt22::update(self)
    }

    fn set_zero_point(&mut self) -> Result<(), EncoderError> {
        Amt22::set_zero_point(self)
    }

    fn count(&self) -> i64 {
        self.tracker.count()
    }

    fn set_count(&mut self, count: i64) {
        self.tracker.set_count(count);
    }

    fn cpr(&self) -> Cpr {
        self.tracker.cpr()
    }

    fn mode(&self) -> TurnMode {
        self.tracker.mode()
    }
}
