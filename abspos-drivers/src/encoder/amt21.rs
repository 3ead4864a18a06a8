//! AMT21 absolute encoder (RS-485)
//!
//! The AMT21 family answers single-byte requests on a half-duplex RS-485
//! bus. The driver owns the transceiver's direction-enable (DE) line and
//! holds it high only while a request is on the wire.
//!
//! # Protocol
//!
//! ```text
//! host:    [addr|0x00]                  position read
//! encoder:              [low] [high]
//! host:    [addr|0x01]                  turn counter read (multi-turn)
//! encoder:              [low] [high]
//! host:    [addr|0x02] [opcode]         extended command, no answer
//! ```

use abspos_core::config::{ConfigError, EncoderConfig};
use abspos_core::position::{Cpr, PositionTracker, RawSample, TurnMode};
use abspos_core::traits::{AbsoluteEncoder, EncoderError};
use abspos_hal::uart::UartConfig;
use abspos_hal::{Ticks, UartPort};
use abspos_protocol::rs485::{self, Address, Command, RESPONSE_LEN};
use abspos_protocol::ResponseWord;
use embedded_hal::digital::OutputPin;

/// Bus side of the driver: port, DE line and node address
struct Link<U, DE> {
    port: U,
    de: DE,
    address: Address,
    timeout: Ticks,
}

impl<U: UartPort, DE: OutputPin> Link<U, DE> {
    /// Put `frame` on the bus with DE asserted
    ///
    /// DE is released again on every path once the port returns.
    fn send(&mut self, frame: &[u8]) -> Result<(), EncoderError> {
        if self.de.set_high().is_err() {
            let _ = self.de.set_low();
            return Err(EncoderError::Line);
        }
        let sent = self.port.transmit(frame, self.timeout);
        let released = self.de.set_low();
        sent?;
        released.map_err(|_| EncoderError::Line)
    }

    /// Issue a read request and validate the answer
    fn read(&mut self, command: Command) -> Result<ResponseWord, EncoderError> {
        // Bytes left over from an earlier, failed exchange would otherwise
        // be taken as this answer.
        self.port.flush();
        self.send(&[self.address.request(command)])?;

        let mut response = [0u8; RESPONSE_LEN];
        self.port.receive(&mut response, self.timeout)?;

        ResponseWord::from_slice(&response).map_err(|err| {
            abspos_hal::warn!(
                "amt21 {=u8:#x}: bad checksum in {:#x}",
                self.address.get(),
                response
            );
            EncoderError::from(err)
        })
    }
}

/// AMT21 encoder on a half-duplex RS-485 bus
pub struct Amt21<U, DE> {
    link: Link<U, DE>,
    tracker: PositionTracker,
}

impl<U: UartPort, DE: OutputPin> Amt21<U, DE> {
    /// Create a driver for the encoder at `config.address`
    pub fn new(port: U, de: DE, config: &EncoderConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            link: Link {
                port,
                de,
                address: config.node_address()?,
                timeout: config.timeout_ticks,
            },
            tracker: PositionTracker::new(config.resolution.cpr(), config.mode),
        })
    }

    /// Recommended bus settings for AMT21 encoders (2 Mbaud, 8N1)
    pub fn uart_config() -> UartConfig {
        UartConfig::default()
    }

    /// Node address of this encoder
    pub fn address(&self) -> Address {
        self.link.address
    }

    /// Read the position (and turn counter) and update the cumulative count
    ///
    /// The count only changes once every word needed for this update passed
    /// its checksum.
    pub fn update(&mut self) -> Result<(), EncoderError> {
        let position = self.link.read(Command::Position)?;
        let raw = RawSample::from_word(position.payload(), self.tracker.cpr());

        match &mut self.tracker {
            PositionTracker::SingleTurn(tracker) => {
                tracker.update(raw);
            }
            PositionTracker::MultiTurn(tracker) => {
                let turns = self.link.read(Command::Turns)?;
                tracker.update(turns.turns(), raw);
            }
        }
        Ok(())
    }

    /// Store the current shaft position as the encoder's zero
    ///
    /// The encoder does not answer this command; the cumulative count is
    /// reset once it is on the wire.
    pub fn set_zero_point(&mut self) -> Result<(), EncoderError> {
        self.link.send(&rs485::zero_point_request(self.link.address))?;
        self.tracker.set_zero_point();
        abspos_hal::info!("amt21 {=u8:#x}: zero point set", self.link.address.get());
        Ok(())
    }

    /// Restart the encoder
    ///
    /// The cumulative count is left untouched.
    pub fn reset(&mut self) -> Result<(), EncoderError> {
        self.link.send(&rs485::reset_request(self.link.address))?;
        abspos_hal::info!("amt21 {=u8:#x}: reset", self.link.address.get());
        Ok(())
    }

    /// The position tracker
    pub fn tracker(&self) -> &PositionTracker {
        &self.tracker
    }

    /// Release the bus port and DE line
    pub fn release(self) -> (U, DE) {
        (self.link.port, self.link.de)
    }
}

impl<U: UartPort, DE: OutputPin> AbsoluteEncoder for Amt21<U, DE> {
    fn update(&mut self) -> Result<(), EncoderError> {
        Amt21::update(self)
    }

    fn set_zero_point(&mut self) -> Result<(), EncoderError> {
        Amt21::set_zero_point(self)
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
