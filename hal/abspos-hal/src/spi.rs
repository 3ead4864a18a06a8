//! SPI bus abstractions
//!
//! [`SpiHardware`] is implemented by a chip HAL for an interrupt-driven SPI
//! master; [`SpiPort`] is the blocking interface encoder drivers use.

use crate::error::TransportError;
use crate::kernel::Ticks;

/// Interrupt-driven SPI master
///
/// Transfers finish asynchronously. Received bytes stay in the
/// implementation's buffer until [`read_received`](Self::read_received)
/// copies them out, so the interrupt handler never touches caller memory.
pub trait SpiHardware {
    /// Error type for dispatch operations
    type Error;

    /// Start clocking out `data`, discarding whatever is clocked in
    fn start_transmit(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Start clocking in `len` bytes (writing zeros)
    fn start_receive(&mut self, len: usize) -> Result<(), Self::Error>;

    /// Start a full-duplex transfer of `data`
    fn start_transfer(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Check whether the peripheral is idle
    fn is_ready(&self) -> bool;

    /// Copy the bytes captured by the last receive or transfer into `buf`
    fn read_received(&mut self, buf: &mut [u8]);

    /// Abort any transfer in flight
    fn abort(&mut self);
}

/// Blocking SPI port
///
/// Chip select is not part of this interface; drivers drive it themselves.
pub trait SpiPort {
    /// Write `data`, ignoring the bytes clocked in
    fn transmit(&mut self, data: &[u8], timeout: Ticks) -> Result<(), TransportError>;

    /// Read into `buf` while writing zeros
    fn receive(&mut self, buf: &mut [u8], timeout: Ticks) -> Result<(), TransportError>;

    /// Simultaneously write `tx` and read into `rx`
    ///
    /// Both buffers must be the same length.
    fn transmit_receive(
        &mut self,
        tx: &[u8],
        rx: &mut [u8],
        timeout: Ticks,
    ) -> Result<(), TransportError>;
}

impl<T: SpiPort + ?Sized> SpiPort for &mut T {
    fn transmit(&mut self, data: &[u8], timeout: Ticks) -> Result<(), TransportError> {
        T::transmit(self, data, timeout)
    }

    fn receive(&mut self, buf: &mut [u8], timeout: Ticks) -> Result<(), TransportError> {
        T::receive(self, buf, timeout)
    }

    fn transmit_receive(
        &mut self,
        tx: &[u8],
        rx: &mut [u8],
        timeout: Ticks,
    ) -> Result<(), TransportError> {
        T::transmit_receive(self, tx, rx, timeout)
    }
}

/// Bus settings an encoder expects from its SPI master
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpiConfig {
    /// Highest clock frequency the device accepts, in Hz
    pub max_frequency: u32,
    /// Clock polarity and phase
    pub mode: Mode,
}

impl Default for SpiConfig {
    fn default() -> Self {
        Self {
            max_frequency: 2_000_000,
            mode: Mode::Mode0,
        }
    }
}

/// SPI mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// CPOL=0, CPHA=0
    Mode0,
    /// CPOL=0, CPHA=1
    Mode1,
    /// CPOL=1, CPHA=0
    Mode2,
    /// CPOL=1, CPHA=1
    Mode3,
}

impl Mode {
    /// Clock idles high
    pub const fn cpol(self) -> bool {
        matches!(self, Mode::Mode2 | Mode::Mode3)
    }

    /// Data is captured on the second clock edge
    pub const fn cpha(self) -> bool {
        matches!(self, Mode::Mode1 | Mode::Mode3)
    }
}
