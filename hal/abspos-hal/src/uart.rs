//! UART serial communication abstractions
//!
//! Two layers: [`UartHardware`] is what a chip HAL implements for an
//! interrupt-driven peripheral, [`UartPort`] is the blocking interface
//! encoder drivers talk to.

use crate::error::TransportError;
use crate::kernel::Ticks;

/// Interrupt-driven UART peripheral
///
/// Transfers are started from thread context and finish asynchronously; the
/// interrupt handler reports completion through the owning channel's
/// completion handler. Reception runs continuously into a ring buffer owned
/// by the hardware.
pub trait UartHardware {
    /// Error type for dispatch operations
    type Error;

    /// Start transmitting `data`
    ///
    /// The implementation copies `data` into its own transmit buffer before
    /// returning.
    fn start_transmit(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Check whether the transmitter is idle
    fn is_transmit_ready(&self) -> bool;

    /// (Re)start continuous reception into the ring buffer from offset 0
    fn start_reception(&mut self) -> Result<(), Self::Error>;

    /// Size of the reception ring buffer in bytes
    fn ring_capacity(&self) -> usize;

    /// Byte at `offset` in the reception ring buffer
    fn ring_byte(&self, offset: usize) -> u8;

    /// Abort any transfer in flight
    fn abort(&mut self);
}

/// Blocking half-duplex serial port
///
/// Every call is bounded by `timeout` kernel ticks.
pub trait UartPort {
    /// Write all of `data`
    fn transmit(&mut self, data: &[u8], timeout: Ticks) -> Result<(), TransportError>;

    /// Fill `buf` with the next received bytes, in arrival order
    fn receive(&mut self, buf: &mut [u8], timeout: Ticks) -> Result<(), TransportError>;

    /// Discard received bytes that have not been read yet
    fn flush(&mut self);
}

impl<T: UartPort + ?Sized> UartPort for &mut T {
    fn transmit(&mut self, data: &[u8], timeout: Ticks) -> Result<(), TransportError> {
        T::transmit(self, data, timeout)
    }

    fn receive(&mut self, buf: &mut [u8], timeout: Ticks) -> Result<(), TransportError> {
        T::receive(self, buf, timeout)
    }

    fn flush(&mut self) {
        T::flush(self)
    }
}

/// Line settings an encoder expects from its UART
///
/// Frames are always 8 data bits, no parity, one stop bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
}

impl Default for UartConfig {
    fn default() -> Self {
        // RS-485 encoders ship at 2 Mbaud
        Self::new(2_000_000)
    }
}

impl UartConfig {
    /// Bits on the wire per byte (start, 8 data, stop)
    pub const FRAME_BITS: u32 = 10;

    pub const fn new(baudrate: u32) -> Self {
        Self { baudrate }
    }
}
