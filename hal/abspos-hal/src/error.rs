//! Transport error type shared by every port implementation

/// Errors reported by a blocking serial port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// The hardware rejected the transfer before it started
    Start,
    /// The transfer did not complete within its tick budget
    Timeout,
    /// The channel was shut down while the transfer was in flight
    Aborted,
    /// Buffer length unusable for this channel (mismatched TX/RX lengths,
    /// or a receive larger than the channel's queue)
    Length,
}
