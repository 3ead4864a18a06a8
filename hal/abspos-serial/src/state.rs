//! Channel transfer state and the bounded wait loop

use abspos_hal::{Deadline, Kernel, TransportError, WakeSignal};

/// Phase of the transfer currently owned by a channel
///
/// Written by the foreground caller when it dispatches or retires a
/// transfer, and by the completion handler when the hardware finishes.
/// Always accessed under the channel's critical-section mutex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferState {
    /// No transfer in flight
    #[default]
    Ready,
    /// A transfer was dispatched and must finish before the deadline
    Busy(Deadline),
    /// The completion handler reported the transfer finished
    Done,
    /// The transfer was aborted by a channel shutdown
    Failed,
}

impl TransferState {
    /// Mark a transfer as dispatched
    pub fn begin(&mut self, deadline: Deadline) {
        *self = TransferState::Busy(deadline);
    }

    /// Record a completion event
    ///
    /// Only a busy channel moves to `Done`; a late completion from an
    /// aborted transfer is ignored. Returns whether the event was accepted.
    pub fn complete(&mut self) -> bool {
        if let TransferState::Busy(_) = self {
            *self = TransferState::Done;
            true
        } else {
            false
        }
    }

    /// Record an abort of the transfer in flight
    ///
    /// Like [`complete`](Self::complete), only a busy channel is affected.
    pub fn fail(&mut self) -> bool {
        if let TransferState::Busy(_) = self {
            *self = TransferState::Failed;
            true
        } else {
            false
        }
    }

    /// Retire the current transfer
    pub fn finish(&mut self) {
        *self = TransferState::Ready;
    }

    /// Check whether a completion was recorded
    pub fn is_done(&self) -> bool {
        matches!(self, TransferState::Done)
    }

    /// Check whether the transfer was aborted
    pub fn is_failed(&self) -> bool {
        matches!(self, TransferState::Failed)
    }

    /// Check whether a transfer is in flight
    pub fn is_busy(&self) -> bool {
        matches!(self, TransferState::Busy(_))
    }
}

/// Block until `ready` returns true or `deadline` expires
///
/// `ready` is evaluated before the first wait, after every wake and after
/// every wait expiry.
pub(crate) fn wait_until<K: Kernel>(
    kernel: &K,
    signal: &K::Signal,
    deadline: Deadline,
    mut ready: impl FnMut() -> bool,
) -> Result<(), TransportError> {
    loop {
        if ready() {
            return Ok(());
        }
        match deadline.remaining(kernel.ticks()) {
            Some(remaining) => {
                signal.wait(remaining);
            }
            None => return Err(TransportError::Timeout),
        }
    }
}
