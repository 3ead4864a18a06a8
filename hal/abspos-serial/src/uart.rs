//! Blocking UART channel with background reception
//!
//! The peripheral receives continuously into a hardware ring buffer. Every
//! reception event copies the newly written part of the ring into a bounded
//! FIFO, and [`UartChannel::receive`] blocks until the FIFO holds enough
//! bytes. Bytes arriving while the FIFO is full are dropped and counted.

use core::cell::RefCell;
use core::fmt;

use abspos_hal::{
    BlockingLock, Deadline, Kernel, Ticks, TransportError, UartHardware, UartPort, WakeSignal,
    WAIT_FOREVER,
};
use embassy_sync::blocking_mutex::{raw::CriticalSectionRawMutex, Mutex};
use heapless::Deque;
use portable_atomic::{AtomicU32, Ordering};

use crate::registry::{CompletionEvent, CompletionHandler};
use crate::state::{wait_until, TransferState};

/// Default receive FIFO capacity in bytes
pub const DEFAULT_RX_QUEUE_SIZE: usize = 64;

struct Shared<H, const Q: usize> {
    hw: H,
    tx: TransferState,
    fifo: Deque<u8, Q>,
    /// Ring offset of the next byte not yet copied into the FIFO
    cursor: usize,
}

impl<H: UartHardware, const Q: usize> Shared<H, Q> {
    /// Abort everything and resume reception from the start of the ring
    fn abort_and_restart(&mut self) -> bool {
        self.hw.abort();
        self.tx.finish();
        self.cursor = 0;
        self.hw.start_reception().is_ok()
    }
}

/// UART shared by every device on one half-duplex bus
pub struct UartChannel<H: UartHardware, K: Kernel, const Q: usize = DEFAULT_RX_QUEUE_SIZE> {
    shared: Mutex<CriticalSectionRawMutex, RefCell<Shared<H, Q>>>,
    lock: K::Lock,
    signal: K::Signal,
    kernel: K,
    dropped: AtomicU32,
    rx_errors: AtomicU32,
}

impl<H: UartHardware, K: Kernel, const Q: usize> UartChannel<H, K, Q> {
    /// Wrap a UART peripheral and start background reception
    pub fn new(mut hw: H, kernel: K) -> Result<Self, TransportError> {
        if hw.start_reception().is_err() {
            abspos_hal::error!("uart reception could not be started");
            return Err(TransportError::Start);
        }

        Ok(Self {
            shared: Mutex::new(RefCell::new(Shared {
                hw,
                tx: TransferState::Ready,
                fifo: Deque::new(),
                cursor: 0,
            })),
            lock: kernel.create_lock(),
            signal: kernel.create_signal(),
            kernel,
            dropped: AtomicU32::new(0),
            rx_errors: AtomicU32::new(0),
        })
    }

    /// Write all of `data`
    pub fn transmit(&self, data: &[u8], timeout: Ticks) -> Result<(), TransportError> {
        let _guard = self.lock.lock();
        let deadline = Deadline::new(self.kernel.ticks(), timeout);

        let started = self.shared.lock(|shared| {
            let mut shared = shared.borrow_mut();
            shared.tx.begin(deadline);
            let started = shared.hw.start_transmit(data).is_ok();
            if !started {
                shared.tx.finish();
            }
            started
        });
        if !started {
            abspos_hal::warn!("uart transmit rejected by hardware");
            return Err(TransportError::Start);
        }

        // TxComplete is a wake hint; only the transmitter's state ends the wait
        let waited = wait_until(&self.kernel, &self.signal, deadline, || {
            self.shared.lock(|shared| {
                let shared = shared.borrow();
                shared.tx.is_failed() || shared.hw.is_transmit_ready()
            })
        });

        let (result, restarted) = self.shared.lock(|shared| {
            let mut shared = shared.borrow_mut();
            match waited {
                Err(err) => (Err(err), shared.abort_and_restart()),
                Ok(()) => {
                    let result = if shared.tx.is_failed() {
                        Err(TransportError::Aborted)
                    } else {
                        Ok(())
                    };
                    shared.tx.finish();
                    (result, true)
                }
            }
        });

        if waited.is_err() {
            abspos_hal::warn!("uart transmit timed out after {=u32} ticks", timeout);
        }
        if !restarted {
            self.rx_errors.fetch_add(1, Ordering::Relaxed);
            abspos_hal::error!("uart reception could not be restarted");
        }
        result
    }

    /// Dequeue exactly `buf.len()` received bytes in arrival order
    ///
    /// Blocks until that many bytes are queued or the timeout expires; on
    /// timeout nothing is dequeued.
    pub fn receive(&self, buf: &mut [u8], timeout: Ticks) -> Result<(), TransportError> {
        if buf.len() > Q {
            return Err(TransportError::Length);
        }

        let _guard = self.lock.lock();
        let deadline = Deadline::new(self.kernel.ticks(), timeout);
        let wanted = buf.len();

        let result = wait_until(&self.kernel, &self.signal, deadline, || {
            self.shared
                .lock(|shared| shared.borrow().fifo.len() >= wanted)
        });
        if result.is_err() {
            abspos_hal::debug!(
                "uart receive of {=usize} bytes timed out after {=u32} ticks",
                wanted,
                timeout
            );
            return result;
        }

        self.shared.lock(|shared| {
            let mut shared = shared.borrow_mut();
            let queued = core::iter::from_fn(|| shared.fifo.pop_front());
            for (slot, byte) in buf.iter_mut().zip(queued) {
                *slot = byte;
            }
        });
        Ok(())
    }

    /// Discard every queued, unread byte
    pub fn flush(&self) {
        let _guard = self.lock.lock();
        self.shared.lock(|shared| shared.borrow_mut().fifo.clear());
    }

    /// Number of bytes waiting in the receive FIFO
    pub fn queued(&self) -> usize {
        self.shared.lock(|shared| shared.borrow().fifo.len())
    }

    /// Bytes dropped because the receive FIFO was full
    pub fn dropped_bytes(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Reception errors reported by the hardware
    pub fn receive_errors(&self) -> u32 {
        self.rx_errors.load(Ordering::Relaxed)
    }

    fn on_reception(&self, head: usize) {
        let dropped = self.shared.lock(|shared| {
            let mut shared = shared.borrow_mut();
            let Shared {
                hw, fifo, cursor, ..
            } = &mut *shared;
            drain_ring(hw.ring_capacity(), |offset| hw.ring_byte(offset), cursor, head, fifo)
        });
        if dropped > 0 {
            self.dropped.fetch_add(dropped as u32, Ordering::Relaxed);
            abspos_hal::warn!("uart rx queue full, dropped {=usize} bytes", dropped);
        }
    }

    fn on_error(&self) {
        self.rx_errors.fetch_add(1, Ordering::Relaxed);
        let restarted = self.shared.lock(|shared| {
            let mut shared = shared.borrow_mut();
            shared.cursor = 0;
            shared.hw.start_reception().is_ok()
        });
        if restarted {
            abspos_hal::warn!("uart error, reception restarted");
        } else {
            abspos_hal::error!("uart error, reception could not be restarted");
        }
    }
}

/// Copy ring bytes between `cursor` and `head` into `fifo`
///
/// `head` is the ring offset the hardware has written up to; a head behind
/// the cursor means the write position wrapped. Returns the number of bytes
/// that did not fit.
fn drain_ring<const Q: usize>(
    len: usize,
    byte_at: impl Fn(usize) -> u8,
    cursor: &mut usize,
    head: usize,
    fifo: &mut Deque<u8, Q>,
) -> usize {
    if len == 0 {
        return 0;
    }
    let head = head.min(len);
    let start = (*cursor).min(len);

    let (first, second) = if head >= start {
        (start..head, 0..0)
    } else {
        (start..len, 0..head)
    };

    let mut dropped = 0;
    for offset in first.chain(second) {
        if fifo.push_back(byte_at(offset)).is_err() {
            dropped += 1;
        }
    }

    *cursor = if head == len { 0 } else { head };
    dropped
}

impl<H: UartHardware, K: Kernel, const Q: usize> CompletionHandler for UartChannel<H, K, Q> {
    fn on_event(&self, event: CompletionEvent) {
        match event {
            CompletionEvent::TxComplete => {
                self.shared
                    .lock(|shared| shared.borrow_mut().tx.complete());
            }
            CompletionEvent::RxEvent { head } => self.on_reception(head),
            CompletionEvent::RxComplete => {
                let len = self.shared.lock(|shared| shared.borrow().hw.ring_capacity());
                self.on_reception(len);
            }
            CompletionEvent::Error => self.on_error(),
            CompletionEvent::TxRxComplete | CompletionEvent::AbortComplete => {}
        }
        self.signal.raise();
    }

    fn shutdown(&self) {
        self.shared.lock(|shared| {
            let mut shared = shared.borrow_mut();
            shared.hw.abort();
            shared.tx.fail();
        });
        self.signal.raise();
    }
}

impl<H: UartHardware, K: Kernel, const Q: usize> UartPort for &UartChannel<H, K, Q> {
    fn transmit(&mut self, data: &[u8], timeout: Ticks) -> Result<(), TransportError> {
        UartChannel::transmit(*self, data, timeout)
    }

    fn receive(&mut self, buf: &mut [u8], timeout: Ticks) -> Result<(), TransportError> {
        UartChannel::receive(*self, buf, timeout)
    }

    fn flush(&mut self) {
        UartChannel::flush(*self)
    }
}

/// Console output over the channel
///
/// Each write blocks until the bytes are on the wire.
impl<H: UartHardware, K: Kernel, const Q: usize> fmt::Write for &UartChannel<H, K, Q> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if s.is_empty() {
            return Ok(());
        }
        UartChannel::transmit(*self, s.as_bytes(), WAIT_FOREVER).map_err(|_| fmt::Error)
    }
}

impl<H: UartHardware, K: Kernel, const Q: usize> Drop for UartChannel<H, K, Q> {
    fn drop(&mut self) {
        self.shared.get_mut().get_mut().hw.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_drain_ring_linear() {
        let ring = [1, 2, 3, 4, 5, 6, 7, 8];
        let mut fifo: Deque<u8, 16> = Deque::new();
        let mut cursor = 0;

        assert_eq!(drain_ring(ring.len(), |i| ring[i], &mut cursor, 3, &mut fifo), 0);
        assert_eq!(cursor, 3);
        assert_eq!(fifo.iter().copied().collect::<heapless::Vec<u8, 16>>(), [1, 2, 3]);

        assert_eq!(drain_ring(ring.len(), |i| ring[i], &mut cursor, 5, &mut fifo), 0);
        assert_eq!(cursor, 5);
        assert_eq!(fifo.len(), 5);
    }

    #[test]
    fn test_drain_ring_full_lap_resets_cursor() {
        let ring = [1, 2, 3, 4];
        let mut fifo: Deque<u8, 16> = Deque::new();
        let mut cursor = 2;

        drain_ring(ring.len(), |i| ring[i], &mut cursor, 4, &mut fifo);
        assert_eq!(cursor, 0);
        assert_eq!(fifo.iter().copied().collect::<heapless::Vec<u8, 16>>(), [3, 4]);
    }

    #[test]
    fn test_drain_ring_wrapped_head() {
        let ring = [10, 11, 12, 13, 14, 15];
        let mut fifo: Deque<u8, 16> = Deque::new();
        let mut cursor = 4;

        drain_ring(ring.len(), |i| ring[i], &mut cursor, 2, &mut fifo);
        assert_eq!(cursor, 2);
        assert_eq!(
            fifo.iter().copied().collect::<heapless::Vec<u8, 16>>(),
            [14, 15, 10, 11]
        );
    }

    #[test]
    fn test_drain_ring_counts_overflow() {
        let ring = [1, 2, 3, 4, 5, 6];
        let mut fifo: Deque<u8, 4> = Deque::new();
        let mut cursor = 0;

        assert_eq!(drain_ring(ring.len(), |i| ring[i], &mut cursor, 6, &mut fifo), 2);
        // Oldest bytes are kept, newest dropped
        assert_eq!(fifo.iter().copied().collect::<heapless::Vec<u8, 4>>(), [1, 2, 3, 4]);
    }

    #[test]
    fn test_drain_ring_same_position_is_empty() {
        let ring = [1, 2, 3, 4];
        let mut fifo: Deque<u8, 4> = Deque::new();
        let mut cursor = 2;

        assert_eq!(drain_ring(ring.len(), |i| ring[i], &mut cursor, 2, &mut fifo), 0);
        assert!(fifo.is_empty());
        assert_eq!(cursor, 2);
    }

    proptest! {
        #[test]
        fn prop_drain_ring_copies_in_order(
            len in 1usize..32,
            cursor_seed in 0usize..32,
            head_seed in 0usize..=32,
        ) {
            let ring: heapless::Vec<u8, 32> = (0..len as u8).map(|i| i.wrapping_mul(7)).collect();
            let start = cursor_seed % len;
            let head = head_seed % (len + 1);
            let mut cursor = start;
            let mut fifo: Deque<u8, 16> = Deque::new();

            let dropped = drain_ring(len, |i| ring[i], &mut cursor, head, &mut fifo);

            let expected = if head >= start { head - start } else { len - start + head };
            prop_assert_eq!(fifo.len() + dropped, expected);
            prop_assert_eq!(fifo.len(), expected.min(16));
            for (i, byte) in fifo.iter().enumerate() {
                prop_assert_eq!(*byte, ring[(start + i) % len]);
            }
            prop_assert_eq!(cursor, if head == len { 0 } else { head });
        }
    }
}
