//! Blocking SPI channel

use core::cell::RefCell;

use abspos_hal::{
    BlockingLock, Deadline, Kernel, SpiHardware, SpiPort, Ticks, TransportError, WakeSignal,
};
use embassy_sync::blocking_mutex::{raw::CriticalSectionRawMutex, Mutex};

use crate::registry::{CompletionEvent, CompletionHandler};
use crate::state::{wait_until, TransferState};

struct Shared<H> {
    hw: H,
    state: TransferState,
}

/// SPI master shared by every device on one bus
///
/// All methods take `&self`; transactions from different threads are
/// serialized by the channel lock. Each encoder on the bus drives its own
/// chip-select line around its calls.
pub struct SpiChannel<H: SpiHardware, K: Kernel> {
    shared: Mutex<CriticalSectionRawMutex, RefCell<Shared<H>>>,
    lock: K::Lock,
    signal: K::Signal,
    kernel: K,
}

impl<H: SpiHardware, K: Kernel> SpiChannel<H, K> {
    /// Wrap an SPI peripheral
    pub fn new(hw: H, kernel: K) -> Self {
        Self {
            shared: Mutex::new(RefCell::new(Shared {
                hw,
                state: TransferState::Ready,
            })),
            lock: kernel.create_lock(),
            signal: kernel.create_signal(),
            kernel,
        }
    }

    /// Write `data`, discarding received bytes
    pub fn transmit(&self, data: &[u8], timeout: Ticks) -> Result<(), TransportError> {
        let _guard = self.lock.lock();
        self.run(timeout, |hw| hw.start_transmit(data))
    }

    /// Read `buf.len()` bytes
    pub fn receive(&self, buf: &mut [u8], timeout: Ticks) -> Result<(), TransportError> {
        let _guard = self.lock.lock();
        self.run(timeout, |hw| hw.start_receive(buf.len()))?;
        self.with_hw(|hw| hw.read_received(buf));
        Ok(())
    }

    /// Full-duplex transfer of `tx` into `rx`
    pub fn transmit_receive(
        &self,
        tx: &[u8],
        rx: &mut [u8],
        timeout: Ticks,
    ) -> Result<(), TransportError> {
        if tx.len() != rx.len() {
            return Err(TransportError::Length);
        }
        let _guard = self.lock.lock();
        self.run(timeout, |hw| hw.start_transfer(tx))?;
        self.with_hw(|hw| hw.read_received(rx));
        Ok(())
    }

    /// Check whether a transfer is in flight
    pub fn is_busy(&self) -> bool {
        self.shared.lock(|shared| shared.borrow().state.is_busy())
    }

    fn with_hw<R>(&self, f: impl FnOnce(&mut H) -> R) -> R {
        self.shared.lock(|shared| f(&mut shared.borrow_mut().hw))
    }

    /// Dispatch a transfer and wait for it; caller holds the channel lock
    fn run(
        &self,
        timeout: Ticks,
        start: impl FnOnce(&mut H) -> Result<(), H::Error>,
    ) -> Result<(), TransportError> {
        let deadline = Deadline::new(self.kernel.ticks(), timeout);

        // The state goes busy inside the same critical section as the
        // dispatch, so a completion interrupt can never precede it.
        let started = self.shared.lock(|shared| {
            let mut shared = shared.borrow_mut();
            shared.state.begin(deadline);
            let started = start(&mut shared.hw).is_ok();
            if !started {
                shared.state.finish();
            }
            started
        });
        if !started {
            abspos_hal::warn!("spi transfer rejected by hardware");
            return Err(TransportError::Start);
        }

        // A completion event only wakes the wait. A stale one from an earlier,
        // aborted transfer must not end it while the peripheral is busy.
        let waited = wait_until(&self.kernel, &self.signal, deadline, || {
            self.shared.lock(|shared| {
                let shared = shared.borrow();
                shared.state.is_failed() || shared.hw.is_ready()
            })
        });

        let result = self.shared.lock(|shared| {
            let mut shared = shared.borrow_mut();
            let result = match waited {
                Err(err) => {
                    shared.hw.abort();
                    Err(err)
                }
                Ok(()) if shared.state.is_failed() => Err(TransportError::Aborted),
                Ok(()) => Ok(()),
            };
            shared.state.finish();
            result
        });

        match result {
            Err(TransportError::Timeout) => {
                abspos_hal::warn!("spi transfer timed out after {=u32} ticks", timeout)
            }
            Err(TransportError::Aborted) => abspos_hal::debug!("spi transfer aborted"),
            _ => {}
        }
        result
    }
}

impl<H: SpiHardware, K: Kernel> CompletionHandler for SpiChannel<H, K> {
    fn on_event(&self, event: CompletionEvent) {
        match event {
            CompletionEvent::TxComplete
            | CompletionEvent::RxComplete
            | CompletionEvent::TxRxComplete => {
                self.shared
                    .lock(|shared| shared.borrow_mut().state.complete());
            }
            CompletionEvent::Error => {
                abspos_hal::warn!("spi peripheral error");
            }
            CompletionEvent::RxEvent { .. } | CompletionEvent::AbortComplete => {}
        }
        self.signal.raise();
    }

    fn shutdown(&self) {
        self.shared.lock(|shared| {
            let mut shared = shared.borrow_mut();
            shared.hw.abort();
            shared.state.fail();
        });
        self.signal.raise();
    }
}

impl<H: SpiHardware, K: Kernel> SpiPort for &SpiChannel<H, K> {
    fn transmit(&mut self, data: &[u8], timeout: Ticks) -> Result<(), TransportError> {
        SpiChannel::transmit(*self, data, timeout)
    }

    fn receive(&mut self, buf: &mut [u8], timeout: Ticks) -> Result<(), TransportError> {
        SpiChannel::receive(*self, buf, timeout)
    }

    fn transmit_receive(
        &mut self,
        tx: &[u8],
        rx: &mut [u8],
        timeout: Ticks,
    ) -> Result<(), TransportError> {
        SpiChannel::transmit_receive(*self, tx, rx, timeout)
    }
}

impl<H: SpiHardware, K: Kernel> Drop for SpiChannel<H, K> {
    fn drop(&mut self) {
        self.shared.get_mut().get_mut().hw.abort();
    }
}
