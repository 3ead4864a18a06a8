//! Simulated interrupt-driven peripherals for threaded transport tests
//!
//! Each simulated peripheral shares its state with an "interrupt" thread
//! that finishes transfers and reports them through a completion registry.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use abspos_hal::{SpiHardware, UartHardware};
use abspos_serial::{CompletionEvent, CompletionRegistry, HandleId};

/// Delay between a dispatch and its simulated completion
pub const TRANSFER_LATENCY: Duration = Duration::from_micros(300);

fn lock<T>(state: &Mutex<T>) -> MutexGuard<'_, T> {
    state.lock().unwrap()
}

#[derive(Debug, Default)]
pub struct SpiSim {
    /// Transfer in flight
    pub busy: bool,
    pub pending: Option<Vec<u8>>,
    pub rx: Vec<u8>,
    pub transfers: u32,
    pub aborts: u32,
    /// Set if a transfer was dispatched while another was still running
    pub overlapped: bool,
    /// Reject every dispatch
    pub reject: bool,
    /// Never finish transfers
    pub stall: bool,
    /// Finish transfers without raising a completion event
    pub silent: bool,
}

/// SPI peripheral answering every byte with its complement
#[derive(Clone, Default)]
pub struct SimSpi(pub Arc<Mutex<SpiSim>>);

impl SimSpi {
    pub fn state(&self) -> MutexGuard<'_, SpiSim> {
        lock(&self.0)
    }

    fn start(&mut self, data: Vec<u8>) -> Result<(), ()> {
        let mut sim = self.state();
        if sim.reject {
            return Err(());
        }
        if sim.busy {
            sim.overlapped = true;
        }
        sim.busy = true;
        sim.pending = Some(data);
        sim.transfers += 1;
        Ok(())
    }

    /// Finish the pending transfer; returns whether an event should be raised
    fn complete(&self) -> Option<bool> {
        let mut sim = self.state();
        if sim.stall {
            return None;
        }
        let data = sim.pending.take()?;
        sim.rx = data.iter().map(|byte| !byte).collect();
        sim.busy = false;
        Some(!sim.silent)
    }
}

impl SpiHardware for SimSpi {
    type Error = ();

    fn start_transmit(&mut self, data: &[u8]) -> Result<(), ()> {
        self.start(data.to_vec())
    }

    fn start_receive(&mut self, len: usize) -> Result<(), ()> {
        self.start(vec![0; len])
    }

    fn start_transfer(&mut self, data: &[u8]) -> Result<(), ()> {
        self.start(data.to_vec())
    }

    fn is_ready(&self) -> bool {
        !self.state().busy
    }

    fn read_received(&mut self, buf: &mut [u8]) {
        let sim = self.state();
        for (slot, byte) in buf.iter_mut().zip(&sim.rx) {
            *slot = *byte;
        }
    }

    fn abort(&mut self) {
        let mut sim = self.state();
        sim.busy = false;
        sim.pending = None;
        sim.aborts += 1;
    }
}

/// Interrupt thread body for [`SimSpi`]
pub fn spi_interrupts<const N: usize>(
    hw: &SimSpi,
    registry: &CompletionRegistry<'_, N>,
    handle: HandleId,
    stop: &AtomicBool,
) {
    while !stop.load(Ordering::Acquire) {
        if hw.state().pending.is_some() {
            thread::sleep(TRANSFER_LATENCY);
            if let Some(true) = hw.complete() {
                registry.dispatch(handle, CompletionEvent::TxRxComplete);
            }
        } else {
            thread::yield_now();
        }
    }
}

#[derive(Debug)]
pub struct UartSim {
    pub ring: Vec<u8>,
    /// Next ring offset the "DMA" writes to
    pub write: usize,
    pub receiving: bool,
    pub restarts: u32,
    pub tx_busy: bool,
    pub pending_tx: Option<Vec<u8>>,
    pub sent: Vec<u8>,
    pub aborts: u32,
    pub reject_tx: bool,
    pub stall_tx: bool,
    /// Bytes the line will deliver once reception is running
    pub incoming: VecDeque<u8>,
}

/// UART peripheral with a small reception ring
#[derive(Clone)]
pub struct SimUart(pub Arc<Mutex<UartSim>>);

impl SimUart {
    pub fn new(ring_size: usize) -> Self {
        Self(Arc::new(Mutex::new(UartSim {
            ring: vec![0; ring_size],
            write: 0,
            receiving: false,
            restarts: 0,
            tx_busy: false,
            pending_tx: None,
            sent: Vec::new(),
            aborts: 0,
            reject_tx: false,
            stall_tx: false,
            incoming: VecDeque::new(),
        })))
    }

    pub fn state(&self) -> MutexGuard<'_, UartSim> {
        lock(&self.0)
    }

    /// Queue bytes to arrive on the line
    pub fn deliver(&self, bytes: &[u8]) {
        self.state().incoming.extend(bytes.iter().copied());
    }

    /// Write queued bytes into the ring up to its end
    ///
    /// Returns the reception event the hardware raises, if any byte arrived.
    pub fn receive_pending(&self) -> Option<CompletionEvent> {
        let mut sim = self.state();
        if !sim.receiving || sim.incoming.is_empty() {
            return None;
        }
        let len = sim.ring.len();
        while sim.write < len {
            let Some(byte) = sim.incoming.pop_front() else {
                break;
            };
            let write = sim.write;
            sim.ring[write] = byte;
            sim.write += 1;
        }
        let head = sim.write;
        if sim.write == len {
            sim.write = 0;
        }
        Some(CompletionEvent::RxEvent { head })
    }

    fn complete_transmit(&self) -> bool {
        let mut sim = self.state();
        if sim.stall_tx {
            return false;
        }
        match sim.pending_tx.take() {
            Some(data) => {
                sim.sent.extend(data);
                sim.tx_busy = false;
                true
            }
            None => false,
        }
    }
}

impl UartHardware for SimUart {
    type Error = ();

    fn start_transmit(&mut self, data: &[u8]) -> Result<(), ()> {
        let mut sim = self.state();
        if sim.reject_tx {
            return Err(());
        }
        sim.tx_busy = true;
        sim.pending_tx = Some(data.to_vec());
        Ok(())
    }

    fn is_transmit_ready(&self) -> bool {
        !self.state().tx_busy
    }

    fn start_reception(&mut self) -> Result<(), ()> {
        let mut sim = self.state();
        sim.receiving = true;
        sim.write = 0;
        sim.restarts += 1;
        Ok(())
    }

    fn ring_capacity(&self) -> usize {
        self.state().ring.len()
    }

    fn ring_byte(&self, offset: usize) -> u8 {
        self.state().ring[offset]
    }

    fn abort(&mut self) {
        let mut sim = self.state();
        sim.tx_busy = false;
        sim.pending_tx = None;
        sim.receiving = false;
        sim.aborts += 1;
    }
}

/// Interrupt thread body for [`SimUart`]
pub fn uart_interrupts<const N: usize>(
    hw: &SimUart,
    registry: &CompletionRegistry<'_, N>,
    handle: HandleId,
    stop: &AtomicBool,
) {
    while !stop.load(Ordering::Acquire) {
        let mut idle = true;
        if hw.state().pending_tx.is_some() {
            thread::sleep(TRANSFER_LATENCY);
            if hw.complete_transmit() {
                registry.dispatch(handle, CompletionEvent::TxComplete);
            }
            idle = false;
        }
        while let Some(event) = hw.receive_pending() {
            registry.dispatch(handle, event);
            idle = false;
        }
        if idle {
            thread::yield_now();
        }
    }
}
