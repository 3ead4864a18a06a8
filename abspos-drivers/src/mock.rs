//! Scripted bus ports and pins for driver tests

use abspos_hal::{SpiPort, Ticks, TransportError, UartPort};
use embedded_hal::digital::{self, ErrorKind, OutputPin};
use heapless::{Deque, Vec};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinEvent {
    High,
    Low,
}

#[derive(Debug)]
pub struct PinFault;

impl digital::Error for PinFault {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Output pin recording every level change
pub struct MockPin {
    events: Vec<PinEvent, 32>,
    high: bool,
    broken: bool,
}

impl MockPin {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            high: false,
            broken: false,
        }
    }

    /// A pin whose every write fails
    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Self::new()
        }
    }

    /// Idle-high pin, as a chip select starts out
    pub fn high() -> Self {
        Self {
            high: true,
            ..Self::new()
        }
    }

    pub fn events(&self) -> &[PinEvent] {
        &self.events
    }

    pub fn is_high(&self) -> bool {
        self.high
    }

    fn drive(&mut self, high: bool) -> Result<(), PinFault> {
        if self.broken {
            return Err(PinFault);
        }
        self.high = high;
        let _ = self.events.push(if high { PinEvent::High } else { PinEvent::Low });
        Ok(())
    }
}

impl digital::ErrorType for MockPin {
    type Error = PinFault;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), PinFault> {
        self.drive(false)
    }

    fn set_high(&mut self) -> Result<(), PinFault> {
        self.drive(true)
    }
}

/// Half-duplex port answering each 1-byte read request with a scripted word
pub struct MockUart {
    answers: Deque<[u8; 2], 8>,
    rx: Deque<u8, 16>,
    sent: Vec<u8, 32>,
    pub flushes: u32,
    pub fail_transmit: Option<TransportError>,
}

impl MockUart {
    pub fn new() -> Self {
        Self {
            answers: Deque::new(),
            rx: Deque::new(),
            sent: Vec::new(),
            flushes: 0,
            fail_transmit: None,
        }
    }

    /// Queue the answer to the next read request
    pub fn answer(&mut self, word: &[u8; 2]) {
        let _ = self.answers.push_back(*word);
    }

    /// Bytes already waiting in the receive queue
    pub fn stale(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            let _ = self.rx.push_back(byte);
        }
    }

    pub fn sent(&self) -> &[u8] {
        &self.sent
    }
}

impl UartPort for MockUart {
    fn transmit(&mut self, data: &[u8], _timeout: Ticks) -> Result<(), TransportError> {
        if let Some(err) = self.fail_transmit {
            return Err(err);
        }
        let _ = self.sent.extend_from_slice(data);
        if data.len() == 1 {
            if let Some(word) = self.answers.pop_front() {
                for byte in word {
                    let _ = self.rx.push_back(byte);
                }
            }
        }
        Ok(())
    }

    fn receive(&mut self, buf: &mut [u8], _timeout: Ticks) -> Result<(), TransportError> {
        if self.rx.len() < buf.len() {
            return Err(TransportError::Timeout);
        }
        for slot in buf.iter_mut() {
            *slot = self.rx.pop_front().unwrap_or_default();
        }
        Ok(())
    }

    fn flush(&mut self) {
        self.flushes += 1;
        self.rx.clear();
    }
}

/// SPI port clocking out a scripted byte stream, one byte per exchange
pub struct MockSpi {
    wire: Deque<u8, 16>,
    sent: Vec<u8, 32>,
    /// Fail the exchange of this byte index (0 based, counted over the test)
    pub fail_at: Option<(usize, TransportError)>,
    exchanges: usize,
}

impl MockSpi {
    pub fn new() -> Self {
        Self {
            wire: Deque::new(),
            sent: Vec::new(),
            fail_at: None,
            exchanges: 0,
        }
    }

    /// Queue a word as the encoder sends it: high byte first
    pub fn word(&mut self, word: &[u8; 2]) {
        let _ = self.wire.push_back(word[1]);
        let _ = self.wire.push_back(word[0]);
    }

    pub fn sent(&self) -> &[u8] {
        &self.sent
    }

    pub fn exchanges(&self) -> usize {
        self.exchanges
    }
}

impl SpiPort for MockSpi {
    fn transmit(&mut self, data: &[u8], timeout: Ticks) -> Result<(), TransportError> {
        let mut rx = [0u8; 4];
        let len = data.len().min(rx.len());
        self.transmit_receive(&data[..len], &mut rx[..len], timeout)
    }

    fn receive(&mut self, buf: &mut [u8], timeout: Ticks) -> Result<(), TransportError> {
        let zeros = [0u8; 4];
        let len = buf.len().min(zeros.len());
        self.transmit_receive(&zeros[..len], &mut buf[..len], timeout)
    }

    fn transmit_receive(
        &mut self,
        tx: &[u8],
        rx: &mut [u8],
        _timeout: Ticks,
    ) -> Result<(), TransportError> {
        if tx.len() != rx.len() {
            return Err(TransportError::Length);
        }
        for (out, slot) in tx.iter().zip(rx.iter_mut()) {
            if let Some((index, err)) = self.fail_at {
                if index == self.exchanges {
                    return Err(err);
                }
            }
            self.exchanges += 1;
            let _ = self.sent.push(*out);
            *slot = self.wire.pop_front().unwrap_or(0xFF);
        }
        Ok(())
    }
}
