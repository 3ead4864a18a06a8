//! Blocking serial transport
//!
//! Turns an interrupt-driven UART or SPI peripheral into a blocking,
//! timeout-bounded, mutually exclusive transaction API:
//!
//! - A per-channel [`BlockingLock`](abspos_hal::BlockingLock) serializes
//!   transactions, so a second caller blocks on the lock, not the hardware.
//! - The caller dispatches the transfer, then waits on a wake signal raised
//!   by the completion handler, re-checking the completion state on every
//!   wake and on every timer expiry. A lost or spurious wake can only delay
//!   the caller up to its timeout.
//! - Completion events from interrupt context are routed through a bounded
//!   [`CompletionRegistry`] keyed by hardware handle.
//!
//! ```ignore
//! static REGISTRY: CompletionRegistry<'static, 4> = CompletionRegistry::new();
//!
//! let uart = UART.init(UartChannel::new(hw, kernel)?);
//! let _registration = REGISTRY.attach(UART2_HANDLE, uart)?;
//!
//! // In the UART interrupt handler:
//! REGISTRY.dispatch(UART2_HANDLE, CompletionEvent::RxEvent { head });
//! ```

#![no_std]
#![deny(unsafe_code)]

pub mod registry;
pub mod spi;
pub mod state;
pub mod uart;

pub use registry::{CompletionEvent, CompletionHandler, CompletionRegistry, HandleId, Registration};
pub use spi::SpiChannel;
pub use uart::{UartChannel, DEFAULT_RX_QUEUE_SIZE};
