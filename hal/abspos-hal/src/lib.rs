//! abspos Hardware Abstraction Layer
//!
//! This crate defines the collaborator interfaces the encoder stack consumes
//! without implementing them: interrupt-driven serial hardware, the kernel
//! primitives a blocking transport needs, and the driver-facing ports.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  abspos-drivers (AMT21 / AMT22)         │
//! └─────────────────────────────────────────┘
//!                     │ UartPort / SpiPort
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  abspos-serial (blocking transport)     │
//! └─────────────────────────────────────────┘
//!                     │ UartHardware / SpiHardware + Kernel
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  chip HAL + RTOS (external)             │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`kernel::Kernel`], [`kernel::BlockingLock`], [`kernel::WakeSignal`] - RTOS primitives
//! - [`uart::UartHardware`], [`uart::UartPort`] - Half-duplex serial
//! - [`spi::SpiHardware`], [`spi::SpiPort`] - Synchronous serial
//!
//! Digital output lines (RS-485 direction enable, SPI chip select) use
//! [`embedded_hal::digital::OutputPin`](https://docs.rs/embedded-hal) directly.

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]

pub mod error;
pub mod kernel;
pub mod log;
pub mod spi;
pub mod uart;

#[cfg(feature = "std")]
pub mod std_kernel;

// Re-export key traits at crate root for convenience
pub use error::TransportError;
pub use kernel::{BlockingLock, Deadline, Kernel, Ticks, WakeSignal, WAIT_FOREVER};
pub use spi::{SpiHardware, SpiPort};
pub use uart::{UartHardware, UartPort};
