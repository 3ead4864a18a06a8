//! AMT2x Absolute Encoder Wire Protocol
//!
//! This crate defines the frames exchanged with AMT21 (RS-485) and AMT22
//! (SPI) absolute encoders. Both families answer with the same checksummed
//! 16-bit word; they differ in how requests are framed.
//!
//! # Response Word
//!
//! ```text
//! ┌────┬────┬──────────────────────────────┐
//! │ K1 │ K0 │ DATA (position or turns)     │
//! │ b15│ b14│ b13 – b0                     │
//! └────┴────┴──────────────────────────────┘
//! ```
//!
//! K1 and K0 are odd parity over the odd and even data bits. A word with a
//! parity mismatch must never reach position tracking.

#![no_std]
#![deny(unsafe_code)]

pub mod frame;
pub mod rs485;
pub mod spi;

pub use frame::{checksum_bits, is_valid, with_checksum, FrameError, ResponseWord, DATA_MASK};
pub use rs485::{Address, Command, DEFAULT_ADDRESS};
