//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the encoder trait defined
//! in abspos-core:
//!
//! - AMT21 family on a half-duplex RS-485 bus
//! - AMT22 family on SPI
//!
//! Drivers talk to the bus through the blocking port traits of abspos-hal
//! and drive the direction-enable or chip-select line themselves through
//! `embedded_hal::digital::OutputPin`.

#![no_std]
#![deny(unsafe_code)]

pub mod encoder;

#[cfg(test)]
mod mock;
