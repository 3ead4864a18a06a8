//! Board-agnostic core logic for absolute encoder firmware
//!
//! This crate contains everything that does not depend on a specific bus or
//! chip:
//!
//! - Position tracking (wraparound reconciliation, turn counting)
//! - Encoder configuration types
//! - The encoder driver trait and its error type

#![no_std]
#![deny(unsafe_code)]

pub mod config;
pub mod position;
pub mod traits;
