//! Encoder configuration

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use abspos_hal::Ticks;
use abspos_protocol::{Address, DEFAULT_ADDRESS};

use crate::position::{Resolution, TurnMode};

/// Default per-transaction timeout in kernel ticks
///
/// One tick can expire almost immediately when the call starts just before a
/// tick boundary, so the default leaves a full tick of margin.
pub const DEFAULT_TIMEOUT_TICKS: Ticks = 2;

/// Errors found while validating a configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// The RS-485 node address has command bits set
    InvalidAddress,
    /// A zero timeout can never complete a transaction
    ZeroTimeout,
}

/// Configuration of one encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EncoderConfig {
    /// Position resolution
    pub resolution: Resolution,
    /// Single-turn or multi-turn tracking
    pub mode: TurnMode,
    /// RS-485 node address (ignored on SPI)
    pub address: u8,
    /// Timeout for each bus transaction, in kernel ticks
    pub timeout_ticks: Ticks,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self::new(Resolution::Bits12, TurnMode::SingleTurn)
    }
}

impl EncoderConfig {
    /// Create a config with the default address and timeout
    pub const fn new(resolution: Resolution, mode: TurnMode) -> Self {
        Self {
            resolution,
            mode,
            address: DEFAULT_ADDRESS,
            timeout_ticks: DEFAULT_TIMEOUT_TICKS,
        }
    }

    /// Use a different RS-485 node address
    pub const fn with_address(mut self, address: u8) -> Self {
        self.address = address;
        self
    }

    /// Use a different transaction timeout
    pub const fn with_timeout(mut self, timeout_ticks: Ticks) -> Self {
        self.timeout_ticks = timeout_ticks;
        self
    }

    /// Check the configuration for values no encoder accepts
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.node_address()?;
        if self.timeout_ticks == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    /// The validated RS-485 node address
    pub fn node_address(&self) -> Result<Address, ConfigError> {
        Address::new(self.address).map_err(|_| ConfigError::InvalidAddress)
    }
}
