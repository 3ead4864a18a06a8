//! Configuration types
//!
//! Board-agnostic encoder configuration, optionally (de)serializable with
//! the `serde` feature.

pub mod encoder;

pub use encoder::*;
