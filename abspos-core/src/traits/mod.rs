//! Hardware abstraction traits
//!
//! These traits define the interface between motion control code and the
//! encoder drivers.

pub mod encoder;

pub use encoder::{AbsoluteEncoder, EncoderError};
