//! Absolute encoder driver implementations

pub mod amt21;
pub mod amt22;

pub use amt21::Amt21;
pub use amt22::Amt22;
