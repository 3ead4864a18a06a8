//! Position tracking
//!
//! Resolution types and the trackers that reconcile raw encoder samples into
//! a cumulative count.

pub mod resolution;
pub mod tracker;

pub use resolution::{Cpr, RawSample, Resolution};
pub use tracker::{
    MultiTurnTracker, PositionTracker, SingleTurnTracker, TurnMode, TURN_COUNTER_BITS,
    TURN_COUNTER_MAX,
};
