//! Cumulative position tracking
//!
//! An absolute encoder only reports where it is inside one revolution (and,
//! on multi-turn models, a 14-bit turn counter). The trackers turn those
//! readings into an unbounded signed count.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::resolution::{Cpr, RawSample};

/// Width of the multi-turn counter in bits
pub const TURN_COUNTER_BITS: u32 = 14;

/// Largest value the multi-turn counter reports before it wraps to zero
///
/// Crossing this boundary is not detected: the cumulative count jumps by
/// `TURN_COUNTER_MAX * cpr`. Deployments must keep travel inside the counter
/// range.
pub const TURN_COUNTER_MAX: u16 = (1 << TURN_COUNTER_BITS) - 1;

/// How the cumulative count is derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TurnMode {
    /// Accumulate sample-to-sample deltas with wraparound correction
    #[default]
    SingleTurn,
    /// Read the encoder's turn counter on every update
    MultiTurn,
}

/// Tracking for encoders that only report the in-revolution position
///
/// Motion of more than half a revolution between two samples aliases to a
/// shorter move in the opposite direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SingleTurnTracker {
    cpr: Cpr,
    count: i64,
    previous: u16,
}

impl SingleTurnTracker {
    /// Create a tracker at count zero
    pub const fn new(cpr: Cpr) -> Self {
        Self {
            cpr,
            count: 0,
            previous: 0,
        }
    }

    /// Fold a new sample into the count, returning the applied delta
    pub fn update(&mut self, raw: RawSample) -> i32 {
        let raw = raw.get() & self.cpr.mask();
        let cpr = i32::from(self.cpr.get());
        let half = self.cpr.half();

        let mut delta = i32::from(raw) - i32::from(self.previous);
        if delta > half {
            delta -= cpr;
        } else if delta < -half {
            delta += cpr;
        }

        self.count += i64::from(delta);
        self.previous = raw;
        delta
    }

    /// The most recent sample
    pub fn previous(&self) -> u16 {
        self.previous
    }

    fn set_zero_point(&mut self) {
        self.count = 0;
        self.previous = 0;
    }
}

/// Tracking for encoders with a turn counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MultiTurnTracker {
    cpr: Cpr,
    count: i64,
}

impl MultiTurnTracker {
    /// Create a tracker at count zero
    pub const fn new(cpr: Cpr) -> Self {
        Self { cpr, count: 0 }
    }

    /// Replace the count with `rotation * cpr + raw`, returning it
    ///
    /// `rotation` is read as the unsigned 14-bit counter.
    pub fn update(&mut self, rotation: u16, raw: RawSample) -> i64 {
        let rotation = i64::from(rotation & TURN_COUNTER_MAX);
        let raw = i64::from(raw.get() & self.cpr.mask());
        self.count = rotation * i64::from(self.cpr.get()) + raw;
        self.count
    }

    fn set_zero_point(&mut self) {
        self.count = 0;
    }
}

/// Cumulative position of one encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PositionTracker {
    /// Delta accumulation; carries the previous sample
    SingleTurn(SingleTurnTracker),
    /// Direct computation from the turn counter
    MultiTurn(MultiTurnTracker),
}

impl PositionTracker {
    /// Create a tracker at count zero
    pub const fn new(cpr: Cpr, mode: TurnMode) -> Self {
        match mode {
            TurnMode::SingleTurn => Self::SingleTurn(SingleTurnTracker::new(cpr)),
            TurnMode::MultiTurn => Self::MultiTurn(MultiTurnTracker::new(cpr)),
        }
    }

    /// Tracking mode
    pub fn mode(&self) -> TurnMode {
        match self {
            Self::SingleTurn(_) => TurnMode::SingleTurn,
            Self::MultiTurn(_) => TurnMode::MultiTurn,
        }
    }

    /// Counts per revolution
    pub fn cpr(&self) -> Cpr {
        match self {
            Self::SingleTurn(tracker) => tracker.cpr,
            Self::MultiTurn(tracker) => tracker.cpr,
        }
    }

    /// Cumulative count
    pub fn count(&self) -> i64 {
        match self {
            Self::SingleTurn(tracker) => tracker.count,
            Self::MultiTurn(tracker) => tracker.count,
        }
    }

    /// Overwrite the cumulative count
    ///
    /// The previous sample of a single-turn tracker is left alone.
    pub fn set_count(&mut self, count: i64) {
        match self {
            Self::SingleTurn(tracker) => tracker.count = count,
            Self::MultiTurn(tracker) => tracker.count = count,
        }
    }

    /// Reset to zero after the encoder acknowledged a zero-point command
    pub fn set_zero_point(&mut self) {
        match self {
            Self::SingleTurn(tracker) => tracker.set_zero_point(),
            Self::MultiTurn(tracker) => tracker.set_zero_point(),
        }
    }

    /// Cumulative position in revolutions
    pub fn revolutions(&self) -> f32 {
        self.count() as f32 / f32::from(self.cpr().get())
    }

    /// Angle inside the current revolution, in `[0, 360)` degrees
    pub fn angle_degrees(&self) -> f32 {
        let cpr = self.cpr().get();
        let within = self.count().rem_euclid(i64::from(cpr));
        within as f32 * 360.0 / f32::from(cpr)
    }
}
