//! Kernel primitives consumed by the blocking transport
//!
//! The RTOS underneath provides a monotonic tick counter, a blocking lock
//! that parks contending threads, and a binary wake signal that interrupt
//! context can raise. The transport is written against these traits only.

/// Monotonic kernel ticks (wrapping)
pub type Ticks = u32;

/// Timeout value meaning "wait as long as it takes"
pub const WAIT_FOREVER: Ticks = Ticks::MAX;

/// A lock that blocks the calling thread while another thread holds it
///
/// Must only be used from thread context, never from an interrupt handler.
pub trait BlockingLock {
    /// Block until the lock is acquired
    fn acquire(&self);

    /// Release a lock previously taken with [`acquire`](Self::acquire)
    fn release(&self);

    /// Acquire the lock, releasing it when the guard drops
    fn lock(&self) -> LockGuard<'_, Self>
    where
        Self: Sized,
    {
        self.acquire();
        LockGuard { lock: self }
    }
}

/// RAII guard returned by [`BlockingLock::lock`]
pub struct LockGuard<'a, L: BlockingLock> {
    lock: &'a L,
}

impl<L: BlockingLock> Drop for LockGuard<'_, L> {
    fn drop(&mut self) {
        self.lock.release();
    }
}

/// Binary wake signal
///
/// Raising is safe from interrupt context. Raising an already raised signal
/// is a no-op; a single `wait` consumes the raised state.
pub trait WakeSignal {
    /// Raise the signal, waking one waiter
    fn raise(&self);

    /// Wait up to `max` ticks for the signal
    ///
    /// Returns `true` if the signal was consumed, `false` on expiry.
    /// Callers must treat either outcome as a hint and re-check their
    /// condition.
    fn wait(&self, max: Ticks) -> bool;
}

/// The set of kernel services a channel needs
pub trait Kernel {
    /// Per-channel transaction lock
    type Lock: BlockingLock;
    /// Completion wake signal
    type Signal: WakeSignal;

    /// Current value of the monotonic tick counter
    fn ticks(&self) -> Ticks;

    /// Create a new, unlocked lock
    fn create_lock(&self) -> Self::Lock;

    /// Create a new, lowered signal
    fn create_signal(&self) -> Self::Signal;
}

/// A tick budget measured from a fixed start point
///
/// Elapsed time is computed with wrapping arithmetic, so a deadline stays
/// correct across a tick counter overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Deadline {
    start: Ticks,
    budget: Ticks,
}

impl Deadline {
    /// Create a deadline `budget` ticks after `start`
    pub const fn new(start: Ticks, budget: Ticks) -> Self {
        Self { start, budget }
    }

    /// Ticks elapsed since the start point
    pub fn elapsed(&self, now: Ticks) -> Ticks {
        now.wrapping_sub(self.start)
    }

    /// Ticks left before expiry, or `None` once the budget is spent
    pub fn remaining(&self, now: Ticks) -> Option<Ticks> {
        let elapsed = self.elapsed(now);
        if elapsed >= self.budget {
            None
        } else {
            Some(self.budget - elapsed)
        }
    }

    /// Check whether the budget is spent
    pub fn is_expired(&self, now: Ticks) -> bool {
        self.remaining(now).is_none()
    }

    /// The tick budget
    pub fn budget(&self) -> Ticks {
        self.budget
    }
}
