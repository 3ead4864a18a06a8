//! Kernel primitives on top of std threads
//!
//! Used for host-side testing of the transport. One tick is a fixed
//! duration (1 ms unless configured otherwise).

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::kernel::{BlockingLock, Kernel, Ticks, WakeSignal};

/// Upper bound for a single condvar wait
const MAX_WAIT_SLICE: Duration = Duration::from_secs(60);

fn relock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Kernel backed by `std::time::Instant` and condvars
#[derive(Debug, Clone, Copy)]
pub struct StdKernel {
    epoch: Instant,
    tick: Duration,
}

impl Default for StdKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl StdKernel {
    /// Create a kernel with 1 ms ticks
    pub fn new() -> Self {
        Self::with_tick(Duration::from_millis(1))
    }

    /// Create a kernel with a custom tick period
    pub fn with_tick(tick: Duration) -> Self {
        Self {
            epoch: Instant::now(),
            tick,
        }
    }

    /// The tick period
    pub fn tick(&self) -> Duration {
        self.tick
    }
}

impl Kernel for StdKernel {
    type Lock = StdLock;
    type Signal = StdSignal;

    fn ticks(&self) -> Ticks {
        let ticks = self.epoch.elapsed().as_nanos() / self.tick.as_nanos().max(1);
        ticks as Ticks
    }

    fn create_lock(&self) -> StdLock {
        StdLock::default()
    }

    fn create_signal(&self) -> StdSignal {
        StdSignal::new(self.tick)
    }
}

/// Blocking lock parking contending threads on a condvar
#[derive(Debug, Default)]
pub struct StdLock {
    locked: Mutex<bool>,
    released: Condvar,
}

impl BlockingLock for StdLock {
    fn acquire(&self) {
        let mut locked = relock(&self.locked);
        while *locked {
            locked = self
                .released
                .wait(locked)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *locked = true;
    }

    fn release(&self) {
        *relock(&self.locked) = false;
        self.released.notify_one();
    }
}

/// Binary semaphore with a tick-based timeout
#[derive(Debug)]
pub struct StdSignal {
    raised: Mutex<bool>,
    wake: Condvar,
    tick: Duration,
}

impl StdSignal {
    /// Create a lowered signal whose waits count in `tick` units
    pub fn new(tick: Duration) -> Self {
        Self {
            raised: Mutex::new(false),
            wake: Condvar::new(),
            tick,
        }
    }
}

impl WakeSignal for StdSignal {
    fn raise(&self) {
        *relock(&self.raised) = true;
        self.wake.notify_one();
    }

    fn wait(&self, max: Ticks) -> bool {
        let timeout = self.tick.saturating_mul(max).min(MAX_WAIT_SLICE);
        let raised = relock(&self.raised);
        let (mut raised, _) = self
            .wake
            .wait_timeout_while(raised, timeout, |raised| !*raised)
            .unwrap_or_else(PoisonError::into_inner);
        let consumed = *raised;
        *raised = false;
        consumed
    }
}
