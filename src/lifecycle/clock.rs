//! Time sources used for update deltas and running time.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Trait representing a monotonic time source used for frame timing.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> Instant;
}

/// Default time source backed by `Instant::now`.
#[derive(Default)]
pub struct SystemTimeSource {
    _unit: (),
}

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Deterministic time source for tests and simulations.
///
/// Each call to `now()` advances by a fixed step (10ms by default), so every
/// update tick sees the same delta regardless of scheduling.
pub struct StubTimeSource {
    start: Instant,
    step_nanos: u64,
    offset_nanos: AtomicU64,
}

impl StubTimeSource {
    pub fn new() -> Self {
        Self::with_step(Duration::from_millis(10))
    }

    pub fn with_step(step: Duration) -> Self {
        Self {
            start: Instant::now(),
            step_nanos: u64::try_from(step.as_nanos()).unwrap_or(u64::MAX),
            offset_nanos: AtomicU64::new(0),
        }
    }
}

impl Default for StubTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for StubTimeSource {
    fn now(&self) -> Instant {
        let nanos = self.offset_nanos.fetch_add(self.step_nanos, Ordering::SeqCst);
        self.start + Duration::from_nanos(nanos)
    }
}
