//! Lifecycle states and their lock-free shared representation.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};

/// How far the application has progressed through its lifecycle.
///
/// States are totally ordered by depth:
/// `Uninitialised < Initialised < Resumed < Foregrounded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum LifecycleState {
    Uninitialised = 0,
    Initialised = 1,
    Resumed = 2,
    Foregrounded = 3,
}

impl LifecycleState {
    /// Nothing to tick: the engine thread may sleep in this state.
    pub fn is_idle(self) -> bool {
        matches!(self, LifecycleState::Uninitialised | LifecycleState::Initialised)
    }

    /// The update loop runs continuously in this state.
    pub fn is_active(self) -> bool {
        !self.is_idle()
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => LifecycleState::Uninitialised,
            1 => LifecycleState::Initialised,
            2 => LifecycleState::Resumed,
            _ => LifecycleState::Foregrounded,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Uninitialised => "uninitialised",
            LifecycleState::Initialised => "initialised",
            LifecycleState::Resumed => "resumed",
            LifecycleState::Foregrounded => "foregrounded",
        };
        f.write_str(name)
    }
}

/// `LifecycleState` stored in an `AtomicU8`.
///
/// All accesses are `SeqCst` so the engine thread's hot loop sees requests
/// from other threads without taking the wake mutex.
pub struct AtomicLifecycleState {
    inner: AtomicU8,
}

impl AtomicLifecycleState {
    pub fn new(state: LifecycleState) -> Self {
        Self {
            inner: AtomicU8::new(state as u8),
        }
    }

    pub fn load(&self) -> LifecycleState {
        LifecycleState::from_u8(self.inner.load(Ordering::SeqCst))
    }

    pub fn store(&self, state: LifecycleState) {
        self.inner.store(state as u8, Ordering::SeqCst);
    }

    /// Replace `expected` with `next`, returning the observed value on failure.
    pub fn compare_exchange(
        &self,
        expected: LifecycleState,
        next: LifecycleState,
    ) -> Result<LifecycleState, LifecycleState> {
        self.inner
            .compare_exchange(expected as u8, next as u8, Ordering::SeqCst, Ordering::SeqCst)
            .map(LifecycleState::from_u8)
            .map_err(LifecycleState::from_u8)
    }
}

impl fmt::Debug for AtomicLifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AtomicLifecycleState").field(&self.load()).finish()
    }
}
