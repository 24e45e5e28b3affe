//! Application double that records every hook it receives.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::lifecycle::{Application, Hook};

/// Aggregate view of the update ticks seen so far.
///
/// The update loop can run millions of times per second, so ticks are folded
/// into these counters instead of being stored individually.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UpdateStats {
    pub count: u64,
    pub last_delta_seconds: f32,
    pub last_total_seconds: f64,
    /// Set if any tick reported a negative delta.
    pub saw_negative_delta: bool,
    /// Set if any tick reported a total running time below the previous one.
    pub saw_time_regression: bool,
}

/// [`Application`] that logs hook invocations for assertions.
///
/// `hooks()` returns the invocation sequence with consecutive update ticks
/// collapsed into a single `Hook::Update` entry.
#[derive(Default)]
pub struct RecordingApplication {
    hooks: Mutex<Vec<Hook>>,
    updates: Mutex<UpdateStats>,
    renders: AtomicU64,
    panic_on: Option<Hook>,
}

impl RecordingApplication {
    pub fn new() -> Self {
        Self::default()
    }

    /// Panic inside `hook`, for exercising engine-thread failure paths.
    pub fn panicking_on(hook: Hook) -> Self {
        Self {
            panic_on: Some(hook),
            ..Self::default()
        }
    }

    pub fn hooks(&self) -> Vec<Hook> {
        self.hooks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of calls to a lifecycle hook. Update ticks are counted
    /// individually; see [`RecordingApplication::update_stats`].
    pub fn count(&self, hook: Hook) -> u64 {
        match hook {
            Hook::Update => self.update_stats().count,
            Hook::Render => self.render_count(),
            _ => self.hooks().iter().filter(|h| **h == hook).count() as u64,
        }
    }

    pub fn update_stats(&self) -> UpdateStats {
        *self.updates.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn render_count(&self) -> u64 {
        self.renders.load(Ordering::SeqCst)
    }

    fn record(&self, hook: Hook) {
        if self.panic_on == Some(hook) {
            panic!("RecordingApplication: scripted panic in {} hook", hook);
        }

        let mut hooks = self.hooks.lock().unwrap_or_else(PoisonError::into_inner);
        if hook == Hook::Update && hooks.last() == Some(&Hook::Update) {
            return;
        }
        hooks.push(hook);
    }
}

impl Application for RecordingApplication {
    fn init(&self) {
        self.record(Hook::Init);
    }

    fn resume(&self) {
        self.record(Hook::Resume);
    }

    fn foreground(&self) {
        self.record(Hook::Foreground);
    }

    fn update(&self, delta_seconds: f32, total_seconds: f64) {
        {
            let mut stats = self.updates.lock().unwrap_or_else(PoisonError::into_inner);
            if delta_seconds < 0.0 {
                stats.saw_negative_delta = true;
            }
            if stats.count > 0 && total_seconds < stats.last_total_seconds {
                stats.saw_time_regression = true;
            }
            stats.count += 1;
            stats.last_delta_seconds = delta_seconds;
            stats.last_total_seconds = total_seconds;
        }
        self.record(Hook::Update);
    }

    fn background(&self) {
        self.record(Hook::Background);
    }

    fn suspend(&self) {
        self.record(Hook::Suspend);
    }

    fn destroy(&self) {
        self.record(Hook::Destroy);
    }

    fn render(&self) {
        if self.panic_on == Some(Hook::Render) {
            panic!("RecordingApplication: scripted panic in render hook");
        }
        self.renders.fetch_add(1, Ordering::SeqCst);
    }
}
