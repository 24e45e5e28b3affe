//! Test doubles shared by unit tests, integration tests, and `lifecycle_sim`.

use std::thread;
use std::time::{Duration, Instant};

pub mod recording_app;

pub use recording_app::{RecordingApplication, UpdateStats};

/// Poll `condition` until it holds or `timeout` elapses.
///
/// Returns whether the condition was met.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(1));
    }
}
