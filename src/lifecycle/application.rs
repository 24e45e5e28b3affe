//! The collaborator driven by the lifecycle manager.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Hooks invoked by [`LifecycleManager`](super::LifecycleManager).
///
/// Every hook except `render` runs on the engine thread and never overlaps
/// another hook. `render` runs on whichever thread calls
/// `LifecycleManager::render`, so implementors must serialise it against
/// `background`/`suspend` themselves if they share state.
///
/// Hooks take `&self`; keep mutable state behind interior mutability.
pub trait Application: Send + Sync {
    fn init(&self);
    fn resume(&self);
    fn foreground(&self);
    /// Per-frame tick. `delta_seconds` is the time since the previous tick
    /// (or since `resume`), `total_seconds` the time since `init`.
    fn update(&self, delta_seconds: f32, total_seconds: f64);
    fn background(&self);
    fn suspend(&self);
    fn destroy(&self);
    fn render(&self);
}

/// Identifies an [`Application`] hook, in invocation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hook {
    Init,
    Resume,
    Foreground,
    Update,
    Background,
    Suspend,
    Destroy,
    Render,
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Hook::Init => "init",
            Hook::Resume => "resume",
            Hook::Foreground => "foreground",
            Hook::Update => "update",
            Hook::Background => "background",
            Hook::Suspend => "suspend",
            Hook::Destroy => "destroy",
            Hook::Render => "render",
        };
        f.write_str(name)
    }
}
