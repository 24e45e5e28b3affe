//! Lifecycle telemetry event types exposed to diagnostics surfaces.

use serde::{Deserialize, Serialize};

use crate::lifecycle::{Hook, LifecycleState, Transition};

/// A timestamped lifecycle event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LifecycleEvent {
    pub timestamp_ms: u64,
    pub kind: LifecycleEventKind,
}

/// What happened. Per-frame update ticks are counted, not reported here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum LifecycleEventKind {
    EngineThreadStarted,
    TransitionRequested {
        transition: Transition,
        from: LifecycleState,
        to: LifecycleState,
    },
    StateCommitted {
        from: LifecycleState,
        to: LifecycleState,
    },
    HookInvoked {
        hook: Hook,
    },
    EngineThreadExited,
    EngineThreadPanicked,
}
