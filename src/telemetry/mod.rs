//! Lifecycle telemetry collector.
//!
//! The collector multiplexes engine-thread and transition events into a
//! bounded history plus a broadcast stream for live subscribers.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use crate::config::TelemetryConfig;

pub mod events;

pub use events::{LifecycleEvent, LifecycleEventKind};

/// Snapshot of collector state for CLI reporting.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TelemetrySnapshot {
    pub recent: Vec<LifecycleEvent>,
    pub total_events: u64,
    pub dropped_events: u64,
}

/// Broadcast-based collector retaining a bounded history of lifecycle events.
pub struct LifecycleTelemetry {
    tx: broadcast::Sender<LifecycleEvent>,
    history: Mutex<VecDeque<LifecycleEvent>>,
    history_capacity: usize,
    total_events: AtomicU64,
    dropped_history: AtomicU64,
}

impl LifecycleTelemetry {
    pub fn new(buffer: usize, history_capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer.max(1));
        Self {
            tx,
            history: Mutex::new(VecDeque::with_capacity(history_capacity)),
            history_capacity,
            total_events: AtomicU64::new(0),
            dropped_history: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &TelemetryConfig) -> Self {
        Self::new(config.channel_capacity, config.history_capacity)
    }

    pub fn record(&self, kind: LifecycleEventKind) {
        self.publish(LifecycleEvent {
            timestamp_ms: now_timestamp_ms(),
            kind,
        });
    }

    pub fn publish(&self, event: LifecycleEvent) {
        self.total_events.fetch_add(1, Ordering::Relaxed);
        if self.history_capacity > 0 {
            let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
            if history.len() == self.history_capacity {
                history.pop_front();
                self.dropped_history.fetch_add(1, Ordering::Relaxed);
            }
            history.push_back(event.clone());
        }

        // No subscribers is not an error.
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.tx.subscribe()
    }

    /// Live events as an async stream; lagged subscribers see `Err` items.
    pub fn stream(&self) -> BroadcastStream<LifecycleEvent> {
        BroadcastStream::new(self.tx.subscribe())
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        let history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        TelemetrySnapshot {
            recent: history.iter().cloned().collect(),
            total_events: self.total_events.load(Ordering::Relaxed),
            dropped_events: self.dropped_history.load(Ordering::Relaxed),
        }
    }
}

impl Default for LifecycleTelemetry {
    fn default() -> Self {
        Self::from_config(&TelemetryConfig::default())
    }
}

fn now_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
