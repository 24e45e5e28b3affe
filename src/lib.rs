// Engine Lifecycle Core
// Runs the application on a dedicated engine thread and applies lifecycle
// requests from platform threads in a fixed, race-free order.

// Module declarations
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod telemetry;
pub mod testing;

// Re-exports for convenience
pub use config::LifecycleConfig;
pub use error::{ErrorCode, LifecycleError};
pub use lifecycle::{
    Application, Hook, LifecycleManager, LifecycleManagerBuilder, LifecycleState, TimeSource,
};
pub use telemetry::{LifecycleEvent, LifecycleEventKind, LifecycleTelemetry};
