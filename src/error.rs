// Error types for the engine lifecycle core
//
// Contract violations (out-of-order transitions, rendering while inactive)
// are reported through these types before the public API turns them into
// fatal assertions. The numeric codes are stable for platform layers that
// forward them across an FFI boundary.

use log::error;
use std::fmt;

use crate::lifecycle::{LifecycleState, Transition};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// the FFI boundary.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}

/// Log a lifecycle error with structured context
///
/// Fields logged:
/// - context: the operation that failed
/// - code: numeric error code for programmatic handling
/// - message: human-readable error message
pub fn log_lifecycle_error(err: &LifecycleError, context: &str) {
    error!(
        "Lifecycle error in {}: code={}, component=LifecycleManager, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Lifecycle-related errors
///
/// Error code range: 1001-1004
///
/// Locks are recovered with `PoisonError::into_inner`, so poisoning never
/// surfaces as an error.
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleError {
    /// Transition requested while the target state does not allow it
    InvalidTransition {
        transition: Transition,
        expected: LifecycleState,
        actual: LifecycleState,
    },

    /// Render requested while the target state is idle
    RenderWhileInactive { target: LifecycleState },

    /// The engine thread could not be spawned
    ThreadSpawnFailed { reason: String },

    /// The engine thread unwound instead of returning normally
    EngineThreadPanicked { phase: String },
}

impl ErrorCode for LifecycleError {
    fn code(&self) -> i32 {
        match self {
            LifecycleError::InvalidTransition { .. } => 1001,
            LifecycleError::RenderWhileInactive { .. } => 1002,
            LifecycleError::ThreadSpawnFailed { .. } => 1003,
            LifecycleError::EngineThreadPanicked { .. } => 1004,
        }
    }

    fn message(&self) -> String {
        match self {
            LifecycleError::InvalidTransition {
                transition,
                expected,
                actual,
            } => {
                format!(
                    "Cannot {}: target state is {}, expected {}",
                    transition, actual, expected
                )
            }
            LifecycleError::RenderWhileInactive { target } => {
                format!(
                    "Cannot render: target state is {}, expected resumed or foregrounded",
                    target
                )
            }
            LifecycleError::ThreadSpawnFailed { reason } => {
                format!("Failed to spawn engine thread: {}", reason)
            }
            LifecycleError::EngineThreadPanicked { phase } => {
                format!("Engine thread panicked during {}", phase)
            }
        }
    }
}

impl fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LifecycleError (code {}): {}", self.code(), self.message())
    }
}

impl std::error::Error for LifecycleError {}

/// Convert from std::io::Error (thread spawn) to LifecycleError
impl From<std::io::Error> for LifecycleError {
    fn from(err: std::io::Error) -> Self {
        LifecycleError::ThreadSpawnFailed {
            reason: err.to_string(),
        }
    }
}
