//! Application lifecycle core.
//!
//! `manager` owns the engine thread; `transition` decides which hooks a
//! state change runs; `state` and `clock` are the shared primitives.

pub mod application;
pub mod clock;
pub mod manager;
pub mod state;
pub mod transition;

pub use application::{Application, Hook};
pub use clock::{StubTimeSource, SystemTimeSource, TimeSource};
pub use manager::{LifecycleManager, LifecycleManagerBuilder};
pub use state::{AtomicLifecycleState, LifecycleState};
pub use transition::{Transition, TransitionPlan};
