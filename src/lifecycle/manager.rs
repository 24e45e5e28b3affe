//! LifecycleManager: runs the application on a dedicated engine thread.
//!
//! Platform threads request transitions (`resume`, `foreground`,
//! `background`, `suspend`, drop); the engine thread applies them and runs
//! the update tick continuously while the application is active. All hooks
//! except `render` execute on the engine thread.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::application::{Application, Hook};
use super::clock::{SystemTimeSource, TimeSource};
use super::state::{AtomicLifecycleState, LifecycleState};
use super::transition::{Transition, TransitionPlan};
use crate::config::LifecycleConfig;
use crate::error::{log_lifecycle_error, LifecycleError};
use crate::telemetry::{LifecycleEventKind, LifecycleTelemetry};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InitStatus {
    Pending,
    Complete,
    Aborted,
}

/// One-shot handshake letting the constructor wait for `Init`.
struct InitSignal {
    status: Mutex<InitStatus>,
    cond: Condvar,
}

impl InitSignal {
    fn new() -> Self {
        Self {
            status: Mutex::new(InitStatus::Pending),
            cond: Condvar::new(),
        }
    }

    /// Resolve the handshake. Only the first resolution sticks.
    fn resolve(&self, status: InitStatus) {
        let mut guard = lock(&self.status);
        if *guard == InitStatus::Pending {
            *guard = status;
        }
        drop(guard);
        self.cond.notify_all();
    }

    fn wait(&self) -> InitStatus {
        let mut guard = lock(&self.status);
        while *guard == InitStatus::Pending {
            guard = self.cond.wait(guard).unwrap_or_else(PoisonError::into_inner);
        }
        *guard
    }
}

/// State shared between the manager handle and the engine thread.
struct Shared {
    /// Written by requesting threads only.
    target: AtomicLifecycleState,
    /// Written by the engine thread only.
    current: AtomicLifecycleState,
    /// Guards the idle-wait predicate, not the states themselves.
    wake_lock: Mutex<()>,
    wake: Condvar,
    init: InitSignal,
    update_count: AtomicU64,
}

impl Shared {
    fn new() -> Self {
        Self {
            target: AtomicLifecycleState::new(LifecycleState::Initialised),
            current: AtomicLifecycleState::new(LifecycleState::Uninitialised),
            wake_lock: Mutex::new(()),
            wake: Condvar::new(),
            init: InitSignal::new(),
            update_count: AtomicU64::new(0),
        }
    }

    fn wake_engine(&self) {
        // Taking the lock orders this notify after any in-progress predicate
        // check, so the wakeup cannot be lost.
        let _guard = lock(&self.wake_lock);
        self.wake.notify_all();
    }
}

/// Drives an [`Application`] through its lifecycle on a dedicated thread.
///
/// Construction spawns the engine thread and blocks until `Application::init`
/// has returned. Dropping the manager requests destruction, which runs
/// `Application::destroy` on the engine thread, and joins it.
///
/// Transition requests must follow the state order:
///
/// | Call | Target before | Target after |
/// |---|---|---|
/// | `resume` | Initialised | Resumed |
/// | `foreground` | Resumed | Foregrounded |
/// | `background` | Foregrounded | Resumed |
/// | `suspend` | Resumed | Initialised |
/// | drop | Initialised | Uninitialised |
///
/// The plain methods treat an out-of-order call as a fatal contract
/// violation and panic; the `try_` variants return the error instead.
///
/// # Example
/// ```ignore
/// let manager = LifecycleManager::new(app)?;
/// manager.resume();
/// manager.foreground();
/// // ... platform render callbacks call manager.render() ...
/// manager.background();
/// manager.suspend();
/// drop(manager);
/// ```
pub struct LifecycleManager {
    application: Arc<dyn Application>,
    shared: Arc<Shared>,
    telemetry: Arc<LifecycleTelemetry>,
    engine_thread: Option<JoinHandle<()>>,
}

impl LifecycleManager {
    /// Start the engine thread with the default configuration.
    pub fn new(application: Arc<dyn Application>) -> Result<Self, LifecycleError> {
        Self::builder(application).build()
    }

    pub fn with_config(
        application: Arc<dyn Application>,
        config: LifecycleConfig,
    ) -> Result<Self, LifecycleError> {
        Self::builder(application).config(config).build()
    }

    pub fn builder(application: Arc<dyn Application>) -> LifecycleManagerBuilder {
        LifecycleManagerBuilder {
            application,
            config: LifecycleConfig::default(),
            time_source: None,
            telemetry: None,
        }
    }

    // ========================================================================
    // TRANSITIONS
    // ========================================================================

    /// Request `Initialised -> Resumed`. Panics if the target is not `Initialised`.
    #[track_caller]
    pub fn resume(&self) {
        enforce(self.try_resume());
    }

    /// Request `Resumed -> Foregrounded`. Panics if the target is not `Resumed`.
    #[track_caller]
    pub fn foreground(&self) {
        enforce(self.try_foreground());
    }

    /// Request `Foregrounded -> Resumed`. Panics if the target is not `Foregrounded`.
    #[track_caller]
    pub fn background(&self) {
        enforce(self.try_background());
    }

    /// Request `Resumed -> Initialised`. Panics if the target is not `Resumed`.
    #[track_caller]
    pub fn suspend(&self) {
        enforce(self.try_suspend());
    }

    /// Forward to `Application::render` on the calling thread.
    ///
    /// Panics unless the target is `Resumed` or `Foregrounded`. The call is
    /// not serialised with the engine thread.
    #[track_caller]
    pub fn render(&self) {
        enforce(self.try_render());
    }

    pub fn try_resume(&self) -> Result<(), LifecycleError> {
        self.request(Transition::Resume)
    }

    pub fn try_foreground(&self) -> Result<(), LifecycleError> {
        self.request(Transition::Foreground)
    }

    pub fn try_background(&self) -> Result<(), LifecycleError> {
        self.request(Transition::Background)
    }

    pub fn try_suspend(&self) -> Result<(), LifecycleError> {
        self.request(Transition::Suspend)
    }

    pub fn try_render(&self) -> Result<(), LifecycleError> {
        let target = self.shared.target.load();
        if !target.is_active() {
            let err = LifecycleError::RenderWhileInactive { target };
            log_lifecycle_error(&err, "render");
            return Err(err);
        }

        self.application.render();
        Ok(())
    }

    // ========================================================================
    // OBSERVERS
    // ========================================================================

    /// State most recently committed by the engine thread. May run ahead of
    /// the hooks for that state, which execute after the commit.
    pub fn current_state(&self) -> LifecycleState {
        self.shared.current.load()
    }

    pub fn target_state(&self) -> LifecycleState {
        self.shared.target.load()
    }

    /// Number of completed `Application::update` calls.
    pub fn update_count(&self) -> u64 {
        self.shared.update_count.load(Ordering::SeqCst)
    }

    pub fn telemetry(&self) -> &Arc<LifecycleTelemetry> {
        &self.telemetry
    }

    fn request(&self, transition: Transition) -> Result<(), LifecycleError> {
        let expected = transition.precondition();
        let next = transition.next_target();

        self.shared
            .target
            .compare_exchange(expected, next)
            .map_err(|actual| {
                let err = LifecycleError::InvalidTransition {
                    transition,
                    expected,
                    actual,
                };
                log_lifecycle_error(&err, "request_transition");
                err
            })?;

        tracing::info!(
            "[LifecycleManager] {} requested: {} -> {}",
            transition,
            expected,
            next
        );
        self.telemetry.record(LifecycleEventKind::TransitionRequested {
            transition,
            from: expected,
            to: next,
        });
        self.shared.wake_engine();
        Ok(())
    }
}

#[track_caller]
fn enforce(result: Result<(), LifecycleError>) {
    if let Err(err) = result {
        panic!("{}", err);
    }
}

impl Drop for LifecycleManager {
    fn drop(&mut self) {
        let violation = self.request(Transition::Destroy).err();
        if let Some(err) = &violation {
            // The engine thread never outlives the manager. A jump to
            // Uninitialised plans Background, Suspend and Destroy in order.
            tracing::error!("[LifecycleManager] Forcing teardown: {}", err);
            self.shared.target.store(LifecycleState::Uninitialised);
            self.shared.wake_engine();
        }

        if let Some(handle) = self.engine_thread.take() {
            if handle.join().is_err() {
                let err = LifecycleError::EngineThreadPanicked {
                    phase: "run".to_string(),
                };
                log_lifecycle_error(&err, "drop");
            }
        }

        if let Some(err) = violation {
            if !thread::panicking() {
                panic!("{}", err);
            }
        }
    }
}

/// Configures and starts a [`LifecycleManager`].
pub struct LifecycleManagerBuilder {
    application: Arc<dyn Application>,
    config: LifecycleConfig,
    time_source: Option<Arc<dyn TimeSource>>,
    telemetry: Option<Arc<LifecycleTelemetry>>,
}

impl LifecycleManagerBuilder {
    pub fn config(mut self, config: LifecycleConfig) -> Self {
        self.config = config;
        self
    }

    /// Clock used for update deltas and running time.
    pub fn time_source(mut self, time_source: Arc<dyn TimeSource>) -> Self {
        self.time_source = Some(time_source);
        self
    }

    /// Share an existing collector instead of creating one from the config.
    pub fn telemetry(mut self, telemetry: Arc<LifecycleTelemetry>) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Spawn the engine thread and block until `Application::init` returns.
    pub fn build(self) -> Result<LifecycleManager, LifecycleError> {
        let shared = Arc::new(Shared::new());
        let telemetry = self
            .telemetry
            .unwrap_or_else(|| Arc::new(LifecycleTelemetry::from_config(&self.config.telemetry)));
        let time_source: Arc<dyn TimeSource> = match self.time_source {
            Some(time_source) => time_source,
            None => Arc::new(SystemTimeSource::default()),
        };

        let engine = EngineThread {
            application: Arc::clone(&self.application),
            shared: Arc::clone(&shared),
            telemetry: Arc::clone(&telemetry),
            time_source,
            frame_budget: self.config.frame_pacing.frame_budget(),
            current: LifecycleState::Uninitialised,
            init_time: None,
            last_update_time: None,
        };

        let thread_config = &self.config.engine_thread;
        if thread_config.name.contains('\0') {
            let err = LifecycleError::ThreadSpawnFailed {
                reason: format!("thread name {:?} contains a NUL byte", thread_config.name),
            };
            log_lifecycle_error(&err, "spawn_engine_thread");
            return Err(err);
        }
        let mut builder = thread::Builder::new().name(thread_config.name.clone());
        if let Some(stack_size) = thread_config.stack_size {
            builder = builder.stack_size(stack_size);
        }

        let handle = builder.spawn(move || engine.run()).map_err(|err| {
            let err = LifecycleError::from(err);
            log_lifecycle_error(&err, "spawn_engine_thread");
            err
        })?;

        if shared.init.wait() != InitStatus::Complete {
            // The thread has already unwound; joining only reaps it.
            let _ = handle.join();
            let err = LifecycleError::EngineThreadPanicked {
                phase: "init".to_string(),
            };
            log_lifecycle_error(&err, "build");
            return Err(err);
        }

        tracing::info!(
            "[LifecycleManager] Engine thread '{}' initialised",
            thread_config.name
        );

        Ok(LifecycleManager {
            application: self.application,
            shared,
            telemetry,
            engine_thread: Some(handle),
        })
    }
}

/// Reports an engine thread that unwinds instead of returning.
struct UnwindGuard {
    shared: Arc<Shared>,
    telemetry: Arc<LifecycleTelemetry>,
}

impl Drop for UnwindGuard {
    fn drop(&mut self) {
        if thread::panicking() {
            tracing::error!("[EngineThread] Application hook panicked, engine thread exiting");
            self.telemetry
                .record(LifecycleEventKind::EngineThreadPanicked);
            self.shared.init.resolve(InitStatus::Aborted);
        }
    }
}

/// Engine-thread half of the manager. Owns the current state and frame timing.
struct EngineThread {
    application: Arc<dyn Application>,
    shared: Arc<Shared>,
    telemetry: Arc<LifecycleTelemetry>,
    time_source: Arc<dyn TimeSource>,
    frame_budget: Option<Duration>,
    current: LifecycleState,
    init_time: Option<Instant>,
    last_update_time: Option<Instant>,
}

impl EngineThread {
    fn run(mut self) {
        let _unwind = UnwindGuard {
            shared: Arc::clone(&self.shared),
            telemetry: Arc::clone(&self.telemetry),
        };

        tracing::info!("[EngineThread] Thread started");
        self.telemetry
            .record(LifecycleEventKind::EngineThreadStarted);

        loop {
            self.block_if_inactive();

            let snapshot = self.shared.target.load();
            let plan = TransitionPlan::new(self.current, snapshot, self.shared.target.load());
            self.commit(snapshot);

            let frame_start = Instant::now();
            for hook in plan.hooks() {
                self.invoke(hook);
            }

            if plan.destroy {
                tracing::info!("[EngineThread] Destroyed, exiting");
                self.telemetry
                    .record(LifecycleEventKind::EngineThreadExited);
                return;
            }

            if plan.update {
                self.pace_frame(frame_start);
            }
        }
    }

    /// Sleep while there is nothing to apply and nothing to tick.
    fn block_if_inactive(&self) {
        let mut guard = lock(&self.shared.wake_lock);
        while self.is_inactive() {
            guard = self
                .shared
                .wake
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn is_inactive(&self) -> bool {
        self.shared.target.load() == self.current && self.current.is_idle()
    }

    fn commit(&mut self, snapshot: LifecycleState) {
        let previous = self.current;
        self.current = snapshot;
        self.shared.current.store(snapshot);

        if previous != snapshot {
            tracing::info!("[EngineThread] State {} -> {}", previous, snapshot);
            self.telemetry.record(LifecycleEventKind::StateCommitted {
                from: previous,
                to: snapshot,
            });
        }
    }

    fn invoke(&mut self, hook: Hook) {
        match hook {
            Hook::Init => {
                self.init_time = Some(self.time_source.now());
                self.application.init();
            }
            Hook::Resume => {
                self.last_update_time = Some(self.time_source.now());
                self.application.resume();
            }
            Hook::Foreground => self.application.foreground(),
            Hook::Update => {
                self.tick();
                return;
            }
            Hook::Background => self.application.background(),
            Hook::Suspend => self.application.suspend(),
            Hook::Destroy => self.application.destroy(),
            Hook::Render => {
                unreachable!("render runs on the caller's thread, TransitionPlan never yields it")
            }
        }

        tracing::debug!("[EngineThread] {} hook complete", hook);
        self.telemetry
            .record(LifecycleEventKind::HookInvoked { hook });

        if hook == Hook::Init {
            self.shared.init.resolve(InitStatus::Complete);
        }
    }

    fn tick(&mut self) {
        let now = self.time_source.now();
        let last_update = self.last_update_time.unwrap_or(now);
        let init_time = self.init_time.unwrap_or(now);

        let delta_seconds = now.saturating_duration_since(last_update).as_secs_f32();
        let total_seconds = now.saturating_duration_since(init_time).as_secs_f64();
        self.last_update_time = Some(now);

        self.application.update(delta_seconds, total_seconds);
        self.shared.update_count.fetch_add(1, Ordering::SeqCst);
    }

    /// Hold the engine thread for the rest of the frame budget, if capped.
    /// Any transition request ends the wait early.
    fn pace_frame(&self, frame_start: Instant) {
        let Some(budget) = self.frame_budget else {
            return;
        };
        // A budget past the end of `Instant`'s range waits for the next request.
        let deadline = frame_start.checked_add(budget);

        let mut guard = lock(&self.shared.wake_lock);
        loop {
            if self.shared.target.load() != self.current {
                return;
            }
            guard = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return;
                    }
                    self.shared
                        .wake
                        .wait_timeout(guard, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
                None => self
                    .shared
                    .wake
                    .wait(guard)
                    .unwrap_or_else(PoisonError::into_inner),
            };
        }
    }
}

#[cfg(test)]
mod tests;
