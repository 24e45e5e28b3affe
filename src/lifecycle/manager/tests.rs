use std::panic::{self, AssertUnwindSafe};
use std::sync::Mutex;

use super::*;
use crate::config::FramePacingConfig;
use crate::lifecycle::StubTimeSource;
use crate::testing::{wait_until, RecordingApplication};

const TIMEOUT: Duration = Duration::from_secs(2);

fn start() -> (Arc<RecordingApplication>, LifecycleManager) {
    let app = Arc::new(RecordingApplication::new());
    let manager = LifecycleManager::new(app.clone()).expect("engine thread starts");
    (app, manager)
}

fn wait_for_state(manager: &LifecycleManager, state: LifecycleState) {
    assert!(
        wait_until(TIMEOUT, || manager.current_state() == state),
        "engine never reached {state}, still {}",
        manager.current_state()
    );
}

fn wait_for_ticks(manager: &LifecycleManager, more_than: u64) {
    assert!(
        wait_until(TIMEOUT, || manager.update_count() > more_than),
        "update loop stalled at {} ticks",
        manager.update_count()
    );
}

#[test]
fn construction_returns_after_init() {
    let (app, manager) = start();

    assert_eq!(app.hooks(), vec![Hook::Init]);
    assert_eq!(manager.current_state(), LifecycleState::Initialised);
    assert_eq!(manager.target_state(), LifecycleState::Initialised);
}

#[test]
fn idle_engine_does_not_tick() {
    let (app, manager) = start();

    thread::sleep(Duration::from_millis(50));

    assert_eq!(manager.update_count(), 0);
    assert_eq!(app.hooks(), vec![Hook::Init]);
}

#[test]
fn resume_starts_update_loop() {
    let (app, manager) = start();

    manager.resume();
    wait_for_ticks(&manager, 0);

    let stats = app.update_stats();
    assert!(!stats.saw_negative_delta);
    assert!(!stats.saw_time_regression);
    assert_eq!(&app.hooks()[..3], &[Hook::Init, Hook::Resume, Hook::Update]);

    manager.suspend();
}

#[test]
#[should_panic(expected = "Cannot foreground")]
fn foreground_before_resume_panics() {
    let (_app, manager) = start();
    manager.foreground();
}

#[test]
#[should_panic(expected = "Cannot background")]
fn background_before_foreground_panics() {
    let (_app, manager) = start();
    manager.background();
}

#[test]
fn try_transition_out_of_order_leaves_target_untouched() {
    let (_app, manager) = start();

    let err = manager.try_foreground().unwrap_err();
    assert_eq!(
        err,
        LifecycleError::InvalidTransition {
            transition: Transition::Foreground,
            expected: LifecycleState::Resumed,
            actual: LifecycleState::Initialised,
        }
    );
    assert!(manager.try_background().is_err());
    assert!(manager.try_suspend().is_err());
    assert_eq!(manager.target_state(), LifecycleState::Initialised);

    manager.resume();
    manager.foreground();
    assert!(matches!(
        manager.try_suspend(),
        Err(LifecycleError::InvalidTransition {
            actual: LifecycleState::Foregrounded,
            ..
        })
    ));
    assert!(manager.try_resume().is_err());
    assert_eq!(manager.target_state(), LifecycleState::Foregrounded);

    manager.background();
    manager.suspend();
}

#[test]
#[should_panic(expected = "Cannot render")]
fn render_while_idle_panics() {
    let (_app, manager) = start();
    manager.render();
}

#[test]
fn render_forwards_while_active() {
    let (app, manager) = start();

    assert!(matches!(
        manager.try_render(),
        Err(LifecycleError::RenderWhileInactive {
            target: LifecycleState::Initialised
        })
    ));
    assert_eq!(app.render_count(), 0);

    manager.resume();
    manager.render();
    manager.foreground();
    manager.render();
    assert_eq!(app.render_count(), 2);

    manager.background();
    manager.suspend();
    assert!(manager.try_render().is_err());
    assert_eq!(app.render_count(), 2);
}

#[test]
fn suspend_stops_update_loop() {
    let (app, manager) = start();

    manager.resume();
    wait_for_ticks(&manager, 0);
    manager.suspend();

    assert!(wait_until(TIMEOUT, || app.count(Hook::Suspend) == 1));
    let ticks = manager.update_count();
    thread::sleep(Duration::from_millis(50));
    assert_eq!(manager.update_count(), ticks);
    assert_eq!(app.hooks().last(), Some(&Hook::Suspend));
}

#[test]
fn stub_clock_gives_fixed_deltas() {
    let app = Arc::new(RecordingApplication::new());
    let manager = LifecycleManager::builder(app.clone())
        .time_source(Arc::new(StubTimeSource::new()))
        .build()
        .unwrap();

    manager.resume();
    wait_for_ticks(&manager, 5);
    manager.suspend();
    assert!(wait_until(TIMEOUT, || app.count(Hook::Suspend) == 1));

    // init at 0ms, resume at 10ms, then one 10ms step per tick.
    let stats = app.update_stats();
    assert!((stats.last_delta_seconds - 0.01).abs() < 1e-6);
    let expected_total = 0.01 * (stats.count + 1) as f64;
    assert!((stats.last_total_seconds - expected_total).abs() < 1e-9);
}

#[test]
fn frame_cap_limits_tick_rate() {
    let app = Arc::new(RecordingApplication::new());
    let mut config = LifecycleConfig::default();
    config.frame_pacing = FramePacingConfig {
        max_updates_per_second: Some(100.0),
    };
    let manager = LifecycleManager::with_config(app.clone(), config).unwrap();

    manager.resume();
    thread::sleep(Duration::from_millis(200));
    manager.suspend();
    assert!(wait_until(TIMEOUT, || app.count(Hook::Suspend) == 1));

    let ticks = manager.update_count();
    assert!(ticks >= 1);
    assert!(ticks <= 40, "frame cap exceeded: {ticks} ticks in ~200ms");
}

#[test]
fn frame_cap_wait_is_cut_short_by_requests() {
    let app = Arc::new(RecordingApplication::new());
    let mut config = LifecycleConfig::default();
    config.frame_pacing.max_updates_per_second = Some(0.5);
    let manager = LifecycleManager::with_config(app.clone(), config).unwrap();

    manager.resume();
    wait_for_ticks(&manager, 0);

    let requested = Instant::now();
    manager.suspend();
    assert!(wait_until(TIMEOUT, || app.count(Hook::Suspend) == 1));
    assert!(requested.elapsed() < Duration::from_secs(1));
}

#[test]
fn committed_states_follow_the_state_order() {
    let app = Arc::new(RecordingApplication::new());
    let telemetry = Arc::new(LifecycleTelemetry::new(64, 64));
    let manager = LifecycleManager::builder(app.clone())
        .telemetry(Arc::clone(&telemetry))
        .build()
        .unwrap();

    manager.resume();
    wait_for_state(&manager, LifecycleState::Resumed);
    manager.foreground();
    wait_for_state(&manager, LifecycleState::Foregrounded);
    manager.background();
    wait_for_state(&manager, LifecycleState::Resumed);
    manager.suspend();
    wait_for_state(&manager, LifecycleState::Initialised);
    drop(manager);

    use LifecycleState::*;
    let committed: Vec<_> = telemetry
        .snapshot()
        .recent
        .into_iter()
        .filter_map(|event| match event.kind {
            LifecycleEventKind::StateCommitted { from, to } => Some((from, to)),
            _ => None,
        })
        .collect();
    assert_eq!(
        committed,
        vec![
            (Uninitialised, Initialised),
            (Initialised, Resumed),
            (Resumed, Foregrounded),
            (Foregrounded, Resumed),
            (Resumed, Initialised),
            (Initialised, Uninitialised),
        ]
    );

    let events = telemetry.snapshot().recent;
    assert_eq!(
        events.first().map(|e| &e.kind),
        Some(&LifecycleEventKind::EngineThreadStarted)
    );
    assert_eq!(
        events.last().map(|e| &e.kind),
        Some(&LifecycleEventKind::EngineThreadExited)
    );
}

#[test]
fn init_and_destroy_run_exactly_once() {
    let (app, manager) = start();

    manager.resume();
    wait_for_ticks(&manager, 0);
    manager.suspend();
    manager.resume();
    manager.suspend();
    drop(manager);

    assert_eq!(app.count(Hook::Init), 1);
    assert_eq!(app.count(Hook::Destroy), 1);
    assert_eq!(app.hooks().first(), Some(&Hook::Init));
    assert_eq!(app.hooks().last(), Some(&Hook::Destroy));
}

#[test]
fn init_panic_is_reported_to_the_constructor() {
    let app = Arc::new(RecordingApplication::panicking_on(Hook::Init));

    let result = LifecycleManager::new(app);

    assert!(matches!(
        result,
        Err(LifecycleError::EngineThreadPanicked { ref phase }) if phase == "init"
    ));
}

#[test]
fn drop_tolerates_an_engine_thread_that_already_exited() {
    let app = Arc::new(RecordingApplication::panicking_on(Hook::Update));
    let manager = LifecycleManager::new(app.clone()).unwrap();
    let mut events = manager.telemetry().subscribe();

    manager.resume();
    assert!(wait_until(TIMEOUT, || {
        matches!(
            events.try_recv(),
            Ok(event) if event.kind == LifecycleEventKind::EngineThreadPanicked
        )
    }));

    manager.suspend();
    drop(manager);
    assert_eq!(app.count(Hook::Destroy), 0);
}

struct ThreadNameProbe {
    seen: Mutex<Option<String>>,
}

impl Application for ThreadNameProbe {
    fn init(&self) {
        *self.seen.lock().unwrap() = thread::current().name().map(str::to_string);
    }
    fn resume(&self) {}
    fn foreground(&self) {}
    fn update(&self, _delta_seconds: f32, _total_seconds: f64) {}
    fn background(&self) {}
    fn suspend(&self) {}
    fn destroy(&self) {}
    fn render(&self) {}
}

#[test]
fn engine_thread_uses_configured_name() {
    let probe = Arc::new(ThreadNameProbe {
        seen: Mutex::new(None),
    });
    let mut config = LifecycleConfig::default();
    config.engine_thread.name = "game-loop".to_string();

    let manager = LifecycleManager::with_config(probe.clone(), config).unwrap();
    drop(manager);

    assert_eq!(probe.seen.lock().unwrap().as_deref(), Some("game-loop"));
}

#[test]
fn nul_in_thread_name_is_a_spawn_error() {
    let app = Arc::new(RecordingApplication::new());
    let mut config = LifecycleConfig::default();
    config.engine_thread.name = "eng\0ine".to_string();

    let result = LifecycleManager::with_config(app.clone(), config);

    assert!(matches!(
        result,
        Err(LifecycleError::ThreadSpawnFailed { .. })
    ));
    assert_eq!(app.count(Hook::Init), 0);
}

#[test]
fn unrepresentable_frame_budget_still_honours_requests() {
    let app = Arc::new(RecordingApplication::new());
    let mut config = LifecycleConfig::default();
    config.frame_pacing.max_updates_per_second = Some(1e-30);
    let manager = LifecycleManager::with_config(app.clone(), config).unwrap();

    manager.resume();
    wait_for_ticks(&manager, 0);
    manager.suspend();
    assert!(wait_until(TIMEOUT, || app.count(Hook::Suspend) == 1));
    assert_eq!(manager.update_count(), 1);
}

/// Drop a manager mid-lifecycle while the owning thread unwinds.
fn unwind_while(
    state: LifecycleState,
) -> (Arc<RecordingApplication>, Arc<LifecycleTelemetry>) {
    let app = Arc::new(RecordingApplication::new());
    let telemetry = Arc::new(LifecycleTelemetry::default());
    let unwound = panic::catch_unwind(AssertUnwindSafe(|| {
        let manager = LifecycleManager::builder(app.clone())
            .telemetry(Arc::clone(&telemetry))
            .build()
            .unwrap();
        manager.resume();
        if state == LifecycleState::Foregrounded {
            manager.foreground();
        }
        wait_for_state(&manager, state);
        wait_for_ticks(&manager, 0);
        panic!("caller failed while {state}");
    }));
    assert!(unwound.is_err());
    (app, telemetry)
}

#[test]
fn unwinding_drop_while_resumed_tears_down_engine_thread() {
    let (app, telemetry) = unwind_while(LifecycleState::Resumed);

    let hooks = app.hooks();
    assert_eq!(
        &hooks[hooks.len() - 3..],
        &[Hook::Update, Hook::Suspend, Hook::Destroy]
    );
    assert!(telemetry
        .snapshot()
        .recent
        .iter()
        .any(|event| event.kind == LifecycleEventKind::EngineThreadExited));

    let ticks = app.count(Hook::Update);
    thread::sleep(Duration::from_millis(50));
    assert_eq!(app.count(Hook::Update), ticks, "update ran after drop");
}

#[test]
fn unwinding_drop_while_foregrounded_runs_full_teardown() {
    let (app, _telemetry) = unwind_while(LifecycleState::Foregrounded);

    let hooks = app.hooks();
    assert_eq!(
        &hooks[hooks.len() - 3..],
        &[Hook::Background, Hook::Suspend, Hook::Destroy]
    );
    assert_eq!(app.count(Hook::Destroy), 1);
}
