use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use engine_lifecycle::config::LifecycleConfig;
use engine_lifecycle::lifecycle::{Application, LifecycleManager};
use engine_lifecycle::logging::init_logging;

#[derive(Parser, Debug)]
#[command(
    name = "lifecycle_sim",
    about = "Drive a simulated application through a full platform lifecycle"
)]
struct Cli {
    /// JSON config file (defaults to assets/lifecycle_config.json)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Milliseconds spent resumed before and after the foreground phase
    #[arg(long, default_value_t = 250)]
    resumed_ms: u64,
    /// Milliseconds spent foregrounded
    #[arg(long, default_value_t = 500)]
    foreground_ms: u64,
    /// Cap on update ticks per second (overrides the config file)
    #[arg(long)]
    max_ups: Option<f32>,
    /// Render callback rate while active; 0 disables the render thread
    #[arg(long, default_value_t = 60)]
    render_hz: u32,
    /// Print the telemetry snapshot as JSON when done
    #[arg(long)]
    json: bool,
}

/// Stand-in for a game: counts ticks and frames.
#[derive(Default)]
struct SimulatedApplication {
    ticks: AtomicU64,
    frames: AtomicU64,
}

impl Application for SimulatedApplication {
    fn init(&self) {
        tracing::info!("[Sim] init");
    }

    fn resume(&self) {
        tracing::info!("[Sim] resume");
    }

    fn foreground(&self) {
        tracing::info!("[Sim] foreground");
    }

    fn update(&self, delta_seconds: f32, total_seconds: f64) {
        let tick = self.ticks.fetch_add(1, Ordering::Relaxed) + 1;
        if tick.is_power_of_two() {
            tracing::debug!(
                "[Sim] tick {} dt={:.6}s total={:.3}s",
                tick,
                delta_seconds,
                total_seconds
            );
        }
    }

    fn background(&self) {
        tracing::info!("[Sim] background");
    }

    fn suspend(&self) {
        tracing::info!("[Sim] suspend");
    }

    fn destroy(&self) {
        tracing::info!(
            "[Sim] destroy after {} ticks, {} frames",
            self.ticks.load(Ordering::Relaxed),
            self.frames.load(Ordering::Relaxed)
        );
    }

    fn render(&self) {
        self.frames.fetch_add(1, Ordering::Relaxed);
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => LifecycleConfig::load_from_file(path),
        None => LifecycleConfig::load(),
    };
    if cli.max_ups.is_some() {
        config.frame_pacing.max_updates_per_second = cli.max_ups;
    }
    init_logging(&config.logging);

    let app = Arc::new(SimulatedApplication::default());
    let manager = LifecycleManager::with_config(app.clone(), config)
        .context("failed to start engine thread")?;
    let telemetry = Arc::clone(manager.telemetry());

    let rendering = AtomicBool::new(false);
    thread::scope(|scope| {
        manager.resume();
        if cli.render_hz > 0 {
            rendering.store(true, Ordering::SeqCst);
            let frame = Duration::from_secs_f64(1.0 / cli.render_hz as f64);
            let manager = &manager;
            let rendering = &rendering;
            scope.spawn(move || {
                while rendering.load(Ordering::SeqCst) {
                    manager.render();
                    thread::sleep(frame);
                }
            });
        }

        thread::sleep(Duration::from_millis(cli.resumed_ms));
        manager.foreground();
        thread::sleep(Duration::from_millis(cli.foreground_ms));
        manager.background();
        thread::sleep(Duration::from_millis(cli.resumed_ms));

        // Rendering must stop before the suspend request.
        rendering.store(false, Ordering::SeqCst);
    });
    manager.suspend();

    let ticks = manager.update_count();
    drop(manager);

    println!(
        "ticks={} frames={}",
        ticks,
        app.frames.load(Ordering::Relaxed)
    );
    if cli.json {
        let snapshot = telemetry.snapshot();
        println!(
            "{}",
            serde_json::to_string_pretty(&snapshot).context("failed to encode telemetry")?
        );
    }

    Ok(ExitCode::SUCCESS)
}
