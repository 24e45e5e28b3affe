//! Configuration for the lifecycle core
//!
//! Runtime configuration loaded from JSON so thread naming, frame pacing,
//! telemetry buffering, and log levels can be tuned per platform without
//! recompilation. Every field has a default; a partial file is valid.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Complete lifecycle configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    pub engine_thread: EngineThreadConfig,
    pub frame_pacing: FramePacingConfig,
    pub telemetry: TelemetryConfig,
    pub logging: LoggingConfig,
}

/// Engine thread spawn parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineThreadConfig {
    /// Thread name shown in debuggers and panic messages
    pub name: String,
    /// Stack size in bytes (platform default when unset)
    pub stack_size: Option<usize>,
}

impl Default for EngineThreadConfig {
    fn default() -> Self {
        Self {
            name: "engine".to_string(),
            stack_size: None,
        }
    }
}

/// Update loop pacing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FramePacingConfig {
    /// Upper bound on update ticks per second. Unset means the update loop
    /// runs back to back with no throttling.
    pub max_updates_per_second: Option<f32>,
}

impl FramePacingConfig {
    /// Minimum time between update ticks, if capped.
    ///
    /// Rates too small for the budget to fit in a `Duration` saturate to
    /// `Duration::MAX`.
    pub fn frame_budget(&self) -> Option<Duration> {
        self.max_updates_per_second
            .filter(|rate| rate.is_finite() && *rate > 0.0)
            .map(|rate| {
                Duration::try_from_secs_f64(1.0 / rate as f64).unwrap_or(Duration::MAX)
            })
    }
}

/// Telemetry buffering
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Broadcast channel capacity before slow subscribers lag
    pub channel_capacity: usize,
    /// Number of events retained for snapshots
    pub history_capacity: usize,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 128,
            history_capacity: 64,
        }
    }
}

/// Logging backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Maximum level: trace, debug, info, warn or error
    pub level: String,
    /// Logcat tag on Android
    pub android_tag: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            android_tag: "EngineLifecycle".to_string(),
        }
    }
}

impl LifecycleConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The parsed configuration, or the defaults if the file is missing or
    /// the JSON is invalid.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load configuration on Android
    ///
    /// Bundled assets live behind the AssetManager, which this crate does not
    /// reach; the host passes overrides through `LifecycleManager::builder`.
    #[cfg(target_os = "android")]
    pub fn load() -> Self {
        log::info!("[Config] Using default configuration on Android");
        Self::default()
    }

    /// Load configuration for non-Android platforms
    #[cfg(not(target_os = "android"))]
    pub fn load() -> Self {
        Self::load_from_file("assets/lifecycle_config.json")
    }
}
