//! Logging backend setup.
//!
//! Android routes `tracing` output to logcat; every other platform uses the
//! `tracing-subscriber` formatter on stderr. `log` records from the config and
//! error modules are bridged into the same subscriber.

use once_cell::sync::OnceCell;
use tracing::Level;

use crate::config::LoggingConfig;

static LOGGING: OnceCell<()> = OnceCell::new();

/// Install the platform logging backend. Later calls are no-ops, as is a call
/// made after the host already installed a global subscriber.
pub fn init_logging(config: &LoggingConfig) {
    LOGGING.get_or_init(|| {
        let level = parse_level(&config.level);
        install(level, config);
    });
}

fn parse_level(level: &str) -> Level {
    level.parse().unwrap_or(Level::INFO)
}

cfg_if::cfg_if! {
    if #[cfg(target_os = "android")] {
        fn install(level: Level, config: &LoggingConfig) {
            use tracing_subscriber::filter::LevelFilter;
            use tracing_subscriber::layer::SubscriberExt;
            use tracing_subscriber::util::SubscriberInitExt;

            match tracing_android::layer(&config.android_tag) {
                Ok(layer) => {
                    let _ = tracing_subscriber::registry()
                        .with(LevelFilter::from_level(level))
                        .with(layer)
                        .try_init();
                }
                Err(err) => {
                    eprintln!("[Logging] Failed to open logcat writer: {}", err);
                }
            }
        }
    } else {
        fn install(level: Level, _config: &LoggingConfig) {
            let _ = tracing_subscriber::fmt()
                .with_max_level(level)
                .with_thread_names(true)
                .try_init();
        }
    }
}
