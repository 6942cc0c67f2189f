// ABOUTME: Public API for devvault logging infrastructure using tokio-tracing
// ABOUTME: Provides centralized configuration and initialization for structured logging

pub mod config;
pub mod layers;
pub mod performance;
pub mod reload;
pub mod subscriber;


// Re-export tracing macros for convenience
pub use tracing::{Level, Span, debug, error, field, info, instrument, span, trace, warn};

use std::sync::OnceLock;

pub use config::LoggingConfig;
pub use performance::{DEFAULT_SLOW_THRESHOLD, PerfTimer, time_async};
pub use reload::LoggingReloadHandle;
pub use subscriber::{init_subscriber, init_subscriber_with_reload};

use anyhow::Result;

/// Global reload handle for runtime log level updates
static GLOBAL_RELOAD_HANDLE: OnceLock<LoggingReloadHandle> = OnceLock::new();

/// Initialize logging from the default configuration plus environment overrides.
pub fn init_logging() -> Result<()> {
    let config = LoggingConfig::from_env()?;
    init_subscriber(config)
}

/// Initialize logging with custom configuration.
pub fn init_logging_with_config(config: LoggingConfig) -> Result<()> {
    init_subscriber(config)
}

/// Initialize logging with hot-reload support using custom configuration.
///
/// The returned handle is also stored globally so [`update_log_level`] and
/// [`reload_from_env`] work from anywhere in the process.
pub fn init_logging_with_reload(config: LoggingConfig) -> Result<LoggingReloadHandle> {
    let handle = init_subscriber_with_reload(config)?;
    let _ = GLOBAL_RELOAD_HANDLE.set(handle.clone());
    Ok(handle)
}

/// Update log level at runtime using the global reload handle.
pub fn update_log_level(level: Level) -> Result<()> {
    match GLOBAL_RELOAD_HANDLE.get() {
        Some(handle) => handle.update_log_level(level),
        None => anyhow::bail!("Logging not initialized with reload support"),
    }
}

/// Update module-specific log level at runtime using the global reload handle.
pub fn update_module_level(module: &str, level: Level) -> Result<()> {
    match GLOBAL_RELOAD_HANDLE.get() {
        Some(handle) => handle.update_module_level(module, level),
        None => anyhow::bail!("Logging not initialized with reload support"),
    }
}

/// Reload configuration from environment variables using the global reload handle.
pub fn reload_from_env() -> Result<()> {
    match GLOBAL_RELOAD_HANDLE.get() {
        Some(handle) => handle.reload_from_env(),
        None => anyhow::bail!("Logging not initialized with reload support"),
    }
}
