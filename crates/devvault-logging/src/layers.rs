// ABOUTME: Layer builders for the different logging outputs
// ABOUTME: Console, rolling file and JSON layers plus the level filter they share

use anyhow::{Context, Result};
use std::fs;
use std::sync::OnceLock;
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    registry::LookupSpan,
};

use crate::config::{FileConfig, LoggingConfig, OutputConfig, Rotation};

/// Boxed layer usable on top of any span-tracking subscriber
pub type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

/// Keeps the non-blocking file writer flushing for the life of the process
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

pub fn create_console_layer<S>(config: &OutputConfig) -> Option<BoxedLayer<S>>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    if !config.console || config.json {
        return None;
    }

    let layer = if config.pretty_console {
        fmt::layer()
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .pretty()
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .compact()
            .boxed()
    };

    Some(layer)
}

/// Create a file output layer with rotation.
pub fn create_file_layer<S>(config: &FileConfig) -> Result<BoxedLayer<S>>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let directory = config
        .path
        .parent()
        .context("Log file path has no parent directory")?;

    fs::create_dir_all(directory).context(format!(
        "Failed to create log directory: {}",
        directory.display()
    ))?;

    let file_name = config
        .path
        .file_name()
        .and_then(|n| n.to_str())
        .context("Invalid log file path")?;

    let appender = match config.rotation {
        Rotation::Hourly => rolling::hourly(directory, file_name),
        Rotation::Daily => rolling::daily(directory, file_name),
        Rotation::Never => rolling::never(directory, file_name),
    };
    let (writer, guard) = non_blocking(appender);
    // A second initialization keeps the first guard; the new writer is never installed
    let _ = FILE_GUARD.set(guard);

    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
        .boxed();

    Ok(layer)
}

/// Create a JSON output layer for structured logging.
pub fn create_json_layer<S>(config: &OutputConfig) -> Option<BoxedLayer<S>>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    if !config.json {
        return None;
    }

    let layer = fmt::layer()
        .json()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_current_span(true)
        .boxed();

    Some(layer)
}

/// Build the level filter from the global level and per-module overrides.
pub fn create_env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let mut filter = EnvFilter::new(config.level.0.as_str());

    for (module, level) in &config.module_levels {
        filter = filter.add_directive(
            format!("{}={}", module, level.0)
                .parse()
                .context(format!("Invalid filter directive for module '{module}'"))?,
        );
    }

    Ok(filter)
}
