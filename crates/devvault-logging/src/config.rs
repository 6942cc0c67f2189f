// ABOUTME: Configuration structures and environment variable parsing for logging
// ABOUTME: Handles log levels, output targets, and log file location

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use tracing::Level;

/// Environment variable holding the global level, takes precedence over `RUST_LOG`
pub const LOG_ENV: &str = "DEVVAULT_LOG";
pub const LOG_JSON_ENV: &str = "DEVVAULT_LOG_JSON";
pub const LOG_NO_CONSOLE_ENV: &str = "DEVVAULT_LOG_NO_CONSOLE";
pub const LOG_NO_FILE_ENV: &str = "DEVVAULT_LOG_NO_FILE";

/// Wrapper for tracing::Level that implements Serialize/Deserialize
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogLevel(pub Level);

impl Serialize for LogLevel {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let level_str = match self.0 {
            Level::TRACE => "trace",
            Level::DEBUG => "debug",
            Level::INFO => "info",
            Level::WARN => "warn",
            Level::ERROR => "error",
        };
        serializer.serialize_str(level_str)
    }
}

impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D>(deserializer: D) -> Result<LogLevel, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let level = parse_log_level(&s).map_err(serde::de::Error::custom)?;
        Ok(LogLevel(level))
    }
}

impl From<Level> for LogLevel {
    fn from(level: Level) -> Self {
        LogLevel(level)
    }
}

impl From<LogLevel> for Level {
    fn from(log_level: LogLevel) -> Self {
        log_level.0
    }
}

/// Main configuration structure for the logging system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Global log level (trace, debug, info, warn, error)
    pub level: LogLevel,

    /// Per-module log level overrides
    pub module_levels: HashMap<String, LogLevel>,

    pub output: OutputConfig,

    pub file: FileConfig,
}

/// Which sinks receive events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub console: bool,

    pub file: bool,

    /// Emit newline-delimited JSON on stdout
    pub json: bool,

    /// Pretty-print console output (vs compact)
    pub pretty_console: bool,
}

/// How often the log file rolls over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rotation {
    Hourly,
    #[default]
    Daily,
    Never,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    /// Path to log file (defaults to `<config dir>/devvault/devvault.log`)
    pub path: PathBuf,

    pub rotation: Rotation,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel(Level::INFO),
            module_levels: HashMap::new(),
            output: OutputConfig::default(),
            file: FileConfig::default(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            console: true,
            file: true,
            json: false,
            pretty_console: false,
        }
    }
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            path: default_log_file_path(),
            rotation: Rotation::default(),
        }
    }
}

impl LoggingConfig {
    /// Create a new configuration with environment variable overrides.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply environment variable overrides to this configuration.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| env::var(key).ok())
    }

    /// Apply overrides using `lookup` in place of the process environment.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level_str) = lookup(LOG_ENV) {
            self.level = LogLevel(parse_log_level(&level_str).context("Invalid DEVVAULT_LOG level")?);
        } else if let Some(rust_log) = lookup("RUST_LOG") {
            // e.g. "debug" or "devvault_core=trace,info"
            self.parse_rust_log(&rust_log)?;
        }

        if lookup(LOG_JSON_ENV).is_some() {
            self.output.json = true;
        }

        if lookup(LOG_NO_CONSOLE_ENV).is_some() {
            self.output.console = false;
        }

        if lookup(LOG_NO_FILE_ENV).is_some() {
            self.output.file = false;
        }

        Ok(())
    }

    /// Parse RUST_LOG format environment variable.
    fn parse_rust_log(&mut self, rust_log: &str) -> Result<()> {
        for directive in rust_log.split(',') {
            let directive = directive.trim();
            if directive.is_empty() {
                continue;
            }

            if let Some((module, level_str)) = directive.split_once('=') {
                let level = parse_log_level(level_str).context(format!(
                    "Invalid log level '{level_str}' for module '{module}'"
                ))?;
                self.module_levels
                    .insert(module.to_string(), LogLevel(level));
            } else {
                self.level = LogLevel(
                    parse_log_level(directive)
                        .context(format!("Invalid global log level '{directive}'"))?,
                );
            }
        }
        Ok(())
    }
}

fn default_log_file_path() -> PathBuf {
    match dirs::config_dir() {
        Some(config_dir) => config_dir.join("devvault").join("devvault.log"),
        None => PathBuf::from("devvault.log"),
    }
}

/// Parse a log level string (case-insensitive).
fn parse_log_level(level_str: &str) -> Result<Level> {
    match level_str.trim().to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" | "warning" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
            level_str
        ),
    }
}
