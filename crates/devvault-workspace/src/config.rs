// ABOUTME: Workspace configuration loaded from devvault.toml in the user config directory
// ABOUTME: Missing files fall back to defaults; out-of-range values are logged and sanitized

use std::path::{Path, PathBuf};

use anyhow::Context;
use devvault_logging::{error, info, warn};
use devvault_types::{EditorConfig, WorkspaceConfig};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE_NAME: &str = "devvault.toml";

/// Longest autosave idle period accepted from the config file
pub const MAX_AUTOSAVE_DELAY_MS: u64 = 10_000;

const DEFAULT_AUTOSAVE_DELAY_MS: u64 = 500;
const DEFAULT_DOC_CACHE_MAX_ENTRIES: usize = 200;

/// Directory holding devvault.toml and the default log file
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("devvault")
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub editor: EditorConfig,

    #[serde(default)]
    pub workspace: WorkspaceConfig,
}

impl Config {
    /// Load configuration from the standard location
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from_dir(&config_dir())
    }

    /// Load configuration from a specific directory
    pub fn load_from_dir(dir: &Path) -> anyhow::Result<Self> {
        let path = dir.join(CONFIG_FILE_NAME);

        info!(
            config_dir = %dir.display(),
            config_path = %path.display(),
            config_exists = path.exists(),
            "Loading workspace configuration"
        );

        if !path.exists() {
            info!("No configuration file found, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = Self::parse(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        if let Err(validation_error) = config.validate() {
            error!(
                config_path = %path.display(),
                error = %validation_error,
                "Invalid workspace configuration, sanitizing"
            );
        }

        let config = config.sanitized();
        info!(
            autosave_enabled = config.editor.autosave_enabled,
            autosave_delay_ms = config.editor.autosave_delay_ms,
            doc_cache_ttl_secs = config.workspace.doc_cache_ttl_secs,
            doc_cache_max_entries = config.workspace.doc_cache_max_entries,
            "Loaded workspace configuration"
        );
        Ok(config)
    }

    pub fn parse(contents: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn validate(&self) -> Result<(), String> {
        let delay = self.editor.autosave_delay_ms;
        if delay == 0 {
            return Err("Autosave delay must be greater than 0".to_string());
        }
        if delay > MAX_AUTOSAVE_DELAY_MS {
            return Err(format!(
                "Autosave delay should not exceed {MAX_AUTOSAVE_DELAY_MS}ms"
            ));
        }
        if self.workspace.doc_cache_max_entries == 0 {
            return Err("Doc cache must hold at least one entry".to_string());
        }
        Ok(())
    }

    /// Copy with every value brought into range
    pub fn sanitized(&self) -> Self {
        let mut config = self.clone();

        if config.editor.autosave_delay_ms == 0 {
            warn!(
                "Invalid autosave delay 0, using default {}ms",
                DEFAULT_AUTOSAVE_DELAY_MS
            );
            config.editor.autosave_delay_ms = DEFAULT_AUTOSAVE_DELAY_MS;
        } else if config.editor.autosave_delay_ms > MAX_AUTOSAVE_DELAY_MS {
            warn!(
                original_delay = config.editor.autosave_delay_ms,
                "Autosave delay too high, capping at {}ms", MAX_AUTOSAVE_DELAY_MS
            );
            config.editor.autosave_delay_ms = MAX_AUTOSAVE_DELAY_MS;
        }

        if config.workspace.doc_cache_max_entries == 0 {
            warn!(
                "Invalid doc cache size 0, using default {}",
                DEFAULT_DOC_CACHE_MAX_ENTRIES
            );
            config.workspace.doc_cache_max_entries = DEFAULT_DOC_CACHE_MAX_ENTRIES;
        }

        config
    }
}
