// ABOUTME: Configuration data types
// ABOUTME: Pure data structures for editor and workspace configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Editor save behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Persist edits automatically after an idle period
    #[serde(default = "default_true")]
    pub autosave_enabled: bool,

    /// Idle period before an autosave fires, in milliseconds
    #[serde(default = "default_autosave_delay_ms")]
    pub autosave_delay_ms: u64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            autosave_enabled: true,
            autosave_delay_ms: default_autosave_delay_ms(),
        }
    }
}

impl EditorConfig {
    pub fn autosave_delay(&self) -> Duration {
        Duration::from_millis(self.autosave_delay_ms)
    }
}

/// Workspace-level settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// How long a cached documentation page stays valid, in seconds
    #[serde(default = "default_doc_cache_ttl_secs")]
    pub doc_cache_ttl_secs: u64,

    /// Maximum number of cached documentation pages
    #[serde(default = "default_doc_cache_max_entries")]
    pub doc_cache_max_entries: usize,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            doc_cache_ttl_secs: default_doc_cache_ttl_secs(),
            doc_cache_max_entries: default_doc_cache_max_entries(),
        }
    }
}

impl WorkspaceConfig {
    pub fn doc_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.doc_cache_ttl_secs)
    }
}

fn default_true() -> bool {
    true
}

/// Default autosave idle period
fn default_autosave_delay_ms() -> u64 {
    500
}

fn default_doc_cache_ttl_secs() -> u64 {
    10 * 60
}

fn default_doc_cache_max_entries() -> usize {
    200
}
