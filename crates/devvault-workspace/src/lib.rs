// ABOUTME: Workspace layer tying tabs, item editors, configuration and the doc cache together
// ABOUTME: Entry point for hosts embedding the DevVault tab and draft lifecycle

pub mod config;
pub mod doc_cache;
pub mod manager;

pub use config::{CONFIG_FILE_NAME, Config, config_dir};
pub use doc_cache::{CacheMetrics, DocCacheConfig, DocCacheKey, DocEntryCache};
pub use manager::WorkspaceManager;
