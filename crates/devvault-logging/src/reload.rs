// ABOUTME: Runtime log level reloading and configuration updates
// ABOUTME: Provides mechanism to update log filters without restarting the application

use anyhow::{Context, Result};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, Registry, reload};

use crate::config::LoggingConfig;
use crate::layers::create_env_filter;

/// Handle for updating log configuration at runtime
#[derive(Clone)]
pub struct LoggingReloadHandle {
    filter_handle: reload::Handle<EnvFilter, Registry>,
    current_config: Arc<RwLock<LoggingConfig>>,
}

impl LoggingReloadHandle {
    pub fn new(filter_handle: reload::Handle<EnvFilter, Registry>, config: LoggingConfig) -> Self {
        Self {
            filter_handle,
            current_config: Arc::new(RwLock::new(config)),
        }
    }

    pub fn update_log_level(&self, level: tracing::Level) -> Result<()> {
        self.apply(|config| config.level = level.into())?;
        tracing::info!(new_level = %level, "Log level updated at runtime");
        Ok(())
    }

    pub fn update_module_level(&self, module: &str, level: tracing::Level) -> Result<()> {
        self.apply(|config| {
            config
                .module_levels
                .insert(module.to_string(), level.into());
        })?;
        tracing::info!(module = %module, new_level = %level, "Module log level updated at runtime");
        Ok(())
    }

    /// Re-read levels from the environment, keeping the current outputs
    pub fn reload_from_env(&self) -> Result<()> {
        let mut from_env =
            LoggingConfig::from_env().context("Failed to load configuration from environment")?;
        self.apply(|config| {
            config.level = from_env.level;
            config.module_levels = std::mem::take(&mut from_env.module_levels);
        })?;

        let config = self.current_config();
        tracing::info!(
            level = %config.level.0,
            module_count = config.module_levels.len(),
            "Logging configuration reloaded from environment"
        );
        Ok(())
    }

    pub fn current_config(&self) -> LoggingConfig {
        self.current_config.read().clone()
    }

    /// Mutate a copy of the configuration and commit it only once the filter reloaded
    fn apply<F>(&self, change: F) -> Result<()>
    where
        F: FnOnce(&mut LoggingConfig),
    {
        let mut config = self.current_config.write();
        let mut next = config.clone();
        change(&mut next);

        let new_filter =
            create_env_filter(&next).context("Failed to create new environment filter")?;
        self.filter_handle
            .reload(new_filter)
            .context("Failed to reload log filter")?;

        *config = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    #[test]
    fn test_update_levels_through_detached_handle() {
        let config = LoggingConfig::default();
        let filter = create_env_filter(&config).unwrap();
        let (_layer, handle) = reload::Layer::<EnvFilter, Registry>::new(filter);
        let handle = LoggingReloadHandle::new(handle, config);

        // The layer is still alive, so reloading succeeds without a subscriber
        handle.update_log_level(Level::DEBUG).unwrap();
        handle
            .update_module_level("devvault_editor", Level::TRACE)
            .unwrap();

        let current = handle.current_config();
        assert_eq!(current.level.0, Level::DEBUG);
        assert_eq!(
            current.module_levels.get("devvault_editor").map(|l| l.0),
            Some(Level::TRACE)
        );
    }

    #[test]
    fn test_reload_fails_after_layer_dropped() {
        let config = LoggingConfig::default();
        let filter = create_env_filter(&config).unwrap();
        let (layer, handle) = reload::Layer::<EnvFilter, Registry>::new(filter);
        drop(layer);
        let handle = LoggingReloadHandle::new(handle, config);

        assert!(handle.update_log_level(Level::ERROR).is_err());
        assert_eq!(handle.current_config().level.0, Level::INFO);
    }
}
