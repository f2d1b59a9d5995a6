//! Hot reload of breaker settings from the configuration file.
//!
//! # Responsibilities
//! - Watch the config file for writes
//! - Reload and validate it on change
//! - Push the resolved settings into every registered breaker
//!
//! A file that fails to load or validate is logged and ignored; breakers keep
//! the settings they already have.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::config::loader::{load_config, ConfigError};
use crate::resilience::registry::BreakerRegistry;

/// Keeps a registry's breakers in sync with a config file.
#[derive(Debug, Clone)]
pub struct ConfigWatcher {
    path: PathBuf,
    registry: BreakerRegistry,
}

impl ConfigWatcher {
    pub fn new(path: &Path, registry: BreakerRegistry) -> Self {
        Self {
            path: path.to_path_buf(),
            registry,
        }
    }

    /// Load the file and apply it to the registry.
    ///
    /// Returns how many breakers were reconfigured.
    pub fn reload(&self) -> Result<usize, ConfigError> {
        let config = load_config(&self.path)?;
        Ok(self.registry.apply_config(&config))
    }

    /// Start watching. Reloads happen on notify's thread; the returned
    /// watcher must be kept alive for as long as reloads are wanted.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let path = self.path.clone();
        let reloader = self;

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    match reloader.reload() {
                        Ok(updated) => tracing::info!(
                            path = ?reloader.path,
                            updated,
                            "Reloaded circuit breaker settings"
                        ),
                        Err(e) => tracing::error!(
                            path = ?reloader.path,
                            error = %e,
                            "Config reload failed. Keeping current breaker settings"
                        ),
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?path, "Config watcher started");
        Ok(watcher)
    }
}
