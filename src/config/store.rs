//! Configuration store port and its implementations.

use super::{ConfigError, Configuration};
use crate::reload::{ChangeBroadcaster, ConfigurationChanged};
use parking_lot::RwLock;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::broadcast;

/// Host persistence for [`Configuration`].
///
/// `save` broadcasts the saved snapshot to subscribers.
pub trait ConfigStore: Send + Sync {
    fn load(&self) -> Result<Configuration, ConfigError>;
    fn save(&self, configuration: Configuration) -> Result<(), ConfigError>;
    fn subscribe(&self) -> broadcast::Receiver<ConfigurationChanged>;
}

/// Keeps the configuration in memory.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    current: RwLock<Configuration>,
    events: ChangeBroadcaster,
}

impl MemoryConfigStore {
    pub fn new(initial: Configuration) -> Self {
        Self {
            current: RwLock::new(initial.normalized()),
            events: ChangeBroadcaster::new(),
        }
    }
}

impl ConfigStore for MemoryConfigStore {
    fn load(&self) -> Result<Configuration, ConfigError> {
        Ok(self.current.read().clone())
    }

    fn save(&self, configuration: Configuration) -> Result<(), ConfigError> {
        let configuration = configuration.normalized();
        *self.current.write() = configuration.clone();
        self.events.publish(configuration);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<ConfigurationChanged> {
        self.events.subscribe()
    }
}

/// Persists the configuration as a YAML file.
///
/// A missing file loads as the default configuration.
#[derive(Debug)]
pub struct YamlConfigStore {
    path: PathBuf,
    events: ChangeBroadcaster,
}

impl YamlConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            events: ChangeBroadcaster::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_atomic(&self, yaml: &str) -> std::io::Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let mut staged = tempfile::NamedTempFile::new_in(&dir)?;
        staged.write_all(yaml.as_bytes())?;
        staged.as_file().sync_all()?;
        staged.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl ConfigStore for YamlConfigStore {
    fn load(&self) -> Result<Configuration, ConfigError> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "No configuration file; using defaults");
            return Ok(Configuration::default());
        }
        let configuration = Configuration::from_file(&self.path)?;
        tracing::debug!(
            path = %self.path.display(),
            enabled = configuration.enabled(),
            identifier_override = ?configuration.identifier_override(),
            font_family = ?configuration.font_family(),
            font_size_px = ?configuration.font_size_px(),
            "Configuration loaded"
        );
        Ok(configuration)
    }

    fn save(&self, configuration: Configuration) -> Result<(), ConfigError> {
        let configuration = configuration.normalized();
        let yaml = configuration.to_yaml()?;
        self.write_atomic(&yaml).map_err(|source| ConfigError::Write {
            path: self.path.clone(),
            source,
        })?;
        tracing::info!(path = %self.path.display(), "Configuration saved");
        self.events.publish(configuration);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<ConfigurationChanged> {
        self.events.subscribe()
    }
}
