//! Background-display port and the key/value property adapter.
//!
//! The host's background API is treated as unstable: every port method
//! returns `()`, and adapters log and swallow whatever the host throws at
//! them.

use super::composite::BackgroundProperties;
use crate::constants::{
    KEY_BACKGROUND_ANCHOR, KEY_BACKGROUND_FILL, KEY_BACKGROUND_IMAGE, KEY_BACKGROUND_OPACITY,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Host background-display mechanism.
///
/// `set_image`, `reset_to_defaults` and `repaint` must only be called on the
/// host's interactive thread.
pub trait BackgroundDisplay: Send + Sync {
    /// The composite property string currently stored by the host.
    fn current_composite(&self) -> Option<String>;

    /// Apply reconciled background properties.
    fn set_image(&self, properties: &BackgroundProperties);

    /// Keep the current image but restore opacity, fill and anchor defaults.
    fn reset_to_defaults(&self);

    /// Ask the host to repaint windows showing the background.
    fn repaint(&self);
}

/// Failure reported by a host property store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("property '{key}' unavailable: {reason}")]
pub struct PropertyStoreError {
    pub key: String,
    pub reason: String,
}

/// Host key/value property storage.
pub trait PropertyStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, PropertyStoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), PropertyStoreError>;
}

/// In-memory property store for tests and headless hosts.
#[derive(Debug, Default, Clone)]
pub struct MemoryPropertyStore {
    values: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryPropertyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a single value.
    pub fn value(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }
}

impl PropertyStore for MemoryPropertyStore {
    fn get(&self, key: &str) -> Result<Option<String>, PropertyStoreError> {
        Ok(self.values.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PropertyStoreError> {
        self.values.write().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

type RepaintHook = Arc<dyn Fn() + Send + Sync>;

/// [`BackgroundDisplay`] that writes the composite string and mirrors its
/// fields into the auxiliary keys the host settings UI reads.
pub struct PropertiesBackgroundDisplay<S: PropertyStore> {
    store: S,
    repaint_hook: Option<RepaintHook>,
}

impl<S: PropertyStore> PropertiesBackgroundDisplay<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            repaint_hook: None,
        }
    }

    /// Call `hook` whenever a repaint is requested.
    pub fn with_repaint_hook(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.repaint_hook = Some(Arc::new(hook));
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Auxiliary keys first, composite last: the composite is only replaced
    /// once every auxiliary key already matches it.
    fn write_all(&self, properties: &BackgroundProperties) -> Result<(), PartialWrite> {
        let opacity = properties.opacity_percent.to_string();
        let composite = properties.to_composite();
        let writes = [
            (KEY_BACKGROUND_OPACITY, opacity.as_str()),
            (KEY_BACKGROUND_FILL, properties.fill.as_str()),
            (KEY_BACKGROUND_ANCHOR, properties.anchor.as_str()),
            (KEY_BACKGROUND_IMAGE, composite.as_str()),
        ];

        for (done, (key, value)) in writes.iter().enumerate() {
            if let Err(error) = self.store.set(key, value) {
                return Err(PartialWrite {
                    written: writes[..done].iter().map(|(key, _)| *key).collect(),
                    error,
                });
            }
        }
        Ok(())
    }
}

/// A property write that stopped part way.
#[derive(Debug)]
struct PartialWrite {
    written: Vec<&'static str>,
    error: PropertyStoreError,
}

impl<S: PropertyStore> BackgroundDisplay for PropertiesBackgroundDisplay<S> {
    fn current_composite(&self) -> Option<String> {
        match self.store.get(KEY_BACKGROUND_IMAGE) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read background property; treating as absent");
                None
            }
        }
    }

    fn set_image(&self, properties: &BackgroundProperties) {
        match self.write_all(properties) {
            Ok(()) => tracing::info!(
                path = %properties.path,
                opacity = properties.opacity_percent,
                fill = %properties.fill,
                anchor = %properties.anchor,
                "Applied background image"
            ),
            Err(e) => tracing::warn!(
                error = %e.error,
                written = ?e.written,
                "Failed to apply background image; composite left unchanged"
            ),
        }
    }

    fn reset_to_defaults(&self) {
        let existing = self.current_composite();
        let properties = BackgroundProperties::parse(existing.as_deref()).reset();
        match self.write_all(&properties) {
            Ok(()) => tracing::info!("Background settings reset to defaults"),
            Err(e) => tracing::warn!(
                error = %e.error,
                written = ?e.written,
                "Failed to reset background settings; composite left unchanged"
            ),
        }
    }

    fn repaint(&self) {
        if let Some(hook) = &self.repaint_hook {
            hook();
        }
    }
}
