//! Persistent key-value store
//!
//! The only component with durable state. Values are JSON text under a fixed
//! set of keys; the key names match existing installs so stored state
//! survives upgrades.

use std::collections::{BTreeMap, HashMap};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StorageError;
use crate::types::{HistoryEntry, StyleOverride, Theme, DEFAULT_SELECTOR};

/// Logical key names.
pub mod keys {
    pub const CURRENT_CSS: &str = "customCSS";
    pub const SELECTOR: &str = "cssSelector";
    pub const HISTORY: &str = "cssHistory";
    pub const PRESETS: &str = "cssPresets";
    pub const SITE_BINDINGS: &str = "siteCssConfig";
    pub const THEME: &str = "uiTheme";
}

/// Preset name -> CSS body.
pub type PresetMap = BTreeMap<String, String>;
/// Domain -> override bound to it.
pub type SiteBindingMap = BTreeMap<String, StyleOverride>;

// =============================================================================
// Backend
// =============================================================================

/// Synchronous key-value resource holding JSON text.
pub trait StorageBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// In-memory backend.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    values: HashMap<String, String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw JSON text stored under `key`.
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// =============================================================================
// Typed Store
// =============================================================================

/// Typed accessors over a [`StorageBackend`].
///
/// Reads never fail: an unreadable or undecodable value is logged and the
/// default is returned. Writes report backend failures.
#[derive(Debug)]
pub struct PersistentStore<B> {
    backend: B,
}

impl<B: StorageBackend> PersistentStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_inner(self) -> B {
        self.backend
    }

    /// Decode `key`, or `default` when absent or unusable.
    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let text = match self.backend.get(key) {
            Ok(Some(text)) => text,
            Ok(None) => return default,
            Err(e) => {
                log::warn!("{e}; using default");
                return default;
            }
        };

        match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Stored value for '{key}' is malformed ({e}); using default");
                default
            }
        }
    }

    /// Encode and write `value` under `key`.
    pub fn set<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<(), StorageError> {
        let text = serde_json::to_string(value).map_err(|e| StorageError::Encode {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        self.backend.set(key, &text)
    }

    pub fn current_css(&self) -> String {
        self.get(keys::CURRENT_CSS, String::new())
    }

    pub fn set_current_css(&mut self, css: &str) -> Result<(), StorageError> {
        self.set(keys::CURRENT_CSS, css)
    }

    pub fn selector(&self) -> String {
        self.get(keys::SELECTOR, DEFAULT_SELECTOR.to_string())
    }

    pub fn set_selector(&mut self, selector: &str) -> Result<(), StorageError> {
        self.set(keys::SELECTOR, selector)
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.get(keys::HISTORY, Vec::new())
    }

    pub fn set_history(&mut self, history: &[HistoryEntry]) -> Result<(), StorageError> {
        self.set(keys::HISTORY, history)
    }

    pub fn presets(&self) -> PresetMap {
        self.get(keys::PRESETS, PresetMap::new())
    }

    pub fn set_presets(&mut self, presets: &PresetMap) -> Result<(), StorageError> {
        self.set(keys::PRESETS, presets)
    }

    pub fn site_bindings(&self) -> SiteBindingMap {
        self.get(keys::SITE_BINDINGS, SiteBindingMap::new())
    }

    pub fn set_site_bindings(&mut self, bindings: &SiteBindingMap) -> Result<(), StorageError> {
        self.set(keys::SITE_BINDINGS, bindings)
    }

    pub fn theme(&self) -> Theme {
        self.get(keys::THEME, Theme::default())
    }

    pub fn set_theme(&mut self, theme: Theme) -> Result<(), StorageError> {
        self.set(keys::THEME, &theme)
    }
}
