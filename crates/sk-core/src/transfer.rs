//! Export / import of the persisted state
//!
//! The export document is one JSON object. Import decodes the whole document
//! before writing anything, then upserts only the keys that are present.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

use crate::error::{StorageError, StyleError};
use crate::sanitize::sanitize;
use crate::store::{keys, PersistentStore, PresetMap, SiteBindingMap, StorageBackend};
use crate::types::{HistoryEntry, Theme};

/// Full persisted state. Absent keys are left untouched on import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ConfigDocument {
    #[serde(rename = "currentCSS", skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub current_css: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub presets: Option<PresetMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub history: Option<Vec<HistoryEntry>>,
    #[serde(rename = "siteSpecific", skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub site_bindings: Option<SiteBindingMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub theme: Option<Theme>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub selector: Option<String>,
}

impl ConfigDocument {
    /// Snapshot every key of `store`.
    pub fn capture<B: StorageBackend>(store: &PersistentStore<B>) -> Self {
        Self {
            current_css: Some(store.current_css()),
            presets: Some(store.presets()),
            history: Some(store.history()),
            site_bindings: Some(store.site_bindings()),
            theme: Some(store.theme()),
            selector: Some(store.selector()),
        }
    }

    /// Pretty-printed JSON (2-space indent).
    pub fn to_json(&self) -> String {
        // Every field is a string map, list or enum, so encoding cannot fail
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Decode an import payload. Anything but a well-typed JSON object fails.
    pub fn parse(text: &str) -> Result<Self, StyleError> {
        let value: Value = serde_json::from_str(text)?;
        if !value.is_object() {
            return Err(StyleError::MalformedImport(<serde_json::Error as serde::de::Error>::custom(
                "expected a JSON object",
            )));
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Upsert the present keys into `store`. CSS that lands in the current
    /// override, history or site bindings is sanitized on the way in;
    /// preset bodies are templates and are sanitized when applied.
    ///
    /// Returns the storage keys written.
    pub fn apply_to<B: StorageBackend>(
        self,
        store: &mut PersistentStore<B>,
    ) -> Result<Vec<&'static str>, StorageError> {
        let mut written = Vec::new();

        if let Some(css) = self.current_css {
            store.set_current_css(&sanitize(&css))?;
            written.push(keys::CURRENT_CSS);
        }
        if let Some(presets) = self.presets {
            store.set_presets(&presets)?;
            written.push(keys::PRESETS);
        }
        if let Some(mut history) = self.history {
            for entry in &mut history {
                entry.style.css = sanitize(&entry.style.css);
            }
            store.set_history(&history)?;
            written.push(keys::HISTORY);
        }
        if let Some(mut bindings) = self.site_bindings {
            for style in bindings.values_mut() {
                style.css = sanitize(&style.css);
            }
            store.set_site_bindings(&bindings)?;
            written.push(keys::SITE_BINDINGS);
        }
        if let Some(theme) = self.theme {
            store.set_theme(theme)?;
            written.push(keys::THEME);
        }
        if let Some(selector) = self.selector {
            store.set_selector(&selector)?;
            written.push(keys::SELECTOR);
        }

        Ok(written)
    }
}
