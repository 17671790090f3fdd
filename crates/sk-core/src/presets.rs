//! Named CSS presets
//!
//! Presets are independent of history. An empty registry seeds itself with
//! the built-in set on first access and persists that seed.

use crate::error::{PresetError, StyleError};
use crate::store::{PresetMap, PersistentStore, StorageBackend};

/// Built-in presets written on first run. Names match existing installs.
pub const BUILTIN_PRESETS: [(&str, &str); 6] = [
    ("默认", "font-family: \"Microsoft YaHei\", sans-serif; font-size: 16px;"),
    (
        "阅读模式",
        "font-family: \"Noto Serif SC\", serif; font-size: 18px; line-height: 1.8; color: #333; background-color: #f8f5f0;",
    ),
    ("代码模式", "font-family: \"Fira Code\", monospace; font-size: 14px; line-height: 1.5;"),
    (
        "舒适模式",
        "font-family: \"Open Sans\", sans-serif; font-size: 16px; line-height: 1.6; letter-spacing: 0.5px; color: #444;",
    ),
    (
        "护眼模式",
        "background-color: #f0f5e5 !important; color: #333 !important; font-size: 16px; line-height: 1.6;",
    ),
    (
        "暗黑模式",
        "background-color: #222 !important; color: #e0e0e0 !important; font-family: system-ui, -apple-system, sans-serif;",
    ),
];

pub fn builtin_presets() -> PresetMap {
    BUILTIN_PRESETS
        .iter()
        .map(|(name, css)| (name.to_string(), css.to_string()))
        .collect()
}

/// Registry view over the preset map of a store.
pub struct PresetRegistry<'a, B> {
    store: &'a mut PersistentStore<B>,
}

impl<'a, B: StorageBackend> PresetRegistry<'a, B> {
    pub fn new(store: &'a mut PersistentStore<B>) -> Self {
        Self { store }
    }

    /// All presets, seeding the built-in set when none exist.
    pub fn list(&mut self) -> Result<PresetMap, StyleError> {
        let presets = self.store.presets();
        if !presets.is_empty() {
            return Ok(presets);
        }

        let seed = builtin_presets();
        self.store.set_presets(&seed)?;
        log::debug!("Seeded {} built-in presets", seed.len());
        Ok(seed)
    }

    pub fn get(&mut self, name: &str) -> Result<String, StyleError> {
        let mut presets = self.list()?;
        presets
            .remove(name)
            .ok_or_else(|| PresetError::NotFound(name.to_string()).into())
    }

    /// Insert or overwrite `name`. Last write wins.
    pub fn save(&mut self, name: &str, css: &str) -> Result<(), StyleError> {
        let (name, css) = non_empty(name, css)?;
        let mut presets = self.list()?;
        presets.insert(name.to_string(), css.to_string());
        self.store.set_presets(&presets)?;
        Ok(())
    }

    /// Overwrite an existing preset.
    pub fn edit(&mut self, name: &str, css: &str) -> Result<(), StyleError> {
        let (name, css) = non_empty(name, css)?;
        let mut presets = self.list()?;
        match presets.get_mut(name) {
            Some(body) => *body = css.to_string(),
            None => return Err(PresetError::NotFound(name.to_string()).into()),
        }
        self.store.set_presets(&presets)?;
        Ok(())
    }

    pub fn delete(&mut self, name: &str) -> Result<(), StyleError> {
        let mut presets = self.list()?;
        if presets.remove(name).is_none() {
            return Err(PresetError::NotFound(name.to_string()).into());
        }
        self.store.set_presets(&presets)?;
        Ok(())
    }
}

fn non_empty<'s>(name: &'s str, css: &'s str) -> Result<(&'s str, &'s str), PresetError> {
    let (name, css) = (name.trim(), css.trim());
    if name.is_empty() || css.is_empty() {
        return Err(PresetError::EmptyField);
    }
    Ok((name, css))
}
