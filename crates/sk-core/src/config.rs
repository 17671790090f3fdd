//! Engine configuration
//!
//! Hosts pass a JSON object to override any subset of the defaults.

use std::time::Duration;

use serde::Deserialize;

use crate::types::DEFAULT_SELECTOR;

/// Reserved id of the managed style node.
pub const DEFAULT_STYLE_ID: &str = "custom-css-style";
/// History bound `H`.
pub const DEFAULT_MAX_HISTORY: usize = 20;
/// Debounce delay of the reapplication loop.
pub const DEFAULT_REAPPLY_DEBOUNCE_MS: u32 = 100;

/// Tunables of one engine instance.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct EngineConfig {
    pub style_id: String,
    pub max_history: usize,
    pub reapply_debounce_ms: u32,
    pub default_selector: String,
    /// Console log level used by the wasm logger ("error" .. "trace", "off").
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            style_id: DEFAULT_STYLE_ID.to_string(),
            max_history: DEFAULT_MAX_HISTORY,
            reapply_debounce_ms: DEFAULT_REAPPLY_DEBOUNCE_MS,
            default_selector: DEFAULT_SELECTOR.to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl EngineConfig {
    /// Parse a JSON configuration object, filling absent keys with defaults.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let config: Self = serde_json::from_str(text)?;
        Ok(config.normalized())
    }

    /// Clamp values that would break invariants.
    pub fn normalized(mut self) -> Self {
        if self.max_history == 0 {
            self.max_history = 1;
        }
        if self.style_id.trim().is_empty() {
            self.style_id = DEFAULT_STYLE_ID.to_string();
        }
        if self.default_selector.trim().is_empty() {
            self.default_selector = DEFAULT_SELECTOR.to_string();
        }
        self
    }

    pub fn reapply_debounce(&self) -> Duration {
        Duration::from_millis(u64::from(self.reapply_debounce_ms))
    }

    /// Parsed log level, `Info` when unrecognised.
    pub fn level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.style_id, "custom-css-style");
        assert_eq!(config.max_history, 20);
        assert_eq!(config.reapply_debounce(), Duration::from_millis(100));
        assert_eq!(config.default_selector, "*");
    }

    #[test]
    fn test_partial_json() {
        let config = EngineConfig::from_json(r#"{"maxHistory": 5, "logLevel": "debug"}"#).unwrap();
        assert_eq!(config.max_history, 5);
        assert_eq!(config.style_id, "custom-css-style");
        assert_eq!(config.level_filter(), log::LevelFilter::Debug);
    }

    #[test]
    fn test_rejects_unknown_keys() {
        assert!(EngineConfig::from_json(r#"{"maxHistroy": 5}"#).is_err());
    }

    #[test]
    fn test_zero_history_clamped() {
        let config = EngineConfig::from_json(r#"{"maxHistory": 0, "styleId": " "}"#).unwrap();
        assert_eq!(config.max_history, 1);
        assert_eq!(config.style_id, "custom-css-style");
    }
}
