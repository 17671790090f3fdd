//! Core type definitions for StyleKeeper
//!
//! These types are what the persistent store holds and what the export
//! document carries, so their serde shape is a compatibility surface.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Selector scope used when none is given.
pub const DEFAULT_SELECTOR: &str = "*";

fn default_selector() -> String {
    DEFAULT_SELECTOR.to_string()
}

// =============================================================================
// Style Override
// =============================================================================

/// One applied customization: sanitized CSS declarations and the selector
/// they are scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StyleOverride {
    pub css: String,
    #[serde(default = "default_selector")]
    pub selector: String,
}

impl StyleOverride {
    /// Build an override, substituting the default selector for a blank one.
    pub fn new(css: impl Into<String>, selector: impl Into<String>) -> Self {
        let selector = selector.into();
        let selector = if selector.trim().is_empty() {
            default_selector()
        } else {
            selector.trim().to_string()
        };
        Self {
            css: css.into(),
            selector,
        }
    }

    /// Render the single rule written into the managed style node.
    ///
    /// The shape is `"<selector> { <css> !important; }"`, kept verbatim even
    /// when `css` already ends with a semicolon.
    pub fn rule_text(&self) -> String {
        format!("{} {{ {} !important; }}", self.selector, self.css)
    }

    /// Whether there is anything to apply.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.css.is_empty()
    }
}

// =============================================================================
// History Entry
// =============================================================================

/// A recorded override with the time it was applied (ms since the epoch).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub style: StyleOverride,
    #[serde(rename = "timestamp")]
    #[ts(type = "number")]
    pub applied_at: u64,
}

// =============================================================================
// Theme
// =============================================================================

/// Theme of the management UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// The other theme.
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// Parse a stored or user-supplied theme name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }
}

// =============================================================================
// Mutation Kinds
// =============================================================================

bitflags::bitflags! {
    /// Which DOM mutations the reapplication loop subscribes to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MutationKinds: u8 {
        /// Child node additions and removals
        const CHILD_LIST = 1 << 0;
        /// Observe the whole subtree, not just direct children
        const SUBTREE = 1 << 1;
        /// Attribute changes
        const ATTRIBUTES = 1 << 2;
        /// Text node changes
        const CHARACTER_DATA = 1 << 3;

        /// Subscription used for the page body
        const BODY_WATCH = Self::CHILD_LIST.bits() | Self::SUBTREE.bits();
    }
}
