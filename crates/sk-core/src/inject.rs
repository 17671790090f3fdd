//! The managed style node
//!
//! A document holds at most one node carrying the reserved id. Applying an
//! override removes every existing node with that id before inserting the
//! new one, so repeated applies converge on the same DOM state.

use crate::dom::StyleDocument;
use crate::error::DomError;
use crate::types::StyleOverride;

/// Writes overrides into a single document.
#[derive(Debug, Clone)]
pub struct StyleInjector {
    style_id: String,
}

impl StyleInjector {
    pub fn new(style_id: impl Into<String>) -> Self {
        Self {
            style_id: style_id.into(),
        }
    }

    /// Replace the managed node of `doc` with one rendering `style`.
    pub fn apply<D: StyleDocument>(&self, doc: &D, style: &StyleOverride) -> Result<(), DomError> {
        let removed = doc.remove_styles(&self.style_id)?;
        if removed > 1 {
            log::debug!("Removed {removed} stale '{}' nodes", self.style_id);
        }
        doc.append_style(&self.style_id, &style.rule_text())
    }

    /// Remove the managed node of `doc`. Returns how many nodes went away.
    pub fn clear<D: StyleDocument>(&self, doc: &D) -> Result<usize, DomError> {
        doc.remove_styles(&self.style_id)
    }

    /// Whether the browser accepts `css` when test-inserted into `doc`.
    pub fn validate<D: StyleDocument>(&self, doc: &D, css: &str) -> Result<(), String> {
        if css.trim().is_empty() {
            return Err("CSS is empty".to_string());
        }
        doc.probe_stylesheet(css).map_err(|e| {
            log::error!("CSS validation failed: {e}");
            e.to_string()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::fake::FakeDocument;

    const ID: &str = "custom-css-style";

    #[test]
    fn test_apply_twice_leaves_one_node() {
        let doc = FakeDocument::new();
        let injector = StyleInjector::new(ID);
        let style = StyleOverride::new("color: red", "p");

        injector.apply(&doc, &style).unwrap();
        injector.apply(&doc, &style).unwrap();

        assert_eq!(doc.styles(ID), vec!["p { color: red !important; }".to_string()]);
    }

    #[test]
    fn test_apply_replaces_foreign_duplicates() {
        let doc = FakeDocument::new();
        doc.insert_foreign_style(ID, "a");
        doc.insert_foreign_style(ID, "b");
        doc.insert_foreign_style("other", "c");

        StyleInjector::new(ID)
            .apply(&doc, &StyleOverride::new("color: red", "*"))
            .unwrap();

        assert_eq!(doc.styles(ID).len(), 1);
        assert_eq!(doc.styles("other").len(), 1);
    }

    #[test]
    fn test_falls_back_to_root_without_head() {
        let doc = FakeDocument::without_head();
        StyleInjector::new(ID)
            .apply(&doc, &StyleOverride::new("color: red", "*"))
            .unwrap();
        assert_eq!(doc.styles_in_head(ID), vec![false]);
    }

    #[test]
    fn test_append_failure_surfaces() {
        let doc = FakeDocument::new();
        doc.set_fail_append(true);
        let err = StyleInjector::new(ID)
            .apply(&doc, &StyleOverride::new("color: red", "*"))
            .unwrap_err();
        assert!(matches!(err, DomError::Operation { operation: "appendChild", .. }));
    }

    #[test]
    fn test_validate() {
        let doc = FakeDocument::new();
        let injector = StyleInjector::new(ID);
        assert!(injector.validate(&doc, "color: red").is_ok());
        assert!(injector.validate(&doc, "   ").is_err());
        doc.set_fail_probe(true);
        assert!(injector.validate(&doc, "color: red").is_err());
    }
}
