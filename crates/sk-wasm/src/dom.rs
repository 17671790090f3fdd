//! Browser implementations of the engine's document abstractions

use sk_core::dom::{EmbeddedFrame, Page, StyleDocument};
use sk_core::DomError;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlIFrameElement, Node, Window};

pub(crate) fn js_error(operation: &'static str, error: JsValue) -> DomError {
    DomError::op(operation, format!("{:?}", error))
}

/// Attribute selector matching every element with `id`, including
/// duplicates a page may have created.
fn id_selector(id: &str) -> String {
    format!("[id=\"{}\"]", id.replace('\\', "\\\\").replace('"', "\\\""))
}

// =============================================================================
// Document
// =============================================================================

#[derive(Debug, Clone)]
pub struct WebDocument(pub Document);

impl WebDocument {
    /// `<head>`, or the root element when the document has none.
    fn container(&self) -> Result<Node, DomError> {
        if let Some(head) = self.0.head() {
            return Ok(head.into());
        }
        self.0
            .document_element()
            .map(Node::from)
            .ok_or(DomError::NoDocument)
    }

    fn create_style(&self, text: &str) -> Result<Element, DomError> {
        let style = self
            .0
            .create_element("style")
            .map_err(|e| js_error("createElement", e))?;
        style.set_text_content(Some(text));
        Ok(style)
    }
}

impl StyleDocument for WebDocument {
    fn remove_styles(&self, id: &str) -> Result<usize, DomError> {
        let nodes = self
            .0
            .query_selector_all(&id_selector(id))
            .map_err(|e| js_error("querySelectorAll", e))?;

        let mut removed = 0;
        for i in 0..nodes.length() {
            if let Some(element) = nodes.get(i).and_then(|n| n.dyn_into::<Element>().ok()) {
                element.remove();
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn append_style(&self, id: &str, text: &str) -> Result<(), DomError> {
        let style = self.create_style(text)?;
        style.set_id(id);
        self.container()?
            .append_child(&style)
            .map_err(|e| js_error("appendChild", e))?;
        Ok(())
    }

    fn probe_stylesheet(&self, css: &str) -> Result<(), DomError> {
        let probe = self.create_style(css)?;
        self.container()?
            .append_child(&probe)
            .map_err(|e| js_error("appendChild", e))?;
        probe.remove();
        Ok(())
    }
}

// =============================================================================
// Frames
// =============================================================================

#[derive(Debug, Clone)]
pub struct WebFrame(pub HtmlIFrameElement);

impl EmbeddedFrame for WebFrame {
    type Document = WebDocument;

    fn probe_location(&self) -> Result<(), DomError> {
        // A detached frame has no window; `content_document` reports it
        let Some(window) = self.0.content_window() else {
            return Ok(());
        };
        // Throws a SecurityError for cross-origin frames
        window
            .location()
            .href()
            .map(|_| ())
            .map_err(|_| DomError::CrossOrigin)
    }

    fn content_document(&self) -> Result<Option<WebDocument>, DomError> {
        Ok(self.0.content_document().map(WebDocument))
    }
}

// =============================================================================
// Page
// =============================================================================

#[derive(Debug, Clone)]
pub struct WebPage {
    pub window: Window,
    pub document: Document,
}

impl WebPage {
    /// The page of the current global scope.
    pub fn current() -> Result<Self, DomError> {
        let window = web_sys::window().ok_or(DomError::NoDocument)?;
        let document = window.document().ok_or(DomError::NoDocument)?;
        Ok(Self { window, document })
    }
}

impl Page for WebPage {
    type Document = WebDocument;
    type Frame = WebFrame;

    fn document(&self) -> WebDocument {
        WebDocument(self.document.clone())
    }

    fn frames(&self) -> Result<Vec<WebFrame>, DomError> {
        let nodes = self
            .document
            .query_selector_all("iframe")
            .map_err(|e| js_error("querySelectorAll", e))?;

        Ok((0..nodes.length())
            .filter_map(|i| nodes.get(i))
            .filter_map(|node| node.dyn_into::<HtmlIFrameElement>().ok())
            .map(WebFrame)
            .collect())
    }

    fn hostname(&self) -> String {
        self.window.location().hostname().unwrap_or_default()
    }

    fn now_millis(&self) -> u64 {
        js_sys::Date::now() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_selector_quotes() {
        assert_eq!(id_selector("custom-css-style"), "[id=\"custom-css-style\"]");
        assert_eq!(id_selector("a\"b"), "[id=\"a\\\"b\"]");
    }
}
