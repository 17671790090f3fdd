//! Document, frame and page abstractions
//!
//! Browser handles are cheap, shared references with interior mutability, so
//! every method takes `&self` and documents are passed around by value.

use crate::error::DomError;

/// A document that can hold managed style nodes.
pub trait StyleDocument {
    /// Remove every style node carrying `id`. Returns how many were removed.
    fn remove_styles(&self, id: &str) -> Result<usize, DomError>;

    /// Append a style node with `id` and `text` to `<head>`, or to the root
    /// element when there is no head.
    fn append_style(&self, id: &str, text: &str) -> Result<(), DomError>;

    /// Insert `css` in a throwaway style node and remove it again.
    fn probe_stylesheet(&self, css: &str) -> Result<(), DomError>;
}

/// An embedded frame of the main document.
pub trait EmbeddedFrame {
    type Document: StyleDocument;

    /// Read the frame's location. Any error means the frame is not
    /// accessible from the page (cross-origin).
    fn probe_location(&self) -> Result<(), DomError>;

    /// The frame's own document, if it has one yet.
    fn content_document(&self) -> Result<Option<Self::Document>, DomError>;
}

/// The page the engine runs in.
pub trait Page {
    type Document: StyleDocument;
    type Frame: EmbeddedFrame;

    fn document(&self) -> Self::Document;

    /// Every embedded frame currently in the main document.
    fn frames(&self) -> Result<Vec<Self::Frame>, DomError>;

    /// Hostname of the page's location.
    fn hostname(&self) -> String;

    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> u64;
}

/// In-memory DOM used by the engine's tests.
#[cfg(test)]
pub(crate) mod fake {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use super::*;

    #[derive(Debug, Default)]
    struct DocumentState {
        /// (id, text, in_head) in insertion order
        styles: Vec<(String, String, bool)>,
        has_head: bool,
        fail_append: bool,
        fail_probe: bool,
    }

    #[derive(Debug, Clone)]
    pub struct FakeDocument(Rc<RefCell<DocumentState>>);

    impl Default for FakeDocument {
        fn default() -> Self {
            Self::new()
        }
    }

    impl FakeDocument {
        pub fn new() -> Self {
            Self(Rc::new(RefCell::new(DocumentState {
                has_head: true,
                ..DocumentState::default()
            })))
        }

        pub fn without_head() -> Self {
            let doc = Self::new();
            doc.0.borrow_mut().has_head = false;
            doc
        }

        pub fn set_fail_append(&self, fail: bool) {
            self.0.borrow_mut().fail_append = fail;
        }

        pub fn set_fail_probe(&self, fail: bool) {
            self.0.borrow_mut().fail_probe = fail;
        }

        /// Texts of the style nodes carrying `id`.
        pub fn styles(&self, id: &str) -> Vec<String> {
            self.0
                .borrow()
                .styles
                .iter()
                .filter(|(node_id, _, _)| node_id == id)
                .map(|(_, text, _)| text.clone())
                .collect()
        }

        /// Whether the style nodes carrying `id` live in `<head>`.
        pub fn styles_in_head(&self, id: &str) -> Vec<bool> {
            self.0
                .borrow()
                .styles
                .iter()
                .filter(|(node_id, _, _)| node_id == id)
                .map(|(_, _, in_head)| *in_head)
                .collect()
        }

        /// Simulate the page's own scripts stripping every style node.
        pub fn strip_styles(&self) {
            self.0.borrow_mut().styles.clear();
        }

        /// Simulate a page that ships a node with a colliding id.
        pub fn insert_foreign_style(&self, id: &str, text: &str) {
            self.0
                .borrow_mut()
                .styles
                .push((id.to_string(), text.to_string(), true));
        }
    }

    impl StyleDocument for FakeDocument {
        fn remove_styles(&self, id: &str) -> Result<usize, DomError> {
            let mut state = self.0.borrow_mut();
            let before = state.styles.len();
            state.styles.retain(|(node_id, _, _)| node_id != id);
            Ok(before - state.styles.len())
        }

        fn append_style(&self, id: &str, text: &str) -> Result<(), DomError> {
            let mut state = self.0.borrow_mut();
            if state.fail_append {
                return Err(DomError::op("appendChild", "HierarchyRequestError"));
            }
            let in_head = state.has_head;
            state.styles.push((id.to_string(), text.to_string(), in_head));
            Ok(())
        }

        fn probe_stylesheet(&self, _css: &str) -> Result<(), DomError> {
            if self.0.borrow().fail_probe {
                return Err(DomError::op("appendChild", "SyntaxError"));
            }
            Ok(())
        }
    }

    #[derive(Debug, Clone)]
    pub enum FakeFrame {
        SameOrigin(FakeDocument),
        CrossOrigin,
        /// Same-origin but not yet navigated / already detached
        NoDocument,
        /// Reading the document throws even though the location was readable
        Broken,
    }

    impl EmbeddedFrame for FakeFrame {
        type Document = FakeDocument;

        fn probe_location(&self) -> Result<(), DomError> {
            match self {
                Self::CrossOrigin => Err(DomError::op("location.href", "SecurityError")),
                _ => Ok(()),
            }
        }

        fn content_document(&self) -> Result<Option<FakeDocument>, DomError> {
            match self {
                Self::SameOrigin(doc) => Ok(Some(doc.clone())),
                Self::NoDocument => Ok(None),
                Self::Broken => Err(DomError::op("contentDocument", "InvalidStateError")),
                // Reading a cross-origin document is what the browser forbids
                Self::CrossOrigin => Err(DomError::CrossOrigin),
            }
        }
    }

    #[derive(Debug, Clone)]
    pub struct FakePage {
        pub document: FakeDocument,
        pub frames: Vec<FakeFrame>,
        pub hostname: String,
        pub clock: Rc<Cell<u64>>,
    }

    impl FakePage {
        pub fn new(hostname: &str) -> Self {
            Self {
                document: FakeDocument::new(),
                frames: Vec::new(),
                hostname: hostname.to_string(),
                clock: Rc::new(Cell::new(1_000)),
            }
        }

        pub fn with_frames(mut self, frames: Vec<FakeFrame>) -> Self {
            self.frames = frames;
            self
        }
    }

    impl Page for FakePage {
        type Document = FakeDocument;
        type Frame = FakeFrame;

        fn document(&self) -> FakeDocument {
            self.document.clone()
        }

        fn frames(&self) -> Result<Vec<FakeFrame>, DomError> {
            Ok(self.frames.clone())
        }

        fn hostname(&self) -> String {
            self.hostname.clone()
        }

        fn now_millis(&self) -> u64 {
            let now = self.clock.get();
            self.clock.set(now + 1);
            now
        }
    }
}
