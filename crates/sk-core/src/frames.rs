//! Mirroring the override into embedded frames
//!
//! Only frames whose location is readable from the page are touched.
//! Cross-origin frames are expected and skipped without complaint, and a
//! failure in one frame never stops the others.

use crate::dom::{EmbeddedFrame, Page};
use crate::error::DomError;
use crate::inject::StyleInjector;
use crate::types::StyleOverride;

/// What happened to each frame during one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PropagationReport {
    /// Same-origin frames whose document was updated
    pub updated: usize,
    /// Frames skipped as cross-origin
    pub cross_origin: usize,
    /// Same-origin frames without a usable document
    pub failed: usize,
}

/// Applies an injector to every reachable same-origin frame.
#[derive(Debug, Clone)]
pub struct FramePropagator {
    injector: StyleInjector,
}

impl FramePropagator {
    pub fn new(injector: StyleInjector) -> Self {
        Self { injector }
    }

    /// Write `style` into every same-origin frame of `page`.
    pub fn propagate<P: Page>(&self, page: &P, style: &StyleOverride) -> PropagationReport {
        self.for_each_frame(page, |doc| self.injector.apply(doc, style))
    }

    /// Remove the managed node from every same-origin frame of `page`.
    pub fn clear<P: Page>(&self, page: &P) -> PropagationReport {
        self.for_each_frame(page, |doc| self.injector.clear(doc).map(|_| ()))
    }

    fn for_each_frame<P, F>(&self, page: &P, mut action: F) -> PropagationReport
    where
        P: Page,
        F: FnMut(&<P::Frame as EmbeddedFrame>::Document) -> Result<(), DomError>,
    {
        let mut report = PropagationReport::default();

        let frames = match page.frames() {
            Ok(frames) => frames,
            Err(e) => {
                log::debug!("Frame enumeration failed: {e}");
                return report;
            }
        };

        for frame in &frames {
            if frame.probe_location().is_err() {
                report.cross_origin += 1;
                continue;
            }

            let outcome = match frame.content_document() {
                Ok(Some(doc)) => action(&doc),
                Ok(None) => Err(DomError::NoDocument),
                Err(e) => Err(e),
            };

            match outcome {
                Ok(()) => report.updated += 1,
                Err(e) => {
                    log::debug!("Skipping frame: {e}");
                    report.failed += 1;
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::fake::{FakeDocument, FakeFrame, FakePage};

    const ID: &str = "custom-css-style";

    fn propagator() -> FramePropagator {
        FramePropagator::new(StyleInjector::new(ID))
    }

    #[test]
    fn test_only_same_origin_frame_updated() {
        let same = FakeDocument::new();
        let page = FakePage::new("example.com")
            .with_frames(vec![FakeFrame::SameOrigin(same.clone()), FakeFrame::CrossOrigin]);

        let report = propagator().propagate(&page, &StyleOverride::new("color: red", "*"));

        assert_eq!(report, PropagationReport { updated: 1, cross_origin: 1, failed: 0 });
        assert_eq!(same.styles(ID), vec!["* { color: red !important; }".to_string()]);
        assert!(page.document.styles(ID).is_empty());
    }

    #[test]
    fn test_bad_frame_does_not_block_others() {
        let first = FakeDocument::new();
        let last = FakeDocument::new();
        let failing = FakeDocument::new();
        failing.set_fail_append(true);
        let page = FakePage::new("example.com").with_frames(vec![
            FakeFrame::SameOrigin(first.clone()),
            FakeFrame::Broken,
            FakeFrame::NoDocument,
            FakeFrame::SameOrigin(failing),
            FakeFrame::SameOrigin(last.clone()),
        ]);

        let report = propagator().propagate(&page, &StyleOverride::new("color: red", "*"));

        assert_eq!(report.updated, 2);
        assert_eq!(report.failed, 3);
        assert_eq!(first.styles(ID).len(), 1);
        assert_eq!(last.styles(ID).len(), 1);
    }

    #[test]
    fn test_repeat_and_clear() {
        let doc = FakeDocument::new();
        let page = FakePage::new("example.com").with_frames(vec![FakeFrame::SameOrigin(doc.clone())]);
        let propagator = propagator();

        propagator.propagate(&page, &StyleOverride::new("color: red", "*"));
        propagator.propagate(&page, &StyleOverride::new("color: blue", "*"));
        assert_eq!(doc.styles(ID), vec!["* { color: blue !important; }".to_string()]);

        propagator.clear(&page);
        assert!(doc.styles(ID).is_empty());
    }
}
