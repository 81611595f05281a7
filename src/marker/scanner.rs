use super::resolver::{AcceptedSet, Resolution};
use super::{label, overlay};
use crate::core::{Document, MarkerConfig};
use crate::dom::{is_markable, xpath_of};
use crate::errors::{MarkerError, Result};
use crate::types::{FrameRef, MarkedElement};
use tracing::debug;

/// State of one marking pass.
///
/// A scanner is used once: `discover` sweeps the page and builds the
/// accepted set, `finalize` consumes the scanner and writes labels and
/// overlays. Run `cleanup::remove_overlays` between passes on the same
/// document, otherwise overlay ids collide.
pub struct Scanner<'a> {
    config: &'a MarkerConfig,
    accepted: AcceptedSet,
    base: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(config: &'a MarkerConfig) -> Self {
        Self::starting_at(config, 0)
    }

    /// A scanner whose ids start at `base`, for documents marked after
    /// others in the same page (frames).
    pub fn starting_at(config: &'a MarkerConfig, base: usize) -> Self {
        Self {
            config,
            accepted: AcceptedSet::new(),
            base,
        }
    }

    pub fn accepted(&self) -> &AcceptedSet {
        &self.accepted
    }

    /// Visit every element under `body` in document order and resolve each
    /// markable one against what has been accepted so far.
    pub fn discover<D: Document + ?Sized>(&mut self, doc: &D) -> Result<()> {
        if doc.body().is_none() {
            return Err(MarkerError::NoDocument);
        }

        let mut candidates = 0;
        let mut replaced = 0;
        for node in doc.body_elements() {
            if !is_markable(doc, node) {
                continue;
            }
            candidates += 1;
            if let Resolution::Replaced { .. } = self.accepted.offer(doc, node) {
                replaced += 1;
            }
        }

        debug!(
            candidates,
            replaced,
            accepted = self.accepted.len(),
            "discovery sweep finished"
        );
        Ok(())
    }

    /// Assign ids `base..base + N` in accepted order, then label, outline
    /// and describe each element.
    pub fn finalize<D: Document + ?Sized>(self, doc: &mut D) -> Vec<MarkedElement> {
        let Scanner {
            config,
            accepted,
            base,
        } = self;
        let nodes = accepted.into_nodes();

        // Paths are taken before any overlay joins the body so they do not
        // depend on the overlay nodes.
        let xpaths: Vec<String> = nodes.iter().map(|&node| xpath_of(&*doc, node)).collect();

        nodes
            .into_iter()
            .zip(xpaths)
            .enumerate()
            .map(|(offset, (node, xpath))| {
                let id = base + offset;
                let previous_label = label::relabel(doc, node, id);
                overlay::render(doc, node, id, config);
                MarkedElement {
                    id,
                    tag: doc.tag_name(node).to_string(),
                    class_name: doc.attribute(node, "class").unwrap_or_default(),
                    xpath,
                    html_snapshot: doc.outer_html(node),
                    previous_label,
                    frame: FrameRef::default(),
                    node,
                }
            })
            .collect()
    }

    pub fn run<D: Document + ?Sized>(mut self, doc: &mut D) -> Result<Vec<MarkedElement>> {
        self.discover(&*doc)?;
        Ok(self.finalize(doc))
    }
}

/// Run one complete marking pass over `doc`.
pub fn mark_elements<D: Document + ?Sized>(
    doc: &mut D,
    config: &MarkerConfig,
) -> Result<Vec<MarkedElement>> {
    Scanner::new(config).run(doc)
}
