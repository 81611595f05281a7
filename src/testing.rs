//! Browser-free page fixtures.
//!
//! `TestPage` parses an HTML snippet into a `PageSnapshot` and lets a test
//! lay out elements by their `id` attribute. Unplaced elements have no box
//! and therefore never paint.

use crate::core::{ClientRect, ComputedStyle, NodeId};
use crate::dom::{PageSnapshot, SnapshotNode};
use scraper::{ElementRef, Html, Node};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy)]
enum Placement {
    /// Page-absolute box that moves with scrolling.
    Flow(ClientRect),
    /// Viewport box that stays put when the page scrolls.
    Fixed(ClientRect),
}

#[derive(Debug, Clone)]
pub struct TestPage {
    nodes: Vec<SnapshotNode>,
    ids: HashMap<String, NodeId>,
    placements: HashMap<NodeId, Placement>,
    viewport: (f64, f64),
    scroll: (f64, f64),
}

impl TestPage {
    pub fn from_html(html: &str) -> Self {
        let document = Html::parse_document(html);
        let mut nodes = Vec::new();
        let mut ids = HashMap::new();
        let mut positions: HashMap<_, usize> = HashMap::new();

        for node_ref in document.root_element().descendants() {
            let Some(element) = ElementRef::wrap(node_ref) else {
                continue;
            };
            let parent = node_ref
                .parent()
                .and_then(|p| positions.get(&p.id()).copied());

            let mut node = SnapshotNode::new(element.value().name().to_ascii_uppercase(), parent);
            for (name, value) in element.value().attrs() {
                node.attributes.insert(name.to_string(), value.to_string());
            }
            node.has_click_handler = node.attributes.contains_key("onclick");
            node.text_before = text_run(node_ref.prev_siblings().map(|n| n.value()));
            node.trailing_text = text_run(
                node_ref
                    .last_child()
                    .into_iter()
                    .flat_map(|last| std::iter::once(last).chain(last.prev_siblings()))
                    .map(|n| n.value()),
            );
            node.offset_width = Some(0.0);
            node.offset_height = Some(0.0);

            let index = nodes.len();
            if let Some(id) = node.attributes.get("id") {
                ids.insert(id.clone(), NodeId(index));
            }
            positions.insert(node_ref.id(), index);
            nodes.push(node);
        }

        Self {
            nodes,
            ids,
            placements: HashMap::new(),
            viewport: (1600.0, 900.0),
            scroll: (0.0, 0.0),
        }
    }

    /// Handle of the element with the given `id` attribute.
    pub fn node(&self, id: &str) -> NodeId {
        *self
            .ids
            .get(id)
            .unwrap_or_else(|| panic!("test page has no element with id {:?}", id))
    }

    pub fn viewport(mut self, width: f64, height: f64) -> Self {
        self.viewport = (width, height);
        self
    }

    pub fn scrolled(mut self, x: f64, y: f64) -> Self {
        self.scroll = (x, y);
        self
    }

    /// Lay an element out at page-absolute coordinates.
    pub fn place(mut self, id: &str, left: f64, top: f64, width: f64, height: f64) -> Self {
        let node = self.node(id);
        self.placements
            .insert(node, Placement::Flow(ClientRect::new(left, top, width, height)));
        self
    }

    /// Lay an element out at viewport coordinates, like `position: fixed`.
    pub fn pin(mut self, id: &str, left: f64, top: f64, width: f64, height: f64) -> Self {
        let node = self.node(id);
        self.placements
            .insert(node, Placement::Fixed(ClientRect::new(left, top, width, height)));
        self
    }

    /// Place an element and give it a pointer cursor.
    pub fn clickable(self, id: &str, left: f64, top: f64, width: f64, height: f64) -> Self {
        self.place(id, left, top, width, height).cursor(id, "pointer")
    }

    pub fn cursor(self, id: &str, cursor: &str) -> Self {
        let cursor = cursor.to_string();
        self.style(id, move |s| s.cursor = cursor)
    }

    pub fn style(mut self, id: &str, update: impl FnOnce(&mut ComputedStyle)) -> Self {
        let node = self.node(id);
        update(&mut self.nodes[node.0].style);
        self
    }

    pub fn z_index(mut self, id: &str, z_index: i32) -> Self {
        let node = self.node(id);
        self.nodes[node.0].z_index = z_index;
        self
    }

    /// Give an element a script-assigned `onclick` handler.
    pub fn on_click(mut self, id: &str) -> Self {
        let node = self.node(id);
        self.nodes[node.0].has_click_handler = true;
        self
    }

    pub fn build(&self) -> PageSnapshot {
        let (scroll_x, scroll_y) = self.scroll;
        let mut nodes = self.nodes.clone();
        for (node, placement) in &self.placements {
            let rect = match *placement {
                Placement::Flow(rect) => {
                    ClientRect::new(rect.left - scroll_x, rect.top - scroll_y, rect.width, rect.height)
                }
                Placement::Fixed(rect) => rect,
            };
            let element = &mut nodes[node.0];
            element.rect = rect;
            element.client_rect_count = 1;
            element.offset_width = Some(rect.width);
            element.offset_height = Some(rect.height);
        }

        PageSnapshot::new(self.viewport.0, self.viewport.1, nodes)
            .expect("parsed nodes are in document order")
            .with_scroll(scroll_x, scroll_y)
    }
}

/// Text of the nodes walked backwards up to the first element.
fn text_run<'a>(nodes: impl Iterator<Item = &'a Node>) -> String {
    let mut parts: Vec<&str> = nodes
        .take_while(|n| !n.is_element())
        .filter_map(|n| n.as_text())
        .map(|text| &**text)
        .collect();
    parts.reverse();
    parts.concat()
}
