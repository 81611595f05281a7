use crate::core::{ClientRect, ComputedStyle, Document, NodeId, OverlayNode};
use crate::errors::{MarkerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Probe coordinates are matched on a 1/64 px grid.
const PROBE_SCALE: f64 = 64.0;

const VOID_ELEMENTS: [&str; 8] = ["area", "br", "col", "hr", "img", "input", "link", "meta"];

/// One element as captured from the page.
///
/// `parent` is an index into the snapshot's node list and always precedes
/// the node itself, since nodes are captured in document order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotNode {
    pub tag: String,
    pub parent: Option<usize>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub rect: ClientRect,
    #[serde(default)]
    pub client_rect_count: usize,
    #[serde(default)]
    pub offset_width: Option<f64>,
    #[serde(default)]
    pub offset_height: Option<f64>,
    #[serde(default)]
    pub style: ComputedStyle,
    #[serde(default)]
    pub z_index: i32,
    #[serde(default)]
    pub has_click_handler: bool,
    /// Text nodes between the previous element sibling and this element.
    #[serde(default)]
    pub text_before: String,
    /// Text nodes after the last element child.
    #[serde(default)]
    pub trailing_text: String,
    #[serde(default)]
    pub outer_html: Option<String>,
    #[serde(default)]
    pub detached: bool,
}

impl SnapshotNode {
    pub fn new(tag: impl Into<String>, parent: Option<usize>) -> Self {
        Self {
            tag: tag.into(),
            parent,
            attributes: BTreeMap::new(),
            rect: ClientRect::default(),
            client_rect_count: 0,
            offset_width: None,
            offset_height: None,
            style: ComputedStyle::default(),
            z_index: 0,
            has_click_handler: false,
            text_before: String::new(),
            trailing_text: String::new(),
            outer_html: None,
            detached: false,
        }
    }
}

/// Result of `elementFromPoint` recorded at capture time (viewport coordinates).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HitProbe {
    pub x: f64,
    pub y: f64,
    pub hit: Option<usize>,
}

/// A change made to the snapshot that still has to reach the live page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Mutation {
    SetAttribute {
        node: NodeId,
        name: String,
        value: String,
    },
    Append {
        node: NodeId,
        overlay: OverlayNode,
    },
    Detach {
        node: NodeId,
    },
}

/// In-memory `Document` built from a page capture.
///
/// Hit-tests are answered from the recorded probes when one matches the
/// point, and otherwise by paint order: highest `z_index`, then latest in
/// document order, among rendered nodes that accept pointer events.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageSnapshot {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub scroll_x: f64,
    #[serde(default)]
    pub scroll_y: f64,
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub nodes: Vec<SnapshotNode>,
    #[serde(default)]
    pub probes: Vec<HitProbe>,
    #[serde(skip)]
    probe_index: HashMap<(i64, i64), Option<NodeId>>,
    #[serde(skip)]
    mutations: Vec<Mutation>,
}

impl PageSnapshot {
    pub fn new(viewport_width: f64, viewport_height: f64, nodes: Vec<SnapshotNode>) -> Result<Self> {
        let snapshot = Self {
            viewport_width,
            viewport_height,
            nodes,
            ..Default::default()
        };
        snapshot.validate()?;
        Ok(snapshot)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let mut snapshot: PageSnapshot = serde_json::from_str(raw)?;
        snapshot.validate()?;
        snapshot.reindex_probes();
        Ok(snapshot)
    }

    pub fn with_scroll(mut self, scroll_x: f64, scroll_y: f64) -> Self {
        self.scroll_x = scroll_x;
        self.scroll_y = scroll_y;
        self
    }

    pub fn with_probes(mut self, probes: Vec<HitProbe>) -> Result<Self> {
        self.probes = probes;
        self.validate()?;
        self.reindex_probes();
        Ok(self)
    }

    pub fn node(&self, node: NodeId) -> Option<&SnapshotNode> {
        self.nodes.get(node.0)
    }

    /// Changes made since capture, in the order they were made.
    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    pub fn take_mutations(&mut self) -> Vec<Mutation> {
        std::mem::take(&mut self.mutations)
    }

    fn validate(&self) -> Result<()> {
        for (index, node) in self.nodes.iter().enumerate() {
            if let Some(parent) = node.parent {
                if parent >= index {
                    return Err(MarkerError::InvalidSnapshot(format!(
                        "node {} ({}) has parent {} which does not precede it",
                        index, node.tag, parent
                    )));
                }
            }
        }
        for probe in &self.probes {
            if let Some(hit) = probe.hit {
                if hit >= self.nodes.len() {
                    return Err(MarkerError::InvalidSnapshot(format!(
                        "probe at ({}, {}) hits unknown node {}",
                        probe.x, probe.y, hit
                    )));
                }
            }
        }
        Ok(())
    }

    fn reindex_probes(&mut self) {
        self.probe_index = self
            .probes
            .iter()
            .map(|probe| (probe_key(probe.x, probe.y), probe.hit.map(NodeId)))
            .collect();
    }

    fn is_live(&self, index: usize) -> bool {
        self.nodes.get(index).map(|n| !n.detached).unwrap_or(false)
    }

    fn paint_order_hit(&self, x: f64, y: f64) -> Option<NodeId> {
        if x < 0.0 || y < 0.0 || x >= self.viewport_width || y >= self.viewport_height {
            return None;
        }
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| {
                !node.detached
                    && node.style.is_rendered()
                    && node.style.pointer_events != "none"
                    && node.rect.contains_point(x, y)
            })
            .max_by_key(|(index, node)| (node.z_index, *index))
            .map(|(index, _)| NodeId(index))
    }

    fn write_markup(&self, index: usize, out: &mut String) {
        let node = &self.nodes[index];
        if let Some(captured) = &node.outer_html {
            out.push_str(captured);
            return;
        }

        let tag = node.tag.to_ascii_lowercase();
        out.push('<');
        out.push_str(&tag);
        for (name, value) in &node.attributes {
            out.push_str(&format!(" {}=\"{}\"", name, escape_attribute(value)));
        }
        out.push('>');
        if VOID_ELEMENTS.contains(&tag.as_str()) {
            return;
        }
        for child in (index + 1..self.nodes.len()).filter(|&i| self.nodes[i].parent == Some(index)) {
            out.push_str(&escape_text(&self.nodes[child].text_before));
            if self.is_live(child) {
                self.write_markup(child, out);
            }
        }
        out.push_str(&escape_text(&node.trailing_text));
        out.push_str(&format!("</{}>", tag));
    }
}

fn probe_key(x: f64, y: f64) -> (i64, i64) {
    ((x * PROBE_SCALE).round() as i64, (y * PROBE_SCALE).round() as i64)
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}

fn escape_text(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

impl Document for PageSnapshot {
    fn body(&self) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| !n.detached && n.tag.eq_ignore_ascii_case("BODY"))
            .map(NodeId)
    }

    fn body_elements(&self) -> Vec<NodeId> {
        let Some(body) = self.body() else {
            return Vec::new();
        };

        let mut in_body = vec![false; self.nodes.len()];
        let mut elements = Vec::new();
        for (index, node) in self.nodes.iter().enumerate().skip(body.0 + 1) {
            if node.detached {
                continue;
            }
            let under_body = match node.parent {
                Some(parent) => parent == body.0 || in_body[parent],
                None => false,
            };
            if under_body {
                in_body[index] = true;
                elements.push(NodeId(index));
            }
        }
        elements
    }

    fn tag_name(&self, node: NodeId) -> &str {
        &self.nodes[node.0].tag
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.nodes[node.0].attributes.get(name).cloned()
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        self.nodes[node.0]
            .attributes
            .insert(name.to_string(), value.to_string());
        self.mutations.push(Mutation::SetAttribute {
            node,
            name: name.to_string(),
            value: value.to_string(),
        });
    }

    fn parent_element(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent.map(NodeId)
    }

    fn previous_element_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.nodes[node.0].parent;
        (0..node.0)
            .rev()
            .find(|&i| self.is_live(i) && self.nodes[i].parent == parent)
            .map(NodeId)
    }

    fn next_element_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.nodes[node.0].parent;
        (node.0 + 1..self.nodes.len())
            .find(|&i| self.is_live(i) && self.nodes[i].parent == parent)
            .map(NodeId)
    }

    fn client_rect(&self, node: NodeId) -> ClientRect {
        self.nodes[node.0].rect
    }

    fn client_rect_count(&self, node: NodeId) -> usize {
        self.nodes[node.0].client_rect_count
    }

    fn offset_size(&self, node: NodeId) -> Option<(f64, f64)> {
        let node = &self.nodes[node.0];
        node.offset_width.zip(node.offset_height)
    }

    fn computed_style(&self, node: NodeId) -> ComputedStyle {
        self.nodes[node.0].style.clone()
    }

    fn has_click_handler(&self, node: NodeId) -> bool {
        self.nodes[node.0].has_click_handler
    }

    fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_markup(node.0, &mut out);
        out
    }

    fn scroll_offset(&self) -> (f64, f64) {
        (self.scroll_x, self.scroll_y)
    }

    fn viewport_size(&self) -> (f64, f64) {
        (self.viewport_width, self.viewport_height)
    }

    fn element_from_point(&self, x: f64, y: f64) -> Option<NodeId> {
        match self.probe_index.get(&probe_key(x, y)) {
            Some(Some(hit)) if self.is_live(hit.0) => Some(*hit),
            Some(None) => None,
            _ => self.paint_order_hit(x, y),
        }
    }

    fn append_to_body(&mut self, overlay: OverlayNode) -> NodeId {
        let node = NodeId(self.nodes.len());
        let mut element = SnapshotNode::new("DIV", self.body().map(|b| b.0));
        element
            .attributes
            .insert("id".to_string(), overlay.element_id.clone());
        element.style.pointer_events = overlay
            .style_value("pointer-events")
            .unwrap_or("auto")
            .to_string();
        element.z_index = overlay
            .style_value("z-index")
            .and_then(|z| z.parse().ok())
            .unwrap_or(0);
        element.outer_html = Some(format!(
            "<div id=\"{}\">{}</div>",
            escape_attribute(&overlay.element_id),
            overlay.text.as_deref().unwrap_or("")
        ));

        self.nodes.push(element);
        self.mutations.push(Mutation::Append { node, overlay });
        node
    }

    fn detach(&mut self, node: NodeId) {
        let mut gone = vec![false; self.nodes.len()];
        gone[node.0] = true;
        for index in node.0..self.nodes.len() {
            if let Some(parent) = self.nodes[index].parent {
                if parent >= node.0 && gone[parent] {
                    gone[index] = true;
                }
            }
            if gone[index] {
                self.nodes[index].detached = true;
            }
        }
        self.mutations.push(Mutation::Detach { node });
    }
}
