use serde::{Deserialize, Serialize};

/// Handle to an element in a host document.
///
/// The handle owns nothing; it is only meaningful to the `Document` that
/// produced it and only for the duration of one marking pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Viewport-relative box, as reported by `getBoundingClientRect`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ClientRect {
    pub top: f64,
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
    pub width: f64,
    pub height: f64,
}

impl ClientRect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            right: left + width,
            bottom: top + height,
            width,
            height,
        }
    }

    /// Half-open containment, matching how hit-testing treats box edges.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.left && x < self.right && y >= self.top && y < self.bottom
    }
}

/// The subset of computed style the classifiers read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputedStyle {
    pub display: String,
    pub visibility: String,
    pub cursor: String,
    pub pointer_events: String,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: "block".to_string(),
            visibility: "visible".to_string(),
            cursor: "auto".to_string(),
            pointer_events: "auto".to_string(),
        }
    }
}

impl ComputedStyle {
    pub fn is_rendered(&self) -> bool {
        self.display != "none" && self.visibility != "hidden"
    }
}

/// A node the engine appends to the document body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayNode {
    pub element_id: String,
    pub text: Option<String>,
    /// Inline style declarations, in kebab-case, applied in order.
    pub style: Vec<(String, String)>,
}

impl OverlayNode {
    pub fn style_value(&self, property: &str) -> Option<&str> {
        self.style
            .iter()
            .find(|(name, _)| name == property)
            .map(|(_, value)| value.as_str())
    }
}

/// Narrow read/mutate capability over a document the engine does not own.
///
/// Reads cover layout, style and structure. Mutation is limited to attribute
/// writes, appending overlay nodes to the body and detaching nodes.
pub trait Document {
    /// The `body` element, or `None` when the context has no document body.
    fn body(&self) -> Option<NodeId>;

    /// Every element under `body`, in document order.
    fn body_elements(&self) -> Vec<NodeId>;

    /// The element's `tagName` (upper case for HTML elements).
    fn tag_name(&self, node: NodeId) -> &str;

    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str);

    fn parent_element(&self, node: NodeId) -> Option<NodeId>;

    fn previous_element_sibling(&self, node: NodeId) -> Option<NodeId>;

    fn next_element_sibling(&self, node: NodeId) -> Option<NodeId>;

    fn client_rect(&self, node: NodeId) -> ClientRect;

    fn client_rect_count(&self, node: NodeId) -> usize;

    /// `offsetWidth`/`offsetHeight`; `None` for elements without offsets (SVG).
    fn offset_size(&self, node: NodeId) -> Option<(f64, f64)>;

    fn computed_style(&self, node: NodeId) -> ComputedStyle;

    /// Whether the element's `onclick` property is neither null nor undefined.
    fn has_click_handler(&self, node: NodeId) -> bool;

    fn outer_html(&self, node: NodeId) -> String;

    /// Current `(scrollX, scrollY)`.
    fn scroll_offset(&self) -> (f64, f64);

    /// `documentElement.clientWidth` and `clientHeight`.
    fn viewport_size(&self) -> (f64, f64);

    /// Topmost element painting at a viewport-relative point.
    fn element_from_point(&self, x: f64, y: f64) -> Option<NodeId>;

    fn append_to_body(&mut self, overlay: OverlayNode) -> NodeId;

    fn detach(&mut self, node: NodeId);

    /// Inclusive ancestry, like `Node.contains`.
    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(candidate) = current {
            if candidate == ancestor {
                return true;
            }
            current = self.parent_element(candidate);
        }
        false
    }
}
