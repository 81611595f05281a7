use crate::core::NodeId;
use serde::{Deserialize, Serialize};

/// A same-origin document of the page: the top document has an empty path,
/// nested frames are reached through `window.frames[i]` at each step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRef {
    pub path: Vec<usize>,
    /// `window.name` of the frame, or its URL when unnamed.
    pub name: String,
}

impl FrameRef {
    pub fn top() -> Self {
        Self::default()
    }

    pub fn is_top(&self) -> bool {
        self.path.is_empty()
    }
}

/// One element the engine marked, as handed back to the controller.
///
/// `node` only makes sense inside the document the pass ran against and is
/// not serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkedElement {
    pub id: usize,
    pub tag: String,
    #[serde(rename = "class")]
    pub class_name: String,
    pub xpath: String,
    #[serde(rename = "html")]
    pub html_snapshot: String,
    /// Human-written accessible name found on the element, token removed.
    pub previous_label: Option<String>,
    /// Document the element lives in.
    #[serde(default)]
    pub frame: FrameRef,
    #[serde(skip)]
    pub node: NodeId,
}

/// Result of marking one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageMarks {
    pub url: String,
    pub title: String,
    pub pass_id: uuid::Uuid,
    pub captured_at: chrono::DateTime<chrono::Utc>,
    pub elements: Vec<MarkedElement>,
}

impl PageMarks {
    pub fn get(&self, id: usize) -> Option<&MarkedElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn find_by_tag(&self, tag: &str) -> Vec<&MarkedElement> {
        self.elements
            .iter()
            .filter(|e| e.tag.eq_ignore_ascii_case(tag))
            .collect()
    }
}
