use crate::core::{ClientRect, Document, NodeId};
use serde::{Deserialize, Serialize};

/// Box in page-absolute coordinates (viewport coordinates plus scroll).
///
/// Always derived fresh from the document; never kept across a scroll.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub top: f64,
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn from_client_rect(rect: &ClientRect, scroll: (f64, f64)) -> Self {
        let (scroll_x, scroll_y) = scroll;
        Self {
            top: rect.top + scroll_y,
            left: rect.left + scroll_x,
            right: rect.right + scroll_x,
            bottom: rect.bottom + scroll_y,
            width: rect.width,
            height: rect.height,
        }
    }

    /// Overlap of two boxes. Width or height come out negative when the
    /// boxes are disjoint, so check `has_area` before using the result.
    pub fn intersect(&self, other: &BoundingBox) -> BoundingBox {
        let top = self.top.max(other.top);
        let left = self.left.max(other.left);
        let right = self.right.min(other.right);
        let bottom = self.bottom.min(other.bottom);
        BoundingBox {
            top,
            left,
            right,
            bottom,
            width: right - left,
            height: bottom - top,
        }
    }

    /// Both dimensions strictly greater than `min`.
    pub fn has_area(&self, min: f64) -> bool {
        self.width > min && self.height > min
    }

    /// Whether this box covers at least `ratio` of both `other`'s width and height.
    pub fn covers(&self, other: &BoundingBox, ratio: f64) -> bool {
        let overlap = self.intersect(other);
        overlap.width >= ratio * other.width && overlap.height >= ratio * other.height
    }

    pub fn center(&self) -> (f64, f64) {
        (self.left + self.width / 2.0, self.top + self.height / 2.0)
    }

    /// The four corners followed by the center.
    pub fn sample_points(&self) -> [(f64, f64); 5] {
        [
            (self.left, self.top),
            (self.right, self.top),
            (self.left, self.bottom),
            (self.right, self.bottom),
            self.center(),
        ]
    }
}

pub fn adjusted_box<D: Document + ?Sized>(doc: &D, node: NodeId) -> BoundingBox {
    BoundingBox::from_client_rect(&doc.client_rect(node), doc.scroll_offset())
}

/// Topmost element at a page-absolute point.
pub fn topmost_at<D: Document + ?Sized>(doc: &D, x: f64, y: f64) -> Option<NodeId> {
    let (scroll_x, scroll_y) = doc.scroll_offset();
    doc.element_from_point(x - scroll_x, y - scroll_y)
}

pub fn intersect(a: &BoundingBox, b: &BoundingBox) -> BoundingBox {
    a.intersect(b)
}
