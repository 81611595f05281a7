use super::geometry::adjusted_box;
use crate::core::{Document, NodeId};

/// Laid out and painting: not `display: none`, not `visibility: hidden`,
/// non-zero offset size and at least one client rect.
pub fn is_visible<D: Document + ?Sized>(doc: &D, node: NodeId) -> bool {
    if !doc.computed_style(node).is_rendered() {
        return false;
    }
    if let Some((width, height)) = doc.offset_size(node) {
        if width == 0.0 || height == 0.0 {
            return false;
        }
    }
    doc.client_rect_count(node) > 0
}

/// The whole box lies inside `[scrollX, scrollX + width) x [scrollY, scrollY + height)`.
/// Partially visible elements are rejected.
pub fn is_in_viewport<D: Document + ?Sized>(doc: &D, node: NodeId) -> bool {
    let bbox = adjusted_box(doc, node);
    let (scroll_x, scroll_y) = doc.scroll_offset();
    let (width, height) = doc.viewport_size();
    bbox.bottom < height + scroll_y
        && bbox.right < width + scroll_x
        && bbox.top >= scroll_y
        && bbox.left >= scroll_x
}
