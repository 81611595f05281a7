use super::geometry::{adjusted_box, topmost_at};
use crate::core::{Document, NodeId};

/// Boxes thinner than this are treated as unreachable by a pointer.
pub const MIN_ACCESSIBLE_SIZE: f64 = 2.0;

/// Cursors an element must show itself to count as operable.
pub const OWN_CURSORS: [&str; 3] = ["pointer", "hand", "text"];

/// Cursors accepted from whatever paints at the element's top-left corner.
/// Native form controls often report `auto` while still being operable.
pub const POINT_CURSORS: [&str; 4] = ["pointer", "auto", "hand", "text"];

/// Reachable by a pointer at any one of the four corners or the center.
///
/// A sample point counts when the topmost element there is the element
/// itself or one of its ancestors.
pub fn is_mouse_accessible<D: Document + ?Sized>(doc: &D, node: NodeId) -> bool {
    let bbox = adjusted_box(doc, node);
    if bbox.width < MIN_ACCESSIBLE_SIZE || bbox.height < MIN_ACCESSIBLE_SIZE {
        return false;
    }

    bbox.sample_points()
        .iter()
        .any(|&(x, y)| reachable_from(doc, node, x, y))
}

fn reachable_from<D: Document + ?Sized>(doc: &D, node: NodeId, x: f64, y: f64) -> bool {
    match topmost_at(doc, x, y) {
        Some(hit) => doc.contains(hit, node),
        None => false,
    }
}

/// The element's own cursor signals interactivity, and so does the cursor
/// of whatever paints at its top-left corner.
pub fn has_cursor_affordance<D: Document + ?Sized>(doc: &D, node: NodeId) -> bool {
    let own = doc.computed_style(node).cursor;
    if !OWN_CURSORS.contains(&own.as_str()) {
        return false;
    }

    let bbox = adjusted_box(doc, node);
    match topmost_at(doc, bbox.left, bbox.top) {
        Some(hit) => POINT_CURSORS.contains(&doc.computed_style(hit).cursor.as_str()),
        None => false,
    }
}
