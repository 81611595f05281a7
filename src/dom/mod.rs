pub mod accessibility;
pub mod geometry;
pub mod snapshot;
pub mod visibility;
pub mod xpath;

pub use accessibility::{has_cursor_affordance, is_mouse_accessible};
pub use geometry::{adjusted_box, intersect, topmost_at, BoundingBox};
pub use snapshot::{HitProbe, Mutation, PageSnapshot, SnapshotNode};
pub use visibility::{is_in_viewport, is_visible};
pub use xpath::xpath_of;

use crate::core::{Document, NodeId};

/// Whether an element is a marking candidate on the page as it paints right now.
///
/// Nothing is cached between elements: hit-test results depend on the
/// coordinates asked about.
pub fn is_markable<D: Document + ?Sized>(doc: &D, node: NodeId) -> bool {
    is_in_viewport(doc, node)
        && is_visible(doc, node)
        && is_mouse_accessible(doc, node)
        && has_cursor_affordance(doc, node)
}
