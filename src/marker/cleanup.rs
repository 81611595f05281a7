use super::overlay::is_overlay_id;
use crate::core::Document;
use tracing::debug;

/// Detach every border and badge left by an earlier pass.
///
/// Returns how many nodes were removed; zero when the page is clean.
/// Accessible-name tokens are left in place.
pub fn remove_overlays<D: Document + ?Sized>(doc: &mut D) -> usize {
    let overlays: Vec<_> = doc
        .body_elements()
        .into_iter()
        .filter(|&node| {
            doc.attribute(node, "id")
                .map(|id| is_overlay_id(&id))
                .unwrap_or(false)
        })
        .collect();

    for &node in &overlays {
        doc.detach(node);
    }

    if !overlays.is_empty() {
        debug!(removed = overlays.len(), "removed overlay nodes");
    }
    overlays.len()
}
