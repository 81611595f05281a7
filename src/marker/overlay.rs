use crate::core::{Document, MarkerConfig, NodeId, OverlayNode};
use crate::dom::{adjusted_box, topmost_at, BoundingBox};

pub const BORDER_PREFIX: &str = "item_id_border__";
pub const LABEL_PREFIX: &str = "item_id_label__";

/// Overlap with the occluder, in both dimensions, needed before clipping to it.
pub const MIN_CLIP_SIZE: f64 = 1.0;

pub fn border_id(id: usize) -> String {
    format!("{}{}", BORDER_PREFIX, id)
}

pub fn label_id(id: usize) -> String {
    format!("{}{}", LABEL_PREFIX, id)
}

/// Whether an element id belongs to a node this engine created.
pub fn is_overlay_id(element_id: &str) -> bool {
    element_id.starts_with(BORDER_PREFIX) || element_id.starts_with(LABEL_PREFIX)
}

/// The part of `node`'s box to outline.
///
/// When something else paints at the element's top-left corner, the outline
/// is limited to where the two boxes overlap, provided that overlap is more
/// than `MIN_CLIP_SIZE` in both dimensions.
pub fn visible_box<D: Document + ?Sized>(doc: &D, node: NodeId) -> BoundingBox {
    let bbox = adjusted_box(doc, node);
    match topmost_at(doc, bbox.left, bbox.top) {
        Some(top) if top != node => {
            let overlap = bbox.intersect(&adjusted_box(doc, top));
            if overlap.has_area(MIN_CLIP_SIZE) {
                overlap
            } else {
                bbox
            }
        }
        _ => bbox,
    }
}

fn px(value: f64) -> String {
    format!("{}px", value)
}

fn declarations(pairs: &[(&str, String)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

pub fn border_node(bbox: &BoundingBox, id: usize, config: &MarkerConfig) -> OverlayNode {
    let eps = config.border_epsilon;
    OverlayNode {
        element_id: border_id(id),
        text: None,
        style: declarations(&[
            ("position", "absolute".to_string()),
            (
                "border",
                format!("{} solid {}", px(config.border_width), config.border_color),
            ),
            ("width", px(bbox.width + eps)),
            ("height", px(bbox.height + eps)),
            ("left", px(bbox.left - eps)),
            ("top", px(bbox.top - eps)),
            ("z-index", config.border_z_index.to_string()),
            ("pointer-events", "none".to_string()),
        ]),
    }
}

/// Numeric badge near the top edge, shifted left but never past the page edge.
pub fn label_node(bbox: &BoundingBox, id: usize, config: &MarkerConfig) -> OverlayNode {
    let left = (bbox.left - config.label_left_offset).max(0.0);
    OverlayNode {
        element_id: label_id(id),
        text: Some(id.to_string()),
        style: declarations(&[
            ("position", "absolute".to_string()),
            ("color", config.label_color.clone()),
            ("background-color", config.label_background.clone()),
            ("font-size", config.label_font_size.clone()),
            ("padding", config.label_padding.clone()),
            ("z-index", config.label_z_index.to_string()),
            ("pointer-events", "none".to_string()),
            ("top", px(bbox.top + config.label_top_offset)),
            ("left", px(left)),
            ("opacity", config.label_opacity.clone()),
        ]),
    }
}

/// Append the border and badge for one marked element. Returns the box outlined.
pub fn render<D: Document + ?Sized>(
    doc: &mut D,
    node: NodeId,
    id: usize,
    config: &MarkerConfig,
) -> BoundingBox {
    let bbox = visible_box(doc, node);
    doc.append_to_body(border_node(&bbox, id, config));
    doc.append_to_body(label_node(&bbox, id, config));
    bbox
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestPage;

    #[test]
    fn overlay_ids_are_reserved() {
        assert!(is_overlay_id(&border_id(3)));
        assert!(is_overlay_id(&label_id(12)));
        assert!(!is_overlay_id("item_id__3__"));
        assert!(!is_overlay_id("main"));
    }

    #[test]
    fn border_is_outset_by_epsilon() {
        let page = TestPage::from_html(r#"<a id="a" href="/"></a>"#).place("a", 100.0, 50.0, 80.0, 20.0);
        let doc = page.build();
        let bbox = visible_box(&doc, page.node("a"));
        let border = border_node(&bbox, 0, &MarkerConfig::default());

        assert_eq!(border.element_id, "item_id_border__0");
        assert_eq!(border.style_value("left"), Some("98px"));
        assert_eq!(border.style_value("top"), Some("48px"));
        assert_eq!(border.style_value("width"), Some("82px"));
        assert_eq!(border.style_value("height"), Some("22px"));
        assert_eq!(border.style_value("border"), Some("2px solid green"));
        assert_eq!(border.style_value("pointer-events"), Some("none"));
    }

    #[test]
    fn label_never_leaves_the_page() {
        let page = TestPage::from_html(r#"<a id="a" href="/"></a><a id="b" href="/"></a>"#)
            .place("a", 4.0, 10.0, 80.0, 20.0)
            .place("b", 300.0, 10.0, 80.0, 20.0);
        let doc = page.build();
        let config = MarkerConfig::default();

        let left_edge = label_node(&visible_box(&doc, page.node("a")), 0, &config);
        assert_eq!(left_edge.style_value("left"), Some("0px"));
        assert_eq!(left_edge.style_value("top"), Some("12px"));
        assert_eq!(left_edge.text.as_deref(), Some("0"));

        let inside = label_node(&visible_box(&doc, page.node("b")), 1, &config);
        assert_eq!(inside.style_value("left"), Some("284px"));
    }

    #[test]
    fn outline_is_clipped_to_the_occluder() {
        let page = TestPage::from_html(r#"<input id="field"><div id="header"></div>"#)
            .place("field", 100.0, 100.0, 200.0, 50.0)
            .place("header", 0.0, 0.0, 1000.0, 120.0);
        let doc = page.build();
        let bbox = visible_box(&doc, page.node("field"));
        assert_eq!((bbox.left, bbox.top, bbox.right, bbox.bottom), (100.0, 100.0, 300.0, 120.0));
    }

    #[test]
    fn thin_overlap_does_not_clip() {
        let page = TestPage::from_html(r#"<input id="field"><div id="rule"></div>"#)
            .place("field", 100.0, 100.0, 200.0, 50.0)
            .place("rule", 0.0, 100.0, 1000.0, 1.0);
        let doc = page.build();
        let bbox = visible_box(&doc, page.node("field"));
        assert_eq!(bbox.height, 50.0);
    }

    #[test]
    fn render_appends_border_then_label() {
        let page = TestPage::from_html(r#"<button id="b">go</button>"#).place("b", 10.0, 10.0, 40.0, 20.0);
        let mut doc = page.build();
        render(&mut doc, page.node("b"), 7, &MarkerConfig::default());

        let ids: Vec<String> = doc
            .body_elements()
            .into_iter()
            .filter_map(|n| doc.attribute(n, "id"))
            .collect();
        assert_eq!(ids, vec!["b", "item_id_border__7", "item_id_label__7"]);
    }
}
