use crate::core::{Document, NodeId};
use regex::Regex;
use std::sync::LazyLock;

/// Attribute that carries the persisted id token.
pub const ACCESSIBLE_NAME: &str = "aria-label";

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"item_id__(\d+)__").expect("token pattern is valid"));

/// The token embedded for `id`, e.g. `item_id__3__`.
pub fn token(id: usize) -> String {
    format!("item_id__{}__", id)
}

/// The id carried by a label, if it has a token.
pub fn parse_id(label: &str) -> Option<usize> {
    TOKEN
        .captures(label)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Remove a token and the whitespace around it, keeping the human-written
/// text on either side. Returns `None` when nothing but the token was there.
pub fn strip_token(label: &str) -> Option<String> {
    let preserved = match TOKEN.find(label) {
        Some(found) => {
            let before = label[..found.start()].trim_end();
            let after = label[found.end()..].trim_start();
            match (before.is_empty(), after.is_empty()) {
                (false, false) => format!("{} {}", before, after),
                (false, true) => before.to_string(),
                _ => after.to_string(),
            }
        }
        None => label.to_string(),
    };
    let preserved = preserved.trim();
    (!preserved.is_empty()).then(|| preserved.to_string())
}

/// Accessible name for an element with optional human text.
pub fn compose(preserved: Option<&str>, id: usize) -> String {
    match preserved {
        Some(text) => format!("{} {}", text, token(id)),
        None => token(id),
    }
}

/// Write the token for `id` onto `node`, replacing any earlier token.
/// Returns the human-written part of the previous label.
pub fn relabel<D: Document + ?Sized>(doc: &mut D, node: NodeId, id: usize) -> Option<String> {
    let preserved = doc
        .attribute(node, ACCESSIBLE_NAME)
        .and_then(|label| strip_token(&label));
    doc.set_attribute(node, ACCESSIBLE_NAME, &compose(preserved.as_deref(), id));
    preserved
}

/// Find the element currently labeled with `id`.
pub fn find_marked<D: Document + ?Sized>(doc: &D, id: usize) -> Option<NodeId> {
    doc.body_elements().into_iter().find(|&node| {
        doc.attribute(node, ACCESSIBLE_NAME)
            .and_then(|label| parse_id(&label))
            == Some(id)
    })
}
