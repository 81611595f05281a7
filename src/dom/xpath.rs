use crate::core::{Document, NodeId};

const BODY_PATH: &str = "/html/body";

/// Positional path from the document root to `node`.
///
/// Segments carry a `[n]` predicate only when a same-tag sibling makes one
/// necessary. Reaching `body` ends the walk with the fixed `/html/body` prefix.
pub fn xpath_of<D: Document + ?Sized>(doc: &D, node: NodeId) -> String {
    let mut path = String::new();
    let mut segments = Vec::new();
    let mut current = Some(node);

    while let Some(element) = current {
        if doc.tag_name(element).eq_ignore_ascii_case("BODY") {
            path.push_str(BODY_PATH);
            break;
        }
        segments.push(segment(doc, element));
        current = doc.parent_element(element);
    }

    for part in segments.iter().rev() {
        path.push('/');
        path.push_str(part);
    }
    path
}

fn segment<D: Document + ?Sized>(doc: &D, element: NodeId) -> String {
    let name = doc.tag_name(element);

    let mut index = 0;
    let mut sibling = doc.previous_element_sibling(element);
    while let Some(previous) = sibling {
        if doc.tag_name(previous) == name {
            index += 1;
        }
        sibling = doc.previous_element_sibling(previous);
    }

    let mut has_following = false;
    let mut sibling = doc.next_element_sibling(element);
    while let Some(next) = sibling {
        if doc.tag_name(next) == name {
            has_following = true;
            break;
        }
        sibling = doc.next_element_sibling(next);
    }

    let tag = name.to_ascii_lowercase();
    if index > 0 || has_following {
        format!("{}[{}]", tag, index + 1)
    } else {
        tag
    }
}
