use crate::core::{Document, NodeId};

/// Tags that are explicit interactive controls.
pub const INTERACTIVE_TAGS: [&str; 5] = ["INPUT", "SELECT", "A", "BUTTON", "TEXTAREA"];

/// How the overlap resolver ranks an element against a competitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    /// A form control, link or button, or anything with a click handler.
    Interactive,
    Decorative,
}

impl Priority {
    pub fn classify<D: Document + ?Sized>(doc: &D, node: NodeId) -> Self {
        if INTERACTIVE_TAGS.contains(&doc.tag_name(node)) || doc.has_click_handler(node) {
            Priority::Interactive
        } else {
            Priority::Decorative
        }
    }

    pub fn is_interactive(self) -> bool {
        matches!(self, Priority::Interactive)
    }

    /// Whether a newcomer with this priority displaces `existing`.
    pub fn outranks(self, existing: Priority) -> bool {
        self.is_interactive() && !existing.is_interactive()
    }
}
