use super::priority::Priority;
use crate::core::{Document, NodeId};
use crate::dom::adjusted_box;
use tracing::debug;

/// Share of width and height one box must cover for two elements to conflict.
pub const COVERAGE_RATIO: f64 = 0.9;

#[derive(Debug, Clone, Copy)]
struct Accepted {
    node: NodeId,
    priority: Priority,
}

/// What happened to a candidate offered to the accepted set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Appended,
    Replaced { evicted: NodeId },
    Discarded { kept: NodeId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Conflict {
    Containment,
    Intersection,
}

/// Elements accepted so far in a pass, in acceptance order.
///
/// No member is an ancestor of another, and no member's box covers another's
/// by `COVERAGE_RATIO` in both dimensions.
#[derive(Debug, Default)]
pub struct AcceptedSet {
    members: Vec<Accepted>,
}

impl AcceptedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.members.iter().map(|m| m.node)
    }

    pub fn into_nodes(self) -> Vec<NodeId> {
        self.members.into_iter().map(|m| m.node).collect()
    }

    /// Resolve `node` against the current members.
    ///
    /// An accepted ancestor is looked for first, then an accepted element
    /// whose box overlaps the candidate's by the coverage ratio. Only the
    /// first conflict found is resolved: an interactive candidate replaces a
    /// decorative member, otherwise the member stays and the candidate is
    /// dropped.
    pub fn offer<D: Document + ?Sized>(&mut self, doc: &D, node: NodeId) -> Resolution {
        let priority = Priority::classify(doc, node);
        let Some((index, conflict)) = self.find_conflict(doc, node) else {
            self.members.push(Accepted { node, priority });
            return Resolution::Appended;
        };

        let existing = self.members[index];
        if priority.outranks(existing.priority) {
            debug!(
                evicted = %existing.node,
                by = %node,
                ?conflict,
                "replacing accepted element with more specific control"
            );
            self.members.remove(index);
            self.members.push(Accepted { node, priority });
            Resolution::Replaced {
                evicted: existing.node,
            }
        } else {
            debug!(dropped = %node, kept = %existing.node, ?conflict, "discarding candidate");
            Resolution::Discarded { kept: existing.node }
        }
    }

    fn find_conflict<D: Document + ?Sized>(&self, doc: &D, node: NodeId) -> Option<(usize, Conflict)> {
        if let Some(index) = self.members.iter().position(|m| doc.contains(m.node, node)) {
            return Some((index, Conflict::Containment));
        }

        let candidate = adjusted_box(doc, node);
        self.members
            .iter()
            .position(|m| {
                let member = adjusted_box(doc, m.node);
                member.covers(&candidate, COVERAGE_RATIO) || candidate.covers(&member, COVERAGE_RATIO)
            })
            .map(|index| (index, Conflict::Intersection))
    }
}
