//! The usage-marking abstraction and its plain strategy.
//!
//! A [`UsageMarker`] owns the mark state of one shrink run in a side table keyed by
//! [`NodeId`]. Nodes have two mark levels:
//!
//! - **used**: certainly reachable, kept by compaction;
//! - **possibly used**: provisionally reachable, for example a method overriding a used
//!   method in a class that is not used (yet). Possible marks are upgraded when the
//!   owning class becomes used; otherwise the node is removed.
//!
//! The `should_be_marked_*` hooks gate every mark the propagator writes, so a strategy
//! can veto marks and the propagator never recurses into a node twice.

use rustc_hash::FxHashMap;

use crate::{
    model::{ClassId, ClassPool, MemberRef, NodeId},
    shrink::{Referrer, UsageReason},
};

/// Token returned by [`UsageMarker::enter_context`], handed back to
/// [`UsageMarker::leave_context`] to restore the previous context.
///
/// Holds the context depth before the matching enter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MarkContext(pub(crate) usize);

/// Strategy interface for recording marks.
pub trait UsageMarker {
    /// Returns `true` if the node is certainly used.
    fn is_used(&self, node: NodeId) -> bool;

    /// Returns `true` if the node carries only a possible mark.
    fn is_possibly_used(&self, node: NodeId) -> bool;

    /// Returns `true` if the node should now be marked as used.
    fn should_be_marked_as_used(&self, node: NodeId) -> bool {
        !self.is_used(node)
    }

    /// Returns `true` if the node should now be marked as possibly used.
    fn should_be_marked_as_possibly_used(&self, node: NodeId) -> bool {
        !self.is_used(node) && !self.is_possibly_used(node)
    }

    /// Marks the node as used. Idempotent.
    fn mark_as_used(&mut self, node: NodeId);

    /// Marks the node as possibly used. Never downgrades a used node.
    fn mark_as_possibly_used(&mut self, node: NodeId);

    /// Enters the context in which the dependents of `from` are marked.
    ///
    /// Strategies that record why nodes were marked attribute every mark written until
    /// the matching [`UsageMarker::leave_context`] to `reason` and `referrer`.
    fn enter_context(&mut self, _from: NodeId, _reason: UsageReason, _referrer: Referrer) -> MarkContext {
        MarkContext::default()
    }

    /// Restores the context active before the matching [`UsageMarker::enter_context`].
    fn leave_context(&mut self, _context: MarkContext) {}

    /// Number of nodes currently marked as used.
    fn used_count(&self) -> usize;

    /// Returns `true` if the class node is used. Convenience over [`UsageMarker::is_used`].
    fn is_class_used(&self, pool: &ClassPool, class: ClassId) -> bool {
        pool.class(class).is_ok_and(|class| self.is_used(class.id()))
    }

    /// Returns `true` if the referenced member is used.
    fn is_member_used(&self, member: MemberRef) -> bool {
        self.is_used(member.member)
    }
}

/// Mark level stored by [`SimpleUsageMarker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MarkState {
    Possibly,
    Used,
}

/// Plain marking strategy: a side table of mark levels, no history.
///
/// # Examples
///
/// ```rust
/// use classhrink::model::NodeId;
/// use classhrink::shrink::{SimpleUsageMarker, UsageMarker};
///
/// let node = NodeId::fresh();
/// let mut marker = SimpleUsageMarker::new();
/// marker.mark_as_possibly_used(node);
/// assert!(marker.is_possibly_used(node));
///
/// marker.mark_as_used(node);
/// assert!(marker.is_used(node));
/// assert!(!marker.is_possibly_used(node));
/// ```
#[derive(Debug, Default)]
pub struct SimpleUsageMarker {
    marks: FxHashMap<NodeId, MarkState>,
    used: usize,
}

impl SimpleUsageMarker {
    /// Creates a marker with no marks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl UsageMarker for SimpleUsageMarker {
    fn is_used(&self, node: NodeId) -> bool {
        self.marks.get(&node) == Some(&MarkState::Used)
    }

    fn is_possibly_used(&self, node: NodeId) -> bool {
        self.marks.get(&node) == Some(&MarkState::Possibly)
    }

    fn mark_as_used(&mut self, node: NodeId) {
        if self.marks.insert(node, MarkState::Used) != Some(MarkState::Used) {
            self.used += 1;
        }
    }

    fn mark_as_possibly_used(&mut self, node: NodeId) {
        self.marks.entry(node).or_insert(MarkState::Possibly);
    }

    fn used_count(&self) -> usize {
        self.used
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_as_used_is_idempotent() {
        let node = NodeId::fresh();
        let mut marker = SimpleUsageMarker::new();
        assert!(marker.should_be_marked_as_used(node));

        marker.mark_as_used(node);
        marker.mark_as_used(node);
        assert!(marker.is_used(node));
        assert!(!marker.should_be_marked_as_used(node));
        assert_eq!(marker.used_count(), 1);
    }

    #[test]
    fn test_possible_never_downgrades() {
        let node = NodeId::fresh();
        let mut marker = SimpleUsageMarker::new();
        marker.mark_as_used(node);
        marker.mark_as_possibly_used(node);
        assert!(marker.is_used(node));
        assert!(!marker.should_be_marked_as_possibly_used(node));
    }

    #[test]
    fn test_possible_then_used() {
        let node = NodeId::fresh();
        let mut marker = SimpleUsageMarker::new();
        marker.mark_as_possibly_used(node);
        assert!(!marker.should_be_marked_as_possibly_used(node));
        assert!(marker.should_be_marked_as_used(node));
        assert_eq!(marker.used_count(), 0);

        marker.mark_as_used(node);
        assert!(marker.is_used(node));
        assert_eq!(marker.used_count(), 1);
    }

    #[test]
    fn test_context_is_noop() {
        let mut marker = SimpleUsageMarker::new();
        let context = marker.enter_context(NodeId::fresh(), UsageReason::ReferencedBy, Referrer::default());
        assert_eq!(context, MarkContext::default());
        marker.leave_context(context);
        assert_eq!(marker.used_count(), 0);
    }
}
