//! Diagnostic marking strategy that records why every node was kept.

use rustc_hash::FxHashMap;

use crate::{
    model::NodeId,
    shrink::{MarkContext, Referrer, UsageMark, UsageMarkId, UsageMarker, UsageReason},
};

/// Marking strategy that stores a [`UsageMark`] chain head for every marked node.
///
/// The propagator enters a context before marking the dependents of a node; every mark
/// written in that context points at a record naming the reason and the referrer,
/// linked to the referrer's own mark. Following the links explains why a node is kept,
/// ending at the keep root.
///
/// Ties are resolved first-certain-wins: once a node holds a certain mark it is never
/// replaced, while a possible mark is replaced by the first certain one. The chain is
/// therefore the first one found in traversal order, not necessarily the shortest.
///
/// # Examples
///
/// ```rust
/// use classhrink::model::NodeId;
/// use classhrink::shrink::{Referrer, ShortestUsageMarker, UsageMarker, UsageReason};
///
/// let (root, dependent) = (NodeId::fresh(), NodeId::fresh());
/// let mut marker = ShortestUsageMarker::new();
/// marker.mark_as_used(root);
///
/// let context = marker.enter_context(root, UsageReason::ReferencedBy, Referrer::default());
/// marker.mark_as_used(dependent);
/// marker.leave_context(context);
///
/// let chain = marker.usage_chain(dependent);
/// assert_eq!(chain.len(), 2);
/// assert_eq!(chain[0].reason, UsageReason::ReferencedBy);
/// assert_eq!(chain[1].reason, UsageReason::KeepRoot);
/// ```
#[derive(Debug)]
pub struct ShortestUsageMarker {
    marks: Vec<UsageMark>,
    slots: FxHashMap<NodeId, UsageMarkId>,
    contexts: Vec<PendingContext>,
    used: usize,
}

/// An entered context. Its mark is pushed to the arena the first time a node is
/// marked in it, so contexts that mark nothing leave no record.
#[derive(Debug)]
struct PendingContext {
    mark: UsageMark,
    /// `from` had no mark; the record links to the enclosing context instead.
    chained: bool,
    recorded: Option<UsageMarkId>,
}

const ROOT: UsageMarkId = UsageMarkId(0);

impl Default for ShortestUsageMarker {
    fn default() -> Self {
        Self::new()
    }
}

impl ShortestUsageMarker {
    /// Creates a marker whose ambient mark is the keep-root mark.
    #[must_use]
    pub fn new() -> Self {
        ShortestUsageMarker {
            marks: vec![UsageMark::root()],
            slots: FxHashMap::default(),
            contexts: Vec::new(),
            used: 0,
        }
    }

    fn push(&mut self, mark: UsageMark) -> UsageMarkId {
        let id = UsageMarkId(self.marks.len() as u32);
        self.marks.push(mark);
        id
    }

    /// Returns the record of the context at `depth`, pushing it and any unrecorded
    /// enclosing contexts it chains to. Depth zero is the keep root.
    fn record_context(&mut self, depth: usize) -> UsageMarkId {
        let Some(index) = depth.checked_sub(1) else {
            return ROOT;
        };
        if let Some(id) = self.contexts[index].recorded {
            return id;
        }
        let mut mark = self.contexts[index].mark.clone();
        if self.contexts[index].chained {
            mark.previous = Some(self.record_context(index));
        }
        let id = self.push(mark);
        self.contexts[index].recorded = Some(id);
        id
    }

    fn current(&mut self) -> UsageMarkId {
        self.record_context(self.contexts.len())
    }

    /// Number of records in the mark arena, the keep-root record included.
    #[must_use]
    pub fn recorded_marks(&self) -> usize {
        self.marks.len()
    }

    /// Returns the mark with the given id.
    #[must_use]
    pub fn mark(&self, id: UsageMarkId) -> Option<&UsageMark> {
        self.marks.get(id.index())
    }

    /// Returns the mark explaining why `node` was marked, if any.
    #[must_use]
    pub fn shortest_usage_mark(&self, node: NodeId) -> Option<&UsageMark> {
        self.slots.get(&node).and_then(|&id| self.mark(id))
    }

    /// Returns the full chain for `node`, from its own mark to the keep root.
    #[must_use]
    pub fn usage_chain(&self, node: NodeId) -> Vec<&UsageMark> {
        let mut chain = Vec::new();
        let mut next = self.slots.get(&node).copied();
        while let Some(id) = next {
            let Some(mark) = self.mark(id) else {
                break;
            };
            chain.push(mark);
            // links always point at older records
            next = mark.previous.filter(|previous| previous.index() < id.index());
        }
        chain
    }
}

impl UsageMarker for ShortestUsageMarker {
    fn is_used(&self, node: NodeId) -> bool {
        self.shortest_usage_mark(node).is_some_and(|mark| mark.certain)
    }

    fn is_possibly_used(&self, node: NodeId) -> bool {
        self.shortest_usage_mark(node).is_some_and(|mark| !mark.certain)
    }

    fn mark_as_used(&mut self, node: NodeId) {
        if self.is_used(node) {
            return;
        }
        let current = self.current();
        self.slots.insert(node, current);
        self.used += 1;
    }

    fn mark_as_possibly_used(&mut self, node: NodeId) {
        if self.slots.contains_key(&node) {
            return;
        }
        let current = self.current();
        let possible = self.marks[current.index()].as_possible();
        let id = self.push(possible);
        self.slots.insert(node, id);
    }

    fn enter_context(&mut self, from: NodeId, reason: UsageReason, referrer: Referrer) -> MarkContext {
        let depth = self.contexts.len();
        let previous = self.slots.get(&from).copied();
        self.contexts.push(PendingContext {
            mark: UsageMark::caused_by(reason, referrer, previous),
            chained: previous.is_none(),
            recorded: None,
        });
        MarkContext(depth)
    }

    fn leave_context(&mut self, context: MarkContext) {
        self.contexts.truncate(context.0);
    }

    fn used_count(&self) -> usize {
        self.used
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ClassId;

    #[test]
    fn test_first_certain_mark_wins() {
        let (a, b, target) = (NodeId::fresh(), NodeId::fresh(), NodeId::fresh());
        let mut marker = ShortestUsageMarker::new();
        marker.mark_as_used(a);
        marker.mark_as_used(b);

        let first = marker.enter_context(a, UsageReason::ReferencedBy, Referrer::class(ClassId::new(1)));
        marker.mark_as_used(target);
        marker.leave_context(first);

        let second = marker.enter_context(b, UsageReason::ExtendedBy, Referrer::class(ClassId::new(2)));
        assert!(!marker.should_be_marked_as_used(target));
        marker.mark_as_used(target);
        marker.leave_context(second);

        let mark = marker.shortest_usage_mark(target).unwrap();
        assert_eq!(mark.reason, UsageReason::ReferencedBy);
        assert_eq!(mark.referencing_class, Some(ClassId::new(1)));
        assert_eq!(marker.used_count(), 3);
    }

    #[test]
    fn test_possible_mark_is_upgraded() {
        let (owner, node) = (NodeId::fresh(), NodeId::fresh());
        let mut marker = ShortestUsageMarker::new();
        marker.mark_as_used(owner);

        let context = marker.enter_context(owner, UsageReason::Overrides, Referrer::default());
        marker.mark_as_possibly_used(node);
        marker.leave_context(context);
        assert!(marker.is_possibly_used(node));
        assert!(!marker.shortest_usage_mark(node).unwrap().certain);

        let context = marker.enter_context(owner, UsageReason::MemberOf, Referrer::default());
        assert!(marker.should_be_marked_as_used(node));
        marker.mark_as_used(node);
        marker.leave_context(context);

        let mark = marker.shortest_usage_mark(node).unwrap();
        assert!(mark.certain);
        assert_eq!(mark.reason, UsageReason::MemberOf);
    }

    #[test]
    fn test_context_nesting_restores_current() {
        let (root, child, sibling) = (NodeId::fresh(), NodeId::fresh(), NodeId::fresh());
        let mut marker = ShortestUsageMarker::new();
        marker.mark_as_used(root);

        let outer = marker.enter_context(root, UsageReason::ReferencedBy, Referrer::default());
        marker.mark_as_used(child);
        let inner = marker.enter_context(child, UsageReason::ExtendedBy, Referrer::default());
        marker.leave_context(inner);
        marker.mark_as_used(sibling);
        marker.leave_context(outer);

        assert_eq!(
            marker.shortest_usage_mark(sibling).unwrap().reason,
            UsageReason::ReferencedBy
        );
        assert_eq!(marker.usage_chain(root).len(), 1);
        assert!(marker.usage_chain(NodeId::fresh()).is_empty());
    }

    #[test]
    fn test_contexts_without_marks_are_not_recorded() {
        let (root, dependent) = (NodeId::fresh(), NodeId::fresh());
        let mut marker = ShortestUsageMarker::new();
        marker.mark_as_used(root);
        marker.mark_as_used(dependent);
        let recorded = marker.recorded_marks();

        for _ in 0..1000 {
            let outer = marker.enter_context(root, UsageReason::ReferencedBy, Referrer::default());
            let inner = marker.enter_context(dependent, UsageReason::MemberOf, Referrer::default());
            marker.mark_as_used(dependent);
            marker.leave_context(inner);
            marker.leave_context(outer);
        }
        assert_eq!(marker.recorded_marks(), recorded);
    }

    #[test]
    fn test_unmarked_context_chains_to_enclosing_context() {
        let (root, unmarked, target) = (NodeId::fresh(), NodeId::fresh(), NodeId::fresh());
        let mut marker = ShortestUsageMarker::new();
        marker.mark_as_used(root);

        let outer = marker.enter_context(root, UsageReason::ReferencedBy, Referrer::default());
        let inner = marker.enter_context(unmarked, UsageReason::Overrides, Referrer::default());
        marker.mark_as_possibly_used(target);
        marker.leave_context(inner);
        marker.leave_context(outer);

        let reasons: Vec<UsageReason> = marker.usage_chain(target).iter().map(|mark| mark.reason).collect();
        assert_eq!(
            reasons,
            [UsageReason::Overrides, UsageReason::ReferencedBy, UsageReason::KeepRoot]
        );
        assert!(!marker.usage_chain(target)[0].certain);
    }
}
