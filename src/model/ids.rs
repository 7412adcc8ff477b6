//! Identity types for nodes of the class model.
//!
//! The class model never stores marking state on its nodes. Instead every markable node
//! carries a [`NodeId`], and markers keep their state in side tables keyed by it. Classes
//! are additionally addressed by [`ClassId`], their position in the
//! [`crate::model::ClassPool`] arena, and members by [`MemberRef`].
//!
//! All three types are plain `Copy` handles. Holding one never keeps the referenced node
//! alive and never implies ownership; resolving it always goes through a lookup in the
//! pool.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_NODE_ID: AtomicU32 = AtomicU32::new(1);

/// Process-unique identity of a markable node.
///
/// A `NodeId` is assigned once when a node is constructed and never changes, so it stays
/// valid while containers around the node are compacted. Nodes are deliberately not
/// `Clone`: two nodes with the same identity would share one mark.
///
/// # Examples
///
/// ```rust
/// use classhrink::model::NodeId;
///
/// let a = NodeId::fresh();
/// let b = NodeId::fresh();
/// assert_ne!(a, b);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// Allocates a new identity that has never been handed out before.
    #[must_use]
    pub fn fresh() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw identity value.
    #[must_use]
    #[inline]
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Position of a class in the [`crate::model::ClassPool`] arena.
///
/// Classes are never removed from the pool during a shrink run, so a `ClassId` stays
/// valid for the lifetime of the pool. It is the only form in which one class refers to
/// another (super classes, subclasses, resolved constants, annotation types).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassId(pub(crate) u32);

impl ClassId {
    /// Creates a `ClassId` from a raw arena index.
    ///
    /// Primarily intended for tests; normal usage obtains ids from
    /// [`crate::model::ClassPool::add_program`] or [`crate::model::ClassPool::add_library`].
    #[must_use]
    #[inline]
    pub const fn new(index: u32) -> Self {
        ClassId(index)
    }

    /// Returns the arena index of this class.
    #[must_use]
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassId({})", self.0)
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "class#{}", self.0)
    }
}

/// The two kinds of class members.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum MemberKind {
    /// A field declaration
    Field,
    /// A method declaration
    Method,
}

/// Weak reference to a field or method.
///
/// The member is identified by its [`NodeId`] rather than its position in the member
/// list, so the reference survives compaction of that list.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemberRef {
    /// The declaring class
    pub class: ClassId,
    /// Identity of the member inside the declaring class
    pub member: NodeId,
}

impl MemberRef {
    /// Creates a new member reference.
    #[must_use]
    pub const fn new(class: ClassId, member: NodeId) -> Self {
        MemberRef { class, member }
    }
}

impl fmt::Debug for MemberRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemberRef({:?}, {:?})", self.class, self.member)
    }
}

impl fmt::Display for MemberRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.class, self.member)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashSet;

    #[test]
    fn test_node_id_fresh_is_unique() {
        let ids: FxHashSet<NodeId> = (0..1000).map(|_| NodeId::fresh()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_class_id_index() {
        let id = ClassId::new(7);
        assert_eq!(id.index(), 7);
        assert_eq!(format!("{id}"), "class#7");
        assert_eq!(format!("{id:?}"), "ClassId(7)");
    }

    #[test]
    fn test_member_ref_equality() {
        let member = NodeId::fresh();
        let a = MemberRef::new(ClassId::new(1), member);
        let b = MemberRef::new(ClassId::new(1), member);
        let c = MemberRef::new(ClassId::new(2), member);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
