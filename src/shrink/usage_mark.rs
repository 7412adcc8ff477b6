//! Reachability marks recorded by the diagnostic marking strategy.
//!
//! A [`UsageMark`] explains why one node was kept: the reason, the class or member whose
//! processing caused the mark, and a link to the mark of that referrer. Following the
//! `previous` links walks back to a keep root. Marks are stored in an arena owned by
//! [`crate::shrink::ShortestUsageMarker`] and linked by [`UsageMarkId`], so chains never
//! own the classes they mention.

use std::fmt;

use strum::{Display, EnumIter};

use crate::model::{ClassId, MemberRef};

/// Why a node was marked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum UsageReason {
    /// Selected by the caller as a keep root
    #[strum(to_string = "is kept by a directive in the configuration")]
    KeepRoot,
    /// Referenced from the body of a class or member
    #[strum(to_string = "is referenced by")]
    ReferencedBy,
    /// Super class of a used class
    #[strum(to_string = "is extended by")]
    ExtendedBy,
    /// Interface of a used class
    #[strum(to_string = "is implemented by")]
    ImplementedBy,
    /// Overrides or implements a used method
    #[strum(to_string = "implements or overrides")]
    Overrides,
    /// Static initializer of a used class
    #[strum(to_string = "is a static initializer of")]
    ClassInitializerOf,
    /// Member of a used class that was already referenced before the class was used
    #[strum(to_string = "is a member of")]
    MemberOf,
    /// Annotation, or part of one, on a used element
    #[strum(to_string = "annotates")]
    Annotates,
    /// Declaration in the Kotlin metadata of a used class
    #[strum(to_string = "is declared in the Kotlin metadata of")]
    KotlinMetadataOf,
}

/// The class or member whose processing produced a mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Referrer {
    /// Referencing class
    pub class: Option<ClassId>,
    /// Referencing member
    pub member: Option<MemberRef>,
    /// Constant pool index through which the reference was made
    pub constant_index: Option<u16>,
}

impl Referrer {
    /// A reference made by a class.
    #[must_use]
    pub fn class(class: ClassId) -> Self {
        Referrer {
            class: Some(class),
            ..Self::default()
        }
    }

    /// A reference made by a member.
    #[must_use]
    pub fn member(member: MemberRef) -> Self {
        Referrer {
            class: Some(member.class),
            member: Some(member),
            constant_index: None,
        }
    }

    /// The same referrer, reached through the given constant.
    #[must_use]
    pub fn with_constant(mut self, index: u16) -> Self {
        self.constant_index = Some(index);
        self
    }
}

/// Index of a [`UsageMark`] in the arena of its marker.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct UsageMarkId(pub(crate) u32);

impl UsageMarkId {
    /// Returns the arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for UsageMarkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UsageMarkId({})", self.0)
    }
}

/// One link of a reachability chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageMark {
    /// Why the node was marked
    pub reason: UsageReason,
    /// `false` for marks recorded by `mark_as_possibly_used`
    pub certain: bool,
    /// Mark of the referrer, towards the keep root
    pub previous: Option<UsageMarkId>,
    /// Referencing class (weak)
    pub referencing_class: Option<ClassId>,
    /// Referencing member (weak)
    pub referencing_member: Option<MemberRef>,
    /// Constant pool index of the reference
    pub constant_index: Option<u16>,
}

impl UsageMark {
    /// The mark of nodes selected as keep roots.
    #[must_use]
    pub fn root() -> Self {
        UsageMark {
            reason: UsageReason::KeepRoot,
            certain: true,
            previous: None,
            referencing_class: None,
            referencing_member: None,
            constant_index: None,
        }
    }

    /// A certain mark caused by `referrer`, chained to `previous`.
    #[must_use]
    pub fn caused_by(reason: UsageReason, referrer: Referrer, previous: Option<UsageMarkId>) -> Self {
        UsageMark {
            reason,
            certain: true,
            previous,
            referencing_class: referrer.class,
            referencing_member: referrer.member,
            constant_index: referrer.constant_index,
        }
    }

    /// An uncertain copy of this mark.
    #[must_use]
    pub fn as_possible(&self) -> Self {
        UsageMark {
            certain: false,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeId;
    use strum::IntoEnumIterator;

    #[test]
    fn test_reason_display() {
        assert_eq!(
            UsageReason::KeepRoot.to_string(),
            "is kept by a directive in the configuration"
        );
        assert_eq!(UsageReason::ExtendedBy.to_string(), "is extended by");
        assert!(UsageReason::iter().all(|reason| reason.to_string().len() > 4));
    }

    #[test]
    fn test_referrer() {
        let member = MemberRef::new(ClassId::new(3), NodeId::fresh());
        let referrer = Referrer::member(member).with_constant(12);
        assert_eq!(referrer.class, Some(ClassId::new(3)));
        assert_eq!(referrer.member, Some(member));
        assert_eq!(referrer.constant_index, Some(12));
    }

    #[test]
    fn test_possible_copy() {
        let mark = UsageMark::caused_by(
            UsageReason::ReferencedBy,
            Referrer::class(ClassId::new(1)),
            Some(UsageMarkId(0)),
        );
        let possible = mark.as_possible();
        assert!(mark.certain);
        assert!(!possible.certain);
        assert_eq!(possible.previous, mark.previous);
        assert_eq!(possible.referencing_class, Some(ClassId::new(1)));
    }
}
