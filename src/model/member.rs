//! Fields and methods of program and library classes.

use crate::model::{
    Attribute, AttributeInfo, ClassId, CodeAttribute, ConstantPool, MemberAccessFlags,
    MemberKind, NodeId,
};

/// Name of instance initializers.
pub const INIT_NAME: &str = "<init>";
/// Name of the static initializer.
pub const CLINIT_NAME: &str = "<clinit>";
/// Descriptor of the static initializer.
pub const CLINIT_DESCRIPTOR: &str = "()V";

/// A field or method of a program class.
#[derive(Debug)]
pub struct ProgramMember {
    /// Identity used by markers
    pub id: NodeId,
    /// Field or method
    pub kind: MemberKind,
    /// Access flags
    pub access_flags: MemberAccessFlags,
    /// Index of the `Utf8` member name
    pub name_index: u16,
    /// Index of the `Utf8` descriptor
    pub descriptor_index: u16,
    /// Attributes, in declaration order
    pub attributes: Vec<Attribute>,
    /// Classes named in the descriptor (weak)
    pub referenced_classes: Vec<ClassId>,
}

impl ProgramMember {
    /// Creates a member with a fresh identity.
    #[must_use]
    pub fn new(
        kind: MemberKind,
        access_flags: MemberAccessFlags,
        name_index: u16,
        descriptor_index: u16,
        attributes: Vec<Attribute>,
    ) -> Self {
        ProgramMember {
            id: NodeId::fresh(),
            kind,
            access_flags,
            name_index,
            descriptor_index,
            attributes,
            referenced_classes: Vec::new(),
        }
    }

    /// Returns the member name as found in `pool`.
    #[must_use]
    pub fn name<'p>(&self, pool: &'p ConstantPool) -> Option<&'p str> {
        pool.utf8(self.name_index)
    }

    /// Returns the member descriptor as found in `pool`.
    #[must_use]
    pub fn descriptor<'p>(&self, pool: &'p ConstantPool) -> Option<&'p str> {
        pool.utf8(self.descriptor_index)
    }

    /// Returns the `Code` attribute of a method, if any.
    #[must_use]
    pub fn code(&self) -> Option<&CodeAttribute> {
        self.attributes.iter().find_map(|attribute| match &attribute.info {
            AttributeInfo::Code(code) => Some(code),
            _ => None,
        })
    }
}

/// A field or method of a library class. Library members are never compacted, so they
/// carry their name and descriptor directly.
#[derive(Debug)]
pub struct LibraryMember {
    /// Identity used by markers
    pub id: NodeId,
    /// Field or method
    pub kind: MemberKind,
    /// Access flags
    pub access_flags: MemberAccessFlags,
    /// Member name
    pub name: String,
    /// Member descriptor
    pub descriptor: String,
}

impl LibraryMember {
    /// Creates a member with a fresh identity.
    #[must_use]
    pub fn new(kind: MemberKind, access_flags: MemberAccessFlags, name: &str, descriptor: &str) -> Self {
        LibraryMember {
            id: NodeId::fresh(),
            kind,
            access_flags,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
        }
    }
}

/// A uniform read-only view of a program or library member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberInfo<'a> {
    /// Identity of the member
    pub id: NodeId,
    /// Field or method
    pub kind: MemberKind,
    /// Access flags
    pub access_flags: MemberAccessFlags,
    /// Member name
    pub name: &'a str,
    /// Member descriptor
    pub descriptor: &'a str,
}

impl MemberInfo<'_> {
    /// Returns `true` for methods that take part in virtual dispatch: not private, not
    /// static and not an initializer.
    #[must_use]
    pub fn is_overridable(&self) -> bool {
        self.kind == MemberKind::Method
            && self.access_flags.is_virtual()
            && self.name != INIT_NAME
            && self.name != CLINIT_NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Constant;

    #[test]
    fn test_program_member_names() {
        let mut pool = ConstantPool::new();
        let name = pool.push(Constant::Utf8("run".to_string()));
        let descriptor = pool.push(Constant::Utf8("()V".to_string()));
        let member = ProgramMember::new(
            MemberKind::Method,
            MemberAccessFlags::PUBLIC,
            name,
            descriptor,
            Vec::new(),
        );
        assert_eq!(member.name(&pool), Some("run"));
        assert_eq!(member.descriptor(&pool), Some("()V"));
        assert!(member.code().is_none());
    }

    #[test]
    fn test_overridable() {
        let view = |name, flags| MemberInfo {
            id: NodeId::fresh(),
            kind: MemberKind::Method,
            access_flags: flags,
            name,
            descriptor: "()V",
        };
        assert!(view("run", MemberAccessFlags::PUBLIC).is_overridable());
        assert!(!view("run", MemberAccessFlags::PRIVATE).is_overridable());
        assert!(!view(INIT_NAME, MemberAccessFlags::PUBLIC).is_overridable());
        assert!(!view(CLINIT_NAME, MemberAccessFlags::STATIC).is_overridable());
    }
}
