//! Program and library classes.
//!
//! A [`ClassNode`] is either a [`ProgramClass`], which is marked and compacted, or a
//! [`LibraryClass`], a read-only summary of a class the program runs against. Library
//! classes take part in marking (so that overriding of library methods stays visible)
//! but are never compacted.

use crate::model::{
    Attribute, AttributeInfo, BootstrapMethod, ClassAccessFlags, ClassId, ConstantPool,
    KotlinMetadata, LibraryMember, MemberInfo, MemberKind, NodeId, ProgramMember,
};

/// A class of the program being shrunk.
#[derive(Debug)]
pub struct ProgramClass {
    /// Identity used by markers
    pub id: NodeId,
    /// Internal name, e.g. `com/example/Foo`
    pub name: String,
    /// Access flags
    pub access_flags: ClassAccessFlags,
    /// Constant pool
    pub constant_pool: ConstantPool,
    /// Index of the `Class` constant of this class, 0 once reset by compaction
    pub this_class: u16,
    /// Index of the `Class` constant of the super class, or 0
    pub super_class: u16,
    /// Indices of the `Class` constants of the direct interfaces
    pub interfaces: Vec<u16>,
    /// Fields, in declaration order
    pub fields: Vec<ProgramMember>,
    /// Methods, in declaration order
    pub methods: Vec<ProgramMember>,
    /// Class attributes
    pub attributes: Vec<Attribute>,
    /// Known direct subclasses and implementers (weak)
    pub subclasses: Vec<ClassId>,
    /// Attached Kotlin metadata
    pub kotlin_metadata: Option<KotlinMetadata>,
}

impl ProgramClass {
    /// Returns the member with the given identity.
    #[must_use]
    pub fn member(&self, id: NodeId) -> Option<&ProgramMember> {
        self.fields
            .iter()
            .chain(self.methods.iter())
            .find(|member| member.id == id)
    }

    /// Returns a uniform view of a program member of this class.
    #[must_use]
    pub fn member_info<'a>(&'a self, member: &ProgramMember) -> MemberInfo<'a> {
        MemberInfo {
            id: member.id,
            kind: member.kind,
            access_flags: member.access_flags,
            name: member.name(&self.constant_pool).unwrap_or_default(),
            descriptor: member.descriptor(&self.constant_pool).unwrap_or_default(),
        }
    }

    /// Returns the method with the given name and descriptor.
    #[must_use]
    pub fn find_method(&self, name: &str, descriptor: &str) -> Option<&ProgramMember> {
        self.methods.iter().find(|method| {
            method.name(&self.constant_pool) == Some(name)
                && method.descriptor(&self.constant_pool) == Some(descriptor)
        })
    }

    /// Returns the field with the given name and descriptor.
    #[must_use]
    pub fn find_field(&self, name: &str, descriptor: &str) -> Option<&ProgramMember> {
        self.fields.iter().find(|field| {
            field.name(&self.constant_pool) == Some(name)
                && field.descriptor(&self.constant_pool) == Some(descriptor)
        })
    }

    /// Returns the resolved super class.
    #[must_use]
    pub fn super_class_id(&self) -> Option<ClassId> {
        self.constant_pool.referenced_class(self.super_class)
    }

    /// Iterates over the resolved direct interfaces.
    pub fn interface_ids(&self) -> impl Iterator<Item = ClassId> + '_ {
        self.interfaces
            .iter()
            .filter_map(|&index| self.constant_pool.referenced_class(index))
    }

    /// Returns the `BootstrapMethods` attribute and its entries.
    #[must_use]
    pub fn bootstrap_methods(&self) -> Option<(&Attribute, &[BootstrapMethod])> {
        self.attributes
            .iter()
            .find_map(|attribute| match &attribute.info {
                AttributeInfo::BootstrapMethods(entries) => Some((attribute, entries.as_slice())),
                _ => None,
            })
    }
}

/// A class outside the program, known only by its public surface.
#[derive(Debug)]
pub struct LibraryClass {
    /// Identity used by markers
    pub id: NodeId,
    /// Internal name
    pub name: String,
    /// Access flags
    pub access_flags: ClassAccessFlags,
    /// Internal name of the super class
    pub super_name: Option<String>,
    /// Internal names of the direct interfaces
    pub interface_names: Vec<String>,
    /// Resolved super class (weak)
    pub super_class: Option<ClassId>,
    /// Resolved direct interfaces (weak)
    pub interfaces: Vec<ClassId>,
    /// Fields
    pub fields: Vec<LibraryMember>,
    /// Methods
    pub methods: Vec<LibraryMember>,
    /// Known direct subclasses and implementers (weak)
    pub subclasses: Vec<ClassId>,
}

impl LibraryClass {
    fn info(member: &LibraryMember) -> MemberInfo<'_> {
        MemberInfo {
            id: member.id,
            kind: member.kind,
            access_flags: member.access_flags,
            name: &member.name,
            descriptor: &member.descriptor,
        }
    }
}

/// A class of either kind, as stored in the [`crate::model::ClassPool`].
#[derive(Debug)]
pub enum ClassNode {
    /// A class of the program
    Program(ProgramClass),
    /// A library class
    Library(LibraryClass),
}

impl ClassNode {
    /// Identity used by markers.
    #[must_use]
    pub fn id(&self) -> NodeId {
        match self {
            ClassNode::Program(class) => class.id,
            ClassNode::Library(class) => class.id,
        }
    }

    /// Internal name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            ClassNode::Program(class) => &class.name,
            ClassNode::Library(class) => &class.name,
        }
    }

    /// Access flags.
    #[must_use]
    pub fn access_flags(&self) -> ClassAccessFlags {
        match self {
            ClassNode::Program(class) => class.access_flags,
            ClassNode::Library(class) => class.access_flags,
        }
    }

    /// Returns `true` for library classes.
    #[must_use]
    pub fn is_library(&self) -> bool {
        matches!(self, ClassNode::Library(_))
    }

    /// Returns the program class, if this is one.
    #[must_use]
    pub fn as_program(&self) -> Option<&ProgramClass> {
        match self {
            ClassNode::Program(class) => Some(class),
            ClassNode::Library(_) => None,
        }
    }

    /// Returns the program class mutably, if this is one.
    #[must_use]
    pub fn as_program_mut(&mut self) -> Option<&mut ProgramClass> {
        match self {
            ClassNode::Program(class) => Some(class),
            ClassNode::Library(_) => None,
        }
    }

    /// Returns the library class, if this is one.
    #[must_use]
    pub fn as_library(&self) -> Option<&LibraryClass> {
        match self {
            ClassNode::Library(class) => Some(class),
            ClassNode::Program(_) => None,
        }
    }

    /// Known direct subclasses and implementers.
    #[must_use]
    pub fn subclasses(&self) -> &[ClassId] {
        match self {
            ClassNode::Program(class) => &class.subclasses,
            ClassNode::Library(class) => &class.subclasses,
        }
    }

    /// Resolved super class.
    #[must_use]
    pub fn super_class(&self) -> Option<ClassId> {
        match self {
            ClassNode::Program(class) => class.super_class_id(),
            ClassNode::Library(class) => class.super_class,
        }
    }

    /// Resolved direct interfaces.
    #[must_use]
    pub fn interfaces(&self) -> Vec<ClassId> {
        match self {
            ClassNode::Program(class) => class.interface_ids().collect(),
            ClassNode::Library(class) => class.interfaces.clone(),
        }
    }

    /// All members, fields first, in declaration order.
    #[must_use]
    pub fn members(&self) -> Vec<MemberInfo<'_>> {
        match self {
            ClassNode::Program(class) => class
                .fields
                .iter()
                .chain(class.methods.iter())
                .map(|member| class.member_info(member))
                .collect(),
            ClassNode::Library(class) => class
                .fields
                .iter()
                .chain(class.methods.iter())
                .map(LibraryClass::info)
                .collect(),
        }
    }

    /// Returns the member with the given identity.
    #[must_use]
    pub fn member(&self, id: NodeId) -> Option<MemberInfo<'_>> {
        match self {
            ClassNode::Program(class) => class.member(id).map(|member| class.member_info(member)),
            ClassNode::Library(class) => class
                .fields
                .iter()
                .chain(class.methods.iter())
                .find(|member| member.id == id)
                .map(LibraryClass::info),
        }
    }

    /// Returns the member of the given kind with the given name and descriptor.
    #[must_use]
    pub fn find_member(&self, kind: MemberKind, name: &str, descriptor: &str) -> Option<MemberInfo<'_>> {
        self.members().into_iter().find(|member| {
            member.kind == kind && member.name == name && member.descriptor == descriptor
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClassBuilder, LibraryClassBuilder, MemberAccessFlags};

    #[test]
    fn test_program_class_lookup() {
        let mut builder = ClassBuilder::new("com/example/Foo", Some("java/lang/Object"));
        let run = builder.method(MemberAccessFlags::PUBLIC, "run", "()V", Vec::new());
        let count = builder.field(MemberAccessFlags::PRIVATE, "count", "I");
        let class = builder.build();

        assert_eq!(class.find_method("run", "()V").map(|m| m.id), Some(run));
        assert_eq!(class.find_field("count", "I").map(|m| m.id), Some(count));
        assert!(class.find_method("run", "(I)V").is_none());
        assert_eq!(class.member(count).map(|m| m.kind), Some(MemberKind::Field));
    }

    #[test]
    fn test_class_node_members() {
        let library = LibraryClassBuilder::new("java/lang/Object")
            .method(MemberAccessFlags::PUBLIC, "toString", "()Ljava/lang/String;")
            .method(MemberAccessFlags::PUBLIC, "hashCode", "()I")
            .build();
        let node = ClassNode::Library(library);

        assert!(node.is_library());
        assert_eq!(node.name(), "java/lang/Object");
        assert_eq!(node.members().len(), 2);
        let hash = node.find_member(MemberKind::Method, "hashCode", "()I");
        assert!(hash.is_some_and(|m| m.is_overridable()));
        assert!(node.find_member(MemberKind::Field, "hashCode", "()I").is_none());
    }
}
