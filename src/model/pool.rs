//! The arena owning every class of a shrink run.

use rustc_hash::FxHashMap;

use crate::{
    model::{ClassId, ClassNode, LibraryClass, MemberInfo, MemberRef, ProgramClass},
    Error, Result,
};

/// Arena of program and library classes, addressed by [`ClassId`].
///
/// Classes are only ever appended, so ids stay valid for the lifetime of the pool.
/// Compaction empties unused classes in place; dropping them from the output is up to
/// the caller.
///
/// # Examples
///
/// ```rust
/// use classhrink::model::{ClassBuilder, ClassPool, LibraryClassBuilder};
///
/// let mut pool = ClassPool::new();
/// let object = pool.add_library(LibraryClassBuilder::new("java/lang/Object").build());
/// let foo = pool.add_program(ClassBuilder::new("com/example/Foo", Some("java/lang/Object")).build());
///
/// assert_eq!(pool.find("java/lang/Object"), Some(object));
/// assert_eq!(pool.len(), 2);
/// assert!(!pool.class(foo).unwrap().is_library());
/// ```
#[derive(Debug, Default)]
pub struct ClassPool {
    classes: Vec<ClassNode>,
    by_name: FxHashMap<String, ClassId>,
}

impl ClassPool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a class and returns its id. A class with the same name replaces the name
    /// lookup but both stay in the arena.
    pub fn add(&mut self, class: ClassNode) -> ClassId {
        let id = ClassId::new(self.classes.len() as u32);
        self.by_name.insert(class.name().to_string(), id);
        self.classes.push(class);
        id
    }

    /// Adds a program class.
    pub fn add_program(&mut self, class: ProgramClass) -> ClassId {
        self.add(ClassNode::Program(class))
    }

    /// Adds a library class.
    pub fn add_library(&mut self, class: LibraryClass) -> ClassId {
        self.add(ClassNode::Library(class))
    }

    /// Number of classes in the pool.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Returns `true` if the pool holds no class.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Returns the class with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClassNotFound`] if the id is not part of this pool.
    pub fn class(&self, id: ClassId) -> Result<&ClassNode> {
        self.classes.get(id.index()).ok_or(Error::ClassNotFound(id))
    }

    /// Returns the class with the given id mutably.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClassNotFound`] if the id is not part of this pool.
    pub fn class_mut(&mut self, id: ClassId) -> Result<&mut ClassNode> {
        self.classes.get_mut(id.index()).ok_or(Error::ClassNotFound(id))
    }

    /// Returns the program class with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClassNotFound`] for unknown ids and
    /// [`Error::UnsupportedOperation`] for library classes.
    pub fn program_class(&self, id: ClassId) -> Result<&ProgramClass> {
        match self.class(id)? {
            ClassNode::Program(class) => Ok(class),
            ClassNode::Library(class) => Err(unsupported_error!("program_class", class.name)),
        }
    }

    /// Looks up a class by internal name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<ClassId> {
        self.by_name.get(name).copied()
    }

    /// Resolves a member reference.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClassNotFound`] or [`Error::MemberNotFound`] if the reference
    /// does not resolve.
    pub fn member(&self, member: MemberRef) -> Result<MemberInfo<'_>> {
        self.class(member.class)?
            .member(member.member)
            .ok_or(Error::MemberNotFound(member))
    }

    /// Iterates over all classes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (ClassId, &ClassNode)> {
        self.classes
            .iter()
            .enumerate()
            .map(|(index, class)| (ClassId::new(index as u32), class))
    }

    /// Ids of all program classes, in insertion order.
    #[must_use]
    pub fn program_class_ids(&self) -> Vec<ClassId> {
        self.iter()
            .filter(|(_, class)| !class.is_library())
            .map(|(id, _)| id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClassBuilder, LibraryClassBuilder, MemberAccessFlags, MemberKind};

    #[test]
    fn test_pool_lookup() {
        let mut pool = ClassPool::new();
        let object = pool.add_library(LibraryClassBuilder::new("java/lang/Object").build());
        let foo = pool.add_program(ClassBuilder::new("com/example/Foo", None).build());

        assert_eq!(pool.find("com/example/Foo"), Some(foo));
        assert_eq!(pool.find("com/example/Bar"), None);
        assert_eq!(pool.program_class_ids(), vec![foo]);
        assert!(matches!(
            pool.program_class(object),
            Err(Error::UnsupportedOperation { .. })
        ));
        assert!(matches!(
            pool.class(ClassId::new(9)),
            Err(Error::ClassNotFound(_))
        ));
    }

    #[test]
    fn test_pool_member_resolution() {
        let mut pool = ClassPool::new();
        let mut builder = ClassBuilder::new("com/example/Foo", None);
        let run = builder.method(MemberAccessFlags::PUBLIC, "run", "()V", Vec::new());
        let foo = pool.add_program(builder.build());

        let info = pool.member(MemberRef::new(foo, run)).unwrap();
        assert_eq!(info.name, "run");
        assert_eq!(info.kind, MemberKind::Method);

        let missing = MemberRef::new(foo, crate::model::NodeId::fresh());
        assert!(matches!(pool.member(missing), Err(Error::MemberNotFound(_))));
    }
}
