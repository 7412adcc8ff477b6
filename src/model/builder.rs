//! Construction of program and library classes.
//!
//! [`ClassBuilder`] assembles a [`ProgramClass`] the way a class-file writer would: every
//! name, descriptor and reference goes through a deduplicating constant pool, and the
//! builder hands back the pool indices and member identities it allocated so callers can
//! wire up bytecode, attributes and keep roots. Weak references are left unresolved;
//! [`crate::model::linker::link`] fills them in once all classes are in a
//! [`crate::model::ClassPool`].

use rustc_hash::FxHashMap;

use crate::model::{
    Annotation, Attribute, AttributeInfo, ClassAccessFlags, CodeAttribute, Constant,
    ConstantPool, ConstantTag, DynamicConstant, ElementValue, KotlinMetadata, LibraryClass,
    LibraryMember, MemberAccessFlags, MemberKind, NodeId, ProgramClass, ProgramMember,
    RefConstant,
};

/// Builder for [`ProgramClass`]es.
///
/// # Examples
///
/// ```rust
/// use classhrink::model::{ClassBuilder, MemberAccessFlags};
///
/// let mut builder = ClassBuilder::new("com/example/Foo", Some("java/lang/Object"));
/// let println = builder.method_ref("java/io/PrintStream", "println", "(Ljava/lang/String;)V");
/// let run = builder.method(MemberAccessFlags::PUBLIC, "run", "()V", Vec::new());
/// let class = builder.build();
///
/// assert_eq!(class.name, "com/example/Foo");
/// assert_eq!(class.constant_pool.class_name(class.this_class), Some("com/example/Foo"));
/// assert!(class.member(run).is_some());
/// assert!(println > class.super_class);
/// ```
pub struct ClassBuilder {
    name: String,
    access_flags: ClassAccessFlags,
    pool: ConstantPool,
    utf8s: FxHashMap<String, u16>,
    classes: FxHashMap<String, u16>,
    strings: FxHashMap<String, u16>,
    name_and_types: FxHashMap<(u16, u16), u16>,
    refs: FxHashMap<(ConstantTag, u16, u16), u16>,
    this_class: u16,
    super_class: u16,
    interfaces: Vec<u16>,
    fields: Vec<ProgramMember>,
    methods: Vec<ProgramMember>,
    attributes: Vec<Attribute>,
    kotlin_metadata: Option<KotlinMetadata>,
}

impl ClassBuilder {
    /// Starts a class with the given internal name and optional super class.
    #[must_use]
    pub fn new(name: &str, super_name: Option<&str>) -> Self {
        let mut builder = ClassBuilder {
            name: name.to_string(),
            access_flags: ClassAccessFlags::PUBLIC | ClassAccessFlags::SUPER,
            pool: ConstantPool::new(),
            utf8s: FxHashMap::default(),
            classes: FxHashMap::default(),
            strings: FxHashMap::default(),
            name_and_types: FxHashMap::default(),
            refs: FxHashMap::default(),
            this_class: 0,
            super_class: 0,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
            kotlin_metadata: None,
        };
        builder.this_class = builder.class_constant(name);
        if let Some(super_name) = super_name {
            builder.super_class = builder.class_constant(super_name);
        }
        builder
    }

    /// Sets the class access flags.
    pub fn access_flags(&mut self, flags: ClassAccessFlags) -> &mut Self {
        self.access_flags = flags;
        self
    }

    /// Appends a constant without deduplication and returns its index.
    pub fn constant(&mut self, constant: Constant) -> u16 {
        self.pool.push(constant)
    }

    /// Returns the index of a `Utf8` constant with the given text.
    pub fn utf8(&mut self, text: &str) -> u16 {
        if let Some(&index) = self.utf8s.get(text) {
            return index;
        }
        let index = self.pool.push(Constant::Utf8(text.to_string()));
        self.utf8s.insert(text.to_string(), index);
        index
    }

    /// Returns the index of a `Class` constant for the given internal name.
    pub fn class_constant(&mut self, name: &str) -> u16 {
        if let Some(&index) = self.classes.get(name) {
            return index;
        }
        let name_index = self.utf8(name);
        let index = self.pool.push(Constant::Class {
            name_index,
            referenced_class: None,
        });
        self.classes.insert(name.to_string(), index);
        index
    }

    /// Returns the index of a `String` constant with the given text.
    pub fn string(&mut self, text: &str) -> u16 {
        if let Some(&index) = self.strings.get(text) {
            return index;
        }
        let string_index = self.utf8(text);
        let index = self.pool.push(Constant::String {
            string_index,
            referenced_class: None,
            referenced_member: None,
        });
        self.strings.insert(text.to_string(), index);
        index
    }

    /// Appends an `Integer` constant.
    pub fn integer(&mut self, value: i32) -> u16 {
        self.pool.push(Constant::Integer(value))
    }

    /// Appends a `Long` constant (two slots).
    pub fn long(&mut self, value: i64) -> u16 {
        self.pool.push(Constant::Long(value))
    }

    /// Returns the index of a `NameAndType` constant.
    pub fn name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let name_index = self.utf8(name);
        let descriptor_index = self.utf8(descriptor);
        if let Some(&index) = self.name_and_types.get(&(name_index, descriptor_index)) {
            return index;
        }
        let index = self.pool.push(Constant::NameAndType {
            name_index,
            descriptor_index,
        });
        self.name_and_types
            .insert((name_index, descriptor_index), index);
        index
    }

    fn reference(&mut self, tag: ConstantTag, class: &str, name: &str, descriptor: &str) -> u16 {
        let class_index = self.class_constant(class);
        let name_and_type_index = self.name_and_type(name, descriptor);
        if let Some(&index) = self.refs.get(&(tag, class_index, name_and_type_index)) {
            return index;
        }
        let payload = RefConstant {
            class_index,
            name_and_type_index,
            referenced_class: None,
            referenced_member: None,
        };
        let constant = match tag {
            ConstantTag::Fieldref => Constant::Fieldref(payload),
            ConstantTag::InterfaceMethodref => Constant::InterfaceMethodref(payload),
            _ => Constant::Methodref(payload),
        };
        let index = self.pool.push(constant);
        self.refs
            .insert((tag, class_index, name_and_type_index), index);
        index
    }

    /// Returns the index of a `Fieldref` constant.
    pub fn field_ref(&mut self, class: &str, name: &str, descriptor: &str) -> u16 {
        self.reference(ConstantTag::Fieldref, class, name, descriptor)
    }

    /// Returns the index of a `Methodref` constant.
    pub fn method_ref(&mut self, class: &str, name: &str, descriptor: &str) -> u16 {
        self.reference(ConstantTag::Methodref, class, name, descriptor)
    }

    /// Returns the index of an `InterfaceMethodref` constant.
    pub fn interface_method_ref(&mut self, class: &str, name: &str, descriptor: &str) -> u16 {
        self.reference(ConstantTag::InterfaceMethodref, class, name, descriptor)
    }

    /// Appends a `MethodHandle` constant.
    pub fn method_handle(&mut self, reference_kind: u8, reference_index: u16) -> u16 {
        self.pool.push(Constant::MethodHandle {
            reference_kind,
            reference_index,
        })
    }

    /// Appends a `MethodType` constant.
    pub fn method_type(&mut self, descriptor: &str) -> u16 {
        let descriptor_index = self.utf8(descriptor);
        self.pool.push(Constant::MethodType {
            descriptor_index,
            referenced_classes: Vec::new(),
        })
    }

    /// Appends an `InvokeDynamic` constant bound to the given bootstrap method entry.
    pub fn invoke_dynamic(&mut self, bootstrap_method_attr_index: u16, name: &str, descriptor: &str) -> u16 {
        let name_and_type_index = self.name_and_type(name, descriptor);
        self.pool.push(Constant::InvokeDynamic(DynamicConstant {
            bootstrap_method_attr_index,
            name_and_type_index,
            referenced_classes: Vec::new(),
        }))
    }

    /// Appends a `Dynamic` constant bound to the given bootstrap method entry.
    pub fn dynamic(&mut self, bootstrap_method_attr_index: u16, name: &str, descriptor: &str) -> u16 {
        let name_and_type_index = self.name_and_type(name, descriptor);
        self.pool.push(Constant::Dynamic(DynamicConstant {
            bootstrap_method_attr_index,
            name_and_type_index,
            referenced_classes: Vec::new(),
        }))
    }

    /// Adds a direct interface and returns its `Class` constant index.
    pub fn interface(&mut self, name: &str) -> u16 {
        let index = self.class_constant(name);
        self.interfaces.push(index);
        index
    }

    /// Adds a field without attributes.
    pub fn field(&mut self, flags: MemberAccessFlags, name: &str, descriptor: &str) -> NodeId {
        self.field_with_attributes(flags, name, descriptor, Vec::new())
    }

    /// Adds a field with attributes.
    pub fn field_with_attributes(
        &mut self,
        flags: MemberAccessFlags,
        name: &str,
        descriptor: &str,
        attributes: Vec<Attribute>,
    ) -> NodeId {
        let name_index = self.utf8(name);
        let descriptor_index = self.utf8(descriptor);
        let field = ProgramMember::new(MemberKind::Field, flags, name_index, descriptor_index, attributes);
        let id = field.id;
        self.fields.push(field);
        id
    }

    /// Adds a method with attributes.
    pub fn method(
        &mut self,
        flags: MemberAccessFlags,
        name: &str,
        descriptor: &str,
        attributes: Vec<Attribute>,
    ) -> NodeId {
        let name_index = self.utf8(name);
        let descriptor_index = self.utf8(descriptor);
        let method = ProgramMember::new(MemberKind::Method, flags, name_index, descriptor_index, attributes);
        let id = method.id;
        self.methods.push(method);
        id
    }

    /// Creates an attribute whose name constant is derived from its kind.
    pub fn new_attribute(&mut self, info: AttributeInfo) -> Attribute {
        let name_index = self.utf8(info.name());
        Attribute::new(name_index, info)
    }

    /// Creates an attribute with an explicit name, for undecoded attributes.
    pub fn named_attribute(&mut self, name: &str, info: AttributeInfo) -> Attribute {
        let name_index = self.utf8(name);
        Attribute::new(name_index, info)
    }

    /// Creates a `Code` attribute.
    pub fn code(&mut self, max_stack: u16, max_locals: u16, code: Vec<u8>, attributes: Vec<Attribute>) -> Attribute {
        self.new_attribute(AttributeInfo::Code(CodeAttribute {
            max_stack,
            max_locals,
            code,
            exception_table: Vec::new(),
            attributes,
        }))
    }

    /// Adds a class attribute and returns its identity.
    pub fn attribute(&mut self, info: AttributeInfo) -> NodeId {
        let attribute = self.new_attribute(info);
        let id = attribute.id;
        self.attributes.push(attribute);
        id
    }

    /// Creates an annotation of the given type descriptor, e.g. `Lkotlin/Metadata;`.
    pub fn annotation(&mut self, type_descriptor: &str, element_values: Vec<ElementValue>) -> Annotation {
        let type_index = self.utf8(type_descriptor);
        Annotation::new(type_index, element_values)
    }

    /// Attaches Kotlin metadata.
    pub fn kotlin_metadata(&mut self, metadata: KotlinMetadata) -> &mut Self {
        self.kotlin_metadata = Some(metadata);
        self
    }

    /// Finishes the class.
    #[must_use]
    pub fn build(self) -> ProgramClass {
        ProgramClass {
            id: NodeId::fresh(),
            name: self.name,
            access_flags: self.access_flags,
            constant_pool: self.pool,
            this_class: self.this_class,
            super_class: self.super_class,
            interfaces: self.interfaces,
            fields: self.fields,
            methods: self.methods,
            attributes: self.attributes,
            subclasses: Vec::new(),
            kotlin_metadata: self.kotlin_metadata,
        }
    }
}

/// Builder for [`LibraryClass`]es.
///
/// # Examples
///
/// ```rust
/// use classhrink::model::{LibraryClassBuilder, MemberAccessFlags};
///
/// let runnable = LibraryClassBuilder::new("java/lang/Runnable")
///     .super_class("java/lang/Object")
///     .method(MemberAccessFlags::PUBLIC | MemberAccessFlags::ABSTRACT, "run", "()V")
///     .build();
/// assert_eq!(runnable.methods.len(), 1);
/// ```
pub struct LibraryClassBuilder {
    class: LibraryClass,
}

impl LibraryClassBuilder {
    /// Starts a library class with the given internal name.
    #[must_use]
    pub fn new(name: &str) -> Self {
        LibraryClassBuilder {
            class: LibraryClass {
                id: NodeId::fresh(),
                name: name.to_string(),
                access_flags: ClassAccessFlags::PUBLIC,
                super_name: None,
                interface_names: Vec::new(),
                super_class: None,
                interfaces: Vec::new(),
                fields: Vec::new(),
                methods: Vec::new(),
                subclasses: Vec::new(),
            },
        }
    }

    /// Sets the access flags.
    #[must_use]
    pub fn access_flags(mut self, flags: ClassAccessFlags) -> Self {
        self.class.access_flags = flags;
        self
    }

    /// Sets the super class by internal name.
    #[must_use]
    pub fn super_class(mut self, name: &str) -> Self {
        self.class.super_name = Some(name.to_string());
        self
    }

    /// Adds a direct interface by internal name.
    #[must_use]
    pub fn interface(mut self, name: &str) -> Self {
        self.class.interface_names.push(name.to_string());
        self
    }

    /// Adds a field.
    #[must_use]
    pub fn field(mut self, flags: MemberAccessFlags, name: &str, descriptor: &str) -> Self {
        self.class
            .fields
            .push(LibraryMember::new(MemberKind::Field, flags, name, descriptor));
        self
    }

    /// Adds a method.
    #[must_use]
    pub fn method(mut self, flags: MemberAccessFlags, name: &str, descriptor: &str) -> Self {
        self.class
            .methods
            .push(LibraryMember::new(MemberKind::Method, flags, name, descriptor));
        self
    }

    /// Finishes the class.
    #[must_use]
    pub fn build(self) -> LibraryClass {
        self.class
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_deduplication() {
        let mut builder = ClassBuilder::new("com/example/Foo", Some("java/lang/Object"));
        let a = builder.method_ref("com/example/Bar", "run", "()V");
        let b = builder.method_ref("com/example/Bar", "run", "()V");
        let c = builder.interface_method_ref("com/example/Bar", "run", "()V");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(builder.utf8("run"), builder.utf8("run"));
        assert_eq!(builder.class_constant("com/example/Foo"), 2);
    }

    #[test]
    fn test_class_layout() {
        let mut builder = ClassBuilder::new("com/example/Foo", Some("java/lang/Object"));
        builder.interface("java/lang/Runnable");
        builder.attribute(AttributeInfo::Deprecated);
        let class = builder.build();

        assert_eq!(class.this_class, 2);
        assert_eq!(class.constant_pool.class_name(class.super_class), Some("java/lang/Object"));
        assert_eq!(class.interfaces.len(), 1);
        assert_eq!(class.attributes.len(), 1);
        assert_eq!(
            class.constant_pool.utf8(class.attributes[0].name_index),
            Some("Deprecated")
        );
    }

    #[test]
    fn test_long_reserves_two_slots() {
        let mut builder = ClassBuilder::new("com/example/Foo", None);
        let long = builder.long(1);
        let next = builder.integer(2);
        assert_eq!(next, long + 2);
    }
}
