//! Kotlin declaration metadata attached to program classes.
//!
//! The Kotlin compiler stores a description of the source-level declarations of a class
//! (properties, functions, type aliases, constructors, sealed hierarchies...) in a
//! `kotlin.Metadata` annotation. This module holds the decoded form. Declarations
//! reference the JVM members that implement them through [`MemberRef`]s populated by the
//! linker from their JVM signatures.

use crate::model::{ClassId, MemberRef, NodeId};

/// Kotlin metadata attached to one class.
#[derive(Debug)]
pub struct KotlinMetadata {
    /// Identity used by markers
    pub id: NodeId,
    /// Kind-specific content
    pub kind: KotlinMetadataKind,
}

impl KotlinMetadata {
    /// Creates metadata with a fresh identity.
    #[must_use]
    pub fn new(kind: KotlinMetadataKind) -> Self {
        KotlinMetadata {
            id: NodeId::fresh(),
            kind,
        }
    }

    /// The declaration container of this metadata, if its kind has one.
    #[must_use]
    pub fn container(&self) -> Option<&KotlinDeclarationContainer> {
        match &self.kind {
            KotlinMetadataKind::Class(class) => Some(&class.container),
            KotlinMetadataKind::FileFacade(container)
            | KotlinMetadataKind::SyntheticClass(container) => Some(container),
            KotlinMetadataKind::MultiFilePart(part) => Some(&part.container),
            KotlinMetadataKind::MultiFileFacade(_) => None,
        }
    }
}

/// The kinds of Kotlin metadata.
#[derive(Debug)]
pub enum KotlinMetadataKind {
    /// A Kotlin class, interface or object
    Class(Box<KotlinClassKind>),
    /// The JVM class holding the top-level declarations of one source file
    FileFacade(KotlinDeclarationContainer),
    /// A compiler-generated class such as a lambda
    SyntheticClass(KotlinDeclarationContainer),
    /// One part of a multi-file facade
    MultiFilePart(KotlinMultiFilePartKind),
    /// A facade delegating to several multi-file parts
    MultiFileFacade(KotlinMultiFileFacadeKind),
}

/// The declarations common to every metadata kind that can own them.
#[derive(Debug, Default)]
pub struct KotlinDeclarationContainer {
    /// Properties
    pub properties: Vec<KotlinProperty>,
    /// Functions
    pub functions: Vec<KotlinFunction>,
    /// Type aliases
    pub type_aliases: Vec<KotlinTypeAlias>,
    /// Delegated properties declared locally inside functions
    pub local_delegated_properties: Vec<KotlinProperty>,
}

/// Metadata of a Kotlin class.
///
/// The nested-class, sealed-subclass and enum-entry names are parallel to their
/// referenced lists: entry `i` of the referenced list resolves name `i`.
#[derive(Debug, Default)]
pub struct KotlinClassKind {
    /// Declarations
    pub container: KotlinDeclarationContainer,
    /// Constructors
    pub constructors: Vec<KotlinConstructor>,
    /// Direct super types
    pub super_types: Vec<KotlinType>,
    /// Type parameters
    pub type_parameters: Vec<KotlinTypeParameter>,
    /// Simple names of nested classes
    pub nested_class_names: Vec<String>,
    /// Resolved nested classes (weak)
    pub referenced_nested_classes: Vec<ClassId>,
    /// Names of the permitted subclasses of a sealed class
    pub sealed_subclass_names: Vec<String>,
    /// Resolved sealed subclasses (weak)
    pub referenced_sealed_subclasses: Vec<ClassId>,
    /// Names of the entries of an enum class
    pub enum_entry_names: Vec<String>,
    /// Resolved enum entry fields (weak)
    pub referenced_enum_entries: Vec<MemberRef>,
    /// Simple name of the companion object
    pub companion_object_name: Option<String>,
    /// Resolved companion object (weak)
    pub referenced_companion: Option<ClassId>,
    /// Version requirement of the class
    pub version_requirement: Option<KotlinVersionRequirement>,
}

/// Metadata of one part of a multi-file facade.
#[derive(Debug, Default)]
pub struct KotlinMultiFilePartKind {
    /// Declarations
    pub container: KotlinDeclarationContainer,
    /// Internal name of the facade class
    pub facade_name: String,
    /// Resolved facade class (weak)
    pub referenced_facade: Option<ClassId>,
}

/// Metadata of a multi-file facade. Part names and part references are parallel.
#[derive(Debug, Default)]
pub struct KotlinMultiFileFacadeKind {
    /// Internal names of the part classes
    pub part_class_names: Vec<String>,
    /// Resolved part classes (weak)
    pub referenced_part_classes: Vec<ClassId>,
}

/// A JVM member signature as recorded in Kotlin metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JvmMemberSignature {
    /// Member name
    pub name: String,
    /// Member descriptor
    pub descriptor: String,
}

impl JvmMemberSignature {
    /// Creates a signature.
    #[must_use]
    pub fn new(name: &str, descriptor: &str) -> Self {
        JvmMemberSignature {
            name: name.to_string(),
            descriptor: descriptor.to_string(),
        }
    }
}

/// A Kotlin property.
#[derive(Debug)]
pub struct KotlinProperty {
    /// Identity used by markers
    pub id: NodeId,
    /// Property name
    pub name: String,
    /// Receiver type of an extension property
    pub receiver_type: Option<KotlinType>,
    /// Property type
    pub return_type: KotlinType,
    /// Parameters of the setter
    pub setter_parameters: Vec<KotlinValueParameter>,
    /// Type parameters
    pub type_parameters: Vec<KotlinTypeParameter>,
    /// JVM signature of the backing field
    pub backing_field_signature: Option<JvmMemberSignature>,
    /// JVM signature of the getter
    pub getter_signature: Option<JvmMemberSignature>,
    /// JVM signature of the setter
    pub setter_signature: Option<JvmMemberSignature>,
    /// Resolved backing field (weak)
    pub referenced_backing_field: Option<MemberRef>,
    /// Resolved getter (weak)
    pub referenced_getter: Option<MemberRef>,
    /// Resolved setter (weak)
    pub referenced_setter: Option<MemberRef>,
    /// Version requirement
    pub version_requirement: Option<KotlinVersionRequirement>,
}

impl KotlinProperty {
    /// Creates a property with a fresh identity and no JVM counterparts.
    #[must_use]
    pub fn new(name: &str, return_type: KotlinType) -> Self {
        KotlinProperty {
            id: NodeId::fresh(),
            name: name.to_string(),
            receiver_type: None,
            return_type,
            setter_parameters: Vec::new(),
            type_parameters: Vec::new(),
            backing_field_signature: None,
            getter_signature: None,
            setter_signature: None,
            referenced_backing_field: None,
            referenced_getter: None,
            referenced_setter: None,
            version_requirement: None,
        }
    }

    /// The resolved JVM members implementing this property.
    pub fn referenced_members(&self) -> impl Iterator<Item = MemberRef> + '_ {
        [
            self.referenced_backing_field,
            self.referenced_getter,
            self.referenced_setter,
        ]
        .into_iter()
        .flatten()
    }
}

/// A Kotlin function.
#[derive(Debug)]
pub struct KotlinFunction {
    /// Identity used by markers
    pub id: NodeId,
    /// Function name
    pub name: String,
    /// Value parameters
    pub value_parameters: Vec<KotlinValueParameter>,
    /// Receiver type of an extension function
    pub receiver_type: Option<KotlinType>,
    /// Return type
    pub return_type: KotlinType,
    /// Type parameters
    pub type_parameters: Vec<KotlinTypeParameter>,
    /// JVM signature of the implementing method
    pub jvm_signature: Option<JvmMemberSignature>,
    /// Resolved implementing method (weak)
    pub referenced_method: Option<MemberRef>,
    /// Version requirement
    pub version_requirement: Option<KotlinVersionRequirement>,
}

impl KotlinFunction {
    /// Creates a function with a fresh identity.
    #[must_use]
    pub fn new(name: &str, return_type: KotlinType) -> Self {
        KotlinFunction {
            id: NodeId::fresh(),
            name: name.to_string(),
            value_parameters: Vec::new(),
            receiver_type: None,
            return_type,
            type_parameters: Vec::new(),
            jvm_signature: None,
            referenced_method: None,
            version_requirement: None,
        }
    }
}

/// A Kotlin constructor.
#[derive(Debug)]
pub struct KotlinConstructor {
    /// Identity used by markers
    pub id: NodeId,
    /// Value parameters
    pub value_parameters: Vec<KotlinValueParameter>,
    /// JVM signature of the implementing `<init>` method
    pub jvm_signature: Option<JvmMemberSignature>,
    /// Resolved implementing method (weak)
    pub referenced_method: Option<MemberRef>,
    /// Version requirement
    pub version_requirement: Option<KotlinVersionRequirement>,
}

impl KotlinConstructor {
    /// Creates a constructor with a fresh identity.
    #[must_use]
    pub fn new(value_parameters: Vec<KotlinValueParameter>) -> Self {
        KotlinConstructor {
            id: NodeId::fresh(),
            value_parameters,
            jvm_signature: None,
            referenced_method: None,
            version_requirement: None,
        }
    }
}

/// A Kotlin type alias.
#[derive(Debug)]
pub struct KotlinTypeAlias {
    /// Identity used by markers
    pub id: NodeId,
    /// Alias name, as used by the classifiers of referencing types
    pub name: String,
    /// The aliased type as written
    pub underlying_type: KotlinType,
    /// The fully expanded aliased type
    pub expanded_type: KotlinType,
    /// Type parameters
    pub type_parameters: Vec<KotlinTypeParameter>,
    /// Annotations on the alias
    pub annotations: Vec<KotlinAnnotation>,
    /// Version requirement
    pub version_requirement: Option<KotlinVersionRequirement>,
}

impl KotlinTypeAlias {
    /// Creates a type alias with a fresh identity.
    #[must_use]
    pub fn new(name: &str, underlying_type: KotlinType, expanded_type: KotlinType) -> Self {
        KotlinTypeAlias {
            id: NodeId::fresh(),
            name: name.to_string(),
            underlying_type,
            expanded_type,
            type_parameters: Vec::new(),
            annotations: Vec::new(),
            version_requirement: None,
        }
    }
}

/// Weak reference to a type alias declared in some class's metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeAliasRef {
    /// The class whose metadata declares the alias
    pub container: ClassId,
    /// Identity of the alias
    pub alias: NodeId,
}

/// A value parameter of a function, constructor or property setter.
#[derive(Debug)]
pub struct KotlinValueParameter {
    /// Identity used by markers
    pub id: NodeId,
    /// Parameter name
    pub name: String,
    /// Parameter type
    pub parameter_type: KotlinType,
    /// Element type of a vararg parameter
    pub vararg_element_type: Option<KotlinType>,
}

impl KotlinValueParameter {
    /// Creates a parameter with a fresh identity.
    #[must_use]
    pub fn new(name: &str, parameter_type: KotlinType) -> Self {
        KotlinValueParameter {
            id: NodeId::fresh(),
            name: name.to_string(),
            parameter_type,
            vararg_element_type: None,
        }
    }
}

/// A type parameter.
#[derive(Debug)]
pub struct KotlinTypeParameter {
    /// Identity used by markers
    pub id: NodeId,
    /// Parameter name
    pub name: String,
    /// Upper bounds
    pub upper_bounds: Vec<KotlinType>,
}

impl KotlinTypeParameter {
    /// Creates a type parameter with a fresh identity.
    #[must_use]
    pub fn new(name: &str, upper_bounds: Vec<KotlinType>) -> Self {
        KotlinTypeParameter {
            id: NodeId::fresh(),
            name: name.to_string(),
            upper_bounds,
        }
    }
}

/// What a Kotlin type refers to.
#[derive(Debug)]
pub enum KotlinClassifier {
    /// A class, by internal name
    Class {
        /// Internal class name
        name: String,
        /// Resolved class (weak)
        referenced_class: Option<ClassId>,
    },
    /// A type parameter in scope, by id
    TypeParameter(u32),
    /// A type alias, by name
    TypeAlias {
        /// Alias name
        name: String,
        /// Resolved alias (weak)
        referenced_alias: Option<TypeAliasRef>,
    },
}

/// A Kotlin type.
#[derive(Debug)]
pub struct KotlinType {
    /// Identity used by markers
    pub id: NodeId,
    /// What the type refers to
    pub classifier: KotlinClassifier,
    /// Type arguments
    pub type_arguments: Vec<KotlinType>,
    /// Upper bound of a flexible type
    pub upper_bounds: Option<Vec<KotlinType>>,
    /// The type alias this type was written as
    pub abbreviation: Option<Box<KotlinType>>,
    /// Type annotations
    pub annotations: Vec<KotlinAnnotation>,
}

impl KotlinType {
    /// Creates a type with a fresh identity.
    #[must_use]
    pub fn new(classifier: KotlinClassifier) -> Self {
        KotlinType {
            id: NodeId::fresh(),
            classifier,
            type_arguments: Vec::new(),
            upper_bounds: None,
            abbreviation: None,
            annotations: Vec::new(),
        }
    }

    /// Creates a type referring to a class by internal name.
    #[must_use]
    pub fn class(name: &str) -> Self {
        Self::new(KotlinClassifier::Class {
            name: name.to_string(),
            referenced_class: None,
        })
    }

    /// Creates a type referring to a type alias by name.
    #[must_use]
    pub fn alias(name: &str) -> Self {
        Self::new(KotlinClassifier::TypeAlias {
            name: name.to_string(),
            referenced_alias: None,
        })
    }
}

/// An annotation on a Kotlin type or type alias.
#[derive(Debug)]
pub struct KotlinAnnotation {
    /// Identity used by markers
    pub id: NodeId,
    /// Internal name of the annotation class
    pub class_name: String,
    /// Resolved annotation class (weak)
    pub referenced_class: Option<ClassId>,
}

impl KotlinAnnotation {
    /// Creates an annotation with a fresh identity.
    #[must_use]
    pub fn new(class_name: &str) -> Self {
        KotlinAnnotation {
            id: NodeId::fresh(),
            class_name: class_name.to_string(),
            referenced_class: None,
        }
    }
}

/// A minimum compiler / language / API version a declaration requires.
#[derive(Debug)]
pub struct KotlinVersionRequirement {
    /// Identity used by markers
    pub id: NodeId,
    /// Required version as `major.minor.patch`
    pub version: (u32, u32, u32),
}

impl KotlinVersionRequirement {
    /// Creates a requirement with a fresh identity.
    #[must_use]
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        KotlinVersionRequirement {
            id: NodeId::fresh(),
            version: (major, minor, patch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_referenced_members() {
        let mut property = KotlinProperty::new("size", KotlinType::class("kotlin/Int"));
        assert_eq!(property.referenced_members().count(), 0);

        let getter = MemberRef::new(ClassId::new(0), NodeId::fresh());
        property.referenced_getter = Some(getter);
        assert_eq!(property.referenced_members().collect::<Vec<_>>(), vec![getter]);
    }

    #[test]
    fn test_metadata_container() {
        let facade = KotlinMetadata::new(KotlinMetadataKind::MultiFileFacade(
            KotlinMultiFileFacadeKind::default(),
        ));
        assert!(facade.container().is_none());

        let file = KotlinMetadata::new(KotlinMetadataKind::FileFacade(
            KotlinDeclarationContainer::default(),
        ));
        assert!(file.container().is_some());
    }
}
