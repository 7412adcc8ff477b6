//! Reference linker: resolves the weak references of a class pool by name.
//!
//! The shrinker consumes a fully linked class graph. In a complete tool chain the
//! class-file reader populates these references; [`link`] does the same for classes
//! assembled with [`crate::model::ClassBuilder`]. Names that do not resolve (classes
//! outside the pool, members that do not exist) are left as `None`.
//!
//! Linking is idempotent: every reference is recomputed from names, and subclass lists
//! are rebuilt from scratch.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::{
    model::{
        descriptor::{descriptor_class_names, field_type_class_name, signature_class_names},
        Annotation, Attribute, AttributeInfo, ClassId, ClassNode, ClassPool, Constant,
        ConstantPool, ElementValue, ElementValueKind, JvmMemberSignature, KotlinAnnotation,
        KotlinClassifier, KotlinDeclarationContainer, KotlinMetadataKind, KotlinProperty,
        KotlinType, KotlinTypeParameter, KotlinValueParameter, MemberKind, MemberRef, NodeId,
        ProgramClass, TypeAliasRef,
    },
    Result,
};

/// Resolves every weak reference in `pool` and rebuilds the subclass lists.
///
/// # Errors
///
/// Returns [`crate::Error::ClassNotFound`] only if the pool changes underneath the linker,
/// which cannot happen through this API; unresolvable names are not errors.
///
/// # Examples
///
/// ```rust
/// use classhrink::model::{linker::link, ClassBuilder, ClassPool, LibraryClassBuilder};
///
/// let mut pool = ClassPool::new();
/// let object = pool.add_library(LibraryClassBuilder::new("java/lang/Object").build());
/// let foo = pool.add_program(ClassBuilder::new("com/example/Foo", Some("java/lang/Object")).build());
/// link(&mut pool).unwrap();
///
/// assert_eq!(pool.class(foo).unwrap().super_class(), Some(object));
/// assert_eq!(pool.class(object).unwrap().subclasses(), &[foo]);
/// ```
pub fn link(pool: &mut ClassPool) -> Result<()> {
    let symbols = Symbols::collect(pool);

    for (index, _) in symbols.hierarchy.iter().enumerate() {
        let id = ClassId::new(index as u32);
        match pool.class_mut(id)? {
            ClassNode::Program(class) => link_program_class(&symbols, id, class),
            ClassNode::Library(class) => {
                class.super_class = class
                    .super_name
                    .as_deref()
                    .and_then(|name| symbols.find_class(name));
                class.interfaces = class
                    .interface_names
                    .iter()
                    .filter_map(|name| symbols.find_class(name))
                    .collect();
            }
        }
    }

    let mut edges = Vec::new();
    for (id, class) in pool.iter() {
        if let Some(parent) = class.super_class() {
            edges.push((parent, id));
        }
        for parent in class.interfaces() {
            edges.push((parent, id));
        }
    }
    for id in pool.iter().map(|(id, _)| id).collect::<Vec<_>>() {
        subclasses_mut(pool.class_mut(id)?).clear();
    }
    for (parent, child) in &edges {
        let subclasses = subclasses_mut(pool.class_mut(*parent)?);
        if !subclasses.contains(child) {
            subclasses.push(*child);
        }
    }

    debug!(
        classes = pool.len(),
        hierarchy_edges = edges.len(),
        "linked class pool"
    );
    Ok(())
}

fn subclasses_mut(class: &mut ClassNode) -> &mut Vec<ClassId> {
    match class {
        ClassNode::Program(class) => &mut class.subclasses,
        ClassNode::Library(class) => &mut class.subclasses,
    }
}

/// Name-addressed snapshot of the pool, taken before any class is mutated.
struct Symbols {
    classes: FxHashMap<String, ClassId>,
    hierarchy: Vec<ClassSymbols>,
    type_aliases: FxHashMap<String, TypeAliasRef>,
}

struct ClassSymbols {
    super_class: Option<ClassId>,
    interfaces: Vec<ClassId>,
    members: Vec<(MemberKind, String, String, NodeId)>,
}

impl Symbols {
    fn collect(pool: &ClassPool) -> Self {
        let classes: FxHashMap<String, ClassId> = pool
            .iter()
            .map(|(id, class)| (class.name().to_string(), id))
            .collect();
        let mut type_aliases = FxHashMap::default();

        let hierarchy = pool
            .iter()
            .map(|(id, class)| {
                let (super_name, interface_names): (Option<&str>, Vec<&str>) = match class {
                    ClassNode::Program(class) => {
                        if let Some(container) =
                            class.kotlin_metadata.as_ref().and_then(|m| m.container())
                        {
                            for alias in &container.type_aliases {
                                type_aliases.insert(
                                    alias.name.clone(),
                                    TypeAliasRef {
                                        container: id,
                                        alias: alias.id,
                                    },
                                );
                            }
                        }
                        (
                            class.constant_pool.class_name(class.super_class),
                            class
                                .interfaces
                                .iter()
                                .filter_map(|&index| class.constant_pool.class_name(index))
                                .collect(),
                        )
                    }
                    ClassNode::Library(class) => (
                        class.super_name.as_deref(),
                        class.interface_names.iter().map(String::as_str).collect(),
                    ),
                };
                ClassSymbols {
                    super_class: super_name.and_then(|name| classes.get(name).copied()),
                    interfaces: interface_names
                        .into_iter()
                        .filter_map(|name| classes.get(name).copied())
                        .collect(),
                    members: class
                        .members()
                        .into_iter()
                        .map(|m| (m.kind, m.name.to_string(), m.descriptor.to_string(), m.id))
                        .collect(),
                }
            })
            .collect();

        Symbols {
            classes,
            hierarchy,
            type_aliases,
        }
    }

    /// Finds a class by internal name; array descriptors resolve to their element class.
    fn find_class(&self, name: &str) -> Option<ClassId> {
        let name = if name.starts_with('[') {
            field_type_class_name(name)?
        } else {
            name
        };
        self.classes.get(name).copied()
    }

    fn find_classes<'n>(&self, names: impl IntoIterator<Item = &'n str>) -> Vec<ClassId> {
        names
            .into_iter()
            .filter_map(|name| self.find_class(name))
            .collect()
    }

    /// Finds a member in `class` or its ancestors, super classes first.
    fn resolve_member(
        &self,
        class: ClassId,
        kind: MemberKind,
        name: &str,
        descriptor: Option<&str>,
    ) -> Option<MemberRef> {
        let mut visited = FxHashSet::default();
        let mut pending = vec![class];
        while let Some(current) = pending.pop() {
            if !visited.insert(current) {
                continue;
            }
            let symbols = self.hierarchy.get(current.index())?;
            let found = symbols.members.iter().find(|(k, n, d, _)| {
                *k == kind
                    && n == name
                    && descriptor.map_or_else(|| d.starts_with("()"), |descriptor| d == descriptor)
            });
            if let Some((_, _, _, member)) = found {
                return Some(MemberRef::new(current, *member));
            }
            pending.extend(symbols.interfaces.iter().rev());
            pending.extend(symbols.super_class);
        }
        None
    }

    fn resolve_signature(&self, class: ClassId, kind: MemberKind, signature: Option<&JvmMemberSignature>) -> Option<MemberRef> {
        let signature = signature?;
        self.resolve_member(class, kind, &signature.name, Some(&signature.descriptor))
    }
}

/// Result of resolving one constant, computed before the pool is mutated.
enum Resolution {
    Class(Option<ClassId>),
    Member(Option<ClassId>, Option<MemberRef>),
    Classes(Vec<ClassId>),
}

fn link_program_class(symbols: &Symbols, id: ClassId, class: &mut ProgramClass) {
    link_constant_pool(symbols, &mut class.constant_pool);

    let pool = &class.constant_pool;
    for member in class.fields.iter_mut().chain(class.methods.iter_mut()) {
        member.referenced_classes = pool
            .utf8(member.descriptor_index)
            .map(|descriptor| symbols.find_classes(descriptor_class_names(descriptor)))
            .unwrap_or_default();
        link_attributes(symbols, id, pool, &mut member.attributes);
    }
    link_attributes(symbols, id, pool, &mut class.attributes);

    let class_name = class.name.as_str();
    if let Some(metadata) = class.kotlin_metadata.as_mut() {
        match &mut metadata.kind {
            KotlinMetadataKind::Class(kind) => {
                link_container(symbols, id, &mut kind.container);
                for constructor in &mut kind.constructors {
                    constructor.referenced_method = symbols.resolve_signature(
                        id,
                        MemberKind::Method,
                        constructor.jvm_signature.as_ref(),
                    );
                    link_value_parameters(symbols, &mut constructor.value_parameters);
                }
                link_types(symbols, &mut kind.super_types);
                link_type_parameters(symbols, &mut kind.type_parameters);
                kind.referenced_nested_classes = kind
                    .nested_class_names
                    .iter()
                    .map_while(|name| symbols.find_class(&format!("{class_name}${name}")))
                    .collect();
                kind.referenced_sealed_subclasses = kind
                    .sealed_subclass_names
                    .iter()
                    .map_while(|name| symbols.find_class(name))
                    .collect();
                let enum_descriptor = format!("L{class_name};");
                kind.referenced_enum_entries = kind
                    .enum_entry_names
                    .iter()
                    .map_while(|name| {
                        symbols.resolve_member(id, MemberKind::Field, name, Some(&enum_descriptor))
                    })
                    .collect();
                kind.referenced_companion = kind
                    .companion_object_name
                    .as_ref()
                    .and_then(|name| symbols.find_class(&format!("{class_name}${name}")));
            }
            KotlinMetadataKind::FileFacade(container)
            | KotlinMetadataKind::SyntheticClass(container) => {
                link_container(symbols, id, container);
            }
            KotlinMetadataKind::MultiFilePart(part) => {
                link_container(symbols, id, &mut part.container);
                part.referenced_facade = symbols.find_class(&part.facade_name);
            }
            KotlinMetadataKind::MultiFileFacade(facade) => {
                facade.referenced_part_classes = facade
                    .part_class_names
                    .iter()
                    .map_while(|name| symbols.find_class(name))
                    .collect();
            }
        }
    }
}

fn link_constant_pool(symbols: &Symbols, pool: &mut ConstantPool) {
    let resolutions: Vec<Option<Resolution>> = pool
        .iter()
        .map(|(_, slot)| match &slot.constant {
            Constant::Class { name_index, .. } => Some(Resolution::Class(
                pool.utf8(*name_index).and_then(|name| symbols.find_class(name)),
            )),
            Constant::Fieldref(reference)
            | Constant::Methodref(reference)
            | Constant::InterfaceMethodref(reference) => {
                let kind = if matches!(slot.constant, Constant::Fieldref(_)) {
                    MemberKind::Field
                } else {
                    MemberKind::Method
                };
                let owner = pool
                    .class_name(reference.class_index)
                    .and_then(|name| symbols.find_class(name));
                let member = owner.zip(pool.name_and_type(reference.name_and_type_index)).and_then(
                    |(owner, (name, descriptor))| {
                        symbols.resolve_member(owner, kind, name, Some(descriptor))
                    },
                );
                Some(Resolution::Member(owner, member))
            }
            Constant::String { string_index, .. } => {
                let class = pool
                    .utf8(*string_index)
                    .and_then(|text| symbols.find_class(&text.replace('.', "/")));
                Some(Resolution::Member(class, None))
            }
            Constant::MethodType {
                descriptor_index, ..
            } => Some(Resolution::Classes(
                pool.utf8(*descriptor_index)
                    .map(|descriptor| symbols.find_classes(descriptor_class_names(descriptor)))
                    .unwrap_or_default(),
            )),
            Constant::Dynamic(dynamic) | Constant::InvokeDynamic(dynamic) => {
                Some(Resolution::Classes(
                    pool.name_and_type(dynamic.name_and_type_index)
                        .map(|(_, descriptor)| {
                            symbols.find_classes(descriptor_class_names(descriptor))
                        })
                        .unwrap_or_default(),
                ))
            }
            _ => None,
        })
        .collect();

    for ((_, slot), resolution) in pool.iter_mut().zip(resolutions) {
        match (&mut slot.constant, resolution) {
            (Constant::Class { referenced_class, .. }, Some(Resolution::Class(class))) => {
                *referenced_class = class;
            }
            (
                Constant::Fieldref(reference)
                | Constant::Methodref(reference)
                | Constant::InterfaceMethodref(reference),
                Some(Resolution::Member(class, member)),
            ) => {
                reference.referenced_class = class;
                reference.referenced_member = member;
            }
            (
                Constant::String {
                    referenced_class, ..
                },
                Some(Resolution::Member(class, _)),
            ) => *referenced_class = class,
            (Constant::MethodType { referenced_classes, .. }, Some(Resolution::Classes(classes))) => {
                *referenced_classes = classes;
            }
            (
                Constant::Dynamic(dynamic) | Constant::InvokeDynamic(dynamic),
                Some(Resolution::Classes(classes)),
            ) => dynamic.referenced_classes = classes,
            _ => {}
        }
    }
}

fn link_attributes(symbols: &Symbols, id: ClassId, pool: &ConstantPool, attributes: &mut [Attribute]) {
    for attribute in attributes {
        match &mut attribute.info {
            AttributeInfo::Signature {
                signature_index,
                referenced_classes,
            } => {
                *referenced_classes = signature_references(symbols, pool, *signature_index);
            }
            AttributeInfo::EnclosingMethod {
                class_index,
                method_index,
                referenced_class,
                referenced_method,
            } => {
                *referenced_class = pool.referenced_class(*class_index);
                *referenced_method = referenced_class.zip(pool.name_and_type(*method_index)).and_then(
                    |(class, (name, descriptor))| {
                        symbols.resolve_member(class, MemberKind::Method, name, Some(descriptor))
                    },
                );
            }
            AttributeInfo::Record(components) => {
                for component in components {
                    component.referenced_classes = pool
                        .utf8(component.descriptor_index)
                        .map(|descriptor| symbols.find_classes(descriptor_class_names(descriptor)))
                        .unwrap_or_default();
                    link_attributes(symbols, id, pool, &mut component.attributes);
                }
            }
            AttributeInfo::Code(code) => link_attributes(symbols, id, pool, &mut code.attributes),
            AttributeInfo::LocalVariableTable(variables) => {
                for variable in variables {
                    variable.referenced_class = pool
                        .utf8(variable.descriptor_index)
                        .and_then(field_type_class_name)
                        .and_then(|name| symbols.find_class(name));
                }
            }
            AttributeInfo::LocalVariableTypeTable(types) => {
                for variable in types {
                    variable.referenced_classes =
                        signature_references(symbols, pool, variable.signature_index);
                }
            }
            AttributeInfo::RuntimeVisibleAnnotations(annotations)
            | AttributeInfo::RuntimeInvisibleAnnotations(annotations) => {
                for annotation in annotations {
                    link_annotation(symbols, pool, annotation);
                }
            }
            AttributeInfo::RuntimeVisibleParameterAnnotations(table)
            | AttributeInfo::RuntimeInvisibleParameterAnnotations(table) => {
                for annotation in table.parameter_annotations.iter_mut().flatten() {
                    link_annotation(symbols, pool, annotation);
                }
            }
            AttributeInfo::AnnotationDefault(value) => link_element_value(symbols, pool, value, None),
            AttributeInfo::SourceFile { .. }
            | AttributeInfo::Deprecated
            | AttributeInfo::Synthetic
            | AttributeInfo::ConstantValue { .. }
            | AttributeInfo::Exceptions { .. }
            | AttributeInfo::BootstrapMethods(_)
            | AttributeInfo::InnerClasses(_)
            | AttributeInfo::LineNumberTable(_)
            | AttributeInfo::Unknown(_) => {}
        }
    }
}

fn signature_references(symbols: &Symbols, pool: &ConstantPool, signature_index: u16) -> Vec<Option<ClassId>> {
    pool.utf8(signature_index)
        .map(|signature| {
            signature_class_names(signature)
                .iter()
                .map(|name| symbols.find_class(name))
                .collect()
        })
        .unwrap_or_default()
}

fn link_annotation(symbols: &Symbols, pool: &ConstantPool, annotation: &mut Annotation) {
    annotation.referenced_class = pool
        .utf8(annotation.type_index)
        .and_then(field_type_class_name)
        .and_then(|name| symbols.find_class(name));
    for value in &mut annotation.element_values {
        link_element_value(symbols, pool, value, annotation.referenced_class);
    }
}

fn link_element_value(
    symbols: &Symbols,
    pool: &ConstantPool,
    value: &mut ElementValue,
    annotation_class: Option<ClassId>,
) {
    value.referenced_method = annotation_class
        .zip(pool.utf8(value.element_name_index))
        .and_then(|(class, name)| symbols.resolve_member(class, MemberKind::Method, name, None));

    match &mut value.value {
        ElementValueKind::Constant { .. } => {}
        ElementValueKind::Enum {
            type_name_index,
            const_name_index,
            referenced_class,
            referenced_field,
        } => {
            let descriptor = pool.utf8(*type_name_index);
            *referenced_class = descriptor
                .and_then(field_type_class_name)
                .and_then(|name| symbols.find_class(name));
            *referenced_field = referenced_class
                .zip(descriptor)
                .zip(pool.utf8(*const_name_index))
                .and_then(|((class, descriptor), name)| {
                    symbols.resolve_member(class, MemberKind::Field, name, Some(descriptor))
                });
        }
        ElementValueKind::Class {
            class_info_index,
            referenced_classes,
        } => {
            *referenced_classes = pool
                .utf8(*class_info_index)
                .map(|descriptor| symbols.find_classes(descriptor_class_names(descriptor)))
                .unwrap_or_default();
        }
        ElementValueKind::Annotation(annotation) => link_annotation(symbols, pool, annotation),
        ElementValueKind::Array(values) => {
            for element in values {
                link_element_value(symbols, pool, element, annotation_class);
            }
        }
    }
}

fn link_container(symbols: &Symbols, id: ClassId, container: &mut KotlinDeclarationContainer) {
    for property in container
        .properties
        .iter_mut()
        .chain(container.local_delegated_properties.iter_mut())
    {
        link_property(symbols, id, property);
    }
    for function in &mut container.functions {
        function.referenced_method =
            symbols.resolve_signature(id, MemberKind::Method, function.jvm_signature.as_ref());
        link_value_parameters(symbols, &mut function.value_parameters);
        if let Some(receiver) = function.receiver_type.as_mut() {
            link_type(symbols, receiver);
        }
        link_type(symbols, &mut function.return_type);
        link_type_parameters(symbols, &mut function.type_parameters);
    }
    for alias in &mut container.type_aliases {
        link_type(symbols, &mut alias.underlying_type);
        link_type(symbols, &mut alias.expanded_type);
        link_type_parameters(symbols, &mut alias.type_parameters);
        link_kotlin_annotations(symbols, &mut alias.annotations);
    }
}

fn link_property(symbols: &Symbols, id: ClassId, property: &mut KotlinProperty) {
    property.referenced_backing_field = symbols.resolve_signature(
        id,
        MemberKind::Field,
        property.backing_field_signature.as_ref(),
    );
    property.referenced_getter =
        symbols.resolve_signature(id, MemberKind::Method, property.getter_signature.as_ref());
    property.referenced_setter =
        symbols.resolve_signature(id, MemberKind::Method, property.setter_signature.as_ref());
    if let Some(receiver) = property.receiver_type.as_mut() {
        link_type(symbols, receiver);
    }
    link_type(symbols, &mut property.return_type);
    link_value_parameters(symbols, &mut property.setter_parameters);
    link_type_parameters(symbols, &mut property.type_parameters);
}

fn link_value_parameters(symbols: &Symbols, parameters: &mut [KotlinValueParameter]) {
    for parameter in parameters {
        link_type(symbols, &mut parameter.parameter_type);
        if let Some(element) = parameter.vararg_element_type.as_mut() {
            link_type(symbols, element);
        }
    }
}

fn link_type_parameters(symbols: &Symbols, parameters: &mut [KotlinTypeParameter]) {
    for parameter in parameters {
        link_types(symbols, &mut parameter.upper_bounds);
    }
}

fn link_types(symbols: &Symbols, types: &mut [KotlinType]) {
    for kotlin_type in types {
        link_type(symbols, kotlin_type);
    }
}

fn link_type(symbols: &Symbols, kotlin_type: &mut KotlinType) {
    match &mut kotlin_type.classifier {
        KotlinClassifier::Class {
            name,
            referenced_class,
        } => *referenced_class = symbols.find_class(name),
        KotlinClassifier::TypeAlias {
            name,
            referenced_alias,
        } => *referenced_alias = symbols.type_aliases.get(name.as_str()).copied(),
        KotlinClassifier::TypeParameter(_) => {}
    }
    link_types(symbols, &mut kotlin_type.type_arguments);
    if let Some(bounds) = kotlin_type.upper_bounds.as_mut() {
        link_types(symbols, bounds);
    }
    if let Some(abbreviation) = kotlin_type.abbreviation.as_mut() {
        link_type(symbols, abbreviation);
    }
    link_kotlin_annotations(symbols, &mut kotlin_type.annotations);
}

fn link_kotlin_annotations(symbols: &Symbols, annotations: &mut [KotlinAnnotation]) {
    for annotation in annotations {
        annotation.referenced_class = symbols.find_class(&annotation.class_name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClassBuilder, LibraryClassBuilder, MemberAccessFlags};

    #[test]
    fn test_link_member_references() {
        let mut pool = ClassPool::new();
        pool.add_library(
            LibraryClassBuilder::new("java/lang/Object")
                .method(MemberAccessFlags::PUBLIC, "toString", "()Ljava/lang/String;")
                .build(),
        );

        let mut base = ClassBuilder::new("com/example/Base", Some("java/lang/Object"));
        let run = base.method(MemberAccessFlags::PUBLIC, "run", "()V", Vec::new());
        let base_id = pool.add_program(base.build());

        let mut user = ClassBuilder::new("com/example/User", Some("com/example/Base"));
        let inherited = user.method_ref("com/example/User", "run", "()V");
        let library = user.method_ref("com/example/User", "toString", "()Ljava/lang/String;");
        let missing = user.method_ref("com/example/User", "nothing", "()V");
        let user_id = pool.add_program(user.build());

        link(&mut pool).unwrap();

        let user = pool.program_class(user_id).unwrap();
        let member = |index| match user.constant_pool.get(index) {
            Some(Constant::Methodref(reference)) => reference.referenced_member,
            _ => None,
        };
        assert_eq!(member(inherited), Some(MemberRef::new(base_id, run)));
        assert!(member(library).is_some());
        assert_eq!(member(missing), None);
        assert_eq!(pool.class(base_id).unwrap().subclasses(), &[user_id]);
    }

    #[test]
    fn test_link_is_idempotent() {
        let mut pool = ClassPool::new();
        let object = pool.add_library(LibraryClassBuilder::new("java/lang/Object").build());
        pool.add_program(ClassBuilder::new("com/example/Foo", Some("java/lang/Object")).build());
        link(&mut pool).unwrap();
        link(&mut pool).unwrap();
        assert_eq!(pool.class(object).unwrap().subclasses().len(), 1);
    }

    #[test]
    fn test_link_annotation_types() {
        let mut pool = ClassPool::new();
        pool.add_library(LibraryClassBuilder::new("kotlin/Metadata").build());

        let mut builder = ClassBuilder::new("com/example/Foo", None);
        let annotation = builder.annotation("Lkotlin/Metadata;", Vec::new());
        builder.attribute(AttributeInfo::RuntimeVisibleAnnotations(vec![annotation]));
        let foo = pool.add_program(builder.build());
        link(&mut pool).unwrap();

        let class = pool.program_class(foo).unwrap();
        match &class.attributes[0].info {
            AttributeInfo::RuntimeVisibleAnnotations(list) => {
                assert_eq!(list[0].referenced_class, pool.find("kotlin/Metadata"));
            }
            other => panic!("unexpected attribute {other:?}"),
        }
    }
}
