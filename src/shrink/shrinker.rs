//! Compaction of program classes.
//!
//! After marking reaches closure, [`ClassShrinker`] rewrites every program class so that
//! only marked nodes remain:
//!
//! - constant pool slots keep their index; unused slots become `Empty` tombstones and
//!   trailing tombstones are dropped;
//! - interfaces, fields, methods and every attribute-level list are filtered in order;
//! - bootstrap method entries are renumbered and the `Dynamic`/`InvokeDynamic` constants
//!   using them are remapped;
//! - weak references to classes that do not survive are reset.
//!
//! Library classes are never compacted.

use tracing::debug;

use crate::{
    model::{
        Annotation, Attribute, AttributeInfo, ClassId, ClassNode, ClassPool, Constant,
        ConstantPool, ElementValue, ElementValueKind, NodeId, ProgramClass,
    },
    shrink::{KotlinShrinker, UsageMarker},
    utils::ClassSet,
    Result,
};

/// What compaction removed from one class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassShrinkStats {
    /// Constant pool slots turned into tombstones or truncated
    pub removed_constants: usize,
    /// Removed fields
    pub removed_fields: usize,
    /// Removed methods
    pub removed_methods: usize,
    /// Removed attributes and attribute-level entries
    pub removed_attributes: usize,
    /// Removed Kotlin declarations, including dropped metadata
    pub removed_kotlin_declarations: usize,
}

/// Compacts program classes according to the marks of a finished closure.
///
/// The set of surviving classes is captured at construction, so compaction never needs
/// to look at other classes while one is being rewritten.
pub struct ClassShrinker<'m, M: UsageMarker> {
    marker: &'m M,
    live: ClassSet,
}

impl<'m, M: UsageMarker> ClassShrinker<'m, M> {
    /// Creates a shrinker for `pool` with the given marks.
    #[must_use]
    pub fn new(pool: &ClassPool, marker: &'m M) -> Self {
        let live = pool
            .iter()
            .filter(|(_, class)| marker.is_used(class.id()))
            .map(|(id, _)| id)
            .collect();
        ClassShrinker { marker, live }
    }

    /// Returns `true` if the class survives compaction.
    #[must_use]
    pub fn is_live(&self, class: ClassId) -> bool {
        self.live.contains(class)
    }

    /// The classes that survive compaction.
    #[must_use]
    pub fn live_classes(&self) -> &ClassSet {
        &self.live
    }

    /// Compacts one program class in place.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UnsupportedOperation`] without touching the pool if
    /// `class` is a library class, and [`crate::Error::Malformed`] if a surviving
    /// dynamic constant refers to a bootstrap method that was removed.
    pub fn shrink_class(&self, pool: &mut ClassPool, class: ClassId) -> Result<ClassShrinkStats> {
        let program = match pool.class_mut(class)? {
            ClassNode::Program(program) => program,
            ClassNode::Library(library) => {
                return Err(unsupported_error!("shrink_class", library.name));
            }
        };
        let bootstrap_mapping = self.bootstrap_mapping(program)?;

        let mut stats = ClassShrinkStats {
            removed_constants: shrink_constant_pool(self.marker, &mut program.constant_pool),
            ..ClassShrinkStats::default()
        };

        let class_used = self.marker.is_used(program.id);
        if !class_used || program.constant_pool.is_tombstone(program.this_class) {
            program.this_class = 0;
        }
        if !class_used || program.constant_pool.is_tombstone(program.super_class) {
            program.super_class = 0;
        }
        let constant_pool = &program.constant_pool;
        program
            .interfaces
            .retain(|&index| !constant_pool.is_tombstone(index));

        remap_bootstrap_methods(program, &bootstrap_mapping);

        let fields = program.fields.len();
        program.fields.retain(|field| self.marker.is_used(field.id));
        stats.removed_fields = fields - program.fields.len();

        let methods = program.methods.len();
        program.methods.retain(|method| self.marker.is_used(method.id));
        stats.removed_methods = methods - program.methods.len();

        for member in program.fields.iter_mut().chain(program.methods.iter_mut()) {
            stats.removed_attributes += self.shrink_attributes(&mut member.attributes);
        }
        stats.removed_attributes += self.shrink_attributes(&mut program.attributes);

        program.subclasses.retain(|&subclass| self.live.contains(subclass));

        if let Some(metadata) = &mut program.kotlin_metadata {
            if self.marker.is_used(metadata.id) {
                stats.removed_kotlin_declarations =
                    KotlinShrinker::new(self.marker, &self.live).shrink_metadata(metadata);
            } else {
                program.kotlin_metadata = None;
                stats.removed_kotlin_declarations = 1;
            }
        }

        debug!(
            class = %program.name,
            used = class_used,
            removed_constants = stats.removed_constants,
            removed_fields = stats.removed_fields,
            removed_methods = stats.removed_methods,
            removed_attributes = stats.removed_attributes,
            "compacted class"
        );
        Ok(stats)
    }

    /// Numbers the kept bootstrap methods of `program`, and checks that every kept
    /// dynamic constant still has its bootstrap method before anything is removed.
    fn bootstrap_mapping(&self, program: &ProgramClass) -> Result<Vec<Option<u16>>> {
        let mapping: Vec<Option<u16>> = match program.bootstrap_methods() {
            Some((attribute, entries)) if self.marker.is_used(attribute.id) => {
                let mut next = 0u16;
                entries
                    .iter()
                    .map(|entry| {
                        self.marker.is_used(entry.id).then(|| {
                            let index = next;
                            next += 1;
                            index
                        })
                    })
                    .collect()
            }
            _ => Vec::new(),
        };

        for (index, slot) in program.constant_pool.iter() {
            if !self.marker.is_used(slot.id) {
                continue;
            }
            if let Constant::Dynamic(dynamic) | Constant::InvokeDynamic(dynamic) = &slot.constant {
                let old = dynamic.bootstrap_method_attr_index;
                if mapping.get(usize::from(old)).copied().flatten().is_none() {
                    return Err(malformed_error!(
                        "Constant {} of {} uses removed bootstrap method {}",
                        index,
                        program.name,
                        old
                    ));
                }
            }
        }
        Ok(mapping)
    }

    /// Filters an attribute list and everything nested in it. Returns the number of
    /// removed attributes and entries.
    fn shrink_attributes(&self, attributes: &mut Vec<Attribute>) -> usize {
        let before = attributes.len();
        attributes.retain(|attribute| self.marker.is_used(attribute.id));
        let mut removed = before - attributes.len();
        for attribute in attributes.iter_mut() {
            removed += self.shrink_attribute(&mut attribute.info);
        }
        removed
    }

    fn shrink_attribute(&self, info: &mut AttributeInfo) -> usize {
        match info {
            AttributeInfo::Signature {
                referenced_classes, ..
            } => {
                self.reset_dead_classes(referenced_classes);
                0
            }
            AttributeInfo::BootstrapMethods(entries) => self.retain_used(entries, |entry| entry.id),
            AttributeInfo::InnerClasses(entries) => self.retain_used(entries, |entry| entry.id),
            AttributeInfo::Record(components) => {
                let mut removed = self.retain_used(components, |component| component.id);
                for component in components.iter_mut() {
                    removed += self.shrink_attributes(&mut component.attributes);
                }
                removed
            }
            AttributeInfo::Code(code) => self.shrink_attributes(&mut code.attributes),
            AttributeInfo::LocalVariableTable(variables) => self.retain_used(variables, |variable| variable.id),
            AttributeInfo::LocalVariableTypeTable(types) => {
                let removed = self.retain_used(types, |variable_type| variable_type.id);
                for variable_type in types.iter_mut() {
                    self.reset_dead_classes(&mut variable_type.referenced_classes);
                }
                removed
            }
            AttributeInfo::RuntimeVisibleAnnotations(annotations)
            | AttributeInfo::RuntimeInvisibleAnnotations(annotations) => self.shrink_annotations(annotations),
            AttributeInfo::RuntimeVisibleParameterAnnotations(table)
            | AttributeInfo::RuntimeInvisibleParameterAnnotations(table) => {
                let mut removed = 0;
                for (parameter, annotations) in table.parameter_annotations.iter_mut().enumerate() {
                    removed += self.shrink_annotations(annotations);
                    // counts that exist are updated, a short count table is left as is
                    if let Some(count) = table.annotations_count.get_mut(parameter) {
                        *count = u16::try_from(annotations.len()).unwrap_or(u16::MAX);
                    }
                }
                removed
            }
            AttributeInfo::AnnotationDefault(value) => self.shrink_element_value(value),
            AttributeInfo::SourceFile { .. }
            | AttributeInfo::Deprecated
            | AttributeInfo::Synthetic
            | AttributeInfo::ConstantValue { .. }
            | AttributeInfo::Exceptions { .. }
            | AttributeInfo::EnclosingMethod { .. }
            | AttributeInfo::LineNumberTable(_)
            | AttributeInfo::Unknown(_) => 0,
        }
    }

    fn shrink_annotations(&self, annotations: &mut Vec<Annotation>) -> usize {
        let mut removed = self.retain_used(annotations, |annotation| annotation.id);
        for annotation in annotations.iter_mut() {
            removed += self.shrink_element_values(&mut annotation.element_values);
        }
        removed
    }

    fn shrink_element_values(&self, values: &mut Vec<ElementValue>) -> usize {
        let mut removed = self.retain_used(values, |value| value.id);
        for value in values.iter_mut() {
            removed += self.shrink_element_value(value);
        }
        removed
    }

    fn shrink_element_value(&self, value: &mut ElementValue) -> usize {
        match &mut value.value {
            ElementValueKind::Annotation(annotation) => self.shrink_element_values(&mut annotation.element_values),
            ElementValueKind::Array(values) => self.shrink_element_values(values),
            ElementValueKind::Constant { .. } | ElementValueKind::Enum { .. } | ElementValueKind::Class { .. } => 0,
        }
    }

    fn retain_used<T>(&self, entries: &mut Vec<T>, id: impl Fn(&T) -> NodeId) -> usize {
        let before = entries.len();
        entries.retain(|entry| self.marker.is_used(id(entry)));
        before - entries.len()
    }

    fn reset_dead_classes(&self, classes: &mut [Option<ClassId>]) {
        for class in classes.iter_mut() {
            if class.is_some_and(|class| !self.live.contains(class)) {
                *class = None;
            }
        }
    }
}

/// Points the dynamic constants left after compaction at their renumbered bootstrap
/// methods. `mapping` comes from `ClassShrinker::bootstrap_mapping`.
fn remap_bootstrap_methods(program: &mut ProgramClass, mapping: &[Option<u16>]) {
    for (_, slot) in program.constant_pool.iter_mut() {
        if let Constant::Dynamic(dynamic) | Constant::InvokeDynamic(dynamic) = &mut slot.constant {
            if let Some(index) = mapping
                .get(usize::from(dynamic.bootstrap_method_attr_index))
                .copied()
                .flatten()
            {
                dynamic.bootstrap_method_attr_index = index;
            }
        }
    }
}

/// Tombstones unused slots and drops trailing tombstones. Returns the number of slots
/// that held a constant before and no longer do.
fn shrink_constant_pool<M: UsageMarker>(marker: &M, pool: &mut ConstantPool) -> usize {
    let mut removed = 0;
    let mut live_end = 1;
    for (index, slot) in pool.iter_mut().skip(1) {
        if slot.constant.is_empty() {
            continue;
        }
        if marker.is_used(slot.id) {
            live_end = usize::from(index) + slot.constant.width();
        } else {
            slot.constant = Constant::Empty;
            removed += 1;
        }
    }
    pool.truncate(live_end);
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::{linker::link, BootstrapMethod, ClassBuilder, MemberAccessFlags, ParameterAnnotations},
        shrink::{ClassUsageMarker, ShrinkConfig, SimpleUsageMarker},
        test::object_pool,
        Error,
    };

    #[test]
    fn test_unused_class_is_emptied() {
        let mut pool = object_pool();
        let mut foo = ClassBuilder::new("com/example/Foo", Some("java/lang/Object"));
        foo.method(MemberAccessFlags::PUBLIC, "run", "()V", Vec::new());
        let foo_id = pool.add_program(foo.build());
        link(&mut pool).unwrap();

        let marker = SimpleUsageMarker::new();
        let stats = ClassShrinker::new(&pool, &marker)
            .shrink_class(&mut pool, foo_id)
            .unwrap();

        let class = pool.program_class(foo_id).unwrap();
        assert_eq!(class.constant_pool.len(), 1);
        assert_eq!(class.this_class, 0);
        assert_eq!(class.super_class, 0);
        assert!(class.methods.is_empty());
        assert_eq!(stats.removed_methods, 1);
    }

    #[test]
    fn test_library_class_is_rejected() {
        let mut pool = object_pool();
        let object = pool.find("java/lang/Object").unwrap();
        let marker = SimpleUsageMarker::new();
        let shrinker = ClassShrinker::new(&pool, &marker);
        assert!(matches!(
            shrinker.shrink_class(&mut pool, object),
            Err(Error::UnsupportedOperation { .. })
        ));
    }

    #[test]
    fn test_used_slots_keep_their_index() {
        let mut pool = object_pool();
        let mut foo = ClassBuilder::new("com/example/Foo", Some("java/lang/Object"));
        let dead = foo.utf8("dead");
        let long = foo.long(42);
        let text = foo.utf8("alive");
        let foo_id = pool.add_program(foo.build());
        link(&mut pool).unwrap();

        let config = ShrinkConfig::default();
        let mut marker = SimpleUsageMarker::new();
        let mut propagator = ClassUsageMarker::new(&pool, &mut marker, &config);
        propagator.mark_class(foo_id).unwrap();
        propagator.mark_constant(foo_id, long).unwrap();
        propagator.mark_constant(foo_id, text).unwrap();

        ClassShrinker::new(&pool, &marker)
            .shrink_class(&mut pool, foo_id)
            .unwrap();
        let constants = &pool.program_class(foo_id).unwrap().constant_pool;
        assert!(constants.is_tombstone(dead));
        assert!(matches!(constants.get(long), Some(Constant::Long(42))));
        assert_eq!(constants.utf8(text), Some("alive"));
        assert_eq!(constants.len(), usize::from(text) + 1);
    }

    #[test]
    fn test_bootstrap_methods_are_renumbered() {
        let mut pool = object_pool();
        let mut foo = ClassBuilder::new("com/example/Foo", Some("java/lang/Object"));
        let handle_target = foo.method_ref("com/example/Foo", "bootstrap", "()V");
        let first_handle = foo.method_handle(6, handle_target);
        let second_target = foo.method_ref("com/example/Foo", "other", "()V");
        let second_handle = foo.method_handle(6, second_target);
        foo.attribute(AttributeInfo::BootstrapMethods(vec![
            BootstrapMethod::new(first_handle, Vec::new()),
            BootstrapMethod::new(second_handle, Vec::new()),
        ]));
        let unused_call = foo.invoke_dynamic(0, "first", "()V");
        let call = foo.invoke_dynamic(1, "second", "()V");
        let foo_id = pool.add_program(foo.build());
        link(&mut pool).unwrap();

        let config = ShrinkConfig::minimal();
        let mut marker = SimpleUsageMarker::new();
        let mut propagator = ClassUsageMarker::new(&pool, &mut marker, &config);
        propagator.mark_class(foo_id).unwrap();
        propagator.mark_constant(foo_id, call).unwrap();

        ClassShrinker::new(&pool, &marker)
            .shrink_class(&mut pool, foo_id)
            .unwrap();
        let class = pool.program_class(foo_id).unwrap();
        assert!(class.constant_pool.is_tombstone(unused_call));
        let Some(Constant::InvokeDynamic(dynamic)) = class.constant_pool.get(call) else {
            panic!("invokedynamic constant removed");
        };
        assert_eq!(dynamic.bootstrap_method_attr_index, 0);
        let (_, entries) = class.bootstrap_methods().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].bootstrap_method_ref, second_handle);
    }

    #[test]
    fn test_missing_bootstrap_method_leaves_class_untouched() {
        let mut pool = object_pool();
        let mut foo = ClassBuilder::new("com/example/Foo", Some("java/lang/Object"));
        let target = foo.method_ref("com/example/Foo", "bootstrap", "()V");
        let handle = foo.method_handle(6, target);
        foo.attribute(AttributeInfo::BootstrapMethods(vec![BootstrapMethod::new(handle, Vec::new())]));
        let dead = foo.utf8("dead");
        let call = foo.invoke_dynamic(0, "run", "()V");
        foo.method(MemberAccessFlags::PRIVATE, "unused", "()V", Vec::new());
        let foo_id = pool.add_program(foo.build());
        link(&mut pool).unwrap();

        let config = ShrinkConfig::minimal();
        let mut marker = SimpleUsageMarker::new();
        let mut propagator = ClassUsageMarker::new(&pool, &mut marker, &config);
        propagator.mark_class(foo_id).unwrap();
        propagator.mark_constant(foo_id, call).unwrap();
        let class = pool.program_class(foo_id).unwrap();
        let (_, entries) = class.bootstrap_methods().unwrap();
        let shrinker_marker = VetoMarker {
            inner: marker,
            vetoed: entries[0].id,
        };
        let (constants, this_class) = (class.constant_pool.len(), class.this_class);

        let result = ClassShrinker::new(&pool, &shrinker_marker).shrink_class(&mut pool, foo_id);
        assert!(matches!(result, Err(Error::Malformed { .. })));
        let class = pool.program_class(foo_id).unwrap();
        assert_eq!(class.constant_pool.len(), constants);
        assert!(!class.constant_pool.is_tombstone(dead));
        assert_eq!(class.this_class, this_class);
        assert_eq!(class.methods.len(), 1);
    }

    #[test]
    fn test_parameter_annotation_counts_follow_lists() {
        let mut pool = object_pool();
        let mut foo = ClassBuilder::new("com/example/Foo", Some("java/lang/Object"));
        let kept = foo.annotation("Lcom/example/Unresolved;", Vec::new());
        let dropped = foo.annotation("Lcom/example/Unresolved;", Vec::new());
        let dropped_id = dropped.id;
        let table = ParameterAnnotations::from_lists(vec![vec![kept, dropped], Vec::new()]);
        let attribute = foo.new_attribute(AttributeInfo::RuntimeVisibleParameterAnnotations(table));
        let method = foo.method(MemberAccessFlags::PUBLIC, "run", "(II)V", vec![attribute]);
        let foo_id = pool.add_program(foo.build());
        link(&mut pool).unwrap();

        let config = ShrinkConfig::default();
        let mut marker = SimpleUsageMarker::new();
        let mut propagator = ClassUsageMarker::new(&pool, &mut marker, &config);
        propagator.mark_class(foo_id).unwrap();
        propagator
            .mark_member(crate::model::MemberRef::new(foo_id, method))
            .unwrap();
        // a policy that vetoed the second annotation
        let shrinker_marker = VetoMarker {
            inner: marker,
            vetoed: dropped_id,
        };

        ClassShrinker::new(&pool, &shrinker_marker)
            .shrink_class(&mut pool, foo_id)
            .unwrap();
        let class = pool.program_class(foo_id).unwrap();
        let Some(AttributeInfo::RuntimeVisibleParameterAnnotations(table)) =
            class.methods[0].attributes.first().map(|attribute| &attribute.info)
        else {
            panic!("parameter annotations removed");
        };
        assert_eq!(table.annotations_count, [1, 0]);
        assert_eq!(table.parameter_annotations[0].len(), 1);
        assert!(table.parameter_annotations[1].is_empty());
    }

    /// Reports one node as unused regardless of its marks.
    struct VetoMarker {
        inner: SimpleUsageMarker,
        vetoed: NodeId,
    }

    impl UsageMarker for VetoMarker {
        fn is_used(&self, node: NodeId) -> bool {
            node != self.vetoed && self.inner.is_used(node)
        }

        fn is_possibly_used(&self, node: NodeId) -> bool {
            self.inner.is_possibly_used(node)
        }

        fn mark_as_used(&mut self, node: NodeId) {
            self.inner.mark_as_used(node);
        }

        fn mark_as_possibly_used(&mut self, node: NodeId) {
            self.inner.mark_as_possibly_used(node);
        }

        fn used_count(&self) -> usize {
            self.inner.used_count()
        }
    }
}
