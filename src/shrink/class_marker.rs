//! Structural mark propagation.
//!
//! [`ClassUsageMarker`] spreads marks from nodes already decided as used to everything
//! they structurally depend on: class hierarchy, constant pool, members, bytecode
//! constant operands, attributes, annotations and Kotlin metadata. Traversal is
//! depth-first in declaration order. Every mark goes through the
//! [`UsageMarker::should_be_marked_as_used`] gate, so a node is propagated at most once
//! and total work is bounded by the number of structural edges.
//!
//! # Entry points
//!
//! - gated: [`ClassUsageMarker::mark_class`], [`ClassUsageMarker::mark_member`],
//!   [`ClassUsageMarker::mark_constant`]
//! - propagation of already-used nodes: [`ClassUsageMarker::propagate_class`],
//!   [`ClassUsageMarker::propagate_member`]
//! - post-closure markers, re-run by the driver until nothing changes:
//!   [`ClassUsageMarker::mark_interfaces`], [`ClassUsageMarker::mark_inner_classes`],
//!   [`ClassUsageMarker::mark_retained_annotations`],
//!   [`ClassUsageMarker::mark_kotlin_metadata`]

use rustc_hash::FxHashSet;
use tracing::trace;

use crate::{
    model::{
        bytecode::constant_operands, Attribute, AttributeInfo, BootstrapMethod, ClassId,
        ClassNode, ClassPool, CodeAttribute, Constant, InnerClass, LibraryClass, MemberKind,
        MemberRef, NodeId, ProgramClass, CLINIT_DESCRIPTOR, CLINIT_NAME,
    },
    shrink::{
        AnnotationUsageMarker, LocalVariableTypeUsageMarker, Referrer, ShrinkConfig,
        UsageMarker, UsageReason,
    },
    Error, Result,
};

/// Propagates marks through the class graph of one pool.
///
/// # Examples
///
/// ```rust
/// use classhrink::model::{linker::link, ClassBuilder, ClassPool, LibraryClassBuilder};
/// use classhrink::shrink::{ClassUsageMarker, ShrinkConfig, SimpleUsageMarker, UsageMarker};
///
/// let mut pool = ClassPool::new();
/// let object = pool.add_library(LibraryClassBuilder::new("java/lang/Object").build());
/// let foo = pool.add_program(ClassBuilder::new("com/example/Foo", Some("java/lang/Object")).build());
/// link(&mut pool).unwrap();
///
/// let config = ShrinkConfig::default();
/// let mut marker = SimpleUsageMarker::new();
/// ClassUsageMarker::new(&pool, &mut marker, &config).mark_class(foo).unwrap();
///
/// assert!(marker.is_class_used(&pool, foo));
/// assert!(marker.is_class_used(&pool, object));
/// ```
pub struct ClassUsageMarker<'a, M: UsageMarker> {
    pool: &'a ClassPool,
    marker: &'a mut M,
    config: &'a ShrinkConfig,
}

impl<'a, M: UsageMarker> ClassUsageMarker<'a, M> {
    /// Creates a propagator writing into `marker`.
    pub fn new(pool: &'a ClassPool, marker: &'a mut M, config: &'a ShrinkConfig) -> Self {
        ClassUsageMarker {
            pool,
            marker,
            config,
        }
    }

    /// The marker being written.
    #[must_use]
    pub fn marker(&self) -> &M {
        self.marker
    }

    pub(crate) fn pool(&self) -> &'a ClassPool {
        self.pool
    }

    pub(crate) fn config(&self) -> &'a ShrinkConfig {
        self.config
    }

    /// Marks `node` as used if the marker allows it. Returns `true` if the node was newly
    /// marked and its dependents still need propagation.
    pub(crate) fn mark_node(&mut self, node: NodeId) -> bool {
        if self.marker.should_be_marked_as_used(node) {
            self.marker.mark_as_used(node);
            true
        } else {
            false
        }
    }

    /// Runs `f` with every mark it writes attributed to `reason` and `referrer`.
    pub(crate) fn with_reason<F>(&mut self, from: NodeId, reason: UsageReason, referrer: Referrer, f: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        let context = self.marker.enter_context(from, reason, referrer);
        let result = f(self);
        self.marker.leave_context(context);
        result
    }

    /// Marks a class as used and propagates into it, unless it is already used.
    ///
    /// # Errors
    ///
    /// Returns an error if the class or anything it depends on is malformed or does not
    /// resolve.
    pub fn mark_class(&mut self, class: ClassId) -> Result<()> {
        let node = self.pool.class(class)?;
        if self.mark_node(node.id()) {
            trace!(class = node.name(), "marked class");
            self.propagate_class(class)?;
        }
        Ok(())
    }

    /// Marks a member.
    ///
    /// Members of used classes and of library classes are marked as used and propagated.
    /// Members of classes that are not used (yet) only receive a possible mark; they are
    /// upgraded when their class becomes used.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MemberNotFound`] if the reference does not resolve, or any error
    /// raised while propagating.
    pub fn mark_member(&mut self, member: MemberRef) -> Result<()> {
        let class = self.pool.class(member.class)?;
        if class.member(member.member).is_none() {
            return Err(Error::MemberNotFound(member));
        }
        if class.is_library() || self.marker.is_used(class.id()) {
            self.mark_member_used(member)
        } else {
            if self.marker.should_be_marked_as_possibly_used(member.member) {
                self.marker.mark_as_possibly_used(member.member);
            }
            Ok(())
        }
    }

    fn mark_member_used(&mut self, member: MemberRef) -> Result<()> {
        if self.mark_node(member.member) {
            trace!(member = %member, "marked member");
            self.propagate_member(member)?;
        }
        Ok(())
    }

    /// Marks the constant at `index` of a program class and its dependencies. Index 0 is
    /// the reserved slot and is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConstantIndex`] for indices outside the pool,
    /// [`Error::Malformed`] for references to empty slots or missing bootstrap methods,
    /// and [`Error::UnsupportedOperation`] if `class` is a library class.
    pub fn mark_constant(&mut self, class: ClassId, index: u16) -> Result<()> {
        if index == 0 {
            return Ok(());
        }
        let pool = self.pool;
        let program = pool.program_class(class)?;
        let slot = program
            .constant_pool
            .slot(index)
            .ok_or_else(|| Error::InvalidConstantIndex {
                class: program.name.clone(),
                index,
            })?;
        if slot.constant.is_empty() {
            return Err(malformed_error!(
                "Reference to empty constant pool slot {} in {}",
                index,
                program.name
            ));
        }
        if !self.mark_node(slot.id) {
            return Ok(());
        }

        // targets are marked in the context of whoever referenced the constant
        match &slot.constant {
            Constant::Empty
            | Constant::Integer(_)
            | Constant::Float(_)
            | Constant::Long(_)
            | Constant::Double(_)
            | Constant::Utf8(_) => Ok(()),
            Constant::String {
                string_index,
                referenced_class,
                referenced_member,
            } => {
                self.mark_constant(class, *string_index)?;
                if let Some(target) = *referenced_class {
                    self.mark_class(target)?;
                }
                match *referenced_member {
                    Some(member) => self.mark_referenced_member(member),
                    None => Ok(()),
                }
            }
            Constant::Class {
                name_index,
                referenced_class,
            } => {
                self.mark_constant(class, *name_index)?;
                match *referenced_class {
                    Some(target) => self.mark_class(target),
                    None => Ok(()),
                }
            }
            Constant::Fieldref(reference)
            | Constant::Methodref(reference)
            | Constant::InterfaceMethodref(reference) => {
                self.mark_constant(class, reference.class_index)?;
                self.mark_constant(class, reference.name_and_type_index)?;
                match reference.referenced_member {
                    Some(member) => self.mark_referenced_member(member),
                    None => Ok(()),
                }
            }
            Constant::NameAndType {
                name_index,
                descriptor_index,
            } => {
                self.mark_constant(class, *name_index)?;
                self.mark_constant(class, *descriptor_index)
            }
            Constant::MethodHandle {
                reference_index, ..
            } => self.mark_constant(class, *reference_index),
            Constant::MethodType {
                descriptor_index,
                referenced_classes,
            } => {
                self.mark_constant(class, *descriptor_index)?;
                self.mark_classes(referenced_classes)
            }
            Constant::Dynamic(dynamic) | Constant::InvokeDynamic(dynamic) => {
                self.mark_constant(class, dynamic.name_and_type_index)?;
                self.mark_classes(&dynamic.referenced_classes)?;
                self.mark_bootstrap_method(class, program, dynamic.bootstrap_method_attr_index)
            }
            Constant::Module { name_index } | Constant::Package { name_index } => {
                self.mark_constant(class, *name_index)
            }
        }
    }

    /// Marks the resolved target of a member reference constant. The target may be
    /// declared in an ancestor of the referenced class, such as a default method of an
    /// interface, so its declaring class is marked first and the member is always used.
    fn mark_referenced_member(&mut self, member: MemberRef) -> Result<()> {
        self.mark_class(member.class)?;
        self.mark_member(member)
    }

    fn mark_classes(&mut self, classes: &[ClassId]) -> Result<()> {
        for &target in classes {
            self.mark_class(target)?;
        }
        Ok(())
    }

    /// Propagates into a class that is already used.
    ///
    /// # Errors
    ///
    /// Returns an error if anything reachable from the class is malformed.
    pub fn propagate_class(&mut self, class: ClassId) -> Result<()> {
        let pool = self.pool;
        match pool.class(class)? {
            ClassNode::Program(program) => self.propagate_program_class(class, program),
            ClassNode::Library(library) => self.propagate_library_class(class, library),
        }
    }

    fn propagate_program_class(&mut self, id: ClassId, class: &'a ProgramClass) -> Result<()> {
        let referrer = Referrer::class(id);

        self.with_reason(class.id, UsageReason::ReferencedBy, referrer, |s| {
            s.mark_constant(id, class.this_class)
        })?;
        self.with_reason(
            class.id,
            UsageReason::ExtendedBy,
            referrer.with_constant(class.super_class),
            |s| s.mark_constant(id, class.super_class),
        )?;
        self.mark_interface_hierarchy(id, class)?;

        if let Some(initializer) = class.find_method(CLINIT_NAME, CLINIT_DESCRIPTOR) {
            let member = MemberRef::new(id, initializer.id);
            self.with_reason(class.id, UsageReason::ClassInitializerOf, referrer, |s| {
                s.mark_member_used(member)
            })?;
        }

        self.with_reason(class.id, UsageReason::MemberOf, referrer, |s| {
            for member in class.fields.iter().chain(&class.methods) {
                if s.marker.is_possibly_used(member.id) {
                    s.mark_member_used(MemberRef::new(id, member.id))?;
                }
            }
            Ok(())
        })?;
        self.mark_overriding_methods(id, class)?;

        self.with_reason(class.id, UsageReason::ReferencedBy, referrer, |s| {
            s.mark_attributes(id, &class.attributes)
        })?;
        self.mark_kotlin_metadata(id)
    }

    fn propagate_library_class(&mut self, id: ClassId, class: &'a LibraryClass) -> Result<()> {
        let referrer = Referrer::class(id);
        if let Some(super_class) = class.super_class {
            self.with_reason(class.id, UsageReason::ExtendedBy, referrer, |s| {
                s.mark_class(super_class)
            })?;
        }
        self.with_reason(class.id, UsageReason::ImplementedBy, referrer, |s| {
            for &interface in &class.interfaces {
                s.mark_class(interface)?;
            }
            Ok(())
        })?;
        self.with_reason(class.id, UsageReason::MemberOf, referrer, |s| {
            for member in class.fields.iter().chain(&class.methods) {
                s.mark_member_used(MemberRef::new(id, member.id))?;
            }
            Ok(())
        })
    }

    /// Gives program interfaces a possible mark and marks library interfaces as used.
    fn mark_interface_hierarchy(&mut self, id: ClassId, class: &'a ProgramClass) -> Result<()> {
        let pool = self.pool;
        for &index in &class.interfaces {
            let referrer = Referrer::class(id).with_constant(index);
            match class.constant_pool.referenced_class(index) {
                Some(interface) if pool.class(interface)?.is_library() => {
                    if self.config.mark_library_interfaces {
                        self.with_reason(class.id, UsageReason::ImplementedBy, referrer, |s| {
                            s.mark_constant(id, index)
                        })?;
                    }
                }
                Some(interface) => self.mark_interface_possibly_used(interface)?,
                // unresolved interfaces cannot be judged, keep the reference intact
                None => self.with_reason(class.id, UsageReason::ImplementedBy, referrer, |s| {
                    s.mark_constant(id, index)
                })?,
            }
        }
        Ok(())
    }

    fn mark_interface_possibly_used(&mut self, interface: ClassId) -> Result<()> {
        let pool = self.pool;
        let node = pool.class(interface)?;
        if self.marker.should_be_marked_as_possibly_used(node.id()) {
            self.marker.mark_as_possibly_used(node.id());
            for parent in node.interfaces() {
                if !pool.class(parent)?.is_library() {
                    self.mark_interface_possibly_used(parent)?;
                }
            }
        }
        Ok(())
    }

    /// Marks methods of `class` that override a used method of an ancestor.
    fn mark_overriding_methods(&mut self, id: ClassId, class: &'a ProgramClass) -> Result<()> {
        for method in &class.methods {
            let info = class.member_info(method);
            if !info.is_overridable() || self.marker.is_used(method.id) {
                continue;
            }
            if let Some(overridden) = self.find_used_ancestor_method(id, info.name, info.descriptor)? {
                self.with_reason(
                    overridden.member,
                    UsageReason::Overrides,
                    Referrer::member(overridden),
                    |s| s.mark_member_used(MemberRef::new(id, method.id)),
                )?;
            }
        }
        Ok(())
    }

    fn find_used_ancestor_method(&self, class: ClassId, name: &str, descriptor: &str) -> Result<Option<MemberRef>> {
        let mut visited = FxHashSet::default();
        let start = self.pool.class(class)?;
        let mut pending: Vec<ClassId> = start.super_class().into_iter().collect();
        pending.extend(start.interfaces());
        while let Some(ancestor) = pending.pop() {
            if !visited.insert(ancestor) {
                continue;
            }
            let node = self.pool.class(ancestor)?;
            if let Some(method) = node.find_member(MemberKind::Method, name, descriptor) {
                if method.is_overridable() && self.marker.is_used(method.id) {
                    return Ok(Some(MemberRef::new(ancestor, method.id)));
                }
            }
            pending.extend(node.super_class());
            pending.extend(node.interfaces());
        }
        Ok(None)
    }

    /// Propagates into a member that is already used.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MemberNotFound`] if the reference does not resolve, or any error
    /// raised while propagating.
    pub fn propagate_member(&mut self, member: MemberRef) -> Result<()> {
        let pool = self.pool;
        let class = pool.class(member.class)?;
        let info = class
            .member(member.member)
            .ok_or(Error::MemberNotFound(member))?;

        if let ClassNode::Program(program) = class {
            let node = program
                .member(member.member)
                .ok_or(Error::MemberNotFound(member))?;
            self.with_reason(node.id, UsageReason::ReferencedBy, Referrer::member(member), |s| {
                s.mark_constant(member.class, node.name_index)?;
                s.mark_constant(member.class, node.descriptor_index)?;
                for &target in &node.referenced_classes {
                    s.mark_class(target)?;
                }
                s.mark_attributes(member.class, &node.attributes)
            })?;
        }

        if info.is_overridable() {
            self.with_reason(member.member, UsageReason::Overrides, Referrer::member(member), |s| {
                s.mark_implementations(member.class, info.name, info.descriptor)
            })?;
        }
        Ok(())
    }

    /// Marks implementations of a used method in all subclasses: used in used subclasses,
    /// possibly used elsewhere.
    fn mark_implementations(&mut self, class: ClassId, name: &str, descriptor: &str) -> Result<()> {
        let pool = self.pool;
        for &subclass in pool.class(class)?.subclasses() {
            let node = pool.class(subclass)?;
            let implementation = node
                .find_member(MemberKind::Method, name, descriptor)
                .filter(|method| method.is_overridable());
            if let Some(method) = implementation {
                self.mark_member(MemberRef::new(subclass, method.id))?;
                if self.marker.is_used(method.id) {
                    // the implementation's own propagation covers its subclasses
                    continue;
                }
            }
            self.mark_implementations(subclass, name, descriptor)?;
        }
        Ok(())
    }

    /// Marks an attribute list. Local-variable type tables are visited last so that they
    /// can be correlated with the local-variable tables of the same list.
    pub(crate) fn mark_attributes(&mut self, class: ClassId, attributes: &'a [Attribute]) -> Result<()> {
        let is_type_table =
            |attribute: &Attribute| matches!(attribute.info, AttributeInfo::LocalVariableTypeTable(_));
        for attribute in attributes.iter().filter(|a| !is_type_table(a)) {
            self.mark_attribute(class, attribute, attributes)?;
        }
        for attribute in attributes.iter().filter(|a| is_type_table(a)) {
            self.mark_attribute(class, attribute, attributes)?;
        }
        Ok(())
    }

    fn mark_attribute_header(&mut self, class: ClassId, attribute: &'a Attribute) -> Result<()> {
        if self.mark_node(attribute.id) {
            self.mark_constant(class, attribute.name_index)?;
        }
        Ok(())
    }

    fn mark_attribute(&mut self, class: ClassId, attribute: &'a Attribute, siblings: &'a [Attribute]) -> Result<()> {
        if let AttributeInfo::BootstrapMethods(entries) = &attribute.info {
            // otherwise entries are marked by the dynamic constants using them
            if self.config.keep_all_bootstrap_methods {
                self.mark_attribute_header(class, attribute)?;
                for entry in entries {
                    self.mark_bootstrap_entry(class, entry)?;
                }
            }
            return Ok(());
        }

        self.mark_attribute_header(class, attribute)?;
        match &attribute.info {
            AttributeInfo::SourceFile { sourcefile_index } => self.mark_constant(class, *sourcefile_index),
            AttributeInfo::ConstantValue {
                constant_value_index,
            } => self.mark_constant(class, *constant_value_index),
            AttributeInfo::Signature {
                signature_index, ..
            } => self.mark_constant(class, *signature_index),
            AttributeInfo::Exceptions {
                exception_index_table,
            } => {
                for &index in exception_index_table {
                    self.mark_constant(class, index)?;
                }
                Ok(())
            }
            AttributeInfo::InnerClasses(entries) => {
                if self.config.keep_all_inner_class_entries {
                    for entry in entries {
                        self.mark_inner_class_entry(class, entry)?;
                    }
                }
                Ok(())
            }
            AttributeInfo::EnclosingMethod {
                class_index,
                method_index,
                referenced_method,
                ..
            } => {
                self.mark_constant(class, *class_index)?;
                self.mark_constant(class, *method_index)?;
                match *referenced_method {
                    Some(method) => self.mark_member(method),
                    None => Ok(()),
                }
            }
            AttributeInfo::Record(components) => {
                for component in components {
                    if self.mark_node(component.id) {
                        self.mark_constant(class, component.name_index)?;
                        self.mark_constant(class, component.descriptor_index)?;
                        for &target in &component.referenced_classes {
                            self.mark_class(target)?;
                        }
                        self.mark_attributes(class, &component.attributes)?;
                    }
                }
                Ok(())
            }
            AttributeInfo::Code(code) => self.mark_code(class, code),
            AttributeInfo::LocalVariableTable(variables) => {
                LocalVariableTypeUsageMarker::mark_local_variables(self, class, variables)
            }
            AttributeInfo::LocalVariableTypeTable(types) => {
                LocalVariableTypeUsageMarker::mark_local_variable_types(self, class, types, siblings)
            }
            AttributeInfo::RuntimeVisibleAnnotations(annotations)
            | AttributeInfo::RuntimeInvisibleAnnotations(annotations) => {
                AnnotationUsageMarker::new(self.config).mark_annotations(self, class, annotations)
            }
            AttributeInfo::RuntimeVisibleParameterAnnotations(table)
            | AttributeInfo::RuntimeInvisibleParameterAnnotations(table) => {
                let annotations = AnnotationUsageMarker::new(self.config);
                for list in &table.parameter_annotations {
                    annotations.mark_annotations(self, class, list)?;
                }
                Ok(())
            }
            AttributeInfo::AnnotationDefault(value) => {
                AnnotationUsageMarker::new(self.config).mark_element_value(self, class, value)
            }
            AttributeInfo::BootstrapMethods(_)
            | AttributeInfo::Deprecated
            | AttributeInfo::Synthetic
            | AttributeInfo::LineNumberTable(_)
            | AttributeInfo::Unknown(_) => Ok(()),
        }
    }

    fn mark_code(&mut self, class: ClassId, code: &'a CodeAttribute) -> Result<()> {
        for index in constant_operands(&code.code)? {
            self.mark_constant(class, index)?;
        }
        for handler in &code.exception_table {
            self.mark_constant(class, handler.catch_type)?;
        }
        self.mark_attributes(class, &code.attributes)
    }

    fn mark_inner_class_entry(&mut self, class: ClassId, entry: &'a InnerClass) -> Result<()> {
        if self.mark_node(entry.id) {
            self.mark_constant(class, entry.inner_class_info_index)?;
            self.mark_constant(class, entry.outer_class_info_index)?;
            self.mark_constant(class, entry.inner_name_index)?;
        }
        Ok(())
    }

    fn mark_bootstrap_method(&mut self, class: ClassId, program: &'a ProgramClass, index: u16) -> Result<()> {
        let (attribute, entries) = program.bootstrap_methods().ok_or_else(|| {
            malformed_error!(
                "Class {} uses bootstrap method {} but has no BootstrapMethods attribute",
                program.name,
                index
            )
        })?;
        let entry = entries.get(usize::from(index)).ok_or_else(|| {
            malformed_error!(
                "Bootstrap method index {} out of range in {}",
                index,
                program.name
            )
        })?;
        self.mark_attribute_header(class, attribute)?;
        self.mark_bootstrap_entry(class, entry)
    }

    fn mark_bootstrap_entry(&mut self, class: ClassId, entry: &'a BootstrapMethod) -> Result<()> {
        if self.mark_node(entry.id) {
            self.mark_constant(class, entry.bootstrap_method_ref)?;
            for &argument in &entry.bootstrap_arguments {
                self.mark_constant(class, argument)?;
            }
        }
        Ok(())
    }

    fn is_class_constant_used(&self, class: &ProgramClass, index: u16) -> bool {
        match class.constant_pool.referenced_class(index) {
            Some(target) => self.marker.is_class_used(self.pool, target),
            None => true,
        }
    }

    /// Post-closure: marks the interface constants of a used class whose interface
    /// class has become used.
    ///
    /// # Errors
    ///
    /// Returns an error if `class` is not a program class or a constant is malformed.
    pub fn mark_interfaces(&mut self, class: ClassId) -> Result<()> {
        let pool = self.pool;
        let program = pool.program_class(class)?;
        for &index in &program.interfaces {
            let used = program
                .constant_pool
                .referenced_class(index)
                .is_some_and(|interface| self.marker.is_class_used(pool, interface));
            if used {
                self.with_reason(
                    program.id,
                    UsageReason::ImplementedBy,
                    Referrer::class(class).with_constant(index),
                    |s| s.mark_constant(class, index),
                )?;
            }
        }
        Ok(())
    }

    /// Post-closure: when inner-class entries are not kept wholesale, marks the entries
    /// of a used `InnerClasses` attribute whose inner and outer classes are used.
    ///
    /// # Errors
    ///
    /// Returns an error if `class` is not a program class or a constant is malformed.
    pub fn mark_inner_classes(&mut self, class: ClassId) -> Result<()> {
        if self.config.keep_all_inner_class_entries {
            return Ok(());
        }
        let pool = self.pool;
        let program = pool.program_class(class)?;
        for attribute in &program.attributes {
            let AttributeInfo::InnerClasses(entries) = &attribute.info else {
                continue;
            };
            if !self.marker.is_used(attribute.id) {
                continue;
            }
            for entry in entries {
                let keep = self.is_class_constant_used(program, entry.inner_class_info_index)
                    && (entry.outer_class_info_index == 0
                        || self.is_class_constant_used(program, entry.outer_class_info_index));
                if keep {
                    self.with_reason(program.id, UsageReason::ReferencedBy, Referrer::class(class), |s| {
                        s.mark_inner_class_entry(class, entry)
                    })?;
                }
            }
        }
        Ok(())
    }

    /// Post-closure: re-evaluates the annotations of a used class and its used members,
    /// retaining those whose annotation type or element methods have become used.
    ///
    /// # Errors
    ///
    /// Returns an error if `class` is not a program class or a constant is malformed.
    pub fn mark_retained_annotations(&mut self, class: ClassId) -> Result<()> {
        let pool = self.pool;
        let program = pool.program_class(class)?;
        self.remark_annotations(class, &program.attributes)?;
        for member in program.fields.iter().chain(&program.methods) {
            if self.marker.is_used(member.id) {
                self.remark_annotations(class, &member.attributes)?;
            }
        }
        Ok(())
    }

    fn remark_annotations(&mut self, class: ClassId, attributes: &'a [Attribute]) -> Result<()> {
        let annotations = AnnotationUsageMarker::new(self.config);
        for attribute in attributes {
            if !self.marker.is_used(attribute.id) {
                continue;
            }
            match &attribute.info {
                AttributeInfo::RuntimeVisibleAnnotations(list)
                | AttributeInfo::RuntimeInvisibleAnnotations(list) => {
                    annotations.mark_annotations(self, class, list)?;
                }
                AttributeInfo::RuntimeVisibleParameterAnnotations(table)
                | AttributeInfo::RuntimeInvisibleParameterAnnotations(table) => {
                    for list in &table.parameter_annotations {
                        annotations.mark_annotations(self, class, list)?;
                    }
                }
                AttributeInfo::AnnotationDefault(value) => {
                    annotations.mark_element_value(self, class, value)?;
                }
                AttributeInfo::Record(components) => {
                    for component in components {
                        if self.marker.is_used(component.id) {
                            self.remark_annotations(class, &component.attributes)?;
                        }
                    }
                }
                AttributeInfo::Code(code) => self.remark_annotations(class, &code.attributes)?,
                _ => {}
            }
        }
        Ok(())
    }
}
