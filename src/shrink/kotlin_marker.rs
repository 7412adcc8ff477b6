//! Marking of Kotlin metadata.
//!
//! Metadata of a used class is kept, but its declarations only survive while the JVM
//! members implementing them do. Declarations without JVM counterparts (abstract
//! members, local delegated properties) are kept with the metadata. Types referenced by
//! kept declarations mark their classes and type aliases.
//!
//! The marker descends into already marked declarations again on every pass, so
//! declarations whose JVM members become used later are still picked up.

use crate::{
    model::{
        ClassId, KotlinAnnotation, KotlinClassKind, KotlinClassifier, KotlinDeclarationContainer,
        KotlinFunction, KotlinMetadataKind, KotlinProperty, KotlinType, KotlinTypeAlias,
        KotlinTypeParameter, KotlinValueParameter, KotlinVersionRequirement, TypeAliasRef,
    },
    shrink::{AnnotationUsageMarker, ClassUsageMarker, Referrer, UsageMarker, UsageReason},
    Result,
};

impl<'a, M: UsageMarker> ClassUsageMarker<'a, M> {
    /// Marks the Kotlin metadata of a used class and the declarations that are still
    /// implemented by used members. Does nothing for classes without metadata or that
    /// are not used.
    ///
    /// # Errors
    ///
    /// Returns an error if a weak reference in the metadata does not resolve.
    pub fn mark_kotlin_metadata(&mut self, class: ClassId) -> Result<()> {
        let pool = self.pool();
        let Some(program) = pool.class(class)?.as_program() else {
            return Ok(());
        };
        let Some(metadata) = &program.kotlin_metadata else {
            return Ok(());
        };
        if !self.marker().is_used(program.id) {
            return Ok(());
        }

        self.with_reason(program.id, UsageReason::KotlinMetadataOf, Referrer::class(class), |s| {
            s.mark_node(metadata.id);
            match &metadata.kind {
                KotlinMetadataKind::Class(kind) => s.mark_kotlin_class(kind),
                KotlinMetadataKind::FileFacade(container)
                | KotlinMetadataKind::SyntheticClass(container) => s.mark_kotlin_container(container),
                KotlinMetadataKind::MultiFilePart(part) => {
                    s.mark_kotlin_container(&part.container)?;
                    match part.referenced_facade {
                        Some(facade) => s.mark_class(facade),
                        None => Ok(()),
                    }
                }
                // parts are kept by their own references
                KotlinMetadataKind::MultiFileFacade(_) => Ok(()),
            }
        })
    }

    fn mark_kotlin_class(&mut self, kind: &'a KotlinClassKind) -> Result<()> {
        self.mark_kotlin_container(&kind.container)?;
        for constructor in &kind.constructors {
            let implemented = constructor
                .referenced_method
                .is_none_or(|method| self.marker().is_member_used(method));
            if implemented {
                self.mark_node(constructor.id);
                self.mark_kotlin_value_parameters(&constructor.value_parameters)?;
                self.mark_version_requirement(constructor.version_requirement.as_ref());
            }
        }
        for super_type in &kind.super_types {
            self.mark_kotlin_type(super_type)?;
        }
        self.mark_kotlin_type_parameters(&kind.type_parameters)?;
        self.mark_version_requirement(kind.version_requirement.as_ref());
        Ok(())
    }

    fn mark_kotlin_container(&mut self, container: &'a KotlinDeclarationContainer) -> Result<()> {
        for property in &container.properties {
            let mut members = property.referenced_members().peekable();
            let implemented = members.peek().is_none()
                || members.any(|member| self.marker().is_member_used(member));
            if implemented {
                self.mark_kotlin_property(property)?;
            }
        }
        for function in &container.functions {
            let implemented = function
                .referenced_method
                .is_none_or(|method| self.marker().is_member_used(method));
            if implemented {
                self.mark_kotlin_function(function)?;
            }
        }
        for alias in &container.type_aliases {
            // aliases are marked by the types using them
            if self.marker().is_used(alias.id) {
                self.mark_kotlin_type_alias_body(alias)?;
            }
        }
        for property in &container.local_delegated_properties {
            self.mark_kotlin_property(property)?;
        }
        Ok(())
    }

    fn mark_kotlin_property(&mut self, property: &'a KotlinProperty) -> Result<()> {
        self.mark_node(property.id);
        if let Some(receiver) = &property.receiver_type {
            self.mark_kotlin_type(receiver)?;
        }
        self.mark_kotlin_type(&property.return_type)?;
        self.mark_kotlin_value_parameters(&property.setter_parameters)?;
        self.mark_kotlin_type_parameters(&property.type_parameters)?;
        self.mark_version_requirement(property.version_requirement.as_ref());
        Ok(())
    }

    fn mark_kotlin_function(&mut self, function: &'a KotlinFunction) -> Result<()> {
        self.mark_node(function.id);
        self.mark_kotlin_value_parameters(&function.value_parameters)?;
        if let Some(receiver) = &function.receiver_type {
            self.mark_kotlin_type(receiver)?;
        }
        self.mark_kotlin_type(&function.return_type)?;
        self.mark_kotlin_type_parameters(&function.type_parameters)?;
        self.mark_version_requirement(function.version_requirement.as_ref());
        Ok(())
    }

    fn mark_kotlin_value_parameters(&mut self, parameters: &'a [KotlinValueParameter]) -> Result<()> {
        for parameter in parameters {
            self.mark_node(parameter.id);
            self.mark_kotlin_type(&parameter.parameter_type)?;
            if let Some(element) = &parameter.vararg_element_type {
                self.mark_kotlin_type(element)?;
            }
        }
        Ok(())
    }

    fn mark_kotlin_type_parameters(&mut self, parameters: &'a [KotlinTypeParameter]) -> Result<()> {
        for parameter in parameters {
            self.mark_node(parameter.id);
            for bound in &parameter.upper_bounds {
                self.mark_kotlin_type(bound)?;
            }
        }
        Ok(())
    }

    fn mark_kotlin_type(&mut self, kotlin_type: &'a KotlinType) -> Result<()> {
        self.mark_node(kotlin_type.id);
        match &kotlin_type.classifier {
            KotlinClassifier::Class {
                referenced_class: Some(class),
                ..
            } => self.mark_class(*class)?,
            KotlinClassifier::TypeAlias {
                referenced_alias: Some(alias),
                ..
            } => self.mark_kotlin_type_alias(*alias)?,
            KotlinClassifier::Class { .. }
            | KotlinClassifier::TypeAlias { .. }
            | KotlinClassifier::TypeParameter(_) => {}
        }
        for argument in &kotlin_type.type_arguments {
            self.mark_kotlin_type(argument)?;
        }
        for bound in kotlin_type.upper_bounds.iter().flatten() {
            self.mark_kotlin_type(bound)?;
        }
        if let Some(abbreviation) = &kotlin_type.abbreviation {
            self.mark_kotlin_type(abbreviation)?;
        }
        self.mark_kotlin_annotations(&kotlin_type.annotations)
    }

    fn mark_kotlin_annotations(&mut self, annotations: &'a [KotlinAnnotation]) -> Result<()> {
        let rules = AnnotationUsageMarker::new(self.config());
        for annotation in annotations {
            if rules.is_retained(self.pool(), self.marker(), annotation.referenced_class)?
                && self.mark_node(annotation.id)
            {
                if let Some(class) = annotation.referenced_class {
                    self.mark_class(class)?;
                }
            }
        }
        Ok(())
    }

    fn mark_kotlin_type_alias(&mut self, alias: TypeAliasRef) -> Result<()> {
        self.mark_class(alias.container)?;
        if let Some(declaration) = self.find_type_alias(alias)? {
            if self.mark_node(declaration.id) {
                self.mark_kotlin_type_alias_body(declaration)?;
            }
        }
        Ok(())
    }

    fn mark_kotlin_type_alias_body(&mut self, alias: &'a KotlinTypeAlias) -> Result<()> {
        self.mark_kotlin_type(&alias.underlying_type)?;
        self.mark_kotlin_type(&alias.expanded_type)?;
        self.mark_kotlin_type_parameters(&alias.type_parameters)?;
        self.mark_kotlin_annotations(&alias.annotations)?;
        self.mark_version_requirement(alias.version_requirement.as_ref());
        Ok(())
    }

    fn find_type_alias(&self, alias: TypeAliasRef) -> Result<Option<&'a KotlinTypeAlias>> {
        let container = self.pool().program_class(alias.container)?;
        Ok(container
            .kotlin_metadata
            .as_ref()
            .and_then(|metadata| metadata.container())
            .and_then(|declarations| {
                declarations
                    .type_aliases
                    .iter()
                    .find(|declaration| declaration.id == alias.alias)
            }))
    }

    fn mark_version_requirement(&mut self, requirement: Option<&KotlinVersionRequirement>) {
        if let Some(requirement) = requirement {
            self.mark_node(requirement.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        model::{
            linker::link, ClassBuilder, JvmMemberSignature, KotlinClassKind, KotlinFunction,
            KotlinMetadata, KotlinMetadataKind, KotlinProperty, KotlinType, KotlinTypeAlias,
            MemberAccessFlags, MemberRef,
        },
        shrink::{ClassUsageMarker, ShrinkConfig, SimpleUsageMarker, UsageMarker},
        test::object_pool,
    };

    #[test]
    fn test_declarations_follow_jvm_members() {
        let mut pool = object_pool();
        let target_id = pool.add_program(ClassBuilder::new("com/example/Target", Some("java/lang/Object")).build());

        let mut foo = ClassBuilder::new("com/example/Foo", Some("java/lang/Object"));
        let kept = foo.method(MemberAccessFlags::PUBLIC, "kept", "()V", Vec::new());
        foo.method(MemberAccessFlags::PUBLIC, "dropped", "()V", Vec::new());

        let mut kept_function = KotlinFunction::new("kept", KotlinType::class("com/example/Target"));
        kept_function.jvm_signature = Some(JvmMemberSignature::new("kept", "()V"));
        let mut dropped_function = KotlinFunction::new("dropped", KotlinType::class("kotlin/Unit"));
        dropped_function.jvm_signature = Some(JvmMemberSignature::new("dropped", "()V"));
        let abstract_property = KotlinProperty::new("size", KotlinType::class("kotlin/Int"));
        let (kept_fn_id, dropped_fn_id, property_id) =
            (kept_function.id, dropped_function.id, abstract_property.id);

        let mut kind = KotlinClassKind::default();
        kind.container.functions = vec![kept_function, dropped_function];
        kind.container.properties = vec![abstract_property];
        let metadata = KotlinMetadata::new(KotlinMetadataKind::Class(Box::new(kind)));
        let metadata_id = metadata.id;
        foo.kotlin_metadata(metadata);
        let foo_id = pool.add_program(foo.build());
        link(&mut pool).unwrap();

        let config = ShrinkConfig::default();
        let mut marker = SimpleUsageMarker::new();
        let mut propagator = ClassUsageMarker::new(&pool, &mut marker, &config);
        propagator.mark_class(foo_id).unwrap();
        assert!(!propagator.marker().is_class_used(&pool, target_id));

        propagator.mark_member(MemberRef::new(foo_id, kept)).unwrap();
        propagator.mark_kotlin_metadata(foo_id).unwrap();

        assert!(marker.is_used(metadata_id));
        assert!(marker.is_used(kept_fn_id));
        assert!(!marker.is_used(dropped_fn_id));
        assert!(marker.is_used(property_id));
        assert!(marker.is_class_used(&pool, target_id));
    }

    #[test]
    fn test_type_alias_marked_through_use() {
        let mut pool = object_pool();
        let mut facade = ClassBuilder::new("com/example/AliasesKt", Some("java/lang/Object"));
        let alias = KotlinTypeAlias::new(
            "Name",
            KotlinType::class("java/lang/String"),
            KotlinType::class("java/lang/String"),
        );
        let unused_alias = KotlinTypeAlias::new(
            "Other",
            KotlinType::class("java/lang/String"),
            KotlinType::class("java/lang/String"),
        );
        let (alias_id, unused_id) = (alias.id, unused_alias.id);
        let mut container = crate::model::KotlinDeclarationContainer::default();
        container.type_aliases = vec![alias, unused_alias];
        facade.kotlin_metadata(KotlinMetadata::new(KotlinMetadataKind::FileFacade(container)));
        let facade_id = pool.add_program(facade.build());

        let mut user = ClassBuilder::new("com/example/User", Some("java/lang/Object"));
        let mut user_container = crate::model::KotlinDeclarationContainer::default();
        user_container
            .properties
            .push(KotlinProperty::new("name", KotlinType::alias("Name")));
        user.kotlin_metadata(KotlinMetadata::new(KotlinMetadataKind::FileFacade(user_container)));
        let user_id = pool.add_program(user.build());
        link(&mut pool).unwrap();

        let config = ShrinkConfig::default();
        let mut marker = SimpleUsageMarker::new();
        ClassUsageMarker::new(&pool, &mut marker, &config)
            .mark_class(user_id)
            .unwrap();

        assert!(marker.is_class_used(&pool, facade_id));
        assert!(marker.is_used(alias_id));
        assert!(!marker.is_used(unused_id));
    }
}
