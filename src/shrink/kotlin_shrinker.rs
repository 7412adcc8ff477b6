//! Compaction of Kotlin metadata.

use crate::{
    model::{
        ClassId, KotlinClassKind, KotlinDeclarationContainer, KotlinMetadata, KotlinMetadataKind,
        KotlinProperty, KotlinType, KotlinTypeParameter, KotlinValueParameter, MemberRef,
    },
    shrink::{retain_correlated, UsageMarker},
    utils::ClassSet,
};

/// Removes the declarations of a Kotlin metadata tree that were not marked, and drops
/// references to classes and members that do not survive.
pub struct KotlinShrinker<'m, M: UsageMarker> {
    marker: &'m M,
    live: &'m ClassSet,
}

impl<'m, M: UsageMarker> KotlinShrinker<'m, M> {
    /// Creates a shrinker for the given marks.
    ///
    /// # Arguments
    ///
    /// * `marker` - The marks of the finished closure.
    /// * `live` - The classes that survive compaction.
    #[must_use]
    pub fn new(marker: &'m M, live: &'m ClassSet) -> Self {
        KotlinShrinker { marker, live }
    }

    /// Compacts `metadata` in place and returns the number of removed declarations.
    pub fn shrink_metadata(&self, metadata: &mut KotlinMetadata) -> usize {
        match &mut metadata.kind {
            KotlinMetadataKind::Class(kind) => self.shrink_class_kind(kind),
            KotlinMetadataKind::FileFacade(container)
            | KotlinMetadataKind::SyntheticClass(container) => self.shrink_container(container),
            KotlinMetadataKind::MultiFilePart(part) => {
                if part
                    .referenced_facade
                    .is_some_and(|facade| !self.live.contains(facade))
                {
                    part.referenced_facade = None;
                }
                self.shrink_container(&mut part.container)
            }
            KotlinMetadataKind::MultiFileFacade(facade) => {
                let keep: Vec<bool> = (0..facade.part_class_names.len())
                    .map(|index| {
                        facade
                            .referenced_part_classes
                            .get(index)
                            .is_none_or(|part| self.live.contains(*part))
                    })
                    .collect();
                let before = facade.part_class_names.len();
                retain_correlated(
                    &mut facade.part_class_names,
                    &mut facade.referenced_part_classes,
                    &keep,
                );
                before - facade.part_class_names.len()
            }
        }
    }

    fn shrink_class_kind(&self, kind: &mut KotlinClassKind) -> usize {
        let mut removed = self.shrink_container(&mut kind.container);

        let before = kind.constructors.len();
        kind.constructors
            .retain(|constructor| self.marker.is_used(constructor.id));
        removed += before - kind.constructors.len();
        for constructor in &mut kind.constructors {
            self.shrink_value_parameters(&mut constructor.value_parameters);
        }

        for super_type in &mut kind.super_types {
            self.shrink_type(super_type);
        }
        self.shrink_type_parameters(&mut kind.type_parameters);

        let nested = self.class_mask(&kind.nested_class_names, &kind.referenced_nested_classes);
        retain_correlated(
            &mut kind.nested_class_names,
            &mut kind.referenced_nested_classes,
            &nested,
        );

        let sealed = self.class_mask(&kind.sealed_subclass_names, &kind.referenced_sealed_subclasses);
        retain_correlated(
            &mut kind.sealed_subclass_names,
            &mut kind.referenced_sealed_subclasses,
            &sealed,
        );

        let entries: Vec<bool> = (0..kind.enum_entry_names.len())
            .map(|index| {
                kind.referenced_enum_entries
                    .get(index)
                    .is_none_or(|entry| self.marker.is_member_used(*entry))
            })
            .collect();
        retain_correlated(
            &mut kind.enum_entry_names,
            &mut kind.referenced_enum_entries,
            &entries,
        );

        if kind
            .referenced_companion
            .is_some_and(|companion| !self.live.contains(companion))
        {
            kind.companion_object_name = None;
            kind.referenced_companion = None;
        }
        removed
    }

    fn class_mask(&self, names: &[String], classes: &[ClassId]) -> Vec<bool> {
        (0..names.len())
            .map(|index| classes.get(index).is_none_or(|class| self.live.contains(*class)))
            .collect()
    }

    fn shrink_container(&self, container: &mut KotlinDeclarationContainer) -> usize {
        let before = container.properties.len()
            + container.functions.len()
            + container.type_aliases.len()
            + container.local_delegated_properties.len();

        container
            .properties
            .retain(|property| self.marker.is_used(property.id));
        container
            .functions
            .retain(|function| self.marker.is_used(function.id));
        container
            .type_aliases
            .retain(|alias| self.marker.is_used(alias.id));
        container
            .local_delegated_properties
            .retain(|property| self.marker.is_used(property.id));

        for property in container
            .properties
            .iter_mut()
            .chain(container.local_delegated_properties.iter_mut())
        {
            self.shrink_property(property);
        }
        for function in &mut container.functions {
            self.shrink_value_parameters(&mut function.value_parameters);
            if let Some(receiver) = &mut function.receiver_type {
                self.shrink_type(receiver);
            }
            self.shrink_type(&mut function.return_type);
            self.shrink_type_parameters(&mut function.type_parameters);
        }
        for alias in &mut container.type_aliases {
            self.shrink_type(&mut alias.underlying_type);
            self.shrink_type(&mut alias.expanded_type);
            self.shrink_type_parameters(&mut alias.type_parameters);
            alias
                .annotations
                .retain(|annotation| self.marker.is_used(annotation.id));
        }

        let after = container.properties.len()
            + container.functions.len()
            + container.type_aliases.len()
            + container.local_delegated_properties.len();
        before - after
    }

    fn shrink_property(&self, property: &mut KotlinProperty) {
        let dead = |member: &Option<MemberRef>| member.is_some_and(|member| !self.marker.is_member_used(member));
        if dead(&property.referenced_backing_field) {
            property.referenced_backing_field = None;
            property.backing_field_signature = None;
        }
        if dead(&property.referenced_getter) {
            property.referenced_getter = None;
            property.getter_signature = None;
        }
        if dead(&property.referenced_setter) {
            property.referenced_setter = None;
            property.setter_signature = None;
        }

        if let Some(receiver) = &mut property.receiver_type {
            self.shrink_type(receiver);
        }
        self.shrink_type(&mut property.return_type);
        self.shrink_value_parameters(&mut property.setter_parameters);
        self.shrink_type_parameters(&mut property.type_parameters);
    }

    fn shrink_value_parameters(&self, parameters: &mut [KotlinValueParameter]) {
        for parameter in parameters {
            self.shrink_type(&mut parameter.parameter_type);
            if let Some(element) = &mut parameter.vararg_element_type {
                self.shrink_type(element);
            }
        }
    }

    fn shrink_type_parameters(&self, parameters: &mut [KotlinTypeParameter]) {
        for parameter in parameters {
            for bound in &mut parameter.upper_bounds {
                self.shrink_type(bound);
            }
        }
    }

    fn shrink_type(&self, kotlin_type: &mut KotlinType) {
        kotlin_type
            .annotations
            .retain(|annotation| self.marker.is_used(annotation.id));
        for argument in &mut kotlin_type.type_arguments {
            self.shrink_type(argument);
        }
        for bound in kotlin_type.upper_bounds.iter_mut().flatten() {
            self.shrink_type(bound);
        }
        if let Some(abbreviation) = &mut kotlin_type.abbreviation {
            self.shrink_type(abbreviation);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::{KotlinAnnotation, KotlinFunction, KotlinMultiFileFacadeKind},
        shrink::SimpleUsageMarker,
    };

    #[test]
    fn test_nested_names_stay_aligned() {
        let live: ClassSet = [ClassId::new(2)].into_iter().collect();
        let marker = SimpleUsageMarker::new();
        let shrinker = KotlinShrinker::new(&marker, &live);

        let mut kind = KotlinClassKind {
            nested_class_names: vec!["Dead".into(), "Alive".into(), "Unresolved".into()],
            referenced_nested_classes: vec![ClassId::new(1), ClassId::new(2)],
            ..KotlinClassKind::default()
        };
        shrinker.shrink_class_kind(&mut kind);

        assert_eq!(kind.nested_class_names, ["Alive", "Unresolved"]);
        assert_eq!(kind.referenced_nested_classes, [ClassId::new(2)]);
    }

    #[test]
    fn test_dead_companion_is_cleared() {
        let live = ClassSet::new(4);
        let marker = SimpleUsageMarker::new();
        let mut kind = KotlinClassKind {
            companion_object_name: Some("Companion".into()),
            referenced_companion: Some(ClassId::new(3)),
            ..KotlinClassKind::default()
        };
        KotlinShrinker::new(&marker, &live).shrink_class_kind(&mut kind);
        assert!(kind.companion_object_name.is_none());
        assert!(kind.referenced_companion.is_none());
    }

    #[test]
    fn test_unmarked_declarations_are_removed() {
        let live = ClassSet::new(1);
        let mut marker = SimpleUsageMarker::new();
        let kept = KotlinFunction::new("kept", KotlinType::class("kotlin/Unit"));
        let dropped = KotlinFunction::new("dropped", KotlinType::class("kotlin/Unit"));
        marker.mark_as_used(kept.id);

        let mut return_type = KotlinType::class("kotlin/String");
        return_type.annotations.push(KotlinAnnotation::new("com/example/Gone"));
        let typed = KotlinFunction::new("typed", return_type);
        marker.mark_as_used(typed.id);

        let mut metadata = KotlinMetadata::new(KotlinMetadataKind::FileFacade(KotlinDeclarationContainer {
            functions: vec![kept, dropped, typed],
            ..KotlinDeclarationContainer::default()
        }));
        let removed = KotlinShrinker::new(&marker, &live).shrink_metadata(&mut metadata);

        assert_eq!(removed, 1);
        let container = metadata.container().unwrap();
        let names: Vec<&str> = container.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["kept", "typed"]);
        assert!(container.functions[1].return_type.annotations.is_empty());
    }

    #[test]
    fn test_multi_file_parts() {
        let live: ClassSet = [ClassId::new(0)].into_iter().collect();
        let marker = SimpleUsageMarker::new();
        let mut metadata = KotlinMetadata::new(KotlinMetadataKind::MultiFileFacade(KotlinMultiFileFacadeKind {
            part_class_names: vec!["a/Part1".into(), "a/Part2".into()],
            referenced_part_classes: vec![ClassId::new(0), ClassId::new(1)],
        }));
        assert_eq!(KotlinShrinker::new(&marker, &live).shrink_metadata(&mut metadata), 1);
        let KotlinMetadataKind::MultiFileFacade(facade) = &metadata.kind else {
            panic!("kind changed");
        };
        assert_eq!(facade.part_class_names, ["a/Part1"]);
    }
}
