//! Annotation retention rules.
//!
//! An annotation survives only if its type is still meaningful: it is unresolved, its
//! class is used, or its class is on the intrinsic allowlist of [`ShrinkConfig`].
//! Element values are kept only while the annotation method they assign is used, so an
//! annotation can lose individual elements without being dropped as a whole.

use crate::{
    model::{Annotation, ClassId, ClassPool, ElementValue, ElementValueKind},
    shrink::{ClassUsageMarker, Referrer, ShrinkConfig, UsageMarker, UsageReason},
    Result,
};

/// Applies annotation retention rules on behalf of a [`ClassUsageMarker`].
#[derive(Debug, Clone, Copy)]
pub struct AnnotationUsageMarker<'c> {
    config: &'c ShrinkConfig,
}

impl<'c> AnnotationUsageMarker<'c> {
    /// Creates a rule set reading the intrinsic allowlist from `config`.
    #[must_use]
    pub fn new(config: &'c ShrinkConfig) -> Self {
        AnnotationUsageMarker { config }
    }

    /// Returns `true` if the annotation class is on the intrinsic allowlist.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ClassNotFound`] if the reference does not resolve.
    pub fn is_intrinsic(&self, pool: &ClassPool, referenced_class: Option<ClassId>) -> Result<bool> {
        match referenced_class {
            Some(class) => Ok(self.config.is_intrinsic_annotation(pool.class(class)?.name())),
            None => Ok(false),
        }
    }

    /// Returns `true` if an annotation of the given type is retained.
    ///
    /// # Arguments
    ///
    /// * `pool` - The class pool the reference points into.
    /// * `marker` - The current mark state.
    /// * `referenced_class` - Resolved annotation class; `None` if unresolved.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ClassNotFound`] if the reference does not resolve.
    pub fn is_retained<M: UsageMarker>(
        &self,
        pool: &ClassPool,
        marker: &M,
        referenced_class: Option<ClassId>,
    ) -> Result<bool> {
        let Some(class) = referenced_class else {
            return Ok(true);
        };
        let node = pool.class(class)?;
        Ok(self.config.is_intrinsic_annotation(node.name()) || marker.is_used(node.id()))
    }

    pub(crate) fn mark_annotations<'a, M: UsageMarker>(
        &self,
        marker: &mut ClassUsageMarker<'a, M>,
        class: ClassId,
        annotations: &'a [Annotation],
    ) -> Result<()> {
        for annotation in annotations {
            self.mark_annotation(marker, class, annotation)?;
        }
        Ok(())
    }

    /// Marks a retained annotation and visits its element values. Safe to call again
    /// once more classes or methods are used: already marked parts are skipped.
    pub(crate) fn mark_annotation<'a, M: UsageMarker>(
        &self,
        marker: &mut ClassUsageMarker<'a, M>,
        class: ClassId,
        annotation: &'a Annotation,
    ) -> Result<()> {
        let pool = marker.pool();
        if !self.is_retained(pool, marker.marker(), annotation.referenced_class)? {
            return Ok(());
        }

        let rules = *self;
        marker.with_reason(annotation.id, UsageReason::Annotates, Referrer::class(class), |m| {
            if m.mark_node(annotation.id) {
                if let Some(annotation_class) = annotation.referenced_class {
                    m.mark_class(annotation_class)?;
                }
                m.mark_constant(class, annotation.type_index)?;
                if rules.is_intrinsic(pool, annotation.referenced_class)? {
                    for value in &annotation.element_values {
                        if let Some(method) = value.referenced_method {
                            m.mark_member(method)?;
                        }
                    }
                }
            }
            for value in &annotation.element_values {
                rules.mark_element_value(m, class, value)?;
            }
            Ok(())
        })
    }

    /// Marks an element value if the annotation method it assigns is used.
    pub(crate) fn mark_element_value<'a, M: UsageMarker>(
        &self,
        marker: &mut ClassUsageMarker<'a, M>,
        class: ClassId,
        value: &'a ElementValue,
    ) -> Result<()> {
        let pool = marker.pool();
        let method_used = value
            .referenced_method
            .is_none_or(|method| marker.marker().is_member_used(method));
        if !method_used {
            return Ok(());
        }

        match &value.value {
            ElementValueKind::Constant {
                constant_value_index,
                ..
            } => {
                if marker.mark_node(value.id) {
                    marker.mark_constant(class, value.element_name_index)?;
                    marker.mark_constant(class, *constant_value_index)?;
                }
            }
            ElementValueKind::Enum {
                type_name_index,
                const_name_index,
                referenced_class,
                referenced_field,
            } => {
                let enum_used = referenced_class.is_none_or(|enum_class| marker.marker().is_class_used(pool, enum_class));
                if enum_used && marker.mark_node(value.id) {
                    marker.mark_constant(class, value.element_name_index)?;
                    marker.mark_constant(class, *type_name_index)?;
                    marker.mark_constant(class, *const_name_index)?;
                    if let Some(field) = *referenced_field {
                        marker.mark_member(field)?;
                    }
                }
            }
            ElementValueKind::Class {
                class_info_index,
                referenced_classes,
            } => {
                if marker.mark_node(value.id) {
                    marker.mark_constant(class, value.element_name_index)?;
                    marker.mark_constant(class, *class_info_index)?;
                    for &referenced in referenced_classes {
                        marker.mark_class(referenced)?;
                    }
                }
            }
            ElementValueKind::Annotation(nested) => {
                self.mark_annotation(marker, class, nested)?;
                if marker.marker().is_used(nested.id) && marker.mark_node(value.id) {
                    marker.mark_constant(class, value.element_name_index)?;
                }
            }
            ElementValueKind::Array(values) => {
                for element in values {
                    self.mark_element_value(marker, class, element)?;
                }
                let any_used = values.is_empty()
                    || values.iter().any(|element| marker.marker().is_used(element.id));
                if any_used && marker.mark_node(value.id) {
                    marker.mark_constant(class, value.element_name_index)?;
                }
            }
        }
        Ok(())
    }
}
