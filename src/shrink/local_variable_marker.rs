//! Local-variable debug information.
//!
//! `LocalVariableTable` entries are always kept with their code. A
//! `LocalVariableTypeTable` entry only adds generic type information to a variable, so
//! it survives only while the matching `LocalVariableTable` entry of the same `Code`
//! attribute does.

use crate::{
    model::{Attribute, AttributeInfo, ClassId, LocalVariable, LocalVariableType},
    shrink::{ClassUsageMarker, UsageMarker},
    Result,
};

/// Marking rules for local-variable tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalVariableTypeUsageMarker;

impl LocalVariableTypeUsageMarker {
    pub(crate) fn mark_local_variables<'a, M: UsageMarker>(
        marker: &mut ClassUsageMarker<'a, M>,
        class: ClassId,
        variables: &'a [LocalVariable],
    ) -> Result<()> {
        for variable in variables {
            if marker.mark_node(variable.id) {
                marker.mark_constant(class, variable.name_index)?;
                marker.mark_constant(class, variable.descriptor_index)?;
                if let Some(referenced) = variable.referenced_class {
                    marker.mark_class(referenced)?;
                }
            }
        }
        Ok(())
    }

    /// Marks the type entries that match a used variable among the `LocalVariableTable`
    /// attributes in `siblings`.
    pub(crate) fn mark_local_variable_types<'a, M: UsageMarker>(
        marker: &mut ClassUsageMarker<'a, M>,
        class: ClassId,
        types: &'a [LocalVariableType],
        siblings: &'a [Attribute],
    ) -> Result<()> {
        for variable_type in types {
            let matched = Self::local_variables(siblings)
                .any(|variable| marker.marker().is_used(variable.id) && variable_type.matches(variable));
            if matched && marker.mark_node(variable_type.id) {
                marker.mark_constant(class, variable_type.name_index)?;
                marker.mark_constant(class, variable_type.signature_index)?;
            }
        }
        Ok(())
    }

    fn local_variables(attributes: &[Attribute]) -> impl Iterator<Item = &LocalVariable> {
        attributes
            .iter()
            .filter_map(|attribute| match &attribute.info {
                AttributeInfo::LocalVariableTable(variables) => Some(variables),
                _ => None,
            })
            .flatten()
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        model::{linker::link, AttributeInfo, ClassBuilder, LocalVariable, LocalVariableType, MemberAccessFlags},
        shrink::{ClassUsageMarker, ShrinkConfig, SimpleUsageMarker, UsageMarker},
        test::object_pool,
    };

    #[test]
    fn test_type_entry_follows_matching_variable() {
        let mut pool = object_pool();
        let mut foo = ClassBuilder::new("com/example/Foo", Some("java/lang/Object"));
        let name = foo.utf8("items");
        let descriptor = foo.utf8("Ljava/util/List;");
        let signature = foo.utf8("Ljava/util/List<Ljava/lang/String;>;");

        let variable = LocalVariable::new(0, 10, name, descriptor, 1);
        let matching = LocalVariableType::new(0, 10, name, signature, 1);
        let orphan = LocalVariableType::new(0, 10, name, signature, 2);
        let (matching_id, orphan_id) = (matching.id, orphan.id);

        // type table listed first to check ordering inside the Code attribute
        let types = foo.new_attribute(AttributeInfo::LocalVariableTypeTable(vec![matching, orphan]));
        let variables = foo.new_attribute(AttributeInfo::LocalVariableTable(vec![variable]));
        let code = foo.code(1, 2, vec![0xb1], vec![types, variables]);
        let method = foo.method(MemberAccessFlags::PUBLIC, "run", "()V", vec![code]);
        let foo_id = pool.add_program(foo.build());
        link(&mut pool).unwrap();

        let config = ShrinkConfig::default();
        let mut marker = SimpleUsageMarker::new();
        let mut propagator = ClassUsageMarker::new(&pool, &mut marker, &config);
        propagator.mark_class(foo_id).unwrap();
        propagator
            .mark_member(crate::model::MemberRef::new(foo_id, method))
            .unwrap();

        assert!(marker.is_used(matching_id));
        assert!(!marker.is_used(orphan_id));
    }
}
