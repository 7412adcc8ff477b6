//! Annotations and their element values (JVMS §4.7.16).

use crate::model::{ClassId, MemberRef, NodeId};

/// An annotation instance.
#[derive(Debug)]
pub struct Annotation {
    /// Identity used by markers
    pub id: NodeId,
    /// Index of the `Utf8` field descriptor of the annotation type
    pub type_index: u16,
    /// Resolved annotation type (weak)
    pub referenced_class: Option<ClassId>,
    /// Element-value pairs, in declaration order
    pub element_values: Vec<ElementValue>,
}

impl Annotation {
    /// Creates an annotation with a fresh identity.
    #[must_use]
    pub fn new(type_index: u16, element_values: Vec<ElementValue>) -> Self {
        Annotation {
            id: NodeId::fresh(),
            type_index,
            referenced_class: None,
            element_values,
        }
    }
}

/// An element value, optionally named (the `element_name_index` of a pair).
#[derive(Debug)]
pub struct ElementValue {
    /// Identity used by markers
    pub id: NodeId,
    /// Index of the `Utf8` element name, or 0 for array members and defaults
    pub element_name_index: u16,
    /// The annotation-type method declaring this element (weak)
    pub referenced_method: Option<MemberRef>,
    /// The value
    pub value: ElementValueKind,
}

impl ElementValue {
    /// Creates a named element value with a fresh identity.
    #[must_use]
    pub fn new(element_name_index: u16, value: ElementValueKind) -> Self {
        ElementValue {
            id: NodeId::fresh(),
            element_name_index,
            referenced_method: None,
            value,
        }
    }

    /// Creates an unnamed element value (array member or annotation default).
    #[must_use]
    pub fn unnamed(value: ElementValueKind) -> Self {
        Self::new(0, value)
    }
}

/// The kinds of element values.
#[derive(Debug)]
pub enum ElementValueKind {
    /// Primitive or string constant
    Constant {
        /// Element value tag (`B`, `C`, `D`, `F`, `I`, `J`, `S`, `Z` or `s`)
        tag: u8,
        /// Index of the constant
        constant_value_index: u16,
    },
    /// Enum constant
    Enum {
        /// Index of the `Utf8` field descriptor of the enum type
        type_name_index: u16,
        /// Index of the `Utf8` simple name of the enum constant
        const_name_index: u16,
        /// Resolved enum class (weak)
        referenced_class: Option<ClassId>,
        /// Resolved enum field (weak)
        referenced_field: Option<MemberRef>,
    },
    /// Class literal
    Class {
        /// Index of the `Utf8` return descriptor
        class_info_index: u16,
        /// Classes named in the descriptor (weak)
        referenced_classes: Vec<ClassId>,
    },
    /// Nested annotation
    Annotation(Annotation),
    /// Array of element values
    Array(Vec<ElementValue>),
}

impl ElementValueKind {
    /// The class-file tag of this element value.
    #[must_use]
    pub fn tag(&self) -> u8 {
        match self {
            ElementValueKind::Constant { tag, .. } => *tag,
            ElementValueKind::Enum { .. } => b'e',
            ElementValueKind::Class { .. } => b'c',
            ElementValueKind::Annotation(_) => b'@',
            ElementValueKind::Array(_) => b'[',
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_value_tags() {
        let constant = ElementValueKind::Constant {
            tag: b'I',
            constant_value_index: 3,
        };
        assert_eq!(constant.tag(), b'I');
        assert_eq!(ElementValueKind::Array(Vec::new()).tag(), b'[');
        assert_eq!(
            ElementValueKind::Annotation(Annotation::new(1, Vec::new())).tag(),
            b'@'
        );
    }

    #[test]
    fn test_unnamed_element_value() {
        let value = ElementValue::unnamed(ElementValueKind::Array(Vec::new()));
        assert_eq!(value.element_name_index, 0);
        assert!(value.referenced_method.is_none());
    }
}
