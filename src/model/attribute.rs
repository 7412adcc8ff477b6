//! Class-file attributes.
//!
//! Attributes form a two-level hierarchy: classes, members and record components own
//! attribute lists, and a `Code` attribute owns a nested list of its own (line numbers,
//! local-variable tables, type annotations). Every attribute and every entry of a
//! container attribute carries a [`NodeId`] so it can be marked and filtered on its own.

use crate::model::{Annotation, ClassId, ElementValue, MemberRef, NodeId};

/// An attribute: its name constant plus the decoded payload.
#[derive(Debug)]
pub struct Attribute {
    /// Identity used by markers
    pub id: NodeId,
    /// Index of the `Utf8` constant holding the attribute name
    pub name_index: u16,
    /// Decoded payload
    pub info: AttributeInfo,
}

impl Attribute {
    /// Creates an attribute with a fresh identity.
    #[must_use]
    pub fn new(name_index: u16, info: AttributeInfo) -> Self {
        Attribute {
            id: NodeId::fresh(),
            name_index,
            info,
        }
    }
}

/// Decoded attribute payloads.
#[derive(Debug)]
pub enum AttributeInfo {
    /// `SourceFile`
    SourceFile {
        /// Index of the `Utf8` file name
        sourcefile_index: u16,
    },
    /// `Deprecated`
    Deprecated,
    /// `Synthetic`
    Synthetic,
    /// `ConstantValue`
    ConstantValue {
        /// Index of the constant holding the field's initial value
        constant_value_index: u16,
    },
    /// `Signature`
    Signature {
        /// Index of the `Utf8` generic signature
        signature_index: u16,
        /// Classes named in the signature, `None` once a class has been removed
        referenced_classes: Vec<Option<ClassId>>,
    },
    /// `Exceptions`
    Exceptions {
        /// Indices of the `Class` constants of the declared exceptions
        exception_index_table: Vec<u16>,
    },
    /// `BootstrapMethods`
    BootstrapMethods(Vec<BootstrapMethod>),
    /// `InnerClasses`
    InnerClasses(Vec<InnerClass>),
    /// `EnclosingMethod`
    EnclosingMethod {
        /// Index of the `Class` constant of the enclosing class
        class_index: u16,
        /// Index of the `NameAndType` constant of the enclosing method, or 0
        method_index: u16,
        /// Resolved enclosing class (weak)
        referenced_class: Option<ClassId>,
        /// Resolved enclosing method (weak)
        referenced_method: Option<MemberRef>,
    },
    /// `Record`
    Record(Vec<RecordComponent>),
    /// `Code`
    Code(CodeAttribute),
    /// `LineNumberTable`
    LineNumberTable(Vec<LineNumber>),
    /// `LocalVariableTable`
    LocalVariableTable(Vec<LocalVariable>),
    /// `LocalVariableTypeTable`
    LocalVariableTypeTable(Vec<LocalVariableType>),
    /// `RuntimeVisibleAnnotations`
    RuntimeVisibleAnnotations(Vec<Annotation>),
    /// `RuntimeInvisibleAnnotations`
    RuntimeInvisibleAnnotations(Vec<Annotation>),
    /// `RuntimeVisibleParameterAnnotations`
    RuntimeVisibleParameterAnnotations(ParameterAnnotations),
    /// `RuntimeInvisibleParameterAnnotations`
    RuntimeInvisibleParameterAnnotations(ParameterAnnotations),
    /// `AnnotationDefault`
    AnnotationDefault(ElementValue),
    /// Any attribute without a dedicated decoding, kept as raw bytes
    Unknown(Vec<u8>),
}

impl AttributeInfo {
    /// The class-file name of this attribute kind.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            AttributeInfo::SourceFile { .. } => "SourceFile",
            AttributeInfo::Deprecated => "Deprecated",
            AttributeInfo::Synthetic => "Synthetic",
            AttributeInfo::ConstantValue { .. } => "ConstantValue",
            AttributeInfo::Signature { .. } => "Signature",
            AttributeInfo::Exceptions { .. } => "Exceptions",
            AttributeInfo::BootstrapMethods(_) => "BootstrapMethods",
            AttributeInfo::InnerClasses(_) => "InnerClasses",
            AttributeInfo::EnclosingMethod { .. } => "EnclosingMethod",
            AttributeInfo::Record(_) => "Record",
            AttributeInfo::Code(_) => "Code",
            AttributeInfo::LineNumberTable(_) => "LineNumberTable",
            AttributeInfo::LocalVariableTable(_) => "LocalVariableTable",
            AttributeInfo::LocalVariableTypeTable(_) => "LocalVariableTypeTable",
            AttributeInfo::RuntimeVisibleAnnotations(_) => "RuntimeVisibleAnnotations",
            AttributeInfo::RuntimeInvisibleAnnotations(_) => "RuntimeInvisibleAnnotations",
            AttributeInfo::RuntimeVisibleParameterAnnotations(_) => {
                "RuntimeVisibleParameterAnnotations"
            }
            AttributeInfo::RuntimeInvisibleParameterAnnotations(_) => {
                "RuntimeInvisibleParameterAnnotations"
            }
            AttributeInfo::AnnotationDefault(_) => "AnnotationDefault",
            AttributeInfo::Unknown(_) => "Unknown",
        }
    }
}

/// An entry of the `BootstrapMethods` attribute.
#[derive(Debug)]
pub struct BootstrapMethod {
    /// Identity used by markers
    pub id: NodeId,
    /// Index of the `MethodHandle` constant of the bootstrap method
    pub bootstrap_method_ref: u16,
    /// Indices of the static arguments
    pub bootstrap_arguments: Vec<u16>,
}

impl BootstrapMethod {
    /// Creates an entry with a fresh identity.
    #[must_use]
    pub fn new(bootstrap_method_ref: u16, bootstrap_arguments: Vec<u16>) -> Self {
        BootstrapMethod {
            id: NodeId::fresh(),
            bootstrap_method_ref,
            bootstrap_arguments,
        }
    }
}

/// An entry of the `InnerClasses` attribute.
#[derive(Debug)]
pub struct InnerClass {
    /// Identity used by markers
    pub id: NodeId,
    /// Index of the `Class` constant of the inner class
    pub inner_class_info_index: u16,
    /// Index of the `Class` constant of the outer class, or 0
    pub outer_class_info_index: u16,
    /// Index of the `Utf8` simple name, or 0 for anonymous classes
    pub inner_name_index: u16,
    /// Access flags of the inner class as declared in source
    pub inner_class_access_flags: u16,
}

impl InnerClass {
    /// Creates an entry with a fresh identity.
    #[must_use]
    pub fn new(
        inner_class_info_index: u16,
        outer_class_info_index: u16,
        inner_name_index: u16,
        inner_class_access_flags: u16,
    ) -> Self {
        InnerClass {
            id: NodeId::fresh(),
            inner_class_info_index,
            outer_class_info_index,
            inner_name_index,
            inner_class_access_flags,
        }
    }
}

/// A component of the `Record` attribute.
#[derive(Debug)]
pub struct RecordComponent {
    /// Identity used by markers
    pub id: NodeId,
    /// Index of the `Utf8` component name
    pub name_index: u16,
    /// Index of the `Utf8` component descriptor
    pub descriptor_index: u16,
    /// Attributes of the component
    pub attributes: Vec<Attribute>,
    /// Classes named in the descriptor (weak)
    pub referenced_classes: Vec<ClassId>,
}

impl RecordComponent {
    /// Creates a component with a fresh identity.
    #[must_use]
    pub fn new(name_index: u16, descriptor_index: u16, attributes: Vec<Attribute>) -> Self {
        RecordComponent {
            id: NodeId::fresh(),
            name_index,
            descriptor_index,
            attributes,
            referenced_classes: Vec::new(),
        }
    }
}

/// The payload of a `Code` attribute.
#[derive(Debug, Default)]
pub struct CodeAttribute {
    /// Maximum operand stack depth
    pub max_stack: u16,
    /// Number of local variable slots
    pub max_locals: u16,
    /// Raw bytecode
    pub code: Vec<u8>,
    /// Exception handlers, in declaration order
    pub exception_table: Vec<ExceptionHandler>,
    /// Nested attributes
    pub attributes: Vec<Attribute>,
}

/// An exception handler of a `Code` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExceptionHandler {
    /// Start of the protected range (inclusive)
    pub start_pc: u16,
    /// End of the protected range (exclusive)
    pub end_pc: u16,
    /// Start of the handler
    pub handler_pc: u16,
    /// Index of the `Class` constant of the caught type, or 0 for any
    pub catch_type: u16,
}

/// An entry of the `LineNumberTable` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineNumber {
    /// Bytecode offset
    pub start_pc: u16,
    /// Source line
    pub line_number: u16,
}

/// An entry of the `LocalVariableTable` attribute.
#[derive(Debug)]
pub struct LocalVariable {
    /// Identity used by markers
    pub id: NodeId,
    /// Start of the live range
    pub start_pc: u16,
    /// Length of the live range
    pub length: u16,
    /// Index of the `Utf8` variable name
    pub name_index: u16,
    /// Index of the `Utf8` field descriptor
    pub descriptor_index: u16,
    /// Local variable slot
    pub index: u16,
    /// Class named by the descriptor (weak)
    pub referenced_class: Option<ClassId>,
}

impl LocalVariable {
    /// Creates an entry with a fresh identity.
    #[must_use]
    pub fn new(start_pc: u16, length: u16, name_index: u16, descriptor_index: u16, index: u16) -> Self {
        LocalVariable {
            id: NodeId::fresh(),
            start_pc,
            length,
            name_index,
            descriptor_index,
            index,
            referenced_class: None,
        }
    }
}

/// An entry of the `LocalVariableTypeTable` attribute.
#[derive(Debug)]
pub struct LocalVariableType {
    /// Identity used by markers
    pub id: NodeId,
    /// Start of the live range
    pub start_pc: u16,
    /// Length of the live range
    pub length: u16,
    /// Index of the `Utf8` variable name
    pub name_index: u16,
    /// Index of the `Utf8` generic signature
    pub signature_index: u16,
    /// Local variable slot
    pub index: u16,
    /// Classes named in the signature, `None` once a class has been removed
    pub referenced_classes: Vec<Option<ClassId>>,
}

impl LocalVariableType {
    /// Creates an entry with a fresh identity.
    #[must_use]
    pub fn new(start_pc: u16, length: u16, name_index: u16, signature_index: u16, index: u16) -> Self {
        LocalVariableType {
            id: NodeId::fresh(),
            start_pc,
            length,
            name_index,
            signature_index,
            index,
            referenced_classes: Vec::new(),
        }
    }

    /// Returns `true` if `variable` describes the same slot, name and live range.
    #[must_use]
    pub fn matches(&self, variable: &LocalVariable) -> bool {
        self.index == variable.index
            && self.name_index == variable.name_index
            && self.start_pc == variable.start_pc
            && self.length == variable.length
    }
}

/// Payload of the parameter-annotation attributes.
///
/// `annotations_count[i]` is the class-file `num_annotations` of parameter `i` and must
/// equal `parameter_annotations[i].len()`. The two vectors are filled by the parser;
/// compaction keeps existing counts in step and never pads either side.
#[derive(Debug, Default)]
pub struct ParameterAnnotations {
    /// Per-parameter annotation counts
    pub annotations_count: Vec<u16>,
    /// Per-parameter annotation lists
    pub parameter_annotations: Vec<Vec<Annotation>>,
}

impl ParameterAnnotations {
    /// Builds the table from per-parameter lists, deriving the counts.
    #[must_use]
    pub fn from_lists(parameter_annotations: Vec<Vec<Annotation>>) -> Self {
        let annotations_count = parameter_annotations
            .iter()
            .map(|list| list.len() as u16)
            .collect();
        ParameterAnnotations {
            annotations_count,
            parameter_annotations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_names() {
        assert_eq!(AttributeInfo::Deprecated.name(), "Deprecated");
        assert_eq!(
            AttributeInfo::Code(CodeAttribute::default()).name(),
            "Code"
        );
        assert_eq!(
            AttributeInfo::RuntimeInvisibleParameterAnnotations(ParameterAnnotations::default())
                .name(),
            "RuntimeInvisibleParameterAnnotations"
        );
    }

    #[test]
    fn test_local_variable_type_matching() {
        let variable = LocalVariable::new(0, 10, 5, 6, 1);
        let same = LocalVariableType::new(0, 10, 5, 7, 1);
        let other_slot = LocalVariableType::new(0, 10, 5, 7, 2);
        let other_range = LocalVariableType::new(2, 10, 5, 7, 1);
        assert!(same.matches(&variable));
        assert!(!other_slot.matches(&variable));
        assert!(!other_range.matches(&variable));
    }

    #[test]
    fn test_parameter_annotations_from_lists() {
        let table = ParameterAnnotations::from_lists(vec![Vec::new(), Vec::new()]);
        assert_eq!(table.annotations_count, vec![0, 0]);
        assert_eq!(table.parameter_annotations.len(), 2);
    }
}
