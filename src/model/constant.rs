//! Constant pool entries and the positional constant pool container.
//!
//! The constant pool is addressed by raw `u16` indices from everywhere in a class
//! (instructions, attributes, other constants), so positions are never shifted. Slot 0 is
//! reserved, and the slot following a `Long` or `Double` is occupied by an
//! [`Constant::Empty`] placeholder. Compaction turns unused slots into `Empty` tombstones.
//!
//! # Key Types
//! - [`Constant`]: the tagged union of all constant kinds
//! - [`ConstantTag`]: the class-file tag of a constant kind
//! - [`ConstantSlot`]: a pool position with its markable identity
//! - [`ConstantPool`]: the container

use strum::{EnumCount, EnumIter};

use crate::model::{ClassId, MemberRef, NodeId};

/// Class-file tag values of constant kinds (JVMS §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumCount)]
#[repr(u8)]
pub enum ConstantTag {
    /// `CONSTANT_Utf8`
    Utf8 = 1,
    /// `CONSTANT_Integer`
    Integer = 3,
    /// `CONSTANT_Float`
    Float = 4,
    /// `CONSTANT_Long`, occupies two slots
    Long = 5,
    /// `CONSTANT_Double`, occupies two slots
    Double = 6,
    /// `CONSTANT_Class`
    Class = 7,
    /// `CONSTANT_String`
    String = 8,
    /// `CONSTANT_Fieldref`
    Fieldref = 9,
    /// `CONSTANT_Methodref`
    Methodref = 10,
    /// `CONSTANT_InterfaceMethodref`
    InterfaceMethodref = 11,
    /// `CONSTANT_NameAndType`
    NameAndType = 12,
    /// `CONSTANT_MethodHandle`
    MethodHandle = 15,
    /// `CONSTANT_MethodType`
    MethodType = 16,
    /// `CONSTANT_Dynamic`
    Dynamic = 17,
    /// `CONSTANT_InvokeDynamic`
    InvokeDynamic = 18,
    /// `CONSTANT_Module`
    Module = 19,
    /// `CONSTANT_Package`
    Package = 20,
}

/// Shared payload of `Fieldref`, `Methodref` and `InterfaceMethodref`.
#[derive(Debug, PartialEq)]
pub struct RefConstant {
    /// Index of the `Class` constant of the declaring class
    pub class_index: u16,
    /// Index of the `NameAndType` constant
    pub name_and_type_index: u16,
    /// Resolved declaring class (weak)
    pub referenced_class: Option<ClassId>,
    /// Resolved member (weak)
    pub referenced_member: Option<MemberRef>,
}

/// Shared payload of `Dynamic` and `InvokeDynamic`.
#[derive(Debug, PartialEq)]
pub struct DynamicConstant {
    /// Index into the class's `BootstrapMethods` attribute
    pub bootstrap_method_attr_index: u16,
    /// Index of the `NameAndType` constant
    pub name_and_type_index: u16,
    /// Classes named in the descriptor (weak)
    pub referenced_classes: Vec<ClassId>,
}

/// A constant pool entry.
#[derive(Debug, PartialEq)]
pub enum Constant {
    /// Reserved slot 0, second half of a wide constant, or a compaction tombstone
    Empty,
    /// 32-bit integer
    Integer(i32),
    /// 32-bit float
    Float(f32),
    /// 64-bit integer
    Long(i64),
    /// 64-bit float
    Double(f64),
    /// Modified UTF-8 text
    Utf8(String),
    /// String literal
    String {
        /// Index of the `Utf8` constant holding the text
        string_index: u16,
        /// Class named by the literal, when used reflectively (weak)
        referenced_class: Option<ClassId>,
        /// Member named by the literal, when used reflectively (weak)
        referenced_member: Option<MemberRef>,
    },
    /// Class or interface reference
    Class {
        /// Index of the `Utf8` constant holding the internal name
        name_index: u16,
        /// Resolved class (weak)
        referenced_class: Option<ClassId>,
    },
    /// Field reference
    Fieldref(RefConstant),
    /// Method reference
    Methodref(RefConstant),
    /// Interface method reference
    InterfaceMethodref(RefConstant),
    /// Name and descriptor pair
    NameAndType {
        /// Index of the `Utf8` name
        name_index: u16,
        /// Index of the `Utf8` descriptor
        descriptor_index: u16,
    },
    /// Method handle
    MethodHandle {
        /// Reference kind (1..=9)
        reference_kind: u8,
        /// Index of the referenced field or method constant
        reference_index: u16,
    },
    /// Method type
    MethodType {
        /// Index of the `Utf8` descriptor
        descriptor_index: u16,
        /// Classes named in the descriptor (weak)
        referenced_classes: Vec<ClassId>,
    },
    /// Dynamically computed constant
    Dynamic(DynamicConstant),
    /// Dynamically computed call site
    InvokeDynamic(DynamicConstant),
    /// Module reference
    Module {
        /// Index of the `Utf8` module name
        name_index: u16,
    },
    /// Package reference
    Package {
        /// Index of the `Utf8` package name
        name_index: u16,
    },
}

impl Constant {
    /// Returns the class-file tag, or `None` for [`Constant::Empty`].
    #[must_use]
    pub fn tag(&self) -> Option<ConstantTag> {
        Some(match self {
            Constant::Empty => return None,
            Constant::Integer(_) => ConstantTag::Integer,
            Constant::Float(_) => ConstantTag::Float,
            Constant::Long(_) => ConstantTag::Long,
            Constant::Double(_) => ConstantTag::Double,
            Constant::Utf8(_) => ConstantTag::Utf8,
            Constant::String { .. } => ConstantTag::String,
            Constant::Class { .. } => ConstantTag::Class,
            Constant::Fieldref(_) => ConstantTag::Fieldref,
            Constant::Methodref(_) => ConstantTag::Methodref,
            Constant::InterfaceMethodref(_) => ConstantTag::InterfaceMethodref,
            Constant::NameAndType { .. } => ConstantTag::NameAndType,
            Constant::MethodHandle { .. } => ConstantTag::MethodHandle,
            Constant::MethodType { .. } => ConstantTag::MethodType,
            Constant::Dynamic(_) => ConstantTag::Dynamic,
            Constant::InvokeDynamic(_) => ConstantTag::InvokeDynamic,
            Constant::Module { .. } => ConstantTag::Module,
            Constant::Package { .. } => ConstantTag::Package,
        })
    }

    /// Number of pool slots this constant occupies.
    #[must_use]
    pub fn width(&self) -> usize {
        match self {
            Constant::Long(_) | Constant::Double(_) => 2,
            _ => 1,
        }
    }

    /// Returns `true` for the reserved / tombstone entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Constant::Empty)
    }
}

/// A constant pool position: the constant plus its markable identity.
#[derive(Debug)]
pub struct ConstantSlot {
    /// Identity used by markers
    pub id: NodeId,
    /// The constant stored in this slot
    pub constant: Constant,
}

impl ConstantSlot {
    /// Creates a slot with a fresh identity.
    #[must_use]
    pub fn new(constant: Constant) -> Self {
        ConstantSlot {
            id: NodeId::fresh(),
            constant,
        }
    }
}

/// The positional constant pool of a program class.
///
/// `len()` is the class-file `constant_pool_count`: one more than the highest occupied
/// index, slot 0 included.
#[derive(Debug)]
pub struct ConstantPool {
    slots: Vec<ConstantSlot>,
}

impl Default for ConstantPool {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstantPool {
    /// Creates a pool holding only the reserved slot 0.
    #[must_use]
    pub fn new() -> Self {
        ConstantPool {
            slots: vec![ConstantSlot::new(Constant::Empty)],
        }
    }

    /// Creates a pool from raw slots, as produced by a parser.
    ///
    /// The first slot is expected to be the reserved [`Constant::Empty`].
    #[must_use]
    pub fn from_slots(slots: Vec<ConstantSlot>) -> Self {
        ConstantPool { slots }
    }

    /// Appends a constant and returns its index. Wide constants reserve a second slot.
    ///
    /// Callers are responsible for staying within the 65535 slots the class-file format
    /// allows.
    pub fn push(&mut self, constant: Constant) -> u16 {
        debug_assert!(self.slots.len() < usize::from(u16::MAX));
        let index = self.slots.len() as u16;
        let width = constant.width();
        self.slots.push(ConstantSlot::new(constant));
        if width == 2 {
            self.slots.push(ConstantSlot::new(Constant::Empty));
        }
        index
    }

    /// The class-file `constant_pool_count`.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if only the reserved slot is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.len() <= 1
    }

    /// Returns the slot at `index`, if inside the pool.
    #[must_use]
    pub fn slot(&self, index: u16) -> Option<&ConstantSlot> {
        self.slots.get(usize::from(index))
    }

    /// Returns the constant at `index`, if inside the pool.
    #[must_use]
    pub fn get(&self, index: u16) -> Option<&Constant> {
        self.slot(index).map(|slot| &slot.constant)
    }

    /// Returns `true` if `index` holds no live constant (tombstoned, reserved, or past
    /// the end of the pool).
    #[must_use]
    pub fn is_tombstone(&self, index: u16) -> bool {
        self.get(index).is_none_or(Constant::is_empty)
    }

    /// Returns the text of the `Utf8` constant at `index`.
    #[must_use]
    pub fn utf8(&self, index: u16) -> Option<&str> {
        match self.get(index) {
            Some(Constant::Utf8(text)) => Some(text),
            _ => None,
        }
    }

    /// Returns the internal name of the `Class` constant at `index`.
    #[must_use]
    pub fn class_name(&self, index: u16) -> Option<&str> {
        match self.get(index) {
            Some(Constant::Class { name_index, .. }) => self.utf8(*name_index),
            _ => None,
        }
    }

    /// Returns the resolved class of the `Class` constant at `index`.
    #[must_use]
    pub fn referenced_class(&self, index: u16) -> Option<ClassId> {
        match self.get(index) {
            Some(Constant::Class {
                referenced_class, ..
            }) => *referenced_class,
            _ => None,
        }
    }

    /// Returns the name and descriptor of the `NameAndType` constant at `index`.
    #[must_use]
    pub fn name_and_type(&self, index: u16) -> Option<(&str, &str)> {
        match self.get(index) {
            Some(Constant::NameAndType {
                name_index,
                descriptor_index,
            }) => Some((self.utf8(*name_index)?, self.utf8(*descriptor_index)?)),
            _ => None,
        }
    }

    /// Iterates over `(index, slot)` pairs, slot 0 included.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &ConstantSlot)> {
        self.slots
            .iter()
            .enumerate()
            .map(|(index, slot)| (index as u16, slot))
    }

    /// Iterates mutably over `(index, slot)` pairs, slot 0 included.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (u16, &mut ConstantSlot)> {
        self.slots
            .iter_mut()
            .enumerate()
            .map(|(index, slot)| (index as u16, slot))
    }

    /// Drops every slot at or beyond `len`. Never drops the reserved slot.
    pub fn truncate(&mut self, len: usize) {
        self.slots.truncate(len.max(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_pool_starts_with_reserved_slot() {
        let pool = ConstantPool::new();
        assert_eq!(pool.len(), 1);
        assert!(pool.is_empty());
        assert!(pool.is_tombstone(0));
    }

    #[test]
    fn test_wide_constants_take_two_slots() {
        let mut pool = ConstantPool::new();
        let long = pool.push(Constant::Long(42));
        let int = pool.push(Constant::Integer(7));
        assert_eq!(long, 1);
        assert_eq!(int, 3);
        assert_eq!(pool.len(), 4);
        assert!(pool.get(2).is_some_and(Constant::is_empty));
    }

    #[test]
    fn test_class_name_lookup() {
        let mut pool = ConstantPool::new();
        let name = pool.push(Constant::Utf8("com/example/Foo".to_string()));
        let class = pool.push(Constant::Class {
            name_index: name,
            referenced_class: None,
        });
        assert_eq!(pool.class_name(class), Some("com/example/Foo"));
        assert_eq!(pool.class_name(name), None);
        assert_eq!(pool.utf8(99), None);
        assert!(pool.is_tombstone(99));
    }

    #[test]
    fn test_tags_are_distinct() {
        let mut seen = rustc_hash::FxHashSet::default();
        for tag in ConstantTag::iter() {
            assert!(seen.insert(tag as u8));
        }
        assert_eq!(seen.len(), ConstantTag::COUNT);
        assert_eq!(Constant::Empty.tag(), None);
        assert_eq!(Constant::Integer(1).tag(), Some(ConstantTag::Integer));
    }
}
