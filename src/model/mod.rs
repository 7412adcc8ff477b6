//! In-memory class model consumed by the shrinker.
//!
//! The model mirrors the structure of JVM class files closely enough for reachability
//! analysis and compaction: positional constant pools, member lists, a two-level
//! attribute hierarchy, annotations with nested element values, and decoded Kotlin
//! metadata. It deliberately stops short of a class-file reader or writer.
//!
//! # Architecture
//!
//! Every class lives in a [`ClassPool`] arena and is addressed by [`ClassId`]. All
//! cross-class relations (super classes, subclasses, resolved constants, annotation
//! types) are stored as ids or [`MemberRef`]s, never as owning pointers. Every node a
//! marker can mark carries a [`NodeId`]; marks themselves live in the marker, so the
//! model holds no per-run state.
//!
//! # Key Components
//!
//! - [`ClassPool`] - Arena of [`ClassNode`]s with name lookup
//! - [`ProgramClass`] / [`LibraryClass`] - The two class kinds
//! - [`ConstantPool`] / [`Constant`] - Positional constant pool
//! - [`Attribute`] / [`AttributeInfo`] - Decoded attributes
//! - [`Annotation`] / [`ElementValue`] - Annotations
//! - [`KotlinMetadata`] - Decoded Kotlin declarations
//! - [`ClassBuilder`] / [`LibraryClassBuilder`] - Construction
//! - [`linker::link`] - Resolution of weak references by name

mod annotation;
mod attribute;
mod builder;
pub mod bytecode;
mod class;
mod constant;
pub mod descriptor;
mod flags;
mod ids;
mod kotlin;
pub mod linker;
mod member;
mod pool;

pub use annotation::{Annotation, ElementValue, ElementValueKind};
pub use attribute::{
    Attribute, AttributeInfo, BootstrapMethod, CodeAttribute, ExceptionHandler, InnerClass,
    LineNumber, LocalVariable, LocalVariableType, ParameterAnnotations, RecordComponent,
};
pub use builder::{ClassBuilder, LibraryClassBuilder};
pub use class::{ClassNode, LibraryClass, ProgramClass};
pub use constant::{Constant, ConstantPool, ConstantSlot, ConstantTag, DynamicConstant, RefConstant};
pub use flags::{ClassAccessFlags, MemberAccessFlags};
pub use ids::{ClassId, MemberKind, MemberRef, NodeId};
pub use kotlin::{
    JvmMemberSignature, KotlinAnnotation, KotlinClassKind, KotlinClassifier, KotlinConstructor,
    KotlinDeclarationContainer, KotlinFunction, KotlinMetadata, KotlinMetadataKind,
    KotlinMultiFileFacadeKind, KotlinMultiFilePartKind, KotlinProperty, KotlinType,
    KotlinTypeAlias, KotlinTypeParameter, KotlinValueParameter, KotlinVersionRequirement,
    TypeAliasRef,
};
pub use member::{LibraryMember, MemberInfo, ProgramMember, CLINIT_DESCRIPTOR, CLINIT_NAME, INIT_NAME};
pub use pool::ClassPool;
