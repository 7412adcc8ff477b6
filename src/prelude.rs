//! # classhrink Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! of the classhrink library. Import this module to get quick access to everything needed
//! to build a class pool, mark it and compact it.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all classhrink operations
pub use crate::Error;

/// The result type used throughout classhrink
pub use crate::Result;

// ================================================================================================
// Class Model
// ================================================================================================

/// Identities and weak references
pub use crate::model::{ClassId, MemberKind, MemberRef, NodeId};

/// Classes and the class pool
pub use crate::model::{ClassNode, ClassPool, LibraryClass, ProgramClass};

/// Members and access flags
pub use crate::model::{ClassAccessFlags, LibraryMember, MemberAccessFlags, MemberInfo, ProgramMember};

/// Constant pool
pub use crate::model::{Constant, ConstantPool, ConstantSlot, ConstantTag};

/// Attributes and annotations
pub use crate::model::{Annotation, Attribute, AttributeInfo, ElementValue, ElementValueKind};

/// Kotlin metadata
pub use crate::model::{KotlinMetadata, KotlinMetadataKind};

// ================================================================================================
// Construction and Linking
// ================================================================================================

/// Builders for program and library classes
pub use crate::model::{ClassBuilder, LibraryClassBuilder};

/// Resolution of weak references by name
pub use crate::model::linker::link;

// ================================================================================================
// Marking
// ================================================================================================

/// Mark storage strategies
pub use crate::shrink::{ShortestUsageMarker, SimpleUsageMarker, UsageMarker};

/// Structural propagation
pub use crate::shrink::ClassUsageMarker;

/// Shrink configuration
pub use crate::shrink::ShrinkConfig;

// ================================================================================================
// Compaction and Driver
// ================================================================================================

/// Compaction of a single class
pub use crate::shrink::{ClassShrinkStats, ClassShrinker};

/// Mark and sweep driver
pub use crate::shrink::{KeepRoot, MarkStats, ShrinkPass, ShrinkReport};

// ================================================================================================
// Diagnostics
// ================================================================================================

/// Explanations and removal listings
pub use crate::shrink::{ShortestUsagePrinter, UsagePrinter, UsageReason};
