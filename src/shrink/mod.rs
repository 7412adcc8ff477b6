//! Reachability marking and compaction.
//!
//! This module decides which parts of a linked [`crate::model::ClassPool`] are used and
//! removes the rest.
//!
//! # Architecture
//!
//! Marking and compaction are separate phases with separate borrows. Marking reads the
//! pool and writes marks into a [`UsageMarker`]; compaction reads the marks and rewrites
//! the pool. Marks are keyed by [`crate::model::NodeId`] and never stored in the model.
//!
//! ```text
//! keep roots ──► ClassUsageMarker ──► UsageMarker (side table)
//!                  │  AnnotationUsageMarker        │
//!                  │  LocalVariableTypeUsageMarker │
//!                  └  Kotlin metadata              ▼
//!                                      ClassShrinker ──► compacted pool
//!                                        └ KotlinShrinker, retain_correlated
//! ```
//!
//! # Key Components
//!
//! - [`UsageMarker`] - Mark storage strategy; [`SimpleUsageMarker`] and the diagnostic
//!   [`ShortestUsageMarker`]
//! - [`ClassUsageMarker`] - Structural propagation of marks
//! - [`AnnotationUsageMarker`] - Annotation retention rules
//! - [`LocalVariableTypeUsageMarker`] - Local-variable debug info rules
//! - [`ClassShrinker`] / [`KotlinShrinker`] - Compaction
//! - [`ShrinkPass`] - Mark-to-closure and sweep driver
//! - [`ShortestUsagePrinter`] / [`UsagePrinter`] - Diagnostics
//!
//! # Examples
//!
//! ```rust
//! use classhrink::model::{linker::link, ClassBuilder, ClassPool, LibraryClassBuilder, MemberAccessFlags, MemberRef};
//! use classhrink::shrink::{KeepRoot, ShrinkPass, SimpleUsageMarker, UsageMarker};
//!
//! let mut pool = ClassPool::new();
//! pool.add_library(LibraryClassBuilder::new("java/lang/Object").build());
//! let mut main = ClassBuilder::new("com/example/Main", Some("java/lang/Object"));
//! let entry = main.method(MemberAccessFlags::PUBLIC | MemberAccessFlags::STATIC, "main", "([Ljava/lang/String;)V", Vec::new());
//! main.method(MemberAccessFlags::PRIVATE, "helper", "()V", Vec::new());
//! let main = pool.add_program(main.build());
//! link(&mut pool)?;
//!
//! let mut marker = SimpleUsageMarker::new();
//! let report = ShrinkPass::default().run(&mut pool, &mut marker, &[KeepRoot::Member(MemberRef::new(main, entry))])?;
//!
//! assert!(marker.is_used(entry));
//! assert_eq!(report.removed_methods, 1);
//! # Ok::<(), classhrink::Error>(())
//! ```

mod annotation_marker;
mod class_marker;
mod config;
mod correlate;
mod kotlin_marker;
mod kotlin_shrinker;
mod local_variable_marker;
mod marker;
mod pass;
mod printer;
mod shortest;
mod shrinker;
mod usage_mark;

pub use annotation_marker::AnnotationUsageMarker;
pub use class_marker::ClassUsageMarker;
pub use config::{ShrinkConfig, DEFAULT_INTRINSIC_ANNOTATIONS};
pub use correlate::retain_correlated;
pub use kotlin_shrinker::KotlinShrinker;
pub use local_variable_marker::LocalVariableTypeUsageMarker;
pub use marker::{MarkContext, SimpleUsageMarker, UsageMarker};
pub use pass::{KeepRoot, MarkStats, ShrinkPass, ShrinkReport};
pub use printer::{ShortestUsagePrinter, UsagePrinter};
pub use shortest::ShortestUsageMarker;
pub use shrinker::{ClassShrinkStats, ClassShrinker};
pub use usage_mark::{Referrer, UsageMark, UsageMarkId, UsageReason};
