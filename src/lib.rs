// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # classhrink
//!
//! Reachability marking and compaction for JVM class graphs.
//!
//! `classhrink` is the core of a bytecode shrinker: given an in-memory model of program
//! classes, library classes and their members, and a set of keep roots, it computes the
//! transitive closure of everything the roots need and then removes everything else,
//! down to individual constant pool entries, attribute entries, annotations and Kotlin
//! metadata declarations.
//!
//! ## Features
//!
//! - **Precise propagation** - class hierarchy, constant pool, bytecode operands,
//!   attributes, annotations and Kotlin metadata
//! - **Possible marks** - methods that override used methods in classes that are not
//!   used (yet) are kept provisionally and upgraded when their class becomes used
//! - **Positional compaction** - surviving constant pool entries keep their index, so
//!   bytecode never needs rewriting
//! - **Explanations** - the diagnostic marker records why every node was kept
//!
//! ## Quick Start
//!
//! ```rust
//! use classhrink::prelude::*;
//!
//! let mut pool = ClassPool::new();
//! pool.add_library(LibraryClassBuilder::new("java/lang/Object").build());
//!
//! let mut helper = ClassBuilder::new("com/example/Helper", Some("java/lang/Object"));
//! helper.method(MemberAccessFlags::PUBLIC | MemberAccessFlags::STATIC, "help", "()V", Vec::new());
//! let helper = pool.add_program(helper.build());
//!
//! let mut main = ClassBuilder::new("com/example/Main", Some("java/lang/Object"));
//! let call = main.method_ref("com/example/Helper", "help", "()V");
//! let [high, low] = call.to_be_bytes();
//! let code = main.code(0, 1, vec![0xb8, high, low, 0xb1], Vec::new());
//! let entry = main.method(MemberAccessFlags::PUBLIC | MemberAccessFlags::STATIC, "main", "([Ljava/lang/String;)V", vec![code]);
//! let main = pool.add_program(main.build());
//! pool.add_program(ClassBuilder::new("com/example/Unused", Some("java/lang/Object")).build());
//!
//! link(&mut pool)?;
//!
//! let mut marker = SimpleUsageMarker::new();
//! let report = ShrinkPass::new(ShrinkConfig::default())
//!     .run(&mut pool, &mut marker, &[KeepRoot::Member(MemberRef::new(main, entry))])?;
//!
//! assert!(marker.is_class_used(&pool, helper));
//! assert_eq!(report.kept_classes, 2);
//! assert_eq!(report.removed_classes, 1);
//! # Ok::<(), classhrink::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`model`] - The class graph: pools, classes, members, constants, attributes,
//!   annotations, Kotlin metadata, construction and linking
//! - [`shrink`] - Marking strategies, the propagator, compaction, the driver and
//!   diagnostics
//! - [`utils`] - Shared data structures
//! - [`prelude`] - Convenient re-exports
//! - [`Error`] and [`Result`] - Error handling
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T, Error>`](Result). Errors are never
//! recovered internally: a broken weak reference, a malformed constant pool or an
//! attempt to compact a library class aborts the run.
//!
//! ```rust
//! use classhrink::prelude::*;
//!
//! let mut pool = ClassPool::new();
//! let object = pool.add_library(LibraryClassBuilder::new("java/lang/Object").build());
//! let marker = SimpleUsageMarker::new();
//!
//! match ClassShrinker::new(&pool, &marker).shrink_class(&mut pool, object) {
//!     Err(Error::UnsupportedOperation { operation, .. }) => assert_eq!(operation, "shrink_class"),
//!     other => panic!("unexpected {other:?}"),
//! }
//! ```
//!
//! ## Logging
//!
//! The crate emits [`tracing`](https://docs.rs/tracing) events: `debug` for marking passes
//! and per-class compaction, `trace` for individual marks, `info` for run summaries. No
//! subscriber is installed.

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use classhrink::prelude::*;
///
/// let mut pool = ClassPool::new();
/// pool.add_library(LibraryClassBuilder::new("java/lang/Object").build());
/// assert_eq!(pool.len(), 1);
/// ```
pub mod prelude;

/// The in-memory class model.
///
/// # Key Types
///
/// - [`model::ClassPool`] - Arena of classes addressed by [`model::ClassId`]
/// - [`model::ProgramClass`] / [`model::LibraryClass`] - The two class kinds
/// - [`model::ConstantPool`] - Positional constant pool
/// - [`model::ClassBuilder`] - Construction of program classes
/// - [`model::linker::link`] - Resolution of weak references
pub mod model;

/// Reachability marking and compaction.
///
/// # Key Types
///
/// - [`shrink::ShrinkPass`] - Mark and sweep driver
/// - [`shrink::ClassUsageMarker`] - Structural propagation
/// - [`shrink::ClassShrinker`] - Compaction
/// - [`shrink::ShortestUsageMarker`] - Marker recording why nodes are kept
pub mod shrink;

/// Shared data structures.
pub mod utils;

/// `classhrink` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `classhrink` Error type
///
/// The main error type for all operations in this crate.
///
/// # Examples
///
/// ```rust
/// use classhrink::{model::ClassPool, model::ClassId, Error};
///
/// let pool = ClassPool::new();
/// match pool.class(ClassId::new(7)) {
///     Err(Error::ClassNotFound(id)) => assert_eq!(id, ClassId::new(7)),
///     other => panic!("unexpected {other:?}"),
/// }
/// ```
pub use error::Error;
