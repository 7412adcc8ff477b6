use thiserror::Error;

use crate::model::{ClassId, MemberRef};

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! unsupported_error {
    ($operation:expr, $node:expr) => {
        crate::Error::UnsupportedOperation {
            operation: $operation,
            node: $node.to_string(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Marking and compaction never recover from an error internally. Every failure is returned
/// to the immediate caller (normally the [`crate::shrink::ShrinkPass`] driver), which aborts
/// the whole shrink run; there is no best-effort mode.
///
/// # Error Categories
///
/// ## Input Graph Errors
/// - [`Error::Malformed`] - Inconsistent class model (bad bytecode, wrong constant kind)
/// - [`Error::InvalidConstantIndex`] - A pool index outside the constant pool
/// - [`Error::ClassNotFound`] - A weak class reference that does not resolve
/// - [`Error::MemberNotFound`] - A weak member reference that does not resolve
///
/// ## Usage Errors
/// - [`Error::UnsupportedOperation`] - A visitor received a node it must never touch,
///   most notably a library class handed to compaction
///
/// # Examples
///
/// ```rust
/// use classhrink::{Error, model::{ClassPool, LibraryClassBuilder}, shrink::{ClassShrinker, SimpleUsageMarker}};
///
/// let mut pool = ClassPool::new();
/// let object = pool.add_library(LibraryClassBuilder::new("java/lang/Object").build());
///
/// let marker = SimpleUsageMarker::new();
/// let shrinker = ClassShrinker::new(&pool, &marker);
/// match shrinker.shrink_class(&mut pool, object) {
///     Err(Error::UnsupportedOperation { operation, node }) => {
///         eprintln!("driver bug: {operation} on {node}");
///     }
///     other => panic!("unexpected: {other:?}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The class model is damaged and could not be processed.
    ///
    /// This error indicates that a structure handed over by the parser/linker does not
    /// satisfy the invariants of the class-file format, e.g. truncated bytecode or a
    /// `Methodref` index that points at a `Utf8` constant. The error includes the source
    /// location where the malformation was detected for debugging purposes.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// A visitor was invoked on a node kind it has no rule for.
    ///
    /// Raised before any mutation happens. It indicates a driver bug (for example a
    /// library class handed to a compaction visitor) and must never be converted into a
    /// silent skip, since continuing could corrupt the class graph.
    #[error("Unsupported operation '{operation}' on {node}")]
    UnsupportedOperation {
        /// The visitor operation that was requested
        operation: &'static str,
        /// Description of the node the operation was requested for
        node: String,
    },

    /// A constant pool index is outside the pool of the given class.
    #[error("Invalid constant pool index {index} in class {class}")]
    InvalidConstantIndex {
        /// Name of the class owning the constant pool
        class: String,
        /// The offending index
        index: u16,
    },

    /// A weak class reference does not resolve in the class pool.
    #[error("Class not found in class pool - {0}")]
    ClassNotFound(ClassId),

    /// A weak member reference does not resolve in its class.
    #[error("Member not found in class pool - {0}")]
    MemberNotFound(MemberRef),
}
