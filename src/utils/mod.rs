//! Small data structures shared across the crate.

mod class_set;

pub use class_set::{ClassSet, ClassSetIter};
