//! Configuration for a shrink run.
//!
//! The configuration never decides *what* to keep (that is the job of the keep roots
//! handed to [`crate::shrink::ShrinkPass`]); it only tunes how reachability spreads
//! through structures whose retention policy varies between tools.

use rustc_hash::FxHashSet;

use crate::model::descriptor::{external_class_name, simple_class_name};

/// Fully-qualified names of the annotation types retained by default even when their
/// class is otherwise unreferenced.
pub const DEFAULT_INTRINSIC_ANNOTATIONS: [&str; 2] = [
    "kotlin.Metadata",
    "kotlin.coroutines.jvm.internal.DebugMetadata",
];

/// Configuration for marking and compaction.
#[derive(Debug, Clone)]
pub struct ShrinkConfig {
    /// Annotation types that are always retained when their attribute is reached
    /// (default: `kotlin.Metadata`, `kotlin.coroutines.jvm.internal.DebugMetadata`).
    ///
    /// Entries are fully-qualified external names. An entry without a package matches
    /// any annotation class with that simple name.
    pub intrinsic_annotations: FxHashSet<String>,

    /// Mark every entry of a reached `InnerClasses` attribute (default: true).
    ///
    /// When disabled, only entries whose inner and outer classes are themselves used
    /// survive; they are picked up by the post-closure marker.
    pub keep_all_inner_class_entries: bool,

    /// Mark every entry of a reached `BootstrapMethods` attribute (default: true).
    ///
    /// When disabled, entries are marked only through the `Dynamic` and
    /// `InvokeDynamic` constants that use them, and compaction renumbers the survivors.
    pub keep_all_bootstrap_methods: bool,

    /// Mark the interface constants of library interfaces as soon as the implementing
    /// class is used (default: true).
    pub mark_library_interfaces: bool,
}

impl Default for ShrinkConfig {
    fn default() -> Self {
        Self {
            intrinsic_annotations: DEFAULT_INTRINSIC_ANNOTATIONS
                .iter()
                .map(|name| (*name).to_string())
                .collect(),
            keep_all_inner_class_entries: true,
            keep_all_bootstrap_methods: true,
            mark_library_interfaces: true,
        }
    }
}

impl ShrinkConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration that only keeps table entries something else needs.
    ///
    /// Inner-class entries are kept only for used classes and bootstrap methods only
    /// for the dynamic constants that are used.
    #[must_use]
    pub fn minimal() -> Self {
        Self {
            keep_all_inner_class_entries: false,
            keep_all_bootstrap_methods: false,
            ..Self::default()
        }
    }

    /// Adds an annotation type to the intrinsic allowlist.
    ///
    /// # Arguments
    ///
    /// * `name` - Fully-qualified external name, e.g. `kotlin.jvm.JvmName`.
    ///
    /// # Returns
    ///
    /// The modified configuration (builder pattern).
    #[must_use]
    pub fn with_intrinsic_annotation(mut self, name: impl Into<String>) -> Self {
        self.intrinsic_annotations.insert(name.into());
        self
    }

    /// Replaces the intrinsic allowlist.
    #[must_use]
    pub fn with_intrinsic_annotations<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.intrinsic_annotations = names.into_iter().map(Into::into).collect();
        self
    }

    /// Sets whether every `InnerClasses` entry of a reached attribute is kept.
    #[must_use]
    pub fn with_keep_all_inner_class_entries(mut self, keep: bool) -> Self {
        self.keep_all_inner_class_entries = keep;
        self
    }

    /// Sets whether every `BootstrapMethods` entry of a reached attribute is kept.
    #[must_use]
    pub fn with_keep_all_bootstrap_methods(mut self, keep: bool) -> Self {
        self.keep_all_bootstrap_methods = keep;
        self
    }

    /// Sets whether library interface constants are marked eagerly.
    #[must_use]
    pub fn with_mark_library_interfaces(mut self, mark: bool) -> Self {
        self.mark_library_interfaces = mark;
        self
    }

    /// Returns `true` if the annotation class with the given name is on the intrinsic
    /// allowlist.
    ///
    /// # Arguments
    ///
    /// * `class_name` - Internal (`kotlin/Metadata`) or external (`kotlin.Metadata`)
    ///   class name.
    #[must_use]
    pub fn is_intrinsic_annotation(&self, class_name: &str) -> bool {
        let external = external_class_name(class_name);
        if self.intrinsic_annotations.contains(&external) {
            return true;
        }
        let simple = simple_class_name(class_name);
        self.intrinsic_annotations
            .iter()
            .any(|entry| !entry.contains('.') && entry == simple)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ShrinkConfig::default();
        assert_eq!(config.intrinsic_annotations.len(), 2);
        assert!(config.keep_all_inner_class_entries);
        assert!(config.keep_all_bootstrap_methods);
        assert!(config.mark_library_interfaces);
    }

    #[test]
    fn test_intrinsic_annotation_names() {
        let config = ShrinkConfig::default();
        assert!(config.is_intrinsic_annotation("kotlin/Metadata"));
        assert!(config.is_intrinsic_annotation("kotlin.Metadata"));
        assert!(config.is_intrinsic_annotation(
            "kotlin/coroutines/jvm/internal/DebugMetadata"
        ));
        assert!(!config.is_intrinsic_annotation("com/example/Metadata"));
        assert!(!config.is_intrinsic_annotation("Metadata"));
    }

    #[test]
    fn test_simple_name_entries() {
        let config = ShrinkConfig::new().with_intrinsic_annotations(["Keep"]);
        assert!(config.is_intrinsic_annotation("androidx/annotation/Keep"));
        assert!(!config.is_intrinsic_annotation("kotlin/Metadata"));
    }

    #[test]
    fn test_builder_pattern() {
        let config = ShrinkConfig::minimal()
            .with_intrinsic_annotation("kotlin.jvm.JvmName")
            .with_mark_library_interfaces(false);
        assert!(!config.keep_all_inner_class_entries);
        assert!(!config.keep_all_bootstrap_methods);
        assert!(!config.mark_library_interfaces);
        assert!(config.is_intrinsic_annotation("kotlin/jvm/JvmName"));
    }
}
