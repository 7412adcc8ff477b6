//! The shrink driver.
//!
//! [`ShrinkPass`] runs the two phases of a shrink over a linked [`ClassPool`]:
//!
//! 1. **mark**: keep roots are marked and propagated, then the post-closure markers run
//!    over every used program class until a pass marks nothing new;
//! 2. **sweep**: every program class is compacted according to the marks.
//!
//! The marker is owned by the caller so that diagnostics can be read between the two
//! phases, or after them.

use tracing::{debug, info};

use crate::{
    model::{ClassId, ClassNode, ClassPool, MemberRef},
    shrink::{ClassShrinkStats, ClassShrinker, ClassUsageMarker, ShrinkConfig, UsageMarker},
    Result,
};

/// A node the caller has decided to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeepRoot {
    /// Keep a class
    Class(ClassId),
    /// Keep a member, and with it its class
    Member(MemberRef),
}

/// Outcome of the mark phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarkStats {
    /// Number of post-closure passes, including the last one that changed nothing
    pub passes: usize,
    /// Number of nodes marked as used
    pub used_nodes: usize,
}

/// Outcome of the sweep phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShrinkReport {
    /// Program classes that survive
    pub kept_classes: usize,
    /// Program classes that were emptied
    pub removed_classes: usize,
    /// Removed fields
    pub removed_fields: usize,
    /// Removed methods
    pub removed_methods: usize,
    /// Removed constant pool entries
    pub removed_constants: usize,
    /// Removed attributes and attribute-level entries
    pub removed_attributes: usize,
    /// Removed Kotlin declarations
    pub removed_kotlin_declarations: usize,
}

impl ShrinkReport {
    fn add(&mut self, stats: ClassShrinkStats) {
        self.removed_fields += stats.removed_fields;
        self.removed_methods += stats.removed_methods;
        self.removed_constants += stats.removed_constants;
        self.removed_attributes += stats.removed_attributes;
        self.removed_kotlin_declarations += stats.removed_kotlin_declarations;
    }
}

/// Marks and compacts a class pool.
///
/// # Examples
///
/// ```rust
/// use classhrink::model::{linker::link, ClassBuilder, ClassPool, LibraryClassBuilder};
/// use classhrink::shrink::{KeepRoot, ShrinkConfig, ShrinkPass, SimpleUsageMarker};
///
/// let mut pool = ClassPool::new();
/// pool.add_library(LibraryClassBuilder::new("java/lang/Object").build());
/// let kept = pool.add_program(ClassBuilder::new("com/example/Main", Some("java/lang/Object")).build());
/// let dropped = pool.add_program(ClassBuilder::new("com/example/Unused", Some("java/lang/Object")).build());
/// link(&mut pool)?;
///
/// let mut marker = SimpleUsageMarker::new();
/// let report = ShrinkPass::new(ShrinkConfig::default()).run(&mut pool, &mut marker, &[KeepRoot::Class(kept)])?;
///
/// assert_eq!(report.kept_classes, 1);
/// assert_eq!(report.removed_classes, 1);
/// assert_eq!(pool.program_class(dropped)?.constant_pool.len(), 1);
/// # Ok::<(), classhrink::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ShrinkPass {
    config: ShrinkConfig,
}

impl ShrinkPass {
    /// Creates a driver with the given configuration.
    #[must_use]
    pub fn new(config: ShrinkConfig) -> Self {
        ShrinkPass { config }
    }

    /// The configuration of this driver.
    #[must_use]
    pub fn config(&self) -> &ShrinkConfig {
        &self.config
    }

    /// Marks everything reachable from `roots`.
    ///
    /// # Arguments
    ///
    /// * `pool` - A linked class pool.
    /// * `marker` - Receives the marks.
    /// * `roots` - The nodes to keep.
    ///
    /// # Errors
    ///
    /// Returns the first error raised while propagating; the marker is then left with
    /// a partial closure.
    pub fn mark<M: UsageMarker>(&self, pool: &ClassPool, marker: &mut M, roots: &[KeepRoot]) -> Result<MarkStats> {
        let mut propagator = ClassUsageMarker::new(pool, marker, &self.config);
        for root in roots {
            match *root {
                KeepRoot::Class(class) => propagator.mark_class(class)?,
                KeepRoot::Member(member) => {
                    propagator.mark_class(member.class)?;
                    propagator.mark_member(member)?;
                }
            }
        }

        let program_classes = pool.program_class_ids();
        let mut passes = 0;
        loop {
            passes += 1;
            let before = propagator.marker().used_count();
            for &class in &program_classes {
                if !propagator.marker().is_class_used(pool, class) {
                    continue;
                }
                propagator.mark_interfaces(class)?;
                propagator.mark_inner_classes(class)?;
                propagator.mark_retained_annotations(class)?;
                propagator.mark_kotlin_metadata(class)?;
            }
            let after = propagator.marker().used_count();
            debug!(pass = passes, used_nodes = after, new_nodes = after - before, "marking pass");
            if after == before {
                break;
            }
        }

        let stats = MarkStats {
            passes,
            used_nodes: propagator.marker().used_count(),
        };
        info!(roots = roots.len(), passes = stats.passes, used_nodes = stats.used_nodes, "marking finished");
        Ok(stats)
    }

    /// Compacts every program class according to `marker`, and prunes the subclass
    /// lists of library classes.
    ///
    /// # Errors
    ///
    /// Returns the first compaction error; classes compacted before it stay compacted.
    pub fn sweep<M: UsageMarker>(&self, pool: &mut ClassPool, marker: &M) -> Result<ShrinkReport> {
        let shrinker = ClassShrinker::new(pool, marker);
        let mut report = ShrinkReport::default();

        let classes: Vec<(ClassId, bool)> = pool.iter().map(|(id, class)| (id, class.is_library())).collect();
        for (class, is_library) in classes {
            if is_library {
                if let ClassNode::Library(library) = pool.class_mut(class)? {
                    library
                        .subclasses
                        .retain(|&subclass| shrinker.is_live(subclass));
                }
                continue;
            }
            if shrinker.is_live(class) {
                report.kept_classes += 1;
            } else {
                report.removed_classes += 1;
            }
            report.add(shrinker.shrink_class(pool, class)?);
        }

        info!(
            kept_classes = report.kept_classes,
            removed_classes = report.removed_classes,
            removed_fields = report.removed_fields,
            removed_methods = report.removed_methods,
            removed_constants = report.removed_constants,
            "sweep finished"
        );
        Ok(report)
    }

    /// Runs [`ShrinkPass::mark`] followed by [`ShrinkPass::sweep`].
    ///
    /// # Errors
    ///
    /// Returns the first error of either phase.
    pub fn run<M: UsageMarker>(&self, pool: &mut ClassPool, marker: &mut M, roots: &[KeepRoot]) -> Result<ShrinkReport> {
        self.mark(pool, marker, roots)?;
        self.sweep(pool, marker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::{linker::link, ClassBuilder, MemberAccessFlags},
        shrink::SimpleUsageMarker,
        test::object_pool,
    };

    #[test]
    fn test_member_root_keeps_class() {
        let mut pool = object_pool();
        let mut main = ClassBuilder::new("com/example/Main", Some("java/lang/Object"));
        let entry = main.method(
            MemberAccessFlags::PUBLIC | MemberAccessFlags::STATIC,
            "main",
            "([Ljava/lang/String;)V",
            Vec::new(),
        );
        main.method(MemberAccessFlags::PUBLIC, "unused", "()V", Vec::new());
        let main_id = pool.add_program(main.build());
        link(&mut pool).unwrap();

        let mut marker = SimpleUsageMarker::new();
        let pass = ShrinkPass::default();
        let stats = pass
            .mark(&pool, &mut marker, &[KeepRoot::Member(MemberRef::new(main_id, entry))])
            .unwrap();
        assert!(stats.passes >= 1);
        assert!(marker.is_used(entry));

        let report = pass.sweep(&mut pool, &marker).unwrap();
        assert_eq!(report.kept_classes, 1);
        assert_eq!(report.removed_methods, 1);
        assert_eq!(pool.program_class(main_id).unwrap().methods.len(), 1);
    }

    #[test]
    fn test_library_subclasses_are_pruned() {
        let mut pool = object_pool();
        let kept = pool.add_program(ClassBuilder::new("com/example/Kept", Some("java/lang/Object")).build());
        let dropped = pool.add_program(ClassBuilder::new("com/example/Dropped", Some("java/lang/Object")).build());
        link(&mut pool).unwrap();

        let mut marker = SimpleUsageMarker::new();
        ShrinkPass::default()
            .run(&mut pool, &mut marker, &[KeepRoot::Class(kept)])
            .unwrap();

        let object = pool.find("java/lang/Object").unwrap();
        let subclasses = pool.class(object).unwrap().subclasses();
        assert!(subclasses.contains(&kept));
        assert!(!subclasses.contains(&dropped));
    }

    #[test]
    fn test_no_roots_removes_everything() {
        let mut pool = object_pool();
        let foo = pool.add_program(ClassBuilder::new("com/example/Foo", Some("java/lang/Object")).build());
        link(&mut pool).unwrap();

        let mut marker = SimpleUsageMarker::new();
        let report = ShrinkPass::default().run(&mut pool, &mut marker, &[]).unwrap();
        assert_eq!(report.removed_classes, 1);
        assert_eq!(pool.program_class(foo).unwrap().constant_pool.len(), 1);
    }
}
