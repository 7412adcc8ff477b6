//! Human-readable shrink diagnostics.
//!
//! - [`ShortestUsagePrinter`] explains why a class or member is kept, by walking the
//!   usage chain recorded by a [`ShortestUsageMarker`].
//! - [`UsagePrinter`] lists what a sweep would remove.

use std::fmt::Write;

use crate::{
    model::{descriptor::external_class_name, ClassId, ClassPool, MemberRef, NodeId},
    shrink::{ShortestUsageMarker, UsageMark, UsageMarker},
    Result,
};

/// Explains why nodes are kept.
///
/// # Examples
///
/// ```rust
/// use classhrink::model::{linker::link, ClassBuilder, ClassPool, LibraryClassBuilder};
/// use classhrink::shrink::{KeepRoot, ShortestUsageMarker, ShortestUsagePrinter, ShrinkPass};
///
/// let mut pool = ClassPool::new();
/// let object = pool.add_library(LibraryClassBuilder::new("java/lang/Object").build());
/// let main = pool.add_program(ClassBuilder::new("com/example/Main", Some("java/lang/Object")).build());
/// link(&mut pool)?;
///
/// let mut marker = ShortestUsageMarker::new();
/// ShrinkPass::default().mark(&pool, &mut marker, &[KeepRoot::Class(main)])?;
///
/// let explanation = ShortestUsagePrinter::new(&pool, &marker).explain_class(object)?;
/// assert!(explanation.starts_with("java.lang.Object is kept because:"));
/// assert!(explanation.contains("is extended by com.example.Main"));
/// # Ok::<(), classhrink::Error>(())
/// ```
pub struct ShortestUsagePrinter<'a> {
    pool: &'a ClassPool,
    marker: &'a ShortestUsageMarker,
}

impl<'a> ShortestUsagePrinter<'a> {
    /// Creates a printer over the marks of `marker`.
    #[must_use]
    pub fn new(pool: &'a ClassPool, marker: &'a ShortestUsageMarker) -> Self {
        ShortestUsagePrinter { pool, marker }
    }

    /// Explains why a class is kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the class, or a class or member on its chain, does not
    /// resolve.
    pub fn explain_class(&self, class: ClassId) -> Result<String> {
        let node = self.pool.class(class)?;
        self.explain(&external_class_name(node.name()), node.id())
    }

    /// Explains why a member is kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the member, or a class or member on its chain, does not
    /// resolve.
    pub fn explain_member(&self, member: MemberRef) -> Result<String> {
        let description = describe_member(self.pool, member)?;
        self.explain(&description, member.member)
    }

    fn explain(&self, subject: &str, node: NodeId) -> Result<String> {
        let mut output = String::new();
        if self.marker.is_used(node) {
            let _ = writeln!(output, "{subject} is kept because:");
        } else if self.marker.is_possibly_used(node) {
            let _ = writeln!(output, "{subject} is possibly kept because:");
        } else {
            let _ = writeln!(output, "{subject} is not being kept.");
            return Ok(output);
        }

        for mark in self.marker.usage_chain(node) {
            let line = self.describe_mark(mark)?;
            let _ = writeln!(output, "  {line}");
        }
        Ok(output)
    }

    fn describe_mark(&self, mark: &UsageMark) -> Result<String> {
        let referrer = match (mark.referencing_member, mark.referencing_class) {
            (Some(member), _) => Some(describe_member(self.pool, member)?),
            (None, Some(class)) => Some(external_class_name(self.pool.class(class)?.name())),
            (None, None) => None,
        };
        Ok(match referrer {
            Some(referrer) => format!("{} {}", mark.reason, referrer),
            None => mark.reason.to_string(),
        })
    }
}

/// Lists the classes and members that are not used.
pub struct UsagePrinter<'a, M: UsageMarker> {
    pool: &'a ClassPool,
    marker: &'a M,
}

impl<'a, M: UsageMarker> UsagePrinter<'a, M> {
    /// Creates a printer over the marks of `marker`.
    #[must_use]
    pub fn new(pool: &'a ClassPool, marker: &'a M) -> Self {
        UsagePrinter { pool, marker }
    }

    /// Prints unused program classes, then for each used program class with unused
    /// members the class name followed by the members, one per indented line. Classes
    /// appear in pool order.
    ///
    /// # Errors
    ///
    /// Returns an error if a member name does not resolve in its constant pool.
    pub fn print(&self) -> Result<String> {
        let mut output = String::new();
        for (_, node) in self.pool.iter() {
            let Some(class) = node.as_program() else {
                continue;
            };
            let name = external_class_name(&class.name);
            if !self.marker.is_used(class.id) {
                let _ = writeln!(output, "{name}");
                continue;
            }

            let unused: Vec<_> = class
                .fields
                .iter()
                .chain(&class.methods)
                .filter(|member| !self.marker.is_used(member.id))
                .collect();
            if unused.is_empty() {
                continue;
            }
            let _ = writeln!(output, "{name}:");
            for member in unused {
                let info = class.member_info(member);
                let _ = writeln!(output, "    {}{}", info.name, info.descriptor);
            }
        }
        Ok(output)
    }
}

fn describe_member(pool: &ClassPool, member: MemberRef) -> Result<String> {
    let class = pool.class(member.class)?;
    let info = pool.member(member)?;
    Ok(format!(
        "{}: {}{}",
        external_class_name(class.name()),
        info.name,
        info.descriptor
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::{linker::link, ClassBuilder, MemberAccessFlags},
        shrink::{KeepRoot, ShrinkPass, SimpleUsageMarker},
        test::object_pool,
    };

    #[test]
    fn test_explain_root_and_unused() {
        let mut pool = object_pool();
        let main = pool.add_program(ClassBuilder::new("com/example/Main", Some("java/lang/Object")).build());
        let unused = pool.add_program(ClassBuilder::new("com/example/Unused", Some("java/lang/Object")).build());
        link(&mut pool).unwrap();

        let mut marker = ShortestUsageMarker::new();
        ShrinkPass::default()
            .mark(&pool, &mut marker, &[KeepRoot::Class(main)])
            .unwrap();
        let printer = ShortestUsagePrinter::new(&pool, &marker);

        assert_eq!(
            printer.explain_class(main).unwrap(),
            "com.example.Main is kept because:\n  is kept by a directive in the configuration\n"
        );
        assert_eq!(
            printer.explain_class(unused).unwrap(),
            "com.example.Unused is not being kept.\n"
        );
    }

    #[test]
    fn test_explain_member_chain() {
        let mut pool = object_pool();
        let mut main = ClassBuilder::new("com/example/Main", Some("java/lang/Object"));
        let clinit = main.method(MemberAccessFlags::STATIC, "<clinit>", "()V", Vec::new());
        let main_id = pool.add_program(main.build());
        link(&mut pool).unwrap();

        let mut marker = ShortestUsageMarker::new();
        ShrinkPass::default()
            .mark(&pool, &mut marker, &[KeepRoot::Class(main_id)])
            .unwrap();
        let text = ShortestUsagePrinter::new(&pool, &marker)
            .explain_member(MemberRef::new(main_id, clinit))
            .unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "com.example.Main: <clinit>()V is kept because:");
        assert_eq!(lines[1], "  is a static initializer of com.example.Main");
        assert_eq!(lines[2], "  is kept by a directive in the configuration");
    }

    #[test]
    fn test_usage_printer_lists_unused() {
        let mut pool = object_pool();
        let mut main = ClassBuilder::new("com/example/Main", Some("java/lang/Object"));
        main.method(MemberAccessFlags::PUBLIC, "unused", "()V", Vec::new());
        let main_id = pool.add_program(main.build());
        pool.add_program(ClassBuilder::new("com/example/Gone", Some("java/lang/Object")).build());
        link(&mut pool).unwrap();

        let mut marker = SimpleUsageMarker::new();
        ShrinkPass::default()
            .mark(&pool, &mut marker, &[KeepRoot::Class(main_id)])
            .unwrap();
        let text = UsagePrinter::new(&pool, &marker).print().unwrap();
        assert_eq!(text, "com.example.Main:\n    unused()V\ncom.example.Gone\n");
    }
}
