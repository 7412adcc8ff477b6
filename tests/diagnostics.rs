//! Explanations produced by the diagnostic marker.

use classhrink::prelude::*;

fn linked_pool() -> (ClassPool, ClassId, NodeId) {
    let mut pool = ClassPool::new();
    pool.add_library(LibraryClassBuilder::new("java/lang/Object").build());

    let mut base = ClassBuilder::new("com/example/Base", Some("java/lang/Object"));
    base.method(MemberAccessFlags::STATIC, "<clinit>", "()V", Vec::new());
    pool.add_program(base.build());

    let mut main = ClassBuilder::new("com/example/Main", Some("com/example/Base"));
    let entry = main.method(
        MemberAccessFlags::PUBLIC | MemberAccessFlags::STATIC,
        "main",
        "([Ljava/lang/String;)V",
        Vec::new(),
    );
    let main = pool.add_program(main.build());
    pool.add_program(ClassBuilder::new("com/example/Orphan", Some("java/lang/Object")).build());
    link(&mut pool).unwrap();
    (pool, main, entry)
}

#[test]
fn test_explain_superclass_chain() {
    let (pool, main, entry) = linked_pool();
    let mut marker = ShortestUsageMarker::new();
    ShrinkPass::default()
        .mark(&pool, &mut marker, &[KeepRoot::Member(MemberRef::new(main, entry))])
        .unwrap();

    let printer = ShortestUsagePrinter::new(&pool, &marker);
    let base = pool.find("com/example/Base").unwrap();
    let text = printer.explain_class(base).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "com.example.Base is kept because:");
    assert_eq!(lines[1], "  is extended by com.example.Main");
    assert_eq!(lines.last(), Some(&"  is kept by a directive in the configuration"));

    let object = pool.find("java/lang/Object").unwrap();
    let text = printer.explain_class(object).unwrap();
    assert!(text.contains("is extended by com.example.Base"));
}

#[test]
fn test_explain_static_initializer() {
    let (pool, main, entry) = linked_pool();
    let mut marker = ShortestUsageMarker::new();
    ShrinkPass::default()
        .mark(&pool, &mut marker, &[KeepRoot::Member(MemberRef::new(main, entry))])
        .unwrap();

    let base = pool.find("com/example/Base").unwrap();
    let clinit = pool
        .class(base)
        .unwrap()
        .find_member(MemberKind::Method, "<clinit>", "()V")
        .unwrap()
        .id;
    let text = ShortestUsagePrinter::new(&pool, &marker)
        .explain_member(MemberRef::new(base, clinit))
        .unwrap();
    assert!(text.starts_with("com.example.Base: <clinit>()V is kept because:\n"));
    assert!(text.contains("  is a static initializer of com.example.Base\n"));
}

#[test]
fn test_explain_unused_and_listing() {
    let (pool, main, entry) = linked_pool();
    let mut marker = ShortestUsageMarker::new();
    ShrinkPass::default()
        .mark(&pool, &mut marker, &[KeepRoot::Member(MemberRef::new(main, entry))])
        .unwrap();

    let orphan = pool.find("com/example/Orphan").unwrap();
    assert_eq!(
        ShortestUsagePrinter::new(&pool, &marker)
            .explain_class(orphan)
            .unwrap(),
        "com.example.Orphan is not being kept.\n"
    );
    assert_eq!(
        UsagePrinter::new(&pool, &marker).print().unwrap(),
        "com.example.Orphan\n"
    );
}
