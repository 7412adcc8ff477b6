//! Benchmarks for marking and compaction.
//!
//! Builds a synthetic program of chained classes where every class calls into the next
//! one and carries a dead method, then measures:
//! - Marking to closure with the plain and the diagnostic marker
//! - A full mark and sweep run

extern crate classhrink;

use classhrink::prelude::*;
use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use std::hint::black_box;

const CLASSES: usize = 500;

/// Builds `count` classes, `Node0` to `NodeN`, each calling `NodeN+1.step()` from its own
/// `step()`. Returns the pool and the entry point.
fn chained_pool(count: usize) -> (ClassPool, MemberRef) {
    let mut pool = ClassPool::new();
    pool.add_library(LibraryClassBuilder::new("java/lang/Object").build());

    let mut entry = None;
    for index in 0..count {
        let mut class = ClassBuilder::new(&format!("bench/Node{index}"), Some("java/lang/Object"));
        let mut code = Vec::new();
        if index + 1 < count {
            let call = class.method_ref(&format!("bench/Node{}", index + 1), "step", "()V");
            let [high, low] = call.to_be_bytes();
            code.extend([0xb8, high, low]);
        }
        code.push(0xb1);
        let code = class.code(1, 0, code, Vec::new());
        let step = class.method(
            MemberAccessFlags::PUBLIC | MemberAccessFlags::STATIC,
            "step",
            "()V",
            vec![code],
        );
        class.method(MemberAccessFlags::PRIVATE, "dead", "()V", Vec::new());
        class.string("unused constant");

        let id = pool.add_program(class.build());
        if index == 0 {
            entry = Some(MemberRef::new(id, step));
        }
    }
    // the dead half of the program
    for index in 0..count / 2 {
        pool.add_program(ClassBuilder::new(&format!("bench/Dead{index}"), Some("java/lang/Object")).build());
    }

    link(&mut pool).unwrap();
    (pool, entry.unwrap())
}

/// Benchmark marking with the plain marker.
fn bench_mark_simple(c: &mut Criterion) {
    let (pool, entry) = chained_pool(CLASSES);
    let pass = ShrinkPass::default();

    c.bench_function("mark_simple", |b| {
        b.iter(|| {
            let mut marker = SimpleUsageMarker::new();
            let stats = pass
                .mark(black_box(&pool), &mut marker, &[KeepRoot::Member(entry)])
                .unwrap();
            black_box(stats)
        });
    });
}

/// Benchmark marking with the diagnostic marker, which records a chain per node.
fn bench_mark_shortest(c: &mut Criterion) {
    let (pool, entry) = chained_pool(CLASSES);
    let pass = ShrinkPass::default();

    c.bench_function("mark_shortest", |b| {
        b.iter(|| {
            let mut marker = ShortestUsageMarker::new();
            let stats = pass
                .mark(black_box(&pool), &mut marker, &[KeepRoot::Member(entry)])
                .unwrap();
            black_box(stats)
        });
    });
}

/// Benchmark a full mark and sweep run. Pool construction is excluded.
fn bench_run(c: &mut Criterion) {
    let pass = ShrinkPass::default();

    c.bench_function("mark_and_sweep", |b| {
        b.iter_batched(
            || chained_pool(CLASSES),
            |(mut pool, entry)| {
                let mut marker = SimpleUsageMarker::new();
                let report = pass
                    .run(&mut pool, &mut marker, &[KeepRoot::Member(entry)])
                    .unwrap();
                black_box(report)
            },
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(benches, bench_mark_simple, bench_mark_shortest, bench_run);
criterion_main!(benches);
