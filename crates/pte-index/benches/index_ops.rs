//! Criterion benchmarks for `BlockPathIndex`.
//!
//! Run with:
//!
//! ```sh
//! cargo bench -p pte-index
//! ```

use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use pte_core::{BlockKey, BlockPath, Document, KeyPath, Node, Operation};
use pte_index::BlockPathIndex;

fn wide(n: usize) -> Document {
    Document::new(
        (0..n)
            .map(|i| Node::paragraph(format!("b{i}").as_str(), format!("s{i}").as_str(), "text"))
            .collect(),
    )
}

fn bench_rebuild(c: &mut Criterion) {
    let mut group = c.benchmark_group("rebuild");
    for n in [1_000usize, 10_000] {
        let doc = wide(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &doc, |b, doc| {
            b.iter(|| BlockPathIndex::from_document(black_box(doc)));
        });
    }
    group.finish();
}

fn bench_incremental(c: &mut Criterion) {
    let index = BlockPathIndex::from_document(&wide(10_000));

    c.bench_function("insert_front_10k", |b| {
        b.iter_batched(
            || index.clone(),
            |mut idx| idx.on_insert(&BlockPath::from([0]), BlockKey::new("front")),
            BatchSize::LargeInput,
        );
    });

    c.bench_function("insert_back_10k", |b| {
        b.iter_batched(
            || index.clone(),
            |mut idx| idx.on_insert(&BlockPath::from([10_000]), BlockKey::new("back")),
            BatchSize::LargeInput,
        );
    });

    c.bench_function("move_adjacent_10k", |b| {
        b.iter_batched(
            || index.clone(),
            |mut idx| idx.on_move(&BlockPath::from([5_000]), &BlockPath::from([5_001])),
            BatchSize::LargeInput,
        );
    });
}

fn bench_text_noop(c: &mut Criterion) {
    let mut index = BlockPathIndex::from_document(&wide(10_000));
    let op = Operation::InsertText {
        path:   KeyPath::from_iter(["b0", "s0"]),
        offset: 0,
        text:   "x".into(),
    };
    c.bench_function("apply_text_op", |b| {
        b.iter(|| index.apply_operation(black_box(&op)));
    });
}

criterion_group!(benches, bench_rebuild, bench_incremental, bench_text_noop);
criterion_main!(benches);
