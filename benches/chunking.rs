use criterion::{Criterion, criterion_group, criterion_main};
use rag_chat::embeddings::chunking::{ChunkingConfig, chunk_text};
use std::hint::black_box;

pub fn criterion_benchmark(c: &mut Criterion) {
    let words = [
        "retrieval", "augmented", "generation", "combines", "search", "with", "language",
        "models",
    ];
    let document = words
        .iter()
        .cycle()
        .take(50_000)
        .copied()
        .collect::<Vec<_>>()
        .join(" ");
    let config = ChunkingConfig::default();

    c.bench_function("chunking", |b| {
        b.iter(|| {
            chunk_text(
                black_box(&document),
                black_box(config.window),
                black_box(config.overlap),
            )
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
