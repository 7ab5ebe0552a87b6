//! Criterion benchmarks for the search index
//!
//! These benchmarks measure:
//! - Text normalization (stemming and phonetic folding)
//! - Query planning
//! - Indexing and querying against the in-memory store

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use tokio::runtime::Runtime;
use zset_search::search::{
    metaphone, Document, KeyScheme, MatchMode, Normalizer, QueryPlanner, Search, SearchQuery,
};
use zset_search::state::InMemoryStore;

const WORDS: &[&str] = &[
    "ruby", "emerald", "orange", "cucumber", "apple", "pear", "dog", "cat", "knight",
    "thumb", "phone", "running", "database", "connection", "timeout", "memory",
];

fn sentence(seed: usize, len: usize) -> String {
    (0..len)
        .map(|i| WORDS[(seed * 7 + i * 3) % WORDS.len()])
        .collect::<Vec<_>>()
        .join(" ")
}

fn bench_metaphone(c: &mut Criterion) {
    c.bench_function("metaphone", |b| {
        b.iter(|| {
            for word in WORDS {
                black_box(metaphone(black_box(word)));
            }
        });
    });
}

fn bench_normalizer(c: &mut Criterion) {
    let normalizer = Normalizer::new();
    let mut group = c.benchmark_group("normalizer_index_terms");

    for len in [8, 64, 512] {
        let text = sentence(1, len);
        group.throughput(Throughput::Elements(len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &text, |b, text| {
            b.iter(|| black_box(normalizer.index_terms(black_box(text))));
        });
    }

    group.finish();
}

fn bench_query_planner(c: &mut Criterion) {
    let keys = KeyScheme::new("bench");
    let normalizer = Normalizer::new();
    let planner = QueryPlanner::new(&keys, &normalizer);

    let query = SearchQuery::new()
        .with_any_of("cid", [2, 4, 6, 8])
        .with_text("content", "orange apple pear")
        .with_value("uid", 5)
        .with_match_mode(MatchMode::Any);

    c.bench_function("query_plan", |b| {
        b.iter(|| black_box(planner.plan(black_box(&query), 0, 19)));
    });
}

fn bench_index(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let store = Arc::new(InMemoryStore::new());
    let search = Search::create("bench", store).unwrap();

    let mut id = 0usize;
    c.bench_function("index_document", |b| {
        b.to_async(&rt).iter(|| {
            id += 1;
            let doc = Document::new()
                .field("content", sentence(id, 12))
                .field("uid", (id % 10) as i64 + 1)
                .field("cid", vec![(id % 5) as i64 + 1, (id % 3) as i64 + 1]);
            let search = search.clone();
            async move {
                search.index(&doc, id).await.unwrap();
            }
        });
    });
}

fn bench_query(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let store = Arc::new(InMemoryStore::new());
    let search = Search::create("bench", store).unwrap();

    rt.block_on(async {
        for id in 1..=1000usize {
            let doc = Document::new()
                .field("content", sentence(id, 12))
                .field("uid", (id % 10) as i64 + 1)
                .field("cid", (id % 5) as i64 + 1);
            search.index(&doc, id).await.unwrap();
        }
    });

    let queries = [
        ("single_value", SearchQuery::new().with_value("uid", 3)),
        ("any_of", SearchQuery::new().with_any_of("cid", [1, 2, 3])),
        (
            "text_and_values",
            SearchQuery::new()
                .with_text("content", "orange apple")
                .with_value("uid", 3)
                .with_any_of("cid", [1, 4]),
        ),
    ];

    let mut group = c.benchmark_group("query");
    for (name, query) in queries.iter() {
        group.bench_with_input(BenchmarkId::from_parameter(name), query, |b, query| {
            b.to_async(&rt)
                .iter(|| async { black_box(search.query(query, 0, 19).await.unwrap()) });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_metaphone,
    bench_normalizer,
    bench_query_planner,
    bench_index,
    bench_query
);
criterion_main!(benches);
