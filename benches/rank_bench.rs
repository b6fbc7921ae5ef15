use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

use chrono::{Duration, TimeZone, Utc};
use wardrobe_match::{
    AttributePredicate, CandidateRanker, CatalogEntry, EntryAttributes, EntryKind, PageRequest,
    cosine_similarity, paginate,
};

const DIM: usize = 384;

fn random_vector(dim: usize) -> Vec<f32> {
    (0..dim).map(|_| fastrand::f32() * 2.0 - 1.0).collect()
}

fn catalog(size: usize) -> Vec<CatalogEntry> {
    let colors = ["navy", "black", "white", "red", "olive"];
    let base = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
    (0..size)
        .map(|i| {
            CatalogEntry::new(
                format!("item-{i}"),
                "bench-owner",
                EntryKind::Item,
                base + Duration::hours(i as i64),
            )
            .with_attributes(EntryAttributes {
                category: Some("shirt".into()),
                color: Some(colors[i % colors.len()].into()),
                ..Default::default()
            })
            .with_embedding(random_vector(DIM))
        })
        .collect()
}

/// Benchmark raw cosine similarity at common embedding sizes
fn bench_cosine(c: &mut Criterion) {
    let mut group = c.benchmark_group("cosine_similarity");
    for dim in [128, 384, 768, 1536] {
        let a = random_vector(dim);
        let b = random_vector(dim);
        group.throughput(Throughput::Elements(dim as u64));
        group.bench_with_input(BenchmarkId::from_parameter(dim), &dim, |bench, _| {
            bench.iter(|| cosine_similarity(black_box(&a), black_box(&b)));
        });
    }
    group.finish();
}

/// Sequential vs rayon ranking across catalog sizes
fn bench_rank(c: &mut Criterion) {
    let mut group = c.benchmark_group("rank");
    group.sample_size(20);
    let query = random_vector(DIM);

    for size in [500, 2_000, 10_000] {
        let entries = catalog(size);
        group.throughput(Throughput::Elements(size as u64));

        let sequential = CandidateRanker::new(usize::MAX, true);
        group.bench_function(format!("sequential_{size}"), |b| {
            b.iter(|| {
                sequential.rank(black_box(Some(query.as_slice())), black_box(&entries), None)
            });
        });

        let parallel = CandidateRanker::new(1, true);
        group.bench_function(format!("parallel_{size}"), |b| {
            b.iter(|| {
                parallel.rank(black_box(Some(query.as_slice())), black_box(&entries), None)
            });
        });
    }
    group.finish();
}

/// Filter + rank + first page, the shape of a typical attribute query
fn bench_filtered_page(c: &mut Criterion) {
    let mut group = c.benchmark_group("filtered_page");
    let entries = catalog(5_000);
    let query = random_vector(DIM);
    let predicate = AttributePredicate::default().color("Navy");
    let ranker = CandidateRanker::default();

    group.bench_function("navy_first_page", |b| {
        b.iter(|| {
            let ranked = ranker
                .rank(Some(query.as_slice()), black_box(&entries), Some(&predicate))
                .expect("rank");
            paginate(ranked, PageRequest::first(20)).expect("page")
        });
    });
    group.finish();
}

criterion_group!(benches, bench_cosine, bench_rank, bench_filtered_page);
criterion_main!(benches);
