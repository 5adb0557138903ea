use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rasterkit::raster::CurveIndexer;

fn random_edges(n: usize, seed: u64) -> Vec<((f32, f32), (f32, f32))> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let x0 = rng.gen_range(0.0..1024.0);
            let y0 = rng.gen_range(0.0..1024.0);
            let x1 = rng.gen_range(0.0..1024.0);
            let y1 = rng.gen_range(0.0..1024.0);
            ((x0, y0), (x1, y1))
        })
        .collect()
}

fn bench_accumulate(c: &mut Criterion) {
    let edges = random_edges(10_000, 42);

    c.bench_function("curve_indexer_accumulate_10k_edges", |b| {
        b.iter(|| {
            let mut indexer = CurveIndexer::new();
            for &(p0, p1) in &edges {
                indexer.add_edge(0, black_box(p0), black_box(p1));
            }
            black_box(&indexer);
        });
    });
}

fn bench_finalize_rows(c: &mut Criterion) {
    let edges = random_edges(10_000, 7);
    let mut indexer = CurveIndexer::new();
    for &(p0, p1) in &edges {
        indexer.add_edge(0, p0, p1);
    }
    let rows = indexer.rows();

    c.bench_function("curve_indexer_finalize_64_rows", |b| {
        b.iter(|| {
            for &row in &rows {
                black_box(indexer.finalize_row(row, 0));
            }
        });
    });
}

criterion_group!(benches, bench_accumulate, bench_finalize_rows);
criterion_main!(benches);
