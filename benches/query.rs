use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use kdtorus::{BuildConfig, KdTree, KnnScratch};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const N_POINTS: usize = 100_000;
const N_QUERIES: usize = 10_000;

fn random_points(seed: u64, count: usize, dim: usize) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count * dim).map(|_| rng.r#gen::<f64>()).collect()
}

fn benchmark_query(c: &mut Criterion) {
    let points = random_points(1, N_POINTS, 3);
    let queries = random_points(2, N_QUERIES, 3);
    let config = BuildConfig::new(32, 2);
    let open = KdTree::build(&points, 3, &config, None).unwrap();
    let periodic = KdTree::build(&points, 3, &config, Some(&[1.0, 1.0, 1.0][..])).unwrap();

    let mut group = c.benchmark_group(format!("query_{}k", N_POINTS / 1000));
    group.sample_size(20);

    for k in [1, 8, 32] {
        group.bench_with_input(BenchmarkId::new("sequential", k), &k, |b, &k| {
            let mut scratch = KnnScratch::new();
            b.iter(|| {
                for q in queries.chunks_exact(3) {
                    black_box(open.query_with(q, k, &mut scratch).unwrap());
                }
            })
        });

        group.bench_with_input(BenchmarkId::new("batch", k), &k, |b, &k| {
            b.iter(|| black_box(open.query_batch(&queries, k).unwrap()))
        });

        group.bench_with_input(BenchmarkId::new("batch_periodic", k), &k, |b, &k| {
            b.iter(|| black_box(periodic.query_batch(&queries, k).unwrap()))
        });

        group.bench_with_input(BenchmarkId::new("batch_decomposed", k), &k, |b, &k| {
            b.iter(|| black_box(periodic.query_batch_decomposed(&queries, k, 2).unwrap()))
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_query);
criterion_main!(benches);
