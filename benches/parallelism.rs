use criterion::{black_box, criterion_group, BenchmarkId, Criterion};
use kdtorus::{BuildConfig, KdTree};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

#[derive(Deserialize)]
struct Estimates {
    mean: Stats,
}

#[derive(Deserialize)]
struct Stats {
    point_estimate: f64,
}

const N_POINTS: usize = 1_000_000;
const N_QUERIES: usize = 100_000;

fn cores_list() -> Vec<usize> {
    let max_cores = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(8);
    let mut cores_list = Vec::new();
    let mut cores = 1;
    while cores <= max_cores {
        cores_list.push(cores);
        cores *= 2;
    }
    if cores_list.last().is_some_and(|&last| last < max_cores) {
        cores_list.push(max_cores);
    }
    cores_list
}

fn random_points(seed: u64, count: usize) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count * 3).map(|_| rng.r#gen::<f64>()).collect()
}

fn benchmark_parallelism(c: &mut Criterion) {
    let points = random_points(1, N_POINTS);
    let queries = random_points(2, N_QUERIES);

    let mut group = c.benchmark_group(format!("parallelism_{}k", N_POINTS / 1000));
    group.sample_size(10);

    for &num_threads in &cores_list() {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()
            .unwrap();
        // Enough forking levels to keep every worker busy.
        let par_split_level = num_threads.next_power_of_two().trailing_zeros() as usize + 2;
        let config = BuildConfig::new(32, par_split_level);

        group.bench_with_input(BenchmarkId::new("build", num_threads), &num_threads, |b, _| {
            b.iter(|| pool.install(|| KdTree::build(black_box(&points), 3, &config, None).unwrap()))
        });

        let tree = KdTree::build(&points, 3, &config, Some(&[1.0, 1.0, 1.0][..])).unwrap();
        group.bench_with_input(BenchmarkId::new("query", num_threads), &num_threads, |b, _| {
            b.iter(|| pool.install(|| black_box(tree.query_batch(&queries, 16).unwrap())))
        });
    }
    group.finish();
}

/// Prints the speedup of every measured thread count over the single-threaded run.
fn report_speedup() -> Result<(), Box<dyn std::error::Error>> {
    let root_dir = format!("target/criterion/parallelism_{}k", N_POINTS / 1000);
    let root = Path::new(&root_dir);
    if !root.exists() {
        return Ok(());
    }

    for method in ["build", "query"] {
        let mut baseline = None;
        for num_threads in cores_list() {
            let path = root.join(method).join(num_threads.to_string()).join("base/estimates.json");
            if !path.exists() {
                continue;
            }
            let estimates: Estimates = serde_json::from_reader(BufReader::new(File::open(&path)?))?;
            let millis = estimates.mean.point_estimate / 1_000_000.0;
            let base = *baseline.get_or_insert(millis);
            println!("{:6} {:3} threads: {:10.2} ms  speedup {:5.2}", method, num_threads, millis, base / millis);
        }
    }
    Ok(())
}

criterion_group!(benches, benchmark_parallelism);

fn main() {
    benches();
    if let Err(e) = report_speedup() {
        eprintln!("Error reading results: {}", e);
    }
}
