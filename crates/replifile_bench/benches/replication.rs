//! Replica set benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use replifile_bench::utils::{random_data, replica_set};
use replifile_storage::{Handle, OpenFlags, OpenRequest, ReadWrite};
use std::io::SeekFrom;
use tempfile::TempDir;

const REPLICA_COUNTS: [usize; 4] = [0, 1, 3, 5];

/// Benchmark a bare handle write as the baseline.
fn bench_handle_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("handle_write");

    for size in [256, 4096].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let temp_dir = TempDir::new().unwrap();
            let request = OpenRequest::<ReadWrite>::create(OpenFlags::TRUNCATE);
            let mut handle = Handle::open_path(temp_dir.path().join("bench.bin"), &request).unwrap();
            let data = random_data(size);

            b.iter(|| {
                handle.write(black_box(&data)).unwrap();
            });
        });
    }

    group.finish();
}

/// Benchmark mirrored writes across replica counts.
fn bench_mirrored_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("mirrored_write");

    // Use larger sample size for file operations
    group.sample_size(50);

    let size = 4096;
    group.throughput(Throughput::Bytes(size as u64));
    for replicas in REPLICA_COUNTS.iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(replicas),
            replicas,
            |b, &replicas| {
                let temp_dir = TempDir::new().unwrap();
                let mut set = replica_set(temp_dir.path(), replicas);
                let data = random_data(size);

                b.iter(|| {
                    set.write(black_box(&data)).unwrap();
                });
            },
        );
    }

    group.finish();
}

/// Benchmark verified reads across replica counts.
fn bench_verified_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("verified_read");
    group.sample_size(50);

    let size = 4096;
    group.throughput(Throughput::Bytes(size as u64));
    for replicas in REPLICA_COUNTS.iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(replicas),
            replicas,
            |b, &replicas| {
                let temp_dir = TempDir::new().unwrap();
                let mut set = replica_set(temp_dir.path(), replicas);
                set.write(&random_data(size)).unwrap();
                let mut buf = vec![0u8; size];

                b.iter(|| {
                    set.seek(SeekFrom::Start(0)).unwrap();
                    set.read(black_box(&mut buf)).unwrap();
                });
            },
        );
    }

    group.finish();
}

/// Benchmark mirrored commits, where every member syncs.
fn bench_commit(c: &mut Criterion) {
    let mut group = c.benchmark_group("commit");
    group.sample_size(20);

    for replicas in [0usize, 5].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(replicas),
            replicas,
            |b, &replicas| {
                let temp_dir = TempDir::new().unwrap();
                let mut set = replica_set(temp_dir.path(), replicas);
                let data = random_data(256);

                b.iter(|| {
                    set.write(&data).unwrap();
                    set.commit().unwrap();
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_handle_write,
    bench_mirrored_write,
    bench_verified_read,
    bench_commit,
);

criterion_main!(benches);
