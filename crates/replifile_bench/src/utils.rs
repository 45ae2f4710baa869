//! Benchmark utilities.

use rand::Rng;
use replifile_core::{OpenFlags, ReplicaSet};
use std::path::Path;

/// Generate random data of the specified size.
pub fn random_data(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// Create a truncated primary plus `replicas` replicas inside `dir`.
///
/// # Panics
///
/// Panics if any member cannot be created.
pub fn replica_set(dir: &Path, replicas: usize) -> ReplicaSet {
    let mut set = ReplicaSet::new();
    set.create(dir.join("primary.bin"), OpenFlags::TRUNCATE)
        .expect("create primary");
    for i in 0..replicas {
        set.add(dir.join(format!("replica{i}.bin")))
            .expect("add replica");
    }
    set
}
