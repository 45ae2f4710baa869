//! Test fixtures and replica set helpers.
//!
//! Provides convenience functions for building replica sets in temporary
//! directories and for common test scenarios.

use replifile_core::{Config, OpenFlags, ReplicaSet};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A replica set in a temporary directory, removed on drop.
pub struct TestReplicaSet {
    /// The replica set.
    pub set: ReplicaSet,
    /// Path of the primary file.
    pub primary: PathBuf,
    /// Paths of the replica files, in addition order.
    pub replicas: Vec<PathBuf>,
    /// The temporary directory (kept alive to prevent cleanup).
    temp_dir: TempDir,
}

impl TestReplicaSet {
    /// Creates a primary plus `count` replicas, all truncated.
    ///
    /// # Panics
    ///
    /// Panics if the directory or any member cannot be created.
    pub fn with_replicas(count: usize) -> Self {
        Self::with_config(count, Config::default())
    }

    /// Like [`TestReplicaSet::with_replicas`] with a specific configuration.
    ///
    /// Replicas beyond the configured limit are not attached, but their
    /// paths are still listed.
    pub fn with_config(count: usize, config: Config) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let primary = temp_dir.path().join("primary.bin");
        let replicas: Vec<PathBuf> = (0..count)
            .map(|i| temp_dir.path().join(format!("replica{i}.bin")))
            .collect();

        let mut set = ReplicaSet::with_config(config);
        set.create(&primary, OpenFlags::TRUNCATE)
            .expect("Failed to create primary");
        for path in replicas.iter().take(set.capacity()) {
            set.add(path).expect("Failed to add replica");
        }

        Self {
            set,
            primary,
            replicas,
            temp_dir,
        }
    }

    /// Directory holding every member file.
    pub fn dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Builds a path inside the fixture directory.
    pub fn path(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Closes the set and reopens the same files without creating them.
    pub fn reopen(&mut self) {
        self.set.close();
        self.set
            .open(&self.primary, OpenFlags::empty())
            .expect("Failed to reopen primary");
        for path in self.replicas.iter().take(self.set.capacity()) {
            self.set.add(path).expect("Failed to reopen replica");
        }
    }
}

impl std::ops::Deref for TestReplicaSet {
    type Target = ReplicaSet;

    fn deref(&self) -> &Self::Target {
        &self.set
    }
}

impl std::ops::DerefMut for TestReplicaSet {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.set
    }
}

/// Runs a test against a fresh replica set with `count` replicas.
///
/// # Example
///
/// ```rust,ignore
/// use replifile_testkit::with_replica_set;
///
/// #[test]
/// fn my_test() {
///     with_replica_set(2, |set, _primary, _replicas| {
///         set.write(b"data").unwrap();
///     });
/// }
/// ```
pub fn with_replica_set<F, R>(count: usize, f: F) -> R
where
    F: FnOnce(&mut ReplicaSet, &Path, &[PathBuf]) -> R,
{
    let mut fixture = TestReplicaSet::with_replicas(count);
    let TestReplicaSet {
        set,
        primary,
        replicas,
        ..
    } = &mut fixture;
    f(set, primary, replicas)
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;

    /// A replica set holding `payload` on every member, committed, with
    /// the position rewound to the start.
    pub fn written(count: usize, payload: &[u8]) -> TestReplicaSet {
        let mut fixture = TestReplicaSet::with_replicas(count);
        fixture.write(payload).expect("Failed to write payload");
        fixture.commit().expect("Failed to commit payload");
        fixture
            .seek(std::io::SeekFrom::Start(0))
            .expect("Failed to rewind");
        fixture
    }
}
