//! A replica set behind one lock.

use crate::replica::ReplicaSet;
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;

/// A cloneable, thread-safe reference to one [`ReplicaSet`].
///
/// Every operation on the set runs under a single per-instance mutex, so
/// writes, seeks and verified reads from different threads never
/// interleave inside one call. Sequences of calls that must stay together
/// (seek then read) should hold one guard from [`SharedReplicaSet::lock`].
#[derive(Debug, Clone, Default)]
pub struct SharedReplicaSet {
    inner: Arc<Mutex<ReplicaSet>>,
}

impl SharedReplicaSet {
    /// Wraps `set`.
    #[must_use]
    pub fn new(set: ReplicaSet) -> Self {
        Self {
            inner: Arc::new(Mutex::new(set)),
        }
    }

    /// Locks the set for exclusive use.
    pub fn lock(&self) -> MutexGuard<'_, ReplicaSet> {
        self.inner.lock()
    }

    /// Runs `f` with the set locked.
    pub fn with<R>(&self, f: impl FnOnce(&mut ReplicaSet) -> R) -> R {
        let mut guard = self.inner.lock();
        f(&mut guard)
    }
}

impl From<ReplicaSet> for SharedReplicaSet {
    fn from(set: ReplicaSet) -> Self {
        Self::new(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use replifile_storage::OpenFlags;
    use std::io::SeekFrom;
    use std::thread;
    use tempfile::tempdir;

    #[test]
    fn writers_on_many_threads_stay_mirrored() {
        let dir = tempdir().unwrap();
        let mut set = ReplicaSet::new();
        set.create(dir.path().join("primary.bin"), OpenFlags::TRUNCATE)
            .unwrap();
        set.add(dir.path().join("replica0.bin")).unwrap();
        set.add(dir.path().join("replica1.bin")).unwrap();
        let shared = SharedReplicaSet::from(set);

        let handles: Vec<_> = (0..4u8)
            .map(|t| {
                let shared = shared.clone();
                thread::spawn(move || {
                    for _ in 0..16 {
                        shared.with(|set| set.write(&[t; 32])).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let mut set = shared.lock();
        assert_eq!(set.length().unwrap(), 4 * 16 * 32);
        set.seek(SeekFrom::Start(0)).unwrap();
        let mut buf = vec![0u8; 4 * 16 * 32];
        set.read(&mut buf).unwrap();
        assert!(buf.chunks(32).all(|chunk| chunk.iter().all(|&b| b == chunk[0])));
    }
}
