//! The replica set engine.

use crate::config::{Config, REPLICA_CAPACITY};
use crate::error::{CoreError, CoreResult, Member, MemberFailure, MirrorOp, Observation, Query};
use replifile_storage::{
    check_frame_len, check_frame_trailer, decode_le_slice, encode_frame, encode_le_slice, EofState,
    ErrorFlags, Handle, LeScalar, OpenFlags, OpenRequest, ReadWrite, StorageError, StorageResult,
};
use std::fmt;
use std::io::SeekFrom;
use std::path::Path;
use tracing::{debug, warn};

type MemberHandle = Handle<ReadWrite>;

/// A primary file plus up to [`REPLICA_CAPACITY`] mirrored replicas.
///
/// # Invariants
///
/// - Replicas are opened with exactly the filtered request used for the
///   primary.
/// - Writes reach the primary before any replica, then replicas in
///   addition order. No call stops at the first failing member.
/// - A read succeeds only if every member read succeeds, no member is
///   already failed, and every replica returned the primary's bytes.
/// - Position and length are reported only when unanimous.
///
/// # Concurrency
///
/// Every mutating method takes `&mut self`; the set performs no locking of
/// its own. Use [`crate::SharedReplicaSet`] to share one set between
/// threads.
pub struct ReplicaSet {
    primary: MemberHandle,
    replicas: Vec<MemberHandle>,
    request: Option<OpenRequest<ReadWrite>>,
    config: Config,
    scratch: Vec<u8>,
}

impl Default for ReplicaSet {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ReplicaSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplicaSet")
            .field("primary", &self.primary_path())
            .field("replicas", &self.replica_paths().collect::<Vec<_>>())
            .field("request", &self.request.map(|r| r.flags()))
            .field("flags", &self.error_flags())
            .finish()
    }
}

impl ReplicaSet {
    /// Creates an empty, closed set with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates an empty, closed set.
    #[must_use]
    pub fn with_config(config: Config) -> Self {
        Self {
            primary: Handle::new(),
            replicas: Vec::with_capacity(REPLICA_CAPACITY),
            request: None,
            config,
            scratch: Vec::new(),
        }
    }

    /// The configuration in force.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Maximum number of replicas this set accepts.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.config.max_replicas.min(REPLICA_CAPACITY)
    }

    /// Opens an existing primary for reading and writing.
    ///
    /// # Errors
    ///
    /// See [`ReplicaSet::open_request`].
    pub fn open(&mut self, path: impl AsRef<Path>, flags: OpenFlags) -> CoreResult<()> {
        self.open_request(path, OpenRequest::open(flags))
    }

    /// Opens the primary, creating it if missing.
    ///
    /// # Errors
    ///
    /// See [`ReplicaSet::open_request`].
    pub fn create(&mut self, path: impl AsRef<Path>, flags: OpenFlags) -> CoreResult<()> {
        self.open_request(path, OpenRequest::create(flags))
    }

    /// Creates the primary, failing if it exists.
    ///
    /// Replicas added afterwards must not exist either.
    ///
    /// # Errors
    ///
    /// See [`ReplicaSet::open_request`].
    pub fn exclusive(&mut self, path: impl AsRef<Path>, flags: OpenFlags) -> CoreResult<()> {
        self.open_request(path, OpenRequest::exclusive(flags))
    }

    /// Opens the primary with an already filtered request.
    ///
    /// Any attached replicas are released and the request is kept for
    /// [`ReplicaSet::add`]. Opening an open set flags `REOPEN` on the
    /// primary, closes every member and fails.
    ///
    /// # Errors
    ///
    /// Returns the primary's open error.
    pub fn open_request(
        &mut self,
        path: impl AsRef<Path>,
        request: OpenRequest<ReadWrite>,
    ) -> CoreResult<()> {
        let path = path.as_ref();
        if self.primary.is_open() {
            warn!(path = %path.display(), "replica set reopened while open; closing it");
            let result = self.primary.open(path, &request);
            self.release_replicas();
            self.request = None;
            return result.map_err(CoreError::from);
        }

        self.release_replicas();
        self.request = Some(request);
        self.primary.open(path, &request)?;
        debug!(path = %path.display(), flags = ?request.flags(), "opened primary");
        Ok(())
    }

    /// Attaches one more replica, opened with the primary's request.
    ///
    /// On failure nothing changes.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotOpen`] if the primary is not open,
    /// [`CoreError::CapacityExceeded`] if the set is full, or the replica's
    /// open error.
    pub fn add(&mut self, path: impl AsRef<Path>) -> CoreResult<()> {
        let request = match self.request {
            Some(request) if self.primary.is_open() => request,
            _ => return Err(CoreError::NotOpen),
        };
        let capacity = self.capacity();
        if self.replicas.len() >= capacity {
            return Err(CoreError::CapacityExceeded { capacity });
        }

        let path = path.as_ref();
        let replica = Handle::open_path(path, &request)?;
        self.replicas.push(replica);
        debug!(
            path = %path.display(),
            replicas = self.replicas.len(),
            "attached replica"
        );
        Ok(())
    }

    /// Closes the primary, then every replica in addition order.
    ///
    /// Each member commits first if it is still good. The replicas are
    /// released afterwards, so the set is empty again.
    pub fn close(&mut self) {
        if self.primary.is_open() {
            debug!(replicas = self.replicas.len(), "closing replica set");
        }
        self.primary.close();
        self.release_replicas();
        self.request = None;
    }

    /// Number of attached replicas.
    #[must_use]
    pub fn replica_count(&self) -> usize {
        self.replicas.len()
    }

    /// Path of the primary.
    #[must_use]
    pub fn primary_path(&self) -> Option<&Path> {
        self.primary.path()
    }

    /// Paths of the replicas, in addition order.
    pub fn replica_paths(&self) -> impl Iterator<Item = &Path> + '_ {
        self.replicas.iter().filter_map(Handle::path)
    }

    /// Writes `buf` to the primary, then to every replica.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Mirror`] listing every member that failed. The
    /// members that succeeded hold the bytes.
    pub fn write(&mut self, buf: &[u8]) -> CoreResult<()> {
        self.mirror(MirrorOp::Write, |member| member.write(buf))
    }

    /// Resizes every member to `new_len` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Mirror`] listing every member that failed.
    pub fn set_len(&mut self, new_len: u64) -> CoreResult<()> {
        self.mirror(MirrorOp::Resize, |member| member.set_len(new_len))
    }

    /// Commits every member to durable storage.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Mirror`] unless every member committed.
    pub fn commit(&mut self) -> CoreResult<()> {
        self.mirror(MirrorOp::Commit, Handle::commit)
    }

    /// Fills `buf` from the primary and verifies it against every replica.
    ///
    /// Every replica is read and compared even after a mismatch. A replica
    /// whose bytes differ is flagged `CORRUPT`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ReadVerification`] if any member failed, was
    /// already failed, or differs from the primary. `buf` holds the
    /// primary's bytes regardless.
    pub fn read(&mut self, buf: &mut [u8]) -> CoreResult<()> {
        let mut failures = Vec::new();
        let mut mismatched = Vec::new();

        let primary_read = self.primary.read(buf);
        let primary_ok = primary_read.is_ok();
        if let Err(error) = primary_read {
            failures.push(MemberFailure::new(Member::Primary, error));
        } else if self.primary.fail() {
            let flags = self.primary.error_flags();
            failures.push(MemberFailure::new(Member::Primary, StorageError::NotGood(flags)));
        }

        self.scratch.clear();
        self.scratch.resize(buf.len(), 0);
        for (index, replica) in self.replicas.iter_mut().enumerate() {
            let member = Member::Replica(index);
            if let Err(error) = replica.read(&mut self.scratch) {
                failures.push(MemberFailure::new(member, error));
                continue;
            }
            if replica.fail() {
                let flags = replica.error_flags();
                failures.push(MemberFailure::new(member, StorageError::NotGood(flags)));
            }
            if primary_ok && self.scratch[..] != buf[..] {
                replica.mark_corrupt();
                mismatched.push(index);
            }
        }

        if failures.is_empty() && mismatched.is_empty() {
            return Ok(());
        }
        if !mismatched.is_empty() {
            warn!(
                replicas = ?mismatched,
                len = buf.len(),
                "replica data differs from primary"
            );
        }
        Err(CoreError::ReadVerification {
            failures,
            mismatched,
        })
    }

    /// Length in bytes, if every member agrees.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Inconsistent`] on any disagreement, or the
    /// primary's error if it cannot answer.
    pub fn length(&mut self) -> CoreResult<u64> {
        self.unanimous(Query::Length, Handle::length)
    }

    /// Current position, if every member agrees.
    ///
    /// # Errors
    ///
    /// Same as [`ReplicaSet::length`].
    pub fn tell(&mut self) -> CoreResult<u64> {
        self.unanimous(Query::Position, Handle::tell)
    }

    /// Seeks every member and returns the common resulting offset.
    ///
    /// The seek is applied to every member whatever the outcome; nothing
    /// is rolled back.
    ///
    /// # Errors
    ///
    /// Same as [`ReplicaSet::length`].
    pub fn seek(&mut self, pos: SeekFrom) -> CoreResult<u64> {
        self.unanimous(Query::Seek, |member| member.seek(pos))
    }

    /// Common end-of-file state, or [`EofState::Indeterminate`] if the
    /// members disagree.
    pub fn eof(&mut self) -> EofState {
        let state = self.primary.eof();
        self.replicas.iter_mut().fold(state, |common, replica| {
            if replica.eof() == common {
                common
            } else {
                EofState::Indeterminate
            }
        })
    }

    /// True if the primary and every replica are open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.members().all(Handle::is_open)
    }

    /// True if no member is open.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        !self.members().any(Handle::is_open)
    }

    /// True if the primary and every replica are good.
    #[must_use]
    pub fn good(&self) -> bool {
        self.members().all(Handle::good)
    }

    /// True if any member is bad.
    #[must_use]
    pub fn bad(&self) -> bool {
        self.members().any(Handle::bad)
    }

    /// True if any member has failed.
    #[must_use]
    pub fn fail(&self) -> bool {
        self.members().any(Handle::fail)
    }

    /// Bitwise OR of every member's flags.
    #[must_use]
    pub fn error_flags(&self) -> ErrorFlags {
        ErrorFlags::union_all(self.members().map(Handle::error_flags))
    }

    /// Flags of a single member, if it exists.
    #[must_use]
    pub fn member_flags(&self, member: Member) -> Option<ErrorFlags> {
        match member {
            Member::Primary => Some(self.primary.error_flags()),
            Member::Replica(index) => self.replicas.get(index).map(Handle::error_flags),
        }
    }

    /// Clears operational flags on every member.
    ///
    /// Corruption flags are cleared too; only call this once the divergence
    /// has been investigated.
    pub fn reset(&mut self) {
        for member in self.members_mut() {
            member.reset();
        }
    }

    /// Writes `payload` as one length-prefixed frame.
    ///
    /// # Errors
    ///
    /// Same as [`ReplicaSet::write`].
    pub fn write_frame(&mut self, payload: &[u8]) -> CoreResult<()> {
        let frame = encode_frame(payload)?;
        self.write(&frame)
    }

    /// Reads and verifies one length-prefixed frame.
    ///
    /// # Errors
    ///
    /// Returns verification errors from the underlying reads, or
    /// [`StorageError::Corrupted`] (flagging every member) if the frame's
    /// lengths are inconsistent.
    pub fn read_frame(&mut self) -> CoreResult<Vec<u8>> {
        let len = self.read_u32_le()?;
        let remaining = self.length()?.saturating_sub(self.tell()?);
        check_frame_len(len, remaining).map_err(|e| self.frame_corrupted(e))?;

        let mut payload = vec![0u8; len as usize];
        self.read(&mut payload)?;

        let trailer = self.read_u32_le()?;
        check_frame_trailer(len, trailer).map_err(|e| self.frame_corrupted(e))?;
        Ok(payload)
    }

    /// Writes one little-endian integer to every member.
    ///
    /// # Errors
    ///
    /// Same as [`ReplicaSet::write`].
    pub fn write_le<T: LeScalar>(&mut self, value: T) -> CoreResult<()> {
        self.write(&encode_le_slice(&[value]))
    }

    /// Writes `values` back to back, little-endian, to every member.
    ///
    /// # Errors
    ///
    /// Same as [`ReplicaSet::write`].
    pub fn write_le_slice<T: LeScalar>(&mut self, values: &[T]) -> CoreResult<()> {
        self.write(&encode_le_slice(values))
    }

    /// Reads and verifies one little-endian integer.
    ///
    /// # Errors
    ///
    /// Same as [`ReplicaSet::read`].
    pub fn read_le<T: LeScalar>(&mut self) -> CoreResult<T> {
        let mut bytes = [0u8; 8];
        self.read(&mut bytes[..T::SIZE])?;
        Ok(T::get_le(&bytes))
    }

    /// Reads and verifies `count` little-endian integers.
    ///
    /// # Errors
    ///
    /// Same as [`ReplicaSet::read`].
    pub fn read_le_vec<T: LeScalar>(&mut self, count: usize) -> CoreResult<Vec<T>> {
        let mut bytes = vec![0u8; count * T::SIZE];
        self.read(&mut bytes)?;
        Ok(decode_le_slice(&bytes))
    }

    /// Writes a little-endian `u32` to every member.
    ///
    /// # Errors
    ///
    /// Same as [`ReplicaSet::write`].
    pub fn write_u32_le(&mut self, value: u32) -> CoreResult<()> {
        self.write_le(value)
    }

    /// Reads and verifies a little-endian `u32`.
    ///
    /// # Errors
    ///
    /// Same as [`ReplicaSet::read`].
    pub fn read_u32_le(&mut self) -> CoreResult<u32> {
        self.read_le()
    }

    /// Writes a little-endian `u64` to every member.
    ///
    /// # Errors
    ///
    /// Same as [`ReplicaSet::write`].
    pub fn write_u64_le(&mut self, value: u64) -> CoreResult<()> {
        self.write_le(value)
    }

    /// Reads and verifies a little-endian `u64`.
    ///
    /// # Errors
    ///
    /// Same as [`ReplicaSet::read`].
    pub fn read_u64_le(&mut self) -> CoreResult<u64> {
        self.read_le()
    }

    fn members(&self) -> impl Iterator<Item = &MemberHandle> + '_ {
        std::iter::once(&self.primary).chain(self.replicas.iter())
    }

    fn members_mut(&mut self) -> impl Iterator<Item = &mut MemberHandle> + '_ {
        std::iter::once(&mut self.primary).chain(self.replicas.iter_mut())
    }

    fn release_replicas(&mut self) {
        for replica in &mut self.replicas {
            replica.close();
        }
        self.replicas.clear();
    }

    fn frame_corrupted(&mut self, error: StorageError) -> CoreError {
        warn!(%error, "corrupted frame in replica set");
        for member in self.members_mut() {
            member.mark_corrupt();
        }
        CoreError::Storage(error)
    }

    /// Runs `op` on the primary and then on every replica, collecting
    /// every failure.
    fn mirror<F>(&mut self, op: MirrorOp, mut f: F) -> CoreResult<()>
    where
        F: FnMut(&mut MemberHandle) -> StorageResult<()>,
    {
        let mut failures = Vec::new();
        if let Err(error) = f(&mut self.primary) {
            failures.push(MemberFailure::new(Member::Primary, error));
        }
        for (index, replica) in self.replicas.iter_mut().enumerate() {
            if let Err(error) = f(replica) {
                failures.push(MemberFailure::new(Member::Replica(index), error));
            }
        }

        if failures.is_empty() {
            return Ok(());
        }
        for failure in &failures {
            warn!(%op, member = %failure.member, error = %failure.error, "mirrored operation failed");
        }
        Err(CoreError::Mirror { op, failures })
    }

    /// Asks every member and returns the primary's answer only if all
    /// replicas gave the identical one.
    fn unanimous<F>(&mut self, query: Query, mut f: F) -> CoreResult<u64>
    where
        F: FnMut(&mut MemberHandle) -> StorageResult<u64>,
    {
        let primary = f(&mut self.primary);
        let replicas: Vec<Option<u64>> = self
            .replicas
            .iter_mut()
            .map(|replica| f(replica).ok())
            .collect();

        let value = primary?;
        if replicas.iter().all(|answer| *answer == Some(value)) {
            return Ok(value);
        }

        let observations: Vec<Observation> = std::iter::once(Observation {
            member: Member::Primary,
            value: Some(value),
        })
        .chain(replicas.into_iter().enumerate().map(|(index, value)| Observation {
            member: Member::Replica(index),
            value,
        }))
        .collect();
        warn!(%query, ?observations, "replica set members disagree");
        Err(CoreError::Inconsistent {
            query,
            observations,
        })
    }
}

impl Drop for ReplicaSet {
    fn drop(&mut self) {
        self.close();
    }
}
