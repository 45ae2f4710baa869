//! # Replifile Core
//!
//! Mirrored storage with unanimous read verification.
//!
//! A [`ReplicaSet`] owns one primary file and up to
//! [`REPLICA_CAPACITY`] replicas opened with the same mode. Every write goes
//! to the primary first and then to each replica in order. Every read is
//! checked byte-for-byte against every replica. Position, length and EOF
//! queries only return a value when all members agree.
//!
//! ## Failure model
//!
//! The set detects, it never repairs:
//!
//! - a failed write, resize or commit on any member fails the whole call,
//!   after the operation has still been attempted on every member;
//! - a read fails if any member fails or any replica's bytes differ, even
//!   though the caller's buffer holds the primary's bytes;
//! - disagreeing positions or lengths produce [`CoreError::Inconsistent`]
//!   instead of any single member's value.
//!
//! Finding out *which* replica drifted is the job of the offline
//! [`Comparator`] and [`audit`].
//!
//! ## Example
//!
//! ```no_run
//! use replifile_core::{OpenFlags, ReplicaSet};
//! use std::io::SeekFrom;
//!
//! let mut set = ReplicaSet::new();
//! set.create("data.bin", OpenFlags::TRUNCATE).unwrap();
//! set.add("data.bin.1").unwrap();
//! set.add("data.bin.2").unwrap();
//!
//! set.write(b"critical bytes").unwrap();
//! set.commit().unwrap();
//!
//! set.seek(SeekFrom::Start(0)).unwrap();
//! let mut buf = [0u8; 14];
//! set.read(&mut buf).unwrap();
//! assert_eq!(&buf, b"critical bytes");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod compare;
mod config;
mod error;
mod replica;
mod shared;

pub use compare::{audit, compare, AuditEntry, AuditOutcome, Comparator, Comparison, Difference};
pub use config::{Config, DEFAULT_COMPARE_CHUNK_SIZE, REPLICA_CAPACITY};
pub use error::{CoreError, CoreResult, Member, MemberFailure, MirrorOp, Observation, Query};
pub use replica::ReplicaSet;
pub use shared::SharedReplicaSet;

pub use replifile_storage::{EofState, ErrorFlags, LeScalar, OpenFlags, StorageError};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
