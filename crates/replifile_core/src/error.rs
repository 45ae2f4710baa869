//! Error types for replica sets and comparisons.

use replifile_storage::StorageError;
use std::fmt;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// A member of a replica set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Member {
    /// The primary handle.
    Primary,
    /// The replica at this index, in addition order.
    Replica(usize),
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => write!(f, "primary"),
            Self::Replica(index) => write!(f, "replica {index}"),
        }
    }
}

/// One member's failure within a mirrored operation.
#[derive(Debug, Error)]
#[error("{member}: {error}")]
pub struct MemberFailure {
    /// The member that failed.
    pub member: Member,
    /// What went wrong.
    #[source]
    pub error: StorageError,
}

impl MemberFailure {
    pub(crate) fn new(member: Member, error: StorageError) -> Self {
        Self { member, error }
    }
}

/// Mirrored operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorOp {
    /// `write`
    Write,
    /// `set_len`
    Resize,
    /// `commit`
    Commit,
}

impl fmt::Display for MirrorOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Write => "write",
            Self::Resize => "resize",
            Self::Commit => "commit",
        })
    }
}

/// Queries that must be unanimous across members.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    /// `length`
    Length,
    /// `tell`
    Position,
    /// `seek`
    Seek,
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Length => "length",
            Self::Position => "position",
            Self::Seek => "seek",
        })
    }
}

/// What one member answered to a unanimous query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    /// The member queried.
    pub member: Member,
    /// Its answer, or `None` if the query failed on that member.
    pub value: Option<u64>,
}

/// Errors that can occur in replica set and comparison operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A single handle failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The operation needs an open replica set.
    #[error("replica set is not open")]
    NotOpen,

    /// No more replicas can be attached.
    #[error("replica capacity reached: {capacity} replicas attached")]
    CapacityExceeded {
        /// The limit in force.
        capacity: usize,
    },

    /// A mirrored operation failed on at least one member.
    ///
    /// The operation was still attempted on every member.
    #[error("{op} failed on {} member(s)", .failures.len())]
    Mirror {
        /// The operation.
        op: MirrorOp,
        /// Every member that failed, in member order.
        failures: Vec<MemberFailure>,
    },

    /// A verified read did not reach unanimous agreement.
    ///
    /// The caller's buffer still holds the primary's bytes.
    #[error(
        "read verification failed: {} member failure(s), replicas {mismatched:?} differ from primary",
        .failures.len()
    )]
    ReadVerification {
        /// Members whose read failed or that were already failed.
        failures: Vec<MemberFailure>,
        /// Replicas whose bytes differ from the primary's.
        mismatched: Vec<usize>,
    },

    /// Members disagree on a query that must be unanimous.
    #[error("replica set members disagree on {query}: {observations:?}")]
    Inconsistent {
        /// The query.
        query: Query,
        /// Every member's answer, primary first.
        observations: Vec<Observation>,
    },

    /// Two compared files have different lengths.
    #[error("length mismatch: {left} bytes vs {right} bytes")]
    LengthMismatch {
        /// Length of the first file.
        left: u64,
        /// Length of the second file.
        right: u64,
    },
}

impl CoreError {
    /// Returns true if this error reports replica disagreement.
    ///
    /// That covers mismatched read data and inconsistent queries.
    #[must_use]
    pub fn is_divergence(&self) -> bool {
        match self {
            Self::ReadVerification { mismatched, .. } => !mismatched.is_empty(),
            Self::Inconsistent { .. } => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_display() {
        assert_eq!(Member::Primary.to_string(), "primary");
        assert_eq!(Member::Replica(3).to_string(), "replica 3");
    }

    #[test]
    fn mirror_error_counts_failures() {
        let error = CoreError::Mirror {
            op: MirrorOp::Write,
            failures: vec![
                MemberFailure::new(Member::Replica(0), StorageError::Closed),
                MemberFailure::new(Member::Replica(2), StorageError::Closed),
            ],
        };
        assert_eq!(error.to_string(), "write failed on 2 member(s)");
        assert!(!error.is_divergence());
    }

    #[test]
    fn divergence_classification() {
        let mismatch = CoreError::ReadVerification {
            failures: Vec::new(),
            mismatched: vec![1],
        };
        assert!(mismatch.is_divergence());

        let failed_only = CoreError::ReadVerification {
            failures: vec![MemberFailure::new(Member::Primary, StorageError::Closed)],
            mismatched: Vec::new(),
        };
        assert!(!failed_only.is_divergence());

        let inconsistent = CoreError::Inconsistent {
            query: Query::Length,
            observations: Vec::new(),
        };
        assert!(inconsistent.is_divergence());
    }
}
