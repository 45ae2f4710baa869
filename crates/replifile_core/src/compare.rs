//! Offline byte-for-byte comparison of two files.
//!
//! The replica set only detects divergence. These functions find out where
//! it is: [`compare`] counts differing byte positions, [`audit`] runs that
//! count for every replica of a primary.

use crate::config::{Config, DEFAULT_COMPARE_CHUNK_SIZE};
use crate::error::{CoreError, CoreResult};
use replifile_storage::{Handle, OpenFlags, OpenRequest, ReadOnly};
use std::path::{Path, PathBuf};
use tracing::debug;

/// One differing byte position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Difference {
    /// Offset from the start of both files.
    pub offset: u64,
    /// Byte in the first file.
    pub left: u8,
    /// Byte in the second file.
    pub right: u8,
}

/// Result of comparing two equal-length files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Comparison {
    /// Length of both files.
    pub length: u64,
    /// Number of differing byte positions.
    pub differing: u64,
    /// The first differing positions, up to the requested limit.
    pub differences: Vec<Difference>,
}

impl Comparison {
    /// True if the files are identical.
    #[must_use]
    pub fn is_identical(&self) -> bool {
        self.differing == 0
    }
}

/// Streams two files through fixed-size chunks and compares them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Comparator {
    chunk_size: usize,
}

impl Default for Comparator {
    fn default() -> Self {
        Self::new(DEFAULT_COMPARE_CHUNK_SIZE)
    }
}

impl Comparator {
    /// Creates a comparator reading `chunk_size` bytes per step.
    #[must_use]
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    /// Creates a comparator from a configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.compare_chunk_size)
    }

    /// Counts the byte positions at which `left` and `right` differ.
    ///
    /// # Errors
    ///
    /// Returns an error if either file cannot be opened or read, or
    /// [`CoreError::LengthMismatch`] if their lengths differ.
    pub fn compare(&self, left: impl AsRef<Path>, right: impl AsRef<Path>) -> CoreResult<u64> {
        Ok(self.compare_detailed(left, right, 0)?.differing)
    }

    /// Compares two files and records up to `limit` differences.
    ///
    /// # Errors
    ///
    /// Same as [`Comparator::compare`].
    pub fn compare_detailed(
        &self,
        left: impl AsRef<Path>,
        right: impl AsRef<Path>,
        limit: usize,
    ) -> CoreResult<Comparison> {
        let request = OpenRequest::<ReadOnly>::open(OpenFlags::empty());
        let mut left = Handle::open_path(left.as_ref(), &request)?;
        let mut right = Handle::open_path(right.as_ref(), &request)?;

        let left_len = left.length()?;
        let right_len = right.length()?;
        if left_len != right_len {
            return Err(CoreError::LengthMismatch {
                left: left_len,
                right: right_len,
            });
        }

        let mut left_buf = vec![0u8; self.chunk_size];
        let mut right_buf = vec![0u8; self.chunk_size];
        let mut comparison = Comparison {
            length: left_len,
            ..Comparison::default()
        };

        let mut offset = 0u64;
        while offset < left_len {
            let n = (left_len - offset).min(self.chunk_size as u64) as usize;
            left.read(&mut left_buf[..n])?;
            right.read(&mut right_buf[..n])?;

            for (i, (&l, &r)) in left_buf[..n].iter().zip(&right_buf[..n]).enumerate() {
                if l == r {
                    continue;
                }
                comparison.differing += 1;
                if comparison.differences.len() < limit {
                    comparison.differences.push(Difference {
                        offset: offset + i as u64,
                        left: l,
                        right: r,
                    });
                }
            }
            offset += n as u64;
        }

        debug!(
            length = comparison.length,
            differing = comparison.differing,
            "compared files"
        );
        Ok(comparison)
    }
}

/// Counts the byte positions at which two files differ.
///
/// Returns 0 for identical files.
///
/// # Errors
///
/// Returns an error if either file cannot be opened or read, or if their
/// lengths differ.
pub fn compare(left: impl AsRef<Path>, right: impl AsRef<Path>) -> CoreResult<u64> {
    Comparator::default().compare(left, right)
}

/// Outcome of auditing one replica.
#[derive(Debug)]
pub enum AuditOutcome {
    /// Byte-identical to the primary.
    Identical,
    /// Same length, differing at this many positions.
    Diverged {
        /// Number of differing byte positions.
        differing: u64,
    },
    /// The comparison could not be made.
    Failed(CoreError),
}

/// Audit result for one replica.
#[derive(Debug)]
pub struct AuditEntry {
    /// The replica's path.
    pub replica: PathBuf,
    /// What the comparison found.
    pub outcome: AuditOutcome,
}

impl AuditEntry {
    /// True if the replica matches the primary.
    #[must_use]
    pub fn is_identical(&self) -> bool {
        matches!(self.outcome, AuditOutcome::Identical)
    }
}

/// Compares every replica with the primary.
///
/// Every replica is checked; one failing comparison does not stop the
/// rest.
pub fn audit<P>(comparator: &Comparator, primary: &Path, replicas: &[P]) -> Vec<AuditEntry>
where
    P: AsRef<Path>,
{
    replicas
        .iter()
        .map(|replica| {
            let replica = replica.as_ref();
            let outcome = match comparator.compare(primary, replica) {
                Ok(0) => AuditOutcome::Identical,
                Ok(differing) => AuditOutcome::Diverged { differing },
                Err(error) => AuditOutcome::Failed(error),
            };
            AuditEntry {
                replica: replica.to_path_buf(),
                outcome,
            }
        })
        .collect()
}
