//! CLI command implementations.

pub mod audit;
pub mod compare;
pub mod mirror;
pub mod verify;

use replifile_core::CoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for commands.
pub type CliResult<T> = Result<T, CliError>;

/// Errors reported by commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// A replica set or comparison failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Reading an input file failed.
    #[error("cannot read {path:?}: {source}")]
    Input {
        /// The input file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// JSON output could not be produced.
    #[error("cannot encode output: {0}")]
    Json(#[from] serde_json::Error),

    /// The command found a problem and already reported it.
    #[error("{0}")]
    Check(String),
}

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines
    Text,
    /// Pretty-printed JSON
    Json,
}

/// Opens `primary` and attaches every replica.
///
/// With `create`, missing files are created and existing ones truncated.
fn open_set(
    primary: &std::path::Path,
    replicas: &[PathBuf],
    create: bool,
) -> CliResult<replifile_core::ReplicaSet> {
    use replifile_core::{OpenFlags, ReplicaSet};

    let mut set = ReplicaSet::new();
    if create {
        set.create(primary, OpenFlags::TRUNCATE)?;
    } else {
        set.open(primary, OpenFlags::empty())?;
    }
    for replica in replicas {
        set.add(replica)?;
    }
    Ok(set)
}
