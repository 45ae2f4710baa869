//! Audit command implementation.

use super::{CliError, CliResult, OutputFormat};
use replifile_core::{audit, AuditEntry, AuditOutcome, Comparator, Config};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Audit line for one replica.
#[derive(Debug, Serialize)]
pub struct AuditLine {
    /// Replica path.
    pub replica: String,
    /// `identical`, `diverged` or `failed`.
    pub status: &'static str,
    /// Number of differing bytes, when the comparison succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub differing: Option<u64>,
    /// Why the comparison failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&AuditEntry> for AuditLine {
    fn from(entry: &AuditEntry) -> Self {
        let (status, differing, error) = match &entry.outcome {
            AuditOutcome::Identical => ("identical", Some(0), None),
            AuditOutcome::Diverged { differing } => ("diverged", Some(*differing), None),
            AuditOutcome::Failed(e) => ("failed", None, Some(e.to_string())),
        };
        Self {
            replica: entry.replica.display().to_string(),
            status,
            differing,
            error,
        }
    }
}

/// Runs the audit command.
pub fn run(
    config: &Config,
    primary: &Path,
    replicas: &[PathBuf],
    format: OutputFormat,
) -> CliResult<()> {
    let entries = audit(&Comparator::from_config(config), primary, replicas);
    let lines: Vec<AuditLine> = entries.iter().map(AuditLine::from).collect();

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&lines)?);
        }
        OutputFormat::Text => {
            for line in &lines {
                match (line.differing, &line.error) {
                    (_, Some(error)) => println!("{}: failed ({error})", line.replica),
                    (Some(0), _) => println!("{}: identical", line.replica),
                    (Some(n), _) => println!("{}: {n} byte(s) differ", line.replica),
                    (None, None) => println!("{}: {}", line.replica, line.status),
                }
            }
        }
    }

    let bad = entries.iter().filter(|entry| !entry.is_identical()).count();
    if bad == 0 {
        Ok(())
    } else {
        warn!(replicas = bad, "audit found diverged replicas");
        Err(CliError::Check(format!(
            "{bad} of {} replica(s) do not match {:?}",
            entries.len(),
            primary
        )))
    }
}
