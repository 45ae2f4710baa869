//! Verify command implementation.

use super::{open_set, CliError, CliResult};
use replifile_core::ReplicaSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Verification result.
#[derive(Debug, Default)]
pub struct VerifyResult {
    /// Common length of all members.
    pub length: u64,
    /// Bytes read and confirmed by every member.
    pub verified: u64,
    /// Offset of the first chunk that failed verification.
    pub failed_at: Option<u64>,
    /// The failure, if any.
    pub error: Option<String>,
}

impl VerifyResult {
    fn is_ok(&self) -> bool {
        self.failed_at.is_none() && self.error.is_none()
    }
}

/// Runs the verify command.
pub fn run(primary: &Path, replicas: &[PathBuf], chunk_size: usize) -> CliResult<()> {
    println!(
        "Verifying {:?} against {} replica(s)",
        primary,
        replicas.len()
    );

    let mut set = open_set(primary, replicas, false)?;
    let result = verify_set(&mut set, chunk_size);
    print_result(&set, &result);

    if result.is_ok() {
        println!("✓ Replica set verification passed");
        Ok(())
    } else {
        println!("✗ Replica set verification failed");
        Err(CliError::Check("Verification failed".into()))
    }
}

fn verify_set(set: &mut ReplicaSet, chunk_size: usize) -> VerifyResult {
    let mut result = VerifyResult::default();

    result.length = match set.length() {
        Ok(length) => length,
        Err(e) => {
            warn!(error = %e, "members disagree on length");
            result.failed_at = Some(0);
            result.error = Some(e.to_string());
            return result;
        }
    };

    let mut buf = vec![0u8; chunk_size.max(1)];
    while result.verified < result.length {
        let n = (result.length - result.verified).min(buf.len() as u64) as usize;
        if let Err(e) = set.read(&mut buf[..n]) {
            warn!(offset = result.verified, error = %e, "verified read failed");
            result.failed_at = Some(result.verified);
            result.error = Some(e.to_string());
            return result;
        }
        result.verified += n as u64;
    }

    info!(bytes = result.verified, "verified replica set");
    result
}

fn print_result(set: &ReplicaSet, result: &VerifyResult) {
    println!("  Length:   {} bytes", result.length);
    println!("  Verified: {} bytes", result.verified);
    if let Some(offset) = result.failed_at {
        println!("  First failing chunk at offset {offset}");
    }
    if let Some(error) = &result.error {
        println!("  Error: {error}");
    }
    let flags = set.error_flags();
    if !flags.is_empty() {
        println!("  Flags: {}", flags.names().join(" | "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::mirror;
    use std::fs;
    use tempfile::tempdir;

    fn mirrored(dir: &Path, data: &[u8]) -> (PathBuf, Vec<PathBuf>) {
        let input = dir.join("input.bin");
        let primary = dir.join("primary.bin");
        let replicas = vec![dir.join("r0.bin"), dir.join("r1.bin")];
        fs::write(&input, data).unwrap();
        mirror::run(&input, &primary, &replicas, 16).unwrap();
        (primary, replicas)
    }

    #[test]
    fn intact_set_verifies() {
        let dir = tempdir().unwrap();
        let (primary, replicas) = mirrored(dir.path(), &[7u8; 100]);

        let mut set = open_set(&primary, &replicas, false).unwrap();
        let result = verify_set(&mut set, 32);
        assert!(result.is_ok());
        assert_eq!(result.verified, 100);
    }

    #[test]
    fn reports_first_failing_chunk() {
        let dir = tempdir().unwrap();
        let (primary, replicas) = mirrored(dir.path(), &[7u8; 100]);
        let mut bytes = fs::read(&replicas[1]).unwrap();
        bytes[70] = 0;
        fs::write(&replicas[1], &bytes).unwrap();

        let mut set = open_set(&primary, &replicas, false).unwrap();
        let result = verify_set(&mut set, 32);
        assert_eq!(result.failed_at, Some(64));
        assert_eq!(result.verified, 64);
    }

    #[test]
    fn length_disagreement_fails_immediately() {
        let dir = tempdir().unwrap();
        let (primary, replicas) = mirrored(dir.path(), &[7u8; 100]);
        fs::write(&replicas[0], [7u8; 90]).unwrap();

        let mut set = open_set(&primary, &replicas, false).unwrap();
        let result = verify_set(&mut set, 32);
        assert_eq!(result.failed_at, Some(0));
        assert_eq!(result.length, 0);
    }
}
