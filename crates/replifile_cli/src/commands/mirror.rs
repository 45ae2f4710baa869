//! Mirror command implementation.

use super::{open_set, CliError, CliResult};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use tracing::info;

/// Runs the mirror command.
pub fn run(input: &Path, primary: &Path, replicas: &[PathBuf], chunk_size: usize) -> CliResult<()> {
    let input_error = |source| CliError::Input {
        path: input.to_path_buf(),
        source,
    };
    let mut source = File::open(input).map_err(input_error)?;
    let mut set = open_set(primary, replicas, true)?;

    let mut buf = vec![0u8; chunk_size.max(1)];
    let mut total = 0u64;
    loop {
        let n = match source.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(input_error(e)),
        };
        set.write(&buf[..n])?;
        total += n as u64;
    }
    set.commit()?;
    set.close();

    info!(
        bytes = total,
        replicas = replicas.len(),
        "mirrored {}",
        input.display()
    );
    println!(
        "Mirrored {} bytes to {:?} and {} replica(s)",
        total,
        primary,
        replicas.len()
    );
    Ok(())
}
