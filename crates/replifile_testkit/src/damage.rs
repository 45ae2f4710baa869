//! Out-of-band damage to member files.
//!
//! These helpers modify a file directly on disk, bypassing the replica set
//! that has it open. They simulate silent corruption and partial hardware
//! failure.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Flips every bit of the byte at `offset`.
///
/// # Panics
///
/// Panics if the file cannot be read or written, or is too short.
pub fn corrupt_byte(path: &Path, offset: usize) {
    let mut bytes = fs::read(path).expect("Failed to read file");
    assert!(offset < bytes.len(), "offset {offset} past end of {path:?}");
    bytes[offset] ^= 0xff;
    overwrite(path, &bytes);
}

/// Replaces the contents of `path` in place, keeping the same inode.
///
/// # Panics
///
/// Panics if the file cannot be written.
pub fn overwrite(path: &Path, bytes: &[u8]) {
    let mut file = OpenOptions::new()
        .write(true)
        .truncate(true)
        .open(path)
        .expect("Failed to open file");
    file.write_all(bytes).expect("Failed to write file");
}

/// Appends `bytes` to the end of `path`.
///
/// # Panics
///
/// Panics if the file cannot be opened or written.
pub fn append_bytes(path: &Path, bytes: &[u8]) {
    let mut file = OpenOptions::new()
        .append(true)
        .open(path)
        .expect("Failed to open file");
    file.write_all(bytes).expect("Failed to append");
}

/// Truncates `path` to `len` bytes.
///
/// # Panics
///
/// Panics if the file cannot be opened or resized.
pub fn truncate_file(path: &Path, len: u64) {
    OpenOptions::new()
        .write(true)
        .open(path)
        .expect("Failed to open file")
        .set_len(len)
        .expect("Failed to truncate");
}
