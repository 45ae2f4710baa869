//! A handle over one random-access file.

use crate::error::{StorageError, StorageResult};
use crate::flags::ErrorFlags;
use crate::mode::{Capability, OpenRequest, Readable, Writable};
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// Result of asking a handle whether its position is at the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EofState {
    /// The position is at or past the end.
    AtEnd,
    /// There are bytes left to read.
    NotAtEnd,
    /// The state could not be determined.
    Indeterminate,
}

/// An open reference to one file, typed by its access capability.
///
/// Every failure returns an error *and* records a bit in the handle's
/// [`ErrorFlags`]; see the crate docs for the critical/operational split.
/// A closed handle reports `OPEN` in its flags and is therefore `bad`.
///
/// Write-capable handles commit before closing if they are still good.
/// Dropping a handle closes it.
#[derive(Debug)]
pub struct Handle<C: Capability> {
    file: Option<File>,
    path: Option<PathBuf>,
    flags: ErrorFlags,
    _capability: PhantomData<C>,
}

impl<C: Capability> Default for Handle<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Capability> Handle<C> {
    /// Creates a closed handle.
    #[must_use]
    pub fn new() -> Self {
        Self {
            file: None,
            path: None,
            flags: ErrorFlags::empty(),
            _capability: PhantomData,
        }
    }

    /// Opens `path` with `request` and returns the open handle.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Open`] if the resource cannot be opened.
    pub fn open_path(path: impl AsRef<Path>, request: &OpenRequest<C>) -> StorageResult<Self> {
        let mut handle = Self::new();
        handle.open(path, request)?;
        Ok(handle)
    }

    /// Opens `path` with `request`.
    ///
    /// Opening clears every flag first. If the handle is already open, the
    /// open resource is closed, `REOPEN` is flagged and the call fails.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Reopen`] for an already open handle and
    /// [`StorageError::Open`] if the native open fails.
    pub fn open(&mut self, path: impl AsRef<Path>, request: &OpenRequest<C>) -> StorageResult<()> {
        self.flags = ErrorFlags::empty();
        if self.file.is_some() {
            self.flags.insert(ErrorFlags::REOPEN);
            self.close();
            return Err(StorageError::Reopen);
        }

        let path = path.as_ref();
        match request.flags().to_options().open(path) {
            Ok(file) => {
                self.file = Some(file);
                self.path = Some(path.to_path_buf());
                Ok(())
            }
            Err(source) => {
                let flags = ErrorFlags::from_open_error(&source);
                self.flags = flags;
                self.path = Some(path.to_path_buf());
                Err(StorageError::Open {
                    path: path.to_path_buf(),
                    flags,
                    source,
                })
            }
        }
    }

    /// Closes the handle.
    ///
    /// Write-capable handles that are still good sync to disk first. A
    /// failing sync is ignored; the resource is released either way.
    pub fn close(&mut self) {
        if let Some(file) = self.file.take() {
            if C::WRITE && self.flags.good() {
                let _ = file.sync_all();
            }
        }
    }

    /// Returns true if the handle holds an open resource.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Path of the last open attempt.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Current flags. A closed handle always includes `OPEN`.
    #[must_use]
    pub fn error_flags(&self) -> ErrorFlags {
        if self.is_open() {
            self.flags
        } else {
            self.flags | ErrorFlags::OPEN
        }
    }

    /// Returns true if a critical flag is set or the handle is closed.
    #[must_use]
    pub fn bad(&self) -> bool {
        self.error_flags().bad()
    }

    /// Returns true if any flag is set or the handle is closed.
    #[must_use]
    pub fn fail(&self) -> bool {
        self.error_flags().fail()
    }

    /// Returns true if the handle is open with no flags set.
    #[must_use]
    pub fn good(&self) -> bool {
        self.error_flags().good()
    }

    /// Clears operational flags. Critical flags stay until reopen.
    pub fn reset(&mut self) {
        self.flags.reset();
    }

    /// Records that data read through this handle failed validation.
    pub fn mark_corrupt(&mut self) {
        self.flags.insert(ErrorFlags::CORRUPT);
    }

    /// Moves the position and returns the new offset.
    ///
    /// # Errors
    ///
    /// Returns an error (flagging `SEEK`) if the seek fails, for example
    /// when it would land before the start.
    pub fn seek(&mut self, pos: SeekFrom) -> StorageResult<u64> {
        let file = self.file.as_mut().ok_or(StorageError::Closed)?;
        match file.seek(pos) {
            Ok(offset) => Ok(offset),
            Err(e) => {
                self.flags.insert(ErrorFlags::SEEK);
                Err(e.into())
            }
        }
    }

    /// Returns the current position.
    ///
    /// # Errors
    ///
    /// Returns an error (flagging `TELL`) if the position cannot be read.
    pub fn tell(&mut self) -> StorageResult<u64> {
        let file = self.file.as_mut().ok_or(StorageError::Closed)?;
        match file.stream_position() {
            Ok(offset) => Ok(offset),
            Err(e) => {
                self.flags.insert(ErrorFlags::TELL);
                Err(e.into())
            }
        }
    }

    /// Returns the length of the resource in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error (flagging `INVALID`) if metadata is unavailable.
    pub fn length(&mut self) -> StorageResult<u64> {
        let file = self.file.as_ref().ok_or(StorageError::Closed)?;
        match file.metadata() {
            Ok(metadata) => Ok(metadata.len()),
            Err(e) => {
                self.flags.insert(ErrorFlags::INVALID);
                Err(e.into())
            }
        }
    }

    /// Reports whether the position is at the end.
    ///
    /// A closed handle is [`EofState::Indeterminate`]. A failed probe also
    /// flags `INVALID`.
    pub fn eof(&mut self) -> EofState {
        let Some(file) = self.file.as_mut() else {
            return EofState::Indeterminate;
        };
        match end_state(file) {
            Ok(state) => state,
            Err(_) => {
                self.flags.insert(ErrorFlags::INVALID);
                EofState::Indeterminate
            }
        }
    }
}

impl<C: Readable> Handle<C> {
    /// Fills `buf` from the current position.
    ///
    /// Anything less than `buf.len()` bytes is a failure.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ShortRead`] at end of file, or the I/O error.
    /// Both flag `READ`.
    pub fn read(&mut self, buf: &mut [u8]) -> StorageResult<()> {
        let file = self.file.as_mut().ok_or(StorageError::Closed)?;
        match read_full(file, buf) {
            Ok(actual) if actual == buf.len() => Ok(()),
            Ok(actual) => {
                self.flags.insert(ErrorFlags::READ);
                Err(StorageError::ShortRead {
                    requested: buf.len(),
                    actual,
                })
            }
            Err(e) => {
                self.flags.insert(ErrorFlags::READ);
                Err(e.into())
            }
        }
    }
}

impl<C: Writable> Handle<C> {
    /// Writes all of `buf` at the current position.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ShortWrite`] or the I/O error. Both flag
    /// `WRITE`.
    pub fn write(&mut self, buf: &[u8]) -> StorageResult<()> {
        let file = self.file.as_mut().ok_or(StorageError::Closed)?;
        match write_full(file, buf) {
            Ok(actual) if actual == buf.len() => Ok(()),
            Ok(actual) => {
                self.flags.insert(ErrorFlags::WRITE);
                Err(StorageError::ShortWrite {
                    requested: buf.len(),
                    actual,
                })
            }
            Err(e) => {
                self.flags.insert(ErrorFlags::WRITE);
                Err(e.into())
            }
        }
    }

    /// Syncs data and metadata to durable storage.
    ///
    /// A handle that is not good refuses to commit.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotGood`] for a flagged handle, or the sync
    /// error (flagging `COMMIT`).
    pub fn commit(&mut self) -> StorageResult<()> {
        let flags = self.error_flags();
        let file = self.file.as_ref().ok_or(StorageError::Closed)?;
        if !flags.good() {
            return Err(StorageError::NotGood(flags));
        }
        match file.sync_all() {
            Ok(()) => Ok(()),
            Err(e) => {
                self.flags.insert(ErrorFlags::COMMIT);
                Err(e.into())
            }
        }
    }

    /// Truncates or extends the resource to `new_len` bytes.
    ///
    /// The position is not moved.
    ///
    /// # Errors
    ///
    /// Returns the I/O error; the flags set follow
    /// [`ErrorFlags::from_resize_error`].
    pub fn set_len(&mut self, new_len: u64) -> StorageResult<()> {
        let file = self.file.as_ref().ok_or(StorageError::Closed)?;
        match file.set_len(new_len) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.flags.insert(ErrorFlags::from_resize_error(&e));
                Err(e.into())
            }
        }
    }
}

impl<C: Capability> Drop for Handle<C> {
    fn drop(&mut self) {
        self.close();
    }
}

fn read_full(file: &mut File, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match file.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

fn write_full(file: &mut File, buf: &[u8]) -> io::Result<usize> {
    let mut written = 0;
    while written < buf.len() {
        match file.write(&buf[written..]) {
            Ok(0) => break,
            Ok(n) => written += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(written)
}

fn end_state(file: &mut File) -> io::Result<EofState> {
    let position = file.stream_position()?;
    let len = file.metadata()?.len();
    Ok(if position >= len {
        EofState::AtEnd
    } else {
        EofState::NotAtEnd
    })
}
