//! Per-handle error flags.
//!
//! The low byte holds critical conditions, the high byte holds operational
//! ones. Critical bits survive [`ErrorFlags::reset`]; only reopening the
//! handle clears them.

use std::io;

bitflags::bitflags! {
    /// Error state of a handle, or the union of several handles' states.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ErrorFlags: u16 {
        /// Opening the resource failed, or the handle is not open.
        const OPEN = 1 << 0;
        /// `open` was called while the handle was already open.
        const REOPEN = 1 << 1;
        /// Permission denied, read-only violation, or the path is a directory.
        const ACCESS = 1 << 2;
        /// Exclusive creation was requested but the resource exists.
        const EXISTS = 1 << 3;
        /// An argument or mode combination was rejected.
        const INVALID_ARGUMENT = 1 << 4;
        /// No more native handles are available.
        const TOO_MANY_HANDLES = 1 << 5;
        /// The resource or one of its parent directories does not exist.
        const NOT_FOUND = 1 << 6;
        /// Generic invalid operation (failed length, EOF probe or resize).
        const INVALID = 1 << 7;

        /// Durable commit failed.
        const COMMIT = 1 << 8;
        /// Seek failed.
        const SEEK = 1 << 9;
        /// Position query failed.
        const TELL = 1 << 10;
        /// Read failed or came up short.
        const READ = 1 << 11;
        /// Write failed or came up short.
        const WRITE = 1 << 12;
        /// Data read back did not validate.
        const CORRUPT = 1 << 13;

        /// Every critical bit.
        const CRITICAL = 0x00ff;
        /// Every operational bit.
        const OPERATIONAL = 0xff00;
    }
}

impl Default for ErrorFlags {
    fn default() -> Self {
        Self::empty()
    }
}

impl ErrorFlags {
    /// Returns true if any critical bit is set.
    #[must_use]
    pub fn bad(self) -> bool {
        self.intersects(Self::CRITICAL)
    }

    /// Returns true if any bit is set.
    #[must_use]
    pub fn fail(self) -> bool {
        !self.is_empty()
    }

    /// Returns true if no bit is set.
    #[must_use]
    pub fn good(self) -> bool {
        self.is_empty()
    }

    /// Clears the operational bits, keeping critical ones.
    pub fn reset(&mut self) {
        self.remove(Self::OPERATIONAL);
    }

    /// Returns only the critical bits.
    #[must_use]
    pub fn critical(self) -> Self {
        self & Self::CRITICAL
    }

    /// Returns only the operational bits.
    #[must_use]
    pub fn operational(self) -> Self {
        self & Self::OPERATIONAL
    }

    /// Maps a native open failure to critical flags.
    ///
    /// `OPEN` is always set. Every other bit is tested on its own, so a
    /// single native error may set several of them.
    #[must_use]
    pub fn from_open_error(error: &io::Error) -> Self {
        let kind = error.kind();
        let code = error.raw_os_error();

        let mut flags = Self::OPEN;
        flags.set(
            Self::ACCESS,
            kind == io::ErrorKind::PermissionDenied || native::is_directory(code),
        );
        flags.set(Self::EXISTS, kind == io::ErrorKind::AlreadyExists);
        flags.set(
            Self::INVALID_ARGUMENT,
            kind == io::ErrorKind::InvalidInput || native::is_invalid_argument(code),
        );
        flags.set(Self::TOO_MANY_HANDLES, native::is_too_many_handles(code));
        flags.set(Self::NOT_FOUND, kind == io::ErrorKind::NotFound);
        flags
    }

    /// Maps a failed resize to flags.
    ///
    /// `INVALID` is always set; a bad handle or a full device also sets
    /// `ACCESS`, a rejected size sets `INVALID_ARGUMENT`.
    #[must_use]
    pub fn from_resize_error(error: &io::Error) -> Self {
        let kind = error.kind();
        let code = error.raw_os_error();

        let mut flags = Self::INVALID;
        flags.set(
            Self::ACCESS,
            kind == io::ErrorKind::PermissionDenied
                || native::is_bad_handle(code)
                || native::is_no_space(code),
        );
        flags.set(
            Self::INVALID_ARGUMENT,
            kind == io::ErrorKind::InvalidInput || native::is_invalid_argument(code),
        );
        flags
    }

    /// Bitwise OR of every set in `flags`.
    ///
    /// This keeps *which* conditions occurred anywhere, not only whether
    /// one did.
    #[must_use]
    pub fn union_all<I>(flags: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        flags.into_iter().fold(Self::empty(), |acc, f| acc | f)
    }

    /// Names of the individual bits that are set.
    #[must_use]
    pub fn names(self) -> Vec<&'static str> {
        self.iter_names()
            .filter(|(_, flag)| flag.bits().count_ones() == 1)
            .map(|(name, _)| name)
            .collect()
    }
}

/// Native error codes. These differ per platform and are matched on the raw
/// code only where `io::ErrorKind` has no stable variant.
#[cfg(unix)]
mod native {
    const EBADF: i32 = 9;
    const ENFILE: i32 = 23;
    const EMFILE: i32 = 24;
    const EISDIR: i32 = 21;
    const EINVAL: i32 = 22;
    const ENOSPC: i32 = 28;

    pub(super) fn is_directory(code: Option<i32>) -> bool {
        code == Some(EISDIR)
    }

    pub(super) fn is_invalid_argument(code: Option<i32>) -> bool {
        code == Some(EINVAL)
    }

    pub(super) fn is_too_many_handles(code: Option<i32>) -> bool {
        matches!(code, Some(EMFILE | ENFILE))
    }

    pub(super) fn is_bad_handle(code: Option<i32>) -> bool {
        code == Some(EBADF)
    }

    pub(super) fn is_no_space(code: Option<i32>) -> bool {
        code == Some(ENOSPC)
    }
}

#[cfg(windows)]
mod native {
    const ERROR_TOO_MANY_OPEN_FILES: i32 = 4;
    const ERROR_INVALID_HANDLE: i32 = 6;
    const ERROR_HANDLE_DISK_FULL: i32 = 39;
    const ERROR_INVALID_PARAMETER: i32 = 87;
    const ERROR_DISK_FULL: i32 = 112;
    const ERROR_DIRECTORY: i32 = 267;

    pub(super) fn is_directory(code: Option<i32>) -> bool {
        code == Some(ERROR_DIRECTORY)
    }

    pub(super) fn is_invalid_argument(code: Option<i32>) -> bool {
        code == Some(ERROR_INVALID_PARAMETER)
    }

    pub(super) fn is_too_many_handles(code: Option<i32>) -> bool {
        code == Some(ERROR_TOO_MANY_OPEN_FILES)
    }

    pub(super) fn is_bad_handle(code: Option<i32>) -> bool {
        code == Some(ERROR_INVALID_HANDLE)
    }

    pub(super) fn is_no_space(code: Option<i32>) -> bool {
        matches!(code, Some(ERROR_DISK_FULL | ERROR_HANDLE_DISK_FULL))
    }
}

#[cfg(not(any(unix, windows)))]
mod native {
    pub(super) fn is_directory(_: Option<i32>) -> bool {
        false
    }

    pub(super) fn is_invalid_argument(_: Option<i32>) -> bool {
        false
    }

    pub(super) fn is_too_many_handles(_: Option<i32>) -> bool {
        false
    }

    pub(super) fn is_bad_handle(_: Option<i32>) -> bool {
        false
    }

    pub(super) fn is_no_space(_: Option<i32>) -> bool {
        false
    }
}
