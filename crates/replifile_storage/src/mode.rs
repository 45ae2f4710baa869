//! Open modes and access capabilities.

use std::fs::OpenOptions;
use std::marker::PhantomData;

bitflags::bitflags! {
    /// Mode flags used to open a handle.
    ///
    /// Callers never pass these to a handle directly. They go through one of
    /// the [`OpenRequest`] filters, which force the access bits of the
    /// handle's capability and strip the combinations it does not allow.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OpenFlags: u8 {
        /// Open for reading.
        const READ = 1 << 0;
        /// Open for writing.
        const WRITE = 1 << 1;
        /// Create the resource if it does not exist.
        const CREATE = 1 << 2;
        /// Fail if the resource already exists. Implies `CREATE`.
        const EXCLUSIVE = 1 << 3;
        /// Truncate the resource to zero length on open.
        const TRUNCATE = 1 << 4;
        /// Every write goes to the end of the resource.
        const APPEND = 1 << 5;

        /// Both access bits.
        const ACCESS = Self::READ.bits() | Self::WRITE.bits();
    }
}

impl Default for OpenFlags {
    fn default() -> Self {
        Self::empty()
    }
}

impl OpenFlags {
    pub(crate) fn to_options(self) -> OpenOptions {
        let mut options = OpenOptions::new();
        options
            .read(self.contains(Self::READ))
            .write(self.contains(Self::WRITE))
            .append(self.contains(Self::APPEND))
            .truncate(self.contains(Self::TRUNCATE));
        if self.contains(Self::EXCLUSIVE) {
            options.create_new(true);
        } else {
            options.create(self.contains(Self::CREATE));
        }
        options
    }
}

mod sealed {
    pub trait Sealed {}

    impl Sealed for super::ReadOnly {}
    impl Sealed for super::WriteOnly {}
    impl Sealed for super::ReadWrite {}
}

/// Access capability of a handle.
///
/// This trait is sealed; the three capabilities are [`ReadOnly`],
/// [`WriteOnly`] and [`ReadWrite`].
pub trait Capability: sealed::Sealed + Copy + Send + Sync + 'static {
    /// Access bits forced onto every request for this capability.
    const ACCESS: OpenFlags;
    /// Whether handles with this capability can write.
    const WRITE: bool;
}

/// Capabilities that allow reading.
pub trait Readable: Capability {}

/// Capabilities that allow writing.
pub trait Writable: Capability {}

/// Read-only access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOnly;

/// Write-only access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOnly;

/// Read-write access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadWrite;

impl Capability for ReadOnly {
    const ACCESS: OpenFlags = OpenFlags::READ;
    const WRITE: bool = false;
}

impl Capability for WriteOnly {
    const ACCESS: OpenFlags = OpenFlags::WRITE;
    const WRITE: bool = true;
}

impl Capability for ReadWrite {
    const ACCESS: OpenFlags = OpenFlags::ACCESS;
    const WRITE: bool = true;
}

impl Readable for ReadOnly {}
impl Readable for ReadWrite {}
impl Writable for WriteOnly {}
impl Writable for ReadWrite {}

/// A filtered set of open flags for one capability.
///
/// This is the only input [`crate::Handle::open`] accepts. Every
/// constructor is a filter, so an `OpenRequest` always carries a mode that
/// is legal for `C`. Requests are `Copy`; whoever opened one handle can
/// open further handles with exactly the same mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenRequest<C: Capability> {
    flags: OpenFlags,
    _capability: PhantomData<C>,
}

impl<C: Capability> OpenRequest<C> {
    /// Opens an existing resource.
    ///
    /// Creation flags are stripped. Read-only requests also lose
    /// `TRUNCATE` and `APPEND`.
    #[must_use]
    pub fn open(flags: OpenFlags) -> Self {
        let mut flags = flags - (OpenFlags::ACCESS | OpenFlags::CREATE | OpenFlags::EXCLUSIVE);
        if !C::WRITE {
            flags -= OpenFlags::TRUNCATE | OpenFlags::APPEND;
        }
        Self::filtered(flags | C::ACCESS)
    }

    /// The filtered flags this request opens with.
    #[must_use]
    pub fn flags(&self) -> OpenFlags {
        self.flags
    }

    fn filtered(flags: OpenFlags) -> Self {
        Self {
            flags,
            _capability: PhantomData,
        }
    }
}

impl<C: Writable> OpenRequest<C> {
    /// Opens the resource, creating it if it does not exist.
    #[must_use]
    pub fn create(flags: OpenFlags) -> Self {
        let flags = flags - (OpenFlags::ACCESS | OpenFlags::EXCLUSIVE);
        Self::filtered(flags | C::ACCESS | OpenFlags::CREATE)
    }

    /// Creates the resource, failing if it already exists.
    #[must_use]
    pub fn exclusive(flags: OpenFlags) -> Self {
        let flags = flags - OpenFlags::ACCESS;
        Self::filtered(flags | C::ACCESS | OpenFlags::CREATE | OpenFlags::EXCLUSIVE)
    }
}
