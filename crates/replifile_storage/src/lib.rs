//! # Replifile Storage
//!
//! Single-resource I/O primitive for Replifile.
//!
//! A [`Handle`] wraps one opened random-access file and records every failure
//! in its own [`ErrorFlags`]. The flags separate two kinds of conditions:
//!
//! - **critical** ("bad") bits describe why the handle cannot be trusted at
//!   all and stay set until the handle is reopened;
//! - **operational** ("fail") bits describe a failed read, write, seek, tell,
//!   commit or detected corruption and can be cleared with
//!   [`Handle::reset`].
//!
//! ## Capabilities
//!
//! The access capability of a handle is part of its type. Reads compile only
//! for [`Readable`] capabilities and writes only for [`Writable`] ones:
//!
//! - [`ReadOnly`]
//! - [`WriteOnly`]
//! - [`ReadWrite`]
//!
//! Handles can only be opened through an [`OpenRequest`], which is produced by
//! the capability-specific filters (`open`, `create`, `exclusive`). The
//! request is plain data, so a caller that opened one handle can reuse the
//! exact same filtered request for further handles.
//!
//! ## Example
//!
//! ```no_run
//! use replifile_storage::{Handle, OpenFlags, OpenRequest, ReadWrite};
//! use std::io::SeekFrom;
//!
//! let request = OpenRequest::<ReadWrite>::create(OpenFlags::TRUNCATE);
//! let mut handle = Handle::open_path("data.bin", &request).unwrap();
//! handle.write(b"hello").unwrap();
//! handle.seek(SeekFrom::Start(0)).unwrap();
//!
//! let mut buf = [0u8; 5];
//! handle.read(&mut buf).unwrap();
//! assert_eq!(&buf, b"hello");
//! assert!(handle.good());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod flags;
mod frame;
mod handle;
mod mode;

pub use error::{StorageError, StorageResult};
pub use flags::ErrorFlags;
pub use frame::{
    check_frame_len, check_frame_trailer, decode_le_slice, encode_frame, encode_le_slice, LeScalar,
    FRAME_LEN_SIZE,
};
pub use handle::{EofState, Handle};
pub use mode::{Capability, OpenFlags, OpenRequest, ReadOnly, ReadWrite, Readable, WriteOnly, Writable};
