//! Length-prefixed byte strings and little-endian scalars.
//!
//! A frame is stored as `len: u32 LE | payload | len: u32 LE`. The trailing
//! length must repeat the leading one. A mismatch flags the handle
//! `CORRUPT`.

use crate::error::{StorageError, StorageResult};
use crate::handle::Handle;
use crate::mode::{Readable, Writable};
use std::io;

/// Size of each length field in a frame.
pub const FRAME_LEN_SIZE: usize = 4;

/// Encodes `payload` as one frame.
///
/// # Errors
///
/// Returns an error if the payload does not fit a `u32` length.
pub fn encode_frame(payload: &[u8]) -> StorageResult<Vec<u8>> {
    let len = u32::try_from(payload.len()).map_err(|_| {
        StorageError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("frame payload of {} bytes exceeds u32::MAX", payload.len()),
        ))
    })?;
    let mut frame = Vec::with_capacity(payload.len() + 2 * FRAME_LEN_SIZE);
    frame.extend_from_slice(&len.to_le_bytes());
    frame.extend_from_slice(payload);
    frame.extend_from_slice(&len.to_le_bytes());
    Ok(frame)
}

/// Checks that a frame of `len` payload bytes fits in the `remaining`
/// bytes after its leading length.
///
/// # Errors
///
/// Returns [`StorageError::Corrupted`] if the payload and trailer run past
/// the end.
pub fn check_frame_len(len: u32, remaining: u64) -> StorageResult<()> {
    if u64::from(len) + FRAME_LEN_SIZE as u64 > remaining {
        return Err(StorageError::Corrupted(format!(
            "frame length {len} exceeds the {remaining} remaining bytes"
        )));
    }
    Ok(())
}

/// Checks that a frame's trailing length repeats its leading one.
///
/// # Errors
///
/// Returns [`StorageError::Corrupted`] on a mismatch.
pub fn check_frame_trailer(len: u32, trailer: u32) -> StorageResult<()> {
    if trailer != len {
        return Err(StorageError::Corrupted(format!(
            "frame trailer {trailer} does not match length {len}"
        )));
    }
    Ok(())
}

/// Fixed-size integers stored little-endian.
pub trait LeScalar: Copy + sealed::Sealed {
    /// Encoded size in bytes.
    const SIZE: usize;

    /// Appends the little-endian encoding to `out`.
    fn put_le(self, out: &mut Vec<u8>);

    /// Decodes from the first [`LeScalar::SIZE`] bytes of `bytes`.
    fn get_le(bytes: &[u8]) -> Self;
}

mod sealed {
    pub trait Sealed {}
}

macro_rules! impl_le_scalar {
    ($($ty:ty),* $(,)?) => {$(
        impl sealed::Sealed for $ty {}

        impl LeScalar for $ty {
            const SIZE: usize = std::mem::size_of::<$ty>();

            fn put_le(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }

            fn get_le(bytes: &[u8]) -> Self {
                let mut raw = [0u8; std::mem::size_of::<$ty>()];
                raw.copy_from_slice(&bytes[..Self::SIZE]);
                <$ty>::from_le_bytes(raw)
            }
        }
    )*};
}

impl_le_scalar!(u8, u16, u32, u64, i8, i16, i32, i64);

/// Encodes `values` back to back, little-endian.
pub fn encode_le_slice<T: LeScalar>(values: &[T]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * T::SIZE);
    for &value in values {
        value.put_le(&mut out);
    }
    out
}

/// Decodes whole little-endian values from `bytes`; a trailing partial
/// value is ignored.
pub fn decode_le_slice<T: LeScalar>(bytes: &[u8]) -> Vec<T> {
    bytes.chunks_exact(T::SIZE).map(T::get_le).collect()
}

impl<C: Writable> Handle<C> {
    /// Writes `payload` as a frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is too large or the write fails.
    pub fn write_frame(&mut self, payload: &[u8]) -> StorageResult<()> {
        let frame = encode_frame(payload)?;
        self.write(&frame)
    }

    /// Writes one little-endian integer.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn write_le<T: LeScalar>(&mut self, value: T) -> StorageResult<()> {
        self.write(&encode_le_slice(&[value]))
    }

    /// Writes `values` back to back, little-endian.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn write_le_slice<T: LeScalar>(&mut self, values: &[T]) -> StorageResult<()> {
        self.write(&encode_le_slice(values))
    }

    /// Writes a little-endian `u32`.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn write_u32_le(&mut self, value: u32) -> StorageResult<()> {
        self.write_le(value)
    }

    /// Writes a little-endian `u64`.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn write_u64_le(&mut self, value: u64) -> StorageResult<()> {
        self.write_le(value)
    }
}

impl<C: Readable> Handle<C> {
    /// Reads one little-endian integer.
    ///
    /// # Errors
    ///
    /// Returns an error if fewer than `T::SIZE` bytes remain.
    pub fn read_le<T: LeScalar>(&mut self) -> StorageResult<T> {
        let mut bytes = [0u8; 8];
        self.read(&mut bytes[..T::SIZE])?;
        Ok(T::get_le(&bytes))
    }

    /// Reads `count` little-endian integers.
    ///
    /// # Errors
    ///
    /// Returns an error if fewer than `count * T::SIZE` bytes remain.
    pub fn read_le_vec<T: LeScalar>(&mut self, count: usize) -> StorageResult<Vec<T>> {
        let mut bytes = vec![0u8; count * T::SIZE];
        self.read(&mut bytes)?;
        Ok(decode_le_slice(&bytes))
    }

    /// Reads a little-endian `u32`.
    ///
    /// # Errors
    ///
    /// Returns an error if fewer than 4 bytes remain.
    pub fn read_u32_le(&mut self) -> StorageResult<u32> {
        self.read_le()
    }

    /// Reads a little-endian `u64`.
    ///
    /// # Errors
    ///
    /// Returns an error if fewer than 8 bytes remain.
    pub fn read_u64_le(&mut self) -> StorageResult<u64> {
        self.read_le()
    }

    /// Reads one frame and returns its payload.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Corrupted`] (flagging `CORRUPT`) if the
    /// leading length runs past the end or the trailing length disagrees.
    pub fn read_frame(&mut self) -> StorageResult<Vec<u8>> {
        let len = self.read_u32_le()?;
        let remaining = self.length()?.saturating_sub(self.tell()?);
        check_frame_len(len, remaining).inspect_err(|_| self.mark_corrupt())?;

        let mut payload = vec![0u8; len as usize];
        self.read(&mut payload)?;

        let trailer = self.read_u32_le()?;
        check_frame_trailer(len, trailer).inspect_err(|_| self.mark_corrupt())?;
        Ok(payload)
    }
}
