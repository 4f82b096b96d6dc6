//! Low-level, bounds-checked little-endian reads for metadata parsing.
//!
//! Every multi-byte integer in the metadata root, the stream headers, the tables heap and
//! method headers is stored little-endian. The functions in this module read such values
//! from a byte slice, either from its start ([`read_le`]) or from a caller-maintained cursor
//! which is advanced past the value ([`read_le_at`]).
//!
//! Reads never panic: whenever fewer bytes remain than the type requires,
//! [`crate::Error::OutOfBounds`] is returned and the cursor is left untouched.
//!
//! # Examples
//!
//! ```rust
//! use cilmeta::file::io::{read_le_at, read_le_at_width};
//!
//! let data = [0x01, 0x00, 0x02, 0x00, 0x00, 0x00];
//! let mut offset = 0;
//!
//! let small: u16 = read_le_at(&data, &mut offset)?;
//! let large = read_le_at_width(&data, &mut offset, 4)?;
//! assert_eq!((small, large, offset), (1, 2, 6));
//! # Ok::<(), cilmeta::Error>(())
//! ```

use crate::{Error::OutOfBounds, Result};

/// Trait for primitive integers that can be decoded from a little-endian byte array.
///
/// Implemented for every integer width that appears in the metadata format.
pub trait CilIO: Sized {
    /// Fixed-size byte array holding one encoded value
    type Bytes: Sized + for<'a> TryFrom<&'a [u8]>;

    /// Read T from a byte buffer in little-endian
    fn from_le_bytes(bytes: Self::Bytes) -> Self;
}

macro_rules! impl_cil_io {
    ($($ty:ty),*) => {
        $(
            impl CilIO for $ty {
                type Bytes = [u8; std::mem::size_of::<$ty>()];

                fn from_le_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_le_bytes(bytes)
                }
            }
        )*
    };
}

impl_cil_io!(u8, i8, u16, i16, u32, i32, u64, i64);

/// Safely reads a value of type `T` in little-endian byte order from the start of a buffer.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the buffer is shorter than `T`.
pub fn read_le<T: CilIO>(data: &[u8]) -> Result<T> {
    let mut offset = 0_usize;
    read_le_at(data, &mut offset)
}

/// Safely reads a value of type `T` in little-endian byte order at `offset`, advancing the
/// offset by the size of `T`.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if fewer than `size_of::<T>()` bytes remain.
pub fn read_le_at<T: CilIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let type_len = std::mem::size_of::<T>();
    let Some(end) = offset.checked_add(type_len) else {
        return Err(OutOfBounds);
    };

    if end > data.len() {
        return Err(OutOfBounds);
    }

    let Ok(read) = data[*offset..end].try_into() else {
        return Err(OutOfBounds);
    };

    *offset = end;

    Ok(T::from_le_bytes(read))
}

/// Reads a column value of `width` bytes (1, 2 or 4) and widens it to `u32`.
///
/// This is the single entry point used for every table column, so that all values end up
/// at the same canonical in-memory width regardless of their on-disk size.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the buffer is too short, or
/// [`crate::Error::Error`] for an unsupported width.
pub fn read_le_at_width(data: &[u8], offset: &mut usize, width: u8) -> Result<u32> {
    match width {
        1 => Ok(u32::from(read_le_at::<u8>(data, offset)?)),
        2 => Ok(u32::from(read_le_at::<u16>(data, offset)?)),
        4 => read_le_at::<u32>(data, offset),
        _ => Err(crate::Error::Error(format!("Unsupported column width - {width}"))),
    }
}
