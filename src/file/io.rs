//! Bounds-checked little-endian reading of primitive values.
//!
//! Everything the metadata reader pulls out of an assembly (stream headers, table row counts,
//! heap indexes, signature bytes) goes through the helpers in this module. Every read checks
//! the remaining length first and reports [`crate::Error::OutOfBounds`] instead of panicking,
//! so a truncated or hostile file can only ever produce an error value.
//!
//! # Key Components
//!
//! - [`crate::file::io::CilIO`] - Conversion from fixed-size byte arrays for primitive types
//! - [`crate::file::io::read_le`] - Read a value from the start of a buffer
//! - [`crate::file::io::read_le_at`] - Read a value at an offset and advance the offset
//! - [`crate::file::io::read_le_at_dyn`] - Read a 2 or 4 byte heap/table index
//!
//! # Examples
//!
//! ```rust
//! use dotdeps::file::io::{read_le_at, read_le_at_dyn};
//!
//! let data = [0x01, 0x00, 0x02, 0x00, 0x00, 0x00];
//! let mut offset = 0;
//!
//! let small: u16 = read_le_at(&data, &mut offset)?;
//! let large = read_le_at_dyn(&data, &mut offset, true)?;
//! assert_eq!((small, large, offset), (1, 2, 6));
//! # Ok::<(), dotdeps::Error>(())
//! ```

use crate::{Error::OutOfBounds, Result};

/// Trait for type-specific safe binary data reading operations.
///
/// Each implementation names the fixed-size byte array (`[u8; 4]` for `u32`, ...) that the
/// value is decoded from.
pub trait CilIO: Sized {
    /// Associated type representing the byte array type for this numeric type.
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

impl_cil_io!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

/// Safely reads a value of type `T` in little-endian byte order from the start of `data`.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if there are insufficient bytes.
pub fn read_le<T: CilIO>(data: &[u8]) -> Result<T> {
    let mut offset = 0_usize;
    read_le_at(data, &mut offset)
}

/// Safely reads a value of type `T` in little-endian byte order at `offset`.
///
/// The offset is advanced by the size of `T` on success and left untouched on failure.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if there are insufficient bytes.
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

/// Dynamically reads either a 2-byte or 4-byte value in little-endian byte order.
///
/// Metadata heap and table indexes are 2 bytes wide unless the heap or table is large; the
/// narrow form is promoted to `u32` so callers handle a single type.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if there are insufficient bytes.
pub fn read_le_at_dyn(data: &[u8], offset: &mut usize, is_large: bool) -> Result<u32> {
    let res = if is_large {
        read_le_at::<u32>(data, offset)?
    } else {
        u32::from(read_le_at::<u16>(data, offset)?)
    };

    Ok(res)
}
