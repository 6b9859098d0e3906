//! Utilities for reading and writing structured binary data.
//!
//! Every multi-byte value is encoded in little-endian byte order.

use std::{
    io::{self, Read, Write},
    mem,
};

macro_rules! int_read_impl {
    ($($fn:ident() -> $ty:ty),* $(,)*) => {
        $(
            #[doc = concat!("Parses a [`", stringify!($ty), "`] value off the data stream.")]
            #[inline]
            pub fn $fn<R: Read>(data: &mut R) -> io::Result<$ty> {
                let mut v = [0; mem::size_of::<$ty>()];
                data.read_exact(&mut v)?;
                Ok(<$ty>::from_le_bytes(v))
            }
        )*
    };
}

macro_rules! int_write_impl {
    ($($fn:ident($ty:ty)),* $(,)*) => {
        $(
            #[doc = concat!("Writes a [`", stringify!($ty), "`] value to the data stream.")]
            #[inline]
            pub fn $fn<W: Write>(out: &mut W, v: $ty) -> io::Result<()> {
                out.write_all(&v.to_le_bytes())
            }
        )*
    };
}

int_read_impl! {
    uint16() -> u16,
    uint32() -> u32,
    int32() -> i32,
}

int_write_impl! {
    write_uint16(u16),
    write_uint32(u32),
    write_int32(i32),
}

/// Reads exactly `len` raw bytes off the data stream.
///
/// The buffer grows with the data actually read, so a bogus length
/// in a corrupted stream fails with EOF instead of a huge allocation.
#[inline]
pub fn bytes<R: Read>(data: &mut R, len: u64) -> io::Result<Vec<u8>> {
    let mut v = Vec::new();
    data.take(len).read_to_end(&mut v)?;

    if v.len() as u64 != len {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "Premature EOF while reading byte blob",
        ));
    }

    Ok(v)
}

/// Reads a `u32`-length-prefixed byte blob off the data stream.
#[inline]
pub fn blob<R: Read>(data: &mut R) -> io::Result<Vec<u8>> {
    uint32(data).and_then(|len| bytes(data, len as u64))
}

/// Writes a `u32`-length-prefixed byte blob to the output stream.
#[inline]
pub fn write_blob<W: Write>(out: &mut W, v: &[u8]) -> io::Result<()> {
    let len = u32::try_from(v.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "Blob too large to encode"))?;

    write_uint32(out, len)?;
    out.write_all(v)
}

/// Slices a NUL-terminated byte string off the start of `data`.
///
/// The terminator itself is not part of the returned slice. Fails
/// when `data` holds no terminator at all.
#[inline]
pub fn cstr(data: &[u8]) -> io::Result<&[u8]> {
    data.iter()
        .position(|&b| b == 0)
        .map(|end| &data[..end])
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                "Expected null terminator for string",
            )
        })
}

/// Writes `v` followed by a NUL terminator to the output stream.
#[inline]
pub fn write_cstr<W: Write>(out: &mut W, v: &[u8]) -> io::Result<()> {
    out.write_all(v)?;
    out.write_all(&[0])
}

/// Parses a sequence of `count` elements using the given parser.
///
/// The parser function freely defines how to parse one element
/// of the sequence.
#[inline]
pub fn seq<F, R, T>(data: &mut R, count: u32, mut f: F) -> io::Result<Vec<T>>
where
    F: FnMut(&mut R) -> io::Result<T>,
    R: Read,
{
    // Don't trust `count` for preallocation; it comes off the wire.
    let mut out = Vec::with_capacity((count as usize).min(1024));
    for _ in 0..count {
        let element = f(data)?;
        out.push(element);
    }
    Ok(out)
}

/// Writes all elements of `seq` using the given writer function,
/// optionally prefixed by the `u32` element count.
#[inline]
pub fn write_seq<F, T, W>(out: &mut W, prefixed: bool, seq: &[T], mut f: F) -> io::Result<()>
where
    F: FnMut(&mut W, &T) -> io::Result<()>,
    W: Write,
{
    if prefixed {
        let len = u32::try_from(seq.len()).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidInput, "Sequence too long to encode")
        })?;
        write_uint32(out, len)?;
    }
    for v in seq {
        f(out, v)?;
    }

    Ok(())
}
