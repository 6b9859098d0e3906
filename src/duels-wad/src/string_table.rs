//! The deduplicated table of entry names.
//!
//! Names are stored as NUL-terminated Windows-1252 strings and
//! referenced by their byte offset from the start of the table.

use duels_utils::{align, binary, text};
use indexmap::IndexMap;

use crate::{error::checked_u32, WadError};

/// The alignment of the string table blob in the archive.
pub const STRING_TABLE_ALIGNMENT: usize = 16;

/// Access to a string table in either direction.
///
/// A table is either being built ([`StringTableWriter`]) or being
/// read ([`StringTableReader`]); calling the operation of the other
/// direction is a contract violation and always errors.
pub trait StringTable {
    /// Gets the string at byte `offset` in the table.
    fn get(&self, offset: u32) -> Result<String, WadError>;

    /// Interns `value` and returns its byte offset in the table.
    fn put(&mut self, value: &str) -> Result<u32, WadError>;
}

/// Builds a string table by interning values.
#[derive(Clone, Debug, Default)]
pub struct StringTableWriter {
    offsets: IndexMap<String, u32>,
    data: Vec<u8>,
}

impl StringTableWriter {
    /// Creates an empty string table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the number of unique strings in the table.
    #[inline]
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Whether no string was interned yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Consumes the table and returns its blob, padded to
    /// [`STRING_TABLE_ALIGNMENT`].
    pub fn finish(mut self) -> Vec<u8> {
        align::pad_to(&mut self.data, STRING_TABLE_ALIGNMENT);
        self.data
    }
}

impl StringTable for StringTableWriter {
    fn get(&self, _offset: u32) -> Result<String, WadError> {
        Err(WadError::Misuse("cannot read from a string table being written"))
    }

    fn put(&mut self, value: &str) -> Result<u32, WadError> {
        if let Some(&offset) = self.offsets.get(value) {
            return Ok(offset);
        }

        let encoded =
            text::encode_cp1252(value).ok_or_else(|| WadError::Unencodable(value.to_owned()))?;

        let offset = checked_u32(self.data.len())?;
        binary::write_cstr(&mut self.data, &encoded)?;
        self.offsets.insert(value.to_owned(), offset);

        Ok(offset)
    }
}

/// Resolves strings out of a materialized string table blob.
#[derive(Clone, Copy, Debug)]
pub struct StringTableReader<'a> {
    data: &'a [u8],
}

impl<'a> StringTableReader<'a> {
    /// Creates a reader over the raw table blob.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }
}

impl StringTable for StringTableReader<'_> {
    fn get(&self, offset: u32) -> Result<String, WadError> {
        self.data
            .get(offset as usize..)
            .and_then(|tail| binary::cstr(tail).ok())
            .map(|raw| text::decode_cp1252(raw).into_owned())
            .ok_or(WadError::StringOffset(offset))
    }

    fn put(&mut self, _value: &str) -> Result<u32, WadError> {
        Err(WadError::Misuse("cannot write to a string table being read"))
    }
}
