use duels_utils::binary;
use libdeflater::{DecompressionError, Decompressor};

use crate::WadError;

/// Length prefix marking a record that is stored uncompressed.
pub const STORED_UNCOMPRESSED: i32 = -1;

/// The most a deflate stream can expand its input by.
pub const MAX_INFLATE_RATIO: usize = 1032;

/// A zlib inflater for unpacking stored file records.
///
/// This maintains an internal scratch buffer whose allocation
/// will be re-used for subsequent decompression on the same
/// [`Inflater`] object.
///
/// This however comes at the caveat that only one decompressed
/// file can be borrowed from the inflater at a time.
pub struct Inflater {
    raw: Decompressor,
    scratch: Vec<u8>,
}

impl Inflater {
    /// Creates a new inflater for zlib decompression.
    pub fn new() -> Self {
        Self {
            raw: Decompressor::new(),
            scratch: Vec::new(),
        }
    }

    /// Decompresses the given `data` into the internal scratch
    /// buffer and returns a reference to it.
    ///
    /// `size_hint` must be the size of inflated output, otherwise
    /// this method will error.
    pub fn decompress(
        &mut self,
        data: &[u8],
        size_hint: usize,
    ) -> Result<&[u8], DecompressionError> {
        self.scratch.resize(size_hint, 0);

        let written = self.raw.zlib_decompress(data, &mut self.scratch)?;
        if written != size_hint {
            return Err(DecompressionError::BadData);
        }

        Ok(&self.scratch)
    }

    /// Unpacks a length-prefixed record from an archive with
    /// compressed files and returns the original file contents.
    ///
    /// A prefix of [`STORED_UNCOMPRESSED`] yields the rest of the
    /// record as-is; any other non-negative prefix is the inflated
    /// length of the zlib stream following it. Prefixes beyond
    /// [`MAX_INFLATE_RATIO`] times the stream size are rejected
    /// before any memory is reserved for them.
    pub fn unpack<'a>(&'a mut self, record: &'a [u8]) -> Result<&'a [u8], WadError> {
        if record.len() < 4 {
            return Err(WadError::Record("missing length prefix"));
        }

        let (mut prefix, data) = record.split_at(4);
        match binary::int32(&mut prefix)? {
            STORED_UNCOMPRESSED => Ok(data),
            len if len >= 0 => {
                let len = len as usize;
                if len > data.len().saturating_mul(MAX_INFLATE_RATIO) {
                    return Err(WadError::Record(
                        "length prefix exceeds what the data can inflate to",
                    ));
                }

                self.decompress(data, len).map_err(Into::into)
            }
            _ => Err(WadError::Record("negative length prefix")),
        }
    }
}

impl Default for Inflater {
    fn default() -> Self {
        Self::new()
    }
}
