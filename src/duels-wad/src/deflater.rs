use duels_utils::binary;
use libdeflater::{CompressionError, CompressionLvl, Compressor};

use crate::{inflater::STORED_UNCOMPRESSED, WadError};

/// A zlib deflater for packing file records of archives with
/// compressed files.
///
/// This maintains an internal scratch buffer whose memory will be
/// reused for subsequent compressions with the same [`Deflater`]
/// instance.
pub struct Deflater {
    compressor: Compressor,
    scratch: Vec<u8>,
}

impl Deflater {
    /// Creates an empty deflater at best compression level.
    pub fn new() -> Self {
        Self {
            compressor: Compressor::new(CompressionLvl::best()),
            scratch: Vec::new(),
        }
    }

    /// Compresses a raw buffer into the inner scratch buffer and
    /// returns the subset of the slice occupied by it.
    pub fn compress(&mut self, data: &[u8]) -> Result<&[u8], CompressionError> {
        let max_size = self.compressor.zlib_compress_bound(data.len());
        self.scratch.resize(max_size, 0);

        let real_size = self.compressor.zlib_compress(data, &mut self.scratch)?;
        debug_assert!(real_size <= max_size);

        Ok(&self.scratch[..real_size])
    }

    /// Appends the stored record for `contents` to `out`.
    ///
    /// The record is the zlib-compressed data behind its inflated
    /// length, unless compression does not make the data strictly
    /// smaller. Then the raw data is stored behind a prefix of
    /// [`STORED_UNCOMPRESSED`].
    pub fn pack(&mut self, contents: &[u8], out: &mut Vec<u8>) -> Result<(), WadError> {
        let len = i32::try_from(contents.len()).or(Err(WadError::TooLarge))?;
        let compressed = self.compress(contents)?;

        if compressed.len() < contents.len() {
            binary::write_int32(out, len)?;
            out.extend_from_slice(compressed);
        } else {
            binary::write_int32(out, STORED_UNCOMPRESSED)?;
            out.extend_from_slice(contents);
        }

        Ok(())
    }
}

impl Default for Deflater {
    fn default() -> Self {
        Self::new()
    }
}
