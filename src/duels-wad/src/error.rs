use std::io;

use libdeflater::{CompressionError, DecompressionError};
use thiserror::Error;

use crate::types::Version;

/// Broad categories of [`WadError`]s.
///
/// Every error is fatal; the categories only tell callers whether
/// the input, the archive variant or their own usage is at fault.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad magic or an unknown format version.
    MalformedHeader,
    /// The version is known but its layout cannot be processed.
    UnsupportedLayout,
    /// The stream contradicts itself or uses an unsupported variant.
    StructuralInconsistency,
    /// An API was used in a way its contract forbids.
    ContractMisuse,
    /// Caller-provided data cannot be represented in an archive.
    InvalidInput,
    /// The zlib codec rejected its input.
    Codec,
    /// The underlying stream failed.
    Io,
}

/// Errors that may occur when working with WAD archives.
#[derive(Debug, Error)]
pub enum WadError {
    /// An I/O operation on the underlying stream failed.
    #[error("{0}")]
    Io(#[from] io::Error),

    /// The stream does not start with the WAD magic.
    #[error("invalid WAD magic (0x{0:04X})")]
    BadMagic(u16),

    /// The format version is not one of the known revisions.
    #[error("invalid or unsupported version (0x{0:04X})")]
    UnknownVersion(u16),

    /// The data-offset table layout of this version is unknown.
    #[error("reading archives of version {0} is not implemented")]
    UnsupportedLayout(Version),

    /// A field that must be zero holds a different value.
    #[error("reserved {field} field is {value}, expected 0")]
    Reserved { field: &'static str, value: u32 },

    /// A file spans a number of data offsets other than one.
    #[error("file references {0} data offsets; only single-part files are supported")]
    OffsetCount(u8),

    /// A file references a data offset slot that does not exist.
    #[error("data offset index {0} is out of range")]
    OffsetIndex(u32),

    /// The entry totals in the header disagree with the file table.
    #[error(
        "header declares {declared_files} files in {declared_directories} directories, \
         file table holds {files} files in {directories} directories"
    )]
    CountMismatch {
        declared_files: u32,
        declared_directories: u32,
        files: u32,
        directories: u32,
    },

    /// The file table region was not consumed exactly.
    #[error("file table spans {actual} bytes, expected {expected}")]
    FileTableSize { expected: u64, actual: u64 },

    /// Entries in the file table run past the end of its region.
    #[error("file table entries overrun the {0} byte region")]
    FileTableOverrun(u64),

    /// A name offset does not point at a terminated string.
    #[error("invalid string table offset {0}")]
    StringOffset(u32),

    /// A stored file record is malformed.
    #[error("malformed file record: {0}")]
    Record(&'static str),

    /// Serializing the header again produced a different length.
    #[error("header length changed from {before} to {after} bytes between passes")]
    HeaderLength { before: u64, after: u64 },

    /// An API was called in a way its contract forbids.
    #[error("contract violation: {0}")]
    Misuse(&'static str),

    /// A name contains characters outside of Windows-1252.
    #[error("name '{0}' cannot be encoded in Windows-1252")]
    Unencodable(String),

    /// A path was rejected while building an archive.
    #[error("invalid archive path '{0}'")]
    InvalidPath(String),

    /// Two files were added under the same path.
    #[error("duplicate archive path '{0}'")]
    DuplicatePath(String),

    /// The archive outgrew the ranges of its 32-bit fields.
    #[error("archive too large to represent")]
    TooLarge,

    /// Compression of a file's contents failed.
    #[error("failed to compress file: {0}")]
    Compress(#[from] CompressionError),

    /// Decompression of a file's contents failed.
    #[error("failed to decompress file: {0}")]
    Decompress(#[from] DecompressionError),
}

impl WadError {
    /// Gets the [`ErrorKind`] this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(..) => ErrorKind::Io,
            Self::BadMagic(..) | Self::UnknownVersion(..) => ErrorKind::MalformedHeader,
            Self::UnsupportedLayout(..) => ErrorKind::UnsupportedLayout,
            Self::Reserved { .. }
            | Self::OffsetCount(..)
            | Self::OffsetIndex(..)
            | Self::CountMismatch { .. }
            | Self::FileTableSize { .. }
            | Self::FileTableOverrun(..)
            | Self::StringOffset(..)
            | Self::Record(..)
            | Self::HeaderLength { .. } => ErrorKind::StructuralInconsistency,
            Self::Misuse(..) => ErrorKind::ContractMisuse,
            Self::Unencodable(..)
            | Self::InvalidPath(..)
            | Self::DuplicatePath(..)
            | Self::TooLarge => ErrorKind::InvalidInput,
            Self::Compress(..) | Self::Decompress(..) => ErrorKind::Codec,
        }
    }
}

#[inline(always)]
pub(crate) fn checked_u32(x: usize) -> Result<u32, WadError> {
    u32::try_from(x).or(Err(WadError::TooLarge))
}
