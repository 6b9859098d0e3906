//! Common types and structures in the WAD format.

use std::{fmt, io};

use bitflags::bitflags;
use duels_utils::binary;

use crate::WadError;

/// The magic value every archive starts with.
pub const MAGIC: u16 = 0x1234;

/// The on-disk revisions of the WAD format.
///
/// Variants are ordered by their numeric value, so version ranges
/// can be expressed with comparison operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum Version {
    V100 = 0x100,
    V101 = 0x101,
    V200 = 0x200,
    V201 = 0x201,
    V202 = 0x202,
}

impl Version {
    /// All known versions, in ascending order.
    pub const ALL: [Version; 5] = [
        Version::V100,
        Version::V101,
        Version::V200,
        Version::V201,
        Version::V202,
    ];

    /// Gets the raw numeric value of the version.
    #[inline]
    pub const fn raw(self) -> u16 {
        self as u16
    }

    /// Whether archive flags are encoded in the header.
    #[inline]
    pub fn has_flags(self) -> bool {
        self == Self::V101 || self >= Self::V200
    }

    /// Whether the embedded XML header blob is encoded.
    #[inline]
    pub fn has_header_xml(self) -> bool {
        self >= Self::V202
    }

    /// Whether the header carries a data-offset table.
    #[inline]
    pub fn has_data_offsets(self) -> bool {
        self >= Self::V200
    }
}

impl TryFrom<u16> for Version {
    type Error = WadError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|v| v.raw() == value)
            .ok_or(WadError::UnknownVersion(value))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:X}", self.raw())
    }
}

bitflags! {
    /// Archive-level configuration bits.
    ///
    /// Bits without a name are retained as-is when reading.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    #[repr(transparent)]
    pub struct ArchiveFlags: u32 {
        /// Every stored file is prefixed by its decompressed length.
        const HAS_COMPRESSED_FILES = 1 << 0;
        /// The header carries a data type table.
        const HAS_DATA_TYPES = 1 << 1;
        /// Set on every archive shipped with the game; meaning unknown.
        const UNKNOWN6_OBSERVED = 1 << 6;
    }
}

impl ArchiveFlags {
    /// Gets the bits which do not correspond to any known flag.
    #[inline]
    pub fn unknown_bits(self) -> u32 {
        self.bits() & !Self::all().bits()
    }
}

/// An entry in the data type table of an archive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DataType {
    /// The index of the data type.
    pub index: u32,
    /// Unknown value; carried through unchanged.
    pub reserved: u32,
}

impl DataType {
    pub(crate) fn parse<R: io::Read>(reader: &mut R) -> io::Result<Self> {
        Ok(Self {
            index: binary::uint32(reader)?,
            reserved: binary::uint32(reader)?,
        })
    }

    pub(crate) fn write<W: io::Write>(&self, writer: &mut W) -> io::Result<()> {
        binary::write_uint32(writer, self.index)?;
        binary::write_uint32(writer, self.reserved)
    }
}
