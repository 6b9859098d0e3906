//! The version-dependent section layout of archive headers.
//!
//! Reading and writing both walk [`SECTIONS`] in order and consult
//! [`Section::is_present`], so the two directions cannot drift apart.

use crate::types::{ArchiveFlags, Version};

/// A section of the archive header, up to and including the file table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Section {
    /// The [`MAGIC`](crate::types::MAGIC) value.
    Magic,
    /// The [`Version`] of the archive.
    Version,
    /// The [`ArchiveFlags`].
    Flags,
    /// Length-prefixed embedded XML blob.
    HeaderXml,
    /// Byte length of the padded string table.
    StringTableSize,
    /// String table bytes, in the position used by 0x2xx archives.
    StringTable,
    /// Count-prefixed data type table.
    DataTypes,
    /// Total file count followed by total directory count.
    Totals,
    /// Count-prefixed data-offset table.
    DataOffsets,
    /// String table bytes, in the position used by 0x100 archives.
    LegacyStringTable,
    /// The serialized forest of directory entries.
    FileTable,
}

/// Every section in stream order.
pub const SECTIONS: [Section; 11] = [
    Section::Magic,
    Section::Version,
    Section::Flags,
    Section::HeaderXml,
    Section::StringTableSize,
    Section::StringTable,
    Section::DataTypes,
    Section::Totals,
    Section::DataOffsets,
    Section::LegacyStringTable,
    Section::FileTable,
];

impl Section {
    /// Whether this section is encoded for the given `version`.
    ///
    /// `flags` must be the effective flags of the archive, see
    /// [`effective_flags`].
    pub fn is_present(self, version: Version, flags: ArchiveFlags) -> bool {
        match self {
            Self::Magic | Self::Version => true,
            Self::Flags => version.has_flags(),
            Self::HeaderXml => version.has_header_xml(),
            Self::StringTableSize => true,
            Self::StringTable => version >= Version::V200,
            Self::DataTypes => flags.contains(ArchiveFlags::HAS_DATA_TYPES),
            Self::Totals => true,
            Self::DataOffsets => version.has_data_offsets(),
            Self::LegacyStringTable => version == Version::V100,
            Self::FileTable => true,
        }
    }
}

/// Gets the flags as they will be observed by a reader.
///
/// Versions without a flags field always read back empty flags.
#[inline]
pub fn effective_flags(version: Version, flags: ArchiveFlags) -> ArchiveFlags {
    if version.has_flags() {
        flags
    } else {
        ArchiveFlags::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn present(version: Version, flags: ArchiveFlags) -> Vec<Section> {
        SECTIONS
            .into_iter()
            .filter(|s| s.is_present(version, effective_flags(version, flags)))
            .collect()
    }

    #[test]
    fn legacy_layout() {
        assert_eq!(
            present(Version::V100, ArchiveFlags::HAS_DATA_TYPES),
            [
                Section::Magic,
                Section::Version,
                Section::StringTableSize,
                Section::Totals,
                Section::LegacyStringTable,
                Section::FileTable,
            ]
        );
    }

    #[test]
    fn flags_only_from_0x101() {
        let sections = present(Version::V101, ArchiveFlags::HAS_DATA_TYPES);
        assert!(sections.contains(&Section::Flags));
        assert!(sections.contains(&Section::DataTypes));
        assert!(!sections.contains(&Section::StringTable));
        assert!(!sections.contains(&Section::LegacyStringTable));
        assert!(!sections.contains(&Section::DataOffsets));
    }

    #[test]
    fn full_layout() {
        assert_eq!(
            present(Version::V202, ArchiveFlags::HAS_DATA_TYPES),
            [
                Section::Magic,
                Section::Version,
                Section::Flags,
                Section::HeaderXml,
                Section::StringTableSize,
                Section::StringTable,
                Section::DataTypes,
                Section::Totals,
                Section::DataOffsets,
                Section::FileTable,
            ]
        );
        assert!(!present(Version::V201, ArchiveFlags::empty()).contains(&Section::HeaderXml));
    }
}
