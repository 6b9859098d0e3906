use std::io::{Read, Write};

use duels_utils::binary;

use crate::{
    error::checked_u32,
    glob,
    layout::{self, Section, SECTIONS},
    string_table::{StringTableReader, StringTableWriter},
    tree::{FileEntry, FileTable, ENTRY_SIZE},
    types::{ArchiveFlags, DataType, Version, MAGIC},
    WadError,
};

/// Representation of a WAD archive header.
///
/// This does not account for the stored file records which follow
/// after the structured part. Use [`Archive::file_data`] with the
/// raw archive bytes to get at them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Archive {
    /// The format version in use.
    pub version: Version,
    /// Archive-level configuration bits.
    ///
    /// Ignored on versions which do not encode flags.
    pub flags: ArchiveFlags,
    /// The embedded XML header blob, carried as opaque bytes.
    ///
    /// Always [`Some`] after parsing a version that encodes it, even
    /// when the blob is empty. [`None`] is written as an empty blob.
    pub header_xml: Option<Vec<u8>>,
    /// The data type table.
    pub data_types: Vec<DataType>,
    /// Absolute stream offsets of stored file records, indexed by
    /// [`FileEntry::offset_index`].
    pub data_offsets: Vec<u32>,
    /// The directory and file tree.
    pub files: FileTable,
}

impl Archive {
    /// Creates an empty archive.
    pub fn new(version: Version, flags: ArchiveFlags) -> Self {
        Self {
            version,
            flags,
            header_xml: None,
            data_types: Vec::new(),
            data_offsets: Vec::new(),
            files: FileTable::new(),
        }
    }

    /// Whether stored file records carry a length prefix and may be
    /// zlib-compressed.
    #[inline]
    pub fn has_compressed_files(&self) -> bool {
        self.effective_flags()
            .contains(ArchiveFlags::HAS_COMPRESSED_FILES)
    }

    #[inline]
    fn effective_flags(&self) -> ArchiveFlags {
        layout::effective_flags(self.version, self.flags)
    }

    /// Counts all files in the archive.
    #[inline]
    pub fn total_file_count(&self) -> usize {
        self.files.total_file_count()
    }

    /// Counts all directories in the archive.
    #[inline]
    pub fn total_directory_count(&self) -> usize {
        self.files.total_directory_count()
    }

    /// Reads and validates only the magic and the version.
    ///
    /// The magic is checked before any further byte is consumed.
    pub fn read_header<R: Read>(reader: &mut R) -> Result<Version, WadError> {
        let magic = binary::uint16(reader)?;
        if magic != MAGIC {
            return Err(WadError::BadMagic(magic));
        }

        binary::uint16(reader).map_err(Into::into).and_then(Version::try_from)
    }

    /// Parses the archive header from the given [`Read`]er.
    ///
    /// Archives older than 0x200 have no known data-offset table and
    /// are rejected with [`WadError::UnsupportedLayout`].
    pub fn parse<R: Read>(reader: &mut R) -> Result<Self, WadError> {
        let version = Self::read_header(reader)?;
        let mut archive = Self::new(version, ArchiveFlags::empty());

        let mut string_table_size = 0;
        let mut string_table = Vec::new();
        let mut declared_files = 0;
        let mut declared_directories = 0;

        for section in SECTIONS {
            if !section.is_present(version, archive.flags) {
                if section == Section::DataOffsets {
                    return Err(WadError::UnsupportedLayout(version));
                }
                continue;
            }

            match section {
                // Consumed by `read_header`.
                Section::Magic | Section::Version => (),

                Section::Flags => {
                    archive.flags = ArchiveFlags::from_bits_retain(binary::uint32(reader)?);
                }

                Section::HeaderXml => archive.header_xml = Some(binary::blob(reader)?),

                Section::StringTableSize => string_table_size = binary::uint32(reader)?,

                Section::StringTable | Section::LegacyStringTable => {
                    string_table = binary::bytes(reader, string_table_size as u64)?;
                }

                Section::DataTypes => {
                    let count = binary::uint32(reader)?;
                    archive.data_types = binary::seq(reader, count, DataType::parse)?;
                }

                Section::Totals => {
                    declared_files = binary::uint32(reader)?;
                    declared_directories = binary::uint32(reader)?;
                }

                Section::DataOffsets => {
                    let count = binary::uint32(reader)?;
                    archive.data_offsets = binary::seq(reader, count, binary::uint32)?;
                }

                Section::FileTable => {
                    let entries = declared_files as u64 + declared_directories as u64;
                    let region = binary::bytes(reader, entries * ENTRY_SIZE)?;

                    let strings = StringTableReader::new(&string_table);
                    archive.files = FileTable::parse(&region, &strings)?;
                }
            }
        }

        let files = checked_u32(archive.total_file_count())?;
        let directories = checked_u32(archive.total_directory_count())?;
        if files != declared_files || directories != declared_directories {
            return Err(WadError::CountMismatch {
                declared_files,
                declared_directories,
                files,
                directories,
            });
        }

        Ok(archive)
    }

    /// Writes the archive header to the given [`Write`]r.
    ///
    /// Stored file records are not written by this; see
    /// [`ArchiveBuilder`](crate::ArchiveBuilder) for producing a
    /// complete archive.
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<(), WadError> {
        let flags = self.effective_flags();

        // Names are interned while the file table is serialized, so
        // both blobs are complete before the header needs their sizes.
        let mut strings = StringTableWriter::new();
        let mut file_table = Vec::new();
        self.files.write(&mut file_table, &mut strings)?;
        let string_table = strings.finish();

        for section in SECTIONS {
            if !section.is_present(self.version, flags) {
                continue;
            }

            match section {
                Section::Magic => binary::write_uint16(writer, MAGIC)?,

                Section::Version => binary::write_uint16(writer, self.version.raw())?,

                Section::Flags => binary::write_uint32(writer, flags.bits())?,

                Section::HeaderXml => {
                    binary::write_blob(writer, self.header_xml.as_deref().unwrap_or_default())?;
                }

                Section::StringTableSize => {
                    binary::write_uint32(writer, checked_u32(string_table.len())?)?;
                }

                Section::StringTable | Section::LegacyStringTable => {
                    writer.write_all(&string_table)?;
                }

                Section::DataTypes => {
                    binary::write_seq(writer, true, &self.data_types, |w, t| t.write(w))?;
                }

                Section::Totals => {
                    binary::write_uint32(writer, checked_u32(self.total_file_count())?)?;
                    binary::write_uint32(writer, checked_u32(self.total_directory_count())?)?;
                }

                Section::DataOffsets => {
                    binary::write_seq(writer, true, &self.data_offsets, |w, &o| {
                        binary::write_uint32(w, o)
                    })?;
                }

                Section::FileTable => writer.write_all(&file_table)?,
            }
        }

        Ok(())
    }

    /// Gets the stored record of `file` out of the raw archive bytes.
    ///
    /// For archives with compressed files, pass the record through
    /// [`Inflater::unpack`](crate::Inflater::unpack) to get the
    /// file contents.
    pub fn file_data<'wad>(
        &self,
        raw_archive: &'wad [u8],
        file: &FileEntry,
    ) -> Result<&'wad [u8], WadError> {
        let offset = *self
            .data_offsets
            .get(file.offset_index as usize)
            .ok_or(WadError::OffsetIndex(file.offset_index))?;

        let start = offset as usize;
        raw_archive
            .get(start..start + file.size as usize)
            .ok_or(WadError::Record("data lies outside of the archive"))
    }

    /// Builds an iterator over `(path, file)` pairs in the archive where
    /// the path satisfies the given UNIX glob pattern.
    #[inline]
    pub fn iter_glob(&self, pattern: &str) -> Result<glob::GlobIter<'_>, glob::GlobError> {
        glob::GlobIter::new(self, pattern)
    }
}
