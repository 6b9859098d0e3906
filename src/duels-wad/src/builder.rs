use std::io::{Seek, SeekFrom, Write};

use crate::{
    deflater::Deflater,
    error::checked_u32,
    tree::{DirId, MAX_OFFSET_INDEX},
    types::{ArchiveFlags, Version},
    Archive, WadError,
};

/// Handle to a file added to an [`ArchiveBuilder`].
///
/// Equal to the file's [`offset_index`](crate::FileEntry::offset_index).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FileId(u32);

impl FileId {
    /// Gets the data-offset slot reserved for the file.
    #[inline]
    pub fn offset_index(self) -> u32 {
        self.0
    }
}

/// A builder for programatically creating WAD archives.
///
/// All files must be added before any data is written, because the
/// header size depends on the complete tree. Writing then happens in
/// two passes through an [`ArchiveWriter`]: a placeholder header,
/// the stored file records, and finally the patched header.
pub struct ArchiveBuilder {
    archive: Archive,

    // Where each file lives in the tree, indexed by `FileId`.
    locations: Vec<(DirId, usize)>,
}

impl ArchiveBuilder {
    /// Creates a new builder for an empty archive.
    ///
    /// `flags` will be ignored on versions which do not encode them.
    pub fn new(version: Version, flags: ArchiveFlags) -> Self {
        Self {
            archive: Archive::new(version, flags),
            locations: Vec::new(),
        }
    }

    /// Sets the opaque XML header blob embedded in 0x202 archives.
    pub fn with_header_xml(mut self, xml: Vec<u8>) -> Self {
        self.archive.header_xml = Some(xml);
        self
    }

    /// Gets the number of files added so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// Whether no files were added yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Adds a file under `path` and reserves its data-offset slot.
    ///
    /// `path` components may be separated by `/` or `\`. Missing
    /// directories are created on the way. A file without directory
    /// components is placed into a top-level directory with an empty
    /// name.
    pub fn add_file(&mut self, path: &str) -> Result<FileId, WadError> {
        let mut components: Vec<&str> = path.split(['/', '\\']).collect();
        let name = components.pop().unwrap_or_default();
        if name.is_empty() || components.iter().any(|c| c.is_empty()) {
            return Err(WadError::InvalidPath(path.to_owned()));
        }
        if components.is_empty() {
            components.push("");
        }

        let index = checked_u32(self.locations.len())?;
        if index > MAX_OFFSET_INDEX {
            return Err(WadError::TooLarge);
        }

        let table = &mut self.archive.files;
        let mut parent = None;
        for component in components {
            let dir = match table.find_directory(parent, component) {
                Some(dir) => dir,
                None => table.add_directory(parent, component),
            };
            parent = Some(dir);
        }

        let dir = parent.ok_or_else(|| WadError::InvalidPath(path.to_owned()))?;
        if table.directory(dir).files().iter().any(|f| f.name == name) {
            return Err(WadError::DuplicatePath(path.to_owned()));
        }

        table.add_file(dir, name, index);
        self.archive.data_offsets.push(0);
        self.locations.push((dir, table.directory(dir).files().len() - 1));

        Ok(FileId(index))
    }

    /// Writes the placeholder header at the current position of `out`
    /// and returns the writer for the stored file records.
    pub fn begin<W: Write + Seek>(self, mut out: W) -> Result<ArchiveWriter<W>, WadError> {
        let start = out.stream_position()?;
        self.archive.write(&mut out)?;
        let header_len = out.stream_position()? - start;

        Ok(ArchiveWriter {
            written: vec![false; self.locations.len()],
            archive: self.archive,
            locations: self.locations,
            out,
            start,
            header_len,
            deflater: Deflater::new(),
            scratch: Vec::new(),
        })
    }
}

/// The second stage of building an archive, created by
/// [`ArchiveBuilder::begin`].
///
/// Every file must be written exactly once before calling
/// [`ArchiveWriter::finish`].
pub struct ArchiveWriter<W> {
    archive: Archive,
    locations: Vec<(DirId, usize)>,
    written: Vec<bool>,

    out: W,
    start: u64,
    header_len: u64,

    deflater: Deflater,
    scratch: Vec<u8>,
}

impl<W: Write + Seek> ArchiveWriter<W> {
    /// Gets the archive header as it will be written.
    #[inline]
    pub fn archive(&self) -> &Archive {
        &self.archive
    }

    /// Writes the contents of a file at the current stream position.
    ///
    /// When the archive has compressed files, `contents` are packed
    /// into a length-prefixed record first.
    pub fn write_file(&mut self, id: FileId, contents: &[u8]) -> Result<(), WadError> {
        if !self.archive.has_compressed_files() {
            return self.write_stored(id, contents);
        }

        let mut record = std::mem::take(&mut self.scratch);
        record.clear();

        let res = self
            .deflater
            .pack(contents, &mut record)
            .and_then(|()| self.write_stored(id, &record));

        self.scratch = record;
        res
    }

    /// Writes an already encoded record for a file at the current
    /// stream position.
    ///
    /// For archives with compressed files, `record` must be produced
    /// by [`Deflater::pack`].
    pub fn write_stored(&mut self, id: FileId, record: &[u8]) -> Result<(), WadError> {
        let slot = self
            .written
            .get_mut(id.0 as usize)
            .ok_or(WadError::Misuse("file handle from another builder"))?;
        if *slot {
            return Err(WadError::Misuse("file data written twice"));
        }

        let offset = u32::try_from(self.out.stream_position()?).or(Err(WadError::TooLarge))?;
        let size = checked_u32(record.len())?;
        self.out.write_all(record)?;

        *slot = true;
        self.archive.data_offsets[id.0 as usize] = offset;

        let (dir, pos) = self.locations[id.0 as usize];
        self.archive.files.directory_mut(dir).files_mut()[pos].size = size;

        Ok(())
    }

    /// Rewrites the header with the final offsets and sizes and
    /// leaves the stream positioned at the end of the archive.
    ///
    /// Returns the final archive header and the output stream.
    pub fn finish(mut self) -> Result<(Archive, W), WadError> {
        if self.written.iter().any(|&w| !w) {
            return Err(WadError::Misuse("file data was never written"));
        }

        let end = self.out.stream_position()?;
        self.out.seek(SeekFrom::Start(self.start))?;
        self.archive.write(&mut self.out)?;

        let header_len = self.out.stream_position()? - self.start;
        if header_len != self.header_len {
            return Err(WadError::HeaderLength {
                before: self.header_len,
                after: header_len,
            });
        }

        self.out.seek(SeekFrom::Start(end))?;
        self.out.flush()?;

        Ok((self.archive, self.out))
    }
}
