//! The file table: a forest of directories holding file entries.
//!
//! Directories live in an arena owned by [`FileTable`] and are
//! addressed by [`DirId`]. Ownership flows strictly from a parent to
//! its children; the parent links are plain indices.

use std::{
    io::{self, Read, Write},
    slice,
};

use duels_utils::binary;

use crate::{error::checked_u32, string_table::StringTable, WadError};

/// The byte size of one serialized directory or file entry.
pub const ENTRY_SIZE: u64 = 16;

/// Maximum value of [`FileEntry::offset_index`].
pub const MAX_OFFSET_INDEX: u32 = (1 << 24) - 1;

/// Handle to a directory in a [`FileTable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DirId(usize);

/// Metadata for a file stored in an archive.
#[derive(Clone, Debug)]
pub struct FileEntry {
    /// The name of the file within its directory.
    pub name: String,
    /// The byte length of the stored record.
    ///
    /// For archives with compressed files, this includes the 4-byte
    /// length prefix of the record.
    pub size: u32,
    /// Index into the archive's data-offset table.
    pub offset_index: u32,
    /// Number of consecutive data offsets used by the file.
    ///
    /// Always 1; multi-part files are not supported.
    pub offset_count: u8,
    /// Unknown field, zero in every known archive.
    pub reserved: u32,

    directory: DirId,
}

impl FileEntry {
    /// Gets the directory this file is stored in.
    #[inline]
    pub fn directory(&self) -> DirId {
        self.directory
    }

    fn packed_offset(&self) -> Result<u32, WadError> {
        if self.offset_index > MAX_OFFSET_INDEX {
            return Err(WadError::TooLarge);
        }

        Ok(self.offset_index | (self.offset_count as u32) << 24)
    }

    fn write<W: Write, S: StringTable>(
        &self,
        writer: &mut W,
        strings: &mut S,
    ) -> Result<(), WadError> {
        binary::write_uint32(writer, strings.put(&self.name)?)?;
        binary::write_uint32(writer, self.size)?;
        binary::write_uint32(writer, self.packed_offset()?)?;
        binary::write_uint32(writer, self.reserved)?;

        Ok(())
    }

    fn parse<R: Read, S: StringTable>(
        reader: &mut R,
        directory: DirId,
        strings: &S,
    ) -> Result<Self, WadError> {
        let name = strings.get(binary::uint32(reader)?)?;
        let size = binary::uint32(reader)?;
        let packed = binary::uint32(reader)?;
        let reserved = binary::uint32(reader)?;

        let file = Self {
            name,
            size,
            offset_index: packed & MAX_OFFSET_INDEX,
            offset_count: (packed >> 24) as u8,
            reserved,
            directory,
        };

        if file.offset_count != 1 {
            return Err(WadError::OffsetCount(file.offset_count));
        }
        if file.reserved != 0 {
            return Err(WadError::Reserved {
                field: "file entry",
                value: file.reserved,
            });
        }

        Ok(file)
    }
}

// The directory back-reference is an arena position and depends on
// insertion order, so it does not take part in equality.
impl PartialEq for FileEntry {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.size == other.size
            && self.offset_index == other.offset_index
            && self.offset_count == other.offset_count
            && self.reserved == other.reserved
    }
}

impl Eq for FileEntry {}

/// A directory node in a [`FileTable`].
#[derive(Clone, Debug)]
pub struct DirectoryEntry {
    /// The name of the directory within its parent.
    pub name: String,
    parent: Option<DirId>,
    children: Vec<DirId>,
    files: Vec<FileEntry>,
}

impl DirectoryEntry {
    /// Gets the parent directory, or [`None`] for top-level entries.
    #[inline]
    pub fn parent(&self) -> Option<DirId> {
        self.parent
    }

    /// Gets the child directories in stream order.
    #[inline]
    pub fn children(&self) -> &[DirId] {
        &self.children
    }

    /// Gets the files directly inside this directory.
    #[inline]
    pub fn files(&self) -> &[FileEntry] {
        &self.files
    }

    /// Gets mutable access to the files directly inside this directory.
    #[inline]
    pub fn files_mut(&mut self) -> &mut [FileEntry] {
        &mut self.files
    }
}

#[derive(Clone, Copy)]
struct Frame {
    id: DirId,
    directories: u32,
    files: u32,
}

/// The forest of top-level directories making up an archive's
/// file table.
#[derive(Clone, Debug, Default)]
pub struct FileTable {
    nodes: Vec<DirectoryEntry>,
    roots: Vec<DirId>,
}

impl FileTable {
    /// Creates an empty file table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the top-level directories in stream order.
    #[inline]
    pub fn roots(&self) -> &[DirId] {
        &self.roots
    }

    /// Gets a directory by its handle.
    ///
    /// # Panics
    ///
    /// Panics when `id` was not produced by this table.
    #[inline]
    pub fn directory(&self, id: DirId) -> &DirectoryEntry {
        &self.nodes[id.0]
    }

    /// Gets a directory by its handle for modification.
    ///
    /// # Panics
    ///
    /// Panics when `id` was not produced by this table.
    #[inline]
    pub fn directory_mut(&mut self, id: DirId) -> &mut DirectoryEntry {
        &mut self.nodes[id.0]
    }

    /// Appends a new directory to `parent`, or to the top-level list
    /// when `parent` is [`None`].
    pub fn add_directory(&mut self, parent: Option<DirId>, name: impl Into<String>) -> DirId {
        let id = DirId(self.nodes.len());
        self.nodes.push(DirectoryEntry {
            name: name.into(),
            parent,
            children: Vec::new(),
            files: Vec::new(),
        });

        match parent {
            Some(p) => self.nodes[p.0].children.push(id),
            None => self.roots.push(id),
        }

        id
    }

    /// Finds a directory by name among the children of `parent`, or
    /// among the top-level directories when `parent` is [`None`].
    pub fn find_directory(&self, parent: Option<DirId>, name: &str) -> Option<DirId> {
        let candidates = match parent {
            Some(p) => &self.nodes[p.0].children,
            None => &self.roots,
        };

        candidates
            .iter()
            .copied()
            .find(|&id| self.nodes[id.0].name == name)
    }

    /// Appends a new single-part file to `directory` and returns it
    /// for further initialization.
    pub fn add_file(
        &mut self,
        directory: DirId,
        name: impl Into<String>,
        offset_index: u32,
    ) -> &mut FileEntry {
        let files = &mut self.nodes[directory.0].files;
        files.push(FileEntry {
            name: name.into(),
            size: 0,
            offset_index,
            offset_count: 1,
            reserved: 0,
            directory,
        });

        let last = files.len() - 1;
        &mut files[last]
    }

    /// Visits every directory reachable from the top-level list,
    /// parents before children.
    pub fn walk(&self) -> impl Iterator<Item = DirId> + '_ {
        let mut stack: Vec<DirId> = self.roots.iter().rev().copied().collect();
        std::iter::from_fn(move || {
            let id = stack.pop()?;
            stack.extend(self.nodes[id.0].children.iter().rev());
            Some(id)
        })
    }

    /// Counts all files reachable in the forest.
    pub fn total_file_count(&self) -> usize {
        self.walk().map(|id| self.nodes[id.0].files.len()).sum()
    }

    /// Counts all directories in the forest, top-level ones included.
    pub fn total_directory_count(&self) -> usize {
        self.walk().count()
    }

    /// Iterates over all files, each directory's own files before
    /// those of its subdirectories.
    pub fn files(&self) -> Files<'_> {
        Files {
            table: self,
            dirs: self.walk().collect::<Vec<_>>().into_iter(),
            current: Default::default(),
        }
    }

    /// Builds the `/`-separated path of a directory.
    ///
    /// Directories with empty names do not contribute a component.
    pub fn directory_path(&self, id: DirId) -> String {
        let mut components = Vec::new();
        let mut next = Some(id);
        while let Some(id) = next {
            let dir = &self.nodes[id.0];
            if !dir.name.is_empty() {
                components.push(dir.name.as_str());
            }
            next = dir.parent;
        }

        components.reverse();
        components.join("/")
    }

    /// Builds the `/`-separated path of a file.
    pub fn file_path(&self, file: &FileEntry) -> String {
        let mut path = self.directory_path(file.directory);
        if !path.is_empty() {
            path.push('/');
        }
        path.push_str(&file.name);
        path
    }

    pub(crate) fn write<W: Write, S: StringTable>(
        &self,
        writer: &mut W,
        strings: &mut S,
    ) -> Result<(), WadError> {
        self.roots
            .iter()
            .try_for_each(|&id| self.write_directory(id, writer, strings))
    }

    fn write_directory<W: Write, S: StringTable>(
        &self,
        id: DirId,
        writer: &mut W,
        strings: &mut S,
    ) -> Result<(), WadError> {
        let dir = &self.nodes[id.0];

        binary::write_uint32(writer, strings.put(&dir.name)?)?;
        binary::write_uint32(writer, checked_u32(dir.files.len())?)?;
        binary::write_uint32(writer, checked_u32(dir.children.len())?)?;
        binary::write_uint32(writer, 0)?;

        // All subdirectories come first, then the directory's own files.
        for &child in &dir.children {
            self.write_directory(child, writer, strings)?;
        }
        for file in &dir.files {
            file.write(writer, strings)?;
        }

        Ok(())
    }

    /// Parses the forest out of the exact file table region.
    ///
    /// Nesting is tracked on an explicit stack, so arbitrarily deep
    /// trees in untrusted input cannot exhaust the call stack.
    pub(crate) fn parse<S: StringTable>(region: &[u8], strings: &S) -> Result<Self, WadError> {
        let mut reader = io::Cursor::new(region);
        let mut table = Self::new();
        let mut stack: Vec<Frame> = Vec::new();

        let end = region.len() as u64;
        while reader.position() < end {
            let root = table
                .parse_directory(&mut reader, None, strings)
                .map_err(|e| overrun(e, end))?;
            stack.push(root);

            while let Some(frame) = stack.last_mut() {
                if frame.directories > 0 {
                    frame.directories -= 1;
                    let parent = frame.id;

                    let child = table
                        .parse_directory(&mut reader, Some(parent), strings)
                        .map_err(|e| overrun(e, end))?;
                    stack.push(child);
                } else {
                    let Frame { id, files, .. } = *frame;
                    stack.pop();

                    for _ in 0..files {
                        let file = FileEntry::parse(&mut reader, id, strings)
                            .map_err(|e| overrun(e, end))?;
                        table.nodes[id.0].files.push(file);
                    }
                }
            }
        }

        if reader.position() != end {
            return Err(WadError::FileTableSize {
                expected: end,
                actual: reader.position(),
            });
        }

        Ok(table)
    }

    fn parse_directory<R: Read, S: StringTable>(
        &mut self,
        reader: &mut R,
        parent: Option<DirId>,
        strings: &S,
    ) -> Result<Frame, WadError> {
        let name = strings.get(binary::uint32(reader)?)?;
        let files = binary::uint32(reader)?;
        let directories = binary::uint32(reader)?;

        let reserved = binary::uint32(reader)?;
        if reserved != 0 {
            return Err(WadError::Reserved {
                field: "directory entry",
                value: reserved,
            });
        }

        Ok(Frame {
            id: self.add_directory(parent, name),
            directories,
            files,
        })
    }
}

fn overrun(e: WadError, region_len: u64) -> WadError {
    match e {
        WadError::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
            WadError::FileTableOverrun(region_len)
        }
        e => e,
    }
}

// Tables compare by tree shape, not by arena layout.
impl PartialEq for FileTable {
    fn eq(&self, other: &Self) -> bool {
        fn same(a: &FileTable, x: DirId, b: &FileTable, y: DirId) -> bool {
            let (l, r) = (a.directory(x), b.directory(y));
            l.name == r.name
                && l.files == r.files
                && l.children.len() == r.children.len()
                && l.children
                    .iter()
                    .zip(&r.children)
                    .all(|(&x, &y)| same(a, x, b, y))
        }

        self.roots.len() == other.roots.len()
            && self
                .roots
                .iter()
                .zip(&other.roots)
                .all(|(&x, &y)| same(self, x, other, y))
    }
}

impl Eq for FileTable {}

/// Iterator over all files of a [`FileTable`].
///
/// Created by [`FileTable::files`].
pub struct Files<'a> {
    table: &'a FileTable,
    dirs: std::vec::IntoIter<DirId>,
    current: slice::Iter<'a, FileEntry>,
}

impl<'a> Iterator for Files<'a> {
    type Item = &'a FileEntry;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(file) = self.current.next() {
                break Some(file);
            }

            let id = self.dirs.next()?;
            self.current = self.table.nodes[id.0].files.iter();
        }
    }
}
