use std::{
    fs,
    io::{self, BufReader, Write},
    path::Path,
};

use duels_wad::{Archive, DataType};
use eyre::Context;
use serde::Serialize;

#[derive(Serialize)]
struct ArchiveInfo<'a> {
    version: String,
    flags: u32,
    flag_names: Vec<&'static str>,
    unknown_flags: u32,
    header_xml_size: Option<usize>,
    data_types: &'a [DataTypeInfo],
    total_files: usize,
    total_directories: usize,
    files: Vec<FileInfo>,
}

#[derive(Serialize)]
struct DataTypeInfo {
    index: u32,
    reserved: u32,
}

impl From<&DataType> for DataTypeInfo {
    fn from(value: &DataType) -> Self {
        Self {
            index: value.index,
            reserved: value.reserved,
        }
    }
}

#[derive(Serialize)]
struct FileInfo {
    path: String,
    size: u32,
    offset_index: u32,
    offset: Option<u32>,
}

pub fn info(input: &Path) -> eyre::Result<()> {
    let file = fs::File::open(input)
        .with_context(|| format!("failed to open archive '{}'", input.display()))?;
    let archive = Archive::parse(&mut BufReader::new(file))
        .with_context(|| format!("failed to parse archive '{}'", input.display()))?;

    let data_types: Vec<DataTypeInfo> = archive.data_types.iter().map(Into::into).collect();
    let files = archive
        .files
        .files()
        .map(|f| FileInfo {
            path: archive.files.file_path(f),
            size: f.size,
            offset_index: f.offset_index,
            offset: archive.data_offsets.get(f.offset_index as usize).copied(),
        })
        .collect();

    let info = ArchiveInfo {
        version: archive.version.to_string(),
        flags: archive.flags.bits(),
        flag_names: archive.flags.iter_names().map(|(name, _)| name).collect(),
        unknown_flags: archive.flags.unknown_bits(),
        header_xml_size: archive.header_xml.as_ref().map(Vec::len),
        data_types: &data_types,
        total_files: archive.total_file_count(),
        total_directories: archive.total_directory_count(),
        files,
    };

    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &info)?;
    writeln!(stdout)?;

    Ok(())
}
