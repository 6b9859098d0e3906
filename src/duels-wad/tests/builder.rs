use std::{fs, io::Cursor};

use duels_wad::{
    Archive, ArchiveBuilder, ArchiveFlags, Deflater, ErrorKind, Inflater, Version, WadError,
};
use tempfile::NamedTempFile;

// Deterministic bytes that zlib cannot shrink.
fn noise(len: usize) -> Vec<u8> {
    let mut state = 0x9E37_79B9_7F4A_7C15u64;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state >> 24) as u8
        })
        .collect()
}

#[test]
fn build_and_extract() {
    let temp = NamedTempFile::new().unwrap();

    let mut builder = ArchiveBuilder::new(
        Version::V202,
        ArchiveFlags::HAS_DATA_TYPES | ArchiveFlags::UNKNOWN6_OBSERVED,
    )
    .with_header_xml(b"<wad/>".to_vec());
    let x = builder.add_file("a/b/x.txt").unwrap();
    let test = builder.add_file("a/test.txt").unwrap();

    let mut writer = builder.begin(temp.reopen().unwrap()).unwrap();
    writer.write_file(x, b"does this work?").unwrap();
    writer.write_file(test, b"it does!").unwrap();
    let (built, _) = writer.finish().unwrap();

    let raw = fs::read(temp.path()).unwrap();
    let archive = Archive::parse(&mut Cursor::new(&raw)).unwrap();
    assert_eq!(archive, built);
    assert_eq!(archive.header_xml.as_deref(), Some(&b"<wad/>"[..]));

    let contents: Vec<(String, &[u8])> = archive
        .files
        .files()
        .map(|f| (archive.files.file_path(f), archive.file_data(&raw, f).unwrap()))
        .collect();
    assert_eq!(
        contents,
        [
            ("a/test.txt".to_owned(), &b"it does!"[..]),
            ("a/b/x.txt".to_owned(), &b"does this work?"[..]),
        ]
    );
}

#[test]
fn offsets_are_patched() -> Result<(), WadError> {
    let mut builder = ArchiveBuilder::new(Version::V200, ArchiveFlags::empty());
    let first = builder.add_file("DATA/ONE.BIN")?;
    let second = builder.add_file("DATA/TWO.BIN")?;

    let mut writer = builder.begin(Cursor::new(Vec::new()))?;

    // Records may be written in any order.
    writer.write_file(second, &[2; 7])?;
    writer.write_file(first, &[1; 3])?;
    let (archive, out) = writer.finish()?;
    let raw = out.into_inner();

    let header_len = raw.len() as u32 - 10;
    assert_eq!(archive.data_offsets, [header_len + 7, header_len]);
    assert_eq!(Archive::parse(&mut Cursor::new(&raw))?, archive);

    let files: Vec<u32> = archive.files.files().map(|f| f.size).collect();
    assert_eq!(files, [3, 7]);

    Ok(())
}

#[test]
fn compressed_records() -> Result<(), WadError> {
    let text = b"hello, planeswalker! ".repeat(50);

    let mut builder = ArchiveBuilder::new(Version::V201, ArchiveFlags::HAS_COMPRESSED_FILES);
    let id = builder.add_file("TEXT/HELLO.TXT")?;
    let mut writer = builder.begin(Cursor::new(Vec::new()))?;
    writer.write_file(id, &text)?;
    let (archive, out) = writer.finish()?;
    let raw = out.into_inner();

    let file = archive.files.files().next().unwrap();
    let record = archive.file_data(&raw, file)?;
    assert!(record.len() < text.len());
    assert_eq!(&record[..4], &(text.len() as i32).to_le_bytes());

    let mut inflater = Inflater::new();
    assert_eq!(inflater.unpack(record)?, &text[..]);

    Ok(())
}

#[test]
fn incompressible_data_is_stored_raw() -> Result<(), WadError> {
    let data = noise(1000);

    let mut record = Vec::new();
    Deflater::new().pack(&data, &mut record)?;
    assert_eq!(record.len(), 1004);
    assert_eq!(&record[..4], &(-1i32).to_le_bytes());
    assert_eq!(&record[4..], &data[..]);

    let mut builder = ArchiveBuilder::new(Version::V202, ArchiveFlags::HAS_COMPRESSED_FILES);
    let id = builder.add_file("NOISE.BIN")?;
    let mut writer = builder.begin(Cursor::new(Vec::new()))?;
    writer.write_file(id, &data)?;
    let (archive, out) = writer.finish()?;

    let file = archive.files.files().next().unwrap();
    assert_eq!(file.size, 1004);

    let raw = out.into_inner();
    let mut inflater = Inflater::new();
    assert_eq!(inflater.unpack(archive.file_data(&raw, file)?)?, &data[..]);

    Ok(())
}

#[test]
fn malformed_records() {
    let mut inflater = Inflater::new();

    let err = inflater.unpack(&[0xFF, 0xFF]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StructuralInconsistency);

    let err = inflater.unpack(&(-2i32).to_le_bytes()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StructuralInconsistency);

    let mut record = 5i32.to_le_bytes().to_vec();
    record.extend_from_slice(b"not zlib");
    let err = inflater.unpack(&record).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Codec);
}

#[test]
fn oversized_length_prefix() -> Result<(), WadError> {
    let mut inflater = Inflater::new();

    let mut record = i32::MAX.to_le_bytes().to_vec();
    record.push(b'x');
    let err = inflater.unpack(&record).unwrap_err();
    assert!(matches!(err, WadError::Record(..)));

    let mut record = 1033i32.to_le_bytes().to_vec();
    record.push(0);
    let err = inflater.unpack(&record).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StructuralInconsistency);

    // Highly compressible data stays within the bound.
    let zeros = vec![0; 1 << 20];
    let mut record = Vec::new();
    Deflater::new().pack(&zeros, &mut record)?;
    assert_ne!(&record[..4], &(-1i32).to_le_bytes());
    assert_eq!(inflater.unpack(&record)?, &zeros[..]);

    Ok(())
}

#[test]
fn top_level_files_get_an_unnamed_directory() -> Result<(), WadError> {
    let mut builder = ArchiveBuilder::new(Version::V202, ArchiveFlags::empty());
    builder.add_file("ROOT.TXT")?;
    builder.add_file("OTHER.TXT")?;
    builder.add_file("SUB\\NESTED.TXT")?;
    assert_eq!(builder.len(), 3);

    let writer = builder.begin(Cursor::new(Vec::new()))?;
    let archive = writer.archive();

    let roots: Vec<&str> = archive
        .files
        .roots()
        .iter()
        .map(|&r| archive.files.directory(r).name.as_str())
        .collect();
    assert_eq!(roots, ["", "SUB"]);
    assert_eq!(archive.total_directory_count(), 2);
    assert_eq!(archive.data_offsets.len(), 3);

    Ok(())
}

#[test]
fn rejects_bad_paths() {
    let mut builder = ArchiveBuilder::new(Version::V202, ArchiveFlags::empty());
    builder.add_file("DATA/A.TXT").unwrap();

    for path in ["", "DATA/", "DATA//B.TXT", "/ABS.TXT"] {
        let err = builder.add_file(path).unwrap_err();
        assert!(matches!(err, WadError::InvalidPath(..)), "{path}");
    }

    let err = builder.add_file("DATA\\A.TXT").unwrap_err();
    assert!(matches!(err, WadError::DuplicatePath(..)));
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(builder.len(), 1);
}

#[test]
fn writer_misuse() -> Result<(), WadError> {
    let mut builder = ArchiveBuilder::new(Version::V202, ArchiveFlags::empty());
    let a = builder.add_file("A/1.BIN")?;
    builder.add_file("A/2.BIN")?;

    let mut writer = builder.begin(Cursor::new(Vec::new()))?;
    writer.write_file(a, b"one")?;

    let err = writer.write_file(a, b"again").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ContractMisuse);

    let err = writer.finish().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ContractMisuse);

    Ok(())
}

#[test]
fn legacy_versions_can_be_written() -> Result<(), WadError> {
    let mut builder = ArchiveBuilder::new(Version::V100, ArchiveFlags::empty());
    let id = builder.add_file("A/B")?;
    let mut writer = builder.begin(Cursor::new(Vec::new()))?;
    writer.write_file(id, b"data")?;
    let (_, out) = writer.finish()?;

    let err = Archive::parse(&mut Cursor::new(out.into_inner())).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedLayout);

    Ok(())
}
