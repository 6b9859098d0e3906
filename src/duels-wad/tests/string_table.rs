use duels_wad::{
    string_table::{StringTable, StringTableReader, StringTableWriter},
    ErrorKind, WadError,
};

#[test]
fn interning_deduplicates() -> Result<(), WadError> {
    let mut strings = StringTableWriter::new();

    let data = strings.put("DATA")?;
    let cards = strings.put("CARDS")?;
    assert_eq!(strings.put("DATA")?, data);
    assert_ne!(data, cards);
    assert_eq!((data, cards), (0, 5));
    assert_eq!(strings.len(), 2);

    // "DATA\0" and "CARDS\0" make 11 bytes, padded up to 16.
    let blob = strings.finish();
    assert_eq!(blob.len(), 16);
    assert_eq!(&blob[..11], b"DATA\0CARDS\0");

    Ok(())
}

#[test]
fn padding_of_aligned_tables() -> Result<(), WadError> {
    let mut strings = StringTableWriter::new();
    strings.put("0123456789ABCDE")?;
    assert_eq!(strings.finish().len(), 16);

    let mut strings = StringTableWriter::new();
    strings.put("0123456789ABCDEF")?;
    assert_eq!(strings.finish().len(), 32);

    assert!(StringTableWriter::new().finish().is_empty());

    Ok(())
}

#[test]
fn reading_back() -> Result<(), WadError> {
    let mut strings = StringTableWriter::new();
    let a = strings.put("Caf\u{e9}.xml")?;
    let b = strings.put("")?;
    let blob = strings.finish();

    let reader = StringTableReader::new(&blob);
    assert_eq!(reader.get(a)?, "Caf\u{e9}.xml");
    assert_eq!(reader.get(b)?, "");
    assert_eq!(reader.get(a + 3)?, "\u{e9}.xml");

    Ok(())
}

#[test]
fn reading_out_of_bounds() {
    let reader = StringTableReader::new(b"abc\0def");
    assert!(matches!(reader.get(4), Err(WadError::StringOffset(4))));
    assert!(matches!(reader.get(100), Err(WadError::StringOffset(100))));
}

#[test]
fn wrong_direction_is_misuse() {
    let writer = StringTableWriter::new();
    let err = writer.get(0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ContractMisuse);

    let mut reader = StringTableReader::new(b"abc\0");
    let err = reader.put("abc").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ContractMisuse);
}

#[test]
fn unencodable_names() {
    let mut strings = StringTableWriter::new();
    let err = strings.put("\u{30ab}\u{30fc}\u{30c9}").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(strings.is_empty());
}
