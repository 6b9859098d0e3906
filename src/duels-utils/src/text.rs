//! Conversion between Rust strings and Windows code page 1252.

use std::borrow::Cow;

use encoding_rs::WINDOWS_1252;

/// Decodes Windows-1252 bytes into a string.
///
/// Every byte value has a mapping, so this never fails.
#[inline]
pub fn decode_cp1252(data: &[u8]) -> Cow<'_, str> {
    WINDOWS_1252.decode_without_bom_handling(data).0
}

/// Encodes a string into Windows-1252 bytes.
///
/// Returns [`None`] when `value` contains characters outside of the
/// code page, or an embedded NUL which would truncate the string.
#[inline]
pub fn encode_cp1252(value: &str) -> Option<Cow<'_, [u8]>> {
    if value.contains('\0') {
        return None;
    }

    let (encoded, _, unmappable) = WINDOWS_1252.encode(value);
    (!unmappable).then_some(encoded)
}
