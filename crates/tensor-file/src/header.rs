//! Fixed-size file header: magic, version pair and field count.

use crate::error::{Result, TensorFileError};
use std::io::Write;

/// The twelve bytes every tensor file starts with (`"tensor_file"` + NUL).
pub const TENSOR_FILE_MAGIC: [u8; 12] = *b"tensor_file\0";
/// The only (major, minor) version this crate reads and writes.
pub const FORMAT_VERSION: (u8, u8) = (1, 0);
/// Magic (12) + version (2) + field count (4).
pub const HEADER_LEN: usize = 18;

/// Parsed file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: (u8, u8),
    pub field_count: u32,
}

/// Returns `true` if `data` starts with the tensor file magic.
#[inline]
pub fn check_magic(data: &[u8]) -> bool {
    data.get(0..TENSOR_FILE_MAGIC.len()) == Some(&TENSOR_FILE_MAGIC[..])
}

/// Write the magic, the version pair and the field count.
pub fn encode_header<W: Write>(sink: &mut W, field_count: u32) -> Result<()> {
    sink.write_all(&TENSOR_FILE_MAGIC)?;
    sink.write_all(&[FORMAT_VERSION.0, FORMAT_VERSION.1])?;
    sink.write_all(&field_count.to_le_bytes())?;
    Ok(())
}

/// Parse the first [`HEADER_LEN`] bytes of a tensor file.
///
/// The magic is checked before the version, and the version is an exact
/// match: there is no forward-compatibility window.
pub fn decode_header(data: &[u8]) -> Result<Header> {
    let file_len = data.len() as u64;

    let found: [u8; 12] = data
        .get(0..12)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| TensorFileError::truncated("header magic", 0, 12, file_len))?;
    if found != TENSOR_FILE_MAGIC {
        return Err(TensorFileError::BadMagic { expected: TENSOR_FILE_MAGIC, found });
    }

    let (major, minor) = match data.get(12..14) {
        Some(&[major, minor]) => (major, minor),
        _ => return Err(TensorFileError::truncated("header version", 12, 2, file_len)),
    };
    if (major, minor) != FORMAT_VERSION {
        return Err(TensorFileError::UnsupportedVersion {
            major,
            minor,
            expected_major: FORMAT_VERSION.0,
            expected_minor: FORMAT_VERSION.1,
        });
    }

    let field_count = data
        .get(14..18)
        .and_then(|b| b.try_into().ok())
        .map(u32::from_le_bytes)
        .ok_or_else(|| TensorFileError::truncated("header field count", 14, 4, file_len))?;

    Ok(Header { version: (major, minor), field_count })
}
