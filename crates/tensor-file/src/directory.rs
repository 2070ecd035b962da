//! Field directory: one descriptor per stored array.
//!
//! On-disk entry layout (little-endian):
//!
//! ```text
//! u16 name_len | name bytes | u16 ndim | u8 dtype | u64 offset | ndim x u64 shape
//! ```

use crate::config::DuplicatePolicy;
use crate::dtype::DType;
use crate::error::{Result, TensorFileError};
use crate::header::{HEADER_LEN, Header};
use crate::tensor::element_count;
use serde::Serialize;
use std::collections::HashMap;
use std::io::{Seek, Write};
use std::ops::Range;

/// Longest field name the 16-bit length prefix can describe.
pub const MAX_NAME_LEN: usize = u16::MAX as usize;
/// Largest dimensionality the 16-bit `ndim` can describe.
pub const MAX_NDIM: usize = u16::MAX as usize;

/// Directory entry describing one stored array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub dtype: DType,
    /// Absolute byte offset of the payload from the start of the file.
    pub offset: u64,
    pub shape: Vec<u64>,
}

impl FieldDescriptor {
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// `product(shape)`, or `None` on overflow.
    pub fn element_count(&self) -> Option<u64> {
        element_count(&self.shape)
    }

    /// Payload size in bytes, or `None` on overflow.
    pub fn byte_len(&self) -> Option<u64> {
        self.element_count()?.checked_mul(self.dtype.element_size() as u64)
    }

    /// Byte range of the payload within the file.
    pub fn payload_range(&self) -> Result<Range<u64>> {
        self.byte_len()
            .and_then(|len| Some(self.offset..self.offset.checked_add(len)?))
            .ok_or_else(|| TensorFileError::PayloadTooLarge {
                field: self.name.clone(),
                shape: self.shape.clone(),
            })
    }
}

/// Parsed header plus every field descriptor, in file order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Directory {
    pub version: (u8, u8),
    pub file_len: u64,
    pub fields: Vec<FieldDescriptor>,
}

impl Directory {
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldDescriptor> {
        self.fields.iter()
    }

    /// Check that every payload lies inside the file and, when
    /// `check_overlap` is set, that no two non-empty payloads share bytes.
    ///
    /// Offsets are used verbatim; their alignment is not checked.
    pub fn validate_layout(&self, check_overlap: bool) -> Result<()> {
        let mut ranges = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            let range = field.payload_range()?;
            if range.is_empty() {
                continue;
            }
            if range.end > self.file_len {
                return Err(TensorFileError::truncated(
                    format!("payload of field `{}`", field.name),
                    range.start,
                    range.end - range.start,
                    self.file_len,
                ));
            }
            ranges.push((range, field.name.as_str()));
        }

        if check_overlap {
            ranges.sort_by_key(|(range, _)| range.start);
            for pair in ranges.windows(2) {
                let (prev, prev_name) = &pair[0];
                let (next, next_name) = &pair[1];
                if next.start < prev.end {
                    return Err(TensorFileError::OverlappingPayload {
                        field: next_name.to_string(),
                        start: next.start,
                        end: next.end,
                        other: prev_name.to_string(),
                        other_start: prev.start,
                        other_end: prev.end,
                    });
                }
            }
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Directory {
    type Item = &'a FieldDescriptor;
    type IntoIter = std::slice::Iter<'a, FieldDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

/// Write one directory entry with a zero placeholder offset.
///
/// Returns the stream position of the 8-byte offset slot so the payload
/// writer can backpatch it once the payload position is known.
pub fn write_descriptor<W: Write + Seek>(
    sink: &mut W,
    name: &str,
    dtype: DType,
    shape: &[u64],
) -> Result<u64> {
    let name_len = u16::try_from(name.len()).map_err(|_| TensorFileError::NameTooLong {
        name: name.to_string(),
        len: name.len(),
        max: MAX_NAME_LEN,
    })?;
    let ndim = u16::try_from(shape.len()).map_err(|_| TensorFileError::TooManyDimensions {
        field: name.to_string(),
        ndim: shape.len(),
        max: MAX_NDIM,
    })?;

    sink.write_all(&name_len.to_le_bytes())?;
    sink.write_all(name.as_bytes())?;
    sink.write_all(&ndim.to_le_bytes())?;
    sink.write_all(&[dtype.code()])?;

    let offset_slot = sink.stream_position()?;
    sink.write_all(&0u64.to_le_bytes())?;

    for &dim in shape {
        sink.write_all(&dim.to_le_bytes())?;
    }
    Ok(offset_slot)
}

/// Parse `header.field_count` entries starting right after the header.
pub fn decode_directory(
    data: &[u8],
    header: &Header,
    duplicates: DuplicatePolicy,
) -> Result<Directory> {
    let mut offset = HEADER_LEN;
    let mut fields: Vec<FieldDescriptor> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for _ in 0..header.field_count {
        let field = read_descriptor(data, &mut offset)?;
        match positions.get(&field.name) {
            Some(&pos) => match duplicates {
                DuplicatePolicy::Reject => {
                    return Err(TensorFileError::DuplicateEntry(field.name));
                }
                DuplicatePolicy::LastWins => {
                    tracing::warn!(field = %field.name, "duplicate field name; later entry wins");
                    fields[pos] = field;
                }
            },
            None => {
                positions.insert(field.name.clone(), fields.len());
                fields.push(field);
            }
        }
    }

    Ok(Directory { version: header.version, file_len: data.len() as u64, fields })
}

fn read_descriptor(data: &[u8], offset: &mut usize) -> Result<FieldDescriptor> {
    let name_len = read_u16(data, offset, "field name length")? as usize;
    let name_at = *offset as u64;
    let name_bytes = read_bytes(data, offset, name_len, "field name")?;
    let name = std::str::from_utf8(name_bytes)
        .map_err(|_| TensorFileError::InvalidFieldName { offset: name_at })?
        .to_string();

    let ndim = read_u16(data, offset, "field dimensionality")? as usize;
    let code = read_bytes(data, offset, 1, "field dtype")?[0];
    let dtype = DType::from_code(code)
        .ok_or_else(|| TensorFileError::UnknownDTypeCode { field: name.clone(), code })?;
    let payload_offset = read_u64(data, offset, "field offset")?;

    let mut shape = Vec::with_capacity(ndim);
    for _ in 0..ndim {
        shape.push(read_u64(data, offset, "field shape")?);
    }

    tracing::debug!(field = %name, %dtype, ?shape, offset = payload_offset, "directory entry");
    Ok(FieldDescriptor { name, dtype, offset: payload_offset, shape })
}

// Bounds-checked little-endian readers over the mapped file.

fn read_bytes<'a>(data: &'a [u8], offset: &mut usize, len: usize, what: &str) -> Result<&'a [u8]> {
    let start = *offset;
    let bytes = start
        .checked_add(len)
        .and_then(|end| data.get(start..end))
        .ok_or_else(|| TensorFileError::truncated(what, start as u64, len as u64, data.len() as u64))?;
    *offset += len;
    Ok(bytes)
}

fn read_u16(data: &[u8], offset: &mut usize, what: &str) -> Result<u16> {
    let b = read_bytes(data, offset, 2, what)?;
    Ok(u16::from_le_bytes([b[0], b[1]]))
}

fn read_u64(data: &[u8], offset: &mut usize, what: &str) -> Result<u64> {
    let b = read_bytes(data, offset, 8, what)?;
    let mut buf = [0u8; 8];
    buf.copy_from_slice(b);
    Ok(u64::from_le_bytes(buf))
}
