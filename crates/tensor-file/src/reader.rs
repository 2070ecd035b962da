//! Reader over a complete tensor file held in memory (or memory-mapped).

use crate::config::ReadOptions;
use crate::directory::{Directory, FieldDescriptor, decode_directory};
use crate::error::{Result, TensorFileError};
use crate::header::decode_header;
use crate::map::TensorMap;
use crate::tensor::Tensor;

/// Parsed directory plus access to the payload bytes it points at.
///
/// Construction validates the header, the directory and the payload layout;
/// payloads are decoded on demand.
#[derive(Debug, Clone)]
pub struct TensorReader<'a> {
    data: &'a [u8],
    directory: Directory,
}

impl<'a> TensorReader<'a> {
    pub fn new(data: &'a [u8], options: &ReadOptions) -> Result<Self> {
        let header = decode_header(data)?;
        let directory = decode_directory(data, &header, options.duplicates)?;
        directory.validate_layout(options.check_overlap)?;
        Ok(Self { data, directory })
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    pub fn into_directory(self) -> Directory {
        self.directory
    }

    /// Raw little-endian payload of one field.
    ///
    /// The recorded offset is used verbatim; it does not have to be aligned.
    pub fn payload(&self, field: &FieldDescriptor) -> Result<&'a [u8]> {
        let range = field.payload_range()?;
        if range.is_empty() {
            return Ok(&[]);
        }
        let file_len = self.data.len() as u64;
        let truncated = || {
            TensorFileError::truncated(
                format!("payload of field `{}`", field.name),
                range.start,
                range.end - range.start,
                file_len,
            )
        };
        let start = usize::try_from(range.start).map_err(|_| truncated())?;
        let end = usize::try_from(range.end).map_err(|_| truncated())?;
        self.data.get(start..end).ok_or_else(truncated)
    }

    /// Decode one field into a shaped tensor.
    pub fn tensor(&self, name: &str) -> Result<Option<Tensor>> {
        self.directory.get(name).map(|field| self.decode(field)).transpose()
    }

    /// Decode every field, in directory order.
    pub fn read_all(&self) -> Result<TensorMap> {
        let mut tensors = TensorMap::with_capacity(self.directory.len());
        for field in &self.directory {
            tensors.insert(field.name.clone(), self.decode(field)?);
        }
        Ok(tensors)
    }

    fn decode(&self, field: &FieldDescriptor) -> Result<Tensor> {
        let bytes = self.payload(field)?;
        Tensor::from_le_bytes(field.dtype, field.shape.clone(), bytes)
    }
}

/// Decode a complete tensor file from memory.
pub fn decode_tensor(data: &[u8], options: &ReadOptions) -> Result<TensorMap> {
    TensorReader::new(data, options)?.read_all()
}
