//! Two-pass writer: directory with placeholder offsets, then aligned payloads
//! with the offsets backpatched into the directory.
//!
//! Each descriptor has to record where its own payload lands, which is only
//! known after the whole directory and every earlier payload are laid out.
//! The sink therefore has to be rewindable (`Write + Seek`); a plain append
//! stream cannot hold a tensor file.

use crate::align::{align_up, padding_for};
use crate::config::WriteOptions;
use crate::directory::{MAX_NAME_LEN, MAX_NDIM, write_descriptor};
use crate::dtype::DType;
use crate::error::{Result, TensorFileError};
use crate::header::encode_header;
use crate::tensor::{Field, TensorData, element_count};
use std::collections::HashSet;
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};

/// Payload bytes of a prepared field.
enum Payload {
    Elements(TensorData),
    Bytes(Vec<u8>),
}

impl Payload {
    fn write_to<W: Write>(&self, sink: &mut W) -> io::Result<()> {
        match self {
            Self::Elements(data) => data.write_le(sink),
            Self::Bytes(bytes) => sink.write_all(bytes),
        }
    }
}

/// A field whose dtype, shape and size have been checked.
struct PreparedField {
    name: String,
    dtype: DType,
    shape: Vec<u64>,
    payload: Payload,
}

impl PreparedField {
    fn new(name: String, field: Field) -> Result<Self> {
        if name.len() > MAX_NAME_LEN {
            return Err(TensorFileError::NameTooLong { len: name.len(), name, max: MAX_NAME_LEN });
        }

        let prepared = match field {
            Field::Array(tensor) => {
                let shape = tensor.shape().to_vec();
                let data = tensor.into_data();
                Self { dtype: data.dtype(), shape, payload: Payload::Elements(data), name }
            }
            Field::Text(text) => {
                let bytes = text.into_bytes();
                Self {
                    dtype: DType::UInt8,
                    shape: vec![bytes.len() as u64],
                    payload: Payload::Bytes(bytes),
                    name,
                }
            }
            Field::Raw(raw) => {
                let dtype = DType::from_name(&name, &raw.kind)?;
                let expected = element_count(&raw.shape)
                    .and_then(|n| n.checked_mul(dtype.element_size() as u64))
                    .unwrap_or(u64::MAX);
                let actual = raw.bytes.len() as u64;
                if expected != actual {
                    return Err(TensorFileError::RawLengthMismatch { field: name, expected, actual });
                }
                Self { dtype, shape: raw.shape, payload: Payload::Bytes(raw.bytes), name }
            }
        };

        if prepared.shape.len() > MAX_NDIM {
            return Err(TensorFileError::TooManyDimensions {
                field: prepared.name,
                ndim: prepared.shape.len(),
                max: MAX_NDIM,
            });
        }
        Ok(prepared)
    }
}

/// Validate every field up front so that input errors leave the sink untouched.
fn prepare_fields<I, K, V>(fields: I) -> Result<Vec<PreparedField>>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Field>,
{
    let mut seen = HashSet::new();
    let mut prepared = Vec::new();
    for (name, value) in fields {
        let name = name.into();
        if !seen.insert(name.clone()) {
            return Err(TensorFileError::DuplicateField(name));
        }
        prepared.push(PreparedField::new(name, value.into())?);
    }
    if u32::try_from(prepared.len()).is_err() {
        return Err(TensorFileError::TooManyFields(prepared.len()));
    }
    Ok(prepared)
}

/// Writes one complete tensor file into a rewindable sink.
///
/// Offsets are relative to the sink position at the time [`TensorWriter::write`]
/// is called, so a file can be embedded at a non-zero position of a larger
/// stream.
#[derive(Debug)]
pub struct TensorWriter<W> {
    sink: W,
    options: WriteOptions,
}

impl<W: Write + Seek> TensorWriter<W> {
    pub fn new(sink: W, options: WriteOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self { sink, options })
    }

    pub fn options(&self) -> &WriteOptions {
        &self.options
    }

    /// Write the header, the directory and every payload, in caller order.
    ///
    /// Returns the number of bytes the file occupies. If an I/O error occurs
    /// after the directory has been written, the sink holds an unusable,
    /// partially backpatched file and must be discarded.
    pub fn write<I, K, V>(&mut self, fields: I) -> Result<u64>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Field>,
    {
        let fields = prepare_fields(fields)?;
        let alignment = self.options.alignment;
        let base = self.sink.stream_position()?;

        encode_header(&mut self.sink, fields.len() as u32)?;

        // Pass 1: directory with zero offsets.
        let mut slots = Vec::with_capacity(fields.len());
        for field in &fields {
            let slot = write_descriptor(&mut self.sink, &field.name, field.dtype, &field.shape)?;
            slots.push(slot - base);
        }

        // Pass 2: pad, backpatch, append payload.
        for (field, slot) in fields.iter().zip(slots) {
            let position = self.sink.stream_position()? - base;
            let offset = align_up(position, alignment);
            write_padding(&mut self.sink, padding_for(position, alignment))?;

            self.sink.seek(SeekFrom::Start(base + slot))?;
            self.sink.write_all(&offset.to_le_bytes())?;
            self.sink.seek(SeekFrom::Start(base + offset))?;

            field.payload.write_to(&mut self.sink)?;
            tracing::debug!(
                field = %field.name,
                dtype = %field.dtype,
                shape = ?field.shape,
                offset,
                "wrote payload"
            );
        }

        self.sink.flush()?;
        Ok(self.sink.stream_position()? - base)
    }

    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}

fn write_padding<W: Write>(sink: &mut W, len: u64) -> io::Result<()> {
    io::copy(&mut io::repeat(0).take(len), sink).map(|_| ())
}

/// Build a complete tensor file in memory.
pub fn encode_tensor<I, K, V>(fields: I, options: &WriteOptions) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Field>,
{
    let mut writer = TensorWriter::new(Cursor::new(Vec::new()), options.clone())?;
    writer.write(fields)?;
    Ok(writer.into_inner().into_inner())
}
