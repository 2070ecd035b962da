//! Reader and writer for the `tensor_file` container.
//!
//! A tensor file is a small, self-describing binary format holding an
//! ordered set of named n-dimensional arrays. It starts with a fixed header,
//! follows with a directory of field descriptors, and ends with the raw
//! little-endian, row-major payloads, each placed at an aligned offset.
//!
//! ```text
//! "tensor_file\0" | u8 major | u8 minor | u32 field_count
//! field_count x { u16 name_len | name | u16 ndim | u8 dtype | u64 offset | ndim x u64 shape }
//! padding + payload, per field
//! ```
//!
//! Text is stored as a one-dimensional `uint8` array of UTF-8 bytes and is
//! recovered with [`decode_string`].
//!
//! # Example
//!
//! ```no_run
//! use tensor_file::{Field, Tensor, decode_string, read_tensor, write_tensor};
//!
//! let weights = Tensor::new(vec![2, 2], vec![1.0f32, 2.0, 3.0, 4.0])?;
//! write_tensor(
//!     "weights.tensor",
//!     8,
//!     [("w", Field::from(weights)), ("description", Field::from("2x2 identity-ish"))],
//! )?;
//!
//! let tensors = read_tensor("weights.tensor")?;
//! println!("{:?}", tensors["w"].shape());
//! println!("{}", decode_string(&tensors["description"])?);
//! # Ok::<(), tensor_file::TensorFileError>(())
//! ```

use std::fs::File;
use std::path::Path;

pub mod align;
pub mod config;
pub mod directory;
pub mod dtype;
pub mod error;
pub mod header;
pub mod map;
pub mod reader;
pub mod size;
pub mod tensor;
pub mod writer;

pub use config::{DEFAULT_ALIGNMENT, DuplicatePolicy, ReadOptions, WriteOptions};
pub use directory::{Directory, FieldDescriptor};
pub use dtype::DType;
pub use error::{ErrorKind, Result, TensorFileError};
pub use header::{FORMAT_VERSION, TENSOR_FILE_MAGIC, check_magic};
pub use map::TensorMap;
pub use reader::{TensorReader, decode_tensor};
pub use size::human_size;
pub use tensor::{Element, Field, RawArray, Tensor, TensorData};
pub use writer::{TensorWriter, encode_tensor};

/// Write `fields` to `path`, padding each payload to a multiple of `alignment`.
///
/// The file is encoded completely before it is created, so invalid input
/// (duplicate names, unsupported dtypes, a zero alignment) leaves nothing
/// on disk.
pub fn write_tensor<P, I, K, V>(path: P, alignment: u64, fields: I) -> Result<()>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Field>,
{
    write_tensor_with(path, fields, &WriteOptions::with_alignment(alignment)).map(|_| ())
}

/// [`write_tensor`] with explicit options. Returns the number of bytes written.
pub fn write_tensor_with<P, I, K, V>(path: P, fields: I, options: &WriteOptions) -> Result<u64>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Field>,
{
    let path = path.as_ref();
    let bytes = encode_tensor(fields, options)?;
    std::fs::write(path, &bytes).map_err(|e| TensorFileError::file("write", path, e))?;
    tracing::info!(
        path = %path.display(),
        size = %human_size(bytes.len() as u64),
        alignment = options.alignment,
        "wrote tensor file"
    );
    Ok(bytes.len() as u64)
}

/// Read every field of the tensor file at `path`, in directory order.
pub fn read_tensor(path: impl AsRef<Path>) -> Result<TensorMap> {
    read_tensor_with(path, &ReadOptions::default())
}

/// [`read_tensor`] with explicit options.
pub fn read_tensor_with(path: impl AsRef<Path>, options: &ReadOptions) -> Result<TensorMap> {
    let path = path.as_ref();
    with_mapped(path, |data| {
        let tensors = decode_tensor(data, options)?;
        tracing::info!(
            path = %path.display(),
            size = %human_size(data.len() as u64),
            fields = tensors.len(),
            "loaded tensor file"
        );
        Ok(tensors)
    })
}

/// Parse only the header and directory of the file at `path`.
///
/// Payload bounds are validated the same way [`read_tensor`] does, but no
/// payload is decoded.
pub fn read_directory(path: impl AsRef<Path>) -> Result<Directory> {
    read_directory_with(path, &ReadOptions::default())
}

/// [`read_directory`] with explicit options.
pub fn read_directory_with(path: impl AsRef<Path>, options: &ReadOptions) -> Result<Directory> {
    with_mapped(path.as_ref(), |data| Ok(TensorReader::new(data, options)?.into_directory()))
}

/// Map the file at `path` once and hand a validated [`TensorReader`] to `f`.
///
/// Lets callers inspect the directory and decode only the fields they need.
pub fn with_reader<P, T, F>(path: P, options: &ReadOptions, f: F) -> Result<T>
where
    P: AsRef<Path>,
    F: FnOnce(&TensorReader<'_>) -> T,
{
    with_mapped(path.as_ref(), |data| Ok(f(&TensorReader::new(data, options)?)))
}

/// Recover text stored as a 1-D `uint8` array.
///
/// Trailing NUL bytes are stripped; any other content must be valid UTF-8.
pub fn decode_string(tensor: &Tensor) -> Result<String> {
    let bytes = match tensor.as_slice::<u8>() {
        Some(bytes) if tensor.ndim() == 1 => bytes,
        _ => {
            return Err(TensorFileError::NotAString {
                dtype: tensor.dtype().to_string(),
                shape: tensor.shape().to_vec(),
            });
        }
    };
    let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    Ok(String::from_utf8(bytes[..end].to_vec())?)
}

fn with_mapped<T>(path: &Path, f: impl FnOnce(&[u8]) -> Result<T>) -> Result<T> {
    let file = File::open(path).map_err(|e| TensorFileError::file("open", path, e))?;
    let len = file.metadata().map_err(|e| TensorFileError::file("stat", path, e))?.len();
    if len == 0 {
        return f(&[]);
    }
    // SAFETY: the mapping is read-only and never outlives `f`; the file is not
    // modified by this process while mapped.
    let mmap = unsafe { memmap2::Mmap::map(&file) }
        .map_err(|e| TensorFileError::file("map", path, e))?;
    f(&mmap[..])
}
