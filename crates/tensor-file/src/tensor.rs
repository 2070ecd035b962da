//! In-memory arrays: what callers hand to the writer and get back from the reader.

use crate::dtype::DType;
use crate::error::{Result, TensorFileError};
use half::f16;
use std::io::{self, Write};

/// Typed, contiguous element buffer. One variant per registered [`DType`].
#[derive(Debug, Clone, PartialEq)]
pub enum TensorData {
    UInt8(Vec<u8>),
    Int8(Vec<i8>),
    UInt16(Vec<u16>),
    Int16(Vec<i16>),
    UInt32(Vec<u32>),
    Int32(Vec<i32>),
    UInt64(Vec<u64>),
    Int64(Vec<i64>),
    Float16(Vec<f16>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
}

/// Apply `$body` to the inner vector of every variant.
macro_rules! each_variant {
    ($data:expr, $v:ident => $body:expr) => {
        match $data {
            TensorData::UInt8($v) => $body,
            TensorData::Int8($v) => $body,
            TensorData::UInt16($v) => $body,
            TensorData::Int16($v) => $body,
            TensorData::UInt32($v) => $body,
            TensorData::Int32($v) => $body,
            TensorData::UInt64($v) => $body,
            TensorData::Int64($v) => $body,
            TensorData::Float16($v) => $body,
            TensorData::Float32($v) => $body,
            TensorData::Float64($v) => $body,
        }
    };
}

impl TensorData {
    pub fn dtype(&self) -> DType {
        match self {
            Self::UInt8(_) => DType::UInt8,
            Self::Int8(_) => DType::Int8,
            Self::UInt16(_) => DType::UInt16,
            Self::Int16(_) => DType::Int16,
            Self::UInt32(_) => DType::UInt32,
            Self::Int32(_) => DType::Int32,
            Self::UInt64(_) => DType::UInt64,
            Self::Int64(_) => DType::Int64,
            Self::Float16(_) => DType::Float16,
            Self::Float32(_) => DType::Float32,
            Self::Float64(_) => DType::Float64,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        each_variant!(self, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of the element buffer in bytes.
    pub fn byte_len(&self) -> usize {
        self.len() * self.dtype().element_size()
    }

    /// Little-endian encoding of every element, in buffer order.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        each_variant!(self, v => le_bytes_of(v))
    }

    /// Stream the little-endian encoding into `sink` without an
    /// intermediate buffer on little-endian hosts.
    pub fn write_le<W: Write>(&self, sink: &mut W) -> io::Result<()> {
        each_variant!(self, v => write_le_slice(sink, v))
    }

    /// Decode `bytes` as little-endian elements of `dtype`.
    ///
    /// Trailing bytes that do not form a whole element are ignored; callers
    /// size the slice from the shape first.
    pub fn from_le_bytes(dtype: DType, bytes: &[u8]) -> Self {
        match dtype {
            DType::UInt8 => Self::UInt8(bytes.to_vec()),
            DType::Int8 => Self::Int8(decode_le(bytes)),
            DType::UInt16 => Self::UInt16(decode_le(bytes)),
            DType::Int16 => Self::Int16(decode_le(bytes)),
            DType::UInt32 => Self::UInt32(decode_le(bytes)),
            DType::Int32 => Self::Int32(decode_le(bytes)),
            DType::UInt64 => Self::UInt64(decode_le(bytes)),
            DType::Int64 => Self::Int64(decode_le(bytes)),
            DType::Float16 => Self::Float16(decode_le(bytes)),
            DType::Float32 => Self::Float32(decode_le(bytes)),
            DType::Float64 => Self::Float64(decode_le(bytes)),
        }
    }
}

/// The leading whole elements of `bytes`.
fn whole_elements<T>(bytes: &[u8]) -> &[u8] {
    let size = std::mem::size_of::<T>();
    &bytes[..bytes.len() - bytes.len() % size]
}

#[cfg(target_endian = "little")]
fn decode_le<T: bytemuck::Pod>(bytes: &[u8]) -> Vec<T> {
    bytemuck::pod_collect_to_vec(whole_elements::<T>(bytes))
}

#[cfg(target_endian = "big")]
fn decode_le<T: bytemuck::Pod>(bytes: &[u8]) -> Vec<T> {
    let mut values: Vec<T> = bytemuck::pod_collect_to_vec(whole_elements::<T>(bytes));
    for value in &mut values {
        bytemuck::bytes_of_mut(value).reverse();
    }
    values
}

#[cfg(target_endian = "little")]
fn le_bytes_of<T: bytemuck::Pod>(values: &[T]) -> Vec<u8> {
    bytemuck::cast_slice(values).to_vec()
}

#[cfg(target_endian = "little")]
fn write_le_slice<W: Write, T: bytemuck::Pod>(sink: &mut W, values: &[T]) -> io::Result<()> {
    sink.write_all(bytemuck::cast_slice(values))
}

#[cfg(target_endian = "big")]
fn le_bytes_of<T: bytemuck::Pod>(values: &[T]) -> Vec<u8> {
    let size = std::mem::size_of::<T>();
    let mut out = bytemuck::cast_slice::<T, u8>(values).to_vec();
    for chunk in out.chunks_exact_mut(size) {
        chunk.reverse();
    }
    out
}

#[cfg(target_endian = "big")]
fn write_le_slice<W: Write, T: bytemuck::Pod>(sink: &mut W, values: &[T]) -> io::Result<()> {
    sink.write_all(&le_bytes_of(values))
}

mod sealed {
    pub trait Sealed {}
}

/// Rust scalar types that map onto a registered [`DType`].
pub trait Element: Copy + sealed::Sealed + 'static {
    const DTYPE: DType;

    fn slice(data: &TensorData) -> Option<&[Self]>;

    fn wrap(values: Vec<Self>) -> TensorData;
}

macro_rules! impl_element {
    ($t:ty, $variant:ident) => {
        impl sealed::Sealed for $t {}

        impl Element for $t {
            const DTYPE: DType = DType::$variant;

            fn slice(data: &TensorData) -> Option<&[Self]> {
                match data {
                    TensorData::$variant(v) => Some(v),
                    _ => None,
                }
            }

            fn wrap(values: Vec<Self>) -> TensorData {
                TensorData::$variant(values)
            }
        }

        impl From<Vec<$t>> for TensorData {
            fn from(values: Vec<$t>) -> Self {
                TensorData::$variant(values)
            }
        }
    };
}

impl_element!(u8, UInt8);
impl_element!(i8, Int8);
impl_element!(u16, UInt16);
impl_element!(i16, Int16);
impl_element!(u32, UInt32);
impl_element!(i32, Int32);
impl_element!(u64, UInt64);
impl_element!(i64, Int64);
impl_element!(f16, Float16);
impl_element!(f32, Float32);
impl_element!(f64, Float64);

/// A shaped array: row-major element buffer plus its extents.
///
/// An empty shape describes a scalar holding exactly one element.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    shape: Vec<u64>,
    data: TensorData,
}

/// Number of elements a shape describes, or `None` on overflow.
pub fn element_count(shape: &[u64]) -> Option<u64> {
    shape.iter().try_fold(1u64, |acc, &dim| acc.checked_mul(dim))
}

impl Tensor {
    /// Build a tensor, checking that the buffer holds `product(shape)` elements.
    pub fn new(shape: Vec<u64>, data: impl Into<TensorData>) -> Result<Self> {
        let data = data.into();
        let actual = data.len() as u64;
        match element_count(&shape) {
            Some(expected) if expected == actual => Ok(Self { shape, data }),
            expected => Err(TensorFileError::ShapeMismatch {
                shape,
                expected: expected.unwrap_or(u64::MAX),
                actual,
            }),
        }
    }

    /// A one-dimensional tensor over `values`.
    pub fn from_vec<T: Element>(values: Vec<T>) -> Self {
        Self { shape: vec![values.len() as u64], data: T::wrap(values) }
    }

    /// The encoding used for text fields: UTF-8 bytes as a 1-D `uint8` array,
    /// with no terminator.
    pub fn text(text: &str) -> Self {
        Self::from_vec(text.as_bytes().to_vec())
    }

    /// Decode a row-major little-endian payload.
    pub fn from_le_bytes(dtype: DType, shape: Vec<u64>, bytes: &[u8]) -> Result<Self> {
        let expected = element_count(&shape)
            .and_then(|n| n.checked_mul(dtype.element_size() as u64))
            .unwrap_or(u64::MAX);
        if expected != bytes.len() as u64 {
            let actual = (bytes.len() / dtype.element_size()) as u64;
            return Err(TensorFileError::ShapeMismatch {
                expected: element_count(&shape).unwrap_or(u64::MAX),
                shape,
                actual,
            });
        }
        Ok(Self { shape, data: TensorData::from_le_bytes(dtype, bytes) })
    }

    pub fn dtype(&self) -> DType {
        self.data.dtype()
    }

    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &TensorData {
        &self.data
    }

    pub fn into_data(self) -> TensorData {
        self.data
    }

    /// Borrow the elements as `T`, or `None` if the dtype differs.
    pub fn as_slice<T: Element>(&self) -> Option<&[T]> {
        T::slice(&self.data)
    }

    /// Row-major strides, in elements, or `None` if a stride overflows.
    pub fn strides(&self) -> Option<Vec<u64>> {
        let mut strides = vec![1u64; self.shape.len()];
        for i in (0..self.shape.len().saturating_sub(1)).rev() {
            strides[i] = strides[i + 1].checked_mul(self.shape[i + 1])?;
        }
        Some(strides)
    }

    /// Flat buffer position of a multi-dimensional index.
    ///
    /// Returns `None` for an out-of-range index, which covers every index
    /// into a shape with a zero extent.
    pub fn flat_index(&self, index: &[u64]) -> Option<usize> {
        if index.len() != self.shape.len() || index.iter().zip(&self.shape).any(|(i, d)| i >= d) {
            return None;
        }
        let mut flat = 0u64;
        for (&i, stride) in index.iter().zip(self.strides()?) {
            flat = flat.checked_add(i.checked_mul(stride)?)?;
        }
        usize::try_from(flat).ok()
    }

    /// Element at a multi-dimensional index.
    pub fn get<T: Element>(&self, index: &[u64]) -> Option<T> {
        let flat = self.flat_index(index)?;
        self.as_slice::<T>()?.get(flat).copied()
    }

    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.data.to_le_bytes()
    }
}

/// An array tagged with an element-kind name instead of a Rust type.
///
/// Arrays that arrive from foreign sources (numpy headers, safetensors dtype
/// strings) carry their kind as text; it is resolved against the registry
/// when the file is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawArray {
    pub kind: String,
    pub shape: Vec<u64>,
    /// Row-major little-endian element bytes.
    pub bytes: Vec<u8>,
}

impl RawArray {
    pub fn new(kind: impl Into<String>, shape: Vec<u64>, bytes: Vec<u8>) -> Self {
        Self { kind: kind.into(), shape, bytes }
    }
}

/// A value accepted by the writer.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Array(Tensor),
    /// Stored as a 1-D `uint8` array of its UTF-8 bytes.
    Text(String),
    Raw(RawArray),
}

impl From<Tensor> for Field {
    fn from(tensor: Tensor) -> Self {
        Self::Array(tensor)
    }
}

impl From<&Tensor> for Field {
    fn from(tensor: &Tensor) -> Self {
        Self::Array(tensor.clone())
    }
}

impl From<String> for Field {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Field {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<RawArray> for Field {
    fn from(raw: RawArray) -> Self {
        Self::Raw(raw)
    }
}
