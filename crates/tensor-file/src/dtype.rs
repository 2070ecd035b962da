//! Registry of the scalar element kinds a tensor file can store.
//!
//! Each kind has a stable one-byte code (1..=11). The numbering follows the
//! `Struct::EType` enumeration of the renderer that consumes these files, so
//! the codes must never be reordered.

use crate::error::{Result, TensorFileError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Element type of a stored array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum DType {
    UInt8 = 1,
    Int8 = 2,
    UInt16 = 3,
    Int16 = 4,
    UInt32 = 5,
    Int32 = 6,
    UInt64 = 7,
    Int64 = 8,
    Float16 = 9,
    Float32 = 10,
    Float64 = 11,
}

impl DType {
    /// All registered kinds, in code order.
    pub const ALL: [DType; 11] = [
        Self::UInt8,
        Self::Int8,
        Self::UInt16,
        Self::Int16,
        Self::UInt32,
        Self::Int32,
        Self::UInt64,
        Self::Int64,
        Self::Float16,
        Self::Float32,
        Self::Float64,
    ];

    /// The one-byte code written into the field directory.
    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Look up the kind for a directory code.
    ///
    /// Returns `None` for codes outside 1..=11; the directory decoder turns
    /// that into a format error naming the field.
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::UInt8),
            2 => Some(Self::Int8),
            3 => Some(Self::UInt16),
            4 => Some(Self::Int16),
            5 => Some(Self::UInt32),
            6 => Some(Self::Int32),
            7 => Some(Self::UInt64),
            8 => Some(Self::Int64),
            9 => Some(Self::Float16),
            10 => Some(Self::Float32),
            11 => Some(Self::Float64),
            _ => None,
        }
    }

    /// Resolve an element-kind name such as `"float32"`, `"f32"` or `"<u2"`.
    ///
    /// Accepts the long names used by [`DType::name`], the short Rust-style
    /// names, and little-endian numpy type strings. Anything else (including
    /// kinds like `bfloat16` or `bool` that the format cannot represent) is
    /// rejected with [`TensorFileError::UnsupportedDType`].
    pub fn from_name(field: &str, kind: &str) -> Result<Self> {
        let normalized = kind.trim().to_ascii_lowercase();
        let dtype = match normalized.as_str() {
            "uint8" | "u8" | "|u1" | "<u1" | "u1" => Self::UInt8,
            "int8" | "i8" | "|i1" | "<i1" | "i1" => Self::Int8,
            "uint16" | "u16" | "<u2" | "u2" => Self::UInt16,
            "int16" | "i16" | "<i2" | "i2" => Self::Int16,
            "uint32" | "u32" | "<u4" | "u4" => Self::UInt32,
            "int32" | "i32" | "<i4" | "i4" => Self::Int32,
            "uint64" | "u64" | "<u8" => Self::UInt64,
            "int64" | "i64" | "<i8" => Self::Int64,
            "float16" | "f16" | "half" | "<f2" | "f2" => Self::Float16,
            "float32" | "f32" | "float" | "single" | "<f4" | "f4" => Self::Float32,
            "float64" | "f64" | "double" | "<f8" | "f8" => Self::Float64,
            _ => {
                return Err(TensorFileError::UnsupportedDType {
                    field: field.to_string(),
                    kind: kind.to_string(),
                });
            }
        };
        Ok(dtype)
    }

    /// Size of one element in bytes.
    #[inline]
    pub const fn element_size(self) -> usize {
        match self {
            Self::UInt8 | Self::Int8 => 1,
            Self::UInt16 | Self::Int16 | Self::Float16 => 2,
            Self::UInt32 | Self::Int32 | Self::Float32 => 4,
            Self::UInt64 | Self::Int64 | Self::Float64 => 8,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::UInt8 => "uint8",
            Self::Int8 => "int8",
            Self::UInt16 => "uint16",
            Self::Int16 => "int16",
            Self::UInt32 => "uint32",
            Self::Int32 => "int32",
            Self::UInt64 => "uint64",
            Self::Int64 => "int64",
            Self::Float16 => "float16",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
        }
    }

    pub const fn is_float(self) -> bool {
        matches!(self, Self::Float16 | Self::Float32 | Self::Float64)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_one_through_eleven() {
        for (i, dtype) in DType::ALL.iter().enumerate() {
            assert_eq!(dtype.code() as usize, i + 1);
            assert_eq!(DType::from_code(dtype.code()), Some(*dtype));
        }
    }

    #[test]
    fn unknown_codes_are_rejected() {
        assert_eq!(DType::from_code(0), None);
        assert_eq!(DType::from_code(12), None);
        assert_eq!(DType::from_code(255), None);
    }

    #[test]
    fn element_sizes() {
        assert_eq!(DType::UInt8.element_size(), 1);
        assert_eq!(DType::Float16.element_size(), 2);
        assert_eq!(DType::Int32.element_size(), 4);
        assert_eq!(DType::Float64.element_size(), 8);
    }

    #[test]
    fn names_round_trip_through_from_name() {
        for dtype in DType::ALL {
            assert_eq!(DType::from_name("f", dtype.name()).unwrap(), dtype);
        }
        assert_eq!(DType::from_name("f", "<f4").unwrap(), DType::Float32);
        assert_eq!(DType::from_name("f", " Float64 ").unwrap(), DType::Float64);
    }

    #[test]
    fn unregistered_kind_names_the_field() {
        let err = DType::from_name("weights", "bfloat16").unwrap_err();
        assert!(matches!(
            err,
            TensorFileError::UnsupportedDType { ref field, ref kind }
                if field == "weights" && kind == "bfloat16"
        ));
        assert!(DType::from_name("mask", "bool").is_err());
        assert!(DType::from_name("z", "complex64").is_err());
    }
}
