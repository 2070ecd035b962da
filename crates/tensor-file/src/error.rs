//! Error taxonomy for reading and writing tensor files.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors returned by the tensor file codec.
///
/// Every variant belongs to one [`ErrorKind`]; use [`TensorFileError::kind`]
/// when the category matters more than the exact cause.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum TensorFileError {
    #[error("unrecognized header: expected magic {expected:02x?}, found {found:02x?}")]
    BadMagic { expected: [u8; 12], found: [u8; 12] },

    #[error("unsupported version {major}.{minor} (expected {expected_major}.{expected_minor})")]
    UnsupportedVersion { major: u8, minor: u8, expected_major: u8, expected_minor: u8 },

    #[error("truncated {what}: need {needed} bytes at offset {offset}, file is {file_len} bytes")]
    Truncated { what: String, offset: u64, needed: u64, file_len: u64 },

    #[error("unknown dtype code {code} for field `{field}`")]
    UnknownDTypeCode { field: String, code: u8 },

    #[error("field name at offset {offset} is not valid UTF-8")]
    InvalidFieldName { offset: u64 },

    #[error("field `{field}`: shape {shape:?} overflows the addressable payload size")]
    PayloadTooLarge { field: String, shape: Vec<u64> },

    #[error(
        "payload of field `{field}` ({start}..{end}) overlaps payload of field `{other}` ({other_start}..{other_end})"
    )]
    OverlappingPayload {
        field: String,
        start: u64,
        end: u64,
        other: String,
        other_start: u64,
        other_end: u64,
    },

    #[error("directory lists field `{0}` more than once")]
    DuplicateEntry(String),

    #[error("duplicate field name `{0}`")]
    DuplicateField(String),

    #[error("text is not valid UTF-8: {0}")]
    InvalidText(#[from] std::string::FromUtf8Error),

    #[error("unsupported dtype `{kind}` for field `{field}`")]
    UnsupportedDType { field: String, kind: String },

    #[error("invalid alignment {0}: must be at least 1")]
    InvalidAlignment(u64),

    #[error("shape {shape:?} holds {expected} elements but {actual} were supplied")]
    ShapeMismatch { shape: Vec<u64>, expected: u64, actual: u64 },

    #[error("field `{field}`: raw payload is {actual} bytes, shape and dtype require {expected}")]
    RawLengthMismatch { field: String, expected: u64, actual: u64 },

    #[error("field name `{name}` is {len} bytes long (maximum {max})")]
    NameTooLong { name: String, len: usize, max: usize },

    #[error("field `{field}` has {ndim} dimensions (maximum {max})")]
    TooManyDimensions { field: String, ndim: usize, max: usize },

    #[error("{0} fields exceed the 32-bit field count")]
    TooManyFields(usize),

    #[error("expected a 1-dimensional uint8 array, found {dtype} with shape {shape:?}")]
    NotAString { dtype: String, shape: Vec<u64> },

    #[error("cannot {action} {}: {source}", .path.display())]
    File {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Coarse classification of a [`TensorFileError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The bytes on disk do not form a valid tensor file.
    Format,
    /// An array's element kind is not one of the registered dtypes.
    UnsupportedDType,
    /// The underlying storage failed.
    Io,
    /// The caller supplied inconsistent input; nothing was written.
    InvalidInput,
}

impl TensorFileError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BadMagic { .. }
            | Self::UnsupportedVersion { .. }
            | Self::Truncated { .. }
            | Self::UnknownDTypeCode { .. }
            | Self::InvalidFieldName { .. }
            | Self::PayloadTooLarge { .. }
            | Self::OverlappingPayload { .. }
            | Self::DuplicateEntry(_)
            | Self::InvalidText(_) => ErrorKind::Format,
            Self::UnsupportedDType { .. } => ErrorKind::UnsupportedDType,
            Self::Io(_) | Self::File { .. } => ErrorKind::Io,
            Self::DuplicateField(_)
            | Self::InvalidAlignment(_)
            | Self::ShapeMismatch { .. }
            | Self::RawLengthMismatch { .. }
            | Self::NameTooLong { .. }
            | Self::TooManyDimensions { .. }
            | Self::TooManyFields(_)
            | Self::NotAString { .. } => ErrorKind::InvalidInput,
        }
    }

    pub fn is_format(&self) -> bool {
        self.kind() == ErrorKind::Format
    }

    pub(crate) fn file(action: &'static str, path: &Path, source: io::Error) -> Self {
        Self::File { action, path: path.to_path_buf(), source }
    }

    pub(crate) fn truncated(what: impl Into<String>, offset: u64, needed: u64, file_len: u64) -> Self {
        Self::Truncated { what: what.into(), offset, needed, file_len }
    }
}

pub type Result<T> = std::result::Result<T, TensorFileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_convert_and_classify() {
        let err: TensorFileError = io::Error::new(io::ErrorKind::NotFound, "missing").into();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(!err.is_format());
    }

    #[test]
    fn file_errors_carry_the_path() {
        let err = TensorFileError::file(
            "open",
            Path::new("/tmp/missing.bsdf"),
            io::Error::new(io::ErrorKind::NotFound, "no such file"),
        );
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(err.to_string(), "cannot open /tmp/missing.bsdf: no such file");
    }

    #[test]
    fn duplicate_field_is_invalid_input() {
        let err = TensorFileError::DuplicateField("a".into());
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(err.to_string(), "duplicate field name `a`");
    }

    #[test]
    fn truncated_message_names_context() {
        let err = TensorFileError::truncated("payload of field `x`", 64, 12, 70);
        assert!(err.is_format());
        assert_eq!(
            err.to_string(),
            "truncated payload of field `x`: need 12 bytes at offset 64, file is 70 bytes"
        );
    }
}
