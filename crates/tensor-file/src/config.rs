//! Per-call options for the reader and writer.

use crate::error::{Result, TensorFileError};
use serde::{Deserialize, Serialize};

/// Payload alignment used when none is given.
pub const DEFAULT_ALIGNMENT: u64 = 8;

/// Writer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteOptions {
    /// Every payload starts at a multiple of this many bytes.
    pub alignment: u64,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self { alignment: DEFAULT_ALIGNMENT }
    }
}

impl WriteOptions {
    pub fn with_alignment(alignment: u64) -> Self {
        Self { alignment }
    }

    pub fn validate(&self) -> Result<()> {
        if self.alignment == 0 {
            return Err(TensorFileError::InvalidAlignment(self.alignment));
        }
        Ok(())
    }
}

/// What the reader does when the directory names a field twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Fail with a format error.
    #[default]
    Reject,
    /// The later entry replaces the earlier one.
    LastWins,
}

/// Reader configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadOptions {
    pub duplicates: DuplicatePolicy,
    /// Reject files in which two non-empty payloads share bytes.
    pub check_overlap: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self { duplicates: DuplicatePolicy::Reject, check_overlap: true }
    }
}

impl ReadOptions {
    /// Lenient reading: later duplicate names win and overlapping payloads
    /// are not checked. Payload bounds are still enforced.
    pub fn permissive() -> Self {
        Self { duplicates: DuplicatePolicy::LastWins, check_overlap: false }
    }
}
