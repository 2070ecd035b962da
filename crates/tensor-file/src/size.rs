//! Human-readable byte counts for log lines and the inspector.

use humansize::{BINARY, format_size};

/// Format `bytes` with binary (IEC) units, e.g. `1.5 KiB`.
pub fn human_size(bytes: u64) -> String {
    format_size(bytes, BINARY)
}
