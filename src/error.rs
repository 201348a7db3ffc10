//! Pixel buffer error taxonomy.

use core::fmt;

/// Errors from pixel buffer operations.
///
/// Every error is reported synchronously to the caller of the operation
/// that detected it; nothing is swallowed or retried internally.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum BufferError {
    /// Pixel coordinate, index, byte offset, or channel outside the
    /// buffer's bounds.
    OutOfRange,
    /// Two buffers were required to share a format but do not.
    FormatMismatch,
    /// Malformed construction input (sentinel format, undersized data,
    /// mismatched cubemap faces, ...).
    InvalidArgument,
    /// A sub-image's parent buffer object no longer exists.
    DanglingParent,
}

impl fmt::Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange => write!(f, "coordinate, offset or channel out of range"),
            Self::FormatMismatch => write!(f, "buffer formats do not match"),
            Self::InvalidArgument => write!(f, "malformed construction input"),
            Self::DanglingParent => write!(f, "parent buffer no longer exists"),
        }
    }
}

impl core::error::Error for BufferError {}
