//! Codec error types.

use thiserror::Error;

/// Result alias for codec operations.
pub type Result<T> = std::result::Result<T, CodecError>;

/// Errors produced while decoding or encoding a PA-TNC message.
///
/// Every decoding variant carries the byte offset (from the start of the
/// message) of the field that could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Fewer bytes available than the field at `offset` requires.
    #[error("truncated input at offset {offset}: need {needed} bytes, have {available}")]
    Truncated {
        /// Offset of the field being read.
        offset: usize,
        /// Bytes required by the field.
        needed: usize,
        /// Bytes actually remaining.
        available: usize,
    },

    /// Message header carries a version other than 1.
    #[error("unsupported PA-TNC version {0}")]
    UnsupportedVersion(u8),

    /// Attribute length field is smaller than the attribute header or
    /// exceeds the remaining message.
    #[error("invalid attribute length {length} at offset {offset}")]
    InvalidAttributeLength {
        /// Offset of the attribute header.
        offset: usize,
        /// Declared attribute length.
        length: u32,
    },

    /// Attribute value has a size its type does not allow.
    #[error("invalid value size {size} for attribute {name} at offset {offset}")]
    InvalidValueSize {
        /// Offset of the attribute value.
        offset: usize,
        /// Human-readable attribute name.
        name: &'static str,
        /// Actual value size.
        size: usize,
    },

    /// A path or file name is not valid UTF-8.
    #[error("invalid UTF-8 string at offset {offset}")]
    InvalidString {
        /// Offset of the string.
        offset: usize,
    },

    /// Encoded digest does not match the attribute's declared measurement
    /// length.
    #[error("digest of {actual} bytes does not match measurement length {expected}")]
    DigestLengthMismatch {
        /// Declared measurement length.
        expected: usize,
        /// Length of the offending digest.
        actual: usize,
    },

    /// A variable-length field does not fit its length prefix.
    #[error("{field} of {size} bytes does not fit a {max}-byte limit")]
    FieldTooLarge {
        /// Name of the field.
        field: &'static str,
        /// Actual size.
        size: usize,
        /// Largest encodable size.
        max: usize,
    },
}

impl CodecError {
    /// Byte offset of the failure, when the error came from decoding.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::Truncated { offset, .. }
            | Self::InvalidAttributeLength { offset, .. }
            | Self::InvalidValueSize { offset, .. }
            | Self::InvalidString { offset } => Some(*offset),
            Self::UnsupportedVersion(_) => Some(0),
            Self::DigestLengthMismatch { .. } | Self::FieldTooLarge { .. } => None,
        }
    }
}
