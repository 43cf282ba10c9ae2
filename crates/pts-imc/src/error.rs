//! Error types for the measurer.

use std::{io, path::PathBuf};

use pts_proto::{CodecError, PaTncError};
use thiserror::Error;

use crate::{
    connection::UnsupportedPhase,
    tnc::{ConnectionId, TncResult},
    transport::TransportError,
};

/// Failure while measuring a file or directory.
///
/// Any failure aborts the whole request; no partial results are returned.
#[derive(Debug, Error)]
pub enum MeasurementError {
    /// A file could not be opened or read.
    #[error("failed to hash '{}': {source}", path.display())]
    Io {
        /// File being hashed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A directory could not be opened or enumerated.
    #[error("failed to read directory '{}': {source}", path.display())]
    Directory {
        /// Directory being enumerated.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A directory entry name is not valid UTF-8 and cannot be reported.
    #[error("file name of '{}' is not valid UTF-8", path.display())]
    NonUtf8Name {
        /// Offending entry.
        path: PathBuf,
    },
}

impl MeasurementError {
    /// Path that could not be measured.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Io { path, .. } | Self::Directory { path, .. } | Self::NonUtf8Name { path } => {
                path
            },
        }
    }
}

/// Errors raised while serving a connection.
#[derive(Debug, Error)]
pub enum ImcError {
    /// Inbound message could not be decoded.
    #[error("failed to parse PA-TNC message: {0}")]
    Parse(#[source] CodecError),

    /// The verifier reported one or more errors; the handshake stops.
    #[error("verifier reported {} error(s)", errors.len())]
    Protocol {
        /// Errors carried in the inbound message.
        errors: Vec<PaTncError>,
    },

    /// The current phase has no reply implementation.
    #[error("no reply implemented for phase {0:?}")]
    UnsupportedPhase(UnsupportedPhase),

    /// Nothing was requested, so there is nothing to send.
    #[error("no request to answer")]
    NothingToSend,

    /// A requested measurement failed.
    #[error(transparent)]
    Measurement(#[from] MeasurementError),

    /// Reply could not be encoded.
    #[error("failed to encode reply: {0}")]
    Encode(#[source] CodecError),

    /// No state exists for the connection.
    #[error("unknown connection {0}")]
    UnknownConnection(ConnectionId),

    /// State already exists for the connection.
    #[error("connection {0} already exists")]
    DuplicateConnection(ConnectionId),

    /// No transport has been bound.
    #[error("no transport bound")]
    NotBound,

    /// Reply could not be delivered.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Message type is not TCG PTS.
    #[error("unexpected message type {0:#010x}")]
    InvalidMessageType(u32),
}

impl ImcError {
    /// Whether the error was caused by the peer rather than local failure.
    pub fn is_peer_error(&self) -> bool {
        matches!(self, Self::Parse(_) | Self::Protocol { .. } | Self::InvalidMessageType(_))
    }

    /// IF-IMC result reported to the host for this error.
    pub fn tnc_result(&self) -> TncResult {
        match self {
            Self::InvalidMessageType(_) | Self::UnknownConnection(_) => TncResult::InvalidParameter,
            Self::DuplicateConnection(_) => TncResult::IllegalOperation,
            Self::NotBound => TncResult::NotInitialized,
            Self::Parse(_)
            | Self::Protocol { .. }
            | Self::UnsupportedPhase(_)
            | Self::NothingToSend
            | Self::Measurement(_)
            | Self::Encode(_)
            | Self::Transport(_) => TncResult::Fatal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handshake_failures_are_fatal() {
        let err = ImcError::Protocol { errors: Vec::new() };
        assert_eq!(err.tnc_result(), TncResult::Fatal);
        assert!(err.is_peer_error());

        let err = ImcError::Measurement(MeasurementError::Io {
            path: PathBuf::from("/missing"),
            source: io::Error::from(io::ErrorKind::NotFound),
        });
        assert_eq!(err.tnc_result(), TncResult::Fatal);
        assert!(!err.is_peer_error());
    }

    #[test]
    fn wrong_message_type_is_invalid_parameter() {
        assert_eq!(ImcError::InvalidMessageType(1).tnc_result(), TncResult::InvalidParameter);
    }

    #[test]
    fn measurement_error_names_path() {
        let err = MeasurementError::Directory {
            path: PathBuf::from("/etc"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert_eq!(err.path(), std::path::Path::new("/etc"));
        assert!(err.to_string().contains("/etc"));
    }
}
