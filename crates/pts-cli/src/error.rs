//! CLI errors.

use std::{io, path::PathBuf};

use pts_imc::{MeasurementError, TncResult};
use thiserror::Error;

/// Anything that stops a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Measuring the requested path failed.
    #[error(transparent)]
    Measurement(#[from] MeasurementError),

    /// The measurer host rejected a lifecycle call.
    #[error("measurer host returned {0:?}")]
    Host(TncResult),

    /// An input file could not be read.
    #[error("failed to read '{}': {source}", path.display())]
    Read {
        /// File being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The output directory could not be prepared.
    #[error("failed to create '{}': {source}", path.display())]
    OutputDir {
        /// Directory being created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Writing to stdout failed.
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),

    /// `--tpm-version-info` is not valid hex.
    #[error("invalid TPM version info: {0}")]
    TpmVersionInfo(#[from] hex::FromHexError),

    /// At least one replayed message was not answered.
    #[error("{failed} of {total} messages failed")]
    ReplayFailed {
        /// Messages that produced an error.
        failed: usize,
        /// Messages replayed.
        total: usize,
    },
}
