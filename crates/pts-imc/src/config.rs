//! IMC configuration.

use bytes::Bytes;
use pts_proto::{MeasAlgorithms, ProtoCaps};

use crate::algorithm::HashAlgorithm;

/// Read buffer size used when hashing files.
pub const DEFAULT_CHUNK_SIZE: usize = 32 * 1024;

/// Local measurer settings shared by all connections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImcConfig {
    /// Protocol capabilities offered to verifiers.
    pub proto_caps: ProtoCaps,
    /// Measurement algorithms available locally.
    pub supported_algorithms: MeasAlgorithms,
    /// Algorithm used until one is negotiated.
    pub default_algorithm: HashAlgorithm,
    /// TPM version information blob, if a TPM is present.
    pub tpm_version_info: Option<Bytes>,
    /// Bytes read per hashing step.
    pub chunk_size: usize,
}

impl Default for ImcConfig {
    fn default() -> Self {
        Self {
            proto_caps: ProtoCaps::V,
            supported_algorithms: MeasAlgorithms::all(),
            default_algorithm: HashAlgorithm::Sha256,
            tpm_version_info: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}
