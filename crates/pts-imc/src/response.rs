//! Reply construction.
//!
//! The reply depends only on the phase the dispatcher left the connection in.
//! Measurement replies carry one File Measurement attribute per request, in
//! the order requests arrived; single-file requests are answered before
//! directory requests.

use std::path::Path;

use pts_proto::{
    Attribute, FileMeasurements, MessageHeader, PaTncError, PaTncMessage, PtsErrorCode,
};

use crate::{
    config::ImcConfig,
    connection::{ConnectionState, MeasurementRequest, Phase},
    error::ImcError,
    measurement::MeasurementCollector,
};

/// Build the reply for the connection's current phase.
///
/// Pending measurement requests are consumed.
///
/// # Errors
///
/// - `ImcError::NothingToSend` in [`Phase::Init`]
/// - `ImcError::UnsupportedPhase` for requests without a reply
/// - `ImcError::Measurement` if any file or directory cannot be measured
/// - `ImcError::Encode` if a measurement cannot be represented on the wire
pub fn build_reply(
    state: &mut ConnectionState,
    config: &ImcConfig,
    inbound: &MessageHeader,
) -> Result<PaTncMessage, ImcError> {
    let attributes = match state.phase() {
        Phase::Init => return Err(ImcError::NothingToSend),
        Phase::Unsupported(phase) => return Err(ImcError::UnsupportedPhase(phase)),
        Phase::NegotiatingCaps => vec![Attribute::ProtoCaps(state.negotiated_caps())],
        Phase::NegotiatingAlgorithm => {
            let selection = if state.no_common_algorithm() {
                None
            } else {
                state.negotiated_algorithm().meas_flag()
            };
            vec![match selection {
                Some(flag) => Attribute::MeasAlgoSelection(flag),
                None => Attribute::PaTncError(PaTncError::pts(
                    PtsErrorCode::HashAlgNotSupported,
                    inbound.to_bytes(),
                )),
            }]
        },
        Phase::AwaitingTpmInfo => vec![match &config.tpm_version_info {
            Some(info) => Attribute::TpmVersionInfo(info.clone()),
            None => {
                tracing::warn!(
                    connection_id = state.connection_id(),
                    "TPM version information requested but no TPM is available"
                );
                Attribute::PaTncError(PaTncError::pts(
                    PtsErrorCode::TpmVersNotSupported,
                    inbound.to_bytes(),
                ))
            },
        }],
        Phase::CollectingFileMeasurements => {
            let collector =
                MeasurementCollector::with_chunk_size(state.negotiated_algorithm(), config.chunk_size);
            let (files, directories) = state.take_pending_requests();
            let mut attributes = Vec::with_capacity(files.len() + directories.len());
            for request in &files {
                attributes.push(Attribute::FileMeas(measure_file(&collector, request)?));
            }
            for request in &directories {
                attributes.push(Attribute::FileMeas(measure_directory(&collector, request)?));
            }
            attributes
        },
    };

    // Allocated only once the reply is complete.
    let mut reply = PaTncMessage::new(state.allocate_message_id());
    for attribute in attributes {
        reply.push(attribute);
    }
    Ok(reply)
}

fn meas_len(collector: &MeasurementCollector) -> u16 {
    // Digest sizes are at most 64 bytes.
    u16::try_from(collector.algorithm().digest_size()).unwrap_or(u16::MAX)
}

fn measure_file(
    collector: &MeasurementCollector,
    request: &MeasurementRequest,
) -> Result<FileMeasurements, ImcError> {
    let digest = collector.hash_file(Path::new(&request.path))?;
    let mut measurements = FileMeasurements::new(request.request_id, meas_len(collector));
    measurements.push(digest, request.path.clone()).map_err(ImcError::Encode)?;
    Ok(measurements)
}

fn measure_directory(
    collector: &MeasurementCollector,
    request: &MeasurementRequest,
) -> Result<FileMeasurements, ImcError> {
    let entries = collector.hash_directory(Path::new(&request.path))?;
    let mut measurements = FileMeasurements::new(request.request_id, meas_len(collector));
    for entry in entries {
        measurements.push(entry.digest, entry.file_name).map_err(ImcError::Encode)?;
    }
    Ok(measurements)
}
