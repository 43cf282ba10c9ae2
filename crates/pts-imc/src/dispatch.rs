//! Inbound attribute dispatch.
//!
//! Attributes are processed in wire order. Each recognized request moves the
//! connection to the matching [`Phase`]; the last one wins. A PA-TNC Error
//! attribute from the verifier marks the message fatal and no further
//! attributes change state.

use pts_proto::{Attribute, ErrorDetail, PaTncError};

use crate::{
    config::ImcConfig,
    connection::{ConnectionState, MeasurementRequest, Phase, UnsupportedPhase},
};

/// Result of dispatching one message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// The verifier reported an error; the handshake must stop.
    pub fatal: bool,
    /// Errors reported by the verifier, in order.
    pub peer_errors: Vec<PaTncError>,
}

/// Apply every attribute of an inbound message to `state`.
///
/// Measurement requests queued by earlier messages are discarded first, so
/// the queues only ever hold requests from the message being answered.
pub fn dispatch(
    state: &mut ConnectionState,
    config: &ImcConfig,
    attributes: &[Attribute],
) -> DispatchOutcome {
    let mut outcome = DispatchOutcome::default();
    state.clear_pending_requests();

    for attribute in attributes {
        if let Attribute::PaTncError(error) = attribute {
            log_peer_error(state, error);
            outcome.fatal = true;
            outcome.peer_errors.push(*error);
            continue;
        }
        if outcome.fatal {
            continue;
        }
        apply(state, config, attribute);
    }

    outcome
}

fn apply(state: &mut ConnectionState, config: &ImcConfig, attribute: &Attribute) {
    let connection_id = state.connection_id();
    match attribute {
        Attribute::ReqProtoCaps(peer) => {
            state.negotiate_caps(config.proto_caps, *peer);
            state.set_phase(Phase::NegotiatingCaps);
            tracing::debug!(
                connection_id,
                peer = ?peer,
                negotiated = ?state.negotiated_caps(),
                "protocol capabilities requested"
            );
        },
        Attribute::MeasAlgo(peer) => {
            state.negotiate_algorithm(config.supported_algorithms, *peer);
            state.set_phase(Phase::NegotiatingAlgorithm);
            if state.no_common_algorithm() {
                tracing::warn!(connection_id, peer = ?peer, "no common measurement algorithm");
            } else {
                tracing::debug!(
                    connection_id,
                    algorithm = %state.negotiated_algorithm(),
                    "measurement algorithm selected"
                );
            }
        },
        Attribute::GetTpmVersionInfo => {
            state.set_phase(Phase::AwaitingTpmInfo);
            tracing::debug!(connection_id, "TPM version information requested");
        },
        Attribute::GetAik => unsupported(state, UnsupportedPhase::AwaitingAik),
        Attribute::ReqFunctCompEvid(_) => {
            unsupported(state, UnsupportedPhase::AwaitingFunctionalEvidence);
        },
        Attribute::GenAttestEvid(_) => {
            unsupported(state, UnsupportedPhase::GeneratingAttestationEvidence);
        },
        Attribute::ReqFileMeta(_) => unsupported(state, UnsupportedPhase::AwaitingFileMetadata),
        Attribute::ReqIntegMeasLog(_) => {
            unsupported(state, UnsupportedPhase::AwaitingIntegrityLog);
        },
        Attribute::ReqFileMeas(request) => {
            tracing::debug!(
                connection_id,
                request_id = request.request_id,
                directory = request.directory,
                path = %request.path,
                "measurement requested"
            );
            state.queue_request(MeasurementRequest {
                path: request.path.clone(),
                request_id: request.request_id,
                is_directory: request.directory,
            });
            state.set_phase(Phase::CollectingFileMeasurements);
        },
        Attribute::PaTncError(_)
        | Attribute::ProtoCaps(_)
        | Attribute::MeasAlgoSelection(_)
        | Attribute::TpmVersionInfo(_)
        | Attribute::FileMeas(_)
        | Attribute::Unknown { .. } => {
            tracing::info!(
                connection_id,
                vendor_id = %attribute.vendor_id(),
                attr_type = attribute.attr_type(),
                name = attribute.name(),
                "ignoring attribute"
            );
        },
    }
}

fn unsupported(state: &mut ConnectionState, phase: UnsupportedPhase) {
    tracing::warn!(connection_id = state.connection_id(), ?phase, "request not supported");
    state.set_phase(Phase::Unsupported(phase));
}

fn log_peer_error(state: &ConnectionState, error: &PaTncError) {
    let connection_id = state.connection_id();
    let code = error.code_name();
    let vendor = error.error_vendor;
    match error.detail {
        ErrorDetail::Offset(offset) => {
            tracing::error!(connection_id, %vendor, code, offset, "verifier reported error");
        },
        ErrorDetail::AttrInfo(info) => {
            let flags = info[0];
            let attr_vendor = pts_proto::VendorId::from_bytes([info[1], info[2], info[3]]);
            let attr_type = u32::from_be_bytes([info[4], info[5], info[6], info[7]]);
            tracing::error!(
                connection_id,
                %vendor,
                code,
                flags,
                attr_vendor = %attr_vendor,
                attr_type,
                attr_name = pts_proto::attributes::type_name(attr_vendor, attr_type),
                "verifier reported error"
            );
        },
        ErrorDetail::None => {
            tracing::error!(connection_id, %vendor, code, "verifier reported error");
        },
    }
}
