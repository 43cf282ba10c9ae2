//! Per-connection handshake state.
//!
//! # Architecture: Action-Based State Machine
//!
//! [`ConnectionState::handle_message`] takes the raw bytes of one inbound
//! PA-TNC message and returns the actions the driver must perform. It never
//! touches the network; the only I/O it performs is reading files the
//! verifier asked to have measured.
//!
//! # Phases
//!
//! ```text
//!              ReqProtoCaps        MeasAlgo         GetTpmVersionInfo
//! ┌──────┐ ─────────────> ┌──────┐ ─────> ┌─────────┐ ──────> ┌─────────┐
//! │ Init │                │ Caps │        │ Algo    │         │ TpmInfo │
//! └──────┘                └──────┘        └─────────┘         └─────────┘
//!                                  ReqFileMeas
//!                    (any phase) ──────────────> ┌────────────┐
//!                                                │ Collecting │
//!                                                └────────────┘
//! ```
//!
//! The phase always reflects the last recognized request in the most recent
//! message. Requests that have no reply implementation (AIK, evidence,
//! metadata, integrity log) move to an [`UnsupportedPhase`] and the reply
//! step fails.

use bytes::Bytes;
use pts_proto::{MeasAlgorithms, PaTncMessage, ProtoCaps};

use crate::{
    algorithm::HashAlgorithm,
    config::ImcConfig,
    dispatch::{self, DispatchOutcome},
    error::ImcError,
    response,
    tnc::{ConnectionId, TncConnectionState},
};

/// Actions returned by the connection state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImcAction {
    /// Deliver this encoded PA-TNC message to the verifier.
    SendMessage(Bytes),
}

/// Requests that are recognized but have no reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnsupportedPhase {
    /// Attestation Identity Key requested
    AwaitingAik,
    /// Functional component evidence requested
    AwaitingFunctionalEvidence,
    /// Attestation evidence generation requested
    GeneratingAttestationEvidence,
    /// File metadata requested
    AwaitingFileMetadata,
    /// Integrity measurement log requested
    AwaitingIntegrityLog,
}

/// Handshake phase of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// No request received yet
    Init,
    /// Protocol capabilities requested
    NegotiatingCaps,
    /// Measurement algorithms offered
    NegotiatingAlgorithm,
    /// TPM version information requested
    AwaitingTpmInfo,
    /// File or directory measurements requested
    CollectingFileMeasurements,
    /// A request this measurer cannot answer
    Unsupported(UnsupportedPhase),
}

/// A queued file or directory measurement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasurementRequest {
    /// Path exactly as requested.
    pub path: String,
    /// Identifier echoed in the reply.
    pub request_id: u16,
    /// Whether `path` names a directory.
    pub is_directory: bool,
}

/// State for one verifier connection.
#[derive(Debug, Clone)]
pub struct ConnectionState {
    connection_id: ConnectionId,
    phase: Phase,
    tnc_state: TncConnectionState,
    negotiated_caps: ProtoCaps,
    negotiated_algorithm: HashAlgorithm,
    no_common_algorithm: bool,
    pending_file_requests: Vec<MeasurementRequest>,
    pending_directory_requests: Vec<MeasurementRequest>,
    next_message_id: u32,
}

impl ConnectionState {
    /// Fresh state for a newly created connection.
    pub fn new(connection_id: ConnectionId, config: &ImcConfig) -> Self {
        Self {
            connection_id,
            phase: Phase::Init,
            tnc_state: TncConnectionState::Create,
            negotiated_caps: config.proto_caps,
            negotiated_algorithm: config.default_algorithm,
            no_common_algorithm: false,
            pending_file_requests: Vec::new(),
            pending_directory_requests: Vec::new(),
            next_message_id: 1,
        }
    }

    /// Connection identifier.
    #[must_use]
    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    /// Current handshake phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Last state reported by the host.
    #[must_use]
    pub fn tnc_state(&self) -> TncConnectionState {
        self.tnc_state
    }

    /// Capabilities agreed with the verifier (local capabilities until asked).
    #[must_use]
    pub fn negotiated_caps(&self) -> ProtoCaps {
        self.negotiated_caps
    }

    /// Algorithm used for measurements on this connection.
    #[must_use]
    pub fn negotiated_algorithm(&self) -> HashAlgorithm {
        self.negotiated_algorithm
    }

    /// Whether the last algorithm offer had nothing in common with local support.
    #[must_use]
    pub fn no_common_algorithm(&self) -> bool {
        self.no_common_algorithm
    }

    /// Single-file requests awaiting a reply.
    #[must_use]
    pub fn pending_file_requests(&self) -> &[MeasurementRequest] {
        &self.pending_file_requests
    }

    /// Directory requests awaiting a reply.
    #[must_use]
    pub fn pending_directory_requests(&self) -> &[MeasurementRequest] {
        &self.pending_directory_requests
    }

    /// Record the host's view of the connection.
    pub fn set_tnc_state(&mut self, state: TncConnectionState) {
        self.tnc_state = state;
    }

    /// Process one inbound PA-TNC message.
    ///
    /// On success the returned actions contain exactly one reply, which may
    /// hold no attributes if every measurement request turned out empty.
    ///
    /// # Errors
    ///
    /// - `ImcError::Parse` if the message is malformed; state is unchanged
    /// - `ImcError::Protocol` if the message carried PA-TNC errors; no reply
    /// - `ImcError::NothingToSend` if no request has been received yet
    /// - `ImcError::UnsupportedPhase` if the last request has no reply
    /// - `ImcError::Measurement` if any requested measurement failed
    /// - `ImcError::Encode` if the reply cannot be encoded
    pub fn handle_message(
        &mut self,
        data: Bytes,
        config: &ImcConfig,
    ) -> Result<Vec<ImcAction>, ImcError> {
        let message = PaTncMessage::decode(data).map_err(ImcError::Parse)?;
        let inbound = *message.header();
        tracing::debug!(
            connection_id = self.connection_id,
            message_id = inbound.message_id(),
            attributes = message.attributes().len(),
            "received PA-TNC message"
        );

        let DispatchOutcome { fatal, peer_errors } =
            dispatch::dispatch(self, config, message.attributes());
        if fatal {
            return Err(ImcError::Protocol { errors: peer_errors });
        }

        let reply = response::build_reply(self, config, &inbound)?;
        let encoded = reply.encode().map_err(ImcError::Encode)?;
        tracing::debug!(
            connection_id = self.connection_id,
            message_id = reply.header().message_id(),
            attributes = reply.attributes().len(),
            phase = ?self.phase,
            "sending PA-TNC reply"
        );
        Ok(vec![ImcAction::SendMessage(encoded)])
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    pub(crate) fn clear_pending_requests(&mut self) {
        self.pending_file_requests.clear();
        self.pending_directory_requests.clear();
    }

    pub(crate) fn take_pending_requests(
        &mut self,
    ) -> (Vec<MeasurementRequest>, Vec<MeasurementRequest>) {
        (
            std::mem::take(&mut self.pending_file_requests),
            std::mem::take(&mut self.pending_directory_requests),
        )
    }

    pub(crate) fn queue_request(&mut self, request: MeasurementRequest) {
        if request.is_directory {
            self.pending_directory_requests.push(request);
        } else {
            self.pending_file_requests.push(request);
        }
    }

    pub(crate) fn negotiate_caps(&mut self, local: ProtoCaps, peer: ProtoCaps) {
        self.negotiated_caps = local & peer;
    }

    pub(crate) fn negotiate_algorithm(&mut self, local: MeasAlgorithms, peer: MeasAlgorithms) {
        match HashAlgorithm::negotiate(local, peer) {
            Some(algorithm) => {
                self.negotiated_algorithm = algorithm;
                self.no_common_algorithm = false;
            },
            None => self.no_common_algorithm = true,
        }
    }

    pub(crate) fn allocate_message_id(&mut self) -> u32 {
        let id = self.next_message_id;
        self.next_message_id = self.next_message_id.wrapping_add(1);
        id
    }
}
