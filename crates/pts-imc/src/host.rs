//! Plugin lifecycle shell.
//!
//! [`ImcHost`] mirrors the IF-IMC entry points a TNC client calls on a
//! measurement collector. Every call returns a [`TncResult`]; richer errors
//! are logged and collapsed at this boundary.

use std::sync::Arc;

use bytes::Bytes;

use crate::{
    agent::ImcAgent,
    config::ImcConfig,
    tnc::{
        ConnectionId, IF_IMC_VERSION_1, ImcId, PTS_MESSAGE_TYPE, TncConnectionState, TncResult,
        TncVersion,
    },
    transport::Transport,
};

/// IF-IMC entry points over a single [`ImcAgent`].
#[derive(Debug)]
pub struct ImcHost {
    config: ImcConfig,
    agent: Option<ImcAgent>,
}

impl ImcHost {
    /// Uninitialized host; agents created by [`initialize`](Self::initialize)
    /// use `config`.
    pub fn new(config: ImcConfig) -> Self {
        Self { config, agent: None }
    }

    /// The running agent, if initialized.
    pub fn agent(&self) -> Option<&ImcAgent> {
        self.agent.as_ref()
    }

    /// Initialize the IMC.
    ///
    /// Returns `NoCommonVersion` unless IF-IMC version 1 lies in
    /// `[min_version, max_version]`, and `AlreadyInitialized` on a second call.
    /// On success the negotiated version is written to `actual_version`.
    pub fn initialize(
        &mut self,
        imc_id: ImcId,
        min_version: TncVersion,
        max_version: TncVersion,
        actual_version: &mut TncVersion,
    ) -> TncResult {
        if self.agent.is_some() {
            tracing::warn!(imc_id, "IMC already initialized");
            return TncResult::AlreadyInitialized;
        }
        if !(min_version..=max_version).contains(&IF_IMC_VERSION_1) {
            tracing::warn!(imc_id, min_version, max_version, "no common IF-IMC version");
            return TncResult::NoCommonVersion;
        }

        *actual_version = IF_IMC_VERSION_1;
        self.agent = Some(ImcAgent::new(imc_id, self.config.clone()));
        tracing::info!(imc_id, version = IF_IMC_VERSION_1, "IMC initialized");
        TncResult::Success
    }

    /// Connection state change reported by the client.
    pub fn notify_connection_change(
        &self,
        imc_id: ImcId,
        connection_id: ConnectionId,
        new_state: TncConnectionState,
    ) -> TncResult {
        let agent = match self.checked_agent(imc_id) {
            Ok(agent) => agent,
            Err(result) => return result,
        };
        match agent.change_state(connection_id, new_state) {
            Ok(()) => TncResult::Success,
            Err(err) => {
                tracing::warn!(imc_id, connection_id, error = %err, "connection change rejected");
                err.tnc_result()
            },
        }
    }

    /// Start of a handshake.
    ///
    /// The measurer waits for the verifier to speak first, so nothing is sent.
    pub fn begin_handshake(&self, imc_id: ImcId, connection_id: ConnectionId) -> TncResult {
        let agent = match self.checked_agent(imc_id) {
            Ok(agent) => agent,
            Err(result) => return result,
        };
        if agent.state(connection_id).is_none() {
            tracing::warn!(imc_id, connection_id, "handshake on unknown connection");
            return TncResult::InvalidParameter;
        }
        tracing::debug!(imc_id, connection_id, "handshake started");
        TncResult::Success
    }

    /// Message from the verifier.
    pub fn receive_message(
        &self,
        imc_id: ImcId,
        connection_id: ConnectionId,
        message: Bytes,
        message_type: u32,
    ) -> TncResult {
        let agent = match self.checked_agent(imc_id) {
            Ok(agent) => agent,
            Err(result) => return result,
        };
        if message_type != PTS_MESSAGE_TYPE {
            tracing::warn!(imc_id, connection_id, message_type, "unexpected message type");
            return TncResult::InvalidParameter;
        }
        match agent.receive_message(connection_id, message) {
            Ok(()) => TncResult::Success,
            Err(err) => err.tnc_result(),
        }
    }

    /// End of a batch; no deferred work exists.
    pub fn batch_ending(&self, imc_id: ImcId, connection_id: ConnectionId) -> TncResult {
        match self.checked_agent(imc_id) {
            Ok(_) => {
                tracing::trace!(imc_id, connection_id, "batch ending");
                TncResult::Success
            },
            Err(result) => result,
        }
    }

    /// Shut down, dropping every connection.
    pub fn terminate(&mut self, imc_id: ImcId) -> TncResult {
        if let Err(result) = self.checked_agent(imc_id) {
            return result;
        }
        if let Some(agent) = self.agent.take() {
            tracing::info!(imc_id, connections = agent.connection_count(), "IMC terminated");
        }
        TncResult::Success
    }

    /// Install the channel replies are sent on.
    pub fn bind_functions(&self, imc_id: ImcId, transport: Arc<dyn Transport>) -> TncResult {
        match self.checked_agent(imc_id) {
            Ok(agent) => {
                agent.bind_transport(transport);
                TncResult::Success
            },
            Err(result) => result,
        }
    }

    fn checked_agent(&self, imc_id: ImcId) -> Result<&ImcAgent, TncResult> {
        let Some(agent) = self.agent.as_ref() else {
            tracing::warn!(imc_id, "IMC not initialized");
            return Err(TncResult::NotInitialized);
        };
        if agent.id() != imc_id {
            tracing::warn!(imc_id, expected = agent.id(), "IMC id mismatch");
            return Err(TncResult::InvalidParameter);
        }
        Ok(agent)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use pts_proto::{Attribute, PaTncMessage, ProtoCaps};

    use super::*;
    use crate::transport::TransportError;

    #[derive(Default)]
    struct Outbox(Mutex<Vec<Bytes>>);

    impl Transport for Outbox {
        fn send_message(&self, _: ConnectionId, message: Bytes) -> Result<(), TransportError> {
            self.0.lock().unwrap().push(message);
            Ok(())
        }
    }

    fn initialized() -> ImcHost {
        let mut host = ImcHost::new(ImcConfig::default());
        let mut version = 0;
        assert_eq!(host.initialize(1, 1, 1, &mut version), TncResult::Success);
        assert_eq!(version, IF_IMC_VERSION_1);
        host
    }

    #[test]
    fn calls_before_initialize_fail() {
        let mut host = ImcHost::new(ImcConfig::default());
        assert_eq!(
            host.notify_connection_change(1, 1, TncConnectionState::Create),
            TncResult::NotInitialized
        );
        assert_eq!(host.begin_handshake(1, 1), TncResult::NotInitialized);
        assert_eq!(
            host.receive_message(1, 1, Bytes::new(), PTS_MESSAGE_TYPE),
            TncResult::NotInitialized
        );
        assert_eq!(host.batch_ending(1, 1), TncResult::NotInitialized);
        assert_eq!(host.bind_functions(1, Arc::new(Outbox::default())), TncResult::NotInitialized);
        assert_eq!(host.terminate(1), TncResult::NotInitialized);
    }

    #[test]
    fn version_negotiation() {
        let mut host = ImcHost::new(ImcConfig::default());
        let mut version = 0;
        assert_eq!(host.initialize(1, 2, 3, &mut version), TncResult::NoCommonVersion);
        assert_eq!(version, 0);
        assert!(host.agent().is_none());

        assert_eq!(host.initialize(1, 1, 2, &mut version), TncResult::Success);
        assert_eq!(host.initialize(1, 1, 2, &mut version), TncResult::AlreadyInitialized);
    }

    #[test]
    fn wrong_imc_id_is_invalid_parameter() {
        let host = initialized();
        assert_eq!(host.begin_handshake(2, 1), TncResult::InvalidParameter);
    }

    #[test]
    fn full_round_trip() {
        let host = initialized();
        let outbox = Arc::new(Outbox::default());
        assert_eq!(host.bind_functions(1, outbox.clone()), TncResult::Success);
        assert_eq!(
            host.notify_connection_change(1, 4, TncConnectionState::Create),
            TncResult::Success
        );
        assert_eq!(host.begin_handshake(1, 4), TncResult::Success);

        let request =
            PaTncMessage::new(1).with(Attribute::ReqProtoCaps(ProtoCaps::all())).encode().unwrap();
        assert_eq!(host.receive_message(1, 4, request, PTS_MESSAGE_TYPE), TncResult::Success);
        assert_eq!(host.batch_ending(1, 4), TncResult::Success);

        let sent = outbox.0.lock().unwrap();
        let reply = PaTncMessage::decode(sent[0].clone()).unwrap();
        assert_eq!(reply.attributes(), [Attribute::ProtoCaps(ProtoCaps::V)]);
    }

    #[test]
    fn foreign_message_type_is_rejected() {
        let host = initialized();
        host.notify_connection_change(1, 4, TncConnectionState::Create);
        assert_eq!(
            host.receive_message(1, 4, Bytes::new(), 0x0000_0001),
            TncResult::InvalidParameter
        );
    }

    #[test]
    fn peer_error_is_fatal() {
        let host = initialized();
        host.bind_functions(1, Arc::new(Outbox::default()));
        host.notify_connection_change(1, 4, TncConnectionState::Create);
        let garbage = Bytes::from_static(&[9, 9, 9]);
        assert_eq!(host.receive_message(1, 4, garbage, PTS_MESSAGE_TYPE), TncResult::Fatal);
    }

    #[test]
    fn terminate_drops_agent() {
        let mut host = initialized();
        assert_eq!(host.terminate(1), TncResult::Success);
        assert!(host.agent().is_none());
        assert_eq!(host.begin_handshake(1, 1), TncResult::NotInitialized);
    }
}
