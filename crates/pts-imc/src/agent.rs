//! Connection table and action execution.
//!
//! The agent keeps one [`ConnectionState`] per connection behind its own lock,
//! so messages for different connections are processed in parallel while
//! messages for the same connection are serialized.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError, RwLock},
};

use bytes::Bytes;

use crate::{
    config::ImcConfig,
    connection::{ConnectionState, ImcAction},
    error::ImcError,
    tnc::{ConnectionId, ImcId, TncConnectionState},
    transport::Transport,
};

type SharedState = Arc<Mutex<ConnectionState>>;

/// Measurer agent serving every connection of one IMC instance.
pub struct ImcAgent {
    id: ImcId,
    config: ImcConfig,
    sessions: RwLock<HashMap<ConnectionId, SharedState>>,
    transport: RwLock<Option<Arc<dyn Transport>>>,
}

impl std::fmt::Debug for ImcAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImcAgent")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("connections", &self.connection_count())
            .field("bound", &self.is_bound())
            .finish_non_exhaustive()
    }
}

impl ImcAgent {
    /// Agent with no connections and no transport.
    pub fn new(id: ImcId, config: ImcConfig) -> Self {
        Self {
            id,
            config,
            sessions: RwLock::new(HashMap::new()),
            transport: RwLock::new(None),
        }
    }

    /// Identifier assigned by the host.
    pub fn id(&self) -> ImcId {
        self.id
    }

    /// Install the transport used for replies, replacing any previous one.
    pub fn bind_transport(&self, transport: Arc<dyn Transport>) {
        *self.transport.write().unwrap_or_else(PoisonError::into_inner) = Some(transport);
        tracing::debug!(imc_id = self.id, "transport bound");
    }

    /// Whether a transport is installed.
    pub fn is_bound(&self) -> bool {
        self.transport.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    /// Number of tracked connections.
    pub fn connection_count(&self) -> usize {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Start tracking a connection.
    ///
    /// # Errors
    ///
    /// - `ImcError::DuplicateConnection` if the connection is already tracked
    pub fn create_state(&self, connection_id: ConnectionId) -> Result<(), ImcError> {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        if sessions.contains_key(&connection_id) {
            return Err(ImcError::DuplicateConnection(connection_id));
        }
        let state = ConnectionState::new(connection_id, &self.config);
        sessions.insert(connection_id, Arc::new(Mutex::new(state)));
        tracing::info!(imc_id = self.id, connection_id, "connection created");
        Ok(())
    }

    /// Stop tracking a connection, returning its final state.
    ///
    /// # Errors
    ///
    /// - `ImcError::UnknownConnection` if the connection is not tracked
    pub fn delete_state(&self, connection_id: ConnectionId) -> Result<ConnectionState, ImcError> {
        let shared = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&connection_id)
            .ok_or(ImcError::UnknownConnection(connection_id))?;
        tracing::info!(imc_id = self.id, connection_id, "connection deleted");
        let state = shared.lock().unwrap_or_else(PoisonError::into_inner).clone();
        Ok(state)
    }

    /// Apply a host-reported state change.
    ///
    /// `Create` starts tracking and `Delete` stops; every other state is
    /// recorded on the existing connection.
    ///
    /// # Errors
    ///
    /// - `ImcError::DuplicateConnection` on `Create` for a tracked connection
    /// - `ImcError::UnknownConnection` for any other state on an untracked one
    pub fn change_state(
        &self,
        connection_id: ConnectionId,
        new_state: TncConnectionState,
    ) -> Result<(), ImcError> {
        match new_state {
            TncConnectionState::Create => self.create_state(connection_id),
            TncConnectionState::Delete => self.delete_state(connection_id).map(|_| ()),
            _ => {
                let shared = self.session(connection_id)?;
                shared.lock().unwrap_or_else(PoisonError::into_inner).set_tnc_state(new_state);
                tracing::debug!(
                    imc_id = self.id,
                    connection_id,
                    state = ?new_state,
                    "connection state changed"
                );
                Ok(())
            },
        }
    }

    /// Snapshot of a connection's state.
    pub fn state(&self, connection_id: ConnectionId) -> Option<ConnectionState> {
        let shared = self.session(connection_id).ok()?;
        let state = shared.lock().unwrap_or_else(PoisonError::into_inner).clone();
        Some(state)
    }

    /// Handle one inbound PA-TNC message and deliver the reply.
    ///
    /// # Errors
    ///
    /// - `ImcError::NotBound` if no transport is installed
    /// - `ImcError::UnknownConnection` if the connection is not tracked
    /// - `ImcError::Transport` if the reply could not be delivered
    /// - any error from [`ConnectionState::handle_message`]
    pub fn receive_message(&self, connection_id: ConnectionId, data: Bytes) -> Result<(), ImcError> {
        let transport = self
            .transport
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(ImcError::NotBound)?;
        let shared = self.session(connection_id)?;

        let actions = {
            let mut state = shared.lock().unwrap_or_else(PoisonError::into_inner);
            state.handle_message(data, &self.config)
        };
        let actions = match actions {
            Ok(actions) => actions,
            Err(err) => {
                if err.is_peer_error() {
                    tracing::warn!(imc_id = self.id, connection_id, error = %err, "handshake stopped");
                } else {
                    tracing::warn!(
                        imc_id = self.id,
                        connection_id,
                        error = %err,
                        "failed to answer request"
                    );
                }
                return Err(err);
            },
        };

        for action in actions {
            match action {
                ImcAction::SendMessage(message) => {
                    tracing::trace!(connection_id, bytes = message.len(), "sending message");
                    transport.send_message(connection_id, message)?;
                },
            }
        }
        Ok(())
    }

    fn session(&self, connection_id: ConnectionId) -> Result<SharedState, ImcError> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&connection_id)
            .cloned()
            .ok_or(ImcError::UnknownConnection(connection_id))
    }
}
