//! In-memory transport recording every delivered message.

use std::{
    collections::HashSet,
    sync::{Mutex, PoisonError},
};

use bytes::Bytes;
use pts_imc::{ConnectionId, Transport, TransportError};

/// Records sent messages per connection; connections can be marked closed to
/// make delivery fail.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    sent: Mutex<Vec<(ConnectionId, Bytes)>>,
    closed: Mutex<HashSet<ConnectionId>>,
}

impl MemoryTransport {
    /// Empty transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make future sends on `connection_id` fail.
    pub fn close(&self, connection_id: ConnectionId) {
        self.closed.lock().unwrap_or_else(PoisonError::into_inner).insert(connection_id);
    }

    /// Every message sent on `connection_id`, oldest first.
    pub fn sent_to(&self, connection_id: ConnectionId) -> Vec<Bytes> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(id, _)| *id == connection_id)
            .map(|(_, message)| message.clone())
            .collect()
    }

    /// Total number of messages sent.
    pub fn total_sent(&self) -> usize {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Transport for MemoryTransport {
    fn send_message(
        &self,
        connection_id: ConnectionId,
        message: Bytes,
    ) -> Result<(), TransportError> {
        if self.closed.lock().unwrap_or_else(PoisonError::into_inner).contains(&connection_id) {
            return Err(TransportError::Closed(connection_id));
        }
        tracing::trace!(connection_id, bytes = message.len(), "recorded message");
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).push((connection_id, message));
        Ok(())
    }
}
