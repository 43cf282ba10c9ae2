//! Outbound message delivery.
//!
//! The host runtime owns the actual channel to the verifier. The agent only
//! needs a way to hand it an encoded PA-TNC message for a connection.

use std::{io, sync::Arc};

use bytes::Bytes;
use thiserror::Error;

use crate::tnc::ConnectionId;

/// Failure delivering a message.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The connection is gone.
    #[error("connection {0} is closed")]
    Closed(ConnectionId),

    /// Underlying I/O failure.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Sends encoded PA-TNC messages to the verifier of a connection.
///
/// Implementations may be called from several threads at once, one call per
/// connection at a time.
pub trait Transport: Send + Sync {
    /// Deliver `message` on `connection_id`.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the message could not be handed off.
    fn send_message(&self, connection_id: ConnectionId, message: Bytes)
    -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send_message(
        &self,
        connection_id: ConnectionId,
        message: Bytes,
    ) -> Result<(), TransportError> {
        (**self).send_message(connection_id, message)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send_message(
        &self,
        connection_id: ConnectionId,
        message: Bytes,
    ) -> Result<(), TransportError> {
        (**self).send_message(connection_id, message)
    }
}
