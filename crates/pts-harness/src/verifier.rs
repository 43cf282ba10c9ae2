//! Scripted verifier.

use bytes::Bytes;
use pts_proto::{Attribute, CodecError, PaTncMessage};

/// Builds numbered request messages the way a verifier would.
#[derive(Debug, Clone)]
pub struct Verifier {
    next_message_id: u32,
}

impl Default for Verifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Verifier {
    /// Verifier whose first message has id 1.
    pub fn new() -> Self {
        Self { next_message_id: 1 }
    }

    /// Identifier the next request will carry.
    pub fn next_message_id(&self) -> u32 {
        self.next_message_id
    }

    /// Encode a request carrying `attributes`.
    ///
    /// # Errors
    ///
    /// Returns `CodecError` if an attribute cannot be encoded.
    pub fn request(&mut self, attributes: Vec<Attribute>) -> Result<Bytes, CodecError> {
        let mut message = PaTncMessage::new(self.next_message_id);
        self.next_message_id = self.next_message_id.wrapping_add(1);
        for attribute in attributes {
            message.push(attribute);
        }
        message.encode()
    }

    /// Decode a reply from the measurer.
    ///
    /// # Errors
    ///
    /// Returns `CodecError` if the reply is malformed.
    pub fn read_reply(&self, reply: Bytes) -> Result<PaTncMessage, CodecError> {
        PaTncMessage::decode(reply)
    }
}
