//! PA-TNC message envelope.

use bytes::{BufMut, Bytes, BytesMut};
use zerocopy::IntoBytes;

use crate::{
    attributes::Attribute,
    errors::{CodecError, Result},
    header::{AttributeHeader, MessageHeader},
};

/// A PA-TNC message: header plus attributes in wire order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaTncMessage {
    header: MessageHeader,
    attributes: Vec<Attribute>,
}

impl PaTncMessage {
    /// Empty message with the given identifier.
    pub fn new(message_id: u32) -> Self {
        Self { header: MessageHeader::new(message_id), attributes: Vec::new() }
    }

    /// Append an attribute.
    pub fn push(&mut self, attribute: Attribute) {
        self.attributes.push(attribute);
    }

    /// Builder-style [`push`](Self::push).
    #[must_use]
    pub fn with(mut self, attribute: Attribute) -> Self {
        self.push(attribute);
        self
    }

    /// Message header.
    pub fn header(&self) -> &MessageHeader {
        &self.header
    }

    /// Attributes in wire order.
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Decode a complete message.
    ///
    /// Attribute values are sliced out of `data` without copying.
    pub fn decode(data: Bytes) -> Result<Self> {
        let header = *MessageHeader::from_bytes(&data)?;

        let mut attributes = Vec::new();
        let mut offset = MessageHeader::SIZE;
        while offset < data.len() {
            let attr_header = AttributeHeader::from_bytes(&data[offset..], offset)?;
            let length = attr_header.length();
            let end = usize::try_from(length)
                .ok()
                .filter(|len| *len >= AttributeHeader::SIZE)
                .and_then(|len| offset.checked_add(len))
                .filter(|end| *end <= data.len())
                .ok_or(CodecError::InvalidAttributeLength { offset, length })?;

            let value_offset = offset + AttributeHeader::SIZE;
            let value = data.slice(value_offset..end);
            attributes.push(Attribute::decode(attr_header, value, value_offset)?);
            offset = end;
        }

        Ok(Self { header, attributes })
    }

    /// Encode header and attributes.
    pub fn encode(&self) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(MessageHeader::SIZE);
        buf.put_slice(self.header.as_bytes());
        for attribute in &self.attributes {
            attribute.encode(&mut buf)?;
        }
        Ok(buf.freeze())
    }
}
