//! Fixed-size message and attribute headers.
//!
//! Both headers are `#[repr(C)]` byte-aligned layouts read directly out of the
//! input buffer with `zerocopy`, so a truncated buffer is the only way a header
//! read can fail.

use zerocopy::{
    FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
    byteorder::{BigEndian, U32},
};

use crate::{
    attr_types::VendorId,
    errors::{CodecError, Result},
    flags::AttributeFlags,
};

/// PA-TNC message header (8 bytes).
///
/// ```text
///  0                   1                   2                   3
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |    Version    |                    Reserved                   |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                       Message Identifier                      |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned,
)]
#[repr(C)]
pub struct MessageHeader {
    version: u8,
    reserved: [u8; 3],
    message_id: U32<BigEndian>,
}

impl MessageHeader {
    /// Encoded size in bytes.
    pub const SIZE: usize = 8;
    /// The only PA-TNC version defined.
    pub const VERSION: u8 = 1;

    /// Create a version-1 header with the given message identifier.
    pub fn new(message_id: u32) -> Self {
        Self { version: Self::VERSION, reserved: [0; 3], message_id: U32::new(message_id) }
    }

    /// Read a header from the start of `bytes`, validating the version.
    pub fn from_bytes(bytes: &[u8]) -> Result<&Self> {
        let (header, _) = Self::ref_from_prefix(bytes).map_err(|_| CodecError::Truncated {
            offset: 0,
            needed: Self::SIZE,
            available: bytes.len(),
        })?;
        if header.version != Self::VERSION {
            return Err(CodecError::UnsupportedVersion(header.version));
        }
        Ok(header)
    }

    /// Message identifier.
    pub fn message_id(&self) -> u32 {
        self.message_id.get()
    }

    /// Encoded form, as echoed back inside PA-TNC Error attributes.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out.copy_from_slice(self.as_bytes());
        out
    }
}

/// PA-TNC attribute header (12 bytes).
///
/// ```text
///  0                   1                   2                   3
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |     Flags     |          PA-TNC Attribute Vendor ID           |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                     PA-TNC Attribute Type                     |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                    PA-TNC Attribute Length                    |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
///
/// The length covers the header itself plus the value.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned,
)]
#[repr(C)]
pub struct AttributeHeader {
    flags: u8,
    vendor_id: [u8; 3],
    attr_type: U32<BigEndian>,
    length: U32<BigEndian>,
}

impl AttributeHeader {
    /// Encoded size in bytes.
    pub const SIZE: usize = 12;
    /// Size of the (flags, vendor, type) prefix echoed in "attribute type not
    /// supported" errors.
    pub const INFO_SIZE: usize = 8;

    /// Create a header for a value of `value_len` bytes.
    pub fn new(flags: AttributeFlags, vendor_id: VendorId, attr_type: u32, value_len: u32) -> Self {
        Self {
            flags: flags.bits(),
            vendor_id: vendor_id.to_bytes(),
            attr_type: U32::new(attr_type),
            length: U32::new(value_len.saturating_add(Self::SIZE as u32)),
        }
    }

    /// Read a header from the start of `bytes`; `offset` is the position of
    /// `bytes` within the message and only used for error reporting.
    pub fn from_bytes(bytes: &[u8], offset: usize) -> Result<&Self> {
        let (header, _) = Self::ref_from_prefix(bytes).map_err(|_| CodecError::Truncated {
            offset,
            needed: Self::SIZE,
            available: bytes.len(),
        })?;
        Ok(header)
    }

    /// Header flags; unknown bits are ignored.
    pub fn flags(&self) -> AttributeFlags {
        AttributeFlags::from_bits_truncate(self.flags)
    }

    /// Attribute vendor.
    pub fn vendor_id(&self) -> VendorId {
        VendorId::from_bytes(self.vendor_id)
    }

    /// Vendor-scoped attribute type.
    pub fn attr_type(&self) -> u32 {
        self.attr_type.get()
    }

    /// Total attribute length, header included.
    pub fn length(&self) -> u32 {
        self.length.get()
    }

    /// The (flags, vendor, type) prefix.
    pub fn info(&self) -> [u8; Self::INFO_SIZE] {
        let mut out = [0u8; Self::INFO_SIZE];
        out.copy_from_slice(&self.as_bytes()[..Self::INFO_SIZE]);
        out
    }
}
