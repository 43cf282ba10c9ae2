//! IF-IMC identifiers, result codes and connection states.
//!
//! Numeric values match the TCG TNC IF-IMC 1.2 C binding so results can be
//! handed straight back to a host runtime.

use pts_proto::VendorId;

/// Identifier the host assigns to this IMC.
pub type ImcId = u32;

/// Identifier the host assigns to a network connection.
pub type ConnectionId = u32;

/// IF-IMC API version.
pub type TncVersion = u32;

/// The only IF-IMC version implemented.
pub const IF_IMC_VERSION_1: TncVersion = 1;

/// PA subtype of TCG PTS messages.
pub const PA_SUBTYPE_TCG_PTS: u32 = 0x01;

/// Message type this IMC receives: `(vendor << 8) | subtype`.
pub const PTS_MESSAGE_TYPE: u32 = (VendorId::TCG.to_u32() << 8) | PA_SUBTYPE_TCG_PTS;

/// IF-IMC function result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum TncResult {
    /// Success
    Success = 0,
    /// IMC has not been initialized
    NotInitialized = 1,
    /// IMC was already initialized
    AlreadyInitialized = 2,
    /// No common IF-IMC version
    NoCommonVersion = 3,
    /// Cannot retry handshake
    CantRetry = 4,
    /// Will not retry handshake
    WontRetry = 5,
    /// Invalid parameter
    InvalidParameter = 6,
    /// Cannot respond
    CantRespond = 7,
    /// Illegal operation
    IllegalOperation = 8,
    /// Other error
    Other = 9,
    /// Unrecoverable error
    Fatal = 10,
}

impl TncResult {
    /// Numeric IF-IMC value.
    pub const fn to_u32(self) -> u32 {
        self as u32
    }
}

/// Connection state as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum TncConnectionState {
    /// Connection created
    Create = 0,
    /// Handshake in progress
    Handshake = 1,
    /// Access allowed
    AccessAllowed = 2,
    /// Access isolated
    AccessIsolated = 3,
    /// No access
    AccessNone = 4,
    /// Connection deleted
    Delete = 5,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pts_message_type_value() {
        assert_eq!(PTS_MESSAGE_TYPE, 0x0055_9701);
    }
}
