//! Flag sets carried in attribute headers and PTS attribute values.

use bitflags::bitflags;

bitflags! {
    /// Attribute header flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AttributeFlags: u8 {
        /// The receiver must not skip this attribute if it does not
        /// understand it.
        const NOSKIP = 0b1000_0000;
    }
}

bitflags! {
    /// PTS protocol capability flags.
    ///
    /// Carried in the low bits of the 32-bit value of the Request PTS Protocol
    /// Capabilities and PTS Protocol Capabilities attributes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ProtoCaps: u32 {
        /// XML reference manifests.
        const X = 1 << 0;
        /// TPM-based attestation.
        const T = 1 << 1;
        /// Diffie-Hellman nonce negotiation.
        const D = 1 << 2;
        /// Verification of evidence by the measurer.
        const V = 1 << 3;
        /// Current (not stored) evidence.
        const C = 1 << 4;
    }
}

bitflags! {
    /// PTS measurement algorithm flags (16-bit field).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MeasAlgorithms: u16 {
        /// SHA-1
        const SHA1 = 1 << 15;
        /// SHA-256
        const SHA256 = 1 << 14;
        /// SHA-384
        const SHA384 = 1 << 13;
    }
}
