//! Wire format for PA-TNC messages carrying TCG PTS attributes.
//!
//! A PA-TNC message is a fixed 8-byte header followed by a sequence of
//! attributes. Each attribute has a 12-byte header naming its vendor (an IANA
//! Private Enterprise Number) and type, and a variable-length value whose
//! layout depends on that (vendor, type) pair.
//!
//! Inbound attributes decode into the closed [`Attribute`] union: one variant
//! per pair the measurer acts on, plus [`Attribute::Unknown`] for everything
//! else. Consumers match exhaustively instead of switching on raw numbers.
//!
//! # Security
//!
//! Headers are parsed through `zerocopy` layouts. Every length field is checked
//! against the bytes actually present before anything is read, and decoding
//! errors report the byte offset of the offending field.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod attr_types;
pub mod attributes;
pub mod errors;
pub mod flags;
pub mod header;
pub mod message;

pub use attr_types::{IetfAttrType, PaErrorCode, PtsAttrType, PtsErrorCode, VendorId};
pub use attributes::{
    Attribute, ErrorDetail, FileMeasEntry, FileMeasurements, PaTncError, ReqFileMeas,
};
pub use errors::{CodecError, Result};
pub use flags::{AttributeFlags, MeasAlgorithms, ProtoCaps};
pub use header::{AttributeHeader, MessageHeader};
pub use message::PaTncMessage;
