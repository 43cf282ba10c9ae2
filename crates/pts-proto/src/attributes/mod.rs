//! Attribute values.
//!
//! [`Attribute`] is a closed union over the (vendor, type) pairs the measurer
//! understands. Anything else decodes to [`Attribute::Unknown`] with its raw
//! value preserved, so logging and error echoing never lose information.

mod ietf;
mod pts;

use bytes::{Buf, BufMut, Bytes, BytesMut};

pub use self::{
    ietf::{ErrorDetail, PaTncError},
    pts::{FileMeasEntry, FileMeasurements, ReqFileMeas},
};
use crate::{
    attr_types::{IetfAttrType, PtsAttrType, VendorId},
    errors::{CodecError, Result},
    flags::{AttributeFlags, MeasAlgorithms, ProtoCaps},
    header::AttributeHeader,
};

/// A decoded PA-TNC attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attribute {
    /// IETF PA-TNC Error.
    PaTncError(PaTncError),

    /// TCG Request PTS Protocol Capabilities (verifier's flags).
    ReqProtoCaps(ProtoCaps),

    /// TCG PTS Protocol Capabilities (measurer's reply).
    ProtoCaps(ProtoCaps),

    /// TCG PTS Measurement Algorithm Request (verifier's offer).
    MeasAlgo(MeasAlgorithms),

    /// TCG PTS Measurement Algorithm Selection (measurer's choice).
    MeasAlgoSelection(MeasAlgorithms),

    /// TCG Get TPM Version Information.
    GetTpmVersionInfo,

    /// TCG TPM Version Information.
    TpmVersionInfo(Bytes),

    /// TCG Get Attestation Identity Key.
    GetAik,

    /// TCG Request Functional Component Evidence (value kept opaque).
    ReqFunctCompEvid(Bytes),

    /// TCG Generate Attestation Evidence (value kept opaque).
    GenAttestEvid(Bytes),

    /// TCG Request File Measurement.
    ReqFileMeas(ReqFileMeas),

    /// TCG File Measurement.
    FileMeas(FileMeasurements),

    /// TCG Request File Metadata (value kept opaque).
    ReqFileMeta(Bytes),

    /// TCG Request Integrity Measurement Log (value kept opaque).
    ReqIntegMeasLog(Bytes),

    /// Any other (vendor, type) pair.
    Unknown {
        /// Header flags as received.
        flags: AttributeFlags,
        /// Attribute vendor.
        vendor_id: VendorId,
        /// Vendor-scoped type.
        attr_type: u32,
        /// Raw value.
        value: Bytes,
    },
}

/// Size of the reserved value carried by the Get TPM Version Info and Get AIK
/// requests.
const RESERVED_REQUEST_SIZE: usize = 4;
const PROTO_CAPS_SIZE: usize = 4;
const MEAS_ALGO_SIZE: usize = 4;

impl Attribute {
    /// Attribute vendor.
    pub fn vendor_id(&self) -> VendorId {
        match self {
            Self::PaTncError(_) => VendorId::IETF,
            Self::Unknown { vendor_id, .. } => *vendor_id,
            _ => VendorId::TCG,
        }
    }

    /// Vendor-scoped attribute type.
    pub fn attr_type(&self) -> u32 {
        match self {
            Self::PaTncError(_) => IetfAttrType::PaTncError.to_u32(),
            Self::Unknown { attr_type, .. } => *attr_type,
            known => known.pts_type().map_or(0, PtsAttrType::to_u32),
        }
    }

    /// Header flags used when encoding.
    ///
    /// Every attribute this crate constructs is non-skippable; unknown
    /// attributes keep the flags they arrived with.
    pub fn flags(&self) -> AttributeFlags {
        match self {
            Self::Unknown { flags, .. } => *flags,
            _ => AttributeFlags::NOSKIP,
        }
    }

    /// Human-readable type name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PaTncError(_) => IetfAttrType::PaTncError.name(),
            Self::Unknown { vendor_id, attr_type, .. } => type_name(*vendor_id, *attr_type),
            known => known.pts_type().map_or("unknown", PtsAttrType::name),
        }
    }

    fn pts_type(&self) -> Option<PtsAttrType> {
        let ty = match self {
            Self::ReqProtoCaps(_) => PtsAttrType::ReqProtoCaps,
            Self::ProtoCaps(_) => PtsAttrType::ProtoCaps,
            Self::MeasAlgo(_) => PtsAttrType::MeasAlgo,
            Self::MeasAlgoSelection(_) => PtsAttrType::MeasAlgoSelection,
            Self::GetTpmVersionInfo => PtsAttrType::GetTpmVersionInfo,
            Self::TpmVersionInfo(_) => PtsAttrType::TpmVersionInfo,
            Self::GetAik => PtsAttrType::GetAik,
            Self::ReqFunctCompEvid(_) => PtsAttrType::ReqFunctCompEvid,
            Self::GenAttestEvid(_) => PtsAttrType::GenAttestEvid,
            Self::ReqFileMeas(_) => PtsAttrType::ReqFileMeas,
            Self::FileMeas(_) => PtsAttrType::FileMeas,
            Self::ReqFileMeta(_) => PtsAttrType::ReqFileMeta,
            Self::ReqIntegMeasLog(_) => PtsAttrType::ReqIntegMeasLog,
            Self::PaTncError(_) | Self::Unknown { .. } => return None,
        };
        Some(ty)
    }

    /// Decode an attribute value.
    ///
    /// `offset` is the position of `value` within the message, used for error
    /// reporting.
    pub fn decode(header: &AttributeHeader, value: Bytes, offset: usize) -> Result<Self> {
        let vendor_id = header.vendor_id();
        let attr_type = header.attr_type();
        let mut reader = ValueReader::new(value.clone(), offset);

        let attribute = match vendor_id {
            VendorId::IETF if attr_type == IetfAttrType::PaTncError.to_u32() => {
                Self::PaTncError(PaTncError::decode(&mut reader)?)
            },
            VendorId::TCG => match PtsAttrType::from_u32(attr_type) {
                Some(PtsAttrType::ReqProtoCaps) => {
                    reader.expect_size("Request PTS Protocol Capabilities", PROTO_CAPS_SIZE)?;
                    Self::ReqProtoCaps(ProtoCaps::from_bits_truncate(reader.u32()?))
                },
                Some(PtsAttrType::ProtoCaps) => {
                    reader.expect_size("PTS Protocol Capabilities", PROTO_CAPS_SIZE)?;
                    Self::ProtoCaps(ProtoCaps::from_bits_truncate(reader.u32()?))
                },
                Some(PtsAttrType::MeasAlgo) => {
                    reader.expect_size("PTS Measurement Algorithm Request", MEAS_ALGO_SIZE)?;
                    reader.skip(2)?;
                    Self::MeasAlgo(MeasAlgorithms::from_bits_truncate(reader.u16()?))
                },
                Some(PtsAttrType::MeasAlgoSelection) => {
                    reader.expect_size("PTS Measurement Algorithm Selection", MEAS_ALGO_SIZE)?;
                    reader.skip(2)?;
                    Self::MeasAlgoSelection(MeasAlgorithms::from_bits_truncate(reader.u16()?))
                },
                Some(PtsAttrType::GetTpmVersionInfo) => {
                    reader.expect_size("Get TPM Version Information", RESERVED_REQUEST_SIZE)?;
                    Self::GetTpmVersionInfo
                },
                Some(PtsAttrType::GetAik) => {
                    reader.expect_size("Get Attestation Identity Key", RESERVED_REQUEST_SIZE)?;
                    Self::GetAik
                },
                Some(PtsAttrType::TpmVersionInfo) => Self::TpmVersionInfo(value),
                Some(PtsAttrType::ReqFunctCompEvid) => Self::ReqFunctCompEvid(value),
                Some(PtsAttrType::GenAttestEvid) => Self::GenAttestEvid(value),
                Some(PtsAttrType::ReqFileMeta) => Self::ReqFileMeta(value),
                Some(PtsAttrType::ReqIntegMeasLog) => Self::ReqIntegMeasLog(value),
                Some(PtsAttrType::ReqFileMeas) => Self::ReqFileMeas(ReqFileMeas::decode(&mut reader)?),
                Some(PtsAttrType::FileMeas) => {
                    Self::FileMeas(FileMeasurements::decode(&mut reader)?)
                },
                _ => Self::unknown(header, value),
            },
            _ => Self::unknown(header, value),
        };
        Ok(attribute)
    }

    fn unknown(header: &AttributeHeader, value: Bytes) -> Self {
        Self::Unknown {
            flags: header.flags(),
            vendor_id: header.vendor_id(),
            attr_type: header.attr_type(),
            value,
        }
    }

    /// Append header and value to `buf`.
    pub fn encode(&self, buf: &mut BytesMut) -> Result<()> {
        let mut value = BytesMut::new();
        self.encode_value(&mut value)?;

        let value_len = u32::try_from(value.len()).map_err(|_| CodecError::FieldTooLarge {
            field: "attribute value",
            size: value.len(),
            max: (u32::MAX as usize) - AttributeHeader::SIZE,
        })?;
        let header = AttributeHeader::new(self.flags(), self.vendor_id(), self.attr_type(), value_len);
        buf.put_slice(zerocopy::IntoBytes::as_bytes(&header));
        buf.put_slice(&value);
        Ok(())
    }

    fn encode_value(&self, buf: &mut BytesMut) -> Result<()> {
        match self {
            Self::PaTncError(error) => error.encode(buf),
            Self::ReqProtoCaps(caps) | Self::ProtoCaps(caps) => buf.put_u32(caps.bits()),
            Self::MeasAlgo(algorithms) | Self::MeasAlgoSelection(algorithms) => {
                buf.put_u16(0);
                buf.put_u16(algorithms.bits());
            },
            Self::GetTpmVersionInfo | Self::GetAik => buf.put_u32(0),
            Self::TpmVersionInfo(value)
            | Self::ReqFunctCompEvid(value)
            | Self::GenAttestEvid(value)
            | Self::ReqFileMeta(value)
            | Self::ReqIntegMeasLog(value)
            | Self::Unknown { value, .. } => buf.put_slice(value),
            Self::ReqFileMeas(request) => request.encode(buf),
            Self::FileMeas(measurements) => measurements.encode(buf)?,
        }
        Ok(())
    }
}

/// Registry name for a raw (vendor, type) pair.
pub fn type_name(vendor_id: VendorId, attr_type: u32) -> &'static str {
    match vendor_id {
        VendorId::IETF => IetfAttrType::from_u32(attr_type).map_or("unknown", IetfAttrType::name),
        VendorId::TCG => PtsAttrType::from_u32(attr_type).map_or("unknown", PtsAttrType::name),
        _ => "unknown",
    }
}

/// Bounds-checked big-endian reader over one attribute value.
pub(crate) struct ValueReader {
    buf: Bytes,
    start: usize,
    len: usize,
}

impl ValueReader {
    pub(crate) fn new(buf: Bytes, start: usize) -> Self {
        let len = buf.len();
        Self { buf, start, len }
    }

    /// Message offset of the next unread byte.
    pub(crate) fn offset(&self) -> usize {
        self.start + (self.len - self.buf.remaining())
    }

    pub(crate) fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        if self.buf.remaining() < needed {
            return Err(CodecError::Truncated {
                offset: self.offset(),
                needed,
                available: self.buf.remaining(),
            });
        }
        Ok(())
    }

    pub(crate) fn expect_size(&self, name: &'static str, size: usize) -> Result<()> {
        if self.len != size {
            return Err(CodecError::InvalidValueSize { offset: self.start, name, size: self.len });
        }
        Ok(())
    }

    pub(crate) fn skip(&mut self, n: usize) -> Result<()> {
        self.ensure(n)?;
        self.buf.advance(n);
        Ok(())
    }

    pub(crate) fn u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        Ok(self.buf.get_u8())
    }

    pub(crate) fn u16(&mut self) -> Result<u16> {
        self.ensure(2)?;
        Ok(self.buf.get_u16())
    }

    pub(crate) fn u32(&mut self) -> Result<u32> {
        self.ensure(4)?;
        Ok(self.buf.get_u32())
    }

    pub(crate) fn u64(&mut self) -> Result<u64> {
        self.ensure(8)?;
        Ok(self.buf.get_u64())
    }

    pub(crate) fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        self.ensure(N)?;
        let mut out = [0u8; N];
        self.buf.copy_to_slice(&mut out);
        Ok(out)
    }

    pub(crate) fn take(&mut self, n: usize) -> Result<Bytes> {
        self.ensure(n)?;
        Ok(self.buf.split_to(n))
    }

    pub(crate) fn string(&mut self, n: usize) -> Result<String> {
        let offset = self.offset();
        let raw = self.take(n)?;
        String::from_utf8(raw.to_vec()).map_err(|_| CodecError::InvalidString { offset })
    }
}
