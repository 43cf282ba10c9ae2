//! IETF PA-TNC Error attribute.

use bytes::{BufMut, BytesMut};

use super::ValueReader;
use crate::{
    attr_types::{PaErrorCode, PtsErrorCode, VendorId},
    errors::Result,
    header::{AttributeHeader, MessageHeader},
};

/// Code-specific diagnostic data following the echoed message header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorDetail {
    /// No additional information.
    None,
    /// Byte offset of the invalid parameter (IETF Invalid Parameter).
    Offset(u32),
    /// Flags, vendor and type of the rejected attribute (IETF Attribute Type
    /// Not Supported).
    AttrInfo([u8; AttributeHeader::INFO_SIZE]),
}

/// PA-TNC Error attribute value.
///
/// ```text
/// +---------------+-----------------------------------------------+
/// |   Reserved    |              Error Code Vendor ID             |
/// +---------------+-----------------------------------------------+
/// |                          Error Code                           |
/// +---------------------------------------------------------------+
/// |          Copy of Original PA-TNC Message Header (8)           |
/// +---------------------------------------------------------------+
/// |                 Code-specific information ...                 |
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaTncError {
    /// Vendor scoping `error_code`.
    pub error_vendor: VendorId,
    /// Vendor-scoped error code.
    pub error_code: u32,
    /// Header of the message that triggered the error.
    pub msg_info: [u8; MessageHeader::SIZE],
    /// Code-specific data.
    pub detail: ErrorDetail,
}

impl PaTncError {
    /// A TCG PTS error concerning the message whose header is `msg_info`.
    pub fn pts(code: PtsErrorCode, msg_info: [u8; MessageHeader::SIZE]) -> Self {
        Self {
            error_vendor: VendorId::TCG,
            error_code: code.to_u32(),
            msg_info,
            detail: ErrorDetail::None,
        }
    }

    /// An IETF error.
    pub fn ietf(
        code: PaErrorCode,
        msg_info: [u8; MessageHeader::SIZE],
        detail: ErrorDetail,
    ) -> Self {
        Self { error_vendor: VendorId::IETF, error_code: code.to_u32(), msg_info, detail }
    }

    /// The IETF error code, if this is an IETF error.
    pub fn ietf_code(&self) -> Option<PaErrorCode> {
        if self.error_vendor == VendorId::IETF {
            PaErrorCode::from_u32(self.error_code)
        } else {
            None
        }
    }

    /// The TCG PTS error code, if this is a PTS error.
    pub fn pts_code(&self) -> Option<PtsErrorCode> {
        if self.error_vendor == VendorId::TCG {
            PtsErrorCode::from_u32(self.error_code)
        } else {
            None
        }
    }

    /// Registry name of the error code.
    pub fn code_name(&self) -> &'static str {
        self.ietf_code()
            .map(PaErrorCode::name)
            .or_else(|| self.pts_code().map(PtsErrorCode::name))
            .unwrap_or("unknown error")
    }

    pub(super) fn decode(reader: &mut ValueReader) -> Result<Self> {
        reader.skip(1)?;
        let error_vendor = VendorId::from_bytes(reader.array::<3>()?);
        let error_code = reader.u32()?;
        let msg_info = reader.array::<{ MessageHeader::SIZE }>()?;

        let detail = if error_vendor == VendorId::IETF {
            match PaErrorCode::from_u32(error_code) {
                Some(PaErrorCode::InvalidParameter) => ErrorDetail::Offset(reader.u32()?),
                Some(PaErrorCode::AttrTypeNotSupported) => {
                    ErrorDetail::AttrInfo(reader.array::<{ AttributeHeader::INFO_SIZE }>()?)
                },
                _ => ErrorDetail::None,
            }
        } else {
            ErrorDetail::None
        };

        // Trailing data of codes without a fixed layout is not interpreted.
        Ok(Self { error_vendor, error_code, msg_info, detail })
    }

    pub(super) fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(0);
        buf.put_slice(&self.error_vendor.to_bytes());
        buf.put_u32(self.error_code);
        buf.put_slice(&self.msg_info);
        match self.detail {
            ErrorDetail::None => {},
            ErrorDetail::Offset(offset) => buf.put_u32(offset),
            ErrorDetail::AttrInfo(info) => buf.put_slice(&info),
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use hex_literal::hex;

    use super::*;

    fn decode(value: &[u8]) -> Result<PaTncError> {
        let mut reader = ValueReader::new(Bytes::copy_from_slice(value), 12);
        PaTncError::decode(&mut reader)
    }

    #[test]
    fn decodes_invalid_parameter_offset() {
        let error = decode(&hex!("00000000 00000001 01000000 0000002a 00000010")).unwrap();
        assert_eq!(error.ietf_code(), Some(PaErrorCode::InvalidParameter));
        assert_eq!(error.detail, ErrorDetail::Offset(16));
        assert_eq!(error.msg_info, hex!("01000000 0000002a"));
    }

    #[test]
    fn decodes_unsupported_attribute_info() {
        let error = decode(&hex!("00000000 00000003 01000000 00000001 80005597 0a000000")).unwrap();
        assert_eq!(error.ietf_code(), Some(PaErrorCode::AttrTypeNotSupported));
        assert_eq!(error.detail, ErrorDetail::AttrInfo(hex!("80005597 0a000000")));
        assert_eq!(error.code_name(), "Attribute Type Not Supported");
    }

    #[test]
    fn decodes_pts_error_without_detail() {
        let error = decode(&hex!("00005597 00000001 01000000 00000007")).unwrap();
        assert_eq!(error.pts_code(), Some(PtsErrorCode::HashAlgNotSupported));
        assert_eq!(error.ietf_code(), None);
        assert_eq!(error.detail, ErrorDetail::None);
    }

    #[test]
    fn truncated_offset_reports_position() {
        let result = decode(&hex!("00000000 00000001 01000000 0000002a 0000"));
        assert!(matches!(
            result,
            Err(crate::CodecError::Truncated { offset: 28, needed: 4, available: 2 })
        ));
    }

    #[test]
    fn encode_matches_decode_layout() {
        let error = PaTncError::ietf(
            PaErrorCode::InvalidParameter,
            hex!("01000000 0000002a"),
            ErrorDetail::Offset(16),
        );
        let mut buf = BytesMut::new();
        error.encode(&mut buf);
        assert_eq!(&buf[..], hex!("00000000 00000001 01000000 0000002a 00000010"));
    }
}
