//! Vendor ids, attribute types and error code registries.
//!
//! The numeric values are fixed by the IETF PA-TNC and TCG PTS
//! specifications and appear verbatim on the wire.

use std::fmt;

/// IANA Private Enterprise Number scoping an attribute type or error code.
///
/// Only the low 24 bits are meaningful on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VendorId(u32);

impl VendorId {
    /// IETF standard attributes.
    pub const IETF: Self = Self(0x00_0000);
    /// Trusted Computing Group.
    pub const TCG: Self = Self(0x00_5597);
    /// Largest encodable vendor id.
    pub const MAX: u32 = 0x00FF_FFFF;

    /// Create a vendor id, masking to 24 bits.
    pub const fn new(value: u32) -> Self {
        Self(value & Self::MAX)
    }

    /// Numeric value.
    pub const fn to_u32(self) -> u32 {
        self.0
    }

    /// Encode as the 3-byte big-endian wire field.
    pub const fn to_bytes(self) -> [u8; 3] {
        let b = self.0.to_be_bytes();
        [b[1], b[2], b[3]]
    }

    /// Decode from the 3-byte big-endian wire field.
    pub const fn from_bytes(bytes: [u8; 3]) -> Self {
        Self(u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]))
    }
}

impl fmt::Display for VendorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::IETF => f.write_str("IETF"),
            Self::TCG => f.write_str("TCG"),
            Self(other) => write!(f, "PEN {other:#08x}"),
        }
    }
}

macro_rules! registry {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $value:literal => $label:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u32)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $value, )+
        }

        impl $name {
            /// Look up a registered value.
            pub const fn from_u32(value: u32) -> Option<Self> {
                match value {
                    $( $value => Some(Self::$variant), )+
                    _ => None,
                }
            }

            /// Numeric wire value.
            pub const fn to_u32(self) -> u32 {
                self as u32
            }

            /// Registry name used in logs.
            pub const fn name(self) -> &'static str {
                match self {
                    $( Self::$variant => $label, )+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

registry! {
    /// IETF PA-TNC attribute types.
    IetfAttrType {
        /// Testing
        Testing = 0 => "Testing",
        /// Attribute Request
        AttributeRequest = 1 => "Attribute Request",
        /// Product Information
        ProductInfo = 2 => "Product Information",
        /// Numeric Version
        NumericVersion = 3 => "Numeric Version",
        /// String Version
        StringVersion = 4 => "String Version",
        /// Operational Status
        OperationalStatus = 5 => "Operational Status",
        /// Port Filter
        PortFilter = 6 => "Port Filter",
        /// Installed Packages
        InstalledPackages = 7 => "Installed Packages",
        /// PA-TNC Error
        PaTncError = 8 => "PA-TNC Error",
        /// Assessment Result
        AssessmentResult = 9 => "Assessment Result",
        /// Remediation Instructions
        RemediationInstructions = 10 => "Remediation Instructions",
        /// Forwarding Enabled
        ForwardingEnabled = 11 => "Forwarding Enabled",
        /// Factory Default Password Enabled
        FactoryDefaultPwdEnabled = 12 => "Factory Default Password Enabled",
    }
}

registry! {
    /// TCG PTS attribute types.
    PtsAttrType {
        /// Request Functional Component Evidence
        ReqFunctCompEvid = 0x0010_0000 => "Request Functional Component Evidence",
        /// Generate Attestation Evidence
        GenAttestEvid = 0x0020_0000 => "Generate Attestation Evidence",
        /// Simple Component Evidence
        SimpleCompEvid = 0x0030_0000 => "Simple Component Evidence",
        /// Simple Evidence Final
        SimpleEvidFinal = 0x0040_0000 => "Simple Evidence Final",
        /// Verification Result
        VerificationResult = 0x0050_0000 => "Verification Result",
        /// Integrity Report
        IntegReport = 0x0060_0000 => "Integrity Report",
        /// Request File Metadata
        ReqFileMeta = 0x0070_0000 => "Request File Metadata",
        /// Windows-Style File Metadata
        WinFileMeta = 0x0080_0000 => "Windows-Style File Metadata",
        /// Unix-Style File Metadata
        UnixFileMeta = 0x0090_0000 => "Unix-Style File Metadata",
        /// Request Registry Value
        ReqRegistryValue = 0x00A0_0000 => "Request Registry Value",
        /// Registry Value
        RegistryValue = 0x00B0_0000 => "Registry Value",
        /// Request File Measurement
        ReqFileMeas = 0x00C0_0000 => "Request File Measurement",
        /// File Measurement
        FileMeas = 0x00D0_0000 => "File Measurement",
        /// Request Integrity Measurement Log
        ReqIntegMeasLog = 0x00E0_0000 => "Request Integrity Measurement Log",
        /// Integrity Measurement Log
        IntegMeasLog = 0x00F0_0000 => "Integrity Measurement Log",
        /// Request PTS Protocol Capabilities
        ReqProtoCaps = 0x0100_0000 => "Request PTS Protocol Capabilities",
        /// PTS Protocol Capabilities
        ProtoCaps = 0x0200_0000 => "PTS Protocol Capabilities",
        /// DH Nonce Parameters Request
        DhNonceParamsReq = 0x0300_0000 => "DH Nonce Parameters Request",
        /// DH Nonce Parameters Response
        DhNonceParamsResp = 0x0400_0000 => "DH Nonce Parameters Response",
        /// DH Nonce Finish
        DhNonceFinish = 0x0500_0000 => "DH Nonce Finish",
        /// PTS Measurement Algorithm Request
        MeasAlgo = 0x0600_0000 => "PTS Measurement Algorithm Request",
        /// PTS Measurement Algorithm Selection
        MeasAlgoSelection = 0x0700_0000 => "PTS Measurement Algorithm Selection",
        /// Get TPM Version Information
        GetTpmVersionInfo = 0x0800_0000 => "Get TPM Version Information",
        /// TPM Version Information
        TpmVersionInfo = 0x0900_0000 => "TPM Version Information",
        /// Request Template Reference Manifest Set Metadata
        ReqTemplRefManiSetMeta = 0x0A00_0000 => "Request Template Reference Manifest Set Metadata",
        /// Template Reference Manifest Set Metadata
        TemplRefManiSetMeta = 0x0B00_0000 => "Template Reference Manifest Set Metadata",
        /// Update Template Reference Manifest
        UpdateTemplRefMani = 0x0C00_0000 => "Update Template Reference Manifest",
        /// Get Attestation Identity Key
        GetAik = 0x0D00_0000 => "Get Attestation Identity Key",
        /// Attestation Identity Key
        Aik = 0x0E00_0000 => "Attestation Identity Key",
    }
}

registry! {
    /// IETF PA-TNC error codes.
    PaErrorCode {
        /// Reserved
        Reserved = 0 => "Reserved",
        /// Invalid Parameter
        InvalidParameter = 1 => "Invalid Parameter",
        /// Version Not Supported
        VersionNotSupported = 2 => "Version Not Supported",
        /// Attribute Type Not Supported
        AttrTypeNotSupported = 3 => "Attribute Type Not Supported",
    }
}

registry! {
    /// TCG PTS error codes, reported inside a PA-TNC Error attribute whose
    /// error vendor is [`VendorId::TCG`].
    PtsErrorCode {
        /// Reserved Error
        Reserved = 0 => "Reserved Error",
        /// Hash Algorithm Not Supported
        HashAlgNotSupported = 1 => "Hash Algorithm Not Supported",
        /// Invalid Path
        InvalidPath = 2 => "Invalid Path",
        /// File Not Found
        FileNotFound = 3 => "File Not Found",
        /// Registry Not Supported
        RegNotSupported = 4 => "Registry Not Supported",
        /// Registry Key Not Found
        RegKeyNotFound = 5 => "Registry Key Not Found",
        /// D-H Group Not Supported
        DhGrpsNotSupported = 6 => "D-H Group Not Supported",
        /// DH-PN Nonce Not Acceptable
        BadNonceLength = 7 => "DH-PN Nonce Not Acceptable",
        /// Invalid Name Family
        InvalidNameFam = 8 => "Invalid Name Family",
        /// TPM Version Not Supported
        TpmVersNotSupported = 9 => "TPM Version Not Supported",
        /// Invalid Delimiter
        InvalidDelimiter = 10 => "Invalid Delimiter",
        /// Operation Not Supported
        OperationNotSupported = 11 => "Operation Not Supported",
        /// Reference Manifest Error
        RmError = 12 => "Reference Manifest Error",
        /// Unable To Perform Local Validation
        UnableLocalVal = 13 => "Unable To Perform Local Validation",
        /// Unable To Collect Current Evidence
        UnableCurEvid = 14 => "Unable To Collect Current Evidence",
        /// Unable To Determine Transitive Trust Chain
        UnableDetTtc = 15 => "Unable To Determine Transitive Trust Chain",
        /// Unable To Determine PCR
        UnableDetPcr = 16 => "Unable To Determine PCR",
    }
}
