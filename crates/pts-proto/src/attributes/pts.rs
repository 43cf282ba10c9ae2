//! TCG PTS file measurement attributes.

use bytes::{BufMut, Bytes, BytesMut};

use super::ValueReader;
use crate::errors::{CodecError, Result};

/// Request File Measurement attribute value.
///
/// ```text
/// +-+-------------+---------------+-------------------------------+
/// |D|  Flags      |   Reserved    |          Request ID           |
/// +-+-------------+---------------+-------------------------------+
/// |                           Delimiter                           |
/// +---------------------------------------------------------------+
/// |              Fully Qualified File Pathname (Var Len)          |
/// +---------------------------------------------------------------+
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReqFileMeas {
    /// Measure every file in the directory named by `path`.
    pub directory: bool,
    /// Identifier echoed in the matching File Measurement reply.
    pub request_id: u16,
    /// Path delimiter character (UTF-8 code point).
    pub delimiter: u32,
    /// File or directory path.
    pub path: String,
}

impl ReqFileMeas {
    const FIXED_SIZE: usize = 8;
    const DIRECTORY_FLAG: u8 = 1 << 7;
    /// Delimiter used by Unix-style paths.
    pub const SLASH: u32 = '/' as u32;

    /// Request for a single file.
    pub fn file(request_id: u16, path: impl Into<String>) -> Self {
        Self { directory: false, request_id, delimiter: Self::SLASH, path: path.into() }
    }

    /// Request for every file in a directory.
    pub fn directory(request_id: u16, path: impl Into<String>) -> Self {
        Self { directory: true, request_id, delimiter: Self::SLASH, path: path.into() }
    }

    pub(super) fn decode(reader: &mut ValueReader) -> Result<Self> {
        if reader.remaining() < Self::FIXED_SIZE {
            return Err(CodecError::InvalidValueSize {
                offset: reader.offset(),
                name: "Request File Measurement",
                size: reader.remaining(),
            });
        }
        let flags = reader.u8()?;
        reader.skip(1)?;
        let request_id = reader.u16()?;
        let delimiter = reader.u32()?;
        let path = reader.string(reader.remaining())?;

        Ok(Self { directory: flags & Self::DIRECTORY_FLAG != 0, request_id, delimiter, path })
    }

    pub(super) fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(if self.directory { Self::DIRECTORY_FLAG } else { 0 });
        buf.put_u8(0);
        buf.put_u16(self.request_id);
        buf.put_u32(self.delimiter);
        buf.put_slice(self.path.as_bytes());
    }
}

/// One measured file inside a File Measurement attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMeasEntry {
    /// Digest of the file content.
    pub digest: Bytes,
    /// Path (single-file requests) or entry name (directory requests).
    pub file_name: String,
}

/// File Measurement attribute value.
///
/// ```text
/// +---------------------------------------------------------------+
/// |                    Number of Files included (8)               |
/// +-------------------------------+-------------------------------+
/// |          Request ID           |      Measurement Length       |
/// +-------------------------------+-------------------------------+
/// |                   Measurement #1 (Var Len)                    |
/// +-------------------------------+-------------------------------+
/// |      Filename Length          |   Filename (Var Len) ...      |
/// +-------------------------------+-------------------------------+
/// ```
///
/// The file count on the wire is always the number of entries present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMeasurements {
    request_id: u16,
    meas_len: u16,
    entries: Vec<FileMeasEntry>,
}

impl FileMeasurements {
    const FIXED_SIZE: usize = 12;

    /// Empty measurement set whose digests are `meas_len` bytes each.
    pub fn new(request_id: u16, meas_len: u16) -> Self {
        Self { request_id, meas_len, entries: Vec::new() }
    }

    /// Add one measured file; the digest must be exactly `meas_len` bytes.
    pub fn push(&mut self, digest: Bytes, file_name: impl Into<String>) -> Result<()> {
        if digest.len() != usize::from(self.meas_len) {
            return Err(CodecError::DigestLengthMismatch {
                expected: usize::from(self.meas_len),
                actual: digest.len(),
            });
        }
        self.entries.push(FileMeasEntry { digest, file_name: file_name.into() });
        Ok(())
    }

    /// Request this measurement answers.
    pub fn request_id(&self) -> u16 {
        self.request_id
    }

    /// Digest size in bytes.
    pub fn meas_len(&self) -> u16 {
        self.meas_len
    }

    /// Value of the "number of files" field.
    pub fn number_of_files(&self) -> u64 {
        self.entries.len() as u64
    }

    /// Measured files in insertion order.
    pub fn entries(&self) -> &[FileMeasEntry] {
        &self.entries
    }

    pub(super) fn decode(reader: &mut ValueReader) -> Result<Self> {
        if reader.remaining() < Self::FIXED_SIZE {
            return Err(CodecError::InvalidValueSize {
                offset: reader.offset(),
                name: "File Measurement",
                size: reader.remaining(),
            });
        }
        let count = reader.u64()?;
        let request_id = reader.u16()?;
        let meas_len = reader.u16()?;

        let mut measurements = Self::new(request_id, meas_len);
        for _ in 0..count {
            let digest = reader.take(usize::from(meas_len))?;
            let name_len = reader.u16()?;
            let file_name = reader.string(usize::from(name_len))?;
            measurements.entries.push(FileMeasEntry { digest, file_name });
        }
        if reader.remaining() != 0 {
            return Err(CodecError::InvalidValueSize {
                offset: reader.offset(),
                name: "File Measurement",
                size: reader.remaining(),
            });
        }
        Ok(measurements)
    }

    pub(super) fn encode(&self, buf: &mut BytesMut) -> Result<()> {
        buf.put_u64(self.number_of_files());
        buf.put_u16(self.request_id);
        buf.put_u16(self.meas_len);
        for entry in &self.entries {
            let name_len = u16::try_from(entry.file_name.len()).map_err(|_| {
                CodecError::FieldTooLarge {
                    field: "file name",
                    size: entry.file_name.len(),
                    max: usize::from(u16::MAX),
                }
            })?;
            buf.put_slice(&entry.digest);
            buf.put_u16(name_len);
            buf.put_slice(entry.file_name.as_bytes());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;

    fn reader(value: &[u8]) -> ValueReader {
        ValueReader::new(Bytes::copy_from_slice(value), 12)
    }

    #[test]
    fn decodes_directory_request() {
        let request = ReqFileMeas::decode(&mut reader(&hex!("80000007 0000002f 2f657463"))).unwrap();
        assert_eq!(request, ReqFileMeas::directory(7, "/etc"));
    }

    #[test]
    fn decodes_file_request() {
        let request =
            ReqFileMeas::decode(&mut reader(&hex!("00000102 0000002f 2f62696e2f6c73"))).unwrap();
        assert!(!request.directory);
        assert_eq!(request.request_id, 0x0102);
        assert_eq!(request.path, "/bin/ls");
    }

    #[test]
    fn short_request_is_rejected() {
        let result = ReqFileMeas::decode(&mut reader(&hex!("800000")));
        assert!(matches!(result, Err(CodecError::InvalidValueSize { size: 3, .. })));
    }

    #[test]
    fn non_utf8_path_is_rejected() {
        let result = ReqFileMeas::decode(&mut reader(&hex!("00000001 0000002f ff")));
        assert_eq!(result, Err(CodecError::InvalidString { offset: 20 }));
    }

    #[test]
    fn push_enforces_measurement_length() {
        let mut measurements = FileMeasurements::new(1, 20);
        let result = measurements.push(Bytes::from_static(&[0; 32]), "a");
        assert_eq!(result, Err(CodecError::DigestLengthMismatch { expected: 20, actual: 32 }));
        assert_eq!(measurements.number_of_files(), 0);
    }

    #[test]
    fn file_measurement_wire_format() {
        let mut measurements = FileMeasurements::new(7, 2);
        measurements.push(Bytes::from_static(&[0xaa, 0xbb]), "a").unwrap();
        measurements.push(Bytes::from_static(&[0xcc, 0xdd]), "bc").unwrap();

        let mut buf = BytesMut::new();
        measurements.encode(&mut buf).unwrap();
        assert_eq!(
            &buf[..],
            hex!("00000000 00000002 0007 0002 aabb 0001 61 ccdd 0002 6263")
        );

        let decoded = FileMeasurements::decode(&mut reader(&buf)).unwrap();
        assert_eq!(decoded, measurements);
    }

    #[test]
    fn file_count_larger_than_payload_is_truncated() {
        let result =
            FileMeasurements::decode(&mut reader(&hex!("00000000 00000009 0001 0002 aabb 0000")));
        assert!(matches!(result, Err(CodecError::Truncated { .. })));
    }
}
