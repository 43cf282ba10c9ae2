//! File and directory digests.
//!
//! Files are streamed through the hasher in fixed-size chunks so large files
//! never need to fit in memory. Directory measurement covers the regular files
//! directly inside the directory, in name order; subdirectories are not
//! descended into.

use std::{
    fs::File,
    io::{self, Read},
    path::Path,
};

use bytes::Bytes;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha384, Sha512};
use walkdir::WalkDir;

use crate::{algorithm::HashAlgorithm, config::DEFAULT_CHUNK_SIZE, error::MeasurementError};

/// Incremental hasher for one of the supported algorithms.
enum Hasher {
    Sha1(Sha1),
    Sha256(Sha256),
    Sha384(Sha384),
    Sha512(Sha512),
}

impl Hasher {
    fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Sha1 => Self::Sha1(Sha1::new()),
            HashAlgorithm::Sha256 => Self::Sha256(Sha256::new()),
            HashAlgorithm::Sha384 => Self::Sha384(Sha384::new()),
            HashAlgorithm::Sha512 => Self::Sha512(Sha512::new()),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Sha1(h) => h.update(data),
            Self::Sha256(h) => h.update(data),
            Self::Sha384(h) => h.update(data),
            Self::Sha512(h) => h.update(data),
        }
    }

    fn finalize(self) -> Bytes {
        match self {
            Self::Sha1(h) => Bytes::copy_from_slice(&h.finalize()),
            Self::Sha256(h) => Bytes::copy_from_slice(&h.finalize()),
            Self::Sha384(h) => Bytes::copy_from_slice(&h.finalize()),
            Self::Sha512(h) => Bytes::copy_from_slice(&h.finalize()),
        }
    }
}

/// Digest of one directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMeasurement {
    /// Entry name, relative to the measured directory.
    pub file_name: String,
    /// Content digest.
    pub digest: Bytes,
}

/// Computes content digests with a fixed algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeasurementCollector {
    algorithm: HashAlgorithm,
    chunk_size: usize,
}

impl MeasurementCollector {
    /// Collector using the default chunk size.
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self::with_chunk_size(algorithm, DEFAULT_CHUNK_SIZE)
    }

    /// Collector reading `chunk_size` bytes per step. Zero is treated as one.
    pub fn with_chunk_size(algorithm: HashAlgorithm, chunk_size: usize) -> Self {
        Self { algorithm, chunk_size: chunk_size.max(1) }
    }

    /// Algorithm in use.
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Digest of a file's full content.
    ///
    /// The result is always [`HashAlgorithm::digest_size`] bytes long.
    ///
    /// # Errors
    ///
    /// - `MeasurementError::Io` if the file cannot be opened or read
    pub fn hash_file(&self, path: &Path) -> Result<Bytes, MeasurementError> {
        let io_error = |source| MeasurementError::Io { path: path.to_path_buf(), source };

        let mut file = File::open(path).map_err(io_error)?;
        let mut hasher = Hasher::new(self.algorithm);
        let mut buf = vec![0u8; self.chunk_size];
        loop {
            match file.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => hasher.update(&buf[..n]),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {},
                Err(err) => return Err(io_error(err)),
            }
        }

        let digest = hasher.finalize();
        tracing::trace!(path = %path.display(), algorithm = %self.algorithm, "hashed file");
        Ok(digest)
    }

    /// Digests of every regular file directly inside `path`, sorted by name.
    ///
    /// Subdirectories, symlinks to directories and special files are skipped.
    /// An empty directory yields an empty list.
    ///
    /// # Errors
    ///
    /// - `MeasurementError::Directory` if `path` is not a readable directory
    /// - `MeasurementError::Io` if any contained file cannot be hashed
    /// - `MeasurementError::NonUtf8Name` if an entry name is not valid UTF-8
    pub fn hash_directory(&self, path: &Path) -> Result<Vec<FileMeasurement>, MeasurementError> {
        let dir_error = |source| MeasurementError::Directory { path: path.to_path_buf(), source };

        let metadata = std::fs::metadata(path).map_err(dir_error)?;
        if !metadata.is_dir() {
            return Err(dir_error(io::Error::new(
                io::ErrorKind::InvalidInput,
                "not a directory",
            )));
        }

        let walker = WalkDir::new(path)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name();

        let mut measurements = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|err| {
                let entry_path = err.path().unwrap_or(path).to_path_buf();
                let source = err.into_io_error().unwrap_or_else(|| {
                    io::Error::new(io::ErrorKind::InvalidData, "filesystem loop")
                });
                MeasurementError::Directory { path: entry_path, source }
            })?;

            if !entry.file_type().is_file() {
                tracing::debug!(path = %entry.path().display(), "skipping non-regular entry");
                continue;
            }

            let Some(file_name) = entry.file_name().to_str() else {
                return Err(MeasurementError::NonUtf8Name { path: entry.path().to_path_buf() });
            };
            let file_name = file_name.to_owned();
            let digest = self.hash_file(entry.path())?;
            measurements.push(FileMeasurement { file_name, digest });
        }

        tracing::debug!(
            path = %path.display(),
            files = measurements.len(),
            algorithm = %self.algorithm,
            "hashed directory"
        );
        Ok(measurements)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use hex_literal::hex;
    use proptest::prelude::*;
    use tempfile::TempDir;

    use super::*;

    const ALGORITHMS: [HashAlgorithm; 4] =
        [HashAlgorithm::Sha1, HashAlgorithm::Sha256, HashAlgorithm::Sha384, HashAlgorithm::Sha512];

    #[test]
    fn empty_file_digests() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty");
        fs::write(&path, b"").unwrap();

        let sha1 = MeasurementCollector::new(HashAlgorithm::Sha1).hash_file(&path).unwrap();
        assert_eq!(&sha1[..], hex!("da39a3ee5e6b4b0d3255bfef95601890afd80709"));

        let sha256 = MeasurementCollector::new(HashAlgorithm::Sha256).hash_file(&path).unwrap();
        assert_eq!(
            &sha256[..],
            hex!("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855")
        );
    }

    #[test]
    fn known_content_digest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("abc");
        fs::write(&path, b"abc").unwrap();

        let digest = MeasurementCollector::new(HashAlgorithm::Sha256).hash_file(&path).unwrap();
        assert_eq!(
            &digest[..],
            hex!("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
        );
    }

    #[test]
    fn digest_length_matches_algorithm() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data");
        fs::write(&path, b"measured content").unwrap();

        for algorithm in ALGORITHMS {
            let digest = MeasurementCollector::new(algorithm).hash_file(&path).unwrap();
            assert_eq!(digest.len(), algorithm.digest_size(), "{algorithm}");
        }
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing");

        let result = MeasurementCollector::new(HashAlgorithm::Sha256).hash_file(&path);
        assert!(matches!(result, Err(MeasurementError::Io { .. })));
    }

    #[test]
    fn directory_entries_match_individual_hashes() {
        let dir = TempDir::new().unwrap();
        for (name, content) in [("c", "third"), ("a", "first"), ("b", "second")] {
            fs::write(dir.path().join(name), content).unwrap();
        }
        let collector = MeasurementCollector::new(HashAlgorithm::Sha256);

        let entries = collector.hash_directory(dir.path()).unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.file_name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
        for entry in &entries {
            let expected = collector.hash_file(&dir.path().join(&entry.file_name)).unwrap();
            assert_eq!(entry.digest, expected);
        }
    }

    #[test]
    fn directory_skips_subdirectories() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("file"), "x").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("inner"), "y").unwrap();

        let entries =
            MeasurementCollector::new(HashAlgorithm::Sha1).hash_directory(dir.path()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].file_name, "file");
    }

    #[test]
    fn empty_directory_has_no_entries() {
        let dir = TempDir::new().unwrap();
        let entries =
            MeasurementCollector::new(HashAlgorithm::Sha256).hash_directory(dir.path()).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn missing_directory_is_directory_error() {
        let dir = TempDir::new().unwrap();
        let result = MeasurementCollector::new(HashAlgorithm::Sha256)
            .hash_directory(&dir.path().join("missing"));
        assert!(matches!(result, Err(MeasurementError::Directory { .. })));
    }

    #[test]
    fn file_is_not_a_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plain");
        fs::write(&path, "x").unwrap();

        let result = MeasurementCollector::new(HashAlgorithm::Sha256).hash_directory(&path);
        assert!(matches!(result, Err(MeasurementError::Directory { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_names_fail_the_directory() {
        use std::{ffi::OsStr, os::unix::ffi::OsStrExt};

        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(OsStr::from_bytes(b"a\xff")), "first").unwrap();
        fs::write(dir.path().join(OsStr::from_bytes(b"a\xfe")), "second").unwrap();

        let result = MeasurementCollector::new(HashAlgorithm::Sha256).hash_directory(dir.path());
        let Err(MeasurementError::NonUtf8Name { path }) = result else {
            panic!("expected a file name error, got {result:?}");
        };
        assert_eq!(path.parent(), Some(dir.path()));
    }

    #[cfg(unix)]
    #[test]
    fn failing_entry_discards_whole_directory() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a"), "good").unwrap();
        std::os::unix::fs::symlink(dir.path().join("nowhere"), dir.path().join("b")).unwrap();

        let result = MeasurementCollector::new(HashAlgorithm::Sha256).hash_directory(dir.path());
        let Err(err) = result else {
            panic!("expected an error, got {result:?}");
        };
        assert_eq!(err.path(), dir.path().join("b").as_path());
    }

    proptest! {
        #[test]
        fn chunk_size_does_not_change_digest(
            content in proptest::collection::vec(any::<u8>(), 0..4096),
            chunk_size in 1usize..512,
        ) {
            let dir = TempDir::new().unwrap();
            let path = dir.path().join("data");
            fs::write(&path, &content).unwrap();

            let whole = MeasurementCollector::with_chunk_size(HashAlgorithm::Sha256, 8192)
                .hash_file(&path)
                .unwrap();
            let chunked = MeasurementCollector::with_chunk_size(HashAlgorithm::Sha256, chunk_size)
                .hash_file(&path)
                .unwrap();
            prop_assert_eq!(whole, chunked);
        }
    }
}
