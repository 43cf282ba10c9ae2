//! Measurement digest algorithms.

use std::{fmt, str::FromStr};

use pts_proto::MeasAlgorithms;
use thiserror::Error;

/// Digest algorithm used for file measurements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    /// SHA-1
    Sha1,
    /// SHA-256
    Sha256,
    /// SHA-384
    Sha384,
    /// SHA-512 (local measurements only; PTS has no flag for it)
    Sha512,
}

impl HashAlgorithm {
    /// Negotiation preference, strongest first.
    pub const PRIORITY: [Self; 3] = [Self::Sha384, Self::Sha256, Self::Sha1];

    /// Digest size in bytes.
    pub const fn digest_size(self) -> usize {
        match self {
            Self::Sha1 => 20,
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }

    /// PTS flag announcing this algorithm.
    pub const fn meas_flag(self) -> Option<MeasAlgorithms> {
        match self {
            Self::Sha1 => Some(MeasAlgorithms::SHA1),
            Self::Sha256 => Some(MeasAlgorithms::SHA256),
            Self::Sha384 => Some(MeasAlgorithms::SHA384),
            Self::Sha512 => None,
        }
    }

    /// Pick the strongest algorithm present in both sets.
    ///
    /// Returns `None` when the sets share no algorithm.
    pub fn negotiate(local: MeasAlgorithms, peer: MeasAlgorithms) -> Option<Self> {
        let common = local & peer;
        Self::PRIORITY
            .into_iter()
            .find(|algorithm| algorithm.meas_flag().is_some_and(|flag| common.contains(flag)))
    }

    /// Lowercase name, as accepted by [`FromStr`].
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unrecognized algorithm name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown hash algorithm '{0}'")]
pub struct ParseAlgorithmError(String);

impl FromStr for HashAlgorithm {
    type Err = ParseAlgorithmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "").as_str() {
            "sha1" => Ok(Self::Sha1),
            "sha256" => Ok(Self::Sha256),
            "sha384" => Ok(Self::Sha384),
            "sha512" => Ok(Self::Sha512),
            _ => Err(ParseAlgorithmError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn digest_sizes_follow_algorithm() {
        assert_eq!(HashAlgorithm::Sha1.digest_size(), 20);
        assert_eq!(HashAlgorithm::Sha256.digest_size(), 32);
        assert_eq!(HashAlgorithm::Sha384.digest_size(), 48);
        assert_eq!(HashAlgorithm::Sha512.digest_size(), 64);
    }

    #[test]
    fn negotiation_prefers_strongest_common() {
        let all = MeasAlgorithms::all();
        assert_eq!(HashAlgorithm::negotiate(all, all), Some(HashAlgorithm::Sha384));
        assert_eq!(
            HashAlgorithm::negotiate(MeasAlgorithms::SHA1 | MeasAlgorithms::SHA256, all),
            Some(HashAlgorithm::Sha256)
        );
        assert_eq!(
            HashAlgorithm::negotiate(all, MeasAlgorithms::SHA1),
            Some(HashAlgorithm::Sha1)
        );
    }

    #[test]
    fn sha384_requires_local_support() {
        // The peer offers SHA-384 but it is not available locally.
        let local = MeasAlgorithms::SHA1 | MeasAlgorithms::SHA256;
        let peer = MeasAlgorithms::SHA384 | MeasAlgorithms::SHA1;
        assert_eq!(HashAlgorithm::negotiate(local, peer), Some(HashAlgorithm::Sha1));
    }

    #[test]
    fn disjoint_sets_have_no_agreement() {
        assert_eq!(
            HashAlgorithm::negotiate(MeasAlgorithms::SHA1, MeasAlgorithms::SHA384),
            None
        );
        assert_eq!(HashAlgorithm::negotiate(MeasAlgorithms::all(), MeasAlgorithms::empty()), None);
    }

    #[test]
    fn parses_names() {
        assert_eq!("SHA-256".parse(), Ok(HashAlgorithm::Sha256));
        assert_eq!("sha512".parse(), Ok(HashAlgorithm::Sha512));
        assert!("md5".parse::<HashAlgorithm>().is_err());
    }

    proptest! {
        #[test]
        fn negotiated_algorithm_is_strongest_common(local in any::<u16>(), peer in any::<u16>()) {
            let local = MeasAlgorithms::from_bits_truncate(local);
            let peer = MeasAlgorithms::from_bits_truncate(peer);
            let common = local & peer;

            match HashAlgorithm::negotiate(local, peer) {
                None => prop_assert!(common.is_empty()),
                Some(chosen) => {
                    let flag = chosen.meas_flag().unwrap();
                    prop_assert!(common.contains(flag));
                    // Nothing earlier in the priority list is common.
                    for stronger in HashAlgorithm::PRIORITY.iter().take_while(|a| **a != chosen) {
                        prop_assert!(!common.contains(stronger.meas_flag().unwrap()));
                    }
                },
            }
        }
    }
}
