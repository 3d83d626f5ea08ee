//! Content digest primitives
//!
//! Provides [`Digest`], the `algorithm:hex` identity used for every blob and
//! artifact manifest in the store.

use sha2::{Sha256, Sha512};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Supported digest algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Algorithm {
    /// SHA-256, 64 hex characters
    #[default]
    Sha256,
    /// SHA-512, 128 hex characters
    Sha512,
}

impl Algorithm {
    /// Prefix used in the encoded form
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
        }
    }

    /// Number of hex characters in an encoded digest
    #[inline]
    #[must_use]
    pub const fn hex_len(self) -> usize {
        match self {
            Self::Sha256 => 64,
            Self::Sha512 => 128,
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "sha256" => Some(Self::Sha256),
            "sha512" => Some(Self::Sha512),
            _ => None,
        }
    }
}

impl Display for Algorithm {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A content digest (`sha256:<hex>`)
///
/// Always holds lowercase hex of the exact length required by its algorithm.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Digest {
    algorithm: Algorithm,
    hex: String,
}

impl Digest {
    /// Compute the SHA-256 digest of arbitrary data
    #[inline]
    #[must_use]
    pub fn compute(data: &[u8]) -> Self {
        Self::compute_with(Algorithm::Sha256, data)
    }

    /// Compute a digest with an explicit algorithm
    #[must_use]
    pub fn compute_with(algorithm: Algorithm, data: &[u8]) -> Self {
        use sha2::Digest as _;

        let hex = match algorithm {
            Algorithm::Sha256 => hex::encode(Sha256::digest(data)),
            Algorithm::Sha512 => hex::encode(Sha512::digest(data)),
        };
        Self { algorithm, hex }
    }

    /// Check well-formedness of an encoded digest string
    #[inline]
    #[must_use]
    pub fn validate(s: &str) -> bool {
        Self::parse(s).is_ok()
    }

    /// Parse an externally supplied digest string
    ///
    /// # Errors
    /// Returns [`DigestError::Malformed`] when the prefix is unknown or the
    /// hex part has the wrong length or alphabet.
    pub fn parse(s: &str) -> Result<Self, DigestError> {
        let malformed = |reason: &str| DigestError::Malformed {
            input: s.to_string(),
            reason: reason.to_string(),
        };

        let (name, hex) = s
            .split_once(':')
            .ok_or_else(|| malformed("missing algorithm prefix"))?;
        let algorithm =
            Algorithm::from_name(name).ok_or_else(|| malformed("unsupported algorithm"))?;

        if hex.len() != algorithm.hex_len() {
            return Err(malformed("wrong hex length"));
        }
        if !hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(malformed("expected lowercase hex"));
        }

        Ok(Self {
            algorithm,
            hex: hex.to_string(),
        })
    }

    /// Digest algorithm
    #[inline]
    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Hex part without the algorithm prefix
    #[inline]
    #[must_use]
    pub fn hex(&self) -> &str {
        &self.hex
    }

    /// Short form (first 12 hex chars), as shown in listings
    #[inline]
    #[must_use]
    pub fn short(&self) -> &str {
        &self.hex[..12]
    }

    /// Check that `data` hashes to this digest
    #[inline]
    #[must_use]
    pub fn matches(&self, data: &[u8]) -> bool {
        Self::compute_with(self.algorithm, data) == *self
    }
}

impl Display for Digest {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.hex)
    }
}

impl FromStr for Digest {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl serde::Serialize for Digest {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for Digest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct DigestVisitor;

        impl serde::de::Visitor<'_> for DigestVisitor {
            type Value = Digest;

            fn expecting(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
                formatter.write_str("a digest string such as sha256:<hex>")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Digest::parse(value).map_err(serde::de::Error::custom)
            }
        }

        deserializer.deserialize_str(DigestVisitor)
    }
}

/// Errors that can occur when working with digests
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DigestError {
    /// The encoded form is not `algorithm:hex`
    #[error("malformed digest {input:?}: {reason}")]
    Malformed { input: String, reason: String },
}
