//! Declarative encryption and decryption configuration

use crate::error::CryptError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};

/// Encryption key specifier (`scheme:value`, e.g. `jwe:/keys/pub.pem`)
///
/// The value is opaque here; the encryptor interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EncryptionKey {
    scheme: String,
    value: String,
}

impl EncryptionKey {
    /// Parse a key specifier
    ///
    /// # Errors
    /// Returns `CryptError::EncryptionKeyInvalid` if the scheme or value is missing
    pub fn parse(spec: &str) -> Result<Self, CryptError> {
        let invalid = |reason: &str| CryptError::EncryptionKeyInvalid {
            key: spec.to_string(),
            reason: reason.to_string(),
        };
        let (scheme, value) = spec
            .split_once(':')
            .ok_or_else(|| invalid("expected scheme:value"))?;
        if scheme.is_empty() || !scheme.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(invalid("scheme must be non-empty alphanumeric"));
        }
        if value.is_empty() {
            return Err(invalid("empty key value"));
        }
        Ok(Self {
            scheme: scheme.to_ascii_lowercase(),
            value: value.to_string(),
        })
    }

    /// Key scheme (lowercase)
    #[inline]
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Scheme-specific value
    #[inline]
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl Display for EncryptionKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.scheme, self.value)
    }
}

/// Which layers to encrypt and with which keys
///
/// Negative indices count from the end (`-1` is the last blob).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncryptionPlan {
    layers: Vec<i32>,
    keys: Vec<EncryptionKey>,
}

impl EncryptionPlan {
    /// Build a plan from raw option values
    ///
    /// # Errors
    /// - `CryptError::MissingEncryptionKey` if layers are selected without keys
    /// - `CryptError::EncryptionKeyInvalid` if a key specifier is malformed
    pub fn new(layers: &[i32], keys: &[String]) -> Result<Self, CryptError> {
        if !layers.is_empty() && keys.is_empty() {
            return Err(CryptError::MissingEncryptionKey);
        }
        let keys = keys
            .iter()
            .map(|k| EncryptionKey::parse(k))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            layers: layers.to_vec(),
            keys,
        })
    }

    /// Plan that encrypts nothing
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// True when no layer is selected
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Keys to wrap the layer keys with
    #[inline]
    #[must_use]
    pub fn keys(&self) -> &[EncryptionKey] {
        &self.keys
    }

    /// Resolve indices against an artifact with `layer_count` blobs
    ///
    /// # Errors
    /// Returns `CryptError::LayerIndexOutOfRange` for any index that does not
    /// reference an existing blob.
    pub fn resolve(&self, layer_count: usize) -> Result<BTreeSet<usize>, CryptError> {
        self.layers
            .iter()
            .map(|&index| resolve_index(index, layer_count))
            .collect()
    }
}

fn resolve_index(index: i32, layer_count: usize) -> Result<usize, CryptError> {
    let out_of_range = || CryptError::LayerIndexOutOfRange { index, layer_count };
    let resolved = if index < 0 {
        let back = usize::try_from(index.unsigned_abs()).map_err(|_| out_of_range())?;
        layer_count.checked_sub(back).ok_or_else(out_of_range)?
    } else {
        usize::try_from(index).map_err(|_| out_of_range())?
    };
    if resolved < layer_count {
        Ok(resolved)
    } else {
        Err(out_of_range())
    }
}

/// Decryption configuration handed through to the decryptor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptConfig {
    /// Private key specifiers (opaque to the coordinator)
    pub keys: Vec<String>,
}

impl DecryptConfig {
    /// Config with the given private key specifiers
    #[must_use]
    pub fn with_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }
}
