//! Error types for encryption coordination

use arca_artifact::{ArtifactError, Digest};

/// Encryption and decryption errors
#[derive(Debug, thiserror::Error)]
pub enum CryptError {
    /// Layers were selected for encryption but no key was supplied
    #[error("layers selected for encryption but no encryption keys were given")]
    MissingEncryptionKey,

    /// Key specifier is malformed or rejected by the encryptor
    #[error("invalid encryption key {key:?}: {reason}")]
    EncryptionKeyInvalid { key: String, reason: String },

    /// Layer index does not reference an existing blob
    #[error("layer index {index} out of range for artifact with {layer_count} blobs")]
    LayerIndexOutOfRange { index: i32, layer_count: usize },

    /// Layer selected for encryption already carries a reserved annotation
    #[error("layer {index} carries reserved encryption annotation {key:?}")]
    ReservedAnnotation { index: usize, key: String },

    /// Encryption was requested but no encryptor is configured
    #[error("no encryptor configured")]
    NoEncryptor,

    /// Encryptor failed on a layer
    #[error("encrypting layer {index} failed: {reason}")]
    EncryptionFailed { index: usize, reason: String },

    /// Decryption failed (wrong or missing key, corrupt data)
    #[error("decrypting blob {digest} failed: {reason}")]
    DecryptionFailed { digest: Digest, reason: String },

    /// Decrypted bytes do not hash to the recorded plaintext digest
    #[error("decrypted blob digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: Digest, actual: Digest },

    /// Manifest construction failed
    #[error("artifact error: {0}")]
    Artifact(#[from] ArtifactError),
}

impl CryptError {
    /// Errors raised while encrypting (push side)
    #[inline]
    #[must_use]
    pub fn is_encryption(&self) -> bool {
        matches!(
            self,
            Self::MissingEncryptionKey
                | Self::EncryptionKeyInvalid { .. }
                | Self::LayerIndexOutOfRange { .. }
                | Self::ReservedAnnotation { .. }
                | Self::NoEncryptor
                | Self::EncryptionFailed { .. }
        )
    }

    /// Configuration errors detectable before any I/O
    #[inline]
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingEncryptionKey
                | Self::EncryptionKeyInvalid { .. }
                | Self::LayerIndexOutOfRange { .. }
                | Self::ReservedAnnotation { .. }
        )
    }
}
