//! Error types for registry synchronisation

use crate::attempt::AttemptState;
use crate::credentials::CredentialError;
use crate::signing::SignError;
use arca_artifact::{ArtifactError, Digest, ReferenceError};
use arca_crypt::CryptError;
use arca_store::StoreError;
use std::path::PathBuf;

/// Failure reported by a registry transport
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Operation timed out
    #[error("timed out: {0}")]
    Timeout(String),

    /// Connection could not be established or was dropped
    #[error("connection failed: {0}")]
    Connection(String),

    /// Registry answered with an error status
    #[error("registry returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Credentials were rejected
    #[error("authentication rejected: {0}")]
    Unauthorized(String),

    /// Manifest or blob does not exist remotely
    #[error("{0} not found in registry")]
    NotFound(String),

    /// Registry refused the upload
    #[error("upload rejected: {0}")]
    Rejected(String),
}

impl TransportError {
    /// Whether retrying may help
    ///
    /// Timeouts, dropped connections, 5xx and 429 are transient; everything
    /// else is terminal.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Connection(_) => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::Unauthorized(_) | Self::NotFound(_) | Self::Rejected(_) => false,
        }
    }
}

/// Sync engine errors
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Reference could not be parsed
    #[error("invalid reference: {0}")]
    InvalidReference(#[from] ReferenceError),

    /// Retry delay string could not be parsed
    #[error("invalid retry delay {input:?}: {reason}")]
    InvalidRetryDelay { input: String, reason: String },

    /// Credential options are contradictory or unreadable
    #[error("credentials: {0}")]
    Credentials(#[from] CredentialError),

    /// Signing was requested but no signer is configured
    #[error("signing requested for {reference} but no signer is configured")]
    SignerMissing { reference: String },

    /// Encryption or decryption failed
    #[error(transparent)]
    Crypt(#[from] CryptError),

    /// Local store lookup or import failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Local manifest could not be serialized
    #[error(transparent)]
    Artifact(ArtifactError),

    /// Transport failed and no attempts remain (or the failure is terminal)
    #[error("{operation} {reference} failed on attempt {attempt} of {max_attempts}: {source}")]
    Transport {
        reference: String,
        operation: &'static str,
        attempt: u32,
        max_attempts: u32,
        #[source]
        source: TransportError,
    },

    /// Fetched or uploaded content does not hash to the expected digest
    #[error("digest mismatch for {reference}: expected {expected}, got {actual}")]
    DigestMismatch {
        reference: String,
        expected: Digest,
        actual: Digest,
    },

    /// Fetched manifest is inconsistent with the fetched blobs
    #[error("malformed remote artifact {reference}: {reason}")]
    MalformedRemote { reference: String, reason: String },

    /// Caller cancelled the operation
    #[error("{operation} {reference} cancelled at attempt {attempt}")]
    Cancelled {
        reference: String,
        operation: &'static str,
        attempt: u32,
    },

    /// Digest file could not be written
    #[error("writing digest file {path:?}: {source}")]
    DigestFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Signer failed
    #[error("signing {reference}: {source}")]
    Signing {
        reference: String,
        #[source]
        source: SignError,
    },

    /// Attempt state machine was driven illegally
    #[error("illegal attempt transition {from:?} -> {to:?}")]
    IllegalTransition { from: AttemptState, to: AttemptState },
}

impl SyncError {
    /// Errors raised before any network activity
    #[must_use]
    pub fn is_validation(&self) -> bool {
        match self {
            Self::InvalidReference(_)
            | Self::InvalidRetryDelay { .. }
            | Self::Credentials(_)
            | Self::SignerMissing { .. } => true,
            Self::Crypt(err) => err.is_validation(),
            _ => false,
        }
    }

    /// Transport failure that was transient (retries exhausted)
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport { source, .. } if source.is_transient())
    }

    /// Failure to decode content served by the registry
    pub(crate) fn from_remote(reference: &str, err: ArtifactError) -> Self {
        match err {
            ArtifactError::DigestMismatch { expected, actual } => Self::DigestMismatch {
                reference: reference.to_string(),
                expected,
                actual,
            },
            ArtifactError::Serialization(err) => Self::MalformedRemote {
                reference: reference.to_string(),
                reason: format!("manifest could not be decoded: {err}"),
            },
        }
    }
}
