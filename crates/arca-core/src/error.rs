//! Error types for the Arca facade
//!
//! [`ArcaError`] wraps the component errors unchanged; [`ArcaError::kind`]
//! projects every failure onto one [`ErrorKind`]:
//! - validation (local, raised before any I/O, never retried)
//! - lookups that found nothing, or too much
//! - optimistic append conflicts
//! - encryption and decryption
//! - transport, split into transient (retried) and terminal
//! - cancellation, local I/O and signing

use crate::config::ConfigError;
use arca_artifact::{ArtifactError, DigestError};
use arca_crypt::CryptError;
use arca_store::StoreError;
use arca_sync::{CredentialError, SyncError};
use std::path::PathBuf;

/// Failure category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    NotFound,
    AmbiguousSelector,
    ConcurrentModification,
    Encryption,
    Decryption,
    TransientTransport,
    TerminalTransport,
    Cancelled,
    Io,
    Signing,
}

/// Main Arca error type
#[derive(Debug, thiserror::Error)]
pub enum ArcaError {
    /// Invalid option combination
    #[error("invalid options: {0}")]
    Validation(String),

    /// Externally supplied digest is malformed
    #[error(transparent)]
    MalformedDigest(#[from] DigestError),

    /// Local store failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Push, pull or remote inspect failure
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Local file could not be read or written
    #[error("{path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ArcaError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Category of this failure
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::MalformedDigest(_) | Self::Config(_) => {
                ErrorKind::Validation
            }
            Self::Store(err) => store_kind(err),
            Self::Sync(err) => sync_kind(err),
            Self::Io { .. } => ErrorKind::Io,
        }
    }

    /// Whether the failure was raised before any I/O
    #[inline]
    #[must_use]
    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }
}

fn store_kind(err: &StoreError) -> ErrorKind {
    match err {
        StoreError::NotFound { .. } | StoreError::BlobNotFound { .. } => ErrorKind::NotFound,
        StoreError::AmbiguousSelector { .. } => ErrorKind::AmbiguousSelector,
        StoreError::ConcurrentModification { .. } => ErrorKind::ConcurrentModification,
        StoreError::AlreadyExists { .. }
        | StoreError::SelectorRequired { .. }
        | StoreError::InvalidName(_)
        | StoreError::PayloadMismatch { .. }
        | StoreError::PayloadCount { .. } => ErrorKind::Validation,
        StoreError::Artifact(err) => artifact_kind(err),
    }
}

fn crypt_kind(err: &CryptError) -> ErrorKind {
    match err {
        _ if err.is_validation() => ErrorKind::Validation,
        _ if err.is_encryption() => ErrorKind::Encryption,
        CryptError::Artifact(err) => artifact_kind(err),
        _ => ErrorKind::Decryption,
    }
}

fn artifact_kind(err: &ArtifactError) -> ErrorKind {
    match err {
        ArtifactError::Serialization(_) => ErrorKind::Io,
        ArtifactError::DigestMismatch { .. } => ErrorKind::TerminalTransport,
    }
}

fn sync_kind(err: &SyncError) -> ErrorKind {
    match err {
        SyncError::InvalidReference(_)
        | SyncError::InvalidRetryDelay { .. }
        | SyncError::SignerMissing { .. } => ErrorKind::Validation,
        SyncError::Credentials(CredentialError::AuthFile { .. }) => ErrorKind::Io,
        SyncError::Credentials(_) => ErrorKind::Validation,
        SyncError::Crypt(err) => crypt_kind(err),
        SyncError::Store(err) => store_kind(err),
        SyncError::Artifact(err) => artifact_kind(err),
        SyncError::Transport { source, .. } if source.is_transient() => {
            ErrorKind::TransientTransport
        }
        SyncError::Transport { .. }
        | SyncError::DigestMismatch { .. }
        | SyncError::MalformedRemote { .. }
        | SyncError::IllegalTransition { .. } => ErrorKind::TerminalTransport,
        SyncError::Cancelled { .. } => ErrorKind::Cancelled,
        SyncError::DigestFile { .. } => ErrorKind::Io,
        SyncError::Signing { .. } => ErrorKind::Signing,
    }
}
