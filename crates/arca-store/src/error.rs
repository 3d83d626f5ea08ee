//! Error types for the local store

use arca_artifact::{ArtifactError, Digest};

/// Local store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Name already maps to an artifact (use append instead)
    #[error("artifact {name} already exists")]
    AlreadyExists { name: String },

    /// No artifact matches the name or digest
    #[error("artifact {reference} not found")]
    NotFound { reference: String },

    /// No blob in the artifact matches the selector
    #[error("no blob matching {selector} in artifact {reference}")]
    BlobNotFound { reference: String, selector: String },

    /// Title selector matches more than one blob
    #[error("title {title:?} matches {count} blobs in artifact {reference}")]
    AmbiguousSelector {
        reference: String,
        title: String,
        count: usize,
    },

    /// Artifact has several blobs and no selector was given
    #[error("artifact {reference} has {blob_count} blobs; a title or digest selector is required")]
    SelectorRequired { reference: String, blob_count: usize },

    /// Optimistic append lost the race
    #[error("artifact {name} changed concurrently: expected {expected}, found {actual}")]
    ConcurrentModification {
        name: String,
        expected: Digest,
        actual: Digest,
    },

    /// Artifact names must be non-empty
    #[error("invalid artifact name {0:?}")]
    InvalidName(String),

    /// Blob descriptor does not describe the supplied bytes
    #[error("payload for blob {digest} does not match its descriptor")]
    PayloadMismatch { digest: Digest },

    /// Number of payloads differs from the number of layers
    #[error("expected {expected} payloads, got {actual}")]
    PayloadCount { expected: usize, actual: usize },

    /// Manifest construction failed
    #[error("artifact error: {0}")]
    Artifact(#[from] ArtifactError),
}

/// Inspection errors: either local, or from the remote inspector
#[derive(Debug, thiserror::Error)]
pub enum InspectError<E> {
    /// Local lookup failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Remote inspection failed
    #[error("remote inspection failed: {0}")]
    Remote(#[source] E),
}
