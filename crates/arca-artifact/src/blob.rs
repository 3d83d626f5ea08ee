//! Blob descriptors
//!
//! A [`Blob`] is one content-addressed payload inside an artifact. It carries
//! only metadata; payload bytes are held by whoever owns the artifact.

use crate::digest::Digest;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reserved annotation key holding a blob's title (usually the file name)
pub const TITLE_ANNOTATION: &str = "org.opencontainers.image.title";

/// Media type used when none is supplied
pub const DEFAULT_BLOB_MEDIA_TYPE: &str = "application/octet-stream";

/// Content-addressed blob descriptor
///
/// Serializes as an OCI descriptor (`mediaType`, `digest`, `size`,
/// `annotations`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    /// Media type of the payload
    pub media_type: String,
    /// Digest of the payload bytes
    pub digest: Digest,
    /// Payload size in bytes
    pub size: u64,
    /// Descriptor annotations
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl Blob {
    /// Describe `data` with the given media type
    #[must_use]
    pub fn from_bytes(media_type: impl Into<String>, data: &[u8]) -> Self {
        Self {
            media_type: media_type.into(),
            digest: Digest::compute(data),
            size: data.len() as u64,
            annotations: BTreeMap::new(),
        }
    }

    /// Set the title annotation
    #[inline]
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.annotations
            .insert(TITLE_ANNOTATION.to_string(), title.into());
        self
    }

    /// Add an arbitrary annotation
    #[inline]
    #[must_use]
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    /// Title annotation, if any
    #[inline]
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.annotations.get(TITLE_ANNOTATION).map(String::as_str)
    }

    /// Check that `data` is the payload this blob describes
    #[inline]
    #[must_use]
    pub fn describes(&self, data: &[u8]) -> bool {
        self.size == data.len() as u64 && self.digest.matches(data)
    }
}

/// A blob descriptor together with its payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobPayload {
    pub blob: Blob,
    pub data: Vec<u8>,
}

impl BlobPayload {
    /// Build a payload, computing its descriptor
    #[must_use]
    pub fn new(media_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            blob: Blob::from_bytes(media_type, &data),
            data,
        }
    }

    /// Set the title annotation on the descriptor
    #[inline]
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.blob = self.blob.with_title(title);
        self
    }
}
