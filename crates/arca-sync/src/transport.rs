//! Registry transport seam

use crate::credentials::AuthMaterial;
use crate::error::TransportError;
use arca_artifact::{Digest, Reference};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

/// TLS verification mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TlsPolicy {
    #[default]
    Verify,
    Skip,
}

impl TlsPolicy {
    /// Policy from an optional `tls_verify` flag and a default
    #[must_use]
    pub fn from_flag(tls_verify: Option<bool>, default_verify: bool) -> Self {
        if tls_verify.unwrap_or(default_verify) {
            Self::Verify
        } else {
            Self::Skip
        }
    }

    /// Whether certificates are verified
    #[inline]
    #[must_use]
    pub fn verifies(self) -> bool {
        self == Self::Verify
    }
}

/// Per-session connection settings handed to the transport
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportContext {
    pub auth: AuthMaterial,
    pub tls: TlsPolicy,
    /// Extra CA certificates directory
    pub cert_dir: Option<PathBuf>,
}

/// Raw artifact as fetched from a registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteArtifact {
    /// Digest the registry advertises for the manifest
    pub digest: Digest,
    /// Manifest bytes exactly as served
    pub manifest: Vec<u8>,
    /// Layer payloads, parallel to the manifest layers
    pub blobs: Vec<Vec<u8>>,
}

/// Bytes to upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadBundle {
    pub manifest: Vec<u8>,
    pub blobs: Vec<Arc<[u8]>>,
}

/// Talks to a remote registry
///
/// Implementations classify their failures through [`TransportError`];
/// retries and verification are the caller's business.
#[async_trait]
pub trait RegistryTransport: Send + Sync {
    /// Fetch manifest and blobs
    async fn fetch(
        &self,
        reference: &Reference,
        context: &TransportContext,
    ) -> Result<RemoteArtifact, TransportError>;

    /// Upload manifest and blobs, returning the digest the registry stored
    async fn upload(
        &self,
        reference: &Reference,
        bundle: &UploadBundle,
        context: &TransportContext,
    ) -> Result<Digest, TransportError>;

    /// Fetch only the manifest
    ///
    /// Defaults to a full fetch with the blobs dropped.
    async fn fetch_manifest(
        &self,
        reference: &Reference,
        context: &TransportContext,
    ) -> Result<(Digest, Vec<u8>), TransportError> {
        let remote = self.fetch(reference, context).await?;
        Ok((remote.digest, remote.manifest))
    }
}
