//! Signing seam

use arca_artifact::{Digest, Reference};
use async_trait::async_trait;
use std::path::PathBuf;

/// Signing options of a push
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SigningRequest {
    /// Sigstore parameter file
    pub sigstore_param_file: Option<PathBuf>,
    /// Passphrase file for a simple-signing key
    pub passphrase_file: Option<PathBuf>,
}

impl SigningRequest {
    /// Whether any signing option is set
    #[inline]
    #[must_use]
    pub fn is_requested(&self) -> bool {
        self.sigstore_param_file.is_some() || self.passphrase_file.is_some()
    }
}

/// Signer failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct SignError(pub String);

/// Signs pushed artifacts
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Signer: Send + Sync {
    /// Sign the artifact `digest` pushed to `reference`
    async fn sign(
        &self,
        reference: &Reference,
        digest: &Digest,
        request: &SigningRequest,
    ) -> Result<(), SignError>;
}
