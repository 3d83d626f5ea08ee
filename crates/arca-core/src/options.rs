//! Per-operation options

use crate::error::ArcaError;
use arca_artifact::Digest;
use arca_crypt::DecryptConfig;
use arca_store::BlobSelector;
use arca_sync::{CancellationToken, CredentialRequest, ProgressSink, SigningRequest};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactAddOptions {
    pub annotations: BTreeMap<String, String>,
    pub artifact_type: Option<String>,
    /// Add to an existing artifact instead of creating one
    pub append: bool,
    /// Media type of the added files
    pub file_type: Option<String>,
}

/// Blob selection for extraction
///
/// `title` and `digest` are mutually exclusive; empty strings count as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactExtractOptions {
    pub title: Option<String>,
    pub digest: Option<String>,
}

impl ArtifactExtractOptions {
    #[must_use]
    pub fn by_title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            digest: None,
        }
    }

    #[must_use]
    pub fn by_digest(digest: impl Into<String>) -> Self {
        Self {
            title: None,
            digest: Some(digest.into()),
        }
    }

    /// Turn the options into a selector
    ///
    /// # Errors
    /// `ArcaError::Validation` if both fields are set,
    /// `ArcaError::MalformedDigest` if the digest is not well-formed
    pub fn selector(&self) -> Result<Option<BlobSelector>, ArcaError> {
        let title = self.title.as_deref().filter(|t| !t.is_empty());
        let digest = self.digest.as_deref().filter(|d| !d.is_empty());
        match (title, digest) {
            (Some(_), Some(_)) => Err(ArcaError::validation(
                "title and digest are mutually exclusive",
            )),
            (Some(title), None) => Ok(Some(BlobSelector::Title(title.to_string()))),
            (None, Some(digest)) => Ok(Some(BlobSelector::Digest(Digest::parse(digest)?))),
            (None, None) => Ok(None),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArtifactInspectOptions {
    /// Inspect the registry copy instead of the local one
    pub remote: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArtifactListOptions;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArtifactRemoveOptions {
    /// Remove every artifact; exclusive with explicit references
    pub all: bool,
}

/// Options of a pull
#[derive(Clone, Default)]
pub struct ArtifactPullOptions {
    pub auth_file: Option<PathBuf>,
    pub cert_dir: Option<PathBuf>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// `None` uses the configured default
    pub tls_verify: Option<bool>,
    pub max_retries: Option<u32>,
    pub retry_delay: Option<String>,
    pub decrypt_config: Option<DecryptConfig>,
    pub quiet: bool,
    pub writer: Option<Arc<dyn ProgressSink>>,
    pub cancel: CancellationToken,
}

impl ArtifactPullOptions {
    pub(crate) fn credentials(&self) -> CredentialRequest {
        CredentialRequest {
            auth_file: self.auth_file.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            credentials: None,
        }
    }
}

/// Options of a push
#[derive(Clone, Default)]
pub struct ArtifactPushOptions {
    pub auth_file: Option<PathBuf>,
    pub cert_dir: Option<PathBuf>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Inline `user[:password]`
    pub credentials: Option<String>,
    pub digest_file: Option<PathBuf>,
    /// Blob indices to encrypt; negative values count from the end
    pub encrypt_layers: Vec<i32>,
    pub encryption_keys: Vec<String>,
    pub sign_by_sigstore_param_file: Option<PathBuf>,
    pub sign_passphrase_file: Option<PathBuf>,
    /// `None` uses the configured default
    pub tls_verify: Option<bool>,
    pub max_retries: Option<u32>,
    pub retry_delay: Option<String>,
    pub quiet: bool,
    pub writer: Option<Arc<dyn ProgressSink>>,
    pub cancel: CancellationToken,
}

impl ArtifactPushOptions {
    pub(crate) fn credentials(&self) -> CredentialRequest {
        CredentialRequest {
            auth_file: self.auth_file.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            credentials: self.credentials.clone(),
        }
    }

    pub(crate) fn signing(&self) -> SigningRequest {
        SigningRequest {
            sigstore_param_file: self.sign_by_sigstore_param_file.clone(),
            passphrase_file: self.sign_passphrase_file.clone(),
        }
    }
}
