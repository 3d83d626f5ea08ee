//! Encryption coordination for push and pull
//!
//! The coordinator never touches key material. It decides which layers are
//! sealed, hands them to the configured [`Encryptor`] or [`Decryptor`], and
//! rewrites the layer descriptors so the transmitted manifest stays
//! self-describing:
//!
//! - the media type gains the [`ENCRYPTED_SUFFIX`]
//! - collaborator annotations (wrapped keys, cipher options) are attached
//! - the plaintext digest is kept under [`ENC_DIGEST_ANNOTATION`]
//!
//! Pull reverses all three and checks the plaintext digest.

use crate::config::{DecryptConfig, EncryptionKey, EncryptionPlan};
use crate::error::CryptError;
use arca_artifact::{Artifact, Blob, Digest, Manifest};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Prefix reserved for encryption annotations
pub const ENC_ANNOTATION_PREFIX: &str = "org.opencontainers.image.enc.";

/// Annotation holding the digest of the plaintext layer
pub const ENC_DIGEST_ANNOTATION: &str = "org.opencontainers.image.enc.digest";

/// Media type suffix of encrypted layers
pub const ENCRYPTED_SUFFIX: &str = "+encrypted";

/// Output of an [`Encryptor`] for one layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedLayer {
    pub ciphertext: Vec<u8>,
    /// Annotations to attach; every key must start with [`ENC_ANNOTATION_PREFIX`]
    pub annotations: BTreeMap<String, String>,
}

/// Layer encryption capability
pub trait Encryptor: Send + Sync {
    /// Seal one layer for the given recipients
    ///
    /// # Errors
    /// `EncryptionKeyInvalid` for unusable keys, `EncryptionFailed` otherwise
    fn encrypt(
        &self,
        layer: &Blob,
        plaintext: &[u8],
        keys: &[EncryptionKey],
    ) -> Result<SealedLayer, CryptError>;
}

/// Layer decryption capability
pub trait Decryptor: Send + Sync {
    /// Open one sealed layer
    ///
    /// `layer` is the transmitted descriptor, annotations included.
    ///
    /// # Errors
    /// `DecryptionFailed` for a wrong or missing key or corrupt data
    fn decrypt(
        &self,
        layer: &Blob,
        ciphertext: &[u8],
        config: &DecryptConfig,
    ) -> Result<Vec<u8>, CryptError>;
}

/// Artifact as it goes over the wire
#[derive(Debug, Clone)]
pub struct TransmitView {
    pub manifest: Manifest,
    pub payloads: Vec<Arc<[u8]>>,
}

/// Pulled artifact with every encrypted layer opened
#[derive(Debug, Clone)]
pub struct PlaintextView {
    pub manifest: Manifest,
    pub payloads: Vec<Vec<u8>>,
}

/// Coordinates layer encryption on push and decryption on pull
#[derive(Clone, Default)]
pub struct EncryptionCoordinator {
    encryptor: Option<Arc<dyn Encryptor>>,
    decryptor: Option<Arc<dyn Decryptor>>,
}

impl std::fmt::Debug for EncryptionCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionCoordinator")
            .field("encryptor", &self.encryptor.is_some())
            .field("decryptor", &self.decryptor.is_some())
            .finish()
    }
}

impl EncryptionCoordinator {
    /// Coordinator with no crypto collaborators
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the encryption collaborator
    #[must_use]
    pub fn with_encryptor(mut self, encryptor: Arc<dyn Encryptor>) -> Self {
        self.encryptor = Some(encryptor);
        self
    }

    /// Set the decryption collaborator
    #[must_use]
    pub fn with_decryptor(mut self, decryptor: Arc<dyn Decryptor>) -> Self {
        self.decryptor = Some(decryptor);
        self
    }

    /// Check a plan against an artifact without encrypting anything
    ///
    /// # Errors
    /// - `LayerIndexOutOfRange` for bad indices
    /// - `ReservedAnnotation` if a selected layer already carries an
    ///   encryption annotation
    /// - `NoEncryptor` when layers are selected and no encryptor is configured
    pub fn check_plan(&self, artifact: &Artifact, plan: &EncryptionPlan) -> Result<(), CryptError> {
        if plan.is_empty() {
            return Ok(());
        }
        for index in plan.resolve(artifact.blobs().len())? {
            let layer = &artifact.blobs()[index];
            if let Some(key) = layer
                .annotations
                .keys()
                .find(|k| k.starts_with(ENC_ANNOTATION_PREFIX))
            {
                return Err(CryptError::ReservedAnnotation {
                    index,
                    key: key.clone(),
                });
            }
        }
        if self.encryptor.is_none() {
            return Err(CryptError::NoEncryptor);
        }
        Ok(())
    }

    /// Build the transmitted view of `artifact`
    ///
    /// The source artifact is left untouched. With an empty plan the view is
    /// the artifact's own manifest and payloads.
    ///
    /// # Errors
    /// Plan errors as in [`Self::check_plan`], or any error from the encryptor
    pub fn encrypt_for_push(
        &self,
        artifact: &Artifact,
        payloads: &[Arc<[u8]>],
        plan: &EncryptionPlan,
    ) -> Result<TransmitView, CryptError> {
        self.check_plan(artifact, plan)?;
        let mut manifest = artifact.manifest();
        let mut payloads = payloads.to_vec();
        let Some(encryptor) = self.encryptor.as_ref().filter(|_| !plan.is_empty()) else {
            return Ok(TransmitView { manifest, payloads });
        };

        let selected = plan.resolve(manifest.layers.len())?;
        for index in selected {
            let layer = &manifest.layers[index];
            let plaintext = &payloads[index];
            let sealed = encryptor.encrypt(layer, plaintext, plan.keys())?;
            if let Some(key) = sealed
                .annotations
                .keys()
                .find(|k| !k.starts_with(ENC_ANNOTATION_PREFIX))
            {
                return Err(CryptError::EncryptionFailed {
                    index,
                    reason: format!("encryptor produced non-encryption annotation {key:?}"),
                });
            }

            let mut sealed_layer = Blob::from_bytes(
                format!("{}{ENCRYPTED_SUFFIX}", layer.media_type),
                &sealed.ciphertext,
            );
            sealed_layer.annotations = layer.annotations.clone();
            sealed_layer.annotations.extend(sealed.annotations);
            sealed_layer
                .annotations
                .insert(ENC_DIGEST_ANNOTATION.to_string(), layer.digest.to_string());
            debug!(
                index,
                plaintext = %layer.digest,
                ciphertext = %sealed_layer.digest,
                "Layer encrypted"
            );

            manifest.layers[index] = sealed_layer;
            payloads[index] = Arc::from(sealed.ciphertext);
        }

        info!(artifact = %artifact.name(), "Prepared encrypted view");
        Ok(TransmitView { manifest, payloads })
    }

    /// Open every encrypted layer of a pulled manifest
    ///
    /// A layer counts as encrypted only when its media type ends in
    /// [`ENCRYPTED_SUFFIX`] and it carries [`ENC_DIGEST_ANNOTATION`]. Other
    /// layers pass through unchanged.
    ///
    /// # Errors
    /// - `DecryptionFailed` if a layer is encrypted and no config or decryptor
    ///   is available, or the decryptor fails
    /// - `DigestMismatch` if the opened bytes are not the recorded plaintext
    pub fn decrypt_on_pull(
        &self,
        manifest: Manifest,
        payloads: Vec<Vec<u8>>,
        config: Option<&DecryptConfig>,
    ) -> Result<PlaintextView, CryptError> {
        let Manifest {
            artifact_type,
            layers,
            annotations,
            ..
        } = manifest;

        let mut open_layers = Vec::with_capacity(layers.len());
        let mut open_payloads = Vec::with_capacity(payloads.len());
        for (layer, data) in layers.into_iter().zip(payloads) {
            if !is_sealed(&layer) {
                open_layers.push(layer);
                open_payloads.push(data);
                continue;
            }
            let (layer, data) = self.open_layer(&layer, &data, config)?;
            open_layers.push(layer);
            open_payloads.push(data);
        }

        Ok(PlaintextView {
            manifest: Manifest::new(artifact_type, open_layers, annotations),
            payloads: open_payloads,
        })
    }

    fn open_layer(
        &self,
        layer: &Blob,
        ciphertext: &[u8],
        config: Option<&DecryptConfig>,
    ) -> Result<(Blob, Vec<u8>), CryptError> {
        let failed = |reason: &str| CryptError::DecryptionFailed {
            digest: layer.digest.clone(),
            reason: reason.to_string(),
        };
        let config = config.ok_or_else(|| failed("layer is encrypted and no decryption config was given"))?;
        let decryptor = self
            .decryptor
            .as_ref()
            .ok_or_else(|| failed("no decryptor configured"))?;
        let expected = layer
            .annotations
            .get(ENC_DIGEST_ANNOTATION)
            .ok_or_else(|| failed("missing plaintext digest annotation"))
            .and_then(|raw| Digest::parse(raw).map_err(|e| failed(&e.to_string())))?;

        let plaintext = decryptor.decrypt(layer, ciphertext, config)?;
        if !expected.matches(&plaintext) {
            return Err(CryptError::DigestMismatch {
                actual: Digest::compute_with(expected.algorithm(), &plaintext),
                expected,
            });
        }

        let media_type = layer
            .media_type
            .strip_suffix(ENCRYPTED_SUFFIX)
            .unwrap_or(&layer.media_type);
        let mut open = Blob::from_bytes(media_type, &plaintext);
        open.digest = expected;
        open.annotations = layer
            .annotations
            .iter()
            .filter(|(k, _)| !k.starts_with(ENC_ANNOTATION_PREFIX))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        debug!(digest = %open.digest, "Layer decrypted");
        Ok((open, plaintext))
    }
}

fn is_sealed(layer: &Blob) -> bool {
    layer.media_type.ends_with(ENCRYPTED_SUFFIX)
        && layer.annotations.contains_key(ENC_DIGEST_ANNOTATION)
}
