//! Registry sync engine
//!
//! One push or pull is one session: options are validated and resolved
//! locally, then the transport is driven through the attempt state machine
//! with the session's retry policy. Everything fetched is re-hashed before it
//! reaches the local store.

use crate::attempt::{AttemptState, AttemptTracker};
use crate::credentials::{CredentialRequest, CredentialSource, DefaultCredentialSource};
use crate::error::{SyncError, TransportError};
use crate::progress::{Progress, ProgressSink};
use crate::retry::{RetryDefaults, RetryPolicy};
use crate::signing::{Signer, SigningRequest};
use crate::transport::{RegistryTransport, RemoteArtifact, TlsPolicy, TransportContext, UploadBundle};
use arca_artifact::{Artifact, ArtifactDescriptor, Digest, Manifest, Reference};
use arca_crypt::{DecryptConfig, EncryptionCoordinator, EncryptionPlan};
use arca_store::{LocalStore, RemoteInspector};
use async_trait::async_trait;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Options of one push
#[derive(Clone, Default)]
pub struct PushRequest {
    pub credentials: CredentialRequest,
    pub tls_verify: Option<bool>,
    pub cert_dir: Option<PathBuf>,
    /// Where to write the pushed manifest digest
    pub digest_file: Option<PathBuf>,
    /// Blob indices to encrypt; negative values count from the end
    pub encrypt_layers: Vec<i32>,
    pub encryption_keys: Vec<String>,
    pub signing: SigningRequest,
    pub max_retries: Option<u32>,
    pub retry_delay: Option<String>,
    pub quiet: bool,
    pub progress: Option<Arc<dyn ProgressSink>>,
    pub cancel: CancellationToken,
}

/// Options of one pull
#[derive(Clone, Default)]
pub struct PullRequest {
    pub credentials: CredentialRequest,
    pub tls_verify: Option<bool>,
    pub cert_dir: Option<PathBuf>,
    pub decrypt: Option<DecryptConfig>,
    /// Local name to store under; defaults to the source reference
    pub name: Option<String>,
    pub max_retries: Option<u32>,
    pub retry_delay: Option<String>,
    pub quiet: bool,
    pub progress: Option<Arc<dyn ProgressSink>>,
    pub cancel: CancellationToken,
}

/// Result of a successful push
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushOutcome {
    pub reference: Reference,
    /// Digest of the manifest as stored remotely
    pub digest: Digest,
    pub attempts: u32,
    pub encrypted_layers: usize,
    pub signed: bool,
}

/// Result of a successful pull
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullOutcome {
    /// Artifact as imported into the local store
    pub artifact: Artifact,
    pub attempts: u32,
}

/// Pushes and pulls artifacts between a [`LocalStore`] and a registry
pub struct SyncEngine {
    transport: Arc<dyn RegistryTransport>,
    credentials: Arc<dyn CredentialSource>,
    signer: Option<Arc<dyn Signer>>,
    crypto: EncryptionCoordinator,
    retry_defaults: RetryDefaults,
    tls_verify_default: bool,
    inspect_credentials: CredentialRequest,
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("signer", &self.signer.is_some())
            .field("crypto", &self.crypto)
            .field("retry_defaults", &self.retry_defaults)
            .field("tls_verify_default", &self.tls_verify_default)
            .finish_non_exhaustive()
    }
}

impl SyncEngine {
    /// Engine over `transport` with default credentials and no signer
    #[must_use]
    pub fn new(transport: Arc<dyn RegistryTransport>) -> Self {
        Self {
            transport,
            credentials: Arc::new(DefaultCredentialSource),
            signer: None,
            crypto: EncryptionCoordinator::new(),
            retry_defaults: RetryDefaults::default(),
            tls_verify_default: true,
            inspect_credentials: CredentialRequest::default(),
        }
    }

    #[must_use]
    pub fn with_credential_source(mut self, source: Arc<dyn CredentialSource>) -> Self {
        self.credentials = source;
        self
    }

    #[must_use]
    pub fn with_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = Some(signer);
        self
    }

    #[must_use]
    pub fn with_crypto(mut self, crypto: EncryptionCoordinator) -> Self {
        self.crypto = crypto;
        self
    }

    #[must_use]
    pub fn with_retry_defaults(mut self, defaults: RetryDefaults) -> Self {
        self.retry_defaults = defaults;
        self
    }

    #[must_use]
    pub fn with_tls_verify_default(mut self, verify: bool) -> Self {
        self.tls_verify_default = verify;
        self
    }

    /// Credentials used for remote inspection
    #[must_use]
    pub fn with_inspect_credentials(mut self, request: CredentialRequest) -> Self {
        self.inspect_credentials = request;
        self
    }

    /// Push the artifact stored as `name` to `destination`
    ///
    /// Option problems (bad reference, retry delay, encryption keys, layer
    /// indices, credentials, missing signer) are reported before the
    /// transport is touched.
    ///
    /// # Errors
    /// Any [`SyncError`]; transport failures carry the attempt number
    #[tracing::instrument(skip(self, store, request))]
    pub async fn push(
        &self,
        store: &LocalStore,
        name: &str,
        destination: &str,
        request: &PushRequest,
    ) -> Result<PushOutcome, SyncError> {
        let reference = Reference::parse(destination)?;
        let policy = RetryPolicy::resolve(
            request.max_retries,
            request.retry_delay.as_deref(),
            &self.retry_defaults,
        )?;
        let plan = EncryptionPlan::new(&request.encrypt_layers, &request.encryption_keys)?;
        if request.signing.is_requested() && self.signer.is_none() {
            return Err(SyncError::SignerMissing {
                reference: destination.to_string(),
            });
        }
        let context = self.context(
            &reference,
            &request.credentials,
            request.tls_verify,
            request.cert_dir.clone(),
        )
        .await?;

        let (artifact, payloads) = store.snapshot(name)?;
        let view = self.crypto.encrypt_for_push(&artifact, &payloads, &plan)?;
        let encrypted_layers = plan.resolve(artifact.blobs().len())?.len();
        let manifest = view
            .manifest
            .to_bytes()
            .map_err(SyncError::Artifact)?;
        let expected = Digest::compute(&manifest);
        let bundle = UploadBundle {
            manifest,
            blobs: view.payloads,
        };

        let progress = Progress::new(request.progress.clone(), request.quiet);
        announce_tls(&reference, context.tls, &progress);
        info!(
            artifact = %artifact.digest(),
            pushed = %expected,
            blobs = bundle.blobs.len(),
            encrypted_layers,
            "Pushing artifact"
        );
        progress.line(&format!(
            "Copying {} blobs to {reference}",
            bundle.blobs.len()
        ));

        let (stored, attempts) = retry_transport(
            "push",
            &reference,
            &policy,
            &request.cancel,
            &progress,
            || self.transport.upload(&reference, &bundle, &context),
        )
        .await?;
        if stored != expected {
            error!(%expected, %stored, "Registry stored a different manifest");
            return Err(SyncError::DigestMismatch {
                reference: destination.to_string(),
                expected,
                actual: stored,
            });
        }

        if let Some(path) = &request.digest_file {
            tokio::fs::write(path, expected.to_string())
                .await
                .map_err(|source| SyncError::DigestFile {
                    path: path.clone(),
                    source,
                })?;
            debug!(path = %path.display(), "Wrote digest file");
        }

        let signed = match (&self.signer, request.signing.is_requested()) {
            (Some(signer), true) => {
                signer
                    .sign(&reference, &expected, &request.signing)
                    .await
                    .map_err(|source| SyncError::Signing {
                        reference: destination.to_string(),
                        source,
                    })?;
                progress.line(&format!("Signed {reference}"));
                true
            }
            _ => false,
        };

        progress.line(&format!("Writing manifest {expected}"));
        info!(digest = %expected, attempts, signed, "Push complete");
        Ok(PushOutcome {
            reference,
            digest: expected,
            attempts,
            encrypted_layers,
            signed,
        })
    }

    /// Pull `source` into `store`
    ///
    /// The manifest and every blob are re-hashed; encrypted layers are opened
    /// with the request's decrypt config. A previous local artifact of the
    /// same name is replaced.
    ///
    /// # Errors
    /// Any [`SyncError`]; verification failures are never retried
    #[tracing::instrument(skip(self, store, request))]
    pub async fn pull(
        &self,
        store: &LocalStore,
        source: &str,
        request: &PullRequest,
    ) -> Result<PullOutcome, SyncError> {
        let reference = Reference::parse(source)?;
        let policy = RetryPolicy::resolve(
            request.max_retries,
            request.retry_delay.as_deref(),
            &self.retry_defaults,
        )?;
        let context = self.context(
            &reference,
            &request.credentials,
            request.tls_verify,
            request.cert_dir.clone(),
        )
        .await?;

        let progress = Progress::new(request.progress.clone(), request.quiet);
        announce_tls(&reference, context.tls, &progress);
        info!("Pulling artifact");

        let (remote, attempts) = retry_transport(
            "pull",
            &reference,
            &policy,
            &request.cancel,
            &progress,
            || self.transport.fetch(&reference, &context),
        )
        .await?;

        let RemoteArtifact {
            digest,
            manifest,
            blobs,
        } = remote;
        let manifest = match verify_fetched(&reference, source, &digest, &manifest, &blobs) {
            Ok(manifest) => manifest,
            Err(err) => {
                error!(error = %err, "Pulled artifact failed verification");
                return Err(err);
            }
        };
        progress.line(&format!("Copying {} blobs from {reference}", blobs.len()));

        let open = self
            .crypto
            .decrypt_on_pull(manifest, blobs, request.decrypt.as_ref())?;
        let name = request.name.as_deref().unwrap_or(source);
        let artifact = store.import(name, open.manifest, open.payloads)?;

        progress.line(&format!("Writing manifest {}", artifact.digest()));
        info!(name, digest = %artifact.digest(), attempts, "Pull complete");
        Ok(PullOutcome { artifact, attempts })
    }

    async fn context(
        &self,
        reference: &Reference,
        credentials: &CredentialRequest,
        tls_verify: Option<bool>,
        cert_dir: Option<PathBuf>,
    ) -> Result<TransportContext, SyncError> {
        let auth = self
            .credentials
            .resolve(reference.registry.as_deref(), credentials)
            .await?;
        Ok(TransportContext {
            auth,
            tls: TlsPolicy::from_flag(tls_verify, self.tls_verify_default),
            cert_dir,
        })
    }
}

#[async_trait]
impl RemoteInspector for SyncEngine {
    type Error = SyncError;

    async fn inspect_remote(&self, reference: &str) -> Result<ArtifactDescriptor, SyncError> {
        let parsed = Reference::parse(reference)?;
        let policy = RetryPolicy::resolve(None, None, &self.retry_defaults)?;
        let context = self
            .context(&parsed, &self.inspect_credentials, None, None)
            .await?;

        let ((digest, bytes), _) = retry_transport(
            "inspect",
            &parsed,
            &policy,
            &CancellationToken::new(),
            &Progress::default(),
            || self.transport.fetch_manifest(&parsed, &context),
        )
        .await?;

        check_pinned(&parsed, reference, &digest)?;
        let manifest = Manifest::from_verified_bytes(&bytes, &digest)
            .map_err(|e| SyncError::from_remote(reference, e))?;
        let artifact = Artifact::from_manifest(reference, manifest)
            .map_err(|e| SyncError::from_remote(reference, e))?;
        debug!(reference, %digest, "Inspected remote artifact");
        Ok(ArtifactDescriptor { artifact, digest })
    }
}

fn announce_tls(reference: &Reference, tls: TlsPolicy, progress: &Progress) {
    if !tls.verifies() {
        warn!(%reference, "TLS verification disabled");
        progress.line(&format!("Skipping TLS verification for {reference}"));
    }
}

fn check_pinned(reference: &Reference, raw: &str, served: &Digest) -> Result<(), SyncError> {
    match &reference.digest {
        Some(pinned) if pinned != served => Err(SyncError::DigestMismatch {
            reference: raw.to_string(),
            expected: pinned.clone(),
            actual: served.clone(),
        }),
        _ => Ok(()),
    }
}

fn verify_fetched(
    reference: &Reference,
    raw: &str,
    digest: &Digest,
    manifest: &[u8],
    blobs: &[Vec<u8>],
) -> Result<Manifest, SyncError> {
    check_pinned(reference, raw, digest)?;
    let manifest =
        Manifest::from_verified_bytes(manifest, digest).map_err(|e| SyncError::from_remote(raw, e))?;
    if manifest.layers.len() != blobs.len() {
        return Err(SyncError::MalformedRemote {
            reference: raw.to_string(),
            reason: format!(
                "manifest lists {} layers, registry served {} blobs",
                manifest.layers.len(),
                blobs.len()
            ),
        });
    }
    for (layer, data) in manifest.layers.iter().zip(blobs) {
        if !layer.describes(data) {
            return Err(SyncError::DigestMismatch {
                reference: raw.to_string(),
                expected: layer.digest.clone(),
                actual: Digest::compute_with(layer.digest.algorithm(), data),
            });
        }
    }
    Ok(manifest)
}

/// Drive `call` through the attempt state machine
///
/// Returns the value and the attempt number that produced it.
async fn retry_transport<T, F, Fut>(
    operation: &'static str,
    reference: &Reference,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    progress: &Progress,
    mut call: F,
) -> Result<(T, u32), SyncError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, TransportError>>,
{
    let mut tracker = AttemptTracker::new(policy.max_retries);
    let cancelled = |attempt: u32| SyncError::Cancelled {
        reference: reference.to_string(),
        operation,
        attempt,
    };

    loop {
        if cancel.is_cancelled() {
            tracker.abort()?;
            warn!(%reference, operation, "Cancelled");
            return Err(cancelled(tracker.attempt() + 1));
        }

        let attempt = tracker.begin()?;
        let max_attempts = tracker.max_attempts();
        debug!(%reference, operation, attempt, max_attempts, "Attempt started");

        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            result = call() => Some(result),
        };
        let Some(result) = outcome else {
            tracker.fail(false)?;
            warn!(%reference, operation, attempt, "Cancelled in flight");
            return Err(cancelled(attempt));
        };

        let source = match result {
            Ok(value) => {
                tracker.succeed()?;
                return Ok((value, attempt));
            }
            Err(source) => source,
        };

        if tracker.fail(source.is_transient())? == AttemptState::RetryableFailure {
            let delay = policy.delay_for(attempt);
            warn!(
                %reference,
                operation,
                attempt,
                max_attempts,
                ?delay,
                error = %source,
                "Transient failure, retrying"
            );
            progress.line(&format!(
                "Retrying {operation} of {reference} in {delay:?} (attempt {attempt} of {max_attempts}): {source}"
            ));
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    tracker.abort()?;
                    warn!(%reference, operation, "Cancelled during retry delay");
                    return Err(cancelled(attempt + 1));
                }
                () = tokio::time::sleep(delay) => {}
            }
            continue;
        }

        error!(%reference, operation, attempt, max_attempts, error = %source, "Transport failed");
        return Err(SyncError::Transport {
            reference: reference.to_string(),
            operation,
            attempt,
            max_attempts,
            source,
        });
    }
}
