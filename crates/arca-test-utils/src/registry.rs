use arca_artifact::{Digest, Reference};
use arca_sync::{
    RegistryTransport, RemoteArtifact, TransportContext, TransportError, UploadBundle,
    DEFAULT_REGISTRY,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory registry keyed by `registry/repository:tag`
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    artifacts: Mutex<HashMap<String, RemoteArtifact>>,
    fetches: AtomicUsize,
    uploads: AtomicUsize,
    contexts: Mutex<Vec<TransportContext>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total transport calls (fetch + upload)
    pub fn calls(&self) -> usize {
        self.fetches() + self.uploads()
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn uploads(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    /// Connection settings of every call, in order
    pub fn contexts(&self) -> Vec<TransportContext> {
        self.contexts.lock().clone()
    }

    /// Stored artifact for `reference`
    pub fn get(&self, reference: &str) -> Option<RemoteArtifact> {
        let reference = Reference::parse(reference).ok()?;
        self.artifacts.lock().get(&key(&reference)).cloned()
    }

    /// Store raw content, bypassing upload
    pub fn insert(&self, reference: &str, artifact: RemoteArtifact) {
        let reference = Reference::parse(reference).unwrap();
        self.artifacts.lock().insert(key(&reference), artifact);
    }

    /// Replace the bytes of one stored blob
    pub fn tamper_blob(&self, reference: &str, index: usize, data: &[u8]) {
        let reference = Reference::parse(reference).unwrap();
        let mut artifacts = self.artifacts.lock();
        let artifact = artifacts.get_mut(&key(&reference)).unwrap();
        artifact.blobs[index] = data.to_vec();
    }

    fn record(&self, counter: &AtomicUsize, context: &TransportContext) {
        counter.fetch_add(1, Ordering::SeqCst);
        self.contexts.lock().push(context.clone());
    }
}

fn key(reference: &Reference) -> String {
    format!(
        "{}/{}:{}",
        reference.registry.as_deref().unwrap_or(DEFAULT_REGISTRY),
        reference.repository,
        reference.tag.as_deref().unwrap_or("latest")
    )
}

#[async_trait]
impl RegistryTransport for MemoryRegistry {
    async fn fetch(
        &self,
        reference: &Reference,
        context: &TransportContext,
    ) -> Result<RemoteArtifact, TransportError> {
        self.record(&self.fetches, context);
        let artifacts = self.artifacts.lock();
        let found = match (&reference.tag, &reference.digest) {
            (None, Some(digest)) => artifacts.values().find(|a| &a.digest == digest),
            _ => artifacts.get(&key(reference)),
        };
        found
            .cloned()
            .ok_or_else(|| TransportError::NotFound(reference.to_string()))
    }

    async fn upload(
        &self,
        reference: &Reference,
        bundle: &UploadBundle,
        context: &TransportContext,
    ) -> Result<Digest, TransportError> {
        self.record(&self.uploads, context);
        let digest = Digest::compute(&bundle.manifest);
        self.artifacts.lock().insert(
            key(reference),
            RemoteArtifact {
                digest: digest.clone(),
                manifest: bundle.manifest.clone(),
                blobs: bundle.blobs.iter().map(|b| b.to_vec()).collect(),
            },
        );
        Ok(digest)
    }
}

/// Fails with a scripted sequence of errors, then delegates
#[derive(Debug)]
pub struct ScriptedTransport<T> {
    inner: T,
    script: Mutex<VecDeque<TransportError>>,
    attempts: AtomicUsize,
}

impl<T> ScriptedTransport<T> {
    pub fn new(inner: T, failures: impl IntoIterator<Item = TransportError>) -> Self {
        Self {
            inner,
            script: Mutex::new(failures.into_iter().collect()),
            attempts: AtomicUsize::new(0),
        }
    }

    /// Fails with `error` forever
    pub fn always(inner: T, error: TransportError) -> Self {
        Self::new(inner, std::iter::repeat(error).take(1024))
    }

    /// Every call, failed or delegated
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Failures not yet served
    pub fn remaining(&self) -> usize {
        self.script.lock().len()
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    fn next_failure(&self) -> Option<TransportError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        self.script.lock().pop_front()
    }
}

#[async_trait]
impl<T: RegistryTransport> RegistryTransport for ScriptedTransport<T> {
    async fn fetch(
        &self,
        reference: &Reference,
        context: &TransportContext,
    ) -> Result<RemoteArtifact, TransportError> {
        if let Some(error) = self.next_failure() {
            return Err(error);
        }
        self.inner.fetch(reference, context).await
    }

    async fn upload(
        &self,
        reference: &Reference,
        bundle: &UploadBundle,
        context: &TransportContext,
    ) -> Result<Digest, TransportError> {
        if let Some(error) = self.next_failure() {
            return Err(error);
        }
        self.inner.upload(reference, bundle, context).await
    }
}
