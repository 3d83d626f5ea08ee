//! Artifact facade
//!
//! Public entry point: validates option combinations, then delegates to the
//! local store or the sync engine. Errors from those components are passed
//! through unchanged.

use crate::config::ArcaConfig;
use crate::error::ArcaError;
use crate::options::{
    ArtifactAddOptions, ArtifactExtractOptions, ArtifactInspectOptions, ArtifactListOptions,
    ArtifactPullOptions, ArtifactPushOptions, ArtifactRemoveOptions,
};
use crate::reports::{
    ArtifactAddReport, ArtifactInspectReport, ArtifactListReport, ArtifactPullReport,
    ArtifactPushReport, ArtifactRemoveReport,
};
use arca_artifact::{Artifact, Blob};
use arca_store::{ExtractedBlob, InspectError, LocalStore, NewBlob, StoreError};
use arca_sync::{PullRequest, PushRequest, SyncEngine};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Artifact operations over one store and one sync engine
#[derive(Debug)]
pub struct ArtifactFacade {
    store: Arc<LocalStore>,
    engine: SyncEngine,
    config: ArcaConfig,
}

impl ArtifactFacade {
    /// Facade over a fresh store
    ///
    /// Retry and TLS defaults of `config` are applied to `engine`.
    #[must_use]
    pub fn new(engine: SyncEngine, config: ArcaConfig) -> Self {
        Self::with_store(Arc::new(LocalStore::new()), engine, config)
    }

    /// Facade over an existing store
    #[must_use]
    pub fn with_store(store: Arc<LocalStore>, engine: SyncEngine, config: ArcaConfig) -> Self {
        let engine = engine
            .with_retry_defaults(config.retry_defaults())
            .with_tls_verify_default(config.default_tls_verify);
        Self {
            store,
            engine,
            config,
        }
    }

    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<LocalStore> {
        &self.store
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &ArcaConfig {
        &self.config
    }

    /// Add files as blobs of artifact `name`
    ///
    /// Each file becomes one blob titled with its base name. With `append`,
    /// blobs go to the end of the existing artifact (created if absent).
    ///
    /// # Errors
    /// - `Validation` for an empty file list, duplicate titles, or `append`
    ///   combined with an artifact type
    /// - `Io` if a file cannot be read
    /// - store errors (`AlreadyExists` without `append`)
    #[tracing::instrument(skip(self, files, options), fields(files = files.len()))]
    pub async fn add(
        &self,
        name: &str,
        files: &[PathBuf],
        options: &ArtifactAddOptions,
    ) -> Result<ArtifactAddReport, ArcaError> {
        if files.is_empty() {
            return Err(ArcaError::validation("at least one file is required"));
        }
        if options.append && options.artifact_type.is_some() {
            return Err(ArcaError::validation(
                "artifact type cannot be set when appending",
            ));
        }

        let mut seen = HashSet::new();
        let mut titled = Vec::with_capacity(files.len());
        for path in files {
            let title = path
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| {
                    ArcaError::validation(format!("{} has no usable file name", path.display()))
                })?;
            if !seen.insert(title) {
                return Err(ArcaError::validation(format!(
                    "duplicate blob title {title:?}"
                )));
            }
            titled.push((path, title));
        }

        let media_type = options
            .file_type
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(&self.config.default_media_type);
        let mut payloads = Vec::with_capacity(titled.len());
        for (path, title) in titled {
            let data = tokio::fs::read(path)
                .await
                .map_err(|e| ArcaError::io(path, e))?;
            debug!(path = %path.display(), size = data.len(), "Read file");
            payloads.push(NewBlob::new(media_type, data).with_title(title));
        }

        let artifact = if options.append {
            self.append_or_create(name, payloads, options)?
        } else {
            self.store.create(
                name,
                payloads,
                options.artifact_type.clone(),
                options.annotations.clone(),
            )?
        };

        info!(digest = %artifact.digest(), blobs = artifact.blobs().len(), "Added artifact");
        Ok(ArtifactAddReport {
            artifact_digest: artifact.digest().clone(),
        })
    }

    fn append_or_create(
        &self,
        name: &str,
        payloads: Vec<NewBlob>,
        options: &ArtifactAddOptions,
    ) -> Result<Artifact, ArcaError> {
        match self
            .store
            .append(name, payloads.clone(), options.annotations.clone())
        {
            Err(StoreError::NotFound { .. }) => {
                debug!(name, "Nothing to append to, creating");
                Ok(self
                    .store
                    .create(name, payloads, None, options.annotations.clone())?)
            }
            other => Ok(other?),
        }
    }

    /// Push artifact `name` to `destination`
    ///
    /// # Errors
    /// Validation errors before any network activity, then sync errors
    #[tracing::instrument(skip(self, options))]
    pub async fn push(
        &self,
        name: &str,
        destination: &str,
        options: &ArtifactPushOptions,
    ) -> Result<ArtifactPushReport, ArcaError> {
        let request = PushRequest {
            credentials: options.credentials(),
            tls_verify: options.tls_verify,
            cert_dir: options.cert_dir.clone(),
            digest_file: options.digest_file.clone(),
            encrypt_layers: options.encrypt_layers.clone(),
            encryption_keys: options.encryption_keys.clone(),
            signing: options.signing(),
            max_retries: options.max_retries,
            retry_delay: options.retry_delay.clone(),
            quiet: options.quiet,
            progress: options.writer.clone(),
            cancel: options.cancel.clone(),
        };
        let outcome = self
            .engine
            .push(&self.store, name, destination, &request)
            .await?;
        info!(digest = %outcome.digest, attempts = outcome.attempts, "Pushed artifact");
        Ok(ArtifactPushReport {})
    }

    /// Pull `reference` into the store, named after the reference
    ///
    /// # Errors
    /// Validation errors before any network activity, then sync errors
    #[tracing::instrument(skip(self, options))]
    pub async fn pull(
        &self,
        reference: &str,
        options: &ArtifactPullOptions,
    ) -> Result<ArtifactPullReport, ArcaError> {
        let request = PullRequest {
            credentials: options.credentials(),
            tls_verify: options.tls_verify,
            cert_dir: options.cert_dir.clone(),
            decrypt: options.decrypt_config.clone(),
            name: None,
            max_retries: options.max_retries,
            retry_delay: options.retry_delay.clone(),
            quiet: options.quiet,
            progress: options.writer.clone(),
            cancel: options.cancel.clone(),
        };
        let outcome = self.engine.pull(&self.store, reference, &request).await?;
        info!(digest = %outcome.artifact.digest(), attempts = outcome.attempts, "Pulled artifact");
        Ok(ArtifactPullReport {})
    }

    /// Every stored artifact, in insertion order
    #[must_use]
    pub fn list(&self, _options: &ArtifactListOptions) -> Vec<ArtifactListReport> {
        self.store
            .list()
            .into_iter()
            .map(|artifact| ArtifactListReport { artifact })
            .collect()
    }

    /// Inspect a local artifact, or its registry copy with `remote`
    ///
    /// # Errors
    /// Store errors locally, sync errors remotely
    #[tracing::instrument(skip(self))]
    pub async fn inspect(
        &self,
        reference: &str,
        options: &ArtifactInspectOptions,
    ) -> Result<ArtifactInspectReport, ArcaError> {
        let remote = options.remote.then_some(&self.engine);
        let descriptor = self
            .store
            .inspect(reference, remote)
            .await
            .map_err(|err| match err {
                InspectError::Store(err) => ArcaError::Store(err),
                InspectError::Remote(err) => ArcaError::Sync(err),
            })?;
        Ok(descriptor.into())
    }

    /// Bytes of one blob
    ///
    /// # Errors
    /// - `Validation` if both title and digest are set
    /// - `MalformedDigest` for a bad digest selector
    /// - store selection errors
    pub fn extract(
        &self,
        reference: &str,
        options: &ArtifactExtractOptions,
    ) -> Result<ExtractedBlob, ArcaError> {
        let selector = options.selector()?;
        Ok(self.store.extract(reference, selector.as_ref())?)
    }

    /// Write blobs to disk
    ///
    /// If `target` is an existing directory, each selected blob (every blob
    /// without a selector) is written under its title, or its digest hex when
    /// untitled. Otherwise the single selected blob is written to `target`.
    /// Returns the written paths.
    ///
    /// # Errors
    /// As [`Self::extract`], plus `Validation` for titles that are not plain
    /// file names and `Io` for write failures
    #[tracing::instrument(skip(self, target, options), fields(target = %target.display()))]
    pub async fn extract_to(
        &self,
        reference: &str,
        target: &Path,
        options: &ArtifactExtractOptions,
    ) -> Result<Vec<PathBuf>, ArcaError> {
        let selector = options.selector()?;
        let is_dir = tokio::fs::metadata(target)
            .await
            .is_ok_and(|meta| meta.is_dir());

        if !is_dir {
            let blob = self.store.extract(reference, selector.as_ref())?;
            write_blob(target, &blob).await?;
            return Ok(vec![target.to_path_buf()]);
        }

        let blobs = match &selector {
            Some(selector) => vec![self.store.extract(reference, Some(selector))?],
            None => self.store.extract_all(reference)?,
        };
        let mut names = HashSet::new();
        let mut paths = Vec::with_capacity(blobs.len());
        for blob in &blobs {
            let name = file_name_for(&blob.blob)?;
            if !names.insert(name.clone()) {
                return Err(ArcaError::validation(format!(
                    "several blobs would be written to {name:?}"
                )));
            }
            paths.push(target.join(name));
        }

        for (path, blob) in paths.iter().zip(&blobs) {
            write_blob(path, blob).await?;
        }
        info!(count = paths.len(), "Extracted blobs");
        Ok(paths)
    }

    /// Remove artifacts by name or digest, or all of them
    ///
    /// Every reference is resolved before anything is removed.
    ///
    /// # Errors
    /// - `Validation` for `all` with references, or neither
    /// - `NotFound` if a reference matches nothing
    #[tracing::instrument(skip(self))]
    pub fn remove(
        &self,
        references: &[String],
        options: &ArtifactRemoveOptions,
    ) -> Result<ArtifactRemoveReport, ArcaError> {
        let artifact_digests = match (options.all, references.is_empty()) {
            (true, false) => {
                return Err(ArcaError::validation(
                    "removing all artifacts excludes naming artifacts",
                ))
            }
            (false, true) => return Err(ArcaError::validation("no artifact to remove")),
            (true, true) => self.store.remove_all(),
            (false, false) => {
                let mut names: Vec<String> = Vec::with_capacity(references.len());
                for reference in references {
                    let name = self.store.get(reference)?.name().to_string();
                    if !names.contains(&name) {
                        names.push(name);
                    }
                }
                names
                    .iter()
                    .map(|name| self.store.remove(name))
                    .collect::<Result<Vec<_>, _>>()?
            }
        };
        info!(count = artifact_digests.len(), "Removed artifacts");
        Ok(ArtifactRemoveReport { artifact_digests })
    }
}

fn file_name_for(blob: &Blob) -> Result<String, ArcaError> {
    match blob.title() {
        None => Ok(blob.digest.hex().to_string()),
        Some(title)
            if title.is_empty()
                || title == "."
                || title == ".."
                || title.contains(['/', '\\']) =>
        {
            Err(ArcaError::validation(format!(
                "blob title {title:?} is not a plain file name"
            )))
        }
        Some(title) => Ok(title.to_string()),
    }
}

async fn write_blob(path: &Path, blob: &ExtractedBlob) -> Result<(), ArcaError> {
    tokio::fs::write(path, &*blob.data)
        .await
        .map_err(|e| ArcaError::io(path, e))?;
    debug!(path = %path.display(), digest = %blob.blob.digest, "Wrote blob");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arca_artifact::Digest;

    fn blob(title: Option<&str>) -> Blob {
        let blob = Blob::from_bytes("text/plain", b"x");
        match title {
            Some(title) => blob.with_title(title),
            None => blob,
        }
    }

    #[test]
    fn file_names_for_blobs() {
        assert_eq!(file_name_for(&blob(Some("a.txt"))).unwrap(), "a.txt");
        assert_eq!(
            file_name_for(&blob(None)).unwrap(),
            Digest::compute(b"x").hex()
        );
        for bad in ["", ".", "..", "../etc/passwd", "dir/file", "c:\\x"] {
            assert!(file_name_for(&blob(Some(bad))).is_err(), "{bad:?}");
        }
    }
}
