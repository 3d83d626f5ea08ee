//! In-memory local artifact store
//!
//! Artifacts are held as immutable snapshots (`Arc<Entry>`) in an
//! insertion-ordered map keyed by name. Readers clone the snapshot under a
//! short read lock and never observe a half-applied append. Appends are
//! optimistic: the new version is computed outside the lock and committed
//! only if the artifact digest is still the one the caller started from.

use crate::error::{InspectError, StoreError};
use crate::input::BlobInput;
use crate::selector::BlobSelector;
use arca_artifact::{Artifact, ArtifactDescriptor, Blob, BlobPayload, Digest, Manifest};
use async_trait::async_trait;
use dashmap::DashMap;
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Remote inspection seam, implemented by the sync engine
#[async_trait]
pub trait RemoteInspector: Send + Sync {
    /// Error type of the remote side
    type Error: std::error::Error + Send + Sync + 'static;

    /// Inspect an artifact in a remote registry
    async fn inspect_remote(&self, reference: &str) -> Result<ArtifactDescriptor, Self::Error>;
}

/// A blob descriptor with its stored payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedBlob {
    pub blob: Blob,
    pub data: Arc<[u8]>,
}

/// Immutable snapshot of one stored artifact
#[derive(Debug)]
struct Entry {
    artifact: Artifact,
    /// Parallel to `artifact.blobs()`
    payloads: Vec<Arc<[u8]>>,
}

impl Entry {
    fn extracted(&self, index: usize) -> ExtractedBlob {
        ExtractedBlob {
            blob: self.artifact.blobs()[index].clone(),
            data: Arc::clone(&self.payloads[index]),
        }
    }
}

/// Local artifact store
///
/// Owns every artifact record; callers only ever receive clones.
#[derive(Debug, Default)]
pub struct LocalStore {
    /// Name -> current snapshot, in insertion order
    entries: RwLock<IndexMap<String, Arc<Entry>>>,

    /// Reverse index: artifact digest -> names holding it
    by_digest: DashMap<Digest, Vec<String>>,
}

impl LocalStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new artifact under `name`
    ///
    /// # Errors
    /// - `StoreError::AlreadyExists` if `name` is taken
    /// - `StoreError::PayloadMismatch` if a descriptor does not match its bytes
    pub fn create<P: BlobInput>(
        &self,
        name: &str,
        payloads: Vec<P>,
        artifact_type: Option<String>,
        annotations: BTreeMap<String, String>,
    ) -> Result<Artifact, StoreError> {
        validate_name(name)?;
        let (blobs, data) = split_payloads(payloads)?;
        let artifact = Artifact::new(name, artifact_type, annotations, blobs)?;

        let mut entries = self.entries.write();
        if entries.contains_key(name) {
            return Err(StoreError::AlreadyExists {
                name: name.to_string(),
            });
        }
        self.index(&artifact);
        entries.insert(
            name.to_string(),
            Arc::new(Entry {
                artifact: artifact.clone(),
                payloads: data,
            }),
        );
        drop(entries);

        tracing::debug!(name, digest = %artifact.digest(), blobs = artifact.blobs().len(), "created artifact");
        Ok(artifact)
    }

    /// Append blobs to the current version of `name`
    ///
    /// # Errors
    /// - `StoreError::NotFound` if `name` is absent
    /// - `StoreError::ConcurrentModification` if another append committed first
    pub fn append<P: BlobInput>(
        &self,
        name: &str,
        payloads: Vec<P>,
        annotations: BTreeMap<String, String>,
    ) -> Result<Artifact, StoreError> {
        let current = self.entry(name)?;
        let expected = current.artifact.digest().clone();
        self.append_at(name, &expected, payloads, annotations)
    }

    /// Append blobs, committing only if `name` is still at `expected`
    ///
    /// Existing blobs keep their order; new blobs go at the end; annotations
    /// are merged with the new values overriding.
    ///
    /// # Errors
    /// - `StoreError::NotFound` if `name` is absent
    /// - `StoreError::ConcurrentModification` if the current digest differs
    pub fn append_at<P: BlobInput>(
        &self,
        name: &str,
        expected: &Digest,
        payloads: Vec<P>,
        annotations: BTreeMap<String, String>,
    ) -> Result<Artifact, StoreError> {
        let current = self.entry(name)?;
        check_version(name, expected, &current.artifact)?;

        let (blobs, data) = split_payloads(payloads)?;
        let next = current.artifact.appended(blobs, annotations)?;
        let mut next_payloads = current.payloads.clone();
        next_payloads.extend(data);

        let mut entries = self.entries.write();
        let slot = entries.get_mut(name).ok_or_else(|| StoreError::NotFound {
            reference: name.to_string(),
        })?;
        check_version(name, expected, &slot.artifact)?;

        self.unindex(&slot.artifact);
        self.index(&next);
        *slot = Arc::new(Entry {
            artifact: next.clone(),
            payloads: next_payloads,
        });
        drop(entries);

        tracing::debug!(name, from = %expected, to = %next.digest(), "appended to artifact");
        Ok(next)
    }

    /// Store a fetched artifact under `name`, replacing any previous version
    ///
    /// `payloads` must be parallel to `manifest.layers`.
    ///
    /// # Errors
    /// Returns `StoreError::PayloadMismatch` if a payload does not match its
    /// layer descriptor, `StoreError::PayloadCount` if the counts differ.
    pub fn import(
        &self,
        name: &str,
        manifest: Manifest,
        payloads: Vec<Vec<u8>>,
    ) -> Result<Artifact, StoreError> {
        validate_name(name)?;
        if payloads.len() != manifest.layers.len() {
            return Err(StoreError::PayloadCount {
                expected: manifest.layers.len(),
                actual: payloads.len(),
            });
        }
        let payloads = manifest
            .layers
            .iter()
            .cloned()
            .zip(payloads)
            .map(|(blob, data)| BlobPayload { blob, data })
            .collect::<Vec<_>>();
        let (_, data) = split_payloads(payloads)?;
        let artifact = Artifact::from_manifest(name, manifest)?;

        let mut entries = self.entries.write();
        if let Some(previous) = entries.get(name) {
            self.unindex(&previous.artifact);
        }
        self.index(&artifact);
        entries.insert(
            name.to_string(),
            Arc::new(Entry {
                artifact: artifact.clone(),
                payloads: data,
            }),
        );
        drop(entries);

        tracing::debug!(name, digest = %artifact.digest(), "imported artifact");
        Ok(artifact)
    }

    /// All artifacts in insertion order of their names
    #[must_use]
    pub fn list(&self) -> Vec<Artifact> {
        self.entries
            .read()
            .values()
            .map(|entry| entry.artifact.clone())
            .collect()
    }

    /// Look up an artifact by name or digest
    ///
    /// # Errors
    /// Returns `StoreError::NotFound` if nothing matches
    pub fn get(&self, reference: &str) -> Result<Artifact, StoreError> {
        Ok(self.resolve(reference)?.artifact.clone())
    }

    /// Check whether `name` is present
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.read().contains_key(name)
    }

    /// Number of stored artifacts
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the store is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Inspect locally, or through `remote` when given
    ///
    /// # Errors
    /// - `InspectError::Store` if the local lookup fails
    /// - `InspectError::Remote` with the remote side's error otherwise
    pub async fn inspect<R>(
        &self,
        reference: &str,
        remote: Option<&R>,
    ) -> Result<ArtifactDescriptor, InspectError<R::Error>>
    where
        R: RemoteInspector + ?Sized,
    {
        match remote {
            Some(remote) => remote
                .inspect_remote(reference)
                .await
                .map_err(InspectError::Remote),
            None => Ok(ArtifactDescriptor::from(self.get(reference)?)),
        }
    }

    /// Extract a single blob
    ///
    /// Without a selector the artifact must hold exactly one blob.
    ///
    /// # Errors
    /// - `StoreError::NotFound` if the artifact is absent
    /// - `StoreError::BlobNotFound` if no blob matches
    /// - `StoreError::AmbiguousSelector` if a title matches several blobs
    /// - `StoreError::SelectorRequired` if no selector was given and the
    ///   artifact does not hold exactly one blob
    pub fn extract(
        &self,
        reference: &str,
        selector: Option<&BlobSelector>,
    ) -> Result<ExtractedBlob, StoreError> {
        let entry = self.resolve(reference)?;
        let blobs = entry.artifact.blobs();

        let index = match selector {
            None => match blobs.len() {
                1 => 0,
                blob_count => {
                    return Err(StoreError::SelectorRequired {
                        reference: reference.to_string(),
                        blob_count,
                    })
                }
            },
            Some(selector @ BlobSelector::Digest(_)) => blobs
                .iter()
                .position(|blob| selector.matches(blob))
                .ok_or_else(|| StoreError::BlobNotFound {
                    reference: reference.to_string(),
                    selector: selector.to_string(),
                })?,
            Some(selector @ BlobSelector::Title(title)) => {
                let matches: Vec<usize> = blobs
                    .iter()
                    .enumerate()
                    .filter(|(_, blob)| selector.matches(blob))
                    .map(|(i, _)| i)
                    .collect();
                match matches.as_slice() {
                    [index] => *index,
                    [] => {
                        return Err(StoreError::BlobNotFound {
                            reference: reference.to_string(),
                            selector: selector.to_string(),
                        })
                    }
                    many => {
                        return Err(StoreError::AmbiguousSelector {
                            reference: reference.to_string(),
                            title: title.clone(),
                            count: many.len(),
                        })
                    }
                }
            }
        };

        Ok(entry.extracted(index))
    }

    /// Every blob of an artifact, in order
    ///
    /// # Errors
    /// Returns `StoreError::NotFound` if the artifact is absent
    pub fn extract_all(&self, reference: &str) -> Result<Vec<ExtractedBlob>, StoreError> {
        let entry = self.resolve(reference)?;
        Ok((0..entry.payloads.len())
            .map(|i| entry.extracted(i))
            .collect())
    }

    /// Artifact together with all its payloads, in blob order
    ///
    /// # Errors
    /// Returns `StoreError::NotFound` if the artifact is absent
    pub fn snapshot(&self, reference: &str) -> Result<(Artifact, Vec<Arc<[u8]>>), StoreError> {
        let entry = self.resolve(reference)?;
        Ok((entry.artifact.clone(), entry.payloads.clone()))
    }

    /// Remove one artifact by name or digest
    ///
    /// # Errors
    /// Returns `StoreError::NotFound` if nothing matches
    pub fn remove(&self, reference: &str) -> Result<Digest, StoreError> {
        let name = self.resolve_name(reference)?;

        let mut entries = self.entries.write();
        let entry = entries
            .shift_remove(&name)
            .ok_or_else(|| StoreError::NotFound {
                reference: reference.to_string(),
            })?;
        self.unindex(&entry.artifact);
        drop(entries);

        tracing::debug!(name, digest = %entry.artifact.digest(), "removed artifact");
        Ok(entry.artifact.digest().clone())
    }

    /// Remove every artifact, returning the removed digests in store order
    pub fn remove_all(&self) -> Vec<Digest> {
        let mut entries = self.entries.write();
        let removed: Vec<Digest> = entries
            .drain(..)
            .map(|(_, entry)| entry.artifact.digest().clone())
            .collect();
        self.by_digest.clear();
        drop(entries);

        tracing::debug!(count = removed.len(), "removed all artifacts");
        removed
    }

    fn entry(&self, name: &str) -> Result<Arc<Entry>, StoreError> {
        self.entries
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                reference: name.to_string(),
            })
    }

    fn resolve_name(&self, reference: &str) -> Result<String, StoreError> {
        if self.contains(reference) {
            return Ok(reference.to_string());
        }
        Digest::parse(reference)
            .ok()
            .and_then(|digest| {
                self.by_digest
                    .get(&digest)
                    .and_then(|names| names.first().cloned())
            })
            .ok_or_else(|| StoreError::NotFound {
                reference: reference.to_string(),
            })
    }

    fn resolve(&self, reference: &str) -> Result<Arc<Entry>, StoreError> {
        let name = self.resolve_name(reference)?;
        self.entry(&name).map_err(|_| StoreError::NotFound {
            reference: reference.to_string(),
        })
    }

    /// Caller must hold the entries write lock
    fn index(&self, artifact: &Artifact) {
        self.by_digest
            .entry(artifact.digest().clone())
            .or_default()
            .push(artifact.name().to_string());
    }

    /// Caller must hold the entries write lock
    fn unindex(&self, artifact: &Artifact) {
        let digest = artifact.digest();
        let now_empty = self.by_digest.get_mut(digest).is_some_and(|mut names| {
            names.retain(|n| n != artifact.name());
            names.is_empty()
        });
        if now_empty {
            self.by_digest.remove(digest);
        }
    }
}

fn validate_name(name: &str) -> Result<(), StoreError> {
    if name.trim().is_empty() {
        return Err(StoreError::InvalidName(name.to_string()));
    }
    Ok(())
}

fn check_version(name: &str, expected: &Digest, artifact: &Artifact) -> Result<(), StoreError> {
    if artifact.digest() == expected {
        Ok(())
    } else {
        Err(StoreError::ConcurrentModification {
            name: name.to_string(),
            expected: expected.clone(),
            actual: artifact.digest().clone(),
        })
    }
}

fn split_payloads<P: BlobInput>(
    payloads: Vec<P>,
) -> Result<(Vec<Blob>, Vec<Arc<[u8]>>), StoreError> {
    let mut blobs = Vec::with_capacity(payloads.len());
    let mut data = Vec::with_capacity(payloads.len());
    for payload in payloads {
        let (blob, bytes) = payload.into_described()?;
        blobs.push(blob);
        data.push(Arc::from(bytes));
    }
    Ok((blobs, data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::NewBlob;
    use pretty_assertions::assert_eq;

    fn payload(data: &str, title: &str) -> BlobPayload {
        BlobPayload::new("text/plain", data.as_bytes().to_vec()).with_title(title)
    }

    fn store_with(name: &str, blobs: Vec<BlobPayload>) -> LocalStore {
        let store = LocalStore::new();
        store.create(name, blobs, None, BTreeMap::new()).unwrap();
        store
    }

    #[test]
    fn create_then_list() {
        let store = LocalStore::new();
        store.create("b", vec![payload("1", "one")], None, BTreeMap::new()).unwrap();
        store.create("a", vec![payload("2", "two")], None, BTreeMap::new()).unwrap();

        let names: Vec<_> = store.list().iter().map(|a| a.name().to_string()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn create_existing_fails() {
        let store = store_with("a", vec![payload("1", "one")]);
        let err = store
            .create("a", vec![payload("2", "two")], None, BTreeMap::new())
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));
    }

    #[test]
    fn create_rejects_blank_name() {
        let store = LocalStore::new();
        let err = store
            .create("  ", Vec::<BlobPayload>::new(), None, BTreeMap::new())
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidName(_)));
    }

    #[test]
    fn create_rejects_inconsistent_payload() {
        let store = LocalStore::new();
        let mut bad = payload("1", "one");
        bad.data = b"2".to_vec();
        let err = store.create("a", vec![bad], None, BTreeMap::new()).unwrap_err();
        assert!(matches!(err, StoreError::PayloadMismatch { .. }));
        assert!(store.is_empty());
    }

    #[test]
    fn append_missing_fails() {
        let store = LocalStore::new();
        let err = store
            .append("nope", vec![payload("1", "one")], BTreeMap::new())
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn append_preserves_order_and_changes_digest() {
        let store = store_with("a", vec![payload("1", "one")]);
        let before = store.get("a").unwrap();
        let after = store
            .append("a", vec![payload("2", "two"), payload("3", "three")], BTreeMap::new())
            .unwrap();

        let titles: Vec<_> = after.blobs().iter().filter_map(Blob::title).collect();
        assert_eq!(titles, vec!["one", "two", "three"]);
        assert_ne!(before.digest(), after.digest());
        assert_eq!(store.get("a").unwrap(), after);
    }

    #[test]
    fn empty_append_is_noop_on_digest() {
        let store = store_with("a", vec![payload("1", "one")]);
        let first = store.append("a", vec![payload("2", "two")], BTreeMap::new()).unwrap();
        let second = store
            .append("a", Vec::<BlobPayload>::new(), BTreeMap::new())
            .unwrap();
        assert_eq!(first.digest(), second.digest());
    }

    #[test]
    fn stale_append_conflicts_then_succeeds_on_refresh() {
        let store = store_with("a", vec![payload("1", "one")]);
        let base = store.get("a").unwrap().digest().clone();

        store
            .append_at("a", &base, vec![payload("2", "two")], BTreeMap::new())
            .unwrap();
        let err = store
            .append_at("a", &base, vec![payload("3", "three")], BTreeMap::new())
            .unwrap_err();
        assert!(matches!(err, StoreError::ConcurrentModification { .. }));

        let refreshed = store.get("a").unwrap().digest().clone();
        let done = store
            .append_at("a", &refreshed, vec![payload("3", "three")], BTreeMap::new())
            .unwrap();
        assert_eq!(done.blobs().len(), 3);
    }

    #[test]
    fn concurrent_appends_never_lose_blobs() {
        let store = Arc::new(store_with("a", vec![payload("0", "b0")]));
        let handles: Vec<_> = (1..=8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || loop {
                    match store.append("a", vec![payload(&i.to_string(), &format!("b{i}"))], BTreeMap::new()) {
                        Ok(_) => break,
                        Err(StoreError::ConcurrentModification { .. }) => continue,
                        Err(e) => panic!("unexpected error: {e}"),
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let artifact = store.get("a").unwrap();
        assert_eq!(artifact.blobs().len(), 9);
        assert_eq!(artifact.blobs()[0].title(), Some("b0"));
        assert!(artifact.verify());
    }

    #[test]
    fn lookup_by_digest() {
        let store = store_with("a", vec![payload("1", "one")]);
        let digest = store.get("a").unwrap().digest().to_string();
        assert_eq!(store.get(&digest).unwrap().name(), "a");
        assert!(matches!(
            store.get("sha256:0000"),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn digest_index_follows_appends() {
        let store = store_with("a", vec![payload("1", "one")]);
        let old = store.get("a").unwrap().digest().to_string();
        let new = store.append("a", vec![payload("2", "two")], BTreeMap::new()).unwrap();
        assert!(store.get(&old).is_err());
        assert_eq!(store.get(&new.digest().to_string()).unwrap().name(), "a");
    }

    #[test]
    fn create_remove_list_is_empty() {
        let store = store_with("a", vec![payload("1", "one")]);
        let created = store.get("a").unwrap();
        let digest = store.remove("a").unwrap();
        assert_eq!(&digest, created.digest());
        assert!(store.list().is_empty());
        assert!(matches!(store.remove("a"), Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn remove_by_digest() {
        let store = store_with("a", vec![payload("1", "one")]);
        let digest = store.get("a").unwrap().digest().clone();
        assert_eq!(store.remove(&digest.to_string()).unwrap(), digest);
        assert!(!store.contains("a"));
    }

    #[test]
    fn remove_all_returns_digests() {
        let store = LocalStore::new();
        assert!(store.remove_all().is_empty());

        let a = store.create("a", vec![payload("1", "one")], None, BTreeMap::new()).unwrap();
        let b = store.create("b", vec![payload("2", "two")], None, BTreeMap::new()).unwrap();
        assert_eq!(store.remove_all(), vec![a.digest().clone(), b.digest().clone()]);
        assert!(store.is_empty());
        assert!(store.get(&a.digest().to_string()).is_err());
    }

    #[test]
    fn extract_single_blob_without_selector() {
        let store = store_with("a", vec![payload("only", "only.txt")]);
        let blob = store.extract("a", None).unwrap();
        assert_eq!(&*blob.data, b"only");
    }

    #[test]
    fn extract_requires_selector_for_many_blobs() {
        let store = store_with("a", vec![payload("1", "one"), payload("2", "two")]);
        assert!(matches!(
            store.extract("a", None),
            Err(StoreError::SelectorRequired { blob_count: 2, .. })
        ));
    }

    #[test]
    fn extract_without_selector_needs_exactly_one_blob() {
        let store = store_with("empty", Vec::new());
        assert!(matches!(
            store.extract("empty", None),
            Err(StoreError::SelectorRequired { blob_count: 0, .. })
        ));
    }

    #[test]
    fn create_describes_raw_blobs() {
        let store = LocalStore::new();
        let artifact = store
            .create(
                "raw",
                vec![NewBlob::new("text/plain", b"raw".to_vec()).with_title("r")],
                None,
                BTreeMap::new(),
            )
            .unwrap();
        assert_eq!(artifact.blobs()[0].digest, Digest::compute(b"raw"));
        let extracted = store.extract("raw", None).unwrap();
        assert_eq!(&*extracted.data, b"raw");
    }

    #[test]
    fn extract_by_title_and_digest() {
        let store = store_with("a", vec![payload("1", "one"), payload("2", "two")]);
        let by_title = store
            .extract("a", Some(&BlobSelector::Title("two".into())))
            .unwrap();
        assert_eq!(&*by_title.data, b"2");

        let by_digest = store
            .extract("a", Some(&BlobSelector::Digest(Digest::compute(b"1"))))
            .unwrap();
        assert_eq!(by_digest.blob.title(), Some("one"));
    }

    #[test]
    fn extract_no_match_and_ambiguous() {
        let store = store_with("a", vec![payload("1", "dup"), payload("2", "dup")]);
        assert!(matches!(
            store.extract("a", Some(&BlobSelector::Title("dup".into()))),
            Err(StoreError::AmbiguousSelector { count: 2, .. })
        ));
        assert!(matches!(
            store.extract("a", Some(&BlobSelector::Title("missing".into()))),
            Err(StoreError::BlobNotFound { .. })
        ));
        assert!(matches!(
            store.extract("a", Some(&BlobSelector::Digest(Digest::compute(b"3")))),
            Err(StoreError::BlobNotFound { .. })
        ));
    }

    #[test]
    fn extract_all_in_order() {
        let store = store_with("a", vec![payload("1", "one"), payload("2", "two")]);
        let all = store.extract_all("a").unwrap();
        let data: Vec<&[u8]> = all.iter().map(|b| &*b.data).collect();
        assert_eq!(data, vec![&b"1"[..], &b"2"[..]]);
    }

    #[test]
    fn import_replaces_in_place() {
        let store = store_with("a", vec![payload("1", "one")]);
        store.create("b", vec![payload("2", "two")], None, BTreeMap::new()).unwrap();

        let source = Artifact::new(
            "x",
            None,
            BTreeMap::new(),
            vec![Blob::from_bytes("text/plain", b"9").with_title("nine")],
        )
        .unwrap();
        let imported = store
            .import("a", source.manifest(), vec![b"9".to_vec()])
            .unwrap();

        assert_eq!(imported.digest(), source.digest());
        let names: Vec<_> = store.list().iter().map(|a| a.name().to_string()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn import_rejects_missing_payload() {
        let store = LocalStore::new();
        let source = Artifact::new(
            "x",
            None,
            BTreeMap::new(),
            vec![Blob::from_bytes("text/plain", b"9")],
        )
        .unwrap();
        let err = store.import("a", source.manifest(), vec![]).unwrap_err();
        assert!(matches!(err, StoreError::PayloadCount { expected: 1, actual: 0 }));
    }

    struct FixedRemote(ArtifactDescriptor);

    #[derive(Debug, thiserror::Error)]
    #[error("remote down")]
    struct RemoteDown;

    #[async_trait]
    impl RemoteInspector for FixedRemote {
        type Error = RemoteDown;

        async fn inspect_remote(&self, _reference: &str) -> Result<ArtifactDescriptor, RemoteDown> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn inspect_local_and_remote() {
        let store = store_with("a", vec![payload("1", "one")]);
        let local = store.inspect::<FixedRemote>("a", None).await.unwrap();
        assert_eq!(local.artifact.name(), "a");
        assert_eq!(&local.digest, local.artifact.digest());

        let remote_artifact = Artifact::new("remote", None, BTreeMap::new(), vec![]).unwrap();
        let remote = FixedRemote(ArtifactDescriptor::from(remote_artifact.clone()));
        let inspected = store.inspect("missing-locally", Some(&remote)).await.unwrap();
        assert_eq!(&inspected.digest, remote_artifact.digest());

        let err = store.inspect::<FixedRemote>("missing", None).await.unwrap_err();
        assert!(matches!(err, InspectError::Store(StoreError::NotFound { .. })));
    }
}
