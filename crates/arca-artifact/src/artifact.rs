//! Artifact and manifest model
//!
//! An [`Artifact`] is a named, ordered collection of blobs plus annotations.
//! Its digest is the digest of its serialized [`Manifest`], so it depends only
//! on the blob descriptors (in order), the annotations and the artifact type.
//! The name is a store-local label and never contributes to the digest.

use crate::blob::Blob;
use crate::digest::Digest;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Media type of the manifest document
pub const MANIFEST_MEDIA_TYPE: &str = "application/vnd.oci.image.manifest.v1+json";

/// Media type of the empty config descriptor
pub const EMPTY_CONFIG_MEDIA_TYPE: &str = "application/vnd.oci.empty.v1+json";

/// Serialized form of an artifact, as stored and transmitted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub schema_version: u32,
    pub media_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_type: Option<String>,
    /// Always the empty config descriptor (`{}`)
    pub config: Blob,
    pub layers: Vec<Blob>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl Manifest {
    /// Build a manifest with the empty config descriptor
    #[must_use]
    pub fn new(
        artifact_type: Option<String>,
        layers: Vec<Blob>,
        annotations: BTreeMap<String, String>,
    ) -> Self {
        Self {
            schema_version: 2,
            media_type: MANIFEST_MEDIA_TYPE.to_string(),
            artifact_type,
            config: Blob::from_bytes(EMPTY_CONFIG_MEDIA_TYPE, b"{}"),
            layers,
            annotations,
        }
    }

    /// Canonical JSON bytes
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_bytes(&self) -> Result<Vec<u8>, ArtifactError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parse manifest bytes
    ///
    /// # Errors
    /// Returns error if the bytes are not a manifest document
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ArtifactError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Parse manifest bytes that must hash to `expected`
    ///
    /// # Errors
    /// Returns [`ArtifactError::DigestMismatch`] if the bytes do not hash to
    /// `expected`, or a serialization error if they are not a manifest.
    pub fn from_verified_bytes(bytes: &[u8], expected: &Digest) -> Result<Self, ArtifactError> {
        if !expected.matches(bytes) {
            return Err(ArtifactError::DigestMismatch {
                expected: expected.clone(),
                actual: Digest::compute_with(expected.algorithm(), bytes),
            });
        }
        Self::from_bytes(bytes)
    }

    /// Digest of the canonical JSON bytes
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn digest(&self) -> Result<Digest, ArtifactError> {
        Ok(Digest::compute(&self.to_bytes()?))
    }
}

/// Errors related to artifact construction
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    /// Manifest (de)serialization error
    #[error("manifest serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Manifest bytes do not hash to the expected digest
    #[error("manifest digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: Digest, actual: Digest },
}

/// Named, content-addressed collection of blobs
///
/// # Invariants
/// - `digest` is always the digest of `self.manifest()`
/// - Blob order is append order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    name: String,
    digest: Digest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    artifact_type: Option<String>,
    #[serde(default)]
    annotations: BTreeMap<String, String>,
    blobs: Vec<Blob>,
}

impl Artifact {
    /// Create a new artifact (computes the digest)
    ///
    /// # Errors
    /// Returns error if the manifest cannot be serialized
    pub fn new(
        name: impl Into<String>,
        artifact_type: Option<String>,
        annotations: BTreeMap<String, String>,
        blobs: Vec<Blob>,
    ) -> Result<Self, ArtifactError> {
        let manifest = Manifest::new(artifact_type, blobs, annotations);
        Self::from_manifest(name, manifest)
    }

    /// Rebuild an artifact from its manifest
    ///
    /// # Errors
    /// Returns error if the manifest cannot be serialized
    pub fn from_manifest(name: impl Into<String>, manifest: Manifest) -> Result<Self, ArtifactError> {
        let digest = manifest.digest()?;
        Ok(Self {
            name: name.into(),
            digest,
            artifact_type: manifest.artifact_type,
            annotations: manifest.annotations,
            blobs: manifest.layers,
        })
    }

    /// Manifest for this artifact
    #[must_use]
    pub fn manifest(&self) -> Manifest {
        Manifest::new(
            self.artifact_type.clone(),
            self.blobs.clone(),
            self.annotations.clone(),
        )
    }

    /// New version with `blobs` appended and `annotations` merged in
    ///
    /// Existing blob order is kept; annotation keys present in both take the
    /// new value.
    ///
    /// # Errors
    /// Returns error if the manifest cannot be serialized
    pub fn appended(
        &self,
        blobs: impl IntoIterator<Item = Blob>,
        annotations: BTreeMap<String, String>,
    ) -> Result<Self, ArtifactError> {
        let mut next_blobs = self.blobs.clone();
        next_blobs.extend(blobs);
        let mut next_annotations = self.annotations.clone();
        next_annotations.extend(annotations);
        Self::new(
            self.name.clone(),
            self.artifact_type.clone(),
            next_annotations,
            next_blobs,
        )
    }

    /// Same content under a different name
    #[must_use]
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Store-local name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Manifest digest
    #[inline]
    #[must_use]
    pub fn digest(&self) -> &Digest {
        &self.digest
    }

    /// Artifact media type
    #[inline]
    #[must_use]
    pub fn artifact_type(&self) -> Option<&str> {
        self.artifact_type.as_deref()
    }

    /// Manifest annotations
    #[inline]
    #[must_use]
    pub fn annotations(&self) -> &BTreeMap<String, String> {
        &self.annotations
    }

    /// Blobs in append order
    #[inline]
    #[must_use]
    pub fn blobs(&self) -> &[Blob] {
        &self.blobs
    }

    /// Total payload size
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.blobs.iter().map(|b| b.size).sum()
    }

    /// Verify integrity (useful after deserialization)
    #[must_use]
    pub fn verify(&self) -> bool {
        self.manifest()
            .digest()
            .is_ok_and(|digest| digest == self.digest)
    }
}

/// Inspection result: artifact metadata together with its digest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactDescriptor {
    pub artifact: Artifact,
    pub digest: Digest,
}

impl From<Artifact> for ArtifactDescriptor {
    fn from(artifact: Artifact) -> Self {
        let digest = artifact.digest().clone();
        Self { artifact, digest }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::{Blob, TITLE_ANNOTATION};
    use pretty_assertions::assert_eq;

    fn blob(data: &[u8], title: &str) -> Blob {
        Blob::from_bytes("text/plain", data).with_title(title)
    }

    fn annotations(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn digest_matches_manifest() {
        let a = Artifact::new("a", None, BTreeMap::new(), vec![blob(b"1", "one")]).unwrap();
        assert_eq!(a.digest(), &a.manifest().digest().unwrap());
        assert!(a.verify());
    }

    #[test]
    fn name_does_not_affect_digest() {
        let a = Artifact::new("a", None, BTreeMap::new(), vec![blob(b"1", "one")]).unwrap();
        let b = a.clone().renamed("b");
        assert_eq!(a.digest(), b.digest());
        assert_eq!(b.name(), "b");
    }

    #[test]
    fn blob_order_affects_digest() {
        let ab = Artifact::new("x", None, BTreeMap::new(), vec![blob(b"a", "a"), blob(b"b", "b")])
            .unwrap();
        let ba = Artifact::new("x", None, BTreeMap::new(), vec![blob(b"b", "b"), blob(b"a", "a")])
            .unwrap();
        assert_ne!(ab.digest(), ba.digest());
    }

    #[test]
    fn annotation_insertion_order_is_irrelevant() {
        let mut first = BTreeMap::new();
        first.insert("k1".to_string(), "v1".to_string());
        first.insert("k2".to_string(), "v2".to_string());
        let mut second = BTreeMap::new();
        second.insert("k2".to_string(), "v2".to_string());
        second.insert("k1".to_string(), "v1".to_string());

        let a = Artifact::new("x", None, first, vec![]).unwrap();
        let b = Artifact::new("x", None, second, vec![]).unwrap();
        assert_eq!(a.digest(), b.digest());
    }

    #[test]
    fn appended_keeps_order_and_merges_annotations() {
        let base = Artifact::new(
            "x",
            Some("application/vnd.test".to_string()),
            annotations(&[("keep", "1"), ("override", "old")]),
            vec![blob(b"a", "a")],
        )
        .unwrap();

        let next = base
            .appended(
                vec![blob(b"b", "b")],
                annotations(&[("override", "new"), ("added", "2")]),
            )
            .unwrap();

        let titles: Vec<_> = next.blobs().iter().filter_map(Blob::title).collect();
        assert_eq!(titles, vec!["a", "b"]);
        assert_eq!(
            next.annotations(),
            &annotations(&[("added", "2"), ("keep", "1"), ("override", "new")])
        );
        assert_eq!(next.artifact_type(), Some("application/vnd.test"));
        assert_ne!(next.digest(), base.digest());
    }

    #[test]
    fn empty_append_keeps_digest() {
        let base = Artifact::new("x", None, BTreeMap::new(), vec![blob(b"a", "a")]).unwrap();
        let same = base.appended(Vec::new(), BTreeMap::new()).unwrap();
        assert_eq!(base.digest(), same.digest());
    }

    #[test]
    fn manifest_round_trip_preserves_digest() {
        let a = Artifact::new(
            "x",
            Some("application/vnd.test".to_string()),
            annotations(&[("k", "v")]),
            vec![blob(b"a", "a"), blob(b"b", "b")],
        )
        .unwrap();
        let bytes = a.manifest().to_bytes().unwrap();
        let parsed = Manifest::from_bytes(&bytes).unwrap();
        let rebuilt = Artifact::from_manifest("y", parsed).unwrap();
        assert_eq!(rebuilt.digest(), a.digest());
        assert_eq!(rebuilt.blobs(), a.blobs());
    }

    #[test]
    fn verified_bytes_reject_wrong_digest() {
        let a = Artifact::new("x", None, BTreeMap::new(), vec![blob(b"a", "a")]).unwrap();
        let bytes = a.manifest().to_bytes().unwrap();
        assert!(Manifest::from_verified_bytes(&bytes, a.digest()).is_ok());

        let wrong = Digest::compute(b"something else");
        let err = Manifest::from_verified_bytes(&bytes, &wrong).unwrap_err();
        assert!(matches!(err, ArtifactError::DigestMismatch { .. }));
    }

    #[test]
    fn manifest_json_shape() {
        let a = Artifact::new("x", None, BTreeMap::new(), vec![blob(b"a", "a.txt")]).unwrap();
        let json = serde_json::to_value(a.manifest()).unwrap();
        assert_eq!(json["schemaVersion"], 2);
        assert_eq!(json["mediaType"], MANIFEST_MEDIA_TYPE);
        assert_eq!(json["config"]["mediaType"], EMPTY_CONFIG_MEDIA_TYPE);
        assert_eq!(json["config"]["size"], 2);
        assert_eq!(json["layers"][0]["annotations"][TITLE_ANNOTATION], "a.txt");
        assert!(json.get("artifactType").is_none());
    }

    #[test]
    fn tampered_artifact_fails_verify() {
        let a = Artifact::new("x", None, BTreeMap::new(), vec![blob(b"a", "a")]).unwrap();
        let mut json = serde_json::to_value(&a).unwrap();
        json["blobs"][0]["size"] = serde_json::json!(999);
        let tampered: Artifact = serde_json::from_value(json).unwrap();
        assert!(!tampered.verify());
    }

    #[test]
    fn descriptor_carries_digest() {
        let a = Artifact::new("x", None, BTreeMap::new(), vec![]).unwrap();
        let descriptor = ArtifactDescriptor::from(a.clone());
        assert_eq!(&descriptor.digest, a.digest());
    }
}
