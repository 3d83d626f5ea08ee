//! Typed results of facade operations

use arca_artifact::{Artifact, ArtifactDescriptor, Digest};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactAddReport {
    pub artifact_digest: Digest,
}

/// Push succeeded; the pushed digest goes to the digest file when requested
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ArtifactPushReport {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ArtifactPullReport {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactInspectReport {
    pub artifact: Artifact,
    pub digest: Digest,
}

impl From<ArtifactDescriptor> for ArtifactInspectReport {
    fn from(descriptor: ArtifactDescriptor) -> Self {
        Self {
            artifact: descriptor.artifact,
            digest: descriptor.digest,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactListReport {
    pub artifact: Artifact,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactRemoveReport {
    /// Every digest actually removed
    pub artifact_digests: Vec<Digest>,
}
