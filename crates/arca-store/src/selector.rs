//! Blob selection for extraction

use arca_artifact::{Blob, Digest};
use std::fmt::{self, Display, Formatter};

/// Picks one blob out of an artifact
///
/// Title and digest selection are mutually exclusive by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlobSelector {
    /// Match the title annotation; must be unique within the artifact
    Title(String),
    /// Match the blob digest
    Digest(Digest),
}

impl BlobSelector {
    /// Check whether a blob matches
    #[inline]
    #[must_use]
    pub fn matches(&self, blob: &Blob) -> bool {
        match self {
            Self::Title(title) => blob.title() == Some(title.as_str()),
            Self::Digest(digest) => &blob.digest == digest,
        }
    }
}

impl Display for BlobSelector {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Title(title) => write!(f, "title {title:?}"),
            Self::Digest(digest) => write!(f, "digest {digest}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_and_digest_matching() {
        let blob = Blob::from_bytes("text/plain", b"abc").with_title("abc.txt");
        assert!(BlobSelector::Title("abc.txt".into()).matches(&blob));
        assert!(!BlobSelector::Title("other".into()).matches(&blob));
        assert!(BlobSelector::Digest(Digest::compute(b"abc")).matches(&blob));
        assert!(!BlobSelector::Digest(Digest::compute(b"abd")).matches(&blob));
    }

    #[test]
    fn untitled_blob_never_matches_title() {
        let blob = Blob::from_bytes("text/plain", b"abc");
        assert!(!BlobSelector::Title(String::new()).matches(&blob));
    }
}
