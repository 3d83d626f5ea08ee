//! Artifact references (`registry/repository[:tag][@digest]`)

use crate::digest::{Digest, DigestError};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Parsed artifact reference
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    /// Registry host, when the first path component looks like one
    pub registry: Option<String>,
    /// Repository path
    pub repository: String,
    /// Tag, if present
    pub tag: Option<String>,
    /// Pinned digest, if present
    pub digest: Option<Digest>,
}

impl Reference {
    /// Parse a reference string
    ///
    /// # Errors
    /// Returns error if the reference is empty, contains whitespace, has an
    /// empty repository or tag, or pins a malformed digest.
    pub fn parse(raw: &str) -> Result<Self, ReferenceError> {
        let invalid = |reason: &str| ReferenceError::Invalid {
            input: raw.to_string(),
            reason: reason.to_string(),
        };

        if raw.is_empty() {
            return Err(invalid("empty reference"));
        }
        if raw.chars().any(char::is_whitespace) {
            return Err(invalid("contains whitespace"));
        }

        let (rest, digest) = match raw.split_once('@') {
            Some((rest, digest)) => (rest, Some(Digest::parse(digest)?)),
            None => (raw, None),
        };

        let last_slash = rest.rfind('/');
        let (name, tag) = match rest.rfind(':') {
            Some(colon) if last_slash.map_or(true, |slash| colon > slash) => {
                let tag = &rest[colon + 1..];
                if tag.is_empty() {
                    return Err(invalid("empty tag"));
                }
                (&rest[..colon], Some(tag.to_string()))
            }
            _ => (rest, None),
        };

        let (registry, repository) = match name.split_once('/') {
            Some((first, remainder))
                if first.contains('.') || first.contains(':') || first == "localhost" =>
            {
                (Some(first.to_string()), remainder)
            }
            _ => (None, name),
        };

        if repository.is_empty() || repository.split('/').any(str::is_empty) {
            return Err(invalid("empty repository path component"));
        }

        Ok(Self {
            registry,
            repository: repository.to_string(),
            tag,
            digest,
        })
    }
}

impl Display for Reference {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if let Some(registry) = &self.registry {
            write!(f, "{registry}/")?;
        }
        f.write_str(&self.repository)?;
        if let Some(tag) = &self.tag {
            write!(f, ":{tag}")?;
        }
        if let Some(digest) = &self.digest {
            write!(f, "@{digest}")?;
        }
        Ok(())
    }
}

impl FromStr for Reference {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Reference parsing errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReferenceError {
    /// Structurally invalid reference
    #[error("invalid reference {input:?}: {reason}")]
    Invalid { input: String, reason: String },

    /// Pinned digest is malformed
    #[error(transparent)]
    Digest(#[from] DigestError),
}
