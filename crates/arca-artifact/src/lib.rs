//! Arca Artifact Model
//!
//! Content digests and the artifact/blob data model shared by every other
//! Arca crate.
//!
//! # Core Concepts
//!
//! - [`Digest`]: `algorithm:hex` content identity (SHA-256 by default)
//! - [`Blob`]: descriptor of one content-addressed payload
//! - [`Artifact`]: named, ordered collection of blobs plus annotations
//! - [`Manifest`]: serialized form of an artifact; its digest is the artifact digest
//! - [`Reference`]: `registry/repository[:tag][@digest]`
//!
//! # Example
//!
//! ```rust
//! use arca_artifact::{Artifact, Blob};
//! use std::collections::BTreeMap;
//!
//! let blob = Blob::from_bytes("text/plain", b"hello").with_title("hello.txt");
//! let artifact = Artifact::new("demo", None, BTreeMap::new(), vec![blob]).unwrap();
//! assert!(artifact.verify());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod artifact;
mod blob;
mod digest;
mod reference;

pub use artifact::{
    Artifact, ArtifactDescriptor, ArtifactError, Manifest, EMPTY_CONFIG_MEDIA_TYPE,
    MANIFEST_MEDIA_TYPE,
};
pub use blob::{Blob, BlobPayload, DEFAULT_BLOB_MEDIA_TYPE, TITLE_ANNOTATION};
pub use digest::{Algorithm, Digest, DigestError};
pub use reference::{Reference, ReferenceError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
