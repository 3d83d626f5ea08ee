//! Arca Local Store
//!
//! In-memory owner of artifact records keyed by name, with digest lookup,
//! blob extraction and optimistic (compare-and-swap) appends. Blobs come in
//! either pre-described ([`arca_artifact::BlobPayload`], verified) or as raw
//! bytes ([`NewBlob`], described here).
//!
//! # Example
//!
//! ```rust
//! use arca_artifact::BlobPayload;
//! use arca_store::{BlobSelector, LocalStore};
//! use std::collections::BTreeMap;
//!
//! let store = LocalStore::new();
//! let blob = BlobPayload::new("text/plain", b"hi".to_vec()).with_title("hi.txt");
//! store.create("notes", vec![blob], None, BTreeMap::new()).unwrap();
//!
//! let extracted = store
//!     .extract("notes", Some(&BlobSelector::Title("hi.txt".into())))
//!     .unwrap();
//! assert_eq!(&*extracted.data, b"hi");
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod error;
mod input;
mod selector;
mod store;

pub use error::{InspectError, StoreError};
pub use input::{BlobInput, NewBlob};
pub use selector::BlobSelector;
pub use store::{ExtractedBlob, LocalStore, RemoteInspector};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
