//! Testing utilities for Arca workspace
//!
//! Shared transports, a toy cipher and fixtures.

#![allow(missing_docs)]

mod cipher;
mod registry;

pub use cipher::{ToyCipher, TOY_KEY_ANNOTATION};
pub use registry::{MemoryRegistry, ScriptedTransport};

use arca_artifact::{Artifact, BlobPayload};
use arca_store::LocalStore;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const TEXT: &str = "text/plain";

pub fn payload(title: &str, data: &[u8]) -> BlobPayload {
    BlobPayload::new(TEXT, data.to_vec()).with_title(title)
}

pub fn annotations(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

/// Store holding `name` with two titled text blobs
pub fn store_with(name: &str) -> (LocalStore, Artifact) {
    let store = LocalStore::new();
    let artifact = store
        .create(
            name,
            vec![payload("a.txt", b"alpha"), payload("b.txt", b"beta")],
            None,
            annotations(&[("owner", "tests")]),
        )
        .unwrap();
    (store, artifact)
}

/// Write `files` into `dir`, returning their paths in order
pub fn write_files(dir: &Path, files: &[(&str, &[u8])]) -> Vec<PathBuf> {
    files
        .iter()
        .map(|(name, contents)| {
            let path = dir.join(name);
            std::fs::write(&path, contents).unwrap();
            path
        })
        .collect()
}

/// Fresh temporary directory
pub fn temp_dir() -> tempfile::TempDir {
    tempfile::tempdir().unwrap()
}
