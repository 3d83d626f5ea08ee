//! Local facade operations
//!
//! Add, list, inspect, extract and remove against an in-memory store.

use arca_core::prelude::*;
use arca_artifact::BlobPayload;
use arca_core::{ArtifactRemoveReport, Digest};
use arca_store::StoreError;
use arca_test_utils::{payload, temp_dir, write_files, MemoryRegistry};
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

const NAME: &str = "quay.io/team/bundle:v1";

fn facade() -> ArtifactFacade {
    ArtifactFacade::new(
        SyncEngine::new(Arc::new(MemoryRegistry::new())),
        ArcaConfig::new(),
    )
}

async fn with_files(arca: &ArtifactFacade, name: &str, files: &[(&str, &[u8])]) -> Digest {
    let dir = temp_dir();
    let paths = write_files(dir.path(), files);
    arca.add(name, &paths, &ArtifactAddOptions::default())
        .await
        .unwrap()
        .artifact_digest
}

#[tokio::test]
async fn test_add_creates_titled_blobs_in_order() {
    let arca = facade();
    let digest = with_files(&arca, NAME, &[("a.txt", b"alpha"), ("b.bin", b"beta")]).await;

    let report = arca
        .inspect(NAME, &ArtifactInspectOptions::default())
        .await
        .unwrap();
    assert_eq!(report.digest, digest);
    let titles: Vec<_> = report.artifact.blobs().iter().map(|b| b.title()).collect();
    assert_eq!(titles, vec![Some("a.txt"), Some("b.bin")]);
    assert!(report
        .artifact
        .blobs()
        .iter()
        .all(|b| b.media_type == "application/octet-stream"));
}

#[tokio::test]
async fn test_add_uses_file_type_and_annotations() {
    let arca = facade();
    let dir = temp_dir();
    let paths = write_files(dir.path(), &[("doc.md", &b"# hi"[..])]);
    let options = ArtifactAddOptions {
        annotations: BTreeMap::from([("team".to_string(), "storage".to_string())]),
        artifact_type: Some("application/vnd.example.docs".to_string()),
        file_type: Some("text/markdown".to_string()),
        ..Default::default()
    };
    arca.add(NAME, &paths, &options).await.unwrap();

    let artifact = arca.store().get(NAME).unwrap();
    assert_eq!(artifact.artifact_type(), Some("application/vnd.example.docs"));
    assert_eq!(artifact.annotations().get("team").map(String::as_str), Some("storage"));
    assert_eq!(artifact.blobs()[0].media_type, "text/markdown");
}

#[tokio::test]
async fn test_add_validation() {
    let arca = facade();
    let err = arca
        .add(NAME, &[], &ArtifactAddOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let append_with_type = ArtifactAddOptions {
        append: true,
        artifact_type: Some("t".to_string()),
        ..Default::default()
    };
    let err = arca
        .add(NAME, &[PathBuf::from("x")], &append_with_type)
        .await
        .unwrap_err();
    assert!(err.is_validation());

    let first = temp_dir();
    let second = temp_dir();
    let mut paths = write_files(first.path(), &[("same.txt", &b"1"[..])]);
    paths.extend(write_files(second.path(), &[("same.txt", &b"2"[..])]));
    let err = arca
        .add(NAME, &paths, &ArtifactAddOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert!(arca.store().is_empty());
}

#[tokio::test]
async fn test_add_missing_file_is_io() {
    let arca = facade();
    let dir = temp_dir();
    let err = arca
        .add(
            NAME,
            &[dir.path().join("absent.txt")],
            &ArtifactAddOptions::default(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert!(arca.store().is_empty());
}

#[tokio::test]
async fn test_add_existing_name_without_append() {
    let arca = facade();
    with_files(&arca, NAME, &[("a", b"1")]).await;

    let dir = temp_dir();
    let paths = write_files(dir.path(), &[("b", &b"2"[..])]);
    let err = arca
        .add(NAME, &paths, &ArtifactAddOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ArcaError::Store(StoreError::AlreadyExists { .. })
    ));
}

#[tokio::test]
async fn test_append_adds_to_the_end_and_creates_when_absent() {
    let arca = facade();
    let append = ArtifactAddOptions {
        append: true,
        annotations: BTreeMap::from([("stage".to_string(), "one".to_string())]),
        ..Default::default()
    };

    let dir = temp_dir();
    let first = write_files(dir.path(), &[("one", &b"1"[..])]);
    let created = arca.add(NAME, &first, &append).await.unwrap();

    let second = write_files(dir.path(), &[("two", &b"2"[..])]);
    let append = ArtifactAddOptions {
        annotations: BTreeMap::from([("stage".to_string(), "two".to_string())]),
        ..append
    };
    let appended = arca.add(NAME, &second, &append).await.unwrap();
    assert_ne!(created.artifact_digest, appended.artifact_digest);

    let artifact = arca.store().get(NAME).unwrap();
    let titles: Vec<_> = artifact.blobs().iter().map(|b| b.title()).collect();
    assert_eq!(titles, vec![Some("one"), Some("two")]);
    assert_eq!(artifact.annotations().get("stage").map(String::as_str), Some("two"));
}

#[test]
fn test_empty_append_keeps_the_digest() {
    let arca = facade();
    let created = arca
        .store()
        .create(NAME, vec![payload("a", b"1")], None, BTreeMap::new())
        .unwrap();

    let appended = arca
        .store()
        .append(NAME, Vec::<BlobPayload>::new(), BTreeMap::new())
        .unwrap();
    assert_eq!(appended.digest(), created.digest());
}

#[test]
fn test_extract_from_empty_artifact_needs_a_selector() {
    let arca = facade();
    arca.store()
        .create(NAME, Vec::<BlobPayload>::new(), None, BTreeMap::new())
        .unwrap();

    let err = arca
        .extract(NAME, &ArtifactExtractOptions::default())
        .unwrap_err();
    assert!(matches!(
        err,
        ArcaError::Store(StoreError::SelectorRequired { blob_count: 0, .. })
    ));
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = arca
        .extract(NAME, &ArtifactExtractOptions::by_title("a"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_concurrent_append_conflict_then_retry() {
    let arca = facade();
    let store = arca.store();
    let base = store
        .create(NAME, vec![payload("a", b"1")], None, BTreeMap::new())
        .unwrap();

    store
        .append_at(NAME, base.digest(), vec![payload("b", b"2")], BTreeMap::new())
        .unwrap();
    let err = store
        .append_at(NAME, base.digest(), vec![payload("c", b"3")], BTreeMap::new())
        .unwrap_err();
    assert_eq!(ArcaError::from(err).kind(), ErrorKind::ConcurrentModification);

    let current = store.get(NAME).unwrap();
    let merged = store
        .append_at(NAME, current.digest(), vec![payload("c", b"3")], BTreeMap::new())
        .unwrap();
    assert_eq!(merged.blobs().len(), 3);
}

#[tokio::test]
async fn test_list_in_insertion_order() {
    let arca = facade();
    assert!(arca.list(&ArtifactListOptions).is_empty());

    with_files(&arca, "b/second:1", &[("x", b"x")]).await;
    with_files(&arca, "a/first:1", &[("y", b"y")]).await;

    let names: Vec<_> = arca
        .list(&ArtifactListOptions)
        .into_iter()
        .map(|report| report.artifact.name().to_string())
        .collect();
    assert_eq!(names, vec!["b/second:1", "a/first:1"]);
}

#[tokio::test]
async fn test_inspect_by_digest_and_missing() {
    let arca = facade();
    let digest = with_files(&arca, NAME, &[("a", b"1")]).await;

    let report = arca
        .inspect(&digest.to_string(), &ArtifactInspectOptions::default())
        .await
        .unwrap();
    assert_eq!(report.artifact.name(), NAME);

    let err = arca
        .inspect("nothing/here:1", &ArtifactInspectOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_extract_by_title_digest_and_conflict() {
    let arca = facade();
    with_files(&arca, NAME, &[("a.txt", b"alpha"), ("b.txt", b"beta")]).await;

    let by_title = arca
        .extract(NAME, &ArtifactExtractOptions::by_title("b.txt"))
        .unwrap();
    assert_eq!(&*by_title.data, b"beta");

    let by_digest = arca
        .extract(
            NAME,
            &ArtifactExtractOptions::by_digest(Digest::compute(b"alpha").to_string()),
        )
        .unwrap();
    assert_eq!(by_digest.blob.title(), Some("a.txt"));

    let both = ArtifactExtractOptions {
        title: Some("a.txt".to_string()),
        digest: Some(Digest::compute(b"alpha").to_string()),
    };
    assert_eq!(
        arca.extract(NAME, &both).unwrap_err().kind(),
        ErrorKind::Validation
    );

    let err = arca
        .extract(NAME, &ArtifactExtractOptions::by_title("c.txt"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = arca
        .extract(NAME, &ArtifactExtractOptions::default())
        .unwrap_err();
    assert!(matches!(
        err,
        ArcaError::Store(StoreError::SelectorRequired { .. })
    ));
}

#[test]
fn test_extract_ambiguous_title() {
    let arca = facade();
    arca.store()
        .create(
            NAME,
            vec![payload("dup", b"1"), payload("dup", b"2")],
            None,
            BTreeMap::new(),
        )
        .unwrap();

    let err = arca
        .extract(NAME, &ArtifactExtractOptions::by_title("dup"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AmbiguousSelector);
}

#[tokio::test]
async fn test_extract_to_directory_and_file() {
    let arca = facade();
    with_files(&arca, NAME, &[("a.txt", b"alpha"), ("b.txt", b"beta")]).await;

    let out = temp_dir();
    let written = arca
        .extract_to(NAME, out.path(), &ArtifactExtractOptions::default())
        .await
        .unwrap();
    assert_eq!(
        written,
        vec![out.path().join("a.txt"), out.path().join("b.txt")]
    );
    assert_eq!(std::fs::read(out.path().join("b.txt")).unwrap(), b"beta");

    let file = out.path().join("renamed");
    let written = arca
        .extract_to(NAME, &file, &ArtifactExtractOptions::by_title("a.txt"))
        .await
        .unwrap();
    assert_eq!(written, vec![file.clone()]);
    assert_eq!(std::fs::read(&file).unwrap(), b"alpha");
}

#[tokio::test]
async fn test_extract_to_rejects_unsafe_titles() {
    let arca = facade();
    arca.store()
        .create(
            NAME,
            vec![payload("../escape", b"x")],
            None,
            BTreeMap::new(),
        )
        .unwrap();

    let out = temp_dir();
    let err = arca
        .extract_to(NAME, out.path(), &ArtifactExtractOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_remove_then_list_is_empty() {
    let arca = facade();
    let digest = with_files(&arca, NAME, &[("a", b"1")]).await;

    let report = arca
        .remove(&[NAME.to_string()], &ArtifactRemoveOptions::default())
        .unwrap();
    assert_eq!(report.artifact_digests, vec![digest]);
    assert!(arca.list(&ArtifactListOptions).is_empty());

    let err = arca
        .remove(&[NAME.to_string()], &ArtifactRemoveOptions::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_remove_checks_every_reference_first() {
    let arca = facade();
    with_files(&arca, NAME, &[("a", b"1")]).await;

    let err = arca
        .remove(
            &[NAME.to_string(), "missing/one:1".to_string()],
            &ArtifactRemoveOptions::default(),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(arca.store().contains(NAME));
}

#[tokio::test]
async fn test_remove_same_artifact_by_name_and_digest() {
    let arca = facade();
    let digest = with_files(&arca, NAME, &[("a", b"1")]).await;

    let report = arca
        .remove(
            &[NAME.to_string(), digest.to_string()],
            &ArtifactRemoveOptions::default(),
        )
        .unwrap();
    assert_eq!(report.artifact_digests, vec![digest]);
}

#[tokio::test]
async fn test_remove_all() {
    let arca = facade();
    let all = ArtifactRemoveOptions { all: true };
    assert_eq!(arca.remove(&[], &all).unwrap(), ArtifactRemoveReport::default());

    let first = with_files(&arca, "one/a:1", &[("a", b"1")]).await;
    let second = with_files(&arca, "two/b:1", &[("b", b"2")]).await;
    let report = arca.remove(&[], &all).unwrap();
    assert_eq!(report.artifact_digests, vec![first, second]);
    assert!(arca.store().is_empty());
}

#[test]
fn test_remove_option_conflicts() {
    let arca = facade();
    let err = arca
        .remove(&["x/y:1".to_string()], &ArtifactRemoveOptions { all: true })
        .unwrap_err();
    assert!(err.is_validation());

    let err = arca
        .remove(&[], &ArtifactRemoveOptions::default())
        .unwrap_err();
    assert!(err.is_validation());
}

#[tokio::test]
async fn test_reports_serialize() {
    let arca = facade();
    let digest = with_files(&arca, NAME, &[("a", b"1")]).await;
    let report = arca
        .remove(&[NAME.to_string()], &ArtifactRemoveOptions::default())
        .unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["artifactDigests"][0], digest.to_string());
}
