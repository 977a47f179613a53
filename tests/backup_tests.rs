// Integration tests for bundle construction and backup dispatch

mod common;

use common::*;
use speaklab::backup::{
    BackupArtifactBundle, BackupDispatcher, BackupOutcome, LocalFallbackStore, ObjectStore,
};
use speaklab::session::{Attempt, AttemptIndex};
use std::fs;
use std::sync::atomic::Ordering;
use tempfile::TempDir;

fn sample_bundle() -> BackupArtifactBundle {
    let attempt1 = Attempt::new(AttemptIndex::First, recording());
    let attempt2 = Attempt::new(AttemptIndex::Second, recording());
    BackupArtifactBundle::from_session(
        "session-test",
        "Student01",
        chrono::Utc::now(),
        QUESTION,
        [Some(&attempt1), Some(&attempt2)],
        None,
    )
}

#[test]
fn bundle_key_embeds_participant_and_timestamp() {
    let bundle = sample_bundle();
    let key = bundle.key();
    assert!(key.starts_with("Student01_"));
    assert!(key.ends_with(".json"));
    assert_eq!(
        key,
        format!(
            "Student01_{}.json",
            bundle.created_at.format("%Y%m%d_%H%M%S")
        )
    );
}

#[test]
fn bundle_serializes_audio_base64() {
    let bundle = sample_bundle();
    let bytes = bundle.to_bytes().expect("serialize");
    let value: serde_json::Value = serde_json::from_slice(&bytes).expect("valid JSON");

    let data = value
        .pointer("/attempts/0/audio/data")
        .and_then(serde_json::Value::as_str)
        .expect("audio data present");
    assert!(!data.is_empty());
    // Raw bytes never appear unencoded in the JSON document.
    assert!(data.chars().all(|c| c.is_ascii()));
}

#[tokio::test]
async fn exhausted_remote_falls_back_to_byte_identical_local_copy() {
    let temp_dir = TempDir::new().expect("tempdir");
    let remote = FailingStore::new();
    let dispatcher = BackupDispatcher::new(
        Some(remote.clone()),
        LocalFallbackStore::new(temp_dir.path()),
        test_policy(),
    );

    let bundle = sample_bundle();
    let outcome = dispatcher.dispatch(&bundle).await.expect("dispatch");

    assert_eq!(remote.attempts.load(Ordering::SeqCst), 3, "3 upload attempts");

    match outcome {
        BackupOutcome::LocalOnly { path, .. } => {
            let stored = fs::read(&path).expect("local bundle readable");
            assert_eq!(
                stored,
                bundle.to_bytes().expect("serialize"),
                "fallback copy must be byte-identical"
            );
        }
        BackupOutcome::Remote { .. } => panic!("remote should have been exhausted"),
    }
}

#[tokio::test]
async fn disabled_remote_goes_straight_to_local() {
    let temp_dir = TempDir::new().expect("tempdir");
    let dispatcher = BackupDispatcher::new(
        None,
        LocalFallbackStore::new(temp_dir.path()),
        test_policy(),
    );

    let outcome = dispatcher.dispatch(&sample_bundle()).await.expect("dispatch");
    assert!(matches!(outcome, BackupOutcome::LocalOnly { .. }));
}

#[tokio::test]
async fn healthy_remote_receives_single_upload() {
    let temp_dir = TempDir::new().expect("tempdir");
    let remote = AcceptingStore::new();
    let dispatcher = BackupDispatcher::new(
        Some(remote.clone()),
        LocalFallbackStore::new(temp_dir.path()),
        test_policy(),
    );

    let bundle = sample_bundle();
    let outcome = dispatcher.dispatch(&bundle).await.expect("dispatch");

    assert!(matches!(outcome, BackupOutcome::Remote { .. }));
    let objects = remote.objects.lock().unwrap();
    assert_eq!(objects.len(), 1);
    assert_eq!(objects[0].0, bundle.key());
    // No local copy when the remote took the bundle.
    assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn local_store_refuses_overwrite() {
    let temp_dir = TempDir::new().expect("tempdir");
    let store = LocalFallbackStore::new(temp_dir.path());

    store.put("Student01_x.json", b"first").await.expect("first write");
    let err = store.put("Student01_x.json", b"second").await.unwrap_err();
    assert!(matches!(
        err,
        speaklab::backup::StoreError::AlreadyExists(_)
    ));

    // The original object is untouched.
    let stored = fs::read(temp_dir.path().join("Student01_x.json")).unwrap();
    assert_eq!(stored, b"first");
}
