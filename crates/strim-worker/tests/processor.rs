//! Single-file pipeline behaviour through [`FileProcessor::process`].

mod common;

use std::sync::Arc;

use common::*;
use strim_models::{FailureKind, FileTask, OutcomeStatus};
use strim_worker::{FileProcessor, TrimConfig};
use tempfile::TempDir;

fn processor(codec: Arc<FakeCodec>) -> FileProcessor {
    FileProcessor::new(codec, Arc::new(FakeTagStore::default()))
}

#[tokio::test]
async fn test_short_leading_silence_only_trims_end() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("in/a.wav");
    let output = dir.path().join("out/a.wav");

    // 0.1 s of leading silence, 0.2 s trailing
    let audio = FakeAudio {
        channels: 1,
        sample_rate: 1_000,
        samples: (0..1_000)
            .map(|i| if (100..800).contains(&i) { 0.5 } else { 0.0 })
            .collect(),
    };
    write_audio(&source, &audio);

    let config = TrimConfig {
        min_silence_seconds: 0.15,
        ..test_config(dir.path(), Some(dir.path().join("out")))
    };
    let outcome = processor(Arc::default())
        .process(&FileTask::new(source, output.clone()), &config)
        .await;

    let decision = outcome.decision().unwrap();
    assert!(!decision.trim_start_applied);
    assert!(decision.trim_end_applied);
    assert_eq!(decision.window.start_index(), 0);
    assert_eq!(decision.window.end_index(), 810);
    // Measured from the last loud frame, as reported in the log line
    assert!((decision.seconds_removed() - 0.201).abs() < 1e-9);
    assert_eq!(read_audio(&output).frame_count(), 810);
}

#[tokio::test]
async fn test_all_silent_file_is_kept_whole() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("in/quiet.ogg");
    let output = dir.path().join("out/quiet.ogg");
    let audio = FakeAudio {
        channels: 2,
        sample_rate: 8_000,
        samples: vec![0.0001; 4_000],
    };
    write_audio(&source, &audio);

    let config = test_config(dir.path(), Some(dir.path().join("out")));
    let outcome = processor(Arc::default())
        .process(&FileTask::new(source, output.clone()), &config)
        .await;

    assert!(outcome.is_success());
    assert!(outcome.decision().unwrap().is_noop());
    assert_eq!(read_audio(&output), audio);
}

#[tokio::test]
async fn test_disabled_edges_leave_buffer_whole() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("a.aiff");
    write_audio(&source, &padded_tone());

    let config = TrimConfig {
        trim_start: false,
        trim_end: false,
        ..test_config(dir.path(), None)
    };
    let codec = Arc::new(FakeCodec::default());
    let outcome = processor(codec.clone())
        .process(&FileTask::new(source.clone(), source.clone()), &config)
        .await;

    assert!(outcome.is_success());
    assert_eq!(outcome.decision().unwrap().seconds_removed(), 0.0);
    assert_eq!(codec.encode_count(), 0);
    assert_eq!(read_audio(&source), padded_tone());
}

#[tokio::test]
async fn test_conflicting_task_is_not_decoded() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("a.mp3");
    write_audio(&source, &padded_tone());

    let codec = Arc::new(FakeCodec::default());
    let task = FileTask::new(source, dir.path().join("out/a.mp3")).with_conflict("taken");
    let outcome = processor(codec.clone())
        .process(&task, &test_config(dir.path(), Some(dir.path().join("out"))))
        .await;

    assert!(matches!(
        outcome.status,
        OutcomeStatus::Failed { kind: FailureKind::Conflict, .. }
    ));
    assert_eq!(codec.decodes.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_corrupt_file_with_unreadable_tags_is_a_decode_failure() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("broken.wav");
    write_raw(&source, CORRUPT);

    let config = test_config(dir.path(), Some(dir.path().join("out")));
    assert!(config.save_metadata);

    let processor = FileProcessor::new(
        Arc::new(FakeCodec::default()),
        Arc::new(FakeTagStore::unreadable()),
    );
    let outcome = processor
        .process(&FileTask::new(source, dir.path().join("out/broken.wav")), &config)
        .await;

    assert!(matches!(
        outcome.status,
        OutcomeStatus::Failed { kind: FailureKind::Decode, .. }
    ));
}

#[tokio::test]
async fn test_unreadable_tags_on_valid_audio_fail_before_writing() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("a.flac");
    let output = dir.path().join("out/a.flac");
    write_audio(&source, &padded_tone());

    let codec = Arc::new(FakeCodec::default());
    let processor = FileProcessor::new(codec.clone(), Arc::new(FakeTagStore::unreadable()));
    let outcome = processor
        .process(
            &FileTask::new(source, output.clone()),
            &test_config(dir.path(), Some(dir.path().join("out"))),
        )
        .await;

    assert!(matches!(
        outcome.status,
        OutcomeStatus::Failed { kind: FailureKind::Metadata, .. }
    ));
    assert_eq!(codec.encode_count(), 0);
    assert!(!output.exists());
}

#[tokio::test]
async fn test_missing_source_is_an_io_failure() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("gone.flac");

    let config = TrimConfig {
        save_metadata: false,
        ..test_config(dir.path(), Some(dir.path().join("out")))
    };
    let outcome = processor(Arc::default())
        .process(&FileTask::new(source, dir.path().join("out/gone.flac")), &config)
        .await;

    assert!(matches!(
        outcome.status,
        OutcomeStatus::Failed { kind: FailureKind::Io, .. }
    ));
}
