// clipfit-core/tests/thumbnail_tests.rs

use clipfit_core::CoreError;
use clipfit_core::external::mocks::MockFfmpegSpawner;
use clipfit_core::external::{default_thumbnail_path, extract_thumbnail};
use ffmpeg_sidecar::event::FfmpegEvent;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_thumbnail_is_written_through_spawner() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("holiday.mov");
    fs::write(&input, b"dummy content").unwrap();
    let output = default_thumbnail_path(&input);

    let spawner = MockFfmpegSpawner::new();
    spawner.add_success_expectation(Vec::new(), 12_288);

    let written = extract_thumbnail(&spawner, &input, &output, None).unwrap();
    assert_eq!(written, dir.path().join("holiday-thumb.jpg"));
    assert_eq!(fs::metadata(&written).unwrap().len(), 12_288);

    let calls = spawner.get_received_calls();
    assert_eq!(calls.len(), 1);
    let args = &calls[0];
    let value_of = |flag: &str| {
        args.windows(2)
            .find(|w| w[0] == flag)
            .map(|w| w[1].as_str())
    };
    assert_eq!(value_of("-ss"), Some("1"));
    assert_eq!(value_of("-frames:v"), Some("1"));
    assert_eq!(value_of("-vf"), Some("scale=320:-1"));
    assert_eq!(args.last().map(String::as_str), output.to_str());
}

#[test]
fn test_failed_thumbnail_reports_ffmpeg_error_and_leaves_no_file() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("clip.mp4");
    fs::write(&input, b"dummy content").unwrap();
    let output = dir.path().join("preview.jpg");
    fs::write(&output, b"stale").unwrap();

    let spawner = MockFfmpegSpawner::new();
    spawner.add_exit_error_expectation(
        vec![FfmpegEvent::Error("Invalid data found when processing input".to_string())],
        1,
    );

    let err = extract_thumbnail(&spawner, &input, &output, None).unwrap_err();
    match err {
        CoreError::EncodeFailed(message) => {
            assert!(message.contains("Invalid data found"), "message: {message}")
        }
        other => panic!("expected EncodeFailed, got {other:?}"),
    }
    assert!(!output.exists());
}

#[test]
fn test_thumbnail_rejects_unrecognized_input_without_spawning() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("slides.pdf");
    fs::write(&input, b"%PDF").unwrap();

    let spawner = MockFfmpegSpawner::new();
    let result = extract_thumbnail(&spawner, &input, &dir.path().join("slides.jpg"), None);

    assert!(matches!(result, Err(CoreError::UnsupportedInput { .. })));
    assert!(spawner.get_received_calls().is_empty());
}
