//! Tests for the upload/process/fetch store and its retention sweep.
//!
//! Run with: `cargo test -p negrestore-service --test store`

use std::time::{Duration, SystemTime};

use negrestore_core::{CorrectionParams, OutputFormat, PixelBuffer, decode, encode};
use negrestore_service::{ErrorKind, ImageState, ImageStore, ServiceConfig, StoreError};

fn gradient(width: u32, height: u32) -> PixelBuffer {
    let pixels = (0..width * height)
        .map(|i| {
            let (x, y) = (i % width, i / width);
            [(200 - x * 3) as u8, (140 - y * 2) as u8, (60 + x + y) as u8]
        })
        .collect();
    PixelBuffer::new(width, height, pixels)
}

/// Large enough that encoding, writing, and processing take real time.
fn busy_pattern(width: u32, height: u32) -> PixelBuffer {
    let pixels = (0..width * height)
        .map(|i| {
            let (x, y) = (i % width, i / width);
            [((x * 7 + y * 3) % 256) as u8, ((x ^ y) % 256) as u8, ((x * y) % 251) as u8]
        })
        .collect();
    PixelBuffer::new(width, height, pixels)
}

fn png_bytes() -> Vec<u8> {
    encode(&gradient(24, 16), OutputFormat::Png).unwrap()
}

fn open_store(dir: &std::path::Path) -> ImageStore {
    ImageStore::open(&ServiceConfig::with_data_dir(dir), CorrectionParams::default()).unwrap()
}

#[tokio::test]
async fn test_identical_uploads_share_a_name() {
    let tmp = tempfile::tempdir().unwrap();
    let store = open_store(tmp.path());

    let first = store.save_upload("image/png", png_bytes()).await.unwrap();
    let second = store.save_upload("image/png", png_bytes()).await.unwrap();
    assert_eq!(first, second);
    assert!(first.ends_with(".png"));
    assert_eq!(first.len(), 64 + ".png".len());
    assert_eq!(std::fs::read_dir(store.upload_dir()).unwrap().count(), 1);
}

#[tokio::test]
async fn test_upload_rejections() {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = ServiceConfig::with_data_dir(tmp.path());
    config.max_upload_bytes = 64;
    let small = ImageStore::open(&config, CorrectionParams::default()).unwrap();

    let err = small.save_upload("image/png", png_bytes()).await.unwrap_err();
    assert!(matches!(err, StoreError::TooLarge { limit: 64, .. }), "{err}");
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    let store = open_store(tmp.path());
    let err = store.save_upload("image/gif", png_bytes()).await.unwrap_err();
    assert!(matches!(err, StoreError::UnsupportedType(_)), "{err}");

    let err = store
        .save_upload("image/png", b"definitely not an image".to_vec())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidImage(_)), "{err}");

    let mut truncated = png_bytes();
    truncated.truncate(40);
    let err = store.save_upload("image/png", truncated).await.unwrap_err();
    assert!(matches!(err, StoreError::InvalidImage(_)), "{err}");
}

#[tokio::test]
async fn test_process_then_fetch() {
    let tmp = tempfile::tempdir().unwrap();
    let store = open_store(tmp.path());

    let name = store.save_upload("image/png", png_bytes()).await.unwrap();
    assert_eq!(store.state(&name).unwrap(), ImageState::Uploaded);

    let processed = store.process(&name).await.unwrap();
    assert_eq!(processed, format!("processed_{name}"));
    assert_eq!(store.state(&name).unwrap(), ImageState::Processed);

    let bytes = store.fetch(&processed).await.unwrap();
    let restored = decode(&bytes).unwrap();
    assert_eq!((restored.width(), restored.height()), (24, 16));

    let expected = negrestore_core::process(&png_bytes(), store.params(), OutputFormat::Png).unwrap();
    assert_eq!(bytes, expected);

    // A second request reuses the stored result.
    assert_eq!(store.process(&name).await.unwrap(), processed);
}

#[tokio::test]
async fn test_jpeg_uploads_produce_jpeg_results() {
    let tmp = tempfile::tempdir().unwrap();
    let store = open_store(tmp.path());

    let jpeg = encode(&gradient(16, 16), OutputFormat::default()).unwrap();
    let name = store.save_upload("image/jpeg", jpeg).await.unwrap();
    assert!(name.ends_with(".jpg"));

    let processed = store.process(&name).await.unwrap();
    let bytes = store.fetch(&processed).await.unwrap();
    assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
}

#[tokio::test]
async fn test_missing_and_invalid_names() {
    let tmp = tempfile::tempdir().unwrap();
    let store = open_store(tmp.path());

    let missing = "0".repeat(64) + ".png";
    let err = store.process(&missing).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)), "{err}");
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(matches!(store.fetch(&missing).await, Err(StoreError::NotFound(_))));
    assert_eq!(store.state(&missing).unwrap(), ImageState::Expired);

    for bad in ["../secret.png", "a/b.png", ""] {
        assert!(matches!(store.process(bad).await, Err(StoreError::InvalidName(_))), "{bad}");
        assert!(matches!(store.fetch(bad).await, Err(StoreError::InvalidName(_))), "{bad}");
    }
}

#[tokio::test]
async fn test_sweep_removes_only_expired_files() {
    let tmp = tempfile::tempdir().unwrap();
    let store = open_store(tmp.path());

    let name = store.save_upload("image/png", png_bytes()).await.unwrap();
    let processed = store.process(&name).await.unwrap();

    let now = SystemTime::now();
    let report = store.sweep_at(now + Duration::from_secs(60));
    assert!(report.removed.is_empty());
    assert_eq!(store.state(&name).unwrap(), ImageState::Processed);

    let report = store.sweep_at(now + Duration::from_secs(3 * 60 * 60));
    assert_eq!(report.removed.len(), 2);
    assert_eq!(report.failed, 0);
    assert_eq!(store.state(&name).unwrap(), ImageState::Expired);
    assert!(matches!(store.fetch(&processed).await, Err(StoreError::NotFound(_))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_repeat_upload_during_processing_keeps_input_readable() {
    let tmp = tempfile::tempdir().unwrap();
    let store = open_store(tmp.path());
    let png = encode(&busy_pattern(600, 600), OutputFormat::Png).unwrap();
    let name = store.save_upload("image/png", png.clone()).await.unwrap();
    let processed = store.processed_dir().join(format!("processed_{name}"));

    for round in 0..30 {
        let _ = std::fs::remove_file(&processed);
        let (uploaded, result) =
            tokio::join!(store.save_upload("image/png", png.clone()), store.process(&name));
        assert_eq!(uploaded.unwrap(), name);
        if let Err(e) = result {
            panic!("round {round}: process failed with {:?}: {e}", e.kind());
        }
    }

    let leftovers: Vec<_> = std::fs::read_dir(store.upload_dir())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(leftovers, vec![std::ffi::OsString::from(&name)]);
}

#[tokio::test]
async fn test_overlapping_process_requests_report_busy() {
    let tmp = tempfile::tempdir().unwrap();
    let store = open_store(tmp.path());
    let png = encode(&busy_pattern(256, 256), OutputFormat::Png).unwrap();
    let name = store.save_upload("image/png", png).await.unwrap();

    let (first, second) = tokio::join!(store.process(&name), store.process(&name));
    let processed = first.unwrap();
    let err = second.unwrap_err();
    assert!(matches!(err, StoreError::Busy(_)), "{err}");
    assert_eq!(err.kind(), ErrorKind::Busy);

    // The claim is released once the first request finishes.
    assert_eq!(store.process(&name).await.unwrap(), processed);
}
