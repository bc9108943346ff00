// Integration tests for sending files to the library folder

use std::fs;
use std::path::Path;

use kodi_rename::transfer::{transfer_batch, TransferError, TransferMode, TransferRequest};
use tempfile::tempdir;

fn write(path: &Path, content: &str) {
    fs::write(path, content).unwrap();
}

fn request(source: &Path, name: Option<&str>) -> TransferRequest {
    TransferRequest {
        source: source.to_path_buf(),
        destination_name: name.map(str::to_string),
    }
}

#[test]
fn test_copy_keeps_original() {
    let source = tempdir().unwrap();
    let library = tempdir().unwrap();
    let file = source.path().join("inception.2010.mkv");
    write(&file, "video");

    let report = transfer_batch(
        &[request(&file, Some("Inception (2010).mkv"))],
        library.path(),
        TransferMode::Copy,
    )
    .unwrap();

    assert_eq!(report.transferred.len(), 1);
    assert!(report.errors.is_empty());
    assert!(file.exists());
    assert_eq!(
        fs::read_to_string(library.path().join("Inception (2010).mkv")).unwrap(),
        "video"
    );
}

#[test]
fn test_move_removes_original() {
    let source = tempdir().unwrap();
    let library = tempdir().unwrap();
    let file = source.path().join("a.mkv");
    write(&file, "a");

    let report = transfer_batch(&[request(&file, Some("A (2000).mkv"))], library.path(), TransferMode::Move)
        .unwrap();

    assert_eq!(report.transferred.len(), 1);
    assert!(!file.exists());
    assert!(library.path().join("A (2000).mkv").exists());
    assert_eq!(report.summary(), "1 of 1 file(s) moved to the library folder");
}

#[test]
fn test_existing_destination_is_never_overwritten() {
    let source = tempdir().unwrap();
    let library = tempdir().unwrap();
    let file = source.path().join("new.mkv");
    write(&file, "new");
    write(&library.path().join("Movie (1999).mkv"), "old");

    let report = transfer_batch(
        &[request(&file, Some("Movie (1999).mkv"))],
        library.path(),
        TransferMode::Move,
    )
    .unwrap();

    assert!(report.transferred.is_empty());
    assert!(matches!(
        report.errors.as_slice(),
        [TransferError::DestinationExists { .. }]
    ));
    assert!(file.exists());
    assert_eq!(
        fs::read_to_string(library.path().join("Movie (1999).mkv")).unwrap(),
        "old"
    );
}

#[test]
fn test_same_destination_twice_in_batch() {
    let source = tempdir().unwrap();
    let library = tempdir().unwrap();
    let first = source.path().join("first.mkv");
    let second = source.path().join("second.mkv");
    write(&first, "1");
    write(&second, "2");

    let report = transfer_batch(
        &[
            request(&first, Some("Same (2000).mkv")),
            request(&second, Some("Same (2000).mkv")),
        ],
        library.path(),
        TransferMode::Copy,
    )
    .unwrap();

    assert_eq!(report.transferred.len(), 1);
    assert!(matches!(
        report.errors.as_slice(),
        [TransferError::DuplicateInBatch { .. }]
    ));
    assert_eq!(
        fs::read_to_string(library.path().join("Same (2000).mkv")).unwrap(),
        "1"
    );
}

#[test]
fn test_missing_source_is_reported_and_others_proceed() {
    let source = tempdir().unwrap();
    let library = tempdir().unwrap();
    let present = source.path().join("present.mkv");
    write(&present, "x");

    let report = transfer_batch(
        &[
            request(&source.path().join("gone.mkv"), Some("Gone (2001).mkv")),
            request(&present, None),
        ],
        library.path(),
        TransferMode::Copy,
    )
    .unwrap();

    assert_eq!(report.transferred.len(), 1);
    assert!(library.path().join("present.mkv").exists());
    assert!(matches!(
        report.errors.as_slice(),
        [TransferError::SourceMissing { .. }]
    ));
    assert_eq!(
        report.summary(),
        "1 of 2 file(s) copied to the library folder, 1 error(s)"
    );
}

#[test]
fn test_invalid_target_refuses_batch() {
    let source = tempdir().unwrap();
    let file = source.path().join("a.mkv");
    write(&file, "a");

    let result = transfer_batch(
        &[request(&file, None)],
        &source.path().join("missing"),
        TransferMode::Move,
    );

    assert!(matches!(result, Err(TransferError::InvalidTarget(_))));
    assert!(file.exists());
}

#[test]
fn test_copy_preserves_modified_time() {
    let source = tempdir().unwrap();
    let library = tempdir().unwrap();
    let file = source.path().join("old.mkv");
    write(&file, "old");
    let past = std::time::SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_000_000_000);
    fs::File::options()
        .write(true)
        .open(&file)
        .unwrap()
        .set_modified(past)
        .unwrap();

    transfer_batch(&[request(&file, Some("Old (2001).mkv"))], library.path(), TransferMode::Copy).unwrap();

    let copied = fs::metadata(library.path().join("Old (2001).mkv")).unwrap();
    assert_eq!(copied.modified().unwrap(), past);
}
