//! Tests for DirectoriesHandler
//!
//! These tests verify:
//! - Only immediate sub-directories are listed
//! - Listings are sorted and computed once
//! - Unreadable parents fail construction with PathUnreadable

use std::fs;

use kvreconcile::directories::{DirectoriesHandler, DirectoryListing};
use kvreconcile::ReconcileError;
use tempfile::TempDir;

#[test]
fn test_lists_sub_directories_only() {
    let source = TempDir::new().unwrap();
    let destination = TempDir::new().unwrap();

    fs::create_dir(source.path().join("bbbb")).unwrap();
    fs::create_dir(source.path().join("aaaa")).unwrap();
    fs::create_dir_all(source.path().join("aaaa").join("nested")).unwrap();
    fs::write(source.path().join("file.txt"), b"ignored").unwrap();

    fs::create_dir(destination.path().join("cccc")).unwrap();

    let handler = DirectoriesHandler::new(source.path(), destination.path()).unwrap();

    assert_eq!(
        handler.source_directories(),
        &[source.path().join("aaaa"), source.path().join("bbbb")]
    );
    assert_eq!(
        handler.destination_directories(),
        &[destination.path().join("cccc")]
    );
}

#[test]
fn test_empty_parents() {
    let source = TempDir::new().unwrap();
    let destination = TempDir::new().unwrap();

    let handler = DirectoriesHandler::new(source.path(), destination.path()).unwrap();

    assert!(handler.source_directories().is_empty());
    assert!(handler.destination_directories().is_empty());
}

#[test]
fn test_listing_is_not_reread() {
    let source = TempDir::new().unwrap();
    let destination = TempDir::new().unwrap();
    fs::create_dir(source.path().join("A")).unwrap();

    let handler = DirectoriesHandler::new(source.path(), destination.path()).unwrap();
    fs::create_dir(source.path().join("B")).unwrap();

    assert_eq!(handler.source_directories().len(), 1);
}

#[test]
fn test_missing_source_parent_fails() {
    let destination = TempDir::new().unwrap();
    let missing = destination.path().join("no-such-dir");

    let result = DirectoriesHandler::new(&missing, destination.path());

    match result {
        Err(ReconcileError::PathUnreadable { path, .. }) => assert_eq!(path, missing),
        other => panic!("expected PathUnreadable, got {:?}", other),
    }
}

#[test]
fn test_missing_destination_parent_fails() {
    let source = TempDir::new().unwrap();
    let missing = source.path().join("no-such-dir");

    let result = DirectoriesHandler::new(source.path(), &missing);

    assert!(matches!(
        result,
        Err(ReconcileError::PathUnreadable { .. })
    ));
}

#[test]
fn test_parent_that_is_a_file_fails() {
    let source = TempDir::new().unwrap();
    let destination = TempDir::new().unwrap();
    let file_path = source.path().join("plain");
    fs::write(&file_path, b"x").unwrap();

    let result = DirectoriesHandler::new(&file_path, destination.path());

    assert!(matches!(
        result,
        Err(ReconcileError::PathUnreadable { .. })
    ));
}
