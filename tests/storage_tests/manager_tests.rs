//! Tests for StorageManager
//!
//! These tests verify:
//! - Opening/creating storage directories
//! - Flushing MemTable to SSTable
//! - Querying across multiple SSTables (newest wins)
//! - Persistence (restart and rediscover SSTables)
//! - Per-table sorted sources for merged scans

use std::fs;
use std::path::PathBuf;

use kvreconcile::memtable::MemTable;
use kvreconcile::storage::{MergingIterator, StorageManager};
use kvreconcile::ReconcileError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_storage() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().to_path_buf();
    (temp_dir, path)
}

fn create_memtable_with_entries(entries: &[(&[u8], &[u8])]) -> MemTable {
    let memtable = MemTable::new();
    for (key, value) in entries {
        memtable.put(key.to_vec(), value.to_vec());
    }
    memtable
}

// =============================================================================
// Open/Create Tests
// =============================================================================

#[test]
fn test_open_creates_directory() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("new_storage");

    let _manager = StorageManager::open(&path).unwrap();

    assert!(path.is_dir());
}

#[test]
fn test_open_empty_directory() {
    let (_temp, path) = setup_temp_storage();

    let manager = StorageManager::open(&path).unwrap();

    assert_eq!(manager.sstable_count(), 0);
    assert_eq!(manager.next_sstable_id(), 1);
}

#[test]
fn test_open_existing_directory() {
    let (_temp, path) = setup_temp_storage();

    {
        let manager = StorageManager::open(&path).unwrap();
        manager
            .flush(&create_memtable_with_entries(&[(b"k1", b"v1")]))
            .unwrap();
        manager
            .flush(&create_memtable_with_entries(&[(b"k2", b"v2")]))
            .unwrap();
        assert_eq!(manager.sstable_count(), 2);
    }

    let manager = StorageManager::open(&path).unwrap();

    assert_eq!(manager.sstable_count(), 2);
    assert_eq!(manager.next_sstable_id(), 3);
    assert_eq!(manager.get(b"k1").unwrap(), Some(b"v1".to_vec()));
    assert_eq!(manager.get(b"k2").unwrap(), Some(b"v2".to_vec()));
}

#[test]
fn test_open_ignores_unrelated_files() {
    let (_temp, path) = setup_temp_storage();
    fs::write(path.join("notes.txt"), b"hello").unwrap();
    fs::write(path.join("sstable_000009.tmp"), b"partial").unwrap();

    let manager = StorageManager::open(&path).unwrap();

    assert_eq!(manager.sstable_count(), 0);
}

// =============================================================================
// Flush / Get Tests
// =============================================================================

#[test]
fn test_flush_single_memtable() {
    let (_temp, path) = setup_temp_storage();
    let manager = StorageManager::open(&path).unwrap();

    let memtable = create_memtable_with_entries(&[
        (b"apple", b"red"),
        (b"banana", b"yellow"),
        (b"cherry", b"red"),
    ]);

    let metadata = manager.flush(&memtable).unwrap();

    assert_eq!(metadata.entry_count, 3);
    assert_eq!(manager.sstable_count(), 1);
    assert_eq!(manager.get(b"banana").unwrap(), Some(b"yellow".to_vec()));
    assert_eq!(manager.get(b"durian").unwrap(), None);
}

#[test]
fn test_flush_empty_memtable_fails() {
    let (_temp, path) = setup_temp_storage();
    let manager = StorageManager::open(&path).unwrap();

    let result = manager.flush(&MemTable::new());

    assert!(matches!(result, Err(ReconcileError::Storage(_))));
}

#[test]
fn test_newest_sstable_wins() {
    let (_temp, path) = setup_temp_storage();
    let manager = StorageManager::open(&path).unwrap();

    manager
        .flush(&create_memtable_with_entries(&[(b"key", b"old")]))
        .unwrap();
    manager
        .flush(&create_memtable_with_entries(&[(b"key", b"new")]))
        .unwrap();

    assert_eq!(manager.get(b"key").unwrap(), Some(b"new".to_vec()));
}

// =============================================================================
// Source Tests
// =============================================================================

#[test]
fn test_with_sources_merges_tables() {
    let (_temp, path) = setup_temp_storage();
    let manager = StorageManager::open(&path).unwrap();

    manager
        .flush(&create_memtable_with_entries(&[(b"a", b"1"), (b"c", b"old")]))
        .unwrap();
    manager
        .flush(&create_memtable_with_entries(&[(b"b", b"2"), (b"c", b"new")]))
        .unwrap();

    let merged = manager
        .with_sources(|sources| {
            assert_eq!(sources.len(), 2);
            MergingIterator::new(sources).collect::<Result<Vec<_>, _>>()
        })
        .unwrap();

    assert_eq!(
        merged,
        vec![
            (b"a".to_vec(), b"1".to_vec()),
            (b"b".to_vec(), b"2".to_vec()),
            (b"c".to_vec(), b"new".to_vec()),
        ]
    );
}
