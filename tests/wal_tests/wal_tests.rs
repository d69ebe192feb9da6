//! Tests for the WAL
//!
//! These tests verify:
//! - LSN generation and sequencing
//! - Sync strategies and truncation
//! - Reading back what the writer produced
//! - Recovery from partial writes and corrupted entries
//! - Verify mode (stats only, file untouched)

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use kvreconcile::config::WalSyncStrategy;
use kvreconcile::wal::{Operation, WalEntry, WalReader, WalRecovery, WalWriter, HEADER_SIZE};
use kvreconcile::ReconcileError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_wal() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let wal_path = temp_dir.path().join("test.wal");
    (temp_dir, wal_path)
}

fn put(key: &str, value: &str) -> Operation {
    Operation::Put {
        key: key.as_bytes().to_vec(),
        value: value.as_bytes().to_vec(),
    }
}

/// Write entries using WalWriter (produces a well-formed WAL)
fn write_entries_via_writer(path: &PathBuf, count: usize) {
    let mut writer = WalWriter::open(path, WalSyncStrategy::EveryWrite).unwrap();
    for i in 0..count {
        writer
            .append(put(&format!("key{}", i), &format!("value{}", i)))
            .unwrap();
    }
}

/// Write raw serialized entries directly to a file (for crafting corruption)
fn write_raw(path: &PathBuf, frames: &[Vec<u8>]) {
    let mut file = File::create(path).unwrap();
    for frame in frames {
        file.write_all(frame).unwrap();
    }
    file.sync_all().unwrap();
}

// =============================================================================
// Writer Tests
// =============================================================================

#[test]
fn test_write_single_entry() {
    let (_temp, wal_path) = setup_temp_wal();

    let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
    let lsn = writer.append(put("key1", "value1")).unwrap();

    assert_eq!(lsn, 1);
    assert_eq!(writer.current_lsn(), 2);
    assert!(fs::metadata(&wal_path).unwrap().len() > HEADER_SIZE as u64);
}

#[test]
fn test_lsn_sequential() {
    let (_temp, wal_path) = setup_temp_wal();

    let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();

    for i in 0..100u64 {
        let lsn = writer.append(put(&format!("key{}", i), "v")).unwrap();
        assert_eq!(lsn, i + 1);
    }
}

#[test]
fn test_reopen_continues_lsn() {
    let (_temp, wal_path) = setup_temp_wal();
    write_entries_via_writer(&wal_path, 3);

    let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
    assert_eq!(writer.current_lsn(), 4);
    assert_eq!(writer.append(put("k", "v")).unwrap(), 4);
}

#[test]
fn test_every_n_entries_strategy_writes_all_entries() {
    let (_temp, wal_path) = setup_temp_wal();

    {
        let mut writer =
            WalWriter::open(&wal_path, WalSyncStrategy::EveryNEntries { count: 4 }).unwrap();
        for i in 0..10 {
            writer.append(put(&format!("key{}", i), "v")).unwrap();
        }
        writer.sync().unwrap();
    }

    let result = WalRecovery::verify(&wal_path).unwrap();
    assert_eq!(result.entries_recovered, 10);
    assert_eq!(result.last_lsn, 10);
}

#[test]
fn test_truncate_empties_file_and_keeps_lsn() {
    let (_temp, wal_path) = setup_temp_wal();

    let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
    writer.append(put("a", "1")).unwrap();
    writer.append(put("b", "2")).unwrap();

    writer.truncate().unwrap();
    assert_eq!(fs::metadata(&wal_path).unwrap().len(), 0);
    assert_eq!(writer.current_lsn(), 3);

    // Appends after truncation land at the start of the file
    writer.append(put("c", "3")).unwrap();
    let (entries, _) = WalRecovery::recover(&wal_path).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].lsn, 3);
    assert_eq!(entries[0].operation, put("c", "3"));
}

// =============================================================================
// Reader Tests
// =============================================================================

#[test]
fn test_reader_reads_back_writer_output() {
    let (_temp, wal_path) = setup_temp_wal();
    write_entries_via_writer(&wal_path, 5);

    let reader = WalReader::open(&wal_path).unwrap();
    let entries: Vec<WalEntry> = reader.entries().map(|e| e.unwrap()).collect();

    assert_eq!(entries.len(), 5);
    for (i, entry) in entries.iter().enumerate() {
        assert_eq!(entry.lsn, (i + 1) as u64);
        assert_eq!(entry.operation, put(&format!("key{}", i), &format!("value{}", i)));
    }
}

#[test]
fn test_reader_empty_file() {
    let (_temp, wal_path) = setup_temp_wal();
    File::create(&wal_path).unwrap();

    let mut reader = WalReader::open(&wal_path).unwrap();
    assert!(reader.next_entry().unwrap().is_none());
    assert_eq!(reader.position(), 0);
}

#[test]
fn test_reader_reports_garbage_length() {
    let (_temp, wal_path) = setup_temp_wal();

    let mut frame = WalEntry::new(1, put("k", "v")).serialize().unwrap();
    frame[12..16].copy_from_slice(&u32::MAX.to_le_bytes());
    write_raw(&wal_path, &[frame]);

    let mut reader = WalReader::open(&wal_path).unwrap();
    assert!(matches!(
        reader.next_entry(),
        Err(ReconcileError::WalCorruption(_))
    ));
    assert_eq!(reader.position(), 0);
}

#[test]
fn test_iterator_stops_after_error() {
    let (_temp, wal_path) = setup_temp_wal();

    let good = WalEntry::new(1, put("k1", "v1")).serialize().unwrap();
    write_raw(&wal_path, &[good, vec![0u8; 5]]);

    let results: Vec<_> = WalReader::open(&wal_path).unwrap().entries().collect();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(results[1].is_err());
}

// =============================================================================
// Recovery Tests
// =============================================================================

#[test]
fn test_recover_empty_file() {
    let (_temp, wal_path) = setup_temp_wal();
    File::create(&wal_path).unwrap();

    let (entries, result) = WalRecovery::recover(&wal_path).unwrap();

    assert_eq!(entries.len(), 0);
    assert_eq!(result.entries_recovered, 0);
    assert_eq!(result.entries_corrupted, 0);
    assert_eq!(result.last_lsn, 0);
    assert!(!result.was_truncated);
}

#[test]
fn test_recover_multiple_entries() {
    let (_temp, wal_path) = setup_temp_wal();
    write_entries_via_writer(&wal_path, 10);

    let (entries, result) = WalRecovery::recover(&wal_path).unwrap();

    assert_eq!(entries.len(), 10);
    assert_eq!(result.entries_recovered, 10);
    assert_eq!(result.entries_corrupted, 0);
    assert_eq!(result.last_lsn, 10);
    assert!(!result.was_truncated);
}

#[test]
fn test_recover_partial_header_at_tail() {
    let (_temp, wal_path) = setup_temp_wal();

    let good = WalEntry::new(1, put("k", "v")).serialize().unwrap();
    let good_len = good.len() as u64;
    write_raw(&wal_path, &[good, vec![0u8; 8]]);

    let (entries, result) = WalRecovery::recover(&wal_path).unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(result.last_lsn, 1);
    assert!(result.was_truncated);
    assert_eq!(fs::metadata(&wal_path).unwrap().len(), good_len);
}

#[test]
fn test_recover_partial_data_at_tail() {
    let (_temp, wal_path) = setup_temp_wal();

    let good = WalEntry::new(1, put("k", "v")).serialize().unwrap();
    let mut torn = WalEntry::new(2, put("k2", "v2")).serialize().unwrap();
    torn.truncate(HEADER_SIZE + 4);
    write_raw(&wal_path, &[good, torn]);

    let (entries, result) = WalRecovery::recover(&wal_path).unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(result.entries_recovered, 1);
    assert!(result.was_truncated);
}

#[test]
fn test_recover_corrupted_entry() {
    let (_temp, wal_path) = setup_temp_wal();

    let good = WalEntry::new(1, put("k1", "v1")).serialize().unwrap();
    let mut bad = WalEntry::new(2, put("k2", "v2")).serialize().unwrap();
    if let Some(byte) = bad.last_mut() {
        *byte ^= 0xFF;
    }
    write_raw(&wal_path, &[good, bad]);

    let (entries, result) = WalRecovery::recover(&wal_path).unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(result.entries_recovered, 1);
    assert_eq!(result.entries_corrupted, 1);
    assert_eq!(result.last_lsn, 1);
    assert!(result.was_truncated);

    // A second recovery finds a clean file
    let (_, again) = WalRecovery::recover(&wal_path).unwrap();
    assert_eq!(again.entries_corrupted, 0);
    assert!(!again.was_truncated);
}

#[test]
fn test_verify_does_not_modify_file() {
    let (_temp, wal_path) = setup_temp_wal();
    write_entries_via_writer(&wal_path, 2);

    let mut file = OpenOptions::new().append(true).open(&wal_path).unwrap();
    file.write_all(&[0xAB; 7]).unwrap();
    drop(file);
    let len_before = fs::metadata(&wal_path).unwrap().len();

    let result = WalRecovery::verify(&wal_path).unwrap();

    assert_eq!(result.entries_recovered, 2);
    assert_eq!(result.entries_corrupted, 1);
    assert!(!result.was_truncated);
    assert_eq!(fs::metadata(&wal_path).unwrap().len(), len_before);
}
