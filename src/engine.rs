//! Engine Module
//!
//! The on-disk key-value engine backing every sub-store.
//!
//! ## Responsibilities
//! - Coordinate WAL, MemTable, and Storage
//! - Handle concurrent read/write access
//! - Trigger flushes when MemTable is full
//! - Manage crash recovery on startup
//! - Provide a merged, de-duplicated scan over every live key
//!
//! ## Directory layout
//! ```text
//! {dir}/
//!   ├── wal.log          (write-ahead log)
//!   └── sstables/        (SSTable files)
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::config::StoreOptions;
use crate::error::{ReconcileError, Result};
use crate::memtable::MemTable;
use crate::storage::{EntrySource, MergingIterator, StorageManager};
use crate::wal::{Operation, WalRecovery, WalWriter};

/// The on-disk storage engine for one store directory
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
///
/// - **Writes** (put/flush): Serialized by `write_lock`
///   - Only ONE write operation at a time
///   - Must acquire: write_lock → WAL → memtable → storage (write)
///
/// - **Reads** (get/for_each): No write_lock needed
///   - MemTable uses internal RwLock (many concurrent readers)
///   - StorageManager takes its table lock exclusively for SSTable reads
///     (SSTableReader needs &mut self for file seeking)
pub struct Engine {
    options: StoreOptions,

    /// Root directory of this store
    data_dir: PathBuf,

    /// Directory for all data files (SSTables)
    storage_dir: PathBuf,

    /// Write-ahead log for durability (exclusive access needed)
    wal: Mutex<WalWriter>,

    /// In-memory table for recent writes (internal RwLock)
    memtable: MemTable,

    /// Persistent storage manager (internal RwLock on sstables vec)
    storage: StorageManager,

    /// Serializes write operations (put/flush)
    write_lock: Mutex<()>,
}

impl Engine {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const WAL_FILENAME: &'static str = "wal.log";
    const SSTABLE_DIR: &'static str = "sstables";

    /// Open or create an engine rooted at `path`
    ///
    /// On startup:
    /// 1. Open/create data directory
    /// 2. Load existing SSTables
    /// 3. Recover from WAL if it exists, flushing recovered entries
    /// 4. Ready to serve requests
    pub fn open(path: &Path, options: StoreOptions) -> Result<Self> {
        fs::create_dir_all(path)?;

        let storage_dir = path.join(Self::SSTABLE_DIR);
        let wal_path = path.join(Self::WAL_FILENAME);

        let storage = StorageManager::open(&storage_dir)?;
        let memtable = MemTable::new();

        let mut recovered = false;
        if wal_path.exists() {
            let (entries, recovery_result) = WalRecovery::recover(&wal_path)?;

            if recovery_result.entries_recovered > 0 || recovery_result.entries_corrupted > 0 {
                tracing::info!(
                    path = %path.display(),
                    recovered = recovery_result.entries_recovered,
                    corrupted = recovery_result.entries_corrupted,
                    last_lsn = recovery_result.last_lsn,
                    "WAL recovery"
                );
            }

            for entry in entries {
                match entry.operation {
                    Operation::Put { key, value } => {
                        memtable.put(key, value);
                    }
                }
            }

            // Recovered data must be durable in an SSTable before the WAL is cleared
            if !memtable.is_empty() {
                storage.flush(&memtable)?;
                memtable.clear();
                recovered = true;
            }
        }

        let mut wal = WalWriter::open(&wal_path, options.wal_sync_strategy)?;
        if recovered {
            wal.truncate()?;
        }

        Ok(Self {
            options,
            data_dir: path.to_path_buf(),
            storage_dir,
            wal: Mutex::new(wal),
            memtable,
            storage,
            write_lock: Mutex::new(()),
        })
    }

    /// Open with default store options
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(path, StoreOptions::default())
    }

    /// Get a value by key
    ///
    /// Search order:
    /// 1. MemTable (most recent writes)
    /// 2. SSTables (newest to oldest)
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        if let Some(value) = self.memtable.get(key) {
            return Ok(Some(value));
        }

        self.storage.get(key)
    }

    /// Put a key-value pair
    ///
    /// Steps:
    /// 1. Acquire write lock
    /// 2. Write to WAL (durability)
    /// 3. Write to MemTable
    /// 4. Check if flush needed
    ///
    /// The write is durable once the WAL append succeeds. A failed flush after
    /// that is logged and retried on the next put or on `close`.
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let _write_guard = self.write_lock.lock();

        self.wal.lock().append(Operation::Put {
            key: key.to_vec(),
            value: value.to_vec(),
        })?;

        self.memtable.put(key.to_vec(), value.to_vec());

        if self.memtable.should_flush(self.options.memtable_size_limit) {
            if let Err(e) = self.flush_internal() {
                tracing::warn!(
                    path = %self.data_dir.display(),
                    error = %e,
                    "memtable flush failed, keeping entries in memory"
                );
            }
        }

        Ok(())
    }

    /// Visit every live key once, in ascending byte order
    ///
    /// The newest version of a key wins. Iteration stops early when `visit`
    /// returns false. `visit` must not call back into this engine: the SSTable
    /// list stays locked for the whole scan.
    pub fn for_each(&self, mut visit: impl FnMut(&[u8], &[u8]) -> bool) -> Result<()> {
        let snapshot = self.memtable.iter();

        self.storage.with_sources(|tables| {
            let mut sources: Vec<EntrySource<'_>> = Vec::with_capacity(tables.len() + 1);
            sources.push(Box::new(snapshot.map(Ok::<_, ReconcileError>)));
            sources.extend(tables);

            for entry in MergingIterator::new(sources) {
                let (key, value) = entry?;
                if !visit(&key, &value) {
                    break;
                }
            }

            Ok(())
        })
    }

    /// Flush memtable to disk (public API)
    ///
    /// Forces a flush regardless of memtable size
    pub fn flush(&self) -> Result<()> {
        let _write_guard = self.write_lock.lock();
        self.flush_internal()
    }

    /// Internal flush implementation (called with write lock held)
    fn flush_internal(&self) -> Result<()> {
        if self.memtable.is_empty() {
            return Ok(());
        }

        self.storage.flush(&self.memtable)?;
        self.memtable.clear();

        // Entries are now durable in an SSTable
        self.wal.lock().truncate()?;

        Ok(())
    }

    /// Close the engine gracefully
    ///
    /// Flushes any pending data and syncs to disk
    pub fn close(self) -> Result<()> {
        self.flush()?;
        self.wal.lock().sync()?;

        tracing::trace!(path = %self.data_dir.display(), "engine closed");
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Get the storage directory path (where SSTables are stored)
    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// Get the current memtable size
    pub fn memtable_size(&self) -> usize {
        self.memtable.size()
    }

    /// Get the memtable entry count
    pub fn memtable_entry_count(&self) -> usize {
        self.memtable.entry_count()
    }

    /// Get the number of SSTables
    pub fn sstable_count(&self) -> usize {
        self.storage.sstable_count()
    }
}
