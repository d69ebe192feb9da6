//! Configuration for kvreconcile
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{ReconcileError, Result};

/// Main configuration for a reconciliation run
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Collection Configuration
    // -------------------------------------------------------------------------
    /// Parent directory of the source sub-stores (read only)
    /// Internal structure:
    ///   {source_dir}/
    ///     ├── A/               (one store per sub-directory)
    ///     └── B/
    pub source_dir: PathBuf,

    /// Parent directory of the destination sub-stores (missing keys land here)
    pub destination_dir: PathBuf,

    // -------------------------------------------------------------------------
    // Store Configuration
    // -------------------------------------------------------------------------
    /// Options applied to every sub-store opened during the run
    pub store: StoreOptions,
}

/// Options for a single on-disk store
#[derive(Debug, Clone, Copy)]
pub struct StoreOptions {
    /// Sync strategy: how often to fsync WAL
    pub wal_sync_strategy: WalSyncStrategy,

    /// Max size of memtable before flush (in bytes)
    pub memtable_size_limit: usize,
}

/// WAL sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalSyncStrategy {
    /// fsync after every write (safest, slowest)
    EveryWrite,

    /// fsync after N uncommitted entries (balanced durability/performance)
    EveryNEntries { count: usize },
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            wal_sync_strategy: WalSyncStrategy::EveryNEntries { count: 100 },
            memtable_size_limit: 64 * 1024 * 1024, // 64 MB
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("source"),
            destination_dir: PathBuf::from("destination"),
            store: StoreOptions::default(),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
    memtable_mb: Option<usize>,
}

impl ConfigBuilder {
    /// Set the source parent directory
    pub fn source_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.source_dir = path.into();
        self
    }

    /// Set the destination parent directory
    pub fn destination_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.destination_dir = path.into();
        self
    }

    /// Set the WAL sync strategy
    pub fn wal_sync_strategy(mut self, strategy: WalSyncStrategy) -> Self {
        self.config.store.wal_sync_strategy = strategy;
        self
    }

    /// Set the memtable size limit (in bytes)
    pub fn memtable_size_limit(mut self, size: usize) -> Self {
        self.config.store.memtable_size_limit = size;
        self
    }

    /// Set the memtable size limit in megabytes; overrides `memtable_size_limit`
    pub fn memtable_size_mb(mut self, mb: usize) -> Self {
        self.memtable_mb = Some(mb);
        self
    }

    /// Validate and build the config
    pub fn build(mut self) -> Result<Config> {
        if let Some(mb) = self.memtable_mb {
            self.config.store.memtable_size_limit = mb.checked_mul(1024 * 1024).ok_or_else(|| {
                ReconcileError::Config(format!("memtable size of {} MB is too large", mb))
            })?;
        }

        let store = &self.config.store;
        if store.memtable_size_limit == 0 {
            return Err(ReconcileError::Config(
                "memtable size limit must be greater than zero".to_string(),
            ));
        }
        if let WalSyncStrategy::EveryNEntries { count: 0 } = store.wal_sync_strategy {
            return Err(ReconcileError::Config(
                "WAL sync interval must be at least one entry".to_string(),
            ));
        }

        Ok(self.config)
    }
}
