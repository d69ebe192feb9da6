//! Storage Module
//!
//! Persistent storage layer using SSTable-like format.
//!
//! ## Responsibilities
//! - Persist data to disk in sorted format
//! - Point lookups through in-memory indexes
//! - Sorted scans feeding the engine's merged key iteration
//!
//! A store is only ever filled, so the format has no tombstones: every
//! entry in every table is a live value, and the newest table wins.

mod sstable;
mod manager;
mod merge;

pub use sstable::{SSTable, SSTableBuilder, SSTableIterator, SSTableReader};
pub use manager::StorageManager;
pub use merge::{EntrySource, MergingIterator};
