//! # kvreconcile
//!
//! Fills destination key-value stores with the keys they are missing from
//! same-named source stores:
//! - Sub-stores are matched by directory name under two parent directories
//! - Only absent keys are written; existing destination values are kept
//! - Nothing is ever deleted, so a second pass inserts nothing
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Reconciler                            │
//! │        (one pass at a time, one sub-store at a time)         │
//! └──────────┬──────────────────────────────────┬───────────────┘
//!            │                                  │
//!            ▼                                  ▼
//!   ┌──────────────────┐              ┌──────────────────┐
//!   │ DirectoryListing │              │   StoreHandle    │
//!   │ (sub-dir names)  │              │ (src + dest)     │
//!   └──────────────────┘              └────────┬─────────┘
//!                                              │
//!                                              ▼
//!                                     ┌──────────────────┐
//!                                     │      Engine      │
//!                                     │ WAL + MemTable + │
//!                                     │    SSTables      │
//!                                     └──────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod wal;
pub mod memtable;
pub mod storage;
pub mod engine;

pub mod handle;
pub mod directories;
pub mod report;
pub mod reconcile;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ReconcileError, Result};
pub use config::{Config, StoreOptions};
pub use engine::Engine;
pub use handle::{DiskStoreHandle, StoreHandle};
pub use directories::{DirectoriesHandler, DirectoryListing};
pub use report::{ProgressReporter, ReconcileReport, StoreReport, TracingReporter};
pub use reconcile::{PathPair, Reconciler};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of kvreconcile
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
