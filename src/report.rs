//! Progress reporting
//!
//! The reconciliation pass reports through an injected [`ProgressReporter`]
//! instead of a global logger. [`TracingReporter`] is the default.

use std::path::Path;

use crate::error::ReconcileError;

/// Outcome of reconciling one sub-store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreReport {
    /// Sub-store name (final path segment)
    pub name: String,
    /// Keys copied into the destination
    pub inserted: u64,
    /// Keys whose destination write failed
    pub skipped: u64,
}

impl StoreReport {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inserted: 0,
            skipped: 0,
        }
    }
}

/// Outcome of a whole reconciliation pass, one entry per common sub-store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub stores: Vec<StoreReport>,
}

impl ReconcileReport {
    pub fn total_inserted(&self) -> u64 {
        self.stores.iter().map(|s| s.inserted).sum()
    }

    pub fn total_skipped(&self) -> u64 {
        self.stores.iter().map(|s| s.skipped).sum()
    }

    /// Report for the sub-store called `name`
    pub fn store(&self, name: &str) -> Option<&StoreReport> {
        self.stores.iter().find(|s| s.name == name)
    }
}

/// Receives progress events from a reconciliation pass
pub trait ProgressReporter: Send + Sync {
    /// The common sub-store names, in processing order
    fn common_stores(&self, names: &[String]);

    /// A sub-store is about to be processed (`position` is 1-based)
    fn store_started(&self, name: &str, position: usize, total: usize);

    fn store_finished(&self, report: &StoreReport);

    /// A single destination write failed; the pass continues
    fn put_failed(&self, destination: &Path, key: &[u8], error: &ReconcileError);
}

/// Reports progress as `tracing` events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ProgressReporter for TracingReporter {
    fn common_stores(&self, names: &[String]) {
        tracing::info!(
            sub_directories = %names.join(", "),
            "common directories between the source and destination parent paths"
        );
    }

    fn store_started(&self, name: &str, position: usize, total: usize) {
        tracing::info!(name, progress = %format!("{}/{}", position, total), "processing sub-directory");
    }

    fn store_finished(&self, report: &StoreReport) {
        tracing::info!(
            name = %report.name,
            inserted = report.inserted,
            skipped = report.skipped,
            "sub-directory processed"
        );
    }

    fn put_failed(&self, destination: &Path, key: &[u8], error: &ReconcileError) {
        tracing::error!(
            dest = %destination.display(),
            key = %key.escape_ascii(),
            %error,
            "put into destination store failed"
        );
    }
}
