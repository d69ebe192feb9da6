//! Reconciliation pass
//!
//! Copies keys missing from each destination sub-store out of the source
//! sub-store with the same name. Existing destination values are never
//! overwritten and nothing is deleted, so running the pass again is a no-op.
//!
//! ## Failure policy
//! - Opening, scanning or closing a store aborts the pass. Sub-stores already
//!   processed keep their inserts; there is no rollback.
//! - A failed put skips that key and the pass continues.
//! - Both handles are always closed. When both closes fail the source error is
//!   returned, since the source is closed first.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::directories::DirectoryListing;
use crate::error::{ReconcileError, Result};
use crate::handle::StoreHandle;
use crate::report::{ProgressReporter, ReconcileReport, StoreReport, TracingReporter};

/// Source and destination directories of one common sub-store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPair {
    pub source: PathBuf,
    pub destination: PathBuf,
}

/// Runs reconciliation passes over a pair of store collections
pub struct Reconciler {
    /// Held for the whole of `process`: one pass at a time
    critical_area: Mutex<()>,
    directories: Arc<dyn DirectoryListing>,
    source: Arc<dyn StoreHandle>,
    destination: Arc<dyn StoreHandle>,
    reporter: Arc<dyn ProgressReporter>,
}

/// Builder for [`Reconciler`]; every collaborator but the reporter is required
#[derive(Default)]
pub struct ReconcilerBuilder {
    directories: Option<Arc<dyn DirectoryListing>>,
    source: Option<Arc<dyn StoreHandle>>,
    destination: Option<Arc<dyn StoreHandle>>,
    reporter: Option<Arc<dyn ProgressReporter>>,
}

impl ReconcilerBuilder {
    pub fn directories(mut self, directories: Arc<dyn DirectoryListing>) -> Self {
        self.directories = Some(directories);
        self
    }

    /// Handle used to read every source sub-store
    pub fn source(mut self, handle: Arc<dyn StoreHandle>) -> Self {
        self.source = Some(handle);
        self
    }

    /// Handle used to fill every destination sub-store
    pub fn destination(mut self, handle: Arc<dyn StoreHandle>) -> Self {
        self.destination = Some(handle);
        self
    }

    /// Defaults to [`TracingReporter`]
    pub fn reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn build(self) -> Result<Reconciler> {
        let directories = self
            .directories
            .ok_or(ReconcileError::MissingCollaborator("directories handler"))?;
        let source = self
            .source
            .ok_or(ReconcileError::MissingCollaborator("source store handle"))?;
        let destination = self
            .destination
            .ok_or(ReconcileError::MissingCollaborator("destination store handle"))?;

        Ok(Reconciler {
            critical_area: Mutex::new(()),
            directories,
            source,
            destination,
            reporter: self.reporter.unwrap_or_else(|| Arc::new(TracingReporter)),
        })
    }
}

impl Reconciler {
    pub fn builder() -> ReconcilerBuilder {
        ReconcilerBuilder::default()
    }

    /// Run one full pass over every common sub-store, in name order
    pub fn process(&self) -> Result<ReconcileReport> {
        let _guard = self.critical_area.lock();

        let common = self.common_stores();
        let names: Vec<String> = common
            .keys()
            .map(|name| name.to_string_lossy().into_owned())
            .collect();
        self.reporter.common_stores(&names);

        let total = common.len();
        let mut report = ReconcileReport::default();
        for (position, (pair, name)) in common.values().zip(&names).enumerate() {
            self.reporter.store_started(name, position + 1, total);

            let store_report = self.process_store(name, pair)?;

            self.reporter.store_finished(&store_report);
            report.stores.push(store_report);
        }

        Ok(report)
    }

    /// Sub-stores present in both collections, matched byte-exactly by final
    /// path segment
    pub fn common_stores(&self) -> BTreeMap<OsString, PathPair> {
        let source = by_name(self.directories.source_directories());
        let mut destination = by_name(self.directories.destination_directories());

        source
            .into_iter()
            .filter_map(|(name, source)| {
                let destination = destination.remove(&name)?;
                Some((
                    name,
                    PathPair {
                        source,
                        destination,
                    },
                ))
            })
            .collect()
    }

    fn process_store(&self, name: &str, pair: &PathPair) -> Result<StoreReport> {
        self.source.open(&pair.source)?;

        if let Err(e) = self.destination.open(&pair.destination) {
            if let Err(close_err) = self.source.close() {
                tracing::warn!(
                    path = %pair.source.display(),
                    error = %close_err,
                    "closing source store after failed destination open"
                );
            }
            return Err(e);
        }

        let mut report = StoreReport::new(name);
        let scanned = self.source.range_keys(&mut |key: &[u8], value: &[u8]| -> bool {
            self.copy_if_missing(&pair.destination, key, value, &mut report);
            true
        });

        let source_closed = self.source.close();
        let destination_closed = self.destination.close();

        scanned?;
        source_closed?;
        destination_closed?;

        Ok(report)
    }

    fn copy_if_missing(&self, destination: &Path, key: &[u8], value: &[u8], report: &mut StoreReport) {
        match self.destination.get(key) {
            Ok(Some(_)) => return,
            Ok(None) => {}
            // An unreadable key counts as missing
            Err(e) => tracing::debug!(
                dest = %destination.display(),
                key = %key.escape_ascii(),
                error = %e,
                "destination read failed"
            ),
        }

        match self.destination.put(key, value) {
            Ok(()) => report.inserted += 1,
            Err(e) => {
                self.reporter.put_failed(destination, key, &e);
                report.skipped += 1;
            }
        }
    }
}

/// Map of final path segment → path. Paths without a final segment are ignored.
fn by_name(dirs: &[PathBuf]) -> BTreeMap<OsString, PathBuf> {
    dirs.iter()
        .filter_map(|dir| Some((dir.file_name()?.to_os_string(), dir.clone())))
        .collect()
}
