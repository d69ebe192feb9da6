//! Store Handle
//!
//! A reopenable handle over one on-disk store. The reconciliation pass keeps
//! one handle per side and points it at each sub-store in turn.
//!
//! ## Lifecycle
//! ```text
//!   Closed ──open(path)──▶ Open ──close()──▶ Closed
//! ```
//! `get`/`put` on a closed handle fail with `NotOpen`, `range_keys` is a
//! no-op, and `close` of a closed handle does nothing.

use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use crate::config::StoreOptions;
use crate::engine::Engine;
use crate::error::{ReconcileError, Result};

/// Capabilities the reconciliation pass needs from a store
pub trait StoreHandle: Send + Sync {
    /// Open the store at `path`; fails with `AlreadyOpen` if a store is open
    fn open(&self, path: &Path) -> Result<()>;

    /// Look up a key; `Ok(None)` means not found
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Insert or overwrite a key
    fn put(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Call `visit` for every entry until it returns false
    fn range_keys(&self, visit: &mut dyn FnMut(&[u8], &[u8]) -> bool) -> Result<()>;

    /// Release the open store, if any. The handle is closed afterwards even
    /// when the underlying close reports an error.
    fn close(&self) -> Result<()>;

    fn is_open(&self) -> bool;
}

struct OpenStore {
    path: PathBuf,
    engine: Engine,
}

/// Store handle backed by [`Engine`]
///
/// ## Concurrency
/// `get` and `range_keys` share the state lock; `put`, `open` and `close`
/// take it exclusively.
pub struct DiskStoreHandle {
    options: StoreOptions,
    state: RwLock<Option<OpenStore>>,
}

impl DiskStoreHandle {
    /// Create a closed handle that opens stores with `options`
    pub fn new(options: StoreOptions) -> Self {
        Self {
            options,
            state: RwLock::new(None),
        }
    }

    /// Path of the open store, if any
    pub fn path(&self) -> Option<PathBuf> {
        self.state.read().as_ref().map(|store| store.path.clone())
    }
}

impl Default for DiskStoreHandle {
    fn default() -> Self {
        Self::new(StoreOptions::default())
    }
}

impl StoreHandle for DiskStoreHandle {
    fn open(&self, path: &Path) -> Result<()> {
        let mut state = self.state.write();

        if let Some(store) = state.as_ref() {
            return Err(ReconcileError::AlreadyOpen {
                path: store.path.clone(),
            });
        }

        let engine = Engine::open(path, self.options).map_err(|e| ReconcileError::Open {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;

        tracing::debug!(path = %path.display(), "store opened");
        *state = Some(OpenStore {
            path: path.to_path_buf(),
            engine,
        });

        Ok(())
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let state = self.state.read();
        let store = state.as_ref().ok_or(ReconcileError::NotOpen)?;
        store.engine.get(key)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let state = self.state.write();
        let store = state.as_ref().ok_or(ReconcileError::NotOpen)?;

        store.engine.put(key, value).map_err(|e| ReconcileError::Write {
            path: store.path.clone(),
            source: Box::new(e),
        })
    }

    fn range_keys(&self, visit: &mut dyn FnMut(&[u8], &[u8]) -> bool) -> Result<()> {
        let state = self.state.read();
        match state.as_ref() {
            Some(store) => store.engine.for_each(visit),
            None => Ok(()),
        }
    }

    fn close(&self) -> Result<()> {
        // Detach first so the handle is closed whatever the engine reports
        let Some(store) = self.state.write().take() else {
            return Ok(());
        };

        let OpenStore { path, engine } = store;
        engine.close().map_err(|e| ReconcileError::Close {
            path: path.clone(),
            source: Box::new(e),
        })?;

        tracing::debug!(path = %path.display(), "store closed");
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.state.read().is_some()
    }
}
