//! Error types for kvreconcile
//!
//! Provides a unified error type for the storage engine, the store handles
//! and the reconciliation pass.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using ReconcileError
pub type Result<T> = std::result::Result<T, ReconcileError>;

/// Unified error type for kvreconcile operations
#[derive(Debug, Error)]
pub enum ReconcileError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // WAL Errors
    // -------------------------------------------------------------------------
    #[error("WAL corruption detected: {0}")]
    WalCorruption(String),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Storage error: {0}")]
    Storage(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("missing required collaborator: {0}")]
    MissingCollaborator(&'static str),

    // -------------------------------------------------------------------------
    // Directory Errors
    // -------------------------------------------------------------------------
    #[error("cannot list directory {}: {source}", path.display())]
    PathUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // Store Handle Errors
    // -------------------------------------------------------------------------
    #[error("store is already open at {}", path.display())]
    AlreadyOpen { path: PathBuf },

    #[error("store is not open")]
    NotOpen,

    #[error("failed to open store at {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: Box<ReconcileError>,
    },

    #[error("failed to write to store at {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: Box<ReconcileError>,
    },

    #[error("failed to close store at {}: {source}", path.display())]
    Close {
        path: PathBuf,
        #[source]
        source: Box<ReconcileError>,
    },
}
