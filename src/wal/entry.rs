//! WAL Entry definitions
//!
//! Defines the structure of individual WAL log entries and their framing.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{ReconcileError, Result};

/// Frame header size: LSN (8) + CRC (4) + Len (4)
pub const HEADER_SIZE: usize = 16;

/// A single entry in the WAL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalEntry {
    /// Log Sequence Number - monotonically increasing
    pub lsn: u64,

    /// The operation to perform
    pub operation: Operation,

    /// Timestamp (unix millis) when entry was created
    pub timestamp: u64,
}

/// Operations that can be logged
///
/// Stores are only ever filled, never pruned, so puts are the only mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operation {
    /// Put a key-value pair
    Put { key: Vec<u8>, value: Vec<u8> },
}

impl WalEntry {
    /// Create an entry stamped with the current wall-clock time
    pub fn new(lsn: u64, operation: Operation) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();

        Self {
            lsn,
            operation,
            timestamp,
        }
    }

    /// Encode the entry as a complete frame (header + payload)
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let payload = bincode::serialize(self)
            .map_err(|e| ReconcileError::Serialization(e.to_string()))?;

        let len = u32::try_from(payload.len()).map_err(|_| {
            ReconcileError::Serialization(format!(
                "WAL entry of {} bytes exceeds frame limit",
                payload.len()
            ))
        })?;

        let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len());
        frame.extend_from_slice(&self.lsn.to_le_bytes());
        frame.extend_from_slice(&Self::compute_crc(&payload).to_le_bytes());
        frame.extend_from_slice(&len.to_le_bytes());
        frame.extend_from_slice(&payload);
        Ok(frame)
    }

    /// Decode a payload read from disk, checking it against its frame header
    pub fn from_payload(header_lsn: u64, header_crc: u32, payload: &[u8]) -> Result<Self> {
        let actual_crc = Self::compute_crc(payload);
        if actual_crc != header_crc {
            return Err(ReconcileError::WalCorruption(format!(
                "CRC mismatch for LSN {}: expected {:#010x}, got {:#010x}",
                header_lsn, header_crc, actual_crc
            )));
        }

        let entry: WalEntry = bincode::deserialize(payload)
            .map_err(|e| ReconcileError::WalCorruption(format!("undecodable entry: {}", e)))?;

        if entry.lsn != header_lsn {
            return Err(ReconcileError::WalCorruption(format!(
                "LSN mismatch: header says {}, entry says {}",
                header_lsn, entry.lsn
            )));
        }

        Ok(entry)
    }

    /// CRC32 of a payload
    pub fn compute_crc(payload: &[u8]) -> u32 {
        crc32fast::hash(payload)
    }
}
