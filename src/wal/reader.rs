//! WAL Reader
//!
//! Handles reading entries from the WAL file.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::{ReconcileError, Result};

use super::{WalEntry, HEADER_SIZE};

/// Reads entries from the WAL file in append order
pub struct WalReader {
    reader: BufReader<File>,
    /// Offset just past the last entry returned successfully
    position: u64,
    /// File length at open time
    file_len: u64,
}

impl WalReader {
    /// Open a WAL file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let file_len = file.metadata()?.len();

        Ok(Self {
            reader: BufReader::new(file),
            position: 0,
            file_len,
        })
    }

    /// Read the next entry from the WAL
    ///
    /// Returns `Ok(None)` at a clean end of file. A torn or damaged record
    /// yields `WalCorruption`; `position()` still points at its start.
    pub fn next_entry(&mut self) -> Result<Option<WalEntry>> {
        if self.position >= self.file_len {
            return Ok(None);
        }

        let mut header = [0u8; HEADER_SIZE];
        let read = read_fully(&mut self.reader, &mut header)?;
        if read < HEADER_SIZE {
            return Err(ReconcileError::WalCorruption(format!(
                "partial header at offset {} ({} of {} bytes)",
                self.position, read, HEADER_SIZE
            )));
        }

        let lsn = u64::from_le_bytes(header[0..8].try_into().unwrap());
        let crc = u32::from_le_bytes(header[8..12].try_into().unwrap());
        let len = u32::from_le_bytes(header[12..16].try_into().unwrap()) as u64;

        // Checked against the file length so a garbage length never drives an allocation
        let record_end = self.position + HEADER_SIZE as u64 + len;
        if record_end > self.file_len {
            return Err(ReconcileError::WalCorruption(format!(
                "record at offset {} claims {} bytes past end of file",
                self.position,
                record_end - self.file_len
            )));
        }

        let mut payload = vec![0u8; len as usize];
        let read = read_fully(&mut self.reader, &mut payload)?;
        if read < payload.len() {
            return Err(ReconcileError::WalCorruption(format!(
                "partial record at offset {}",
                self.position
            )));
        }

        let entry = WalEntry::from_payload(lsn, crc, &payload)?;
        self.position = record_end;

        Ok(Some(entry))
    }

    /// Offset just past the last valid entry read so far
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Iterate over all valid entries
    pub fn entries(self) -> WalIterator {
        WalIterator {
            reader: self,
            done: false,
        }
    }
}

/// Iterator over WAL entries
///
/// Yields at most one error, after which it is exhausted.
pub struct WalIterator {
    reader: WalReader,
    done: bool,
}

impl Iterator for WalIterator {
    type Item = Result<WalEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.reader.next_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Read until `buf` is full or EOF; returns the number of bytes read
fn read_fully(reader: &mut impl Read, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}
