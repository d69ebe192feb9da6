//! Merged key scan
//!
//! Combines several sorted entry sources into one ascending stream where each
//! key appears once. Sources are ranked by position: index 0 is the newest,
//! and its version of a key shadows every older source's.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::error::Result;

/// A sorted source of `(key, value)` entries
pub type EntrySource<'a> = Box<dyn Iterator<Item = Result<(Vec<u8>, Vec<u8>)>> + 'a>;

#[derive(Debug)]
struct HeapEntry {
    key: Vec<u8>,
    value: Vec<u8>,
    source_idx: usize,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.source_idx == other.source_idx
    }
}

impl Eq for HeapEntry {}

impl Ord for HeapEntry {
    // BinaryHeap is a max-heap: smallest key first, then newest source first
    fn cmp(&self, other: &Self) -> Ordering {
        match self.key.cmp(&other.key) {
            Ordering::Less => Ordering::Greater,
            Ordering::Greater => Ordering::Less,
            Ordering::Equal => other.source_idx.cmp(&self.source_idx),
        }
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// K-way merge over sorted sources, newest version of each key wins
pub struct MergingIterator<'a> {
    sources: Vec<EntrySource<'a>>,
    heap: BinaryHeap<HeapEntry>,
    /// Deferred source error, surfaced on the next call
    pending_error: Option<crate::error::ReconcileError>,
    primed: bool,
}

impl<'a> MergingIterator<'a> {
    /// Create a merge over `sources`, ordered newest → oldest
    pub fn new(sources: Vec<EntrySource<'a>>) -> Self {
        Self {
            sources,
            heap: BinaryHeap::new(),
            pending_error: None,
            primed: false,
        }
    }

    fn advance(&mut self, source_idx: usize) {
        match self.sources[source_idx].next() {
            Some(Ok((key, value))) => self.heap.push(HeapEntry {
                key,
                value,
                source_idx,
            }),
            Some(Err(e)) => {
                if self.pending_error.is_none() {
                    self.pending_error = Some(e);
                }
            }
            None => {}
        }
    }
}

impl<'a> Iterator for MergingIterator<'a> {
    type Item = Result<(Vec<u8>, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.primed {
            self.primed = true;
            for idx in 0..self.sources.len() {
                self.advance(idx);
            }
        }

        if let Some(e) = self.pending_error.take() {
            self.heap.clear();
            self.sources.clear();
            return Some(Err(e));
        }

        let winner = self.heap.pop()?;
        self.advance(winner.source_idx);

        // Drop older versions of the same key
        while self
            .heap
            .peek()
            .map(|top| top.key == winner.key)
            .unwrap_or(false)
        {
            if let Some(shadowed) = self.heap.pop() {
                self.advance(shadowed.source_idx);
            }
        }

        Some(Ok((winner.key, winner.value)))
    }
}
