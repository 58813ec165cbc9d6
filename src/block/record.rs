//! Record index
//!
//! Sparse index over the chunks of a block file: one record per chunk.

use serde::{Deserialize, Serialize};

/// Location of one encoded chunk within a block file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Representative id: the largest object id in the chunk
    pub id: Vec<u8>,
    /// Byte offset of the chunk
    pub start: u64,
    /// Byte length of the chunk
    pub length: u64,
}

impl Record {
    pub fn new(id: impl Into<Vec<u8>>, start: u64, length: u64) -> Self {
        Self {
            id: id.into(),
            start,
            length,
        }
    }

    /// One past the last byte of the chunk
    pub fn end(&self) -> u64 {
        self.start + self.length
    }
}

/// Records sorted ascending by id (lexicographic byte order)
///
/// Sorted once at construction and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordIndex {
    records: Vec<Record>,
}

impl RecordIndex {
    /// Build an index, sorting the records by id
    pub fn new(mut records: Vec<Record>) -> Self {
        records.sort_by(|a, b| a.id.cmp(&b.id));
        Self { records }
    }

    /// Leftmost record whose id is >= `id`, or `None` if `id` is greater
    /// than every indexed id
    pub fn lower_bound(&self, id: &[u8]) -> Option<&Record> {
        let i = self.records.partition_point(|r| r.id.as_slice() < id);
        self.records.get(i)
    }

    /// True if no two records share any byte
    pub fn ranges_disjoint(&self) -> bool {
        let mut ranges: Vec<(u64, u64)> =
            self.records.iter().map(|r| (r.start, r.end())).collect();
        ranges.sort_unstable();
        ranges.windows(2).all(|w| w[0].1 <= w[1].0)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
