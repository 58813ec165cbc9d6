//! Block Iterator
//!
//! Full sequential scan over a block file.

use std::fs::File;
use std::io::BufReader;

use crate::codec::ObjectReader;
use crate::error::Result;

/// Single-pass iterator over every object in a block, in write order
///
/// Owns its own file handle, separate from the block's cached lookup handle.
/// The handle stays open while the iterator is being consumed and is closed
/// as soon as the stream ends, an error is yielded, or the iterator is
/// dropped.
pub struct BlockIterator {
    reader: Option<ObjectReader<BufReader<File>>>,
}

impl BlockIterator {
    pub(crate) fn new(file: File) -> Self {
        Self {
            reader: Some(ObjectReader::new(BufReader::new(file))),
        }
    }

    /// True while the underlying file handle is still held
    pub fn is_open(&self) -> bool {
        self.reader.is_some()
    }
}

impl Iterator for BlockIterator {
    /// (id, payload)
    type Item = Result<(Vec<u8>, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        let reader = self.reader.as_mut()?;

        match reader.next() {
            Some(Ok(object)) => Some(Ok(object)),
            Some(Err(e)) => {
                self.reader = None;
                Some(Err(e))
            }
            None => {
                self.reader = None;
                None
            }
        }
    }
}

impl std::iter::FusedIterator for BlockIterator {}
