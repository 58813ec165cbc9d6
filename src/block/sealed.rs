//! Sealed Block
//!
//! An immutable, file-backed batch of objects with a sparse record index and
//! a bloom filter. Supports point lookup (`find`) and full scan (`iter`).

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::bloom::BloomFilter;
use crate::codec::ObjectReader;
use crate::error::Result;
use crate::fs::{BlockFs, LocalFs};
use crate::TraceWalError;

use super::iterator::BlockIterator;
use super::meta::{BlockId, BlockMeta};
use super::record::{Record, RecordIndex};
use super::block_filename;

/// Everything the remote-persistence side needs to ship a block
///
/// Borrowed from the block: no ownership of the file is transferred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDescriptor<'a> {
    pub block_id: BlockId,
    pub tenant_id: &'a str,
    pub records: &'a [Record],
    pub path: PathBuf,
}

/// The cached random-access handle and the block's cleared state
#[derive(Default)]
struct ReadHandle {
    file: Option<File>,
    cleared: bool,
}

/// A sealed, read-only block
///
/// ## Concurrency:
/// - `meta`, `filter`, `index`: immutable after construction, no locking
/// - `read_file`: Mutex slot; lazy open, every range read and `clear` run
///   under it, so concurrent first lookups open the file exactly once
/// - `time_written`: RwLock, written once by the completion signal
/// - Scans open their own handle and never hold the slot lock while reading
pub struct SealedBlock {
    meta: BlockMeta,
    filter: BloomFilter,
    dir: PathBuf,
    index: RecordIndex,
    time_written: RwLock<SystemTime>,
    read_file: Mutex<ReadHandle>,
    fs: Arc<dyn BlockFs>,
}

impl SealedBlock {
    /// Wrap an already-written block file
    ///
    /// The file `{dir}/{blockID}:{tenantID}` must already hold the chunks the
    /// records describe. Records are sorted by id here.
    pub fn new(
        meta: BlockMeta,
        filter: BloomFilter,
        dir: impl Into<PathBuf>,
        records: Vec<Record>,
    ) -> Self {
        Self::with_fs(meta, filter, dir, records, Arc::new(LocalFs))
    }

    /// Like `new`, reading and deleting through the given file system
    pub fn with_fs(
        meta: BlockMeta,
        filter: BloomFilter,
        dir: impl Into<PathBuf>,
        records: Vec<Record>,
        fs: Arc<dyn BlockFs>,
    ) -> Self {
        let index = RecordIndex::new(records);
        debug_assert!(index.ranges_disjoint(), "block records overlap");

        Self {
            meta,
            filter,
            dir: dir.into(),
            index,
            time_written: RwLock::new(SystemTime::UNIX_EPOCH),
            read_file: Mutex::new(ReadHandle::default()),
            fs,
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Look up one object by id
    ///
    /// Returns:
    /// - `Ok(Some(payload))` — object found
    /// - `Ok(None)` — object not in this block
    /// - `Err(_)` — the chunk could not be read or decoded
    pub fn find(&self, id: &[u8]) -> Result<Option<Vec<u8>>> {
        if !self.filter.test(id) {
            return Ok(None);
        }

        let record = match self.index.lower_bound(id) {
            Some(record) => record,
            None => return Ok(None),
        };

        let chunk = self.read_record_bytes(record)?;

        for object in ObjectReader::new(chunk.as_slice()) {
            let (found_id, payload) = object?;
            if found_id == id {
                return Ok(Some(payload));
            }
        }

        Ok(None)
    }

    /// Scan every object in the block, in write order
    ///
    /// Opens a new handle owned by the returned iterator.
    pub fn iter(&self) -> Result<BlockIterator> {
        if self.read_file.lock().cleared {
            return Err(self.cleared_error());
        }

        let path = self.full_filename();
        let file = self.fs.open(&path)?;
        debug!(block_id = %self.meta.block_id, path = %path.display(), "opened block for scan");

        Ok(BlockIterator::new(file))
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Close the cached handle and delete the backing file
    ///
    /// Callers must not clear a block while lookups or scans are in flight.
    /// Every operation after a successful clear fails with `BlockCleared`.
    pub fn clear(&self) -> Result<()> {
        let mut slot = self.read_file.lock();
        if slot.cleared {
            return Err(self.cleared_error());
        }

        // Dropping the handle closes it
        slot.file = None;

        let path = self.full_filename();
        self.fs.remove(&path)?;
        slot.cleared = true;

        debug!(block_id = %self.meta.block_id, path = %path.display(), "cleared block");
        Ok(())
    }

    /// Record when the block was confirmed persisted by the backend
    pub fn block_wrote_successfully(&self, t: SystemTime) {
        *self.time_written.write() = t;
    }

    /// When the block was confirmed persisted (UNIX epoch if not yet)
    pub fn time_written(&self) -> SystemTime {
        *self.time_written.read()
    }

    /// Block id, tenant, index and file path for the shipping side
    pub fn write_info(&self) -> BlockDescriptor<'_> {
        BlockDescriptor {
            block_id: self.meta.block_id,
            tenant_id: &self.meta.tenant_id,
            records: self.index.records(),
            path: self.full_filename(),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn tenant_id(&self) -> &str {
        &self.meta.tenant_id
    }

    pub fn meta(&self) -> &BlockMeta {
        &self.meta
    }

    pub fn bloom_filter(&self) -> &BloomFilter {
        &self.filter
    }

    pub fn index(&self) -> &RecordIndex {
        &self.index
    }

    /// Directory holding the block file
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `{dir}/{blockID}:{tenantID}`
    pub fn full_filename(&self) -> PathBuf {
        block_filename(&self.dir, &self.meta.block_id, &self.meta.tenant_id)
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Read one chunk through the cached handle, opening it on first use
    fn read_record_bytes(&self, record: &Record) -> Result<Vec<u8>> {
        let mut slot = self.read_file.lock();
        if slot.cleared {
            return Err(self.cleared_error());
        }

        let mut file = match slot.file.take() {
            Some(file) => file,
            None => {
                let path = self.full_filename();
                let file = self.fs.open(&path)?;
                debug!(block_id = %self.meta.block_id, path = %path.display(), "opened block for lookups");
                file
            }
        };

        let result = Self::read_range(&mut file, record);
        slot.file = Some(file);
        result
    }

    fn read_range(file: &mut File, record: &Record) -> Result<Vec<u8>> {
        file.seek(SeekFrom::Start(record.start))?;
        let mut buf = vec![0u8; record.length as usize];
        file.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn cleared_error(&self) -> TraceWalError {
        TraceWalError::BlockCleared(format!("{}:{}", self.meta.block_id, self.meta.tenant_id))
    }
}

impl std::fmt::Debug for SealedBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SealedBlock")
            .field("meta", &self.meta)
            .field("dir", &self.dir)
            .field("records", &self.index.len())
            .finish()
    }
}
