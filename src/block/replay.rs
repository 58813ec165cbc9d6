//! Block capability views
//!
//! `ReplayBlock` is what recovery needs: stream the contents, know the
//! tenant, delete the file. `CompleteBlock` adds lookup and the metadata
//! needed to ship a block. Both are views over concrete block types.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::Mutex;
use tracing::debug;

use crate::bloom::BloomFilter;
use crate::error::Result;
use crate::fs::BlockFs;
use crate::TraceWalError;

use super::iterator::BlockIterator;
use super::meta::{BlockId, BlockMeta};
use super::sealed::{BlockDescriptor, SealedBlock};
use super::block_filename;

/// Scan, tenant identity and deletion
pub trait ReplayBlock: Send + Sync {
    /// Stream every object in write order
    fn iter(&self) -> Result<BlockIterator>;

    fn tenant_id(&self) -> &str;

    /// Delete the block's backing file
    fn clear(&self) -> Result<()>;
}

/// The full capability set of a sealed block
pub trait CompleteBlock: ReplayBlock {
    fn find(&self, id: &[u8]) -> Result<Option<Vec<u8>>>;

    fn time_written(&self) -> SystemTime;

    fn meta(&self) -> &BlockMeta;

    fn bloom_filter(&self) -> &BloomFilter;

    fn block_wrote_successfully(&self, t: SystemTime);

    fn write_info(&self) -> BlockDescriptor<'_>;
}

impl ReplayBlock for SealedBlock {
    fn iter(&self) -> Result<BlockIterator> {
        SealedBlock::iter(self)
    }

    fn tenant_id(&self) -> &str {
        SealedBlock::tenant_id(self)
    }

    fn clear(&self) -> Result<()> {
        SealedBlock::clear(self)
    }
}

impl CompleteBlock for SealedBlock {
    fn find(&self, id: &[u8]) -> Result<Option<Vec<u8>>> {
        SealedBlock::find(self, id)
    }

    fn time_written(&self) -> SystemTime {
        SealedBlock::time_written(self)
    }

    fn meta(&self) -> &BlockMeta {
        SealedBlock::meta(self)
    }

    fn bloom_filter(&self) -> &BloomFilter {
        SealedBlock::bloom_filter(self)
    }

    fn block_wrote_successfully(&self, t: SystemTime) {
        SealedBlock::block_wrote_successfully(self, t)
    }

    fn write_info(&self) -> BlockDescriptor<'_> {
        SealedBlock::write_info(self)
    }
}

/// A block file found on disk at startup
///
/// Only the file name survives a restart, so the index and filter are gone:
/// the block can be replayed and cleared, not queried.
pub struct RecoveredBlock {
    block_id: BlockId,
    tenant_id: String,
    dir: PathBuf,
    cleared: Mutex<bool>,
    fs: Arc<dyn BlockFs>,
}

impl RecoveredBlock {
    pub(crate) fn new(
        block_id: BlockId,
        tenant_id: String,
        dir: impl Into<PathBuf>,
        fs: Arc<dyn BlockFs>,
    ) -> Self {
        Self {
            block_id,
            tenant_id,
            dir: dir.into(),
            cleared: Mutex::new(false),
            fs,
        }
    }

    pub fn block_id(&self) -> BlockId {
        self.block_id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `{dir}/{blockID}:{tenantID}`
    pub fn full_filename(&self) -> PathBuf {
        block_filename(&self.dir, &self.block_id, &self.tenant_id)
    }

    fn cleared_error(&self) -> TraceWalError {
        TraceWalError::BlockCleared(format!("{}:{}", self.block_id, self.tenant_id))
    }
}

impl ReplayBlock for RecoveredBlock {
    fn iter(&self) -> Result<BlockIterator> {
        if *self.cleared.lock() {
            return Err(self.cleared_error());
        }

        let file = self.fs.open(&self.full_filename())?;
        Ok(BlockIterator::new(file))
    }

    fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    fn clear(&self) -> Result<()> {
        let mut cleared = self.cleared.lock();
        if *cleared {
            return Err(self.cleared_error());
        }

        let path = self.full_filename();
        self.fs.remove(&path)?;
        *cleared = true;

        debug!(block_id = %self.block_id, path = %path.display(), "cleared recovered block");
        Ok(())
    }
}

impl std::fmt::Debug for RecoveredBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecoveredBlock")
            .field("block_id", &self.block_id)
            .field("tenant_id", &self.tenant_id)
            .field("dir", &self.dir)
            .finish()
    }
}
