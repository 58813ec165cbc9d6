//! WAL Block Directory
//!
//! Owns the directory sealed blocks are written to.
//!
//! ## Responsibilities
//! - Create the block directory on open
//! - Hand out builders that seal buffered objects into blocks
//! - Rediscover block files left on disk after a restart, for replay
//!
//! ## Directory Layout
//! ```text
//! {data_dir}/
//!   └── blocks/
//!         ├── {blockID}:{tenantID}
//!         └── {blockID}:{tenantID}
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::block::{parse_block_filename, BlockBuilder, RecoveredBlock, SealedBlock};
use crate::config::Config;
use crate::error::Result;
use crate::fs::{BlockFs, LocalFs};

/// The block directory of a write-ahead log
pub struct Wal {
    config: Config,
    blocks_dir: PathBuf,
    fs: Arc<dyn BlockFs>,
}

impl Wal {
    const BLOCKS_DIR: &'static str = "blocks";

    /// Open or create the block directory under `config.data_dir`
    pub fn open(config: Config) -> Result<Self> {
        Self::with_fs(config, Arc::new(LocalFs))
    }

    /// Like `open`, with blocks reading and deleting through `fs`
    pub fn with_fs(config: Config, fs: Arc<dyn BlockFs>) -> Result<Self> {
        config.validate()?;

        let blocks_dir = config.data_dir.join(Self::BLOCKS_DIR);
        fs::create_dir_all(&blocks_dir)?;

        info!(path = %blocks_dir.display(), "opened wal block directory");

        Ok(Self {
            config,
            blocks_dir,
            fs,
        })
    }

    /// Start a new block for `tenant_id`
    pub fn new_block(&self, tenant_id: impl Into<String>) -> BlockBuilder {
        BlockBuilder::new(&self.blocks_dir, tenant_id, &self.config)
    }

    /// Seal a batch of objects into a new block
    pub fn seal<I>(&self, tenant_id: impl Into<String>, objects: I) -> Result<SealedBlock>
    where
        I: IntoIterator<Item = (Vec<u8>, Vec<u8>)>,
    {
        let mut builder = self.new_block(tenant_id);
        for (id, payload) in objects {
            builder.add(&id, &payload);
        }
        builder.finish_with_fs(Arc::clone(&self.fs))
    }

    /// Find every block file in the directory, ordered by file name
    ///
    /// Entries whose names are not `{blockID}:{tenantID}` are skipped.
    pub fn replay_blocks(&self) -> Result<Vec<RecoveredBlock>> {
        let mut names = Vec::new();

        for entry in fs::read_dir(&self.blocks_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }

            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(name) => warn!(name = ?name, "skipping non-utf8 file in block directory"),
            }
        }

        names.sort();

        let mut blocks = Vec::with_capacity(names.len());
        for name in names {
            match parse_block_filename(&name) {
                Ok((block_id, tenant_id)) => blocks.push(RecoveredBlock::new(
                    block_id,
                    tenant_id,
                    &self.blocks_dir,
                    Arc::clone(&self.fs),
                )),
                Err(e) => warn!(name = %name, error = %e, "skipping unrecognized file in block directory"),
            }
        }

        info!(blocks = blocks.len(), path = %self.blocks_dir.display(), "discovered blocks for replay");
        Ok(blocks)
    }

    /// Directory holding the block files
    pub fn blocks_dir(&self) -> &Path {
        &self.blocks_dir
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
