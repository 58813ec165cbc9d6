//! Block Module
//!
//! Sealed, immutable block files and the types describing them.
//!
//! ## Responsibilities
//! - Seal buffered objects into one file (`BlockBuilder`)
//! - Point lookup through a sparse record index and a bloom filter
//! - Full sequential scan with an iterator-owned file handle
//! - Lifecycle: write-completion signal, export descriptor, clear
//!
//! ## File Layout
//! ```text
//! {dir}/{blockID}:{tenantID}
//! ┌──────────────────────────────┐  ◄── Record { id: "c", start: 0,  length: n0 }
//! │ Chunk 0: objects "a" .. "c"  │
//! ├──────────────────────────────┤  ◄── Record { id: "k", start: n0, length: n1 }
//! │ Chunk 1: objects "d" .. "k"  │
//! ├──────────────────────────────┤
//! │ ...                          │
//! └──────────────────────────────┘
//! ```
//! Chunks are codec object streams written back to back in ascending id
//! order. There is no header or footer; the index lives in memory.

mod builder;
mod iterator;
mod meta;
mod record;
mod replay;
mod sealed;

use std::path::{Path, PathBuf};

pub use builder::BlockBuilder;
pub use iterator::BlockIterator;
pub use meta::{BlockId, BlockMeta, META_VERSION};
pub use record::{Record, RecordIndex};
pub use replay::{CompleteBlock, RecoveredBlock, ReplayBlock};
pub use sealed::{BlockDescriptor, SealedBlock};

use crate::error::Result;
use crate::TraceWalError;

/// Separator between block id and tenant id in a block file name
pub const FILENAME_SEPARATOR: char = ':';

/// Path of a block file: `{dir}/{blockID}:{tenantID}`
pub fn block_filename(dir: &Path, block_id: &BlockId, tenant_id: &str) -> PathBuf {
    dir.join(format!("{}{}{}", block_id, FILENAME_SEPARATOR, tenant_id))
}

/// Check that a tenant id yields a block file name `parse_block_filename`
/// accepts and that stays inside the block directory
pub fn validate_tenant_id(tenant_id: &str) -> Result<()> {
    if tenant_id.is_empty() {
        return Err(TraceWalError::InvalidBlockName("empty tenant id".to_string()));
    }

    if tenant_id.contains(&['/', '\\', '\0'][..]) {
        return Err(TraceWalError::InvalidBlockName(format!(
            "tenant id {:?} contains a path separator or NUL",
            tenant_id
        )));
    }

    Ok(())
}

/// Parse a block file name back into (block id, tenant id)
///
/// "7f3c0e4a-1b2d-4c5e-8f90-a1b2c3d4e5f6:tenant-a" → (id, "tenant-a")
pub fn parse_block_filename(name: &str) -> Result<(BlockId, String)> {
    let (block_id, tenant_id) = name.split_once(FILENAME_SEPARATOR).ok_or_else(|| {
        TraceWalError::InvalidBlockName(format!("missing '{}' in {:?}", FILENAME_SEPARATOR, name))
    })?;

    if tenant_id.is_empty() {
        return Err(TraceWalError::InvalidBlockName(format!(
            "empty tenant id in {:?}",
            name
        )));
    }

    Ok((block_id.parse()?, tenant_id.to_string()))
}
