//! Block metadata
//!
//! Block identifiers and the summary fields attached to every sealed block.

use std::fmt;
use std::str::FromStr;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::TraceWalError;

/// Current block metadata format version
pub const META_VERSION: u16 = 1;

/// 128-bit block identifier, displayed in hyphenated UUID layout
///
/// `7f3c0e4a-1b2d-4c5e-8f90-a1b2c3d4e5f6`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockId(u128);

impl BlockId {
    /// Generate a random (version 4 layout) identifier
    pub fn random() -> Self {
        let raw: u128 = rand::random();
        // version nibble = 4, variant bits = 10
        let raw = (raw & !(0xF_u128 << 76)) | (0x4_u128 << 76);
        let raw = (raw & !(0x3_u128 << 62)) | (0x2_u128 << 62);
        Self(raw)
    }

    pub const fn from_u128(raw: u128) -> Self {
        Self(raw)
    }

    pub const fn as_u128(&self) -> u128 {
        self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.0;
        write!(
            f,
            "{:08x}-{:04x}-{:04x}-{:04x}-{:012x}",
            (v >> 96) as u32,
            (v >> 80) as u16,
            (v >> 64) as u16,
            (v >> 48) as u16,
            (v & 0xFFFF_FFFF_FFFF) as u64
        )
    }
}

impl FromStr for BlockId {
    type Err = TraceWalError;

    fn from_str(s: &str) -> Result<Self> {
        let groups: Vec<&str> = s.split('-').collect();
        let lengths: Vec<usize> = groups.iter().map(|g| g.len()).collect();
        if lengths != [8, 4, 4, 4, 12] {
            return Err(TraceWalError::InvalidBlockName(format!(
                "block id must be 8-4-4-4-12 hex groups, got {:?}",
                s
            )));
        }

        let hex: String = groups.concat();
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(TraceWalError::InvalidBlockName(format!(
                "block id contains non-hex characters: {:?}",
                s
            )));
        }

        u128::from_str_radix(&hex, 16)
            .map(Self)
            .map_err(|e| TraceWalError::InvalidBlockName(format!("{}: {}", s, e)))
    }
}

/// Summary of a sealed block; immutable once the block is sealed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockMeta {
    pub version: u16,
    pub block_id: BlockId,
    pub tenant_id: String,
    /// Smallest object id in the block
    pub min_id: Vec<u8>,
    /// Largest object id in the block
    pub max_id: Vec<u8>,
    pub start_time: SystemTime,
    pub end_time: SystemTime,
    pub total_objects: u64,
}

impl BlockMeta {
    /// Metadata with no objects and zero times
    pub fn new(block_id: BlockId, tenant_id: impl Into<String>) -> Self {
        Self {
            version: META_VERSION,
            block_id,
            tenant_id: tenant_id.into(),
            min_id: Vec::new(),
            max_id: Vec::new(),
            start_time: SystemTime::UNIX_EPOCH,
            end_time: SystemTime::UNIX_EPOCH,
            total_objects: 0,
        }
    }

    /// Encode for shipping alongside the block
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode metadata produced by `to_bytes`
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(data)?)
    }
}
