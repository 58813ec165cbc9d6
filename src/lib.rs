//! # tracewal
//!
//! Sealed, file-backed WAL blocks for trace objects:
//! - Objects keyed by byte-string ids, sealed into one immutable file
//! - Point lookup via a sparse, sorted record index
//! - Bloom filter for fast negative lookups
//! - Full sequential scan with an iterator-owned file handle
//! - Replay of blocks left on disk after a restart
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 WAL Block Directory (Wal)                    │
//! │          new_block / seal / replay_blocks                    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌──────────────┐
//!   │BlockBuilder │ ───────► │ SealedBlock  │  CompleteBlock / ReplayBlock
//!   │  (buffer)   │  finish  │ find / iter  │
//!   └─────────────┘          └──────┬───────┘
//!                                   │
//!                 ┌─────────────────┼─────────────────┐
//!                 ▼                 ▼                 ▼
//!          ┌────────────┐   ┌──────────────┐   ┌────────────┐
//!          │ RecordIndex│   │ BloomFilter  │   │   Codec    │
//!          │  (sparse)  │   │ (membership) │   │ (objects)  │
//!          └────────────┘   └──────────────┘   └────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod codec;
pub mod bloom;
pub mod fs;
pub mod block;
pub mod wal;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, TraceWalError};
pub use config::Config;
pub use block::{
    BlockBuilder, BlockDescriptor, BlockId, BlockIterator, BlockMeta, CompleteBlock, Record,
    RecordIndex, RecoveredBlock, ReplayBlock, SealedBlock,
};
pub use bloom::BloomFilter;
pub use wal::Wal;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of tracewal
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
