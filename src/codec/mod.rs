//! Object Codec Module
//!
//! Encodes and decodes streams of (identifier, payload) pairs.
//!
//! ## Responsibilities
//! - Frame each object with lengths and a CRC32 checksum
//! - Build chunk buffers for the block builder
//! - Decode a byte range or a whole file back into objects, in write order
//!
//! ## Object Format
//! ```text
//! ┌────────────┬─────────────────┬───────────┬──────┬─────────┐
//! │ IdLen (4)  │ PayloadLen (4)  │ CRC32 (4) │  Id  │ Payload │
//! └────────────┴─────────────────┴───────────┴──────┴─────────┘
//! ```
//! All integers little-endian. The CRC covers `Id ‖ Payload`.
//! A stream is a plain concatenation of objects with no header or footer.
//! Ids and payloads are each limited to `u32::MAX` bytes.

mod reader;
mod writer;

pub use reader::ObjectReader;
pub use writer::{encode_object, ChunkWriter};

use crate::error::Result;
use crate::TraceWalError;

/// Object header size: IdLen (4) + PayloadLen (4) + CRC32 (4) = 12 bytes
pub const OBJECT_HEADER_SIZE: usize = 12;

/// Largest id or payload a frame can describe
pub const MAX_OBJECT_FIELD_LEN: usize = u32::MAX as usize;

/// Reject objects whose lengths do not fit the u32 header fields
pub(crate) fn check_object_size(id_len: usize, payload_len: usize) -> Result<()> {
    if id_len > MAX_OBJECT_FIELD_LEN || payload_len > MAX_OBJECT_FIELD_LEN {
        return Err(TraceWalError::Storage(format!(
            "object too large to encode: id {} bytes, payload {} bytes (limit {})",
            id_len, payload_len, MAX_OBJECT_FIELD_LEN
        )));
    }
    Ok(())
}

/// Checksum over an object's identifier and payload
pub(crate) fn object_crc(id: &[u8], payload: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(id);
    hasher.update(payload);
    hasher.finalize()
}
