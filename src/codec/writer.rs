//! Object Writer
//!
//! Encodes objects into chunk buffers.

use bytes::{BufMut, Bytes, BytesMut};

use super::{object_crc, MAX_OBJECT_FIELD_LEN, OBJECT_HEADER_SIZE};

/// Append one encoded object to `buf`
///
/// # Panics
///
/// If `id` or `payload` is longer than `MAX_OBJECT_FIELD_LEN`. The block
/// builder checks sizes before encoding.
pub fn encode_object(buf: &mut BytesMut, id: &[u8], payload: &[u8]) {
    assert!(
        id.len() <= MAX_OBJECT_FIELD_LEN && payload.len() <= MAX_OBJECT_FIELD_LEN,
        "object exceeds the u32 length fields"
    );
    buf.reserve(OBJECT_HEADER_SIZE + id.len() + payload.len());
    buf.put_u32_le(id.len() as u32);
    buf.put_u32_le(payload.len() as u32);
    buf.put_u32_le(object_crc(id, payload));
    buf.put_slice(id);
    buf.put_slice(payload);
}

/// Accumulates objects into a single chunk
///
/// Objects must be added in ascending id order. The last (largest) id added is
/// the chunk's representative id, which is what the block index stores for it:
/// a lower-bound search over representative ids then lands on the only chunk
/// that can hold a given id.
#[derive(Debug, Default)]
pub struct ChunkWriter {
    buf: BytesMut,
    last_id: Option<Vec<u8>>,
    object_count: usize,
}

impl ChunkWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object to the chunk
    pub fn add(&mut self, id: &[u8], payload: &[u8]) {
        self.last_id = Some(id.to_vec());
        encode_object(&mut self.buf, id, payload);
        self.object_count += 1;
    }

    /// Number of objects in the chunk so far
    pub fn object_count(&self) -> usize {
        self.object_count
    }

    /// Encoded size so far
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.object_count == 0
    }

    /// Take the encoded chunk and its representative id, resetting the writer
    ///
    /// Returns `None` if nothing was added since the last call.
    pub fn take(&mut self) -> Option<(Vec<u8>, Bytes)> {
        let last_id = self.last_id.take()?;
        self.object_count = 0;
        Some((last_id, self.buf.split().freeze()))
    }
}
