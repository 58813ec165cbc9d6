//! Object Reader
//!
//! Sequential decoding of an object stream from any byte source.

use std::io::{ErrorKind, Read};

use crate::error::Result;
use crate::TraceWalError;

use super::{object_crc, OBJECT_HEADER_SIZE};

/// Iterator over the objects of a stream, in write order
///
/// - `None` — clean end of the stream at an object boundary
/// - `Some(Err(Corruption))` — truncated object or checksum mismatch
/// - `Some(Err(Io))` — the underlying reader failed
///
/// After the first `None` or error the reader is fused and yields `None`.
pub struct ObjectReader<R> {
    inner: R,
    done: bool,
    /// Objects decoded so far (used in error messages)
    position: u64,
}

impl<R: Read> ObjectReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            done: false,
            position: 0,
        }
    }

    /// Consume the reader, returning the underlying source
    pub fn into_inner(self) -> R {
        self.inner
    }

    fn read_object(&mut self) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        let mut header = [0u8; OBJECT_HEADER_SIZE];
        if !self.fill_header(&mut header)? {
            return Ok(None);
        }

        let id_len = u32::from_le_bytes(header[0..4].try_into().unwrap()) as usize;
        let payload_len = u32::from_le_bytes(header[4..8].try_into().unwrap()) as usize;
        let expected_crc = u32::from_le_bytes(header[8..12].try_into().unwrap());

        let id = self.read_body(id_len)?;
        let payload = self.read_body(payload_len)?;

        let actual_crc = object_crc(&id, &payload);
        if actual_crc != expected_crc {
            return Err(TraceWalError::Corruption(format!(
                "checksum mismatch in object {}: expected {:#010x}, got {:#010x}",
                self.position, expected_crc, actual_crc
            )));
        }

        self.position += 1;
        Ok(Some((id, payload)))
    }

    /// Read a full header. Returns false on a clean end of stream.
    fn fill_header(&mut self, header: &mut [u8; OBJECT_HEADER_SIZE]) -> Result<bool> {
        let mut filled = 0;
        while filled < header.len() {
            match self.inner.read(&mut header[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(TraceWalError::Io(e)),
            }
        }

        match filled {
            0 => Ok(false),
            n if n == header.len() => Ok(true),
            n => Err(TraceWalError::Corruption(format!(
                "truncated header in object {}: {} of {} bytes",
                self.position,
                n,
                OBJECT_HEADER_SIZE
            ))),
        }
    }

    /// Read exactly `len` bytes. The buffer grows with the data actually
    /// read, so a corrupt length cannot force a large allocation.
    fn read_body(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        (&mut self.inner).take(len as u64).read_to_end(&mut buf)?;

        if buf.len() != len {
            return Err(TraceWalError::Corruption(format!(
                "truncated body in object {}: {} of {} bytes",
                self.position,
                buf.len(),
                len
            )));
        }
        Ok(buf)
    }
}

impl<R: Read> Iterator for ObjectReader<R> {
    /// (id, payload)
    type Item = Result<(Vec<u8>, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.read_object() {
            Ok(Some(object)) => Some(Ok(object)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<R: Read> std::iter::FusedIterator for ObjectReader<R> {}
