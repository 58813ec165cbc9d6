//! Block Builder
//!
//! Buffers objects in memory, then seals them into one block file with its
//! record index and bloom filter built from the same pass.

use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use tracing::{debug, warn};

use crate::bloom::BloomFilter;
use crate::codec::{check_object_size, ChunkWriter};
use crate::config::Config;
use crate::error::Result;
use crate::fs::{BlockFs, LocalFs};
use crate::TraceWalError;

use super::meta::{BlockId, BlockMeta};
use super::record::Record;
use super::sealed::SealedBlock;
use super::{block_filename, validate_tenant_id};

/// Builder for sealing a batch of objects into a block
pub struct BlockBuilder {
    /// Directory the block file is written to
    dir: PathBuf,
    block_id: BlockId,
    tenant_id: String,
    /// Buffered (id, payload) pairs, in arrival order
    objects: Vec<(Vec<u8>, Vec<u8>)>,
    /// Objects per chunk
    index_downsample: usize,
    bloom_false_positive_rate: f64,
    /// When the first write for this block arrived
    start_time: SystemTime,
}

impl BlockBuilder {
    /// Create a builder for a new block with a random id
    pub fn new(dir: &Path, tenant_id: impl Into<String>, config: &Config) -> Self {
        Self {
            dir: dir.to_path_buf(),
            block_id: BlockId::random(),
            tenant_id: tenant_id.into(),
            objects: Vec::new(),
            index_downsample: config.index_downsample.max(1),
            bloom_false_positive_rate: config.bloom_false_positive_rate,
            start_time: SystemTime::now(),
        }
    }

    /// Use a specific block id instead of a random one
    pub fn with_block_id(mut self, block_id: BlockId) -> Self {
        self.block_id = block_id;
        self
    }

    /// Buffer one object (any order)
    pub fn add(&mut self, id: &[u8], payload: &[u8]) {
        self.objects.push((id.to_vec(), payload.to_vec()));
    }

    pub fn block_id(&self) -> BlockId {
        self.block_id
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Write the block file and return the sealed block
    pub fn finish(self) -> Result<SealedBlock> {
        self.finish_with_fs(Arc::new(LocalFs))
    }

    /// Like `finish`, with the sealed block reading through `fs`
    pub fn finish_with_fs(mut self, fs: Arc<dyn BlockFs>) -> Result<SealedBlock> {
        if self.objects.is_empty() {
            return Err(TraceWalError::Storage(
                "Cannot seal empty block".to_string(),
            ));
        }

        validate_tenant_id(&self.tenant_id)?;
        for (id, payload) in &self.objects {
            check_object_size(id.len(), payload.len())?;
        }

        // Stable: duplicate ids keep their arrival order
        self.objects.sort_by(|a, b| a.0.cmp(&b.0));

        let path = block_filename(&self.dir, &self.block_id, &self.tenant_id);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;
        let partial = PartialFile::new(&path);
        let mut writer = BufWriter::new(file);

        let mut filter = BloomFilter::new(self.objects.len(), self.bloom_false_positive_rate);
        let mut chunk = ChunkWriter::new();
        let mut records = Vec::new();
        let mut current_offset: u64 = 0;

        for (id, payload) in &self.objects {
            filter.add(id);
            chunk.add(id, payload);

            if chunk.object_count() >= self.index_downsample {
                Self::flush_chunk(&mut chunk, &mut writer, &mut records, &mut current_offset)?;
            }
        }
        Self::flush_chunk(&mut chunk, &mut writer, &mut records, &mut current_offset)?;

        writer.flush()?;
        let file = writer.into_inner().map_err(|e| {
            TraceWalError::Storage(format!("Failed to flush block: {}", e))
        })?;
        file.sync_all()?;
        partial.keep();

        let mut meta = BlockMeta::new(self.block_id, self.tenant_id);
        meta.min_id = self.objects.first().map(|(id, _)| id.clone()).unwrap_or_default();
        meta.max_id = self.objects.last().map(|(id, _)| id.clone()).unwrap_or_default();
        meta.start_time = self.start_time;
        meta.end_time = SystemTime::now();
        meta.total_objects = self.objects.len() as u64;

        debug!(
            block_id = %meta.block_id,
            tenant_id = %meta.tenant_id,
            objects = meta.total_objects,
            chunks = records.len(),
            bytes = current_offset,
            "sealed block"
        );

        Ok(SealedBlock::with_fs(meta, filter, self.dir, records, fs))
    }

    /// Write the pending chunk, if any, and index it
    fn flush_chunk<W: Write>(
        chunk: &mut ChunkWriter,
        writer: &mut W,
        records: &mut Vec<Record>,
        current_offset: &mut u64,
    ) -> Result<()> {
        if let Some((last_id, bytes)) = chunk.take() {
            writer.write_all(&bytes)?;
            let length = bytes.len() as u64;
            records.push(Record::new(last_id, *current_offset, length));
            *current_offset += length;
        }
        Ok(())
    }
}

/// Removes a block file on drop unless the seal completed
struct PartialFile<'a> {
    path: Option<&'a Path>,
}

impl<'a> PartialFile<'a> {
    fn new(path: &'a Path) -> Self {
        Self { path: Some(path) }
    }

    fn keep(mut self) {
        self.path = None;
    }
}

impl Drop for PartialFile<'_> {
    fn drop(&mut self) {
        if let Some(path) = self.path {
            if let Err(e) = std::fs::remove_file(path) {
                warn!(path = %path.display(), error = %e, "failed to remove partial block file");
            } else {
                debug!(path = %path.display(), "removed partial block file");
            }
        }
    }
}
