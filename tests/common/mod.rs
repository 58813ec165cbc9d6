//! Shared helpers for integration tests

#![allow(dead_code)]

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tempfile::TempDir;
use tracewal::fs::{BlockFs, LocalFs};
use tracewal::{Config, Wal};

/// File system double counting physical opens and removes
#[derive(Debug, Default)]
pub struct CountingFs {
    opens: AtomicUsize,
    removes: AtomicUsize,
}

impl CountingFs {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn removes(&self) -> usize {
        self.removes.load(Ordering::SeqCst)
    }
}

impl BlockFs for CountingFs {
    fn open(&self, path: &Path) -> io::Result<File> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        LocalFs.open(path)
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        self.removes.fetch_add(1, Ordering::SeqCst);
        LocalFs.remove(path)
    }
}

/// Config rooted in a fresh temp directory
pub fn temp_config(downsample: usize) -> (TempDir, Config) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .index_downsample(downsample)
        .build();
    (temp_dir, config)
}

/// Wal rooted in a fresh temp directory, reading through `fs`
pub fn temp_wal(downsample: usize, fs: Arc<dyn BlockFs>) -> (TempDir, Wal) {
    let (temp_dir, config) = temp_config(downsample);
    let wal = Wal::with_fs(config, fs).unwrap();
    (temp_dir, wal)
}

/// Zero-padded ids so lexicographic order matches numeric order
pub fn trace_id(i: usize) -> Vec<u8> {
    format!("trace{:05}", i).into_bytes()
}

pub fn payload(i: usize) -> Vec<u8> {
    format!("payload-for-trace-{}", i).into_bytes()
}

/// `count` objects with ids trace00000.. and matching payloads
pub fn objects(count: usize) -> Vec<(Vec<u8>, Vec<u8>)> {
    (0..count).map(|i| (trace_id(i), payload(i))).collect()
}

/// Invert every bit of the byte at `offset`
pub fn flip_byte(path: &Path, offset: u64) {
    let mut file = OpenOptions::new().read(true).write(true).open(path).unwrap();
    let mut byte = [0u8; 1];
    file.seek(SeekFrom::Start(offset)).unwrap();
    file.read_exact(&mut byte).unwrap();
    file.seek(SeekFrom::Start(offset)).unwrap();
    file.write_all(&[byte[0] ^ 0xFF]).unwrap();
    file.sync_all().unwrap();
}
