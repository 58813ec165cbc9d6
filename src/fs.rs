//! File system seam
//!
//! Blocks open and delete their backing files through `BlockFs` so tests can
//! observe physical file activity.

use std::fs::{self, File};
use std::io;
use std::path::Path;

/// File operations a block performs on its backing file
pub trait BlockFs: Send + Sync {
    /// Open a file read-only
    fn open(&self, path: &Path) -> io::Result<File>;

    /// Delete a file
    fn remove(&self, path: &Path) -> io::Result<()>;
}

/// The local file system
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFs;

impl BlockFs for LocalFs {
    fn open(&self, path: &Path) -> io::Result<File> {
        File::open(path)
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }
}
