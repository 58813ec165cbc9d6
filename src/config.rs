//! Configuration for tracewal
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{Result, TraceWalError};

/// Main configuration for a tracewal instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all data files
    /// Internal structure:
    ///   {data_dir}/
    ///     └── blocks/          (sealed block files, `{blockID}:{tenantID}`)
    pub data_dir: PathBuf,

    // -------------------------------------------------------------------------
    // Index Configuration
    // -------------------------------------------------------------------------
    /// Objects per encoded chunk; one index record is kept per chunk
    pub index_downsample: usize,

    // -------------------------------------------------------------------------
    // Bloom Filter Configuration
    // -------------------------------------------------------------------------
    /// Target false positive rate of each block's membership filter
    pub bloom_false_positive_rate: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./tracewal_data"),
            index_downsample: 100,
            bloom_false_positive_rate: 0.01,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check that every value is usable
    pub fn validate(&self) -> Result<()> {
        if self.index_downsample == 0 {
            return Err(TraceWalError::Config(
                "index_downsample must be at least 1".to_string(),
            ));
        }

        let fp = self.bloom_false_positive_rate;
        if !(fp > 0.0 && fp < 1.0) {
            return Err(TraceWalError::Config(format!(
                "bloom_false_positive_rate must be in (0, 1), got {}",
                fp
            )));
        }

        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all storage)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set how many objects are grouped into one indexed chunk
    pub fn index_downsample(mut self, objects: usize) -> Self {
        self.config.index_downsample = objects;
        self
    }

    /// Set the bloom filter false positive rate
    pub fn bloom_false_positive_rate(mut self, rate: f64) -> Self {
        self.config.bloom_false_positive_rate = rate;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
