//! Bloom Filter Module
//!
//! Membership filter built once per sealed block over every object id.
//!
//! - `test()` false → id is DEFINITELY NOT in the block
//! - `test()` true  → id is PROBABLY in the block (false positive possible)
//!
//! Sizing (rounded up to whole bits, so the real rate lands under the target):
//!   bits_per_key = ceil(-log2(false_positive_rate) / ln(2))
//!   num_hashes   = ceil(bits_per_key * ln(2))
//!
//!   1% FPR   → 10 bits/key, 7 hashes  (~0.8% in practice)
//!   0.1% FPR → 15 bits/key, 11 hashes
//!
//! The k probe positions come from double hashing:
//! h_i(key) = h1(key) + i * h2(key) (mod m), where h1 and h2 are the two
//! halves of one xxh3 128-bit hash.

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::xxh3_128;

use crate::error::{Result, TraceWalError};

/// Probabilistic set over byte-string identifiers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BloomFilter {
    bits: Vec<u64>,
    num_hashes: u32,
    num_bits: u64,
}

impl BloomFilter {
    /// Create an empty filter sized for `expected_items` at the given FPR.
    ///
    /// `expected_items` of zero is treated as one. The rate is clamped into
    /// (0, 1); callers validate it through `Config::validate`.
    pub fn new(expected_items: usize, false_positive_rate: f64) -> Self {
        let expected_items = expected_items.max(1);
        let fp = false_positive_rate.clamp(f64::MIN_POSITIVE, 0.999_999);

        let bits_per_key = (-fp.log2() / std::f64::consts::LN_2).ceil();
        let num_bits = ((expected_items as f64) * bits_per_key).ceil() as u64;
        let num_bits = num_bits.max(64);

        let num_hashes = (bits_per_key * std::f64::consts::LN_2).ceil() as u32;
        let num_hashes = num_hashes.max(1);

        let num_words = num_bits.div_ceil(64) as usize;

        Self {
            bits: vec![0u64; num_words],
            num_hashes,
            num_bits,
        }
    }

    /// Add an identifier to the set
    pub fn add(&mut self, id: &[u8]) {
        let (h1, h2) = Self::hash(id);
        for i in 0..self.num_hashes {
            let pos = self.position(h1, h2, i);
            self.bits[(pos / 64) as usize] |= 1 << (pos % 64);
        }
    }

    /// Test an identifier. false → definitely absent.
    pub fn test(&self, id: &[u8]) -> bool {
        let (h1, h2) = Self::hash(id);
        (0..self.num_hashes).all(|i| {
            let pos = self.position(h1, h2, i);
            (self.bits[(pos / 64) as usize] >> (pos % 64)) & 1 == 1
        })
    }

    /// Encode for shipping alongside the block
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode a filter produced by `to_bytes`.
    ///
    /// The decoded shape is checked so a corrupt filter fails here instead
    /// of panicking on the first `test()`.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let bf: Self = bincode::deserialize(data)?;

        if bf.num_bits == 0 || bf.num_hashes == 0 {
            return Err(TraceWalError::Serialization(format!(
                "bloom filter has {} bits and {} hashes",
                bf.num_bits, bf.num_hashes
            )));
        }

        if bf.bits.len() as u64 != bf.num_bits.div_ceil(64) {
            return Err(TraceWalError::Serialization(format!(
                "bloom filter declares {} bits but carries {} words",
                bf.num_bits,
                bf.bits.len()
            )));
        }

        Ok(bf)
    }

    pub fn num_hashes(&self) -> u32 {
        self.num_hashes
    }

    pub fn num_bits(&self) -> u64 {
        self.num_bits
    }

    fn hash(id: &[u8]) -> (u64, u64) {
        let h = xxh3_128(id);
        (h as u64, (h >> 64) as u64)
    }

    fn position(&self, h1: u64, h2: u64, i: u32) -> u64 {
        h1.wrapping_add((i as u64).wrapping_mul(h2)) % self.num_bits
    }
}
