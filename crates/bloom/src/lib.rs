//! # Bloom Filter
//!
//! A space-efficient probabilistic data structure for set membership testing.
//!
//! A bloom filter can tell you with certainty that a key is **not** in the
//! set (no false negatives), but may occasionally report that a key **is**
//! in the set when it isn't (false positives). Sizing from a target
//! `(capacity, error_rate)` pair picks the bit count and hash count that
//! keep false positives at or below the target while `capacity` distinct
//! keys are held.
//!
//! Every filter owns a random pair of hash seeds, drawn at construction, so
//! two filters with identical parameters still disagree about which bits a
//! key touches. Pass explicit [`HashSeeds`] when reproducibility matters
//! (tests, golden files).
//!
//! Filters serialize to a single-line text envelope (zlib + base64) and
//! deserialize back bit-for-bit, seeds included.
//!
//! ## Example
//!
//! ```rust
//! use bloom::BloomFilter;
//!
//! let mut bf = BloomFilter::new(1000.0, 0.01).unwrap();
//! bf.add_by_hash("hello");
//! assert!(bf.test_by_hash("hello"));
//!
//! let envelope = bf.serialize().unwrap();
//! let restored = BloomFilter::deserialize(&envelope).unwrap();
//! assert!(restored.test_by_hash("hello"));
//! ```

use std::fmt;
use std::io;

use thiserror::Error;

mod bit_array;
mod codec;
mod hashing;
mod sizing;

pub use hashing::{FilterKey, HashSeeds};
pub use sizing::{FilterParams, MAX_FILTER_BYTES};

use bit_array::BitArray;

/// Errors surfaced by filter construction and (de)serialization.
#[derive(Debug, Error)]
pub enum FilterError {
    /// `capacity` was non-finite or non-positive.
    #[error("invalid capacity: {0}")]
    InvalidCapacity(f64),

    /// `error_rate` was outside the open interval (0, 1).
    #[error("invalid error rate: {0}")]
    InvalidErrorRate(f64),

    /// Sizing would exceed the allocation ceiling ([`MAX_FILTER_BYTES`]).
    #[error("filter of ~{bytes} bytes cannot be allocated")]
    Infeasible {
        /// Estimated backing-storage size of the rejected filter.
        bytes: u64,
    },

    /// An explicit seed pair was zero or non-distinct.
    #[error("hash seeds must be nonzero and distinct (got {s0}, {s1})")]
    InvalidSeeds {
        /// Offered first seed.
        s0: u64,
        /// Offered second seed.
        s1: u64,
    },

    /// The input is not a valid base64 text envelope.
    #[error("not a filter envelope: {0}")]
    Envelope(#[from] base64::DecodeError),

    /// The envelope's compressed payload is corrupt.
    #[error("envelope decompression failed: {0}")]
    Decompression(#[source] io::Error),

    /// The decompressed envelope header is inconsistent.
    #[error("corrupt envelope header: {0}")]
    CorruptHeader(&'static str),

    /// An underlying I/O error while building an envelope.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// A bloom filter backed by a packed bit array and `k` double-hashed probes.
///
/// The bit count is always odd (see [`FilterParams`]), the seeds are fixed
/// at construction, and bits only ever flip from 0 to 1: once
/// [`test_by_hash`](Self::test_by_hash) returns `true` for a key it returns
/// `true` forever. There is no deletion.
pub struct BloomFilter {
    params: FilterParams,
    seeds: HashSeeds,
    bits: BitArray,
}

impl BloomFilter {
    /// Creates a filter sized for `capacity` keys at the target
    /// `error_rate`, with seeds drawn from the thread-local RNG.
    ///
    /// # Errors
    ///
    /// Rejects non-finite or non-positive `capacity`, an `error_rate`
    /// outside `(0, 1)`, and sizings past the allocation ceiling. A failed
    /// construction yields no object.
    pub fn new(capacity: f64, error_rate: f64) -> Result<Self, FilterError> {
        Ok(Self::from_params(FilterParams::new(capacity, error_rate)?))
    }

    /// Like [`new`](Self::new), but with an explicit seed pair. Two filters
    /// built with the same parameters and seeds behave identically.
    pub fn with_seeds(
        capacity: f64,
        error_rate: f64,
        seeds: HashSeeds,
    ) -> Result<Self, FilterError> {
        Ok(Self::from_params_with_seeds(
            FilterParams::new(capacity, error_rate)?,
            seeds,
        ))
    }

    /// Builds a filter from pre-validated sizing with fresh random seeds.
    ///
    /// Sizing is the only thing that can fail during construction, so
    /// callers holding a [`FilterParams`] (a ring appending sub-filters, for
    /// instance) construct infallibly.
    #[must_use]
    pub fn from_params(params: FilterParams) -> Self {
        Self::from_params_with_seeds(params, HashSeeds::random())
    }

    /// Builds a filter from pre-validated sizing and an explicit seed pair.
    #[must_use]
    pub fn from_params_with_seeds(params: FilterParams, seeds: HashSeeds) -> Self {
        Self {
            params,
            seeds,
            bits: BitArray::zeroed(params.bit_count()),
        }
    }

    /// Restores a filter from decoded envelope fields.
    pub(crate) fn from_wire(params: FilterParams, seeds: HashSeeds, bytes: Vec<u8>) -> Self {
        Self {
            bits: BitArray::from_bytes(bytes, params.bit_count()),
            params,
            seeds,
        }
    }

    /// Adds `key` to the filter.
    ///
    /// Returns `true` iff the key was newly added, i.e. at least one of its
    /// `k` bits flipped from 0 to 1. A `false` return means every bit was
    /// already set: either the key was added before, or it collides with
    /// earlier keys.
    pub fn add_by_hash<K: FilterKey + ?Sized>(&mut self, key: &K) -> bool {
        let pair = self.seeds.hash_pair(&key.canonical_bytes());
        let mut newly_added = false;
        for idx in hashing::bit_indexes(pair, self.params.hash_count(), self.params.bit_count()) {
            if !self.bits.test_and_set(idx) {
                newly_added = true;
            }
        }
        newly_added
    }

    /// Returns `true` if `key` **might** have been added, `false` if it is
    /// **definitely not** in the set.
    #[must_use]
    pub fn test_by_hash<K: FilterKey + ?Sized>(&self, key: &K) -> bool {
        let pair = self.seeds.hash_pair(&key.canonical_bytes());
        hashing::bit_indexes(pair, self.params.hash_count(), self.params.bit_count())
            .all(|idx| self.bits.test(idx))
    }

    /// Number of bits (`m`). Always odd.
    #[must_use]
    pub fn bit_count(&self) -> u64 {
        self.params.bit_count()
    }

    /// Number of hash functions (`k`).
    #[must_use]
    pub fn hash_count(&self) -> u64 {
        self.params.hash_count()
    }

    /// Bytes of backing storage: `ceil(m / 8)`.
    #[must_use]
    pub fn byte_size(&self) -> usize {
        self.bits.bytes().len()
    }

    /// Read-only view of the packed bit bytes.
    #[must_use]
    pub fn raw_data(&self) -> &[u8] {
        self.bits.bytes()
    }

    /// The filter's hash seed pair.
    #[must_use]
    pub fn seeds(&self) -> HashSeeds {
        self.seeds
    }

    /// Serializes the filter to a single-line text envelope.
    ///
    /// Layout: `m | k | s0 | s1` as little-endian `u64`s followed by the
    /// bit bytes, zlib-compressed, then base64 (standard alphabet, no line
    /// breaks). The output never contains a newline.
    pub fn serialize(&self) -> Result<String, FilterError> {
        codec::encode(self)
    }

    /// Restores a filter from a text envelope produced by
    /// [`serialize`](Self::serialize).
    ///
    /// # Errors
    ///
    /// - [`FilterError::Envelope`] if the input is not valid base64.
    /// - [`FilterError::Decompression`] if the compressed payload is corrupt.
    /// - [`FilterError::CorruptHeader`] if the header is truncated, `m` is
    ///   even or zero, `k` is zero, or the bit bytes do not match `m`.
    pub fn deserialize(envelope: &str) -> Result<Self, FilterError> {
        codec::decode(envelope)
    }
}

impl fmt::Debug for BloomFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BloomFilter")
            .field("bit_count", &self.bit_count())
            .field("hash_count", &self.hash_count())
            .field("bytes", &self.byte_size())
            .finish()
    }
}

#[cfg(test)]
mod tests;
