//! # Rotating Dedup Ring
//!
//! Layers a fixed-size ring of bloom filters so that "have I seen this
//! recently?" can be answered in constant memory over an unbounded stream.
//!
//! Writes land in the newest sub-filter; membership probes consult every
//! sub-filter in the ring. When the newest sub-filter has absorbed
//! `capacity` insertions a fresh one is appended, and the oldest is evicted
//! once the ring holds more than `count` filters. The ring therefore
//! remembers roughly the last `count * capacity` distinct keys and forgets
//! older ones wholesale, a sub-filter at a time.
//!
//! False positives compound across the ring: with `count` sub-filters at
//! `error_rate` each, the effective rate is `1 - (1 - error_rate)^count`,
//! about `count * error_rate` for small rates.
//!
//! ## Example
//!
//! ```rust
//! use rotating::Rotating;
//!
//! let mut ring = Rotating::new(1000.0, 1e-4, 3).unwrap();
//! let unique: Vec<u64> = ring.dedup([1u64, 2, 1, 3, 2, 4]).collect();
//! assert_eq!(unique, vec![1, 2, 3, 4]);
//! ```

use std::collections::VecDeque;

use bloom::{BloomFilter, FilterError, FilterKey, FilterParams};
use thiserror::Error;

/// Errors surfaced by ring construction.
#[derive(Debug, Error)]
pub enum RingError {
    /// The ring was asked for zero sub-filters.
    #[error("sub-filter count must be at least 1")]
    InvalidCount,

    /// Sub-filter sizing failed.
    #[error(transparent)]
    Filter(#[from] FilterError),
}

/// A bounded ring of bloom filters with insert-newest / probe-all /
/// evict-oldest semantics.
///
/// All sub-filters share one validated sizing; each draws its own random
/// hash seeds. Sizing is checked once, up front, so nothing on the observe
/// path can fail.
#[derive(Debug)]
pub struct Rotating {
    params: FilterParams,
    capacity: f64,
    error_rate: f64,
    count: usize,
    /// Head is the oldest sub-filter, tail the newest.
    blooms: VecDeque<BloomFilter>,
    inserts_in_newest: u64,
}

impl Rotating {
    /// Creates an empty ring of up to `count` sub-filters, each sized for
    /// `capacity` keys at `error_rate`.
    ///
    /// The prototype sizing runs here, so an infeasible `(capacity,
    /// error_rate)` pair fails at construction rather than mid-stream.
    ///
    /// # Errors
    ///
    /// - [`RingError::InvalidCount`] if `count` is zero.
    /// - [`RingError::Filter`] if the sub-filter sizing is rejected.
    pub fn new(capacity: f64, error_rate: f64, count: usize) -> Result<Self, RingError> {
        if count == 0 {
            return Err(RingError::InvalidCount);
        }
        let params = FilterParams::new(capacity, error_rate)?;
        Ok(Self {
            params,
            capacity,
            error_rate,
            count,
            blooms: VecDeque::new(),
            inserts_in_newest: 0,
        })
    }

    /// Records `key` and reports whether it was new to the ring.
    ///
    /// Returns `false` when any sub-filter already claims the key.
    /// Otherwise the key is added to the newest sub-filter and `true` is
    /// returned; if that insertion fills the newest sub-filter to
    /// `capacity`, a fresh sub-filter is appended and the oldest evicted
    /// once the ring exceeds `count`.
    pub fn observe<K: FilterKey + ?Sized>(&mut self, key: &K) -> bool {
        if self.test_by_hash(key) {
            return false;
        }

        if self.blooms.is_empty() {
            self.push_filter();
        }
        if let Some(newest) = self.blooms.back_mut() {
            newest.add_by_hash(key);
        }
        self.inserts_in_newest += 1;

        if self.inserts_in_newest as f64 >= self.capacity {
            self.push_filter();
        }

        true
    }

    /// Returns `true` if any sub-filter might have seen `key`.
    #[must_use]
    pub fn test_by_hash<K: FilterKey + ?Sized>(&self, key: &K) -> bool {
        self.blooms.iter().any(|bf| bf.test_by_hash(key))
    }

    /// Lazily yields the elements of `items` whose key has not been seen,
    /// updating the ring as elements are pulled. The element itself is the
    /// key.
    ///
    /// Order is preserved, each non-duplicate is yielded exactly once, and
    /// the ring only observes keys up to the point the iterator has been
    /// consumed.
    pub fn dedup<I>(&mut self, items: I) -> Dedup<'_, I::IntoIter>
    where
        I: IntoIterator,
        I::Item: FilterKey,
    {
        Dedup {
            ring: self,
            items: items.into_iter(),
        }
    }

    /// Like [`dedup`](Self::dedup), but deduplicates on `key(&item)`
    /// instead of the item itself. `key` must be pure: equal items must
    /// produce equal keys.
    pub fn dedup_by_key<I, K, F>(&mut self, items: I, key: F) -> DedupByKey<'_, I::IntoIter, F>
    where
        I: IntoIterator,
        F: FnMut(&I::Item) -> K,
        K: FilterKey,
    {
        DedupByKey {
            ring: self,
            items: items.into_iter(),
            key,
        }
    }

    /// Read-only view of the ring, oldest sub-filter first.
    #[must_use]
    pub fn blooms(&self) -> &VecDeque<BloomFilter> {
        &self.blooms
    }

    /// Per-sub-filter capacity, as constructed.
    #[must_use]
    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Per-sub-filter target false-positive rate, as constructed.
    #[must_use]
    pub fn error_rate(&self) -> f64 {
        self.error_rate
    }

    /// Maximum number of sub-filters the ring will hold.
    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Appends a fresh newest sub-filter, evicting the oldest when the ring
    /// would exceed `count`.
    fn push_filter(&mut self) {
        self.blooms.push_back(BloomFilter::from_params(self.params));
        self.inserts_in_newest = 0;
        if self.blooms.len() > self.count {
            self.blooms.pop_front();
        }
    }
}

/// Lazy dedup iterator where each element is its own key.
///
/// Created by [`Rotating::dedup`]. Holds the ring mutably: every pulled
/// element is observed before it is yielded or skipped.
pub struct Dedup<'a, I> {
    ring: &'a mut Rotating,
    items: I,
}

impl<I> Iterator for Dedup<'_, I>
where
    I: Iterator,
    I::Item: FilterKey,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let item = self.items.next()?;
            if self.ring.observe(&item) {
                return Some(item);
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.items.size_hint().1)
    }
}

/// Lazy dedup iterator with a caller-supplied key function.
///
/// Created by [`Rotating::dedup_by_key`].
pub struct DedupByKey<'a, I, F> {
    ring: &'a mut Rotating,
    items: I,
    key: F,
}

impl<I, K, F> Iterator for DedupByKey<'_, I, F>
where
    I: Iterator,
    F: FnMut(&I::Item) -> K,
    K: FilterKey,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let item = self.items.next()?;
            let key = (self.key)(&item);
            if self.ring.observe(&key) {
                return Some(item);
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.items.size_hint().1)
    }
}
