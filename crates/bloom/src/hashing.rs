//! Keyed hashing and bit-index derivation.
//!
//! Each filter owns a pair of 64-bit seeds drawn at construction. A key is
//! hashed once per seed with XXH3, and the two digests are combined by
//! double hashing (Kirsch & Mitzenmacher, "Less Hashing, Same Performance"):
//! the `i`-th bit index is `(h0 + i * h1) mod m`.

use std::borrow::Cow;

use rand::Rng;
use xxhash_rust::xxh3::xxh3_64_with_seed;

use crate::FilterError;

/// The hash seed pair owned by a single filter.
///
/// Generated seeds are always nonzero and distinct, so the two XXH3 streams
/// stay independent. Distinct filters draw independent seeds, which is what
/// keeps false positives uncorrelated across the sub-filters of a ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashSeeds {
    s0: u64,
    s1: u64,
}

impl HashSeeds {
    /// Validates an explicit seed pair.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidSeeds`] if either seed is zero or the
    /// two are equal.
    pub fn new(s0: u64, s1: u64) -> Result<Self, FilterError> {
        if s0 == 0 || s1 == 0 || s0 == s1 {
            return Err(FilterError::InvalidSeeds { s0, s1 });
        }
        Ok(Self { s0, s1 })
    }

    /// Draws a fresh seed pair from the thread-local RNG.
    #[must_use]
    pub fn random() -> Self {
        Self::from_rng(&mut rand::thread_rng())
    }

    /// Draws a seed pair from a caller-supplied RNG.
    ///
    /// A seeded RNG makes filter construction reproducible:
    ///
    /// ```rust
    /// use bloom::HashSeeds;
    /// use rand::{rngs::StdRng, SeedableRng};
    ///
    /// let a = HashSeeds::from_rng(&mut StdRng::seed_from_u64(123));
    /// let b = HashSeeds::from_rng(&mut StdRng::seed_from_u64(123));
    /// assert_eq!(a, b);
    /// ```
    pub fn from_rng<R: Rng>(rng: &mut R) -> Self {
        loop {
            let s0 = rng.gen::<u64>();
            let s1 = rng.gen::<u64>();
            if s0 != 0 && s1 != 0 && s0 != s1 {
                return Self { s0, s1 };
            }
        }
    }

    /// Rebuilds seeds from an envelope header, verbatim.
    pub(crate) fn from_wire(s0: u64, s1: u64) -> Self {
        Self { s0, s1 }
    }

    /// First seed.
    #[must_use]
    pub fn s0(&self) -> u64 {
        self.s0
    }

    /// Second seed.
    #[must_use]
    pub fn s1(&self) -> u64 {
        self.s1
    }

    /// Hashes `key` once per seed.
    pub(crate) fn hash_pair(&self, key: &[u8]) -> (u64, u64) {
        (
            xxh3_64_with_seed(key, self.s0),
            xxh3_64_with_seed(key, self.s1),
        )
    }
}

/// Lazily yields the `k` bit indices for a hash pair, each in `[0, m)`.
pub(crate) fn bit_indexes((h0, h1): (u64, u64), k: u64, m: u64) -> impl Iterator<Item = u64> {
    (0..k).map(move |i| h0.wrapping_add(i.wrapping_mul(h1)) % m)
}

/// A value the filter can hash: anything with a defined canonical byte form.
///
/// Canonical forms:
///
/// - integers: 8-byte little-endian two's complement (unsigned values widen
///   through `u64`, signed through `i64`);
/// - byte slices and vectors: the raw bytes;
/// - `str` and `String`: UTF-8 bytes with one leading U+FEFF stripped.
///
/// Two values with identical canonical bytes are the same key to the filter,
/// so `"abc"` and `b"abc"` collide by design. Callers with richer types
/// supply their own canonical form, typically by pre-hashing to a `u64`.
pub trait FilterKey {
    /// The canonical byte form fed to the keyed hash.
    fn canonical_bytes(&self) -> Cow<'_, [u8]>;
}

impl<K: FilterKey + ?Sized> FilterKey for &K {
    fn canonical_bytes(&self) -> Cow<'_, [u8]> {
        (**self).canonical_bytes()
    }
}

macro_rules! unsigned_filter_key {
    ($($t:ty),*) => {$(
        impl FilterKey for $t {
            fn canonical_bytes(&self) -> Cow<'_, [u8]> {
                Cow::Owned((*self as u64).to_le_bytes().to_vec())
            }
        }
    )*};
}

macro_rules! signed_filter_key {
    ($($t:ty),*) => {$(
        impl FilterKey for $t {
            fn canonical_bytes(&self) -> Cow<'_, [u8]> {
                Cow::Owned((*self as i64).to_le_bytes().to_vec())
            }
        }
    )*};
}

unsigned_filter_key!(u8, u16, u32, u64, usize);
signed_filter_key!(i8, i16, i32, i64, isize);

impl FilterKey for [u8] {
    fn canonical_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self)
    }
}

impl FilterKey for Vec<u8> {
    fn canonical_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self)
    }
}

impl<const N: usize> FilterKey for [u8; N] {
    fn canonical_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self)
    }
}

impl FilterKey for str {
    fn canonical_bytes(&self) -> Cow<'_, [u8]> {
        let text = self.strip_prefix('\u{feff}').unwrap_or(self);
        Cow::Borrowed(text.as_bytes())
    }
}

impl FilterKey for String {
    fn canonical_bytes(&self) -> Cow<'_, [u8]> {
        self.as_str().canonical_bytes()
    }
}
