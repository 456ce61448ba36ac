//! Filter sizing: turns `(capacity, error_rate)` into concrete bit and hash
//! counts.
//!
//! For a target of `n` insertions at false-positive rate `p`:
//!
//! ```text
//! m = ceil(-n * ln(p) / ln(2)^2)    rounded up to the next odd number
//! k = max(1, round((m / n) * ln(2)))
//! ```
//!
//! The bit count is forced odd so that double hashing `h0 + i*h1 mod m`
//! walks the full residue set whenever `gcd(h1, m) = 1`, which an odd
//! modulus makes far more likely.

use crate::FilterError;

/// Hard ceiling on the bit-array backing allocation. Sizing requests beyond
/// this are rejected as infeasible instead of attempted.
pub const MAX_FILTER_BYTES: u64 = 8 << 30; // 8 GiB

/// Validated sizing for a single filter: an odd bit count and a hash count,
/// both fixed for the life of the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterParams {
    bit_count: u64,
    hash_count: u64,
}

impl FilterParams {
    /// Sizes a filter for `capacity` expected insertions at the target
    /// `error_rate`.
    ///
    /// `capacity` does not have to be integral; fractional capacities are
    /// rounded up through the bit-count ceiling, so the filter may hold
    /// slightly more than requested.
    ///
    /// # Errors
    ///
    /// - [`FilterError::InvalidCapacity`] if `capacity` is not a positive
    ///   finite number.
    /// - [`FilterError::InvalidErrorRate`] if `error_rate` is not in the
    ///   open interval `(0, 1)`.
    /// - [`FilterError::Infeasible`] if the backing array would exceed
    ///   [`MAX_FILTER_BYTES`].
    pub fn new(capacity: f64, error_rate: f64) -> Result<Self, FilterError> {
        if !capacity.is_finite() || capacity <= 0.0 {
            return Err(FilterError::InvalidCapacity(capacity));
        }
        if !error_rate.is_finite() || error_rate <= 0.0 || error_rate >= 1.0 {
            return Err(FilterError::InvalidErrorRate(error_rate));
        }

        let ln2 = std::f64::consts::LN_2;
        let m_raw = (-(capacity * error_rate.ln()) / (ln2 * ln2)).ceil();

        let max_bits = (MAX_FILTER_BYTES.min(usize::MAX as u64) as f64) * 8.0;
        if m_raw >= max_bits {
            // Saturating estimate, just for the error message.
            let bytes = (m_raw / 8.0).ceil().min(u64::MAX as f64) as u64;
            return Err(FilterError::Infeasible { bytes });
        }

        // m_raw is below 2^53 here, so the cast is exact.
        let bit_count = (m_raw as u64) | 1;
        let hash_count = ((bit_count as f64 / capacity) * ln2).round().max(1.0) as u64;

        Ok(Self {
            bit_count,
            hash_count,
        })
    }

    /// Rebuilds params from an envelope header. The caller has already
    /// checked that `bit_count` is odd and `hash_count` nonzero.
    pub(crate) fn from_wire(bit_count: u64, hash_count: u64) -> Self {
        Self {
            bit_count,
            hash_count,
        }
    }

    /// Number of bits (`m`). Always odd.
    #[must_use]
    pub fn bit_count(&self) -> u64 {
        self.bit_count
    }

    /// Number of hash functions (`k`).
    #[must_use]
    pub fn hash_count(&self) -> u64 {
        self.hash_count
    }

    /// Bytes of backing storage: `ceil(m / 8)`.
    #[must_use]
    pub fn byte_size(&self) -> u64 {
        self.bit_count.div_ceil(8)
    }
}
