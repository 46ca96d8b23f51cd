//! Seeded double-hash probe generator.
//!
//! A `ProbeSeed` holds the affine compression coefficients for one map.
//! They are drawn exactly once, at map construction, and reused for every
//! hash computation afterwards: the probe sequence a key walks must be
//! byte-for-byte identical across all calls for the map's lifetime, or
//! lookups will miss entries placed by earlier inserts.
//!
//! Two hash values are computed per key. The raw value is a rolling
//! cyclic-shift accumulator over the key bytes; compression to a slot index
//! is `((a * h + b) mod p) mod capacity`, with a distinct odd prime `p` per
//! hash to decorrelate the pair. The probe sequence is classic double
//! hashing, `index(i) = (h1 + i * h2) mod capacity`, with `h2` forced odd:
//! capacities are powers of two, so an odd stride is coprime to the modulus
//! and the sequence visits every slot before repeating.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Modulus for the origin hash: 2^32 + 15, prime.
const P1: u64 = 4_294_967_311;
/// Modulus for the stride hash: 2^31 - 1, prime.
const P2: u64 = 2_147_483_647;

/// Per-map affine compression coefficients, fixed for the map's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeSeed {
    a1: u64,
    b1: u64,
    a2: u64,
    b2: u64,
}

impl ProbeSeed {
    /// Draw a fresh seed from the thread-local generator.
    pub fn generate() -> Self {
        Self::from_rng(&mut rand::rng())
    }

    /// Derive a seed deterministically from `seed`, for reproducible maps.
    pub fn from_u64(seed: u64) -> Self {
        Self::from_rng(&mut StdRng::seed_from_u64(seed))
    }

    /// Draw coefficients from `rng`: multipliers nonzero so the compression
    /// does not collapse, offsets anywhere in the field.
    pub fn from_rng<R: Rng>(rng: &mut R) -> Self {
        Self {
            a1: rng.random_range(1..P1),
            b1: rng.random_range(0..P1),
            a2: rng.random_range(1..P2),
            b2: rng.random_range(0..P2),
        }
    }

    /// Build a seed from explicit coefficients, reduced modulo their primes.
    ///
    /// Degenerate choices are allowed on purpose: `from_parts(0, 0, 0, 0)`
    /// collapses every key to origin 0 with stride 1, which turns the map
    /// into a worst-case collision chain for tests and benchmarks.
    pub fn from_parts(a1: u64, b1: u64, a2: u64, b2: u64) -> Self {
        Self {
            a1: a1 % P1,
            b1: b1 % P1,
            a2: a2 % P2,
            b2: b2 % P2,
        }
    }

    /// First slot index probed for `key` in a table of `capacity` slots.
    pub fn origin(&self, key: &[u8], capacity: usize) -> usize {
        compress(raw_hash(key), self.a1, self.b1, P1, capacity)
    }

    /// Distance between consecutive probes for `key`. Always odd, hence
    /// nonzero and coprime to the power-of-two capacity.
    pub fn stride(&self, key: &[u8], capacity: usize) -> usize {
        compress(raw_hash(key), self.a2, self.b2, P2, capacity) | 1
    }

    /// The infinite probe sequence for `key` over `capacity` slots.
    pub fn probe(&self, key: &[u8], capacity: usize) -> ProbeSeq {
        debug_assert!(capacity.is_power_of_two());
        ProbeSeq {
            next: self.origin(key, capacity),
            stride: self.stride(key, capacity),
            capacity,
        }
    }
}

/// Rolling cyclic-shift accumulator over the key bytes.
fn raw_hash(key: &[u8]) -> u64 {
    key.iter()
        .fold(0u64, |h, &b| h.rotate_left(5).wrapping_add(u64::from(b)))
}

/// Affine compression of a raw hash into `[0, capacity)`. The multiply runs
/// in `u128` so the reduction modulo `p` is exact rather than wrapped.
fn compress(h: u64, a: u64, b: u64, p: u64, capacity: usize) -> usize {
    debug_assert!(capacity > 0);
    let folded = (u128::from(a) * u128::from(h) + u128::from(b)) % u128::from(p);
    (folded % capacity as u128) as usize
}

/// Iterator of slot indices `(h1 + i * h2) mod capacity` for `i = 0, 1, ...`.
/// Never terminates; callers bound it with `take`.
pub struct ProbeSeq {
    next: usize,
    stride: usize,
    capacity: usize,
}

impl Iterator for ProbeSeq {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        let idx = self.next;
        self.next = (idx + self.stride) % self.capacity;
        Some(idx)
    }
}
