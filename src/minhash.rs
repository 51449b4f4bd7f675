//! MinHash signatures for Jaccard similarity.
//!
//! For hash functions \(h_1, \dots, h_L\), element \(i\) of the signature of a
//! token set \(S\) is \(\min_{x \in S} h_i(x)\). Two sets agree on element \(i\)
//! with probability equal to their Jaccard similarity
//! \(J(A,B) = |A ∩ B| / |A ∪ B|\).

use std::collections::BTreeSet;
use std::hash::Hasher;

use crate::error::{Error, Result};
use crate::signature::Signature;

/// A small stable 64-bit FNV-1a hasher.
///
/// This avoids relying on `std`'s `DefaultHasher` stability guarantees.
pub(crate) struct Fnv1a64 {
    state: u64,
}

impl Fnv1a64 {
    pub(crate) fn new() -> Self {
        // FNV offset basis
        Self {
            state: 0xcbf29ce484222325,
        }
    }
}

impl Hasher for Fnv1a64 {
    fn finish(&self) -> u64 {
        self.state
    }

    fn write(&mut self, bytes: &[u8]) {
        // FNV-1a
        const PRIME: u64 = 0x00000100000001B3;
        for &b in bytes {
            self.state ^= b as u64;
            self.state = self.state.wrapping_mul(PRIME);
        }
    }
}

/// FNV-1a of a byte string.
pub(crate) fn fnv1a64(bytes: &[u8]) -> u64 {
    let mut hasher = Fnv1a64::new();
    hasher.write(bytes);
    hasher.finish()
}

/// SplitMix64 finalizer. Spreads FNV output so seeded variants behave independently.
pub(crate) fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
    z ^ (z >> 31)
}

/// MinHash signature generator.
#[derive(Debug, Clone)]
pub struct MinHash {
    /// Seed the per-function seeds were derived from.
    seed: u64,
    /// One seed per hash function (signature length).
    seeds: Vec<u64>,
}

impl MinHash {
    /// Create MinHash with `num_hashes` functions derived from `seed` (deterministic).
    pub fn with_seed(num_hashes: usize, seed: u64) -> Result<Self> {
        if num_hashes == 0 {
            return Err(Error::config("MinHash signature length must be >= 1"));
        }
        let mut seeds = Vec::with_capacity(num_hashes);
        let mut rng_state = seed;
        for _ in 0..num_hashes {
            // Simple LCG for seed generation (deterministic, cheap).
            rng_state = rng_state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            seeds.push(rng_state);
        }
        Ok(Self { seed, seeds })
    }

    /// Compute the signature of a token set.
    ///
    /// An empty set yields the all-zero signature rather than all `u64::MAX`.
    pub fn signature(&self, tokens: &BTreeSet<String>) -> Signature {
        if tokens.is_empty() {
            return Signature::zeroed(self.seeds.len());
        }
        let mut mins = vec![u64::MAX; self.seeds.len()];
        for token in tokens {
            let base = fnv1a64(token.as_bytes());
            for (min, &seed) in mins.iter_mut().zip(&self.seeds) {
                let h = mix64(base ^ seed);
                if h < *min {
                    *min = h;
                }
            }
        }
        Signature::new(mins)
    }

    /// Number of hash functions.
    pub fn num_hashes(&self) -> usize {
        self.seeds.len()
    }

    /// Seed this generator was built from.
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn deterministic_for_same_seed() {
        let a = MinHash::with_seed(64, 7).unwrap();
        let b = MinHash::with_seed(64, 7).unwrap();
        let s = set(&["a", "b", "c"]);
        assert_eq!(a.signature(&s), b.signature(&s));
        assert_eq!(a.signature(&s), a.signature(&s));
    }

    #[test]
    fn different_seeds_differ() {
        let a = MinHash::with_seed(64, 1).unwrap();
        let b = MinHash::with_seed(64, 2).unwrap();
        let s = set(&["a", "b", "c"]);
        assert_ne!(a.signature(&s), b.signature(&s));
    }

    #[test]
    fn empty_set_is_all_zero() {
        let mh = MinHash::with_seed(16, 3).unwrap();
        let sig = mh.signature(&BTreeSet::new());
        assert_eq!(sig.len(), 16);
        assert!(sig.values().iter().all(|&v| v == 0));
    }

    #[test]
    fn zero_length_rejected() {
        assert!(matches!(MinHash::with_seed(0, 1), Err(Error::Config(_))));
    }

    #[test]
    fn agreement_tracks_jaccard() {
        // J = 50 / 150
        let a: BTreeSet<String> = (0..100).map(|i| format!("t{i}")).collect();
        let b: BTreeSet<String> = (50..150).map(|i| format!("t{i}")).collect();
        let mh = MinHash::with_seed(2048, 42).unwrap();
        let est = mh.signature(&a).agreement(&mh.signature(&b));
        assert!((est - 1.0 / 3.0).abs() < 0.06, "estimate {est}");
    }

    #[test]
    fn identical_sets_agree_fully() {
        let mh = MinHash::with_seed(128, 42).unwrap();
        let s = set(&["new", "york"]);
        assert!((mh.signature(&s).agreement(&mh.signature(&s)) - 1.0).abs() < 1e-12);
    }
}
