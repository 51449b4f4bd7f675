//! SuperBit signatures for cosine similarity.
//!
//! Sign random projections (SimHash) collide on bit \(i\) with probability
//! \(1 - \theta / \pi\). SuperBit (Ji et al., 2012) lowers the variance of that
//! estimate by orthogonalizing the random hyperplanes in batches ("super-bits")
//! of depth \(N \le d\) with Gram-Schmidt.
//!
//! Entities are mapped to a `feature_dim`-dimensional term-frequency vector by
//! hashing each token into a slot, so the hyperplanes never depend on the data.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Error, Result};
use crate::minhash::fnv1a64;
use crate::signature::Signature;

/// Default dimension of the hashed term-frequency space.
pub const DEFAULT_FEATURE_DIM: usize = 1024;

/// Deterministic SuperBit generator using seeded random hyperplanes.
#[derive(Debug, Clone)]
pub struct SuperBit {
    seed: u64,
    feature_dim: usize,
    /// `num_bits` hyperplanes of `feature_dim` each, row-major.
    hyperplanes: Vec<Vec<f64>>,
}

impl SuperBit {
    /// Create a generator producing `num_bits` bits over `feature_dim` hashed features.
    pub fn with_seed(num_bits: usize, feature_dim: usize, seed: u64) -> Result<Self> {
        if num_bits == 0 {
            return Err(Error::config("SuperBit signature length must be >= 1"));
        }
        if feature_dim == 0 {
            return Err(Error::config("SuperBit feature_dim must be >= 1"));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let depth = num_bits.min(feature_dim);
        let mut hyperplanes = Vec::with_capacity(num_bits);

        while hyperplanes.len() < num_bits {
            let batch = depth.min(num_bits - hyperplanes.len());
            let mut basis: Vec<Vec<f64>> = Vec::with_capacity(batch);
            while basis.len() < batch {
                let mut v: Vec<f64> = (0..feature_dim).map(|_| gaussian(&mut rng)).collect();

                // Orthogonalize against the current batch.
                for b in &basis {
                    let d = dot(&v, b);
                    for (vi, bi) in v.iter_mut().zip(b) {
                        *vi -= d * bi;
                    }
                }

                let norm = dot(&v, &v).sqrt();
                if norm > 1e-10 {
                    for vi in &mut v {
                        *vi /= norm;
                    }
                    basis.push(v);
                }
                // Otherwise the draw was (numerically) dependent; draw again.
            }
            hyperplanes.extend(basis);
        }

        Ok(Self {
            seed,
            feature_dim,
            hyperplanes,
        })
    }

    /// Compute the signature of a token multiset; bit `i` is stored as `0` or `1`.
    ///
    /// A featureless entity projects to zero on every plane, giving the all-zero signature.
    pub fn signature(&self, token_counts: &BTreeMap<String, u32>) -> Signature {
        let v = self.feature_vector(token_counts);
        let bits = self
            .hyperplanes
            .iter()
            .map(|plane| u64::from(dot(plane, &v) > 0.0))
            .collect();
        Signature::new(bits)
    }

    /// Hashed term-frequency vector of a token multiset.
    pub fn feature_vector(&self, token_counts: &BTreeMap<String, u32>) -> Vec<f64> {
        let mut v = vec![0.0; self.feature_dim];
        for (token, &count) in token_counts {
            let slot = (fnv1a64(token.as_bytes()) % self.feature_dim as u64) as usize;
            v[slot] += f64::from(count);
        }
        v
    }

    /// Number of bits (signature length).
    pub fn num_bits(&self) -> usize {
        self.hyperplanes.len()
    }

    /// Dimension of the hashed feature space.
    pub fn feature_dim(&self) -> usize {
        self.feature_dim
    }

    /// Seed this generator was built from.
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

/// Standard normal draw (Box-Muller).
fn gaussian(rng: &mut StdRng) -> f64 {
    // (0, 1] keeps ln finite.
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(items: &[(&str, u32)]) -> BTreeMap<String, u32> {
        items.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn hyperplanes_in_a_batch_are_orthonormal() {
        let sb = SuperBit::with_seed(16, 32, 9).unwrap();
        for i in 0..16 {
            assert!((dot(&sb.hyperplanes[i], &sb.hyperplanes[i]) - 1.0).abs() < 1e-9);
            for j in (i + 1)..16 {
                assert!(dot(&sb.hyperplanes[i], &sb.hyperplanes[j]).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn more_bits_than_dimensions_uses_several_batches() {
        let sb = SuperBit::with_seed(10, 4, 1).unwrap();
        assert_eq!(sb.num_bits(), 10);
        assert!(sb.hyperplanes.iter().all(|p| p.len() == 4));
    }

    #[test]
    fn deterministic_and_binary() {
        let a = SuperBit::with_seed(128, 64, 5).unwrap();
        let b = SuperBit::with_seed(128, 64, 5).unwrap();
        let c = counts(&[("alpha", 2), ("beta", 1)]);
        let sig = a.signature(&c);
        assert_eq!(sig, b.signature(&c));
        assert!(sig.values().iter().all(|&bit| bit <= 1));
    }

    #[test]
    fn empty_input_is_all_zero() {
        let sb = SuperBit::with_seed(32, 16, 5).unwrap();
        let sig = sb.signature(&BTreeMap::new());
        assert_eq!(sig.len(), 32);
        assert!(sig.values().iter().all(|&bit| bit == 0));
    }

    #[test]
    fn scaled_vectors_share_signature() {
        let sb = SuperBit::with_seed(64, 64, 11).unwrap();
        let a = counts(&[("x", 1), ("y", 2)]);
        let b = counts(&[("x", 3), ("y", 6)]);
        assert_eq!(sb.signature(&a), sb.signature(&b));
    }

    #[test]
    fn invalid_params_rejected() {
        assert!(SuperBit::with_seed(0, 8, 1).is_err());
        assert!(SuperBit::with_seed(8, 0, 1).is_err());
    }
}
