//! Banded LSH index over signatures.
//!
//! A signature of length `L` is cut into `⌊L / r⌋` contiguous bands of `r` rows;
//! a trailing band shorter than `r` is dropped. Each band is hashed (FNV-1a) and
//! reduced modulo `bucket_count`, so the bucket key is `(band_index, bucket)`.
//! Two entities become candidates when they share a bucket in at least one band.

use std::collections::{HashMap, HashSet};
use std::hash::Hasher;

use crate::entity::{EntityId, EntityRecord};
use crate::error::{Error, Result};
use crate::minhash::Fnv1a64;
use crate::signature::{Signature, SignatureGenerator};

/// Banding parameters: rows per band and number of buckets per band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Banding {
    rows_per_band: usize,
    bucket_count: usize,
}

impl Banding {
    /// Validate and create banding parameters.
    pub fn new(rows_per_band: usize, bucket_count: usize) -> Result<Self> {
        if rows_per_band == 0 {
            return Err(Error::config("rows_per_band must be >= 1"));
        }
        if bucket_count == 0 {
            return Err(Error::config("bucket_count must be >= 1"));
        }
        Ok(Self {
            rows_per_band,
            bucket_count,
        })
    }

    /// Rows per band (`r`).
    pub fn rows_per_band(&self) -> usize {
        self.rows_per_band
    }

    /// Buckets per band.
    pub fn bucket_count(&self) -> usize {
        self.bucket_count
    }

    /// Number of full bands in a signature of length `signature_len`.
    pub fn num_bands(&self, signature_len: usize) -> usize {
        signature_len / self.rows_per_band
    }

    /// Full bands of a signature, in order.
    pub fn bands<'a>(&self, signature: &'a Signature) -> impl Iterator<Item = &'a [u64]> + 'a {
        signature.values().chunks_exact(self.rows_per_band)
    }

    /// Bucket a band hashes into, in `0..bucket_count`.
    pub fn bucket_of(&self, band: &[u64]) -> u64 {
        hash_band(band) % self.bucket_count as u64
    }

    /// Probability that two entities with per-row agreement probability
    /// `similarity` share at least one band, ignoring bucket collisions.
    ///
    /// \(P = 1 - (1 - s^r)^b\) with \(b = ⌊L / r⌋\).
    pub fn candidate_probability(&self, similarity: f64, signature_len: usize) -> f64 {
        let r = self.rows_per_band as f64;
        let b = self.num_bands(signature_len) as f64;
        (1.0 - (1.0 - similarity.powf(r)).powf(b)).clamp(0.0, 1.0)
    }
}

fn hash_band(values: &[u64]) -> u64 {
    let mut hasher = Fnv1a64::new();
    for v in values {
        hasher.write(&v.to_le_bytes());
    }
    hasher.finish()
}

/// Read-only LSH index over a collection of source entities.
#[derive(Debug)]
pub struct LshIndex {
    generator: SignatureGenerator,
    banding: Banding,
    /// band index -> (bucket -> entity ids)
    buckets: Vec<HashMap<u64, Vec<EntityId>>>,
    len: usize,
}

impl LshIndex {
    /// Build an index over `entities`; ids are their positions.
    pub fn build(generator: SignatureGenerator, banding: Banding, entities: &[EntityRecord]) -> Self {
        let signatures: Vec<Signature> = entities.iter().map(|e| generator.generate(e)).collect();
        Self::from_signatures(generator, banding, &signatures)
    }

    /// Build an index from precomputed signatures; ids are their positions.
    pub fn from_signatures(
        generator: SignatureGenerator,
        banding: Banding,
        signatures: &[Signature],
    ) -> Self {
        let num_bands = banding.num_bands(generator.signature_len());
        let mut buckets: Vec<HashMap<u64, Vec<EntityId>>> =
            (0..num_bands).map(|_| HashMap::new()).collect();

        for (id, signature) in signatures.iter().enumerate() {
            for (band_idx, band) in banding.bands(signature).enumerate() {
                if band_idx >= num_bands {
                    break;
                }
                buckets[band_idx]
                    .entry(banding.bucket_of(band))
                    .or_default()
                    .push(id);
            }
        }

        Self {
            generator,
            banding,
            buckets,
            len: signatures.len(),
        }
    }

    /// Candidate source ids for an entity, deduplicated and ascending.
    pub fn query(&self, entity: &EntityRecord) -> Vec<EntityId> {
        self.query_signature(&self.generator.generate(entity))
    }

    /// Candidate source ids for a precomputed signature, deduplicated and ascending.
    pub fn query_signature(&self, signature: &Signature) -> Vec<EntityId> {
        let mut candidates: HashSet<EntityId> = HashSet::new();
        for (band_idx, band) in self.banding.bands(signature).enumerate() {
            let Some(table) = self.buckets.get(band_idx) else {
                break;
            };
            if let Some(ids) = table.get(&self.banding.bucket_of(band)) {
                candidates.extend(ids.iter().copied());
            }
        }
        let mut v: Vec<EntityId> = candidates.into_iter().collect();
        v.sort_unstable();
        v
    }

    /// Number of indexed entities.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if no entities were indexed.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of bands per signature.
    pub fn num_bands(&self) -> usize {
        self.buckets.len()
    }

    /// Number of non-empty `(band, bucket)` keys.
    pub fn occupied_buckets(&self) -> usize {
        self.buckets.iter().map(HashMap::len).sum()
    }

    /// Banding parameters.
    pub fn banding(&self) -> Banding {
        self.banding
    }

    /// Generator used for both build and query.
    pub fn generator(&self) -> &SignatureGenerator {
        &self.generator
    }
}
