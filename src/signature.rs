//! Signatures and the two signature generators behind one contract.

use serde::{Deserialize, Serialize};

use crate::entity::EntityRecord;
use crate::error::Result;
use crate::minhash::MinHash;
use crate::superbit::{SuperBit, DEFAULT_FEATURE_DIM};

/// Signature length used for MinHash in the grid search.
pub const MINHASH_SIGNATURE_LEN: usize = 2048;

/// Signature length used for SuperBit in the grid search.
pub const SUPERBIT_SIGNATURE_LEN: usize = 128;

/// Fixed-length sequence of hash values derived from one entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    values: Vec<u64>,
}

impl Signature {
    /// Wrap raw values.
    pub fn new(values: Vec<u64>) -> Self {
        Self { values }
    }

    /// The degenerate signature given to featureless entities.
    pub fn zeroed(len: usize) -> Self {
        Self {
            values: vec![0; len],
        }
    }

    /// Raw values.
    pub fn values(&self) -> &[u64] {
        &self.values
    }

    /// Signature length.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if the signature has no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Fraction of positions where two signatures agree.
    ///
    /// For MinHash this estimates Jaccard similarity. Mismatched lengths give `0.0`.
    pub fn agreement(&self, other: &Self) -> f64 {
        if self.values.len() != other.values.len() || self.values.is_empty() {
            return 0.0;
        }
        let matches = self
            .values
            .iter()
            .zip(other.values.iter())
            .filter(|(a, b)| a == b)
            .count();
        matches as f64 / self.values.len() as f64
    }
}

/// Which generator to use and its shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SignatureKind {
    /// Jaccard similarity over token sets.
    MinHash {
        /// Number of hash functions.
        len: usize,
    },
    /// Cosine similarity over hashed term-frequency vectors.
    SuperBit {
        /// Number of bits.
        len: usize,
        /// Dimension of the hashed feature space.
        feature_dim: usize,
    },
}

impl SignatureKind {
    /// MinHash with the default length (2048).
    pub fn minhash() -> Self {
        SignatureKind::MinHash {
            len: MINHASH_SIGNATURE_LEN,
        }
    }

    /// SuperBit with the default length (128).
    pub fn superbit() -> Self {
        SignatureKind::SuperBit {
            len: SUPERBIT_SIGNATURE_LEN,
            feature_dim: DEFAULT_FEATURE_DIM,
        }
    }

    /// Declared signature length.
    pub fn signature_len(&self) -> usize {
        match *self {
            SignatureKind::MinHash { len } | SignatureKind::SuperBit { len, .. } => len,
        }
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            SignatureKind::MinHash { .. } => "MinHash",
            SignatureKind::SuperBit { .. } => "SuperBit",
        }
    }
}

/// A signature generator: one of the two LSH families.
#[derive(Debug, Clone)]
pub enum SignatureGenerator {
    /// MinHash (Jaccard).
    MinHash(MinHash),
    /// SuperBit (cosine).
    SuperBit(SuperBit),
}

impl SignatureGenerator {
    /// Build a generator of the given kind from an explicit seed.
    pub fn new(kind: SignatureKind, seed: u64) -> Result<Self> {
        Ok(match kind {
            SignatureKind::MinHash { len } => Self::MinHash(MinHash::with_seed(len, seed)?),
            SignatureKind::SuperBit { len, feature_dim } => {
                Self::SuperBit(SuperBit::with_seed(len, feature_dim, seed)?)
            }
        })
    }

    /// Build a generator from a fresh random seed.
    ///
    /// Results vary from run to run. The drawn seed is logged and available via
    /// [`Self::seed`] so a run can be reproduced.
    pub fn unseeded(kind: SignatureKind) -> Result<Self> {
        let seed: u64 = rand::random();
        log::warn!("{} generator is unseeded; drew seed {seed}", kind.name());
        Self::new(kind, seed)
    }

    /// Signature of an entity. Featureless entities get the all-zero signature.
    pub fn generate(&self, entity: &EntityRecord) -> Signature {
        match self {
            Self::MinHash(mh) => mh.signature(&entity.tokens()),
            Self::SuperBit(sb) => sb.signature(&entity.token_counts()),
        }
    }

    /// Declared signature length.
    pub fn signature_len(&self) -> usize {
        match self {
            Self::MinHash(mh) => mh.num_hashes(),
            Self::SuperBit(sb) => sb.num_bits(),
        }
    }

    /// Seed the generator was built from.
    pub fn seed(&self) -> u64 {
        match self {
            Self::MinHash(mh) => mh.seed(),
            Self::SuperBit(sb) => sb.seed(),
        }
    }
}

/// Factory producing a fresh generator for each grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorSpec {
    /// Generator family and shape.
    pub kind: SignatureKind,
    /// Fixed seed; `None` draws a new one for every generator.
    pub seed: Option<u64>,
}

impl GeneratorSpec {
    /// Seeded factory.
    pub fn seeded(kind: SignatureKind, seed: u64) -> Self {
        Self {
            kind,
            seed: Some(seed),
        }
    }

    /// Construct a generator.
    pub fn make(&self) -> Result<SignatureGenerator> {
        match self.seed {
            Some(seed) => SignatureGenerator::new(self.kind, seed),
            None => SignatureGenerator::unseeded(self.kind),
        }
    }
}
