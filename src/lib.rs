//! `lshblock`: LSH blocking for entity resolution, with a grid search over
//! banding parameters.
//!
//! Given a source and a target collection of entity records, the crate
//! generates candidate duplicate pairs with banded LSH (MinHash for Jaccard,
//! SuperBit for cosine) and measures recall, precision and F1 of those
//! candidates against known duplicates for every `(rows_per_band,
//! bucket_count)` cell of a grid.
//!
//! Scope is *candidate generation*: no pairwise similarity is computed on the
//! candidates, and indexes are rebuilt per cell rather than persisted.
//!
//! # Example
//!
//! ```rust
//! use lshblock::{
//!     DuplicatePair, EntityRecord, GeneratorSpec, GridSearchEvaluator, GridSpec, GroundTruth,
//!     ParamRange, SignatureKind,
//! };
//!
//! let source = vec![EntityRecord::from_values(["Barack Obama", "Honolulu"])];
//! let target = vec![EntityRecord::from_values(["Barack Obama", "Hawaii"])];
//! let truth: GroundTruth = [DuplicatePair::new(0, 0)].into_iter().collect();
//!
//! let grid = GridSpec::new(ParamRange::new(1, 2, 1), ParamRange::single(50));
//! let generator = GeneratorSpec::seeded(SignatureKind::MinHash { len: 64 }, 42);
//! let report = GridSearchEvaluator::new(&source, &target, &truth, generator, grid)
//!     .unwrap()
//!     .sweep()
//!     .unwrap();
//!
//! assert_eq!(report.records.len(), 2);
//! assert!(report.best.is_some());
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod entity;
pub mod error;
pub mod eval;
pub mod grid;
pub mod loader;
pub mod lsh;
pub mod minhash;
pub mod signature;
pub mod superbit;
pub mod tracker;

pub use config::{run_experiment, ExperimentConfig};
pub use entity::{Attribute, DuplicatePair, EntityId, EntityRecord, GroundTruth};
pub use error::{Error, Result};
pub use eval::{GridSearchEvaluator, MetricFlags, PerformanceRecord, SweepReport};
pub use grid::{GridCell, GridCells, GridSpec, ParamRange};
pub use loader::{load_entities, load_ground_truth};
pub use lsh::{Banding, LshIndex};
pub use minhash::MinHash;
pub use signature::{
    GeneratorSpec, Signature, SignatureGenerator, SignatureKind, MINHASH_SIGNATURE_LEN,
    SUPERBIT_SIGNATURE_LEN,
};
pub use superbit::{SuperBit, DEFAULT_FEATURE_DIM};
pub use tracker::PerformanceTracker;
