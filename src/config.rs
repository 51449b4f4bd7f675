//! Experiment configuration and the end-to-end driver.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::eval::{GridSearchEvaluator, SweepReport};
use crate::grid::{GridSpec, ParamRange};
use crate::loader::{load_entities, load_ground_truth};
use crate::signature::{GeneratorSpec, SignatureKind};

/// Everything needed to run one grid search.
///
/// Missing fields take the defaults of [`ExperimentConfig::default`]:
/// `r` in `2..=5` step 1, buckets in `10..=200` step 25, MinHash, unseeded,
/// one worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExperimentConfig {
    /// Source entity collection (JSON).
    pub source_path: PathBuf,
    /// Target entity collection (JSON).
    pub target_path: PathBuf,
    /// Ground-truth pairs (JSON).
    pub ground_truth_path: PathBuf,
    /// Smallest rows-per-band.
    pub min_r: usize,
    /// Largest rows-per-band (inclusive).
    pub max_r: usize,
    /// Rows-per-band step.
    pub step_r: usize,
    /// Smallest bucket count.
    pub min_buckets: usize,
    /// Largest bucket count (inclusive).
    pub max_buckets: usize,
    /// Bucket-count step.
    pub step_buckets: usize,
    /// SuperBit (128 bits) instead of MinHash (2048 hashes).
    pub use_super_bit: bool,
    /// Fixed generator seed; `None` draws a fresh seed per cell.
    pub seed: Option<u64>,
    /// Worker threads for evaluating cells.
    pub workers: usize,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            source_path: PathBuf::new(),
            target_path: PathBuf::new(),
            ground_truth_path: PathBuf::new(),
            min_r: 2,
            max_r: 5,
            step_r: 1,
            min_buckets: 10,
            max_buckets: 200,
            step_buckets: 25,
            use_super_bit: false,
            seed: None,
            workers: 1,
        }
    }
}

impl ExperimentConfig {
    /// Read a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self =
            serde_json::from_str(&text).map_err(|e| Error::data_format(path, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// The hyperparameter grid.
    pub fn grid(&self) -> GridSpec {
        GridSpec::new(
            ParamRange::new(self.min_r, self.max_r, self.step_r),
            ParamRange::new(self.min_buckets, self.max_buckets, self.step_buckets),
        )
    }

    /// The signature generator factory.
    pub fn generator(&self) -> GeneratorSpec {
        let kind = if self.use_super_bit {
            SignatureKind::superbit()
        } else {
            SignatureKind::minhash()
        };
        GeneratorSpec {
            kind,
            seed: self.seed,
        }
    }

    /// Check grid bounds and worker count.
    pub fn validate(&self) -> Result<()> {
        self.grid().validate()?;
        if self.workers == 0 {
            return Err(Error::config("workers must be >= 1"));
        }
        Ok(())
    }
}

/// Load the datasets named by `config` and sweep its grid.
pub fn run_experiment(config: &ExperimentConfig) -> Result<SweepReport> {
    config.validate()?;

    let source = load_entities(&config.source_path)?;
    let target = load_entities(&config.target_path)?;
    let ground_truth = load_ground_truth(&config.ground_truth_path, &source, &target)?;

    let generator = config.generator();
    log::info!(
        "using LSH {} ({} values per signature)",
        generator.kind.name(),
        generator.kind.signature_len()
    );

    GridSearchEvaluator::new(&source, &target, &ground_truth, generator, config.grid())?
        .with_workers(config.workers)
        .sweep()
}
