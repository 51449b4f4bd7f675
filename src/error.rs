//! Error types for blocking and grid search.

use std::path::PathBuf;

use crate::grid::GridCell;

/// Result type for `lshblock` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while configuring, loading or sweeping.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A parameter is out of range or inconsistent.
    #[error("configuration error: {0}")]
    Config(String),

    /// An error raised while a grid cell was being evaluated.
    #[error("grid cell {cell}: {source}")]
    InCell {
        /// The cell in progress.
        cell: GridCell,
        /// Underlying error.
        #[source]
        source: Box<Error>,
    },

    /// Reading an input file failed.
    #[error("io error on {}: {source}", .path.display())]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// An input file could not be interpreted.
    #[error("data format error in {}: {message}", .path.display())]
    DataFormat {
        /// File being read.
        path: PathBuf,
        /// What was wrong with it.
        message: String,
    },
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Attach the grid cell that was in progress.
    pub fn in_cell(self, cell: GridCell) -> Self {
        match self {
            // Already attributed; keep the innermost cell.
            e @ Error::InCell { .. } => e,
            other => Error::InCell {
                cell,
                source: Box::new(other),
            },
        }
    }

    pub(crate) fn data_format(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Error::DataFormat {
            path: path.into(),
            message: msg.into(),
        }
    }
}
