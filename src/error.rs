//! Error taxonomy shared by the loader, the reducer and the results store.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

/// Every failure surfaced by the testbench pipeline.
///
/// All variants are fatal for the call that produced them; nothing is
/// retried.
#[derive(Debug, Error)]
pub enum BenchError {
    /// A required file is absent.
    #[error("file not found: {}", .path.display())]
    NotFound { path: PathBuf },

    /// The source data does not cover the requested window.
    #[error("data integrity: {0}")]
    DataIntegrity(String),

    /// Column names/order or row counts do not match the file contract.
    #[error("schema violation: {0}")]
    SchemaViolation(String),

    /// A call parameter is out of its accepted domain.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("plotting failed: {0}")]
    Plot(String),
}

impl BenchError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, BenchError>;
