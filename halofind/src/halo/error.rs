//! Error taxonomy for the halo finder
//!
//! Everything the engine can fail with lives in [`HaloError`]. Errors are
//! local to one sub-box run: the parallel driver records them per region and
//! never lets one region's failure abort its siblings.

use thiserror::Error;

/// Broad classification of a [`HaloError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The search or extraction algorithm could not make progress
    Algorithmic,
    /// Bad configuration or malformed input data
    InvalidInput,
    /// Reading particles or writing catalogs failed
    Io,
}

#[derive(Debug, Error)]
pub enum HaloError {
    #[error("virial radius search did not converge after {iterations} iterations (radius {radius}, overdensity {overdensity})")]
    NonConvergence {
        iterations: usize,
        radius: f64,
        overdensity: f64,
    },

    #[error("seed projected density {0} cannot produce a radius guess")]
    InvalidSeedDensity(f64),

    #[error("particle id {0} appears more than once")]
    DuplicateParticle(u64),

    #[error("subdivision interval {0} must evenly divide the unit domain")]
    InvalidInterval(f64),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("could not build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

impl HaloError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            HaloError::NonConvergence { .. } | HaloError::WorkerPool(_) => ErrorKind::Algorithmic,
            HaloError::InvalidSeedDensity(_)
            | HaloError::DuplicateParticle(_)
            | HaloError::InvalidInterval(_)
            | HaloError::InvalidParameter(_)
            | HaloError::Yaml(_) => ErrorKind::InvalidInput,
            HaloError::Io(_) | HaloError::Csv(_) => ErrorKind::Io,
        }
    }
}
