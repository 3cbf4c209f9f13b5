//! Error types for loading microdata and running reforms

use thiserror::Error;

/// Errors raised by the reform pipeline
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("household {id}: {reason}")]
    InvalidHousehold { id: u64, reason: String },

    #[error("unknown region: {0}")]
    UnknownRegion(String),

    #[error("missing column '{column}' in {file}")]
    MissingColumn { column: String, file: String },

    #[error("no microdata rows loaded")]
    EmptyDataset,

    #[error("no working-age adults carry weight; adult amount cannot be solved")]
    NoWorkingAgeAdults,

    #[error("population '{0}' has zero total weight")]
    EmptyPopulation(String),

    #[error("invalid scenario row {row}: {reason}")]
    InvalidScenario { row: usize, reason: String },

    #[error("invalid amount range: {0}")]
    InvalidRange(String),

    #[error("grid search produced no feasible candidate")]
    NoFeasibleCandidate,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid_household(id: u64, reason: impl Into<String>) -> Self {
        Error::InvalidHousehold { id, reason: reason.into() }
    }

    pub fn invalid_scenario(row: usize, reason: impl Into<String>) -> Self {
        Error::InvalidScenario { row, reason: reason.into() }
    }
}
