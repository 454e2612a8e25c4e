//! Seeding errors.

use std::path::PathBuf;

use thiserror::Error;

use crate::store::StoreError;

pub type SeedResult<T> = Result<T, SeedError>;

#[derive(Debug, Error)]
pub enum SeedError {
    /// A data file could not be read
    #[error("Failed to read {path}: {message}")]
    Io { path: PathBuf, message: String },

    /// A data file is not a JSON array of objects
    #[error("Invalid seed file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// A seeded record could not be prepared
    #[error("Invalid seed record: {0}")]
    Record(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SeedError {
    pub fn status_code(&self) -> u16 {
        match self {
            SeedError::Store(StoreError::DuplicateKey { .. }) => 400,
            _ => 500,
        }
    }
}
