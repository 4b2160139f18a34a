//! Store errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid snapshot name: {0}")]
    InvalidName(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
