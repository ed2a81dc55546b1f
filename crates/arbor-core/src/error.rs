use thiserror::Error;

use crate::conversation::BranchPoint;
use crate::store::StoreError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Branch index {index} is out of range for {point} ({len} children)")]
    OutOfRange {
        point: BranchPoint,
        index: usize,
        len: usize,
    },
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Error {
    pub(crate) fn node_not_found(id: impl std::fmt::Display) -> Self {
        Error::NotFound(format!("node {id}"))
    }
}
