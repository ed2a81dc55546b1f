use arbor_core::store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize preferences: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("No {kind} matches '{prefix}'")]
    NoMatch { kind: &'static str, prefix: String },

    #[error("'{prefix}' matches {count} {kind}s; use a longer prefix")]
    Ambiguous {
        kind: &'static str,
        prefix: String,
        count: usize,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Core(#[from] arbor_core::error::Error),
}
