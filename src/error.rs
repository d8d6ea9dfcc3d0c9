use thiserror::Error;

use crate::database::StoreError;

/// Outcome of a failed write. The message stays generic; the underlying
/// store error is kept as the source and logged where it happens.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("{operation} failed: record not found")]
    NotFound { operation: &'static str },
    #[error("{operation} failed")]
    Failed {
        operation: &'static str,
        #[source]
        source: StoreError,
    },
}

impl RepositoryError {
    pub fn from_store(operation: &'static str, err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => Self::NotFound { operation },
            source => Self::Failed { operation, source },
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set in environment")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}
