//! Error types for the okctl state store.

use okctl_core::{Error, Kind};
use thiserror::Error;

/// Result type alias for state store operations.
pub type StateResult<T> = Result<T, StateError>;

/// Errors that can occur during state store operations.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to open database: {0}")]
    Open(String),

    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("table error: {0}")]
    Table(String),

    #[error("read error: {0}")]
    Read(String),

    #[error("write error: {0}")]
    Write(String),

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("deserialization error: {0}")]
    Deserialize(String),

    #[error("not found: {0}")]
    NotFound(String),
}

impl From<StateError> for Error {
    fn from(e: StateError) -> Self {
        let kind = match e {
            StateError::NotFound(_) => Kind::NotExist,
            _ => Kind::Io,
        };
        Error::new(kind, e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_not_exist() {
        let err: Error = StateError::NotFound("certificates/argocd.okctl.io".into()).into();
        assert_eq!(err.kind(), Kind::NotExist);

        let err: Error = StateError::Write("disk full".into()).into();
        assert_eq!(err.kind(), Kind::Io);
        assert_eq!(err.message(), "write error: disk full");
    }
}
