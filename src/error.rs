//! Error types for crewsync.

use thiserror::Error;

use crate::offline::DeliveryError;

/// Errors surfaced by crewsync commands.
#[derive(Debug, Error)]
pub enum CrewsyncError {
    /// Configuration or argument problem.
    #[error("configuration error: {0}")]
    Config(String),

    /// Local database failure.
    #[error("database error: {0}")]
    Database(String),

    /// Filesystem or terminal I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A remote delivery failed.
    #[error("delivery failed: {0}")]
    Delivery(#[from] DeliveryError),

    /// Login or token problem.
    #[error("authentication error: {0}")]
    Auth(String),
}

impl From<rusqlite::Error> for CrewsyncError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Database(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_error_converts() {
        let err: CrewsyncError = DeliveryError::Timeout.into();
        assert!(matches!(err, CrewsyncError::Delivery(DeliveryError::Timeout)));
        assert!(err.to_string().starts_with("delivery failed"));
    }

    #[test]
    fn test_sqlite_error_converts() {
        let err: CrewsyncError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, CrewsyncError::Database(_)));
    }
}
