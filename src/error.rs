//! Error types for facade operations.

use thiserror::Error;

/// Result type for facade operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring or using the facade.
///
/// Driver-level failures (network errors, malformed queries, auth failures)
/// pass through as [`Error::Driver`] without translation or retry.
#[derive(Error, Debug)]
pub enum Error {
    /// MongoDB driver error.
    #[error("mongodb error: {0}")]
    Driver(#[from] mongodb::error::Error),

    /// BSON serialization error.
    #[error("bson encode error: {0}")]
    BsonSer(#[from] bson::ser::Error),

    /// BSON deserialization error.
    #[error("bson decode error: {0}")]
    BsonDe(#[from] bson::de::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Connection error.
    #[error("connection error: {0}")]
    Connection(String),

    /// Query execution error.
    #[error("query error: {0}")]
    Query(String),

    /// The client was closed and can no longer hand out handles.
    #[error("client is closed")]
    Closed,
}

impl Error {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a query error.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query(message.into())
    }

    /// Check if this is a configuration error.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Check if this is a connection error.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Check if this is the closed-client error.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::config("missing property");
        assert!(err.is_config());

        let err = Error::connection("connection refused");
        assert!(err.is_connection());

        let err = Error::Closed;
        assert!(err.is_closed());
    }

    #[test]
    fn test_error_display() {
        let err = Error::config("test error");
        assert_eq!(err.to_string(), "configuration error: test error");

        let err = Error::query("bad filter");
        assert_eq!(err.to_string(), "query error: bad filter");

        assert_eq!(Error::Closed.to_string(), "client is closed");
    }
}
