//! Error types for stash-core

use thiserror::Error;

/// Result type alias using stash-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in stash-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Transport-level HTTP failure (connect, timeout, body decode)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote API rejected the access token (HTTP 401)
    #[error("Remote API rejected the access token")]
    Unauthorized,

    /// Any other non-success response from a remote API
    #[error("Remote API error: {0}")]
    Api(String),

    /// Item not found
    #[error("Item not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Credential storage error
    #[error("Credential storage error: {0}")]
    Credentials(String),
}

impl Error {
    /// Whether this error means the access token has to be refreshed.
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_unauthorized_requests_refresh() {
        assert!(Error::Unauthorized.is_unauthorized());
        assert!(!Error::Api("rate limited (429)".to_string()).is_unauthorized());
        assert!(!Error::InvalidInput("bad".to_string()).is_unauthorized());
    }
}
