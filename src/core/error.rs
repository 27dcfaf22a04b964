//! Custom error types for Skylaunch
//!
//! Provides a unified error handling system across all modules.

use thiserror::Error;

/// Main error type for Skylaunch operations
#[derive(Error, Debug)]
pub enum SkylaunchError {
    /// Cloud API connection or protocol errors
    #[error("Cloud error: {0}")]
    Cloud(String),

    /// Secure tunnel errors
    #[error("Tunnel error: {0}")]
    Tunnel(String),

    /// Local test server errors
    #[error("Server error: {0}")]
    Server(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The remote job did not report completion before the deadline
    #[error("Timeout: Element not there")]
    Timeout,

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Tunnel binary not installed or not on PATH
    #[error("Tunnel binary '{0}' not found. Install it or set SKYLAUNCH_TUNNEL_BINARY")]
    TunnelBinaryNotFound(String),

    /// The cloud returned a result that does not match the documented shape
    #[error("Malformed result from cloud: {0}")]
    MalformedResult(String),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Generic error for other cases
    #[error("{0}")]
    Other(String),
}

/// Convenience Result type for Skylaunch operations
pub type Result<T> = std::result::Result<T, SkylaunchError>;

impl SkylaunchError {
    /// Create a cloud error
    pub fn cloud(msg: impl Into<String>) -> Self {
        Self::Cloud(msg.into())
    }

    /// Create a tunnel error
    pub fn tunnel(msg: impl Into<String>) -> Self {
        Self::Tunnel(msg.into())
    }

    /// Create a server error
    pub fn server(msg: impl Into<String>) -> Self {
        Self::Server(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Wrap an error with additional context
    pub fn with_context<E>(context: impl Into<String>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::WithContext {
            context: context.into(),
            source: Box::new(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message() {
        // Exact wording is part of the public contract.
        assert_eq!(
            SkylaunchError::Timeout.to_string(),
            "Timeout: Element not there"
        );
    }

    #[test]
    fn test_helper_constructors() {
        assert_eq!(
            SkylaunchError::tunnel("pidfile missing").to_string(),
            "Tunnel error: pidfile missing"
        );
        assert_eq!(
            SkylaunchError::cloud("bad gateway").to_string(),
            "Cloud error: bad gateway"
        );
    }
}
