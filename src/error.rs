//! Error types for tweet-relay
//!
//! This module provides error handling for the crate, including:
//! - Domain-specific error variants (Config, Auth, Upstream, Delivery, Ledger)
//! - Automatic conversions from reqwest/io/serde_json errors
//! - Classification of "service unavailable" failures for the login retry gate

use thiserror::Error;

/// Result type alias for tweet-relay operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for tweet-relay
///
/// This is the primary error type used throughout the crate. Each variant includes
/// contextual information to help diagnose issues.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "account.username")
        key: Option<String>,
    },

    /// Login or session establishment failed
    #[error("auth error: {0}")]
    Auth(String),

    /// The upstream platform returned an unusable response
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Notification delivery failed
    #[error("delivery error: {0}")]
    Delivery(String),

    /// The notified-id ledger is unreadable or malformed
    #[error("ledger error: {0}")]
    Ledger(String),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for a configuration error tied to a specific key
    pub fn config(message: impl Into<String>, key: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Returns true if this error looks like a transient "service unavailable"
    /// response from the upstream platform
    ///
    /// Login retries are gated on this classification: a 503 is worth waiting
    /// out, a rejected password is not.
    pub fn is_service_unavailable(&self) -> bool {
        match self {
            Error::Network(e) => e.status() == Some(reqwest::StatusCode::SERVICE_UNAVAILABLE),
            Error::Auth(msg) | Error::Upstream(msg) => {
                msg.contains("503") || msg.contains("Service Unavailable")
            }
            _ => false,
        }
    }
}
