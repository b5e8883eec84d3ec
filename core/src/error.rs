//! Error types for the client.
//!
//! # Design
//! `TransportError` only describes failures below HTTP: a response with a
//! non-2xx status is not an error at this level and is classified later by
//! the operation. The variants map the connection-level failures the retry
//! loop cares about, so the policy can decide per variant whether another
//! attempt is safe.

use thiserror::Error;

/// Failure to obtain any HTTP response from the provider.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The TCP connection could not be established.
    #[error("connection failed: {0}")]
    Connect(String),

    /// The host name did not resolve.
    #[error("host not found: {0}")]
    Dns(String),

    /// Connect or read exceeded the configured timeout.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The TLS handshake failed.
    #[error("tls failure: {0}")]
    Tls(String),

    /// The connection broke while the request was in flight.
    #[error("i/o failure: {0}")]
    Io(String),

    /// Anything else reported by the HTTP stack.
    #[error("request failed: {0}")]
    Other(String),
}

impl TransportError {
    /// Connection-level failures that another attempt may fix.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransportError::Connect(_)
                | TransportError::Dns(_)
                | TransportError::Timeout(_)
                | TransportError::Io(_)
        )
    }

    /// Failures that guarantee the request never reached the server.
    pub fn is_pre_send(&self) -> bool {
        matches!(self, TransportError::Connect(_) | TransportError::Dns(_))
    }
}

/// Configuration and endpoint-table errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing secret key (set PAYSTACK_SECRET)")]
    MissingSecret,

    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },

    #[error("{0}")]
    OutOfRange(String),

    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("endpoint {name} must be a string template or a table")]
    InvalidEndpoint { name: String },

    #[error("unknown endpoint {0}")]
    UnknownEndpoint(String),
}
