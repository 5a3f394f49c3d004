//! Wire-visible error taxonomy and internal error enums.
//!
//! `ErrorType` is the stable, serializable tag every failure eventually
//! carries on the wire (see `models::Error`). `CoreError` is the internal
//! error type raised by the client pipeline, pagination engine, and entity
//! layer; it is mapped to `ErrorType` at the boundary where an `Error` value
//! is constructed.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable category tag for a wire-visible `Error`.
///
/// Serializes to the exact snake_case strings named in the error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    ConfigurationError,
    ValidationError,
    AuthenticationError,
    AuthorizationError,
    InvalidCredentials,
    ConnectionError,
    AdapterError,
    InvalidOperation,
    NotFound,
    AlreadyExists,
    Timeout,
    RateLimit,
    ServerError,
    UnknownError,
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Self::ConfigurationError => "configuration_error",
            Self::ValidationError => "validation_error",
            Self::AuthenticationError => "authentication_error",
            Self::AuthorizationError => "authorization_error",
            Self::InvalidCredentials => "invalid_credentials",
            Self::ConnectionError => "connection_error",
            Self::AdapterError => "adapter_error",
            Self::InvalidOperation => "invalid_operation",
            Self::NotFound => "not_found",
            Self::AlreadyExists => "already_exists",
            Self::Timeout => "timeout",
            Self::RateLimit => "rate_limit",
            Self::ServerError => "server_error",
            Self::UnknownError => "unknown_error",
        };
        f.write_str(tag)
    }
}

/// Internal error type shared by the client pipeline, pagination engine,
/// and entity layer.
///
/// Adapter crates define their own local error enums and map them into
/// `CoreError::Adapter` at the `ProtocolAdapter` trait boundary, so no
/// adapter-crate type ever crosses into `dcx-core`.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("authorization failed: {0}")]
    Authorization(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("adapter error: {0}")]
    Adapter(String),

    #[error("operation requires {required}, but the configured adapter does not implement it")]
    AdapterType { required: &'static str },

    #[error("request error: {0}")]
    Request(String),

    #[error("operation timed out: {0}")]
    Timeout(String),

    #[error("entity error: {0}")]
    Entity(String),

    #[error("{0}")]
    Other(String),
}

impl CoreError {
    /// Map this error onto its wire-visible `ErrorType` tag.
    #[must_use]
    pub fn error_type(&self) -> ErrorType {
        match self {
            Self::Configuration(_) => ErrorType::ConfigurationError,
            Self::Validation(_) | Self::Entity(_) => ErrorType::ValidationError,
            Self::Authentication(_) => ErrorType::AuthenticationError,
            Self::Authorization(_) => ErrorType::AuthorizationError,
            Self::Connection(_) => ErrorType::ConnectionError,
            Self::Adapter(_) | Self::AdapterType { .. } => ErrorType::AdapterError,
            Self::Request(_) => ErrorType::InvalidOperation,
            Self::Timeout(_) => ErrorType::Timeout,
            Self::Other(_) => ErrorType::UnknownError,
        }
    }
}
