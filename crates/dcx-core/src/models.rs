//! The unified result envelope and supporting wire types.
//!
//! `ApiResponse` is returned by every `Client` operation across every
//! protocol family; it is the single shape callers code against regardless
//! of which adapter produced it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CoreError, ErrorType};

/// One structured error item within an `Error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorDetail {
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            field: None,
            details: None,
        }
    }
}

/// Structured failure description carried by a failed `ApiResponse`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Error {
    #[serde(rename = "type")]
    pub error_type: ErrorType,
    pub title: String,
    pub status: u16,
    #[serde(default)]
    pub detail: String,
    #[serde(default)]
    pub errors: Vec<ErrorDetail>,
}

impl Error {
    #[must_use]
    pub fn new(error_type: ErrorType, title: impl Into<String>, status: u16) -> Self {
        Self {
            error_type,
            title: title.into(),
            status,
            detail: String::new(),
            errors: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }

    #[must_use]
    pub fn with_errors(mut self, errors: Vec<ErrorDetail>) -> Self {
        self.errors = errors;
        self
    }

    /// Build an `Error` from a `CoreError`, choosing a synthetic HTTP-shaped
    /// status code for non-HTTP adapters per §3's "synthetic 200/4xx/5xx".
    #[must_use]
    pub fn from_core(err: &CoreError, status: u16) -> Self {
        Self::new(err.error_type(), err.to_string(), status)
    }
}

/// Pagination and versioning hints attached to an `ApiResponse`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
}

/// The unified success-or-error envelope returned by every `Client`
/// operation, regardless of which protocol adapter produced it.
///
/// Invariant: `success == false` implies `error.is_some()`, and
/// `success == true` implies `error.is_none()`. The constructors enforce
/// this; there is no public way to build an inconsistent `ApiResponse`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub status_code: u16,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Error>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub meta: Metadata,
}

impl ApiResponse {
    /// Build a successful response.
    #[must_use]
    pub fn ok(status_code: u16, data: Value) -> Self {
        Self {
            success: true,
            status_code,
            data,
            error: None,
            headers: HashMap::new(),
            meta: Metadata::default(),
        }
    }

    /// Build a failed response.
    #[must_use]
    pub fn failed(status_code: u16, error: Error) -> Self {
        Self {
            success: false,
            status_code,
            data: Value::Null,
            error: Some(error),
            headers: HashMap::new(),
            meta: Metadata::default(),
        }
    }

    #[must_use]
    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    #[must_use]
    pub fn with_meta(mut self, meta: Metadata) -> Self {
        self.meta = meta;
        self
    }

    /// Invariant check used by tests and by hooks that mutate a response.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.success == self.error.is_none()
    }
}

/// Immutable description of a request, built by the `Client` or passed into
/// a hook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiRequest {
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub query: HashMap<String, String>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_override: Option<String>,
}

impl ApiRequest {
    #[must_use]
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            query: HashMap::new(),
            headers: HashMap::new(),
            body: None,
            auth_override: None,
        }
    }
}
